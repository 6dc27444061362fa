//! Domain types for a cache placement problem.
//!
//! A [`Catalog`] owns every video, endpoint and cache server of one problem
//! instance, plus the [`DemandMatrix`] of outstanding requests. Entities
//! reference each other by dense integer id only.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Dense identifier of a video (`0..video_count`).
pub type VideoId = usize;

/// Dense identifier of an endpoint (`0..endpoint_count`).
pub type EndpointId = usize;

/// Dense identifier of a cache server (`0..server_count`).
pub type ServerId = usize;

// ── Video ──────────────────────────────────────────────────────────

/// A cacheable video with a fixed size.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Video {
    pub id: VideoId,
    /// Size in storage units (MB in the reference inputs).
    pub size: u64,
    /// Sum of all request counts for this video as loaded. Reporting only.
    pub total_requests: u64,
}

impl Video {
    pub fn new(id: VideoId, size: u64) -> Self {
        Self {
            id,
            size,
            total_requests: 0,
        }
    }
}

impl fmt::Display for Video {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Video[{}]: {} MB, {} total requests",
            self.id, self.size, self.total_requests
        )
    }
}

// ── Endpoint ───────────────────────────────────────────────────────

/// A traffic origin with a fallback latency to the datacenter.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Endpoint {
    pub id: EndpointId,
    /// Latency when a request is served from the datacenter.
    pub datacenter_latency: u64,
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Endpoint[{}]: {} latency", self.id, self.datacenter_latency)
    }
}

// ── Cache server ───────────────────────────────────────────────────

/// A capacity-limited cache node.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CacheServer {
    pub id: ServerId,
    pub capacity: u64,
    /// Space taken by videos placed so far. Never exceeds `capacity`.
    pub used: u64,
    /// Endpoint-id → latency from this server to that endpoint.
    pub endpoints: HashMap<EndpointId, u64>,
}

impl CacheServer {
    pub fn new(id: ServerId, capacity: u64) -> Self {
        Self {
            id,
            capacity,
            used: 0,
            endpoints: HashMap::new(),
        }
    }

    /// Remaining space on this server.
    pub fn free_space(&self) -> u64 {
        self.capacity.saturating_sub(self.used)
    }

    /// Whether a video of `size` fits in the remaining space.
    pub fn fits(&self, size: u64) -> bool {
        size <= self.free_space()
    }

    pub fn is_connected(&self, endpoint: EndpointId) -> bool {
        self.endpoints.contains_key(&endpoint)
    }

    /// Mean latency over all attached endpoints.
    pub fn mean_latency(&self) -> MeanLatency {
        MeanLatency::from_latencies(self.endpoints.values().copied())
    }
}

impl fmt::Display for CacheServer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Server[{}]: {}/{} MB used, {} endpoints",
            self.id,
            self.used,
            self.capacity,
            self.endpoints.len()
        )
    }
}

// ── Mean latency ───────────────────────────────────────────────────

/// Arithmetic mean of a server's endpoint latencies, kept as an exact
/// fraction so that ordering never depends on floating-point rounding.
///
/// A server without endpoints has no mean and orders after every finite
/// value.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MeanLatency {
    Finite { total: u64, endpoints: u64 },
    Unreachable,
}

impl MeanLatency {
    pub fn from_latencies(latencies: impl IntoIterator<Item = u64>) -> Self {
        let (total, endpoints) = latencies
            .into_iter()
            .fold((0u64, 0u64), |(sum, n), l| (sum.saturating_add(l), n + 1));
        if endpoints == 0 {
            Self::Unreachable
        } else {
            Self::Finite { total, endpoints }
        }
    }

    /// Approximate value for logging and reports.
    pub fn as_f64(&self) -> f64 {
        match *self {
            Self::Finite { total, endpoints } => total as f64 / endpoints as f64,
            Self::Unreachable => f64::INFINITY,
        }
    }
}

impl Ord for MeanLatency {
    fn cmp(&self, other: &Self) -> Ordering {
        match (*self, *other) {
            (
                Self::Finite {
                    total: a,
                    endpoints: n,
                },
                Self::Finite {
                    total: b,
                    endpoints: m,
                },
            ) => (u128::from(a) * u128::from(m)).cmp(&(u128::from(b) * u128::from(n))),
            (Self::Finite { .. }, Self::Unreachable) => Ordering::Less,
            (Self::Unreachable, Self::Finite { .. }) => Ordering::Greater,
            (Self::Unreachable, Self::Unreachable) => Ordering::Equal,
        }
    }
}

impl PartialOrd for MeanLatency {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for MeanLatency {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for MeanLatency {}

// ── Demand ─────────────────────────────────────────────────────────

/// Outstanding request counts, per video, per endpoint.
///
/// Sparse: an endpoint missing from a video's map has zero demand.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DemandMatrix {
    requests: Vec<HashMap<EndpointId, u64>>,
}

impl DemandMatrix {
    pub fn new(video_count: usize) -> Self {
        Self {
            requests: vec![HashMap::new(); video_count],
        }
    }

    pub fn video_count(&self) -> usize {
        self.requests.len()
    }

    /// Record `count` requests for `video` from `endpoint`, replacing any
    /// earlier record for the same pair.
    ///
    /// # Panics
    ///
    /// Panics if `video` is out of range.
    pub fn set(&mut self, video: VideoId, endpoint: EndpointId, count: u64) -> Option<u64> {
        self.requests[video].insert(endpoint, count)
    }

    /// Outstanding requests for one (video, endpoint) pair.
    pub fn get(&self, video: VideoId, endpoint: EndpointId) -> u64 {
        self.requests
            .get(video)
            .and_then(|m| m.get(&endpoint))
            .copied()
            .unwrap_or(0)
    }

    /// All endpoints with a recorded count for `video`.
    pub fn for_video(&self, video: VideoId) -> Option<&HashMap<EndpointId, u64>> {
        self.requests.get(video)
    }

    /// Set the outstanding count for one pair to zero, returning the count
    /// it had. Absent pairs stay absent.
    pub fn zero(&mut self, video: VideoId, endpoint: EndpointId) -> u64 {
        match self.requests.get_mut(video).and_then(|m| m.get_mut(&endpoint)) {
            Some(count) => std::mem::take(count),
            None => 0,
        }
    }

    /// Sum of outstanding requests for `video` across all endpoints,
    /// saturating at `u64::MAX`.
    pub fn total(&self, video: VideoId) -> u64 {
        self.requests
            .get(video)
            .map(|m| m.values().fold(0u64, |acc, &n| acc.saturating_add(n)))
            .unwrap_or(0)
    }

    /// Every recorded (video, endpoint, count) triple, ordered by video id
    /// then endpoint id.
    pub fn records(&self) -> Vec<(VideoId, EndpointId, u64)> {
        let mut out: Vec<_> = self
            .requests
            .iter()
            .enumerate()
            .flat_map(|(video, m)| m.iter().map(move |(&ep, &n)| (video, ep, n)))
            .collect();
        out.sort_unstable_by_key(|&(v, e, _)| (v, e));
        out
    }
}

// ── Catalog ────────────────────────────────────────────────────────

/// One fully loaded problem instance.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Catalog {
    pub videos: Vec<Video>,
    pub endpoints: Vec<Endpoint>,
    pub servers: Vec<CacheServer>,
    pub demand: DemandMatrix,
}

impl Catalog {
    /// Assemble a catalog and compute each video's total request count.
    pub fn new(
        videos: Vec<Video>,
        endpoints: Vec<Endpoint>,
        servers: Vec<CacheServer>,
        demand: DemandMatrix,
    ) -> Self {
        let mut catalog = Self {
            videos,
            endpoints,
            servers,
            demand,
        };
        catalog.refresh_total_requests();
        catalog
    }

    /// Recompute `total_requests` on every video from the demand matrix.
    pub fn refresh_total_requests(&mut self) {
        for video in &mut self.videos {
            video.total_requests = self.demand.total(video.id);
        }
    }

    pub fn video(&self, id: VideoId) -> Option<&Video> {
        self.videos.get(id)
    }

    /// Look up a server by id. Servers are normally stored at their id's
    /// index; a catalog built by hand may not be, so fall back to a scan.
    pub fn server(&self, id: ServerId) -> Option<&CacheServer> {
        match self.servers.get(id) {
            Some(server) if server.id == id => Some(server),
            _ => self.servers.iter().find(|s| s.id == id),
        }
    }

    pub fn endpoint(&self, id: EndpointId) -> Option<&Endpoint> {
        self.endpoints.get(id)
    }

    pub fn summary(&self) -> CatalogSummary {
        CatalogSummary {
            videos: self.videos.len(),
            endpoints: self.endpoints.len(),
            servers: self.servers.len(),
            request_records: self.demand.records().len(),
            total_requests: saturating_sum(self.videos.iter().map(|v| v.total_requests)),
            total_capacity: saturating_sum(self.servers.iter().map(|s| s.capacity)),
            total_video_size: saturating_sum(self.videos.iter().map(|v| v.size)),
            unreachable_servers: self
                .servers
                .iter()
                .filter(|s| s.endpoints.is_empty())
                .map(|s| s.id)
                .collect(),
        }
    }
}

impl fmt::Display for Catalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "DataCenter: {} servers, {} videos, {} endpoints",
            self.servers.len(),
            self.videos.len(),
            self.endpoints.len()
        )
    }
}

fn saturating_sum(values: impl Iterator<Item = u64>) -> u64 {
    values.fold(0, u64::saturating_add)
}

/// Headline numbers of a catalog, for `inspect` and logging.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CatalogSummary {
    pub videos: usize,
    pub endpoints: usize,
    pub servers: usize,
    pub request_records: usize,
    pub total_requests: u64,
    pub total_capacity: u64,
    pub total_video_size: u64,
    /// Servers with no attached endpoint; they can never serve a request.
    pub unreachable_servers: Vec<ServerId>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn finite(total: u64, endpoints: u64) -> MeanLatency {
        MeanLatency::Finite { total, endpoints }
    }

    #[test]
    fn mean_latency_compares_exact_fractions() {
        assert_eq!(finite(10, 1), finite(20, 2));
        assert!(finite(10, 3) < finite(7, 2)); // 3.33 < 3.5
        assert!(finite(1, 1) < MeanLatency::Unreachable);
        assert_eq!(MeanLatency::Unreachable, MeanLatency::Unreachable);
    }

    #[test]
    fn mean_latency_from_empty_is_unreachable() {
        assert_eq!(MeanLatency::from_latencies([]), MeanLatency::Unreachable);
        assert!(MeanLatency::from_latencies([]).as_f64().is_infinite());
        assert_eq!(MeanLatency::from_latencies([10, 20]).as_f64(), 15.0);
    }

    #[test]
    fn server_free_space_and_fit() {
        let mut server = CacheServer::new(0, 100);
        server.used = 70;
        assert_eq!(server.free_space(), 30);
        assert!(server.fits(30));
        assert!(!server.fits(31));
    }

    #[test]
    fn demand_absent_pair_is_zero() {
        let mut demand = DemandMatrix::new(2);
        demand.set(0, 3, 9);

        assert_eq!(demand.get(0, 3), 9);
        assert_eq!(demand.get(0, 4), 0);
        assert_eq!(demand.get(1, 3), 0);
        assert_eq!(demand.get(7, 0), 0);
    }

    #[test]
    fn demand_zero_returns_previous_count() {
        let mut demand = DemandMatrix::new(1);
        demand.set(0, 1, 5);

        assert_eq!(demand.zero(0, 1), 5);
        assert_eq!(demand.get(0, 1), 0);
        assert_eq!(demand.zero(0, 1), 0);
        assert_eq!(demand.zero(0, 2), 0);
        assert!(!demand.for_video(0).unwrap().contains_key(&2));
    }

    #[test]
    fn catalog_computes_total_requests() {
        let mut demand = DemandMatrix::new(2);
        demand.set(0, 0, 5);
        demand.set(0, 1, 7);
        demand.set(1, 1, 3);

        let catalog = Catalog::new(
            vec![Video::new(0, 10), Video::new(1, 20)],
            vec![],
            vec![CacheServer::new(0, 50)],
            demand,
        );

        assert_eq!(catalog.videos[0].total_requests, 12);
        assert_eq!(catalog.videos[1].total_requests, 3);

        let summary = catalog.summary();
        assert_eq!(summary.total_requests, 15);
        assert_eq!(summary.request_records, 3);
        assert_eq!(summary.unreachable_servers, vec![0]);
        assert_eq!(
            catalog.to_string(),
            "DataCenter: 1 servers, 2 videos, 0 endpoints"
        );
    }

    #[test]
    fn huge_counts_saturate_instead_of_overflowing() {
        let mut demand = DemandMatrix::new(1);
        for endpoint in 0..3 {
            demand.set(0, endpoint, i64::MAX as u64);
        }
        assert_eq!(demand.total(0), u64::MAX);

        let catalog = Catalog::new(vec![Video::new(0, 1)], vec![], vec![], demand);
        assert_eq!(catalog.videos[0].total_requests, u64::MAX);
        assert_eq!(catalog.summary().total_requests, u64::MAX);
    }

    #[test]
    fn records_are_sorted() {
        let mut demand = DemandMatrix::new(2);
        demand.set(1, 0, 1);
        demand.set(0, 2, 2);
        demand.set(0, 1, 3);

        assert_eq!(demand.records(), vec![(0, 1, 3), (0, 2, 2), (1, 0, 1)]);
    }
}
