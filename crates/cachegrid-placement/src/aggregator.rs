//! Per-server demand aggregation.

use std::cmp::Reverse;

use cachegrid_core::{CacheServer, DemandMatrix, VideoId};
use serde::Serialize;

/// Outstanding requests for one video reachable through one server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DemandEntry {
    pub video_id: VideoId,
    pub requests: u64,
}

/// Sum, per video, the outstanding requests of every endpoint attached to
/// `server`. Sums saturate at `u64::MAX`.
///
/// Videos with no reachable demand are left out. The result is ordered by
/// descending request count, then ascending video id. Reads `demand` only.
pub fn aggregate_demand(server: &CacheServer, demand: &DemandMatrix) -> Vec<DemandEntry> {
    let mut entries: Vec<DemandEntry> = (0..demand.video_count())
        .filter_map(|video_id| {
            let requests = reachable_requests(server, demand, video_id);
            (requests > 0).then_some(DemandEntry { video_id, requests })
        })
        .collect();

    entries.sort_unstable_by_key(|e| (Reverse(e.requests), e.video_id));
    entries
}

fn reachable_requests(server: &CacheServer, demand: &DemandMatrix, video_id: VideoId) -> u64 {
    let Some(by_endpoint) = demand.for_video(video_id) else {
        return 0;
    };

    // Walk whichever side is smaller.
    if by_endpoint.len() <= server.endpoints.len() {
        by_endpoint
            .iter()
            .filter(|(endpoint, _)| server.is_connected(**endpoint))
            .fold(0, |acc, (_, &count)| acc.saturating_add(count))
    } else {
        server
            .endpoints
            .keys()
            .fold(0, |acc, &endpoint| acc.saturating_add(demand.get(video_id, endpoint)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn server_with(endpoints: &[usize]) -> CacheServer {
        let mut server = CacheServer::new(0, 100);
        for &endpoint in endpoints {
            server.endpoints.insert(endpoint, 10);
        }
        server
    }

    #[test]
    fn sums_over_attached_endpoints_only() {
        let server = server_with(&[0, 1]);
        let mut demand = DemandMatrix::new(2);
        demand.set(0, 0, 5);
        demand.set(0, 1, 4);
        demand.set(0, 2, 100); // Not attached.
        demand.set(1, 2, 7); // Not attached.

        let entries = aggregate_demand(&server, &demand);
        assert_eq!(
            entries,
            vec![DemandEntry {
                video_id: 0,
                requests: 9
            }]
        );
    }

    #[test]
    fn orders_by_demand_then_id() {
        let server = server_with(&[0]);
        let mut demand = DemandMatrix::new(4);
        demand.set(0, 0, 3);
        demand.set(1, 0, 8);
        demand.set(2, 0, 3);
        demand.set(3, 0, 8);

        let order: Vec<_> = aggregate_demand(&server, &demand)
            .iter()
            .map(|e| (e.video_id, e.requests))
            .collect();
        assert_eq!(order, vec![(1, 8), (3, 8), (0, 3), (2, 3)]);
    }

    #[test]
    fn omits_suppressed_and_absent_demand() {
        let server = server_with(&[0, 1, 2]);
        let mut demand = DemandMatrix::new(3);
        demand.set(0, 0, 6);
        demand.zero(0, 0);
        demand.set(2, 1, 1);

        let entries = aggregate_demand(&server, &demand);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].video_id, 2);
    }

    #[test]
    fn both_walk_directions_agree() {
        // Video 0 has more endpoints than the server; video 1 fewer.
        let server = server_with(&[1, 3]);
        let mut demand = DemandMatrix::new(2);
        for endpoint in 0..5 {
            demand.set(0, endpoint, endpoint as u64 + 1);
        }
        demand.set(1, 3, 2);

        let entries = aggregate_demand(&server, &demand);
        assert_eq!(entries[0], DemandEntry { video_id: 0, requests: 2 + 4 });
        assert_eq!(entries[1], DemandEntry { video_id: 1, requests: 2 });
    }

    #[test]
    fn huge_counts_saturate() {
        let server = server_with(&[0, 1, 2]);
        let mut demand = DemandMatrix::new(2);
        for endpoint in 0..3 {
            demand.set(0, endpoint, i64::MAX as u64);
        }
        demand.set(1, 0, 1);

        let entries = aggregate_demand(&server, &demand);
        assert_eq!(entries[0], DemandEntry { video_id: 0, requests: u64::MAX });
        assert_eq!(entries[1], DemandEntry { video_id: 1, requests: 1 });
    }

    #[test]
    fn server_without_endpoints_sees_nothing() {
        let server = server_with(&[]);
        let mut demand = DemandMatrix::new(1);
        demand.set(0, 0, 10);

        assert!(aggregate_demand(&server, &demand).is_empty());
    }
}
