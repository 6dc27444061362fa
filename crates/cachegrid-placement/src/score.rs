//! Solution validation and latency-saving score.
//!
//! Scoring needs the demand as loaded, before any suppression: pass a
//! catalog that has not been through the optimizer (or a clone taken
//! before the run).

use std::collections::{HashMap, HashSet};

use cachegrid_core::{Catalog, EndpointId, SolutionError, SolutionResult, Solution, VideoId};
use serde::Serialize;

/// Latency savings of a solution against its catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScoreReport {
    /// `floor(saved_latency * 1000 / total_requests)`.
    pub score: u64,
    /// Sum over requests of the latency saved versus the datacenter.
    pub saved_latency: u64,
    pub total_requests: u64,
    /// Requests served faster by some cache than by the datacenter.
    pub cached_requests: u64,
    pub servers_used: usize,
    pub placements: usize,
}

/// Check a solution against the catalog it was computed for.
///
/// Server and video ids must exist, no server may list a video twice, and
/// the videos on each server must fit within its capacity.
pub fn validate(catalog: &Catalog, solution: &Solution) -> SolutionResult<()> {
    for placement in solution.placements() {
        let server = catalog
            .server(placement.server)
            .ok_or(SolutionError::UnknownServer(placement.server))?;

        let mut seen = HashSet::new();
        let mut used: u64 = 0;
        for &video_id in &placement.videos {
            let video = catalog.video(video_id).ok_or(SolutionError::UnknownVideo {
                server: server.id,
                video: video_id,
            })?;
            if !seen.insert(video_id) {
                return Err(SolutionError::DuplicateVideo {
                    server: server.id,
                    video: video_id,
                });
            }
            used = used.saturating_add(video.size);
        }

        if used > server.capacity {
            return Err(SolutionError::CapacityExceeded {
                server: server.id,
                used,
                capacity: server.capacity,
            });
        }
    }
    Ok(())
}

/// Score `solution` against the catalog's loaded demand.
///
/// Each request record is served by the lowest-latency cache that holds
/// its video and is attached to its endpoint, or by the datacenter when no
/// such cache is faster. The solution must already be valid.
pub fn score(catalog: &Catalog, solution: &Solution) -> ScoreReport {
    let mut best: HashMap<(VideoId, EndpointId), u64> = HashMap::new();
    for placement in solution.placements() {
        let Some(server) = catalog.server(placement.server) else {
            continue;
        };
        for &video in &placement.videos {
            for (&endpoint, &latency) in &server.endpoints {
                if catalog.demand.get(video, endpoint) == 0 {
                    continue;
                }
                best.entry((video, endpoint))
                    .and_modify(|l| *l = (*l).min(latency))
                    .or_insert(latency);
            }
        }
    }

    let mut report = ScoreReport {
        servers_used: solution.len(),
        placements: solution.placement_count(),
        ..ScoreReport::default()
    };

    // Wide accumulators: request counts and latencies are each u64.
    let mut total_requests = 0u128;
    let mut saved_latency = 0u128;
    let mut cached_requests = 0u128;

    for (video, endpoint, count) in catalog.demand.records() {
        total_requests += u128::from(count);

        let Some(datacenter) = catalog.endpoint(endpoint).map(|e| e.datacenter_latency) else {
            continue;
        };
        if let Some(&cached) = best.get(&(video, endpoint)) {
            if cached < datacenter {
                saved_latency = saved_latency
                    .saturating_add(u128::from(datacenter - cached) * u128::from(count));
                cached_requests += u128::from(count);
            }
        }
    }

    report.total_requests = clamp_u64(total_requests);
    report.saved_latency = clamp_u64(saved_latency);
    report.cached_requests = clamp_u64(cached_requests);
    if total_requests > 0 {
        report.score = clamp_u64(saved_latency.saturating_mul(1000) / total_requests);
    }
    report
}

fn clamp_u64(value: u128) -> u64 {
    u64::try_from(value).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cachegrid_core::parse_catalog;

    // Two endpoints; endpoint 0 reaches caches 0 (100), 2 (200), 1 (300).
    const SAMPLE: &str = "\
5 2 4 3 100
50 50 80 30 110
1000 3
0 100
2 200
1 300
500 0
3 0 1500
0 1 1000
4 0 500
1 0 1000
";

    fn reference_solution() -> Solution {
        let mut solution = Solution::new();
        solution.push(0, 2);
        solution.push(1, 3);
        solution.push(1, 1);
        solution.push(2, 0);
        solution.push(2, 1);
        solution
    }

    #[test]
    fn scores_reference_example() {
        let catalog = parse_catalog(SAMPLE).unwrap();
        let solution = reference_solution();

        validate(&catalog, &solution).unwrap();
        let report = score(&catalog, &solution);

        // Video 3 from cache 1: 1500 * 700; video 1 from cache 2: 1000 * 800.
        assert_eq!(report.saved_latency, 1_050_000 + 800_000);
        assert_eq!(report.total_requests, 4000);
        assert_eq!(report.cached_requests, 2500);
        assert_eq!(report.score, 462_500);
        assert_eq!(report.servers_used, 3);
        assert_eq!(report.placements, 5);
    }

    #[test]
    fn empty_solution_scores_zero() {
        let catalog = parse_catalog(SAMPLE).unwrap();
        let report = score(&catalog, &Solution::new());
        assert_eq!(report.score, 0);
        assert_eq!(report.total_requests, 4000);
    }

    #[test]
    fn huge_counts_do_not_overflow() {
        let input = "\
1 3 3 1 10
5
1000 1
0 1
1000 1
0 1
1000 1
0 1
0 0 9223372036854775807
0 1 9223372036854775807
0 2 9223372036854775807
";
        let catalog = parse_catalog(input).unwrap();
        let mut solution = Solution::new();
        solution.push(0, 0);

        let report = score(&catalog, &solution);
        assert_eq!(report.total_requests, u64::MAX);
        assert_eq!(report.cached_requests, u64::MAX);
        assert_eq!(report.saved_latency, u64::MAX);
        // Every request saves 999, so the exact score is 999 * 1000.
        assert_eq!(report.score, 999_000);
    }

    #[test]
    fn validate_rejects_over_capacity() {
        let catalog = parse_catalog(SAMPLE).unwrap();
        let mut solution = Solution::new();
        solution.push(0, 4); // 110 > 100

        let err = validate(&catalog, &solution).unwrap_err();
        assert!(matches!(
            err,
            SolutionError::CapacityExceeded {
                server: 0,
                used: 110,
                capacity: 100
            }
        ));
    }

    #[test]
    fn validate_rejects_unknown_ids_and_duplicates() {
        let catalog = parse_catalog(SAMPLE).unwrap();

        let mut solution = Solution::new();
        solution.push(9, 0);
        assert!(matches!(
            validate(&catalog, &solution),
            Err(SolutionError::UnknownServer(9))
        ));

        let mut solution = Solution::new();
        solution.push(0, 42);
        assert!(matches!(
            validate(&catalog, &solution),
            Err(SolutionError::UnknownVideo { server: 0, video: 42 })
        ));

        let mut solution = Solution::new();
        solution.push(0, 3);
        solution.push(0, 3);
        assert!(matches!(
            validate(&catalog, &solution),
            Err(SolutionError::DuplicateVideo { server: 0, video: 3 })
        ));
    }
}
