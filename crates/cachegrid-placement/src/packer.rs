//! Greedy capacity packing for one server.
//!
//! Walks the server's demand list from the most requested video down and
//! admits every video that still fits. A video that does not fit is skipped
//! and the walk continues, so smaller videos further down can still use
//! the leftover space. This is not a knapsack solver and does not weigh
//! demand against size.

use cachegrid_core::{CacheServer, Video, VideoId};
use serde::Serialize;
use tracing::trace;

use crate::aggregator::DemandEntry;

/// What one packing pass did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PackReport {
    /// Videos admitted, in admission order.
    pub admitted: Vec<VideoId>,
    /// Demand entries skipped because the video no longer fit.
    pub skipped: usize,
    /// Space consumed by this pass.
    pub space_used: u64,
    /// Aggregated requests of the admitted videos.
    pub requests_covered: u64,
}

/// Fill `server` from `demand`, calling `on_admit` right after each
/// admission.
///
/// `videos` is indexed by video id. Every entry in `demand` must name a
/// video in `videos`.
pub fn pack<F>(
    server: &mut CacheServer,
    demand: &[DemandEntry],
    videos: &[Video],
    mut on_admit: F,
) -> PackReport
where
    F: FnMut(&CacheServer, VideoId),
{
    let mut report = PackReport::default();

    for entry in demand {
        let size = videos[entry.video_id].size;
        if !server.fits(size) {
            report.skipped += 1;
            trace!(
                server = server.id,
                video = entry.video_id,
                size,
                free = server.free_space(),
                "video does not fit"
            );
            continue;
        }

        server.used += size;
        debug_assert!(server.used <= server.capacity, "server {} over capacity", server.id);

        report.admitted.push(entry.video_id);
        report.space_used += size;
        report.requests_covered = report.requests_covered.saturating_add(entry.requests);

        on_admit(server, entry.video_id);
    }

    report
}
