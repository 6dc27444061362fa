//! Suppression of demand that a placement now satisfies.

use cachegrid_core::{CacheServer, DemandMatrix, VideoId};
use tracing::trace;

/// The only writer of the demand matrix during a run.
///
/// After `video` is placed on `server`, every endpoint attached to that
/// server is served from cache, so its outstanding count for the video is
/// set to zero. Counts never go back up.
#[derive(Debug)]
pub struct DemandSuppressor<'a> {
    demand: &'a mut DemandMatrix,
    suppressed: u64,
}

impl<'a> DemandSuppressor<'a> {
    pub fn new(demand: &'a mut DemandMatrix) -> Self {
        Self {
            demand,
            suppressed: 0,
        }
    }

    /// Zero `video`'s demand at `server`'s endpoints. Returns how many
    /// outstanding requests were cleared.
    pub fn suppress(&mut self, server: &CacheServer, video: VideoId) -> u64 {
        let cleared: u64 = server
            .endpoints
            .keys()
            .fold(0, |acc: u64, &endpoint| {
                acc.saturating_add(self.demand.zero(video, endpoint))
            });
        trace!(server = server.id, video, cleared, "demand suppressed");
        self.suppressed = self.suppressed.saturating_add(cleared);
        cleared
    }

    /// Requests cleared by this suppressor so far.
    pub fn total_suppressed(&self) -> u64 {
        self.suppressed
    }
}
