//! Placement engine — drives the per-server greedy loop.
//!
//! Each step:
//! 1. Takes the best-ranked remaining server (lowest mean latency)
//! 2. Aggregates the demand reachable through its endpoints
//! 3. Packs it greedily, suppressing satisfied demand after each admission
//! 4. Retires it for good
//!
//! Suppression in one step changes what later servers see, so steps run
//! strictly in order. A run performs one step per server and then stops.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use cachegrid_core::{Catalog, ServerId, Solution};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::aggregator::aggregate_demand;
use crate::packer::pack;
use crate::ranker::LatencyRanker;
use crate::suppressor::DemandSuppressor;

/// Shared flag used to stop a run between server steps.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone)]
pub struct OptimizerOptions {
    /// Number of progress lines logged over a run. 0 disables them.
    pub progress_steps: usize,
}

impl Default for OptimizerOptions {
    fn default() -> Self {
        Self { progress_steps: 10 }
    }
}

/// Summary of one server step.
#[derive(Debug, Clone, Serialize)]
pub struct StepReport {
    pub server_id: ServerId,
    pub mean_latency: f64,
    /// Videos with any reachable demand at selection time.
    pub candidates: usize,
    pub admitted: usize,
    pub skipped: usize,
    pub space_used: u64,
    pub requests_suppressed: u64,
}

/// Result of a complete or cancelled run.
#[derive(Debug, Clone, Serialize)]
pub struct RunOutcome {
    pub solution: Solution,
    pub servers_processed: usize,
    pub servers_total: usize,
    pub requests_suppressed: u64,
    /// True if the run stopped before every server was processed. The
    /// solution then covers only the servers fully processed.
    pub cancelled: bool,
}

/// Step-wise placement over one catalog.
///
/// Borrows the catalog mutably for the whole run: server usage and the
/// demand matrix change as steps complete.
#[derive(Debug)]
pub struct Optimizer<'a> {
    catalog: &'a mut Catalog,
    ranker: LatencyRanker,
    solution: Solution,
    processed: usize,
    suppressed: u64,
}

impl<'a> Optimizer<'a> {
    pub fn new(catalog: &'a mut Catalog) -> Self {
        let ranker = LatencyRanker::new(&catalog.servers);
        Self {
            catalog,
            ranker,
            solution: Solution::new(),
            processed: 0,
            suppressed: 0,
        }
    }

    /// Current catalog state, including demand suppressed so far.
    pub fn catalog(&self) -> &Catalog {
        &*self.catalog
    }

    pub fn ranker(&self) -> &LatencyRanker {
        &self.ranker
    }

    pub fn solution(&self) -> &Solution {
        &self.solution
    }

    pub fn is_done(&self) -> bool {
        self.ranker.is_empty()
    }

    /// Process the best remaining server. Returns `None` once every server
    /// has been retired.
    pub fn step(&mut self) -> Option<StepReport> {
        let best = self.ranker.best()?;
        let server_id = best.server_id;

        let Catalog {
            videos,
            servers,
            demand,
            ..
        } = &mut *self.catalog;

        // The ranker was built from this same slice, which never changes length.
        let server = &mut servers[best.position];
        let candidates = aggregate_demand(server, demand);

        let solution = &mut self.solution;
        let mut suppressor = DemandSuppressor::new(demand);
        let packed = pack(server, &candidates, videos, |server, video| {
            solution.push(server.id, video);
            suppressor.suppress(server, video);
        });
        let requests_suppressed = suppressor.total_suppressed();

        self.ranker.retire_best();
        self.processed += 1;
        self.suppressed = self.suppressed.saturating_add(requests_suppressed);

        let report = StepReport {
            server_id,
            mean_latency: best.mean_latency.as_f64(),
            candidates: candidates.len(),
            admitted: packed.admitted.len(),
            skipped: packed.skipped,
            space_used: packed.space_used,
            requests_suppressed,
        };
        debug!(
            server = server_id,
            mean_latency = report.mean_latency,
            candidates = report.candidates,
            admitted = report.admitted,
            skipped = report.skipped,
            space_used = report.space_used,
            "server filled"
        );
        Some(report)
    }

    /// Run remaining steps until done or `cancel` is set.
    pub fn run(mut self, options: &OptimizerOptions, cancel: &CancelToken) -> RunOutcome {
        let total = self.catalog.servers.len();
        let mut cancelled = false;
        let mut reported = 0;

        while !self.is_done() {
            if cancel.is_cancelled() {
                cancelled = true;
                break;
            }
            self.step();

            if options.progress_steps > 0 {
                let bucket = self.processed * options.progress_steps / total;
                if bucket > reported {
                    reported = bucket;
                    info!(
                        processed = self.processed,
                        total,
                        percent = self.processed * 100 / total,
                        "progress"
                    );
                }
            }
        }

        if cancelled {
            warn!(
                processed = self.processed,
                total,
                "placement cancelled, keeping partial solution"
            );
        }

        RunOutcome {
            solution: self.solution,
            servers_processed: self.processed,
            servers_total: total,
            requests_suppressed: self.suppressed,
            cancelled,
        }
    }
}

/// Place videos on every server of `catalog`.
pub fn optimize(catalog: &mut Catalog) -> Solution {
    optimize_with(catalog, &OptimizerOptions::default(), &CancelToken::new()).solution
}

/// Place videos on every server of `catalog`, stopping early if `cancel`
/// is set.
pub fn optimize_with(
    catalog: &mut Catalog,
    options: &OptimizerOptions,
    cancel: &CancelToken,
) -> RunOutcome {
    info!(%catalog, "placement starting");
    let outcome = Optimizer::new(catalog).run(options, cancel);
    info!(
        servers_used = outcome.solution.len(),
        placements = outcome.solution.placement_count(),
        requests_suppressed = outcome.requests_suppressed,
        "placement finished"
    );
    outcome
}
