//! cachegrid placement engine — greedy video-to-cache assignment.
//!
//! Servers are processed one at a time, best mean latency first. Each one
//! is filled with the videos that have the most outstanding demand through
//! its endpoints, and the demand it now serves is suppressed so later
//! servers do not count it again.
//!
//! # Components
//!
//! - **`ranker`** — Server ordering by mean endpoint latency
//! - **`aggregator`** — Per-server outstanding demand per video
//! - **`packer`** — Greedy capacity filling
//! - **`suppressor`** — Zeroing demand served by a new placement
//! - **`optimizer`** — The step loop, cancellation, and run outcome
//! - **`score`** — Solution validation and latency-saving score

pub mod aggregator;
pub mod optimizer;
pub mod packer;
pub mod ranker;
pub mod score;
pub mod suppressor;

pub use aggregator::{DemandEntry, aggregate_demand};
pub use optimizer::{
    CancelToken, Optimizer, OptimizerOptions, RunOutcome, StepReport, optimize, optimize_with,
};
pub use packer::{PackReport, pack};
pub use ranker::{LatencyRanker, ServerRank, rank_servers};
pub use score::{ScoreReport, score, validate};
pub use suppressor::DemandSuppressor;
