//! cachegrid-core — data model and file formats for cache placement.
//!
//! Holds the [`Catalog`] of one problem instance, the [`Solution`] the
//! optimizer produces, the input/output text formats, and the
//! `cachegrid.toml` configuration.

pub mod config;
pub mod error;
pub mod loader;
pub mod solution;
pub mod types;

pub use config::CacheGridConfig;
pub use error::{CatalogError, CatalogResult, ConfigError, SolutionError, SolutionResult};
pub use loader::{load_catalog, parse_catalog};
pub use solution::{ServerPlacement, Solution};
pub use types::*;
