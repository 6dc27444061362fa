//! Error types for loading problem inputs, solutions and config.

use thiserror::Error;

use crate::types::{ServerId, VideoId};

/// Result type alias for input loading.
pub type CatalogResult<T> = Result<T, CatalogError>;

/// Malformed problem input. Line numbers are 1-based.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read input: {0}")]
    Io(#[from] std::io::Error),

    #[error("line {line}: unexpected end of input, expected {expected}")]
    UnexpectedEof { line: usize, expected: &'static str },

    #[error("line {line}: expected {expected} values, found {found}")]
    FieldCount {
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("line {line}: invalid integer {value:?}")]
    InvalidNumber { line: usize, value: String },

    #[error("line {line}: {field} must not be negative, got {value}")]
    Negative {
        line: usize,
        field: &'static str,
        value: i64,
    },

    #[error("line {line}: {field} {count} exceeds limit {limit}")]
    CountTooLarge {
        line: usize,
        field: &'static str,
        count: u64,
        limit: usize,
    },

    #[error("line {line}: video {video} has zero size")]
    ZeroSize { line: usize, video: VideoId },

    #[error("line {line}: {kind} id {id} out of range (count {count})")]
    IdOutOfRange {
        line: usize,
        kind: &'static str,
        id: u64,
        count: usize,
    },

    #[error("line {line}: unexpected trailing content")]
    TrailingContent { line: usize },
}

/// Result type alias for solution parsing and validation.
pub type SolutionResult<T> = Result<T, SolutionError>;

/// A solution file that cannot be read, or does not fit its catalog.
#[derive(Debug, Error)]
pub enum SolutionError {
    #[error("failed to read solution: {0}")]
    Io(#[from] std::io::Error),

    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("declared {declared} servers but found {found}")]
    ServerCount { declared: usize, found: usize },

    #[error("server {0} listed more than once")]
    DuplicateServer(ServerId),

    #[error("unknown server {0}")]
    UnknownServer(ServerId),

    #[error("unknown video {video} on server {server}")]
    UnknownVideo { server: ServerId, video: VideoId },

    #[error("video {video} placed twice on server {server}")]
    DuplicateVideo { server: ServerId, video: VideoId },

    #[error("server {server} over capacity: {used} > {capacity}")]
    CapacityExceeded {
        server: ServerId,
        used: u64,
        capacity: u64,
    },
}

/// Failures loading a `cachegrid.toml` file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("invalid config {path}: {source}")]
    Parse {
        path: String,
        source: toml::de::Error,
    },

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}
