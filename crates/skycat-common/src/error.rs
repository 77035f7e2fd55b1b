//! Error types for skycat

use thiserror::Error;

/// Result type alias for skycat operations
pub type Result<T> = std::result::Result<T, SkycatError>;

/// Main error type for the skycat core
#[derive(Error, Debug)]
pub enum SkycatError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid region: {0}")]
    InvalidRegion(String),

    #[error("Invalid chunk count: {0} (must be at least 1)")]
    InvalidChunkCount(i64),

    #[error("Template error: {0}")]
    Template(String),

    #[error("Unknown job status code: {0}")]
    UnknownStatus(i32),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Parse error: {0}")]
    Parse(String),
}
