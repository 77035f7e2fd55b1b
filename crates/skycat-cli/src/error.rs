//! Error types for the skycat CLI
//!
//! Messages are user-facing: they say what went wrong and what to do about
//! it. Per-chunk failures that should not stop a run are not errors at all,
//! they are carried as [`crate::outcome::ChunkOutcome`] values.

use thiserror::Error;

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

/// Comprehensive error type for CLI operations
#[derive(Error, Debug)]
pub enum CliError {
    /// Error bubbled up from the skycat core
    #[error(transparent)]
    Common(#[from] skycat_common::SkycatError),

    /// File system operation failed
    #[error("File operation failed: {0}. Check file permissions and free space in the working directory.")]
    Io(#[from] std::io::Error),

    /// HTTP request failed
    #[error("Network request failed: {0}. Check your internet connection and the service URLs.")]
    Http(#[from] reqwest::Error),

    /// SOAP service returned something unusable
    #[error("SOAP service error: {0}")]
    Soap(String),

    /// External command could not be spawned
    #[error("Failed to run external command '{0}'. Is it installed and on your PATH?")]
    Command(String),

    /// Output file already present; refusing to overwrite
    #[error("Output file '{0}' already exists. Remove it (or use --nskip to resume past this chunk) and rerun.")]
    OutputExists(String),

    /// Credentials file missing or malformed
    #[error("Credentials error: {0}. The auth file must contain two lines: username then password.")]
    Credentials(String),

    /// Configuration is missing or invalid
    #[error("Configuration error: {0}. Check your SKYCAT_* environment variables.")]
    Config(String),

    /// JSON serialization failed
    #[error("Failed to produce JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic anyhow error wrapper
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CliError {
    /// Create a SOAP error
    pub fn soap(msg: impl Into<String>) -> Self {
        Self::Soap(msg.into())
    }

    /// Create a command error
    pub fn command(msg: impl Into<String>) -> Self {
        Self::Command(msg.into())
    }

    /// Create a credentials error
    pub fn credentials(msg: impl Into<String>) -> Self {
        Self::Credentials(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// True for errors that must abort the whole run rather than being
    /// charged to the current chunk: precondition violations and local I/O.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            CliError::OutputExists(_)
                | CliError::Io(_)
                | CliError::Common(_)
                | CliError::Config(_)
                | CliError::Credentials(_)
        )
    }
}
