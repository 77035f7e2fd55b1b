//! Per-chunk job outcomes
//!
//! A chunk that fails remotely is not an error: the driver logs it and moves
//! on to the next chunk. Only precondition and local I/O problems surface as
//! `Err` (see `CliError::is_fatal`).

/// What happened to one chunk's job
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChunkOutcome {
    /// Result file fetched and the remote intermediate table dropped
    Downloaded,
    /// Dry run: control flow exercised, no side effects
    Skipped,
    /// Remote job failed, was cancelled, or the retry/poll budget ran out
    Failed(String),
}

impl std::fmt::Display for ChunkOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChunkOutcome::Downloaded => write!(f, "downloaded"),
            ChunkOutcome::Skipped => write!(f, "skipped (dry run)"),
            ChunkOutcome::Failed(reason) => write!(f, "failed: {}", reason),
        }
    }
}
