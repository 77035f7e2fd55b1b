//! Common types used across skycat

use serde::{Deserialize, Serialize};

use crate::error::{Result, SkycatError};

/// A rectangular (RA, Dec) bounding box on the sky, in degrees.
///
/// Invariant: `ra_low < ra_high` and `dec_low < dec_high`, enforced by the
/// constructor. Immutable once created.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub ra_low: f64,
    pub ra_high: f64,
    pub dec_low: f64,
    pub dec_high: f64,
}

impl Region {
    /// Create a region, rejecting empty or inverted ranges
    pub fn new(ra_low: f64, ra_high: f64, dec_low: f64, dec_high: f64) -> Result<Self> {
        if !(ra_low < ra_high) {
            return Err(SkycatError::InvalidRegion(format!(
                "RA range [{}, {}] is empty or inverted",
                ra_low, ra_high
            )));
        }
        if !(dec_low < dec_high) {
            return Err(SkycatError::InvalidRegion(format!(
                "Dec range [{}, {}] is empty or inverted",
                dec_low, dec_high
            )));
        }
        Ok(Self {
            ra_low,
            ra_high,
            dec_low,
            dec_high,
        })
    }
}

impl std::fmt::Display for Region {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "RA [{}, {}] Dec [{}, {}]",
            self.ra_low, self.ra_high, self.dec_low, self.dec_high
        )
    }
}

/// One cell of the partition grid: a sub-region plus its position in the
/// enumeration order. Created once at partition time and consumed exactly
/// once by a job runner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    /// Ascending index starting at 0, RA outer loop, Dec inner loop
    pub index: usize,
    pub region: Region,
}

/// Status codes reported by the remote job service.
///
/// The wire format is a bare integer; this enum is the only place the raw
/// codes are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobStatus {
    Ready,
    Started,
    Cancelling,
    Cancelled,
    Failed,
    Finished,
    All,
}

impl JobStatus {
    /// Decode a raw status integer from the service
    pub fn from_code(code: i32) -> Result<Self> {
        match code {
            0 => Ok(JobStatus::Ready),
            1 => Ok(JobStatus::Started),
            2 => Ok(JobStatus::Cancelling),
            3 => Ok(JobStatus::Cancelled),
            4 => Ok(JobStatus::Failed),
            5 => Ok(JobStatus::Finished),
            6 => Ok(JobStatus::All),
            _ => Err(SkycatError::UnknownStatus(code)),
        }
    }

    /// True for statuses a job can never leave
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            JobStatus::Cancelled | JobStatus::Failed | JobStatus::Finished
        )
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            JobStatus::Ready => "ready",
            JobStatus::Started => "started",
            JobStatus::Cancelling => "cancelling",
            JobStatus::Cancelled => "cancelled",
            JobStatus::Failed => "failed",
            JobStatus::Finished => "finished",
            JobStatus::All => "all",
        };
        write!(f, "{}", name)
    }
}
