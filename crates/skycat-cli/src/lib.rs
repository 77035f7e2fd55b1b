//! Skycat CLI Library
//!
//! Command-line tool for downloading a sky catalogue from PS1 or SDSS in
//! chunks.
//!
//! # Overview
//!
//! A requested (RA, Dec) bounding box is split into a grid of chunks; each
//! chunk becomes one remote SQL query whose result is extracted and
//! downloaded as a file, with one manifest row per dispatched chunk:
//!
//! - **Planning**: preview the chunk grid (`skycat plan`)
//! - **Fetching**: run the queries to completion (`skycat fetch`)
//! - **Backends**: the CasJobs batch binary, or the PSPS SOAP services
//!   when an auth file is passed

pub mod casjobs;
pub mod commands;
pub mod config;
pub mod credentials;
pub mod error;
pub mod exec;
pub mod manifest;
pub mod outcome;
pub mod progress;
pub mod psps;

// Re-export commonly used types
pub use error::{CliError, Result};
pub use outcome::ChunkOutcome;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use skycat_common::query::BuiltinQuery;

use crate::psps::JobType;

/// skycat - chunked sky-catalogue downloader
#[derive(Parser, Debug)]
#[command(name = "skycat")]
#[command(author, version, about, long_about = None)]
#[command(arg_required_else_help = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Download a catalogue in chunks
    Fetch(FetchArgs),

    /// Show the chunk grid without submitting anything
    Plan(PlanArgs),
}

/// Arguments for `skycat fetch`
#[derive(Args, Debug)]
pub struct FetchArgs {
    /// Your username on CasJobs/PSPS (part of the output file names)
    pub username: String,

    /// Lower RA limit in degrees
    pub ra_low: f64,

    /// Upper RA limit in degrees
    pub ra_high: f64,

    /// Lower Dec limit in degrees
    pub dec_low: f64,

    /// Upper Dec limit in degrees
    pub dec_high: f64,

    /// Template for catalogue names; '{}' is replaced with the chunk index
    /// (e.g. "cat_{}"), required when more than one chunk is requested
    pub name_template: String,

    /// Number of chunks to split the catalogue into (the grid rounds this
    /// down to a square number)
    #[arg(long, default_value_t = 100)]
    pub nchunks: i64,

    /// Manifest file listing every dispatched chunk
    #[arg(long, default_value = "cat_list.txt")]
    pub manifest: PathBuf,

    /// Number of leading chunks to skip (resume a previous run)
    #[arg(long, default_value_t = 0)]
    pub nskip: usize,

    /// Don't run queries, just go through the control flow
    #[arg(long)]
    pub dry_run: bool,

    /// File with username and password; selects the PSPS backend instead of
    /// CasJobs
    #[arg(long, value_name = "FILE")]
    pub psps_auth: Option<PathBuf>,

    /// Builtin query to run per chunk (ps1-view, ps1, sdss, test)
    #[arg(long, default_value = "ps1-view")]
    pub source: BuiltinQuery,

    /// Custom SQL template file, overrides --source
    #[arg(long, value_name = "FILE")]
    pub query_file: Option<PathBuf>,

    /// Seconds between download attempts (CasJobs) or status polls (PSPS);
    /// defaults to 180 and 5 respectively
    #[arg(long)]
    pub wait_secs: Option<u64>,

    /// Download attempts per chunk before giving up (CasJobs backend)
    #[arg(long, default_value_t = crate::casjobs::DEFAULT_MAX_TRIES)]
    pub max_tries: u32,

    /// Deadline in seconds for a PSPS job to reach a terminal status
    #[arg(long, default_value_t = 3600)]
    pub poll_timeout_secs: u64,

    /// PSPS execution mode: fast (synchronous) or slow (tracked job)
    #[arg(long, default_value = "slow")]
    pub job_type: JobType,
}

/// Arguments for `skycat plan`
#[derive(Args, Debug)]
pub struct PlanArgs {
    /// Lower RA limit in degrees
    pub ra_low: f64,

    /// Upper RA limit in degrees
    pub ra_high: f64,

    /// Lower Dec limit in degrees
    pub dec_low: f64,

    /// Upper Dec limit in degrees
    pub dec_high: f64,

    /// Template for catalogue names; '{}' is replaced with the chunk index
    pub name_template: String,

    /// Number of chunks to split the catalogue into
    #[arg(long, default_value_t = 100)]
    pub nchunks: i64,

    /// Emit the plan as JSON
    #[arg(long)]
    pub json: bool,
}
