//! PSPS job runner
//!
//! Runs one chunk through the PSPS SOAP services. Fast jobs execute
//! synchronously and return the result text; slow jobs are tracked by id and
//! polled to a terminal status, then extracted to FITS, downloaded from the
//! datastore over HTTP, and the intermediate MyDB table is dropped with a
//! fire-and-forget job.
//!
//! Polling is bounded by a deadline; a job that never reaches a terminal
//! status fails the chunk instead of hanging the run forever.

pub mod soap;

use std::path::PathBuf;
use std::time::Duration;

use reqwest::Client;
use tokio::time::Instant;
use tracing::{info, warn};
use url::Url;

use skycat_common::types::JobStatus;

use crate::casjobs::output_file_name;
use crate::config::Config;
use crate::credentials::Credentials;
use crate::error::{CliError, Result};
use crate::outcome::ChunkOutcome;

pub use soap::SoapClient;

/// Default pause between status polls
pub const DEFAULT_POLL_WAIT: Duration = Duration::from_secs(5);

/// Default deadline for one job to reach a terminal status
pub const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_secs(3600);

/// Time estimate passed with tracked query jobs, in seconds
const QUERY_TIME_ESTIMATE_SECS: i32 = 600;

/// Time estimate for the drop-table cleanup job
const DROP_TIME_ESTIMATE_SECS: i32 = 10;

/// Whether a query runs synchronously or as a tracked job
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobType {
    /// Synchronous quick execution, result returned in-band
    Fast,
    /// Tracked job polled to completion, result extracted and downloaded
    Slow,
}

impl std::fmt::Display for JobType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobType::Fast => write!(f, "fast"),
            JobType::Slow => write!(f, "slow"),
        }
    }
}

impl std::str::FromStr for JobType {
    type Err = CliError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "fast" => Ok(JobType::Fast),
            "slow" => Ok(JobType::Slow),
            _ => Err(CliError::config(format!(
                "unknown job type '{}': must be either fast or slow",
                s
            ))),
        }
    }
}

/// Per-run settings for the PSPS backend
#[derive(Debug, Clone)]
pub struct PspsSettings {
    /// Username used in the produced file name (the login username comes
    /// from the auth file)
    pub username: String,
    /// Pause between status polls
    pub wait: Duration,
    /// Deadline for each polling stage
    pub poll_timeout: Duration,
    /// Fast (synchronous) or slow (tracked) execution
    pub job_type: JobType,
    /// Report planned operations without any network calls
    pub dry_run: bool,
    /// Directory output files are written to
    pub work_dir: PathBuf,
}

/// What a polling stage ended with
enum PollResult {
    Terminal(JobStatus),
    DeadlineExceeded,
}

/// Job runner for the PSPS SOAP system
#[derive(Debug)]
pub struct PspsRunner {
    settings: PspsSettings,
    config: Config,
    soap: SoapClient,
    http: Client,
}

impl PspsRunner {
    pub fn new(settings: PspsSettings, config: Config) -> Result<Self> {
        let soap = SoapClient::new(config.psps_auth_url.clone(), config.psps_jobs_url.clone())?;
        let http = Client::builder().timeout(soap::http_timeout()).build()?;
        Ok(Self {
            settings,
            config,
            soap,
            http,
        })
    }

    /// Run one chunk's query to completion.
    ///
    /// Consumes the credentials; the password is gone once the login call
    /// returns.
    pub async fn run(
        &self,
        mut credentials: Credentials,
        table_name: &str,
        query: &str,
    ) -> Result<ChunkOutcome> {
        let fname = output_file_name(table_name, &self.settings.username);
        let fpath = self.settings.work_dir.join(&fname);
        if fpath.exists() {
            return Err(CliError::OutputExists(fname));
        }

        if self.settings.dry_run {
            info!(
                table_name,
                job_type = ?self.settings.job_type,
                "dry run: would authenticate and submit PSPS query"
            );
            return Ok(ChunkOutcome::Skipped);
        }

        info!(username = %credentials.username, "authenticating");
        let password = credentials.take_password()?;
        let session_id = self.soap.login(&credentials.username, password).await?;
        info!("login successful");

        let task = format!("Executing {} query from skycat", self.settings.job_type);

        match self.settings.job_type {
            JobType::Fast => {
                let results = self
                    .soap
                    .execute_quick_job(
                        &session_id,
                        &self.config.schema_group,
                        query,
                        &self.config.schema,
                        &task,
                    )
                    .await?;
                std::fs::write(&fpath, results)?;
                info!(file = %fpath.display(), "wrote quick job results");
                Ok(ChunkOutcome::Downloaded)
            },
            JobType::Slow => self.run_slow(&session_id, table_name, query, &task, &fpath).await,
        }
    }

    /// The tracked-job state machine: submit, poll, extract, poll, download,
    /// drop.
    async fn run_slow(
        &self,
        session_id: &str,
        table_name: &str,
        query: &str,
        task: &str,
        fpath: &std::path::Path,
    ) -> Result<ChunkOutcome> {
        let job_id = self
            .soap
            .submit_job(
                session_id,
                &self.config.schema_group,
                query,
                &self.config.schema,
                task,
                QUERY_TIME_ESTIMATE_SECS,
            )
            .await?;
        info!(job_id, "submitted job, waiting for it to finish");

        match self.wait_for_job(session_id, job_id).await? {
            PollResult::Terminal(JobStatus::Finished) => {},
            PollResult::Terminal(status) => {
                warn!(job_id, %status, "query job did not finish");
                return Ok(ChunkOutcome::Failed(format!("query job {}", status)));
            },
            PollResult::DeadlineExceeded => {
                warn!(job_id, "gave up polling query job");
                return Ok(ChunkOutcome::Failed("query job poll deadline exceeded".into()));
            },
        }

        info!("job successful, running extract job");
        let extract_id = self
            .soap
            .submit_extract_job(session_id, &self.config.schema_group, table_name, "FITS")
            .await?;

        match self.wait_for_job(session_id, extract_id).await? {
            PollResult::Terminal(JobStatus::Finished) => {},
            PollResult::Terminal(status) => {
                warn!(extract_id, %status, "extract job did not finish");
                return Ok(ChunkOutcome::Failed(format!("extract job {}", status)));
            },
            PollResult::DeadlineExceeded => {
                warn!(extract_id, "gave up polling extract job");
                return Ok(ChunkOutcome::Failed(
                    "extract job poll deadline exceeded".into(),
                ));
            },
        }

        info!("downloading catalogue");
        self.download(fpath).await?;

        // Fire-and-forget cleanup: submit the drop job but never poll it
        info!(table_name, "dropping table");
        if let Err(e) = self
            .soap
            .submit_job(
                session_id,
                &self.config.schema_group,
                &format!("drop table {}", table_name),
                "MYDB",
                "Dropping table",
                DROP_TIME_ESTIMATE_SECS,
            )
            .await
        {
            warn!(error = %e, table_name, "could not submit drop-table job");
        }

        Ok(ChunkOutcome::Downloaded)
    }

    /// Poll a job until a terminal status or the deadline, whichever first
    async fn wait_for_job(&self, session_id: &str, job_id: i64) -> Result<PollResult> {
        info!(job_id, "waiting for job");
        let deadline = Instant::now() + self.settings.poll_timeout;

        loop {
            let status = self
                .soap
                .get_job_status(session_id, &self.config.schema_group, job_id)
                .await?;
            if status.is_terminal() {
                return Ok(PollResult::Terminal(status));
            }

            let now = Instant::now();
            if now >= deadline {
                return Ok(PollResult::DeadlineExceeded);
            }
            tokio::time::sleep(self.settings.wait.min(deadline - now)).await;
        }
    }

    /// Fetch the extracted FITS file from the datastore
    async fn download(&self, fpath: &std::path::Path) -> Result<()> {
        let fname = fpath
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| CliError::config("output path has no file name".to_string()))?;
        let url = Url::parse(&self.config.psps_datastore_url)
            .and_then(|base| base.join(fname))
            .map_err(|e| {
                CliError::config(format!(
                    "bad datastore URL '{}': {}",
                    self.config.psps_datastore_url, e
                ))
            })?;

        let response = self.http.get(url.clone()).send().await?.error_for_status()?;
        let bytes = response.bytes().await?;
        std::fs::write(fpath, &bytes)?;
        info!(url = %url, file = %fpath.display(), size = bytes.len(), "downloaded");
        Ok(())
    }
}
