//! CasJobs batch job runner
//!
//! Runs one catalogue extraction through the external CasJobs binary:
//! submit the query as a batch job, then repeatedly try to extract and fetch
//! the result until the output file appears or the retry budget runs out,
//! and finally drop the intermediate MyDB table.
//!
//! The binary's contract is textual: the extract subcommand prints the
//! datastore URL of the produced file on stdout, and a non-empty stderr
//! means trouble. That scraping lives entirely in this module.

use std::path::PathBuf;
use std::time::Duration;

use tracing::{debug, info, warn};
use url::Url;

use crate::config::Config;
use crate::error::{CliError, Result};
use crate::exec::CommandRunner;
use crate::outcome::ChunkOutcome;

/// Default pause between download attempts
pub const DEFAULT_WAIT: Duration = Duration::from_secs(180);

/// Default number of download attempts before giving up on a chunk
pub const DEFAULT_MAX_TRIES: u32 = 8;

/// Per-run settings for the CasJobs backend
#[derive(Debug, Clone)]
pub struct CasJobsSettings {
    /// CasJobs username, part of the produced file name
    pub username: String,
    /// Pause between download attempts
    pub wait: Duration,
    /// Download attempts before the chunk is declared failed
    pub max_tries: u32,
    /// Echo commands instead of running them
    pub test_mode: bool,
    /// Log the binary's stdout on success as well
    pub verbose: bool,
    /// Directory query files land in and the transfer command downloads to
    pub work_dir: PathBuf,
}

/// Job runner for the CasJobs batch system
#[derive(Debug)]
pub struct CasJobsRunner {
    settings: CasJobsSettings,
    config: Config,
    commands: CommandRunner,
}

impl CasJobsRunner {
    pub fn new(settings: CasJobsSettings, config: Config) -> Self {
        let commands =
            CommandRunner::new(settings.test_mode).with_work_dir(settings.work_dir.clone());
        Self {
            settings,
            config,
            commands,
        }
    }

    /// Run one chunk's query to completion.
    ///
    /// Fatal errors (output file already present, no write permission in the
    /// working directory) come back as `Err`; remote failures are a
    /// [`ChunkOutcome::Failed`].
    pub async fn run(&self, query: &str, table_name: &str) -> Result<ChunkOutcome> {
        let fname = output_file_name(table_name, &self.settings.username);
        let fpath = self.settings.work_dir.join(&fname);
        if fpath.exists() {
            return Err(CliError::OutputExists(fname));
        }

        // The binary reads the query from a file in the working directory
        let fquery = format!("query_tmp.{}", table_name);
        std::fs::write(self.settings.work_dir.join(&fquery), query)?;

        info!(table_name, "submitting CasJobs query");
        let submit = self
            .commands
            .run(&format!("{} run -f {}", self.config.casjobs_cmd, fquery), None)
            .await?;
        if !submit.stderr.is_empty() {
            warn!(
                stdout = %submit.stdout,
                stderr = %submit.stderr,
                "problem with job submission"
            );
        } else if self.settings.verbose {
            debug!(stdout = %submit.stdout, "job submitted");
        }

        for attempt in 1..=self.settings.max_tries {
            debug!(attempt, table_name, "download attempt");
            self.try_download(table_name, &fname).await?;

            if fpath.exists() {
                info!(file = %fname, "downloaded, removing catalogue from MyDB");
                self.drop_table(table_name).await?;
                return Ok(ChunkOutcome::Downloaded);
            }

            if self.settings.test_mode {
                // Echoed commands never produce a file; one pass through the
                // control flow is all a dry run needs.
                return Ok(ChunkOutcome::Skipped);
            }

            if attempt < self.settings.max_tries {
                tokio::time::sleep(self.settings.wait).await;
            }
        }

        warn!(table_name, tries = self.settings.max_tries, "could not download catalogue");
        Ok(ChunkOutcome::Failed(format!(
            "no output file after {} attempts",
            self.settings.max_tries
        )))
    }

    /// One extract-and-fetch attempt. The extract subcommand prints the
    /// datastore URL when the server-side output job has finished.
    async fn try_download(&self, table_name: &str, fname: &str) -> Result<()> {
        let download_url = self.expected_url(fname)?;

        let extract = self
            .commands
            .run(
                &format!(
                    "{} extract -url -type fits -b {}",
                    self.config.casjobs_cmd, table_name
                ),
                None,
            )
            .await?;

        if self.settings.verbose {
            debug!(stdout = %extract.stdout, stderr = %extract.stderr, "extract output");
        }

        if !extract.stdout.contains(download_url.as_str()) {
            debug!(stderr = %extract.stderr, "output job not finished yet");
            return Ok(());
        }

        let fetch = self
            .commands
            .run(
                &format!("{} {}", self.config.transfer_cmd, download_url),
                None,
            )
            .await?;
        if self.settings.verbose {
            debug!(stdout = %fetch.stdout, stderr = %fetch.stderr, "transfer output");
        }

        Ok(())
    }

    /// Drop the intermediate MyDB table once the file is safely local
    async fn drop_table(&self, table_name: &str) -> Result<()> {
        let drop = self
            .commands
            .run(
                &format!("{} submit -t MyDB", self.config.casjobs_cmd),
                Some(&format!("drop table {}", table_name)),
            )
            .await?;
        if !drop.stderr.is_empty() {
            warn!(stderr = %drop.stderr, table_name, "drop table reported errors");
        } else if self.settings.verbose {
            debug!(stdout = %drop.stdout, "table dropped");
        }
        Ok(())
    }

    fn expected_url(&self, fname: &str) -> Result<Url> {
        Url::parse(&self.config.casjobs_datastore_url)
            .and_then(|base| base.join(fname))
            .map_err(|e| {
                CliError::config(format!(
                    "bad datastore URL '{}': {}",
                    self.config.casjobs_datastore_url, e
                ))
            })
    }
}

/// Name of the file the datastore serves for a given table and user
pub fn output_file_name(table_name: &str, username: &str) -> String {
    format!("{}_{}.fit", table_name, username)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn settings(test_mode: bool, work_dir: impl Into<PathBuf>) -> CasJobsSettings {
        CasJobsSettings {
            username: "observer".to_string(),
            wait: Duration::from_millis(10),
            max_tries: 2,
            test_mode,
            verbose: false,
            work_dir: work_dir.into(),
        }
    }

    #[test]
    fn test_output_file_name() {
        assert_eq!(output_file_name("cat_4", "observer"), "cat_4_observer.fit");
    }

    #[test]
    fn test_expected_url_joins_datastore_base() {
        let runner = CasJobsRunner::new(settings(true, "."), Config::default());
        let url = runner.expected_url("cat_0_observer.fit").unwrap();
        assert_eq!(
            url.as_str(),
            "http://ps1images.stsci.edu/datadelivery/outgoing/casjobs/fits/cat_0_observer.fit"
        );
    }

    #[tokio::test]
    async fn test_dry_run_writes_query_file_and_skips() {
        let dir = tempfile::tempdir().unwrap();

        let runner = CasJobsRunner::new(settings(true, dir.path()), Config::default());
        let outcome = runner
            .run("select top 10 * from StackObjectThin", "cat_dry")
            .await
            .unwrap();

        assert_eq!(outcome, ChunkOutcome::Skipped);
        let query = std::fs::read_to_string(dir.path().join("query_tmp.cat_dry")).unwrap();
        assert!(query.contains("StackObjectThin"));
        assert!(!dir.path().join("cat_dry_observer.fit").exists());
    }

    #[tokio::test]
    async fn test_retry_budget_exhaustion_is_soft_failure() {
        let dir = tempfile::tempdir().unwrap();

        // Real (non-echoed) invocations, but of harmless commands whose
        // stdout never contains the datastore URL, so no file ever appears
        let config = Config {
            casjobs_cmd: "echo".to_string(),
            transfer_cmd: "echo".to_string(),
            ..Config::default()
        };
        let runner = CasJobsRunner::new(settings(false, dir.path()), config);

        let outcome = runner.run("select 1", "cat_gone").await.unwrap();
        match outcome {
            ChunkOutcome::Failed(reason) => assert!(reason.contains("2 attempts")),
            other => panic!("expected a failed outcome, got {:?}", other),
        }
        assert!(!dir.path().join("cat_gone_observer.fit").exists());
    }

    #[tokio::test]
    async fn test_existing_output_file_is_fatal() {
        let dir = tempfile::tempdir().unwrap();

        std::fs::write(dir.path().join("cat_0_observer.fit"), b"old data").unwrap();
        let runner = CasJobsRunner::new(settings(true, dir.path()), Config::default());
        let err = runner.run("select 1", "cat_0").await.unwrap_err();
        assert!(matches!(err, CliError::OutputExists(_)));
    }
}
