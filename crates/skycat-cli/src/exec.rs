//! External command invocation
//!
//! The CasJobs binary and the transfer command are driven entirely through
//! this module: one entry point, structured output, no text-scraping outside
//! the callers that own the contract. In test mode every command is replaced
//! by `echo TESTMODE: ...`, which exercises the control flow with no side
//! effects.

use std::path::PathBuf;

use tokio::process::Command;
use tracing::debug;

use crate::error::{CliError, Result};

/// Captured result of one external command
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub success: bool,
}

/// Runs external commands, optionally in test mode
#[derive(Debug, Clone)]
pub struct CommandRunner {
    test_mode: bool,
    work_dir: Option<PathBuf>,
}

impl CommandRunner {
    pub fn new(test_mode: bool) -> Self {
        Self {
            test_mode,
            work_dir: None,
        }
    }

    /// Run commands from `dir` instead of the process working directory
    pub fn with_work_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.work_dir = Some(dir.into());
        self
    }

    /// Run `cmd` (split on whitespace) with an optional trailing argument
    /// that must not be split (e.g. a full SQL statement).
    pub async fn run(&self, cmd: &str, trailing_arg: Option<&str>) -> Result<CommandOutput> {
        let cmd = if self.test_mode {
            format!("echo TESTMODE: {}", cmd)
        } else {
            cmd.to_string()
        };

        let mut parts = cmd.split_whitespace();
        let program = parts
            .next()
            .ok_or_else(|| CliError::command("empty command line"))?;

        let mut command = Command::new(program);
        command.args(parts);
        if let Some(arg) = trailing_arg {
            command.arg(arg);
        }
        if let Some(ref dir) = self.work_dir {
            command.current_dir(dir);
        }

        debug!(command = %cmd, trailing_arg, "running external command");

        let output = command
            .output()
            .await
            .map_err(|e| CliError::command(format!("{}: {}", program, e)))?;

        Ok(CommandOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            success: output.status.success(),
        })
    }
}
