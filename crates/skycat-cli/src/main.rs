//! skycat CLI - Main entry point

use clap::Parser;
use skycat_cli::{Cli, Commands};
use skycat_common::logging::{init_logging, LogConfig, LogLevel, LogOutput};
use std::process;
use tracing::error;

#[tokio::main]
async fn main() {
    // Pick up SKYCAT_* overrides from a local .env if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Initialize logging based on verbose flag and environment
    let log_config = if cli.verbose {
        LogConfig::builder()
            .level(LogLevel::Debug)
            .output(LogOutput::Console)
            .log_file_prefix("skycat".to_string())
            .build()
    } else {
        LogConfig::builder()
            .level(LogLevel::Warn)
            .output(LogOutput::Console)
            .log_file_prefix("skycat".to_string())
            .build()
    };

    // Environment variables take precedence over the flag
    let log_config = if std::env::var("SKYCAT_LOG_LEVEL").is_ok() {
        LogConfig::from_env().unwrap_or(log_config)
    } else {
        log_config
    };

    // The CLI should still work if logging can't be set up
    let _ = init_logging(&log_config);

    let result = match cli.command {
        Commands::Fetch(ref args) => skycat_cli::commands::fetch::run(args, cli.verbose).await,
        Commands::Plan(ref args) => skycat_cli::commands::plan::run(args).await,
    };

    if let Err(e) = result {
        error!(error = %e, "Command failed");
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
