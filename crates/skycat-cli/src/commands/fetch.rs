//! `skycat fetch` command implementation
//!
//! The top-level driver: partition the requested region, then for each chunk
//! render the query, record it in the manifest, and run it through the
//! selected backend. Chunks run strictly sequentially with a short pause
//! between them to avoid hammering the remote service.

use std::path::PathBuf;
use std::time::Duration;

use colored::Colorize;
use tracing::{info, warn};

use skycat_common::partition::partition;
use skycat_common::query::{render_catalogue_name, validate_name_template, QueryTemplate};
use skycat_common::types::Region;

use crate::casjobs::{CasJobsRunner, CasJobsSettings, DEFAULT_WAIT};
use crate::config::Config;
use crate::credentials::Credentials;
use crate::error::Result;
use crate::manifest::ManifestWriter;
use crate::outcome::ChunkOutcome;
use crate::progress;
use crate::psps::{PspsRunner, PspsSettings, DEFAULT_POLL_WAIT};
use crate::FetchArgs;

/// Pause between chunks, to be gentle with the remote service
const INTER_CHUNK_PAUSE: Duration = Duration::from_secs(3);

/// Which backend a run dispatches to
enum Backend {
    CasJobs(CasJobsRunner),
    Psps { runner: PspsRunner, auth_file: PathBuf },
}

/// Fetch a catalogue in chunks
pub async fn run(args: &FetchArgs, verbose: bool) -> Result<()> {
    // Fail fast on a name template that would make every chunk overwrite
    // the same output file
    validate_name_template(&args.name_template, args.nchunks)?;

    let region = Region::new(args.ra_low, args.ra_high, args.dec_low, args.dec_high)?;
    let chunks = partition(&region, args.nchunks)?;
    let template = load_query_template(args)?;
    let config = Config::from_env();

    println!(
        "{} Split {} into {} chunk(s)",
        "→".cyan(),
        region,
        chunks.len()
    );
    if args.dry_run {
        println!("{} Dry run: external commands are echoed, nothing is submitted", "→".cyan());
    }

    let backend = build_backend(args, config, verbose)?;
    let mut manifest = ManifestWriter::create(&args.manifest)?;

    let pb = progress::create_chunk_progress(chunks.len() as u64);
    let mut downloaded = 0usize;
    let mut failed = 0usize;
    let mut skipped = 0usize;
    let total = chunks.len();

    for chunk in &chunks {
        let catalogue = render_catalogue_name(&args.name_template, chunk.index);

        if chunk.index < args.nskip {
            skipped += 1;
            pb.inc(1);
            continue;
        }

        let sql = template.render(&chunk.region, &catalogue);

        // The row records the attempt, not the result: it is written before
        // the chunk's fate is known, so the manifest lists every chunk that
        // was dispatched. Cross-check against the output files for success.
        manifest.append(&chunk.region, &catalogue)?;

        info!(index = chunk.index, catalogue = %catalogue, "dispatching chunk");
        let result = match &backend {
            Backend::CasJobs(runner) => runner.run(&sql, &catalogue).await,
            Backend::Psps { runner, auth_file } => {
                // Re-read the auth file each chunk; the password is dropped
                // again as soon as the login call has used it
                let credentials = Credentials::load(auth_file)?;
                runner.run(credentials, &catalogue, &sql).await
            },
        };

        match result {
            Ok(ChunkOutcome::Downloaded) => {
                downloaded += 1;
                pb.println(format!("{} {}", "✓".green(), catalogue));
            },
            Ok(ChunkOutcome::Skipped) => {
                skipped += 1;
                pb.println(format!("{} {} (dry run)", "→".cyan(), catalogue));
            },
            Ok(ChunkOutcome::Failed(reason)) => {
                failed += 1;
                warn!(catalogue = %catalogue, reason = %reason, "chunk failed");
                pb.println(format!("{} {}: {}", "✗".red(), catalogue, reason));
            },
            Err(e) if e.is_fatal() => {
                pb.finish_and_clear();
                return Err(e);
            },
            Err(e) => {
                failed += 1;
                warn!(catalogue = %catalogue, error = %e, "chunk failed");
                pb.println(format!("{} {}: {}", "✗".red(), catalogue, e));
            },
        }

        pb.inc(1);

        if !args.dry_run && chunk.index + 1 < total {
            tokio::time::sleep(INTER_CHUNK_PAUSE).await;
        }
    }

    pb.finish_and_clear();

    println!();
    println!("{}", "Summary:".cyan().bold());
    println!("  Downloaded: {}", downloaded);
    println!("  Failed:     {}", failed);
    println!("  Skipped:    {}", skipped);
    println!("  Manifest:   {}", args.manifest.display());

    Ok(())
}

/// Select and configure the backend once, up front
fn build_backend(args: &FetchArgs, config: Config, verbose: bool) -> Result<Backend> {
    let work_dir = PathBuf::from(".");

    if let Some(ref auth_file) = args.psps_auth {
        let settings = PspsSettings {
            username: args.username.clone(),
            wait: args
                .wait_secs
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_POLL_WAIT),
            poll_timeout: Duration::from_secs(args.poll_timeout_secs),
            job_type: args.job_type,
            dry_run: args.dry_run,
            work_dir,
        };
        Ok(Backend::Psps {
            runner: PspsRunner::new(settings, config)?,
            auth_file: auth_file.clone(),
        })
    } else {
        let settings = CasJobsSettings {
            username: args.username.clone(),
            wait: args
                .wait_secs
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_WAIT),
            max_tries: args.max_tries.max(1),
            test_mode: args.dry_run,
            verbose,
            work_dir,
        };
        Ok(Backend::CasJobs(CasJobsRunner::new(settings, config)))
    }
}

/// The query template: a custom file wins over the builtin selection
fn load_query_template(args: &FetchArgs) -> Result<QueryTemplate> {
    match args.query_file {
        Some(ref path) => Ok(QueryTemplate::new(std::fs::read_to_string(path)?)),
        None => Ok(QueryTemplate::builtin(args.source)),
    }
}
