//! `skycat plan` command implementation
//!
//! Prints the chunk grid a fetch would use, without touching any service.
//! Handy for sizing a run and for picking an `--nskip` value when resuming.

use colored::Colorize;
use serde::Serialize;

use skycat_common::partition::partition;
use skycat_common::query::{render_catalogue_name, validate_name_template};
use skycat_common::types::Region;

use crate::error::Result;
use crate::manifest;
use crate::PlanArgs;

/// One row of the plan output
#[derive(Debug, Serialize)]
struct PlannedChunk {
    index: usize,
    ra_low: f64,
    ra_high: f64,
    dec_low: f64,
    dec_high: f64,
    catalogue: String,
}

/// Show the chunk grid for a region
pub async fn run(args: &PlanArgs) -> Result<()> {
    validate_name_template(&args.name_template, args.nchunks)?;

    let region = Region::new(args.ra_low, args.ra_high, args.dec_low, args.dec_high)?;
    let chunks = partition(&region, args.nchunks)?;

    let planned: Vec<PlannedChunk> = chunks
        .iter()
        .map(|chunk| PlannedChunk {
            index: chunk.index,
            ra_low: chunk.region.ra_low,
            ra_high: chunk.region.ra_high,
            dec_low: chunk.region.dec_low,
            dec_high: chunk.region.dec_high,
            catalogue: render_catalogue_name(&args.name_template, chunk.index),
        })
        .collect();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&planned)?);
        return Ok(());
    }

    println!(
        "{} {} chunk(s) for {} (requested {})",
        "→".cyan(),
        planned.len(),
        region,
        args.nchunks
    );
    println!("{}", manifest::MANIFEST_HEADER.bold());
    for chunk in &planned {
        let region = Region {
            ra_low: chunk.ra_low,
            ra_high: chunk.ra_high,
            dec_low: chunk.dec_low,
            dec_high: chunk.dec_high,
        };
        println!("{}", manifest::format_row(&region, &chunk.catalogue));
    }

    Ok(())
}
