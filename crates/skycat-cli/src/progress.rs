//! Progress display for long runs

use indicatif::{ProgressBar, ProgressStyle};

/// Progress bar over the chunk grid
pub fn create_chunk_progress(total: u64) -> ProgressBar {
    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{msg}\n{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} chunks")
            .expect("Invalid progress bar template")
            .progress_chars("#>-"),
    );
    pb
}
