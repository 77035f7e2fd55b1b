//! Region partitioning
//!
//! Splits a bounding box into an approximately square grid of chunks, one
//! remote query per chunk. The grid dimension is `floor(sqrt(requested)) + 1`
//! breakpoints per axis, so the number of chunks actually produced is
//! `(floor(sqrt(requested)))^2`, not the requested count. Adjacent cells
//! share their boundary edges; no de-duplication of objects on shared edges
//! is attempted here.

use tracing::debug;

use crate::error::{Result, SkycatError};
use crate::types::{Chunk, Region};

/// Split `region` into a grid of chunks sized for `requested` queries.
///
/// Chunks are ordered by ascending index, RA outer loop, Dec inner loop.
pub fn partition(region: &Region, requested: i64) -> Result<Vec<Chunk>> {
    if requested < 1 {
        return Err(SkycatError::InvalidChunkCount(requested));
    }

    let n = (requested as f64).sqrt().floor() as usize + 1;
    let ra_edges = linspace(region.ra_low, region.ra_high, n);
    let dec_edges = linspace(region.dec_low, region.dec_high, n);

    debug!(
        requested,
        grid = n - 1,
        produced = (n - 1) * (n - 1),
        "partitioned region into grid"
    );

    let mut chunks = Vec::with_capacity((n - 1) * (n - 1));
    let mut index = 0;
    for ra_pair in ra_edges.windows(2) {
        for dec_pair in dec_edges.windows(2) {
            chunks.push(Chunk {
                index,
                region: Region {
                    ra_low: ra_pair[0],
                    ra_high: ra_pair[1],
                    dec_low: dec_pair[0],
                    dec_high: dec_pair[1],
                },
            });
            index += 1;
        }
    }

    Ok(chunks)
}

/// `count` evenly spaced values from `start` to `stop`, both inclusive.
///
/// The final value is exactly `stop` so the outer boundary of the grid
/// reconstructs the original region without rounding drift.
fn linspace(start: f64, stop: f64, count: usize) -> Vec<f64> {
    debug_assert!(count >= 2);
    let step = (stop - start) / (count - 1) as f64;
    (0..count)
        .map(|i| {
            if i == count - 1 {
                stop
            } else {
                start + step * i as f64
            }
        })
        .collect()
}
