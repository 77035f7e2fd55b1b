//! Skycat Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared types and pure logic for the skycat workspace.
//!
//! # Overview
//!
//! This crate holds everything that does not touch the network or spawn
//! processes:
//!
//! - **Error Handling**: typed errors and the crate-wide result alias
//! - **Types**: sky regions, chunks, remote job statuses
//! - **Partition**: splitting a bounding box into a chunk grid
//! - **Query**: SQL and catalogue-name templating
//!
//! # Example
//!
//! ```no_run
//! use skycat_common::types::Region;
//! use skycat_common::partition::partition;
//!
//! fn plan() -> skycat_common::Result<()> {
//!     let region = Region::new(10.0, 12.0, 0.0, 2.0)?;
//!     for chunk in partition(&region, 4)? {
//!         println!("chunk {}: {}", chunk.index, chunk.region);
//!     }
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod logging;
pub mod partition;
pub mod query;
pub mod types;

// Re-export commonly used types
pub use error::{Result, SkycatError};
