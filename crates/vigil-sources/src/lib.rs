//! Clients for the two data sources, plus the layers built on them.
//!
//! Everything here goes through one [`Fetcher`], which serialises requests
//! with a fixed inter-request delay and retries once after a long backoff.
//! The [`IndexSource`] and [`LiveSource`] traits mark the seams; tests
//! script fakes against them.

pub mod cache;
pub mod error;
pub mod fetch;
pub mod paginate;
pub mod pushshift;
pub mod reddit;

pub use cache::SnapshotCache;
pub use error::{Error, Result};
pub use fetch::{FetchConfig, Fetcher};
pub use paginate::{Batch, collect_sampled, collect_sequential};
pub use pushshift::{IndexClient, IndexQuery, IndexSource, PAGE_LIMIT};
pub use reddit::{LOOKUP_BATCH_LIMIT, LiveClient, LiveSource};
