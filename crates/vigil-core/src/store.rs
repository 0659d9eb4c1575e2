//! The `SnapshotStore` trait.
//!
//! The trait is implemented by storage backends (e.g. `vigil-store-sqlite`).
//! Higher layers depend on this abstraction, not on any concrete backend;
//! the store is constructed once per run and passed down by handle.

use std::future::Future;

use crate::record::LiveSubmission;

/// Abstraction over the persistent identifier-to-snapshot store that shields
/// the live source from redundant lookups across runs.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes.
pub trait SnapshotStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Return the stored snapshots for any of `ids` that are present.
  /// Unknown identifiers are simply absent from the result.
  fn get_many<'a>(
    &'a self,
    ids: &'a [String],
  ) -> impl Future<Output = Result<Vec<LiveSubmission>, Self::Error>> + Send + 'a;

  /// Insert or replace the given snapshots, keyed by identifier.
  fn put_many(
    &self,
    snapshots: Vec<LiveSubmission>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}
