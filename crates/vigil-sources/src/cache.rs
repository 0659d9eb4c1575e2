//! Bulk dedup-and-cache resolution of identifiers against the live source.
//!
//! Two resolution paths share the same store and missing-id semantics:
//! [`SnapshotCache::resolve`] serves identifiers already present in the
//! persistent store without a network call and fetches only the rest, while
//! [`SnapshotCache::refresh`] always asks the live source for current state
//! and uses the store purely as a write-back. An identifier the live source
//! never returns resolves to [`Resolved::Missing`] with a warning; it never
//! fails the batch.

use std::collections::{HashMap, HashSet};

use tracing::{debug, warn};
use vigil_core::{Resolved, store::SnapshotStore};

use crate::{Error, Result, reddit::LiveSource};

/// The identifier cache: a persistent snapshot store fronted by the live
/// source. Constructed once per run and passed down by reference.
pub struct SnapshotCache<S, L> {
  store: S,
  live:  L,
}

impl<S: SnapshotStore, L: LiveSource> SnapshotCache<S, L> {
  pub fn new(store: S, live: L) -> Self { Self { store, live } }

  /// Resolve every identifier in `ids` to its current state.
  ///
  /// Exactly one live-source round of batched lookups per call, covering
  /// only the identifiers the store does not already know.
  pub async fn resolve(
    &self,
    ids: &[String],
  ) -> Result<HashMap<String, Resolved>> {
    let mut resolved: HashMap<String, Resolved> =
      HashMap::with_capacity(ids.len());

    let known = self
      .store
      .get_many(ids)
      .await
      .map_err(|e| Error::Store(Box::new(e)))?;
    let hits = known.len();
    for snapshot in known {
      resolved.insert(snapshot.id.clone(), Resolved::Found(snapshot));
    }

    // Preserve first-seen order and drop repeats before going to the wire.
    let mut seen = HashSet::new();
    let needed: Vec<String> = ids
      .iter()
      .filter(|id| !resolved.contains_key(*id) && seen.insert(id.as_str()))
      .cloned()
      .collect();
    debug!(requested = ids.len(), hits, misses = needed.len(), "cache resolve");

    if !needed.is_empty() {
      self.fetch_into(&needed, &mut resolved).await?;
    }

    mark_missing(ids, &mut resolved);
    Ok(resolved)
  }

  /// Fetch the current state of every identifier in `ids`, bypassing stored
  /// snapshots. Results are still written back to the store.
  ///
  /// This is the reconciliation path: stale snapshots would mask lifecycle
  /// transitions, so only the in-call dedup of repeats applies.
  pub async fn refresh(
    &self,
    ids: &[String],
  ) -> Result<HashMap<String, Resolved>> {
    let mut resolved: HashMap<String, Resolved> =
      HashMap::with_capacity(ids.len());

    let mut seen = HashSet::new();
    let unique: Vec<String> = ids
      .iter()
      .filter(|id| seen.insert(id.as_str()))
      .cloned()
      .collect();
    debug!(requested = ids.len(), unique = unique.len(), "cache refresh");

    if !unique.is_empty() {
      self.fetch_into(&unique, &mut resolved).await?;
    }

    mark_missing(ids, &mut resolved);
    Ok(resolved)
  }

  async fn fetch_into(
    &self,
    ids: &[String],
    resolved: &mut HashMap<String, Resolved>,
  ) -> Result<()> {
    let fetched = self.live.lookup(ids).await?;
    self
      .store
      .put_many(fetched.clone())
      .await
      .map_err(|e| Error::Store(Box::new(e)))?;
    for snapshot in fetched {
      resolved.insert(snapshot.id.clone(), Resolved::Found(snapshot));
    }
    Ok(())
  }
}

fn mark_missing(ids: &[String], resolved: &mut HashMap<String, Resolved>) {
  for id in ids {
    if !resolved.contains_key(id) {
      warn!(id = %id, "identifier absent from live source, resolving as unknown");
      resolved.insert(id.clone(), Resolved::Missing);
    }
  }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
