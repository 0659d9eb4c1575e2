//! One reconciliation cycle over a watch target.
//!
//! The whole watch list is refreshed through the snapshot cache in a single
//! bulk operation (current state, not stored snapshots, which would mask
//! transitions), then each entry is reconciled in place. Transitions are
//! logged as they are observed; the caller persists the updated entries.

use chrono::{DateTime, Utc};
use tracing::{info, warn};
use vigil_core::{Resolved, reconcile, store::SnapshotStore, watch::WatchEntry};
use vigil_sources::{SnapshotCache, reddit::LiveSource};

use crate::Result;

/// Summary of one cycle, for operator logs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleOutcome {
  pub checked:     usize,
  /// Identifiers the live source never returned this cycle.
  pub missing:     usize,
  pub transitions: usize,
}

/// Resolve every tracked identifier once and reconcile all entries.
pub async fn run_cycle<S, L>(
  cache: &SnapshotCache<S, L>,
  entries: &mut [WatchEntry],
  now: DateTime<Utc>,
) -> Result<CycleOutcome>
where
  S: SnapshotStore,
  L: LiveSource,
{
  const MISSING: Resolved = Resolved::Missing;

  let ids: Vec<String> = entries.iter().map(|e| e.id.clone()).collect();
  let resolved = cache.refresh(&ids).await?;

  let mut outcome = CycleOutcome::default();
  for entry in entries.iter_mut() {
    let live = resolved.get(&entry.id).unwrap_or(&MISSING);
    if live.is_missing() {
      outcome.missing += 1;
    }

    for transition in reconcile(entry, live, now) {
      info!(
        id = %entry.id,
        subreddit = %entry.subreddit,
        ?transition,
        "transition"
      );
      outcome.transitions += 1;
    }
    outcome.checked += 1;
  }

  if outcome.missing > 0 {
    warn!(missing = outcome.missing, "identifiers unknown to the live source");
  }
  info!(
    checked = outcome.checked,
    transitions = outcome.transitions,
    "cycle complete"
  );
  Ok(outcome)
}

// ─── Tests ───────────────────────────────────────────────────────────────────
