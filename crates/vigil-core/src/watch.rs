//! Watch entries and the one-way sticky flags they carry.
//!
//! A watch entry is created once per freshly discovered identifier and then
//! mutated only by reconciliation. Its lifecycle flags are monotonic: each
//! records the first time a transition was observed and refuses every later
//! write, even if a later live snapshot appears to contradict it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::record::IndexedSubmission;

// ─── StickyFlag ──────────────────────────────────────────────────────────────

/// A first-writer-wins timestamp cell.
///
/// Transitions at most once from unset to a concrete instant. The only write
/// path is [`StickyFlag::record_if_unset`], which makes the one-way invariant
/// an API guarantee rather than a call-site convention.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StickyFlag(Option<DateTime<Utc>>);

impl StickyFlag {
  pub const fn unset() -> Self { Self(None) }

  /// Rehydrate a flag from storage. Not a second write path: storage rows
  /// are themselves only ever produced by reconciliation.
  pub const fn restored(observed_at: Option<DateTime<Utc>>) -> Self {
    Self(observed_at)
  }

  pub fn is_set(&self) -> bool { self.0.is_some() }

  pub fn observed_at(&self) -> Option<DateTime<Utc>> { self.0 }

  /// Record `at` if the flag is still unset. Returns `true` only when this
  /// call performed the transition.
  pub fn record_if_unset(&mut self, at: DateTime<Utc>) -> bool {
    if self.0.is_some() {
      return false;
    }
    self.0 = Some(at);
    true
  }
}

// ─── WatchEntry ──────────────────────────────────────────────────────────────

/// One tracked identifier, persisted across reconciliation cycles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchEntry {
  pub id:                   String,
  pub subreddit:            String,
  /// Author name as the index source saw it, sentinel included.
  pub index_author:         String,
  /// Whether the author was already gone at indexing time.
  pub index_author_deleted: bool,
  pub created_at:           DateTime<Utc>,
  pub first_seen_at:        DateTime<Utc>,
  pub last_checked_at:      DateTime<Utc>,
  pub author_deleted:       StickyFlag,
  pub text_deleted:         StickyFlag,
  pub text_removed:         StickyFlag,
  /// Last removal category observed on the live source. Unlike the flags
  /// this is not sticky: it follows category changes.
  pub removal_category:     Option<String>,
}

impl WatchEntry {
  /// Start watching a freshly discovered submission.
  pub fn begin(submission: &IndexedSubmission, now: DateTime<Utc>) -> Self {
    Self {
      id:                   submission.id.clone(),
      subreddit:            submission.subreddit.clone(),
      index_author:         submission.author.clone(),
      index_author_deleted: submission.author_deleted(),
      created_at:           submission.created_at,
      first_seen_at:        now,
      last_checked_at:      now,
      author_deleted:       StickyFlag::unset(),
      text_deleted:         StickyFlag::unset(),
      text_removed:         StickyFlag::unset(),
      removal_category:     None,
    }
  }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
