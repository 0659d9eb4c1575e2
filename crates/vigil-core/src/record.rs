//! Submission records as seen by the two data sources.
//!
//! The index source captures a submission shortly after creation and never
//! revisits it; the live source returns the current, authoritative state.
//! Both views carry the sentinel strings Reddit substitutes for gone content.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Sentinel strings the sources substitute for deleted or removed content.
pub mod sentinel {
  /// Author or selftext replaced after the author deleted it.
  pub const DELETED: &str = "[deleted]";
  /// Selftext replaced after a moderator or admin removed it.
  pub const REMOVED: &str = "[removed]";
  /// Title shown once the author has deleted the whole submission.
  pub const DELETED_TITLE: &str = "[deleted by user]";
  /// The one removal category that is authoritative for author deletion,
  /// even when the selftext reads as removed rather than deleted.
  pub const CATEGORY_DELETED: &str = "deleted";
}

// ─── Index-source view ───────────────────────────────────────────────────────

/// One submission as captured by the index source near creation time.
///
/// Immutable once produced. `score` and `num_comments` keep changing
/// upstream; here they are frozen at indexing time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexedSubmission {
  /// Source-wide unique base-36 identifier, without the `t3_` prefix.
  pub id:           String,
  pub subreddit:    String,
  /// Author name at indexing time; may already be [`sentinel::DELETED`].
  pub author:       String,
  pub created_at:   DateTime<Utc>,
  /// When the index source ingested the submission; never before `created_at`.
  pub retrieved_at: DateTime<Utc>,
  pub title:        String,
  pub score:        i64,
  pub num_comments: i64,
  pub selftext:     String,
  /// Canonical permalink on the host site.
  pub permalink:    String,
  /// External target URL, absent for self posts.
  pub url:          Option<String>,
}

impl IndexedSubmission {
  /// The author was already gone when the index source ingested this.
  pub fn author_deleted(&self) -> bool { self.author == sentinel::DELETED }

  /// The selftext was already gone when the index source ingested this.
  pub fn text_deleted(&self) -> bool { self.selftext == sentinel::DELETED }

  /// A crosspost links somewhere other than its own permalink.
  pub fn is_crosspost(&self) -> bool {
    self.url.as_deref().is_some_and(|u| u != self.permalink)
  }

  /// Whole hours between creation and index ingestion, rounded.
  pub fn indexing_lag_hours(&self) -> i64 {
    let secs = (self.retrieved_at - self.created_at).num_seconds();
    ((secs as f64) / 3600.0).round() as i64
  }
}

// ─── Live-source view ────────────────────────────────────────────────────────

/// Authoritative current state of a submission, fetched by identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiveSubmission {
  pub id:                  String,
  /// `None` when the account itself is gone; the deletion sentinel also
  /// appears in the wild.
  pub author:              Option<String>,
  pub title:               String,
  pub selftext:            String,
  /// `None` means not removed; otherwise names the removal cause.
  pub removed_by_category: Option<String>,
  pub fetched_at:          DateTime<Utc>,
}

impl LiveSubmission {
  pub fn author_deleted(&self) -> bool {
    match self.author.as_deref() {
      None => true,
      Some(a) => a == sentinel::DELETED,
    }
  }

  pub fn text_deleted(&self) -> bool {
    self.selftext == sentinel::DELETED || self.title == sentinel::DELETED_TITLE
  }

  pub fn text_removed(&self) -> bool { self.selftext == sentinel::REMOVED }
}

// ─── Resolution outcome ──────────────────────────────────────────────────────

/// The outcome of resolving one identifier against the live source.
///
/// `Missing` is the caller-visible marker for an identifier the live source
/// never returned (the record exists in the index but was never ingested by
/// the live authority, or the reverse). Nothing further is knowable, so all
/// derived lifecycle predicates report `false`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Resolved {
  Found(LiveSubmission),
  Missing,
}

impl Resolved {
  pub fn is_missing(&self) -> bool { matches!(self, Self::Missing) }

  pub fn author_deleted(&self) -> bool {
    match self {
      Self::Found(live) => live.author_deleted(),
      Self::Missing => false,
    }
  }

  pub fn text_deleted(&self) -> bool {
    match self {
      Self::Found(live) => live.text_deleted(),
      Self::Missing => false,
    }
  }

  pub fn text_removed(&self) -> bool {
    match self {
      Self::Found(live) => live.text_removed(),
      Self::Missing => false,
    }
  }

  pub fn removal_category(&self) -> Option<&str> {
    match self {
      Self::Found(live) => live.removed_by_category.as_deref(),
      Self::Missing => None,
    }
  }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  fn indexed() -> IndexedSubmission {
    let created = Utc.timestamp_opt(1_600_000_000, 0).unwrap();
    IndexedSubmission {
      id:           "abc123".into(),
      subreddit:    "Advice".into(),
      author:       "someone".into(),
      created_at:   created,
      retrieved_at: created + chrono::Duration::seconds(5400),
      title:        "a title".into(),
      score:        1,
      num_comments: 3,
      selftext:     "hello".into(),
      permalink:    "https://www.reddit.com/r/Advice/comments/abc123/".into(),
      url:          None,
    }
  }

  #[test]
  fn indexing_lag_rounds_to_whole_hours() {
    // 5400 s is 1.5 h; rounds to 2.
    assert_eq!(indexed().indexing_lag_hours(), 2);
  }

  #[test]
  fn self_post_is_not_a_crosspost() {
    let mut sub = indexed();
    assert!(!sub.is_crosspost());
    sub.url = Some(sub.permalink.clone());
    assert!(!sub.is_crosspost());
    sub.url = Some("https://example.com/elsewhere".into());
    assert!(sub.is_crosspost());
  }

  #[test]
  fn live_author_deleted_via_none_or_sentinel() {
    let mut live = LiveSubmission {
      id:                  "abc123".into(),
      author:              Some("someone".into()),
      title:               "a title".into(),
      selftext:            "hello".into(),
      removed_by_category: None,
      fetched_at:          Utc.timestamp_opt(1_600_100_000, 0).unwrap(),
    };
    assert!(!live.author_deleted());
    live.author = None;
    assert!(live.author_deleted());
    live.author = Some(sentinel::DELETED.into());
    assert!(live.author_deleted());
  }

  #[test]
  fn missing_resolution_reports_nothing() {
    let missing = Resolved::Missing;
    assert!(missing.is_missing());
    assert!(!missing.author_deleted());
    assert!(!missing.text_deleted());
    assert!(!missing.text_removed());
    assert_eq!(missing.removal_category(), None);
  }
}
