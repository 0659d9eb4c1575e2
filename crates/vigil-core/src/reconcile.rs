//! The reconciliation state machine.
//!
//! Compares a watch entry's recorded lifecycle state against a freshly
//! resolved live snapshot and applies the one-way transition rules. Pure:
//! no I/O, no clock access; the caller supplies `now` so every transition
//! observed in the same cycle carries the same timestamp.

use chrono::{DateTime, Utc};

use crate::{
  record::{Resolved, sentinel},
  watch::WatchEntry,
};

/// A lifecycle transition performed by one reconciliation step.
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
  AuthorDeleted,
  TextDeleted,
  TextRemoved {
    category: Option<String>,
  },
  /// The submission was already flagged as removed and the live source now
  /// reports a different removal cause.
  CategoryChanged {
    from: Option<String>,
    to:   Option<String>,
  },
}

/// Apply one reconciliation step to `entry` and return the transitions
/// performed.
///
/// `last_checked_at` is updated unconditionally, including for
/// [`Resolved::Missing`]. Every first-observed timestamp is written through
/// its sticky guard, so a rule whose flag is already set is a no-op
/// regardless of what the snapshot claims.
pub fn reconcile(
  entry: &mut WatchEntry,
  live: &Resolved,
  now: DateTime<Utc>,
) -> Vec<Transition> {
  entry.last_checked_at = now;
  let mut transitions = Vec::new();

  if live.author_deleted() && entry.author_deleted.record_if_unset(now) {
    transitions.push(Transition::AuthorDeleted);
  }

  if live.text_deleted() && entry.text_deleted.record_if_unset(now) {
    transitions.push(Transition::TextDeleted);
  }

  if live.text_removed() {
    let category = live.removal_category().map(str::to_owned);
    if category != entry.removal_category {
      // A category change counts as a new removal event. The removed flag
      // still records only the first one.
      if entry.text_removed.record_if_unset(now) {
        transitions.push(Transition::TextRemoved { category: category.clone() });
      } else {
        transitions.push(Transition::CategoryChanged {
          from: entry.removal_category.clone(),
          to:   category.clone(),
        });
      }
      entry.removal_category = category;

      // The literal "deleted" category is authoritative for author
      // deletion of the text, even while the selftext reads as removed.
      if entry.removal_category.as_deref() == Some(sentinel::CATEGORY_DELETED)
        && entry.text_deleted.record_if_unset(now)
      {
        transitions.push(Transition::TextDeleted);
      }
    }
  }

  transitions
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use crate::record::{IndexedSubmission, LiveSubmission};

  use super::*;

  fn ts(secs: i64) -> DateTime<Utc> { Utc.timestamp_opt(secs, 0).unwrap() }

  fn entry(id: &str) -> WatchEntry {
    let submission = IndexedSubmission {
      id:           id.into(),
      subreddit:    "Advice".into(),
      author:       "someone".into(),
      created_at:   ts(1_000),
      retrieved_at: ts(1_000),
      title:        "t".into(),
      score:        0,
      num_comments: 0,
      selftext:     "body".into(),
      permalink:    format!("https://www.reddit.com/r/Advice/comments/{id}/"),
      url:          None,
    };
    WatchEntry::begin(&submission, ts(2_000))
  }

  fn live(id: &str) -> LiveSubmission {
    LiveSubmission {
      id:                  id.into(),
      author:              Some("someone".into()),
      title:               "t".into(),
      selftext:            "body".into(),
      removed_by_category: None,
      fetched_at:          ts(3_000),
    }
  }

  #[test]
  fn untouched_submission_only_bumps_last_checked() {
    let mut e = entry("a");
    let transitions = reconcile(&mut e, &Resolved::Found(live("a")), ts(3_000));
    assert!(transitions.is_empty());
    assert_eq!(e.last_checked_at, ts(3_000));
    assert!(!e.author_deleted.is_set());
  }

  #[test]
  fn missing_snapshot_bumps_last_checked_and_nothing_else() {
    let mut e = entry("a");
    let transitions = reconcile(&mut e, &Resolved::Missing, ts(3_000));
    assert!(transitions.is_empty());
    assert_eq!(e.last_checked_at, ts(3_000));
  }

  #[test]
  fn author_deletion_sets_the_flag_once() {
    let mut e = entry("a");
    let mut gone = live("a");
    gone.author = None;

    let t1 = reconcile(&mut e, &Resolved::Found(gone.clone()), ts(3_000));
    assert_eq!(t1, vec![Transition::AuthorDeleted]);
    assert_eq!(e.author_deleted.observed_at(), Some(ts(3_000)));

    // Later cycles never touch the timestamp, whatever the snapshot says.
    let t2 = reconcile(&mut e, &Resolved::Found(gone), ts(4_000));
    assert!(t2.is_empty());
    assert_eq!(e.author_deleted.observed_at(), Some(ts(3_000)));
    assert_eq!(e.last_checked_at, ts(4_000));
  }

  #[test]
  fn sticky_flags_survive_a_reappearing_author() {
    let mut e = entry("a");
    let mut gone = live("a");
    gone.author = None;
    reconcile(&mut e, &Resolved::Found(gone), ts(3_000));

    // The author "reappears" upstream; the first observation stands.
    reconcile(&mut e, &Resolved::Found(live("a")), ts(4_000));
    assert!(e.author_deleted.is_set());
    assert_eq!(e.author_deleted.observed_at(), Some(ts(3_000)));
  }

  #[test]
  fn deleted_title_sentinel_marks_text_deleted() {
    let mut e = entry("a");
    let mut snapshot = live("a");
    snapshot.title = sentinel::DELETED_TITLE.into();

    let transitions = reconcile(&mut e, &Resolved::Found(snapshot), ts(3_000));
    assert_eq!(transitions, vec![Transition::TextDeleted]);
  }

  #[test]
  fn removal_then_category_change_then_deletion() {
    let mut e = entry("a");

    // Cycle 1: removed with no category yet. Category goes None -> None,
    // which is not a change, so nothing fires.
    let mut removed = live("a");
    removed.selftext = sentinel::REMOVED.into();
    let t1 = reconcile(&mut e, &Resolved::Found(removed.clone()), ts(3_000));
    assert!(t1.is_empty());
    assert!(!e.text_removed.is_set());

    // Cycle 2: category appears. Removed flag and timestamp set exactly once.
    removed.removed_by_category = Some("spam".into());
    let t2 = reconcile(&mut e, &Resolved::Found(removed.clone()), ts(4_000));
    assert_eq!(
      t2,
      vec![Transition::TextRemoved { category: Some("spam".into()) }]
    );
    assert_eq!(e.text_removed.observed_at(), Some(ts(4_000)));
    assert_eq!(e.removal_category.as_deref(), Some("spam"));

    // Cycle 3: category flips to "deleted". Text-deleted fires; the removed
    // timestamp is untouched.
    removed.removed_by_category = Some("deleted".into());
    let t3 = reconcile(&mut e, &Resolved::Found(removed), ts(5_000));
    assert_eq!(
      t3,
      vec![
        Transition::CategoryChanged {
          from: Some("spam".into()),
          to:   Some("deleted".into()),
        },
        Transition::TextDeleted,
      ]
    );
    assert_eq!(e.text_removed.observed_at(), Some(ts(4_000)));
    assert_eq!(e.text_deleted.observed_at(), Some(ts(5_000)));
    assert_eq!(e.removal_category.as_deref(), Some("deleted"));
  }

  #[test]
  fn unchanged_category_does_not_re_fire() {
    let mut e = entry("a");
    let mut removed = live("a");
    removed.selftext = sentinel::REMOVED.into();
    removed.removed_by_category = Some("moderator".into());

    reconcile(&mut e, &Resolved::Found(removed.clone()), ts(3_000));
    let again = reconcile(&mut e, &Resolved::Found(removed), ts(4_000));
    assert!(again.is_empty());
    assert_eq!(e.text_removed.observed_at(), Some(ts(3_000)));
  }

  #[test]
  fn deletion_via_category_shares_the_cycle_timestamp() {
    // One cycle observes identifier A with a gone author and the removal
    // category flipping to "deleted": both sticky timestamps must be equal.
    let mut a = entry("a");
    let mut b = entry("b");
    let mut c = entry("c");

    let mut snapshot = live("a");
    snapshot.author = None;
    snapshot.selftext = sentinel::REMOVED.into();
    snapshot.removed_by_category = Some("deleted".into());

    let now = ts(9_000);
    let transitions = reconcile(&mut a, &Resolved::Found(snapshot), now);
    assert!(transitions.contains(&Transition::AuthorDeleted));
    assert!(transitions.contains(&Transition::TextDeleted));
    assert_eq!(a.author_deleted.observed_at(), Some(now));
    assert_eq!(a.text_deleted.observed_at(), Some(now));
    assert_eq!(a.removal_category.as_deref(), Some("deleted"));

    // The other two entries, reconciled against untouched snapshots, are
    // unchanged apart from last_checked.
    reconcile(&mut b, &Resolved::Found(live("b")), now);
    reconcile(&mut c, &Resolved::Found(live("c")), now);
    for other in [&b, &c] {
      assert!(!other.author_deleted.is_set());
      assert!(!other.text_deleted.is_set());
      assert!(!other.text_removed.is_set());
      assert_eq!(other.last_checked_at, now);
    }
  }
}
