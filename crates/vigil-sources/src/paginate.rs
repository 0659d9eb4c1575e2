//! Pagination strategies over the index source.
//!
//! The index source supports cursor pagination only, so both strategies are
//! built from forward walks:
//!
//! - *sequential*: advance the window's lower bound to the creation time of
//!   each page's last entry until the limit is reached or a page comes back
//!   empty. Boundary entries may repeat across consecutive pages; that is
//!   expected, detected, and reported, never deduplicated here.
//! - *uniform sampling*: take the total count over the window, derive evenly
//!   spaced record offsets, map each offset onto the cursor axis, and retain
//!   one page per offset. Used when the caller wants representativeness
//!   across the whole window instead of recency bias.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, warn};
use vigil_core::IndexedSubmission;

use crate::{
  Error, Result,
  pushshift::{IndexQuery, IndexSource, PAGE_LIMIT},
};

// ─── Batch ───────────────────────────────────────────────────────────────────

/// The result of one pagination run.
#[derive(Debug, Clone)]
pub struct Batch {
  /// Total matching entries the index source reports for the full window.
  pub total:         u64,
  pub submissions:   Vec<IndexedSubmission>,
  /// Identifiers that appear more than once in `submissions`. Deduplication
  /// is left to the caller.
  pub duplicate_ids: Vec<String>,
}

// ─── Sequential ──────────────────────────────────────────────────────────────

/// Collect the earliest `query.limit` submissions in the window, walking the
/// cursor forward one page at a time.
pub async fn collect_sequential<I: IndexSource>(
  index: &I,
  query: &IndexQuery,
) -> Result<Batch> {
  let total = index.total(query).await?;

  let mut found: Vec<IndexedSubmission> = Vec::new();
  let mut page_query = query.clone();
  let mut iteration = 0usize;
  loop {
    let page = index.search(&page_query).await?;
    log_short_page(page.len(), query.limit);
    let Some(last) = page.last() else { break };

    // Advance the lower bound to the last entry's creation time. The
    // boundary entry may come back on the next page.
    page_query.after = Some(last.created_at);
    found.extend(page);

    iteration += 1;
    debug!(iteration, collected = found.len(), "sequential page collected");
    if found.len() >= query.limit {
      break;
    }
  }

  found.retain(|s| within_window(query, s));
  found.truncate(query.limit);
  Ok(finish(total, found))
}

// ─── Uniform sampling ────────────────────────────────────────────────────────

/// Collect an approximately-uniform sample across the whole window: one page
/// retained per evenly spaced offset.
pub async fn collect_sampled<I: IndexSource>(
  index: &I,
  query: &IndexQuery,
) -> Result<Batch> {
  let (Some(after), Some(before)) = (query.after, query.before) else {
    return Err(Error::SamplingWindowRequired);
  };

  let total = index.total(query).await?;
  let offsets = sample_offsets(total, query.limit);

  let mut found: Vec<IndexedSubmission> = Vec::new();
  for (iteration, &offset) in offsets.iter().enumerate() {
    let mut page_query = query.clone();
    page_query.after = Some(offset_cursor(after, before, total, offset));
    debug!(iteration, offset, "sampling one page from offset cursor");

    let page = index.search(&page_query).await?;
    log_short_page(page.len(), query.limit);
    found.extend(page.into_iter().filter(|s| within_window(query, s)));
  }

  Ok(finish(total, found))
}

/// Evenly spaced record offsets across `[0, total-1]`, inclusive of both
/// ends. Yields `limit` offsets, or `total` when fewer entries exist.
pub fn sample_offsets(total: u64, limit: usize) -> Vec<u64> {
  if total == 0 || limit == 0 {
    return Vec::new();
  }
  let n = (limit as u64).min(total);
  if n == 1 {
    return vec![0];
  }
  (0..n)
    .map(|i| {
      let position = i as f64 * (total - 1) as f64 / (n - 1) as f64;
      position.round() as u64
    })
    .collect()
}

/// Map a record offset onto the cursor axis.
///
/// The source offers no random access, so the offset is projected
/// proportionally onto the time window and used as a query lower bound.
fn offset_cursor(
  after: DateTime<Utc>,
  before: DateTime<Utc>,
  total: u64,
  offset: u64,
) -> DateTime<Utc> {
  let span = (before - after).num_seconds().max(0);
  let secs = (offset as f64 / total as f64 * span as f64) as i64;
  after + Duration::seconds(secs)
}

// ─── Shared helpers ──────────────────────────────────────────────────────────

fn finish(total: u64, submissions: Vec<IndexedSubmission>) -> Batch {
  let duplicate_ids = duplicate_ids(&submissions);
  if !duplicate_ids.is_empty() {
    warn!(
      count = duplicate_ids.len(),
      ids = ?duplicate_ids,
      "repeat identifiers across pages; callers should dedupe downstream"
    );
  }
  Batch { total, submissions, duplicate_ids }
}

fn within_window(query: &IndexQuery, submission: &IndexedSubmission) -> bool {
  if let Some(after) = query.after
    && submission.created_at < after
  {
    return false;
  }
  if let Some(before) = query.before
    && submission.created_at >= before
  {
    return false;
  }
  true
}

fn log_short_page(page_len: usize, limit: usize) {
  let expected = limit.min(PAGE_LIMIT);
  if page_len > 0 && page_len < expected {
    // End of data or upstream throttling; either way not an error.
    debug!(page_len, expected, "short page from index source");
  }
}

fn duplicate_ids(submissions: &[IndexedSubmission]) -> Vec<String> {
  let mut counts: HashMap<&str, usize> = HashMap::new();
  for submission in submissions {
    *counts.entry(submission.id.as_str()).or_default() += 1;
  }
  let mut ids: Vec<String> = counts
    .into_iter()
    .filter(|(_, count)| *count > 1)
    .map(|(id, _)| id.to_owned())
    .collect();
  ids.sort();
  ids
}

// ─── Tests ───────────────────────────────────────────────────────────────────
