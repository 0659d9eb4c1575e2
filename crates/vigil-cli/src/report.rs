//! Per-submission deletion report for one-shot queries.
//!
//! A thin tabular export: one row per historical submission, annotated with
//! its current live-source state where that was resolved.

use std::{collections::HashMap, path::Path};

use anyhow::{Context as _, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use vigil_core::{Resolved, record::sentinel};
use vigil_sources::Batch;

/// Shown when a live field was not fetched or not knowable.
const NOT_AVAILABLE: &str = "NA";

#[derive(Debug, Serialize)]
pub struct ReportRow {
  subreddit:          String,
  /// Total matching entries across the window; meaningful when sampling.
  total:              u64,
  author_live:        String,
  author_index:       String,
  del_author_index:   bool,
  del_author_live:    bool,
  id:                 String,
  title:              String,
  created_utc:        String,
  /// Whole hours between creation and index ingestion.
  elapsed_hours:      i64,
  score_index:        i64,
  comments_num_index: i64,
  del_text_index:     bool,
  del_text_live:      bool,
  rem_text_live:      bool,
  crosspost:          bool,
  url:                String,
}

/// Heuristic for single-purpose throwaway accounts.
pub fn is_throwaway(user_name: &str) -> bool {
  let name = user_name.to_lowercase();
  // "throwra" is a common throwaway pattern in (relationship) advice
  // subreddits.
  (name.contains("throw") && name.contains("away")) || name.contains("throwra")
}

pub fn build_rows(
  batch: &Batch,
  resolved: &HashMap<String, Resolved>,
) -> Vec<ReportRow> {
  batch
    .submissions
    .iter()
    .map(|submission| {
      let live = resolved.get(&submission.id);
      let (author_live, del_author_live, del_text_live, rem_text_live) =
        match live {
          Some(Resolved::Found(snapshot)) => (
            snapshot
              .author
              .clone()
              .unwrap_or_else(|| sentinel::DELETED.to_string()),
            snapshot.author_deleted(),
            // The "deleted" category is authoritative even when the body
            // still reads as removed.
            snapshot.text_deleted()
              || snapshot.removed_by_category.as_deref()
                == Some(sentinel::CATEGORY_DELETED),
            snapshot.text_removed(),
          ),
          Some(Resolved::Missing) | None => {
            (NOT_AVAILABLE.to_string(), false, false, false)
          }
        };

      ReportRow {
        subreddit:          submission.subreddit.clone(),
        total:              batch.total,
        author_live,
        author_index:       submission.author.clone(),
        del_author_index:   submission.author_deleted(),
        del_author_live,
        id:                 submission.id.clone(),
        title:              submission.title.clone(),
        created_utc:        submission.created_at.to_rfc3339(),
        elapsed_hours:      submission.indexing_lag_hours(),
        score_index:        submission.score,
        comments_num_index: submission.num_comments,
        del_text_index:     submission.text_deleted(),
        del_text_live,
        rem_text_live,
        crosspost:          submission.is_crosspost(),
        url:                submission.permalink.clone(),
      }
    })
    .collect()
}

pub fn export(path: &Path, rows: &[ReportRow]) -> Result<()> {
  let mut writer = csv::Writer::from_path(path)
    .with_context(|| format!("creating report {}", path.display()))?;
  for row in rows {
    writer.serialize(row)?;
  }
  writer.flush()?;
  Ok(())
}

/// Report file name mirroring the query parameters, e.g.
/// `reddit_20250801-20250802_Advice_c0+_l50_n48_sampled.csv`.
#[allow(clippy::too_many_arguments)]
pub fn report_file_name(
  subreddit: &str,
  after: DateTime<Utc>,
  before: DateTime<Utc>,
  limit: usize,
  count: usize,
  comments_num: Option<&str>,
  sampled: bool,
  throwaway_only: bool,
) -> String {
  let date_str =
    format!("{}-{}", after.format("%Y%m%d"), before.format("%Y%m%d"));
  let comments = match comments_num {
    Some(c) => {
      if let Some(rest) = c.strip_prefix('>') {
        format!("_c{rest}+")
      } else if let Some(rest) = c.strip_prefix('<') {
        format!("_c{rest}-")
      } else {
        format!("_c{c}")
      }
    }
    None => String::new(),
  };
  let sampled = if sampled { "_sampled" } else { "" };
  let throwaway = if throwaway_only { "_throwaway" } else { "" };
  format!(
    "reddit_{date_str}_{subreddit}{comments}_l{limit}_n{count}{sampled}{throwaway}.csv"
  )
}

// ─── Tests ───────────────────────────────────────────────────────────────────
