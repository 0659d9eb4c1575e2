//! The persisted watch table: a flat CSV file, one row per tracked
//! identifier.
//!
//! Boolean flag columns are kept alongside their nullable timestamp columns
//! so the table stays directly usable in spreadsheet tooling; on read the
//! timestamp is authoritative.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use vigil_core::{StickyFlag, WatchEntry};

use crate::{Error, Result};

// ─── Row format ──────────────────────────────────────────────────────────────

/// Raw strings as they appear in the CSV columns.
#[derive(Debug, Serialize, Deserialize)]
struct RawWatchRow {
  id:                  String,
  subreddit:           String,
  author_index:        String,
  del_author_index:    bool,
  created_utc:         String,
  found_utc:           String,
  checked_utc:         String,
  del_author:          bool,
  del_author_utc:      Option<String>,
  del_text:            bool,
  del_text_utc:        Option<String>,
  rem_text:            bool,
  rem_text_utc:        Option<String>,
  removed_by_category: Option<String>,
}

fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

fn decode_flag(raw: Option<&str>) -> Result<StickyFlag> {
  let observed_at = match raw {
    Some(s) if !s.is_empty() => Some(decode_dt(s)?),
    _ => None,
  };
  Ok(StickyFlag::restored(observed_at))
}

impl RawWatchRow {
  fn from_entry(entry: &WatchEntry) -> Self {
    Self {
      id:                  entry.id.clone(),
      subreddit:           entry.subreddit.clone(),
      author_index:        entry.index_author.clone(),
      del_author_index:    entry.index_author_deleted,
      created_utc:         encode_dt(entry.created_at),
      found_utc:           encode_dt(entry.first_seen_at),
      checked_utc:         encode_dt(entry.last_checked_at),
      del_author:          entry.author_deleted.is_set(),
      del_author_utc:      entry.author_deleted.observed_at().map(encode_dt),
      del_text:            entry.text_deleted.is_set(),
      del_text_utc:        entry.text_deleted.observed_at().map(encode_dt),
      rem_text:            entry.text_removed.is_set(),
      rem_text_utc:        entry.text_removed.observed_at().map(encode_dt),
      removed_by_category: entry.removal_category.clone(),
    }
  }

  fn into_entry(self) -> Result<WatchEntry> {
    Ok(WatchEntry {
      id:                   self.id,
      subreddit:            self.subreddit,
      index_author:         self.author_index,
      index_author_deleted: self.del_author_index,
      created_at:           decode_dt(&self.created_utc)?,
      first_seen_at:        decode_dt(&self.found_utc)?,
      last_checked_at:      decode_dt(&self.checked_utc)?,
      author_deleted:       decode_flag(self.del_author_utc.as_deref())?,
      text_deleted:         decode_flag(self.del_text_utc.as_deref())?,
      text_removed:         decode_flag(self.rem_text_utc.as_deref())?,
      removal_category:     self.removed_by_category.filter(|c| !c.is_empty()),
    })
  }
}

// ─── File I/O ────────────────────────────────────────────────────────────────

pub fn read_table(path: &Path) -> Result<Vec<WatchEntry>> {
  let mut reader = csv::Reader::from_path(path)?;
  let mut entries = Vec::new();
  for row in reader.deserialize::<RawWatchRow>() {
    entries.push(row?.into_entry()?);
  }
  Ok(entries)
}

pub fn write_table(path: &Path, entries: &[WatchEntry]) -> Result<()> {
  let mut writer = csv::Writer::from_path(path)?;
  for entry in entries {
    writer.serialize(RawWatchRow::from_entry(entry))?;
  }
  writer.flush()?;
  Ok(())
}

/// Canonical table file name for a freshly initialised target, e.g.
/// `watch-Advice-20260807_n123.csv`.
pub fn table_file_name(
  subreddit: &str,
  initialized_at: DateTime<Utc>,
  count: usize,
) -> String {
  format!(
    "watch-{subreddit}-{}_n{count}.csv",
    initialized_at.format("%Y%m%d")
  )
}

// ─── Tests ───────────────────────────────────────────────────────────────────
