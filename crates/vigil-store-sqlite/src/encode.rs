//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings; everything else is already
//! text in the domain model.

use chrono::{DateTime, Utc};
use vigil_core::LiveSubmission;

use crate::{Error, Result};

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

/// Raw strings read directly from a `snapshots` row.
pub struct RawSnapshot {
  pub id:                  String,
  pub author:              Option<String>,
  pub title:               String,
  pub selftext:            String,
  pub removed_by_category: Option<String>,
  pub fetched_at:          String,
}

impl RawSnapshot {
  pub fn into_snapshot(self) -> Result<LiveSubmission> {
    Ok(LiveSubmission {
      id:                  self.id,
      author:              self.author,
      title:               self.title,
      selftext:            self.selftext,
      removed_by_category: self.removed_by_category,
      fetched_at:          decode_dt(&self.fetched_at)?,
    })
  }
}
