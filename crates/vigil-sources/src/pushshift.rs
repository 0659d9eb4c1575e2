//! Client for the historical index source.
//!
//! The index source captures submissions shortly after creation and serves
//! them back by time range, at most [`PAGE_LIMIT`] per call. A separate
//! count query over the same filter backs uniform sampling.

use std::future::Future;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use vigil_core::IndexedSubmission;

use crate::{Error, Fetcher, Result};

/// The index source's fixed page-size ceiling.
pub const PAGE_LIMIT: usize = 100;

// ─── Query ───────────────────────────────────────────────────────────────────

/// Search parameters for the index source.
#[derive(Debug, Clone)]
pub struct IndexQuery {
  pub subreddit:    String,
  /// Window lower bound, exclusive-ish (boundary entries may repeat).
  pub after:        Option<DateTime<Utc>>,
  /// Window upper bound, exclusive.
  pub before:       Option<DateTime<Utc>>,
  /// Desired number of results overall; individual calls are still capped
  /// at [`PAGE_LIMIT`].
  pub limit:        usize,
  /// Optional full-text query.
  pub query:        Option<String>,
  /// Optional reply-count comparison, e.g. `">0"`. Note this counter keeps
  /// updating as the index ingests replies, unlike `score`.
  pub num_comments: Option<String>,
}

impl IndexQuery {
  pub fn new(subreddit: impl Into<String>, limit: usize) -> Self {
    Self {
      subreddit: subreddit.into(),
      after: None,
      before: None,
      limit,
      query: None,
      num_comments: None,
    }
  }
}

// ─── Seam trait ──────────────────────────────────────────────────────────────

/// The paginator's view of the index source.
pub trait IndexSource: Send + Sync {
  /// One page of submissions matching `query`, ordered by creation time.
  fn search<'a>(
    &'a self,
    query: &'a IndexQuery,
  ) -> impl Future<Output = Result<Vec<IndexedSubmission>>> + Send + 'a;

  /// Total number of submissions matching `query` across the full window.
  fn total<'a>(
    &'a self,
    query: &'a IndexQuery,
  ) -> impl Future<Output = Result<u64>> + Send + 'a;
}

// ─── Wire format ─────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct SearchEnvelope {
  #[serde(default)]
  data:     Vec<WireSubmission>,
  metadata: Option<WireMetadata>,
}

#[derive(Debug, Deserialize)]
struct WireMetadata {
  total_results: u64,
}

#[derive(Debug, Deserialize)]
struct WireSubmission {
  id:           String,
  subreddit:    String,
  author:       String,
  created_utc:  i64,
  /// Occasionally absent; falls back to the creation time.
  retrieved_on: Option<i64>,
  title:        String,
  #[serde(default)]
  score:        i64,
  #[serde(default)]
  num_comments: i64,
  #[serde(default)]
  selftext:     String,
  full_link:    String,
  url:          Option<String>,
}

fn decode_ts(secs: i64) -> Result<DateTime<Utc>> {
  DateTime::from_timestamp(secs, 0).ok_or(Error::InvalidTimestamp(secs))
}

impl WireSubmission {
  fn into_submission(self) -> Result<IndexedSubmission> {
    let created_at = decode_ts(self.created_utc)?;
    let retrieved_at = match self.retrieved_on {
      Some(secs) => decode_ts(secs)?,
      None => created_at,
    };
    Ok(IndexedSubmission {
      id: self.id,
      subreddit: self.subreddit,
      author: self.author,
      created_at,
      retrieved_at,
      title: self.title,
      score: self.score,
      num_comments: self.num_comments,
      selftext: self.selftext,
      permalink: self.full_link,
      url: self.url,
    })
  }
}

// ─── Client ──────────────────────────────────────────────────────────────────

/// HTTP client for the index source's submission search endpoint.
#[derive(Clone)]
pub struct IndexClient {
  fetcher:  Fetcher,
  base_url: String,
}

impl IndexClient {
  pub fn new(fetcher: Fetcher, base_url: &str) -> Self {
    Self { fetcher, base_url: base_url.trim_end_matches('/').to_string() }
  }

  fn search_url(&self) -> String {
    format!("{}/reddit/submission/search/", self.base_url)
  }

  fn params(&self, query: &IndexQuery, limit: usize) -> Vec<(&'static str, String)> {
    let mut params = vec![
      ("limit", limit.to_string()),
      ("subreddit", query.subreddit.clone()),
    ];
    if let Some(after) = query.after {
      params.push(("after", after.timestamp().to_string()));
    }
    if let Some(before) = query.before {
      params.push(("before", before.timestamp().to_string()));
    }
    if let Some(q) = &query.query {
      params.push(("q", q.clone()));
    }
    if let Some(num_comments) = &query.num_comments {
      params.push(("num_comments", num_comments.clone()));
    }
    params
  }
}

impl IndexSource for IndexClient {
  async fn search(&self, query: &IndexQuery) -> Result<Vec<IndexedSubmission>> {
    // No point passing limits beyond the source ceiling; it only fragments
    // upstream caching.
    let limit = query.limit.min(PAGE_LIMIT);
    let params = self.params(query, limit);
    let envelope: SearchEnvelope =
      self.fetcher.get_json(&self.search_url(), &params).await?;
    envelope
      .data
      .into_iter()
      .map(WireSubmission::into_submission)
      .collect()
  }

  async fn total(&self, query: &IndexQuery) -> Result<u64> {
    let mut params = self.params(query, 0);
    params.push(("metadata", "true".to_string()));
    let envelope: SearchEnvelope =
      self.fetcher.get_json(&self.search_url(), &params).await?;
    envelope
      .metadata
      .map(|m| m.total_results)
      .ok_or(Error::MissingTotal)
  }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn wire_submission_falls_back_to_created_when_unretrieved() {
    let wire = WireSubmission {
      id:           "abc".into(),
      subreddit:    "Advice".into(),
      author:       "a".into(),
      created_utc:  1_600_000_000,
      retrieved_on: None,
      title:        "t".into(),
      score:        0,
      num_comments: 0,
      selftext:     String::new(),
      full_link:    "https://www.reddit.com/r/Advice/comments/abc/".into(),
      url:          None,
    };
    let submission = wire.into_submission().unwrap();
    assert_eq!(submission.retrieved_at, submission.created_at);
  }

  #[test]
  fn wire_envelope_decodes_data_and_metadata() {
    let raw = r#"{
      "data": [{
        "id": "abc",
        "subreddit": "Advice",
        "author": "a",
        "created_utc": 1600000000,
        "retrieved_on": 1600003600,
        "title": "t",
        "score": 4,
        "num_comments": 2,
        "selftext": "body",
        "full_link": "https://www.reddit.com/r/Advice/comments/abc/",
        "url": "https://example.com"
      }],
      "metadata": { "total_results": 37 }
    }"#;
    let envelope: SearchEnvelope = serde_json::from_str(raw).unwrap();
    assert_eq!(envelope.data.len(), 1);
    assert_eq!(envelope.metadata.unwrap().total_results, 37);

    let submission = envelope
      .data
      .into_iter()
      .next()
      .unwrap()
      .into_submission()
      .unwrap();
    assert_eq!(submission.indexing_lag_hours(), 1);
    assert!(submission.is_crosspost());
  }
}
