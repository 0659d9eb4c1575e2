//! Client for the live authority source.
//!
//! The live source has no time-range queries; it only answers batched
//! lookups by prefixed identifier (`t3_<id>`), at most
//! [`LOOKUP_BATCH_LIMIT`] per call.

use std::future::Future;

use chrono::Utc;
use serde::Deserialize;
use vigil_core::LiveSubmission;

use crate::{Fetcher, Result};

/// The live source's batch-size ceiling for identifier lookups.
pub const LOOKUP_BATCH_LIMIT: usize = 100;

/// Type tag prefixing submission identifiers in lookup requests.
const FULLNAME_PREFIX: &str = "t3_";

fn fullname(id: &str) -> String {
  if id.starts_with(FULLNAME_PREFIX) {
    id.to_owned()
  } else {
    format!("{FULLNAME_PREFIX}{id}")
  }
}

// ─── Seam trait ──────────────────────────────────────────────────────────────

/// The cache's view of the live source.
///
/// An identifier absent from the result is not an error; the live authority
/// sometimes never ingested a record the index has (or the reverse).
pub trait LiveSource: Send + Sync {
  fn lookup<'a>(
    &'a self,
    ids: &'a [String],
  ) -> impl Future<Output = Result<Vec<LiveSubmission>>> + Send + 'a;
}

// ─── Wire format ─────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct InfoEnvelope {
  data: InfoListing,
}

#[derive(Debug, Deserialize)]
struct InfoListing {
  #[serde(default)]
  children: Vec<InfoChild>,
}

#[derive(Debug, Deserialize)]
struct InfoChild {
  data: WireLive,
}

#[derive(Debug, Deserialize)]
struct WireLive {
  id:                  String,
  author:              Option<String>,
  title:               String,
  #[serde(default)]
  selftext:            String,
  removed_by_category: Option<String>,
}

// ─── Client ──────────────────────────────────────────────────────────────────

/// HTTP client for the live source's batched info endpoint.
#[derive(Clone)]
pub struct LiveClient {
  fetcher:  Fetcher,
  base_url: String,
}

impl LiveClient {
  pub fn new(fetcher: Fetcher, base_url: &str) -> Self {
    Self { fetcher, base_url: base_url.trim_end_matches('/').to_string() }
  }

  fn info_url(&self) -> String { format!("{}/api/info/", self.base_url) }
}

impl LiveSource for LiveClient {
  async fn lookup(&self, ids: &[String]) -> Result<Vec<LiveSubmission>> {
    let mut snapshots = Vec::with_capacity(ids.len());
    for chunk in ids.chunks(LOOKUP_BATCH_LIMIT) {
      let joined = chunk
        .iter()
        .map(|id| fullname(id))
        .collect::<Vec<_>>()
        .join(",");
      let envelope: InfoEnvelope = self
        .fetcher
        .get_json(&self.info_url(), &[("id", joined)])
        .await?;
      let fetched_at = Utc::now();
      snapshots.extend(envelope.data.children.into_iter().map(|child| {
        LiveSubmission {
          id:                  child.data.id,
          author:              child.data.author,
          title:               child.data.title,
          selftext:            child.data.selftext,
          removed_by_category: child.data.removed_by_category,
          fetched_at,
        }
      }));
    }
    Ok(snapshots)
  }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
