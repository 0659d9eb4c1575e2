//! The rate-limited fetcher both source clients share.
//!
//! One blocking-style network call at a time: every request awaits a fixed
//! inter-request delay first, and a failed request is retried exactly once
//! after a long fixed backoff. A second consecutive failure propagates and
//! aborts the run. There are no timeout hooks beyond the transport default;
//! the system runs as a scheduled batch job, not an interactive service.

use std::time::Duration;

use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::{Error, Result};

// ─── Configuration ───────────────────────────────────────────────────────────

/// Rate-limit and identification settings for the shared HTTP client.
#[derive(Debug, Clone)]
pub struct FetchConfig {
  pub user_agent:    String,
  /// Floor slept before every request.
  pub min_delay:     Duration,
  /// Slept once after a failed request before the single retry. The index
  /// source has been observed throttling down to minutes.
  pub retry_backoff: Duration,
  pub timeout:       Duration,
}

impl Default for FetchConfig {
  fn default() -> Self {
    Self {
      user_agent:    concat!("vigil/", env!("CARGO_PKG_VERSION")).to_string(),
      min_delay:     Duration::from_secs(2),
      retry_backoff: Duration::from_secs(300),
      timeout:       Duration::from_secs(30),
    }
  }
}

// ─── Fetcher ─────────────────────────────────────────────────────────────────

/// Rate-limited JSON GET client.
///
/// Cheap to clone; the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct Fetcher {
  client:        reqwest::Client,
  min_delay:     Duration,
  retry_backoff: Duration,
}

impl Fetcher {
  pub fn new(config: &FetchConfig) -> Result<Self> {
    let client = reqwest::Client::builder()
      .user_agent(config.user_agent.as_str())
      .timeout(config.timeout)
      .build()?;
    Ok(Self {
      client,
      min_delay: config.min_delay,
      retry_backoff: config.retry_backoff,
    })
  }

  /// GET `url` with `query` parameters and decode the JSON body.
  ///
  /// Sleeps the rate-limit floor first. On failure, sleeps the long backoff
  /// and tries once more; the second error is returned as-is.
  pub async fn get_json<T: DeserializeOwned>(
    &self,
    url: &str,
    query: &[(&str, String)],
  ) -> Result<T> {
    tokio::time::sleep(self.min_delay).await;

    match self.try_get(url, query).await {
      Ok(value) => Ok(value),
      Err(err) => {
        warn!(
          url,
          error = %err,
          backoff_secs = self.retry_backoff.as_secs(),
          "request failed, backing off before the single retry"
        );
        tokio::time::sleep(self.retry_backoff).await;
        self.try_get(url, query).await
      }
    }
  }

  async fn try_get<T: DeserializeOwned>(
    &self,
    url: &str,
    query: &[(&str, String)],
  ) -> Result<T> {
    debug!(url, "GET");
    let response = self.client.get(url).query(query).send().await?;
    let status = response.status();
    if !status.is_success() {
      return Err(Error::Status { url: url.to_owned(), status: status.as_u16() });
    }

    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes)
      .map_err(|source| Error::Decode { url: url.to_owned(), source })
  }
}
