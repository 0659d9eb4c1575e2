//! Error type for `vigil-sources`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("http error: {0}")]
  Http(#[from] reqwest::Error),

  #[error("{url} returned status {status}")]
  Status { url: String, status: u16 },

  #[error("decoding response from {url}: {source}")]
  Decode {
    url:    String,
    #[source]
    source: serde_json::Error,
  },

  #[error("index source returned unrepresentable timestamp {0}")]
  InvalidTimestamp(i64),

  #[error("count query returned no metadata")]
  MissingTotal,

  #[error("uniform sampling requires both window bounds")]
  SamplingWindowRequired,

  #[error("snapshot store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
