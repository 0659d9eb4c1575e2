//! Error type for `vigil-watch`.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("io error: {0}")]
  Io(#[from] std::io::Error),

  #[error("csv error: {0}")]
  Csv(#[from] csv::Error),

  #[error("registry parse error: {0}")]
  RegistryParse(#[from] toml::de::Error),

  #[error("registry encode error: {0}")]
  RegistryEncode(#[from] toml::ser::Error),

  #[error(transparent)]
  Sources(#[from] vigil_sources::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// Rotation precondition: the latest snapshot file must exist.
  #[error("latest snapshot missing: {0}")]
  MissingLatest(PathBuf),

  /// Rotation precondition: the freshly reconciled output must exist.
  #[error("fresh snapshot missing: {0}")]
  MissingFresh(PathBuf),

  /// Rotation precondition: the archive container must already exist.
  #[error("archive container missing: {0}")]
  MissingArchive(PathBuf),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
