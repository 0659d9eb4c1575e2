//! The watch-target registry.
//!
//! A TOML file mapping a human label (`<subreddit>-<YYYYMMDD>`) to the
//! current table path of that target. Loaded once at startup to discover
//! all active targets; appended to when a new target is initialised.

use std::{
  collections::BTreeMap,
  path::{Path, PathBuf},
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::Result;

/// All registered watch targets, label → current table path.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct Registry {
  #[serde(default)]
  pub targets: BTreeMap<String, PathBuf>,
}

impl Registry {
  /// Load the registry, or an empty one if the file does not exist yet.
  pub fn load(path: &Path) -> Result<Self> {
    if !path.exists() {
      return Ok(Self::default());
    }
    let raw = std::fs::read_to_string(path)?;
    Ok(toml::from_str(&raw)?)
  }

  pub fn save(&self, path: &Path) -> Result<()> {
    std::fs::write(path, toml::to_string_pretty(self)?)?;
    Ok(())
  }

  pub fn insert(&mut self, label: String, table_path: PathBuf) {
    self.targets.insert(label, table_path);
  }

  pub fn is_empty(&self) -> bool { self.targets.is_empty() }
}

/// Registry label for a target initialised at `when`.
pub fn target_label(subreddit: &str, when: DateTime<Utc>) -> String {
  format!("{subreddit}-{}", when.format("%Y%m%d"))
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  #[test]
  fn missing_file_loads_as_empty() {
    let dir = tempfile::tempdir().unwrap();
    let registry = Registry::load(&dir.path().join("watch.toml")).unwrap();
    assert!(registry.is_empty());
  }

  #[test]
  fn save_and_load_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("watch.toml");

    let mut registry = Registry::default();
    registry.insert(
      "Advice-20250806".into(),
      dir.path().join("watch-Advice-20250806_n10.csv"),
    );
    registry.insert(
      "AmItheAsshole-20250806".into(),
      dir.path().join("watch-AmItheAsshole-20250806_n99.csv"),
    );
    registry.save(&path).unwrap();

    let loaded = Registry::load(&path).unwrap();
    assert_eq!(loaded, registry);
  }

  #[test]
  fn label_combines_subreddit_and_date() {
    let when = Utc.timestamp_opt(1_754_500_000, 0).unwrap();
    assert_eq!(target_label("Advice", when), "Advice-20250806");
  }
}
