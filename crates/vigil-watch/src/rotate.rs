//! Archive rotation for watch tables.
//!
//! Each target keeps a "latest" CSV next to an append-only tar container of
//! gzip-compressed, timestamp-suffixed copies. Rotation preserves the full
//! history: the container gains exactly one entry per rotation and the
//! latest file always equals the most recently reconciled state.
//!
//! A failure mid-rotation must never lose the snapshot silently: the
//! timestamped file either remains loose on disk for manual recovery or is
//! already archived, never both deleted and un-archived.

use std::{
  fs::{self, File, OpenOptions},
  io::{Seek, SeekFrom, Write},
  path::{Path, PathBuf},
};

use chrono::{DateTime, Utc};
use flate2::{Compression, write::GzEncoder};
use tracing::info;

use crate::{Error, Result};

/// Size of the two zero blocks that terminate a tar stream.
const TAR_TRAILER_LEN: u64 = 1024;

/// The archive container path belonging to `latest`, e.g.
/// `watch-Advice-20250806_n37-arch.tar`.
pub fn archive_path_for(latest: &Path) -> PathBuf {
  latest.with_file_name(format!("{}-arch.tar", stem_of(latest)))
}

fn stem_of(path: &Path) -> String {
  path
    .file_stem()
    .map(|s| s.to_string_lossy().into_owned())
    .unwrap_or_default()
}

// ─── Initialisation ──────────────────────────────────────────────────────────

/// Create the archive container for `latest`, seeded with its current
/// contents. Fails if the latest file is absent.
pub fn init_archive(latest: &Path, now: DateTime<Utc>) -> Result<PathBuf> {
  if !latest.exists() {
    return Err(Error::MissingLatest(latest.to_path_buf()));
  }
  let archive = archive_path_for(latest);

  let seed_name = format!("{}.gz", latest.file_name().unwrap_or_default().to_string_lossy());
  let mut builder = tar::Builder::new(File::create(&archive)?);
  append_to_builder(&mut builder, &seed_name, &fs::read(latest)?, now)?;
  builder.finish()?;

  info!(archive = %archive.display(), "archive initialised");
  Ok(archive)
}

// ─── Rotation ────────────────────────────────────────────────────────────────

/// Rotate `fresh` into place as the new latest snapshot.
///
/// Preconditions are checked before any file is touched; a missing latest
/// file or archive container is fatal. Steps: rename latest to its
/// timestamp-suffixed name, move `fresh` into place, append the timestamped
/// file to the archive, and delete the loose copy only after the append
/// succeeded.
pub fn rotate(latest: &Path, fresh: &Path, now: DateTime<Utc>) -> Result<()> {
  if !latest.exists() {
    return Err(Error::MissingLatest(latest.to_path_buf()));
  }
  if !fresh.exists() {
    return Err(Error::MissingFresh(fresh.to_path_buf()));
  }
  let archive = archive_path_for(latest);
  if !archive.exists() {
    return Err(Error::MissingArchive(archive));
  }

  let stamped_name =
    format!("{}-arch_{}.csv", stem_of(latest), now.timestamp());
  let stamped = latest.with_file_name(&stamped_name);

  fs::rename(latest, &stamped)?;
  fs::rename(fresh, latest)?;

  // If the append fails the stamped file stays on disk for manual recovery.
  append_entry(&archive, &format!("{stamped_name}.gz"), &fs::read(&stamped)?, now)?;
  fs::remove_file(&stamped)?;

  info!(
    latest = %latest.display(),
    entry = %stamped_name,
    "rotated snapshot into archive"
  );
  Ok(())
}

/// Names of all entries currently in the archive container.
pub fn archive_entries(archive: &Path) -> Result<Vec<String>> {
  let mut container = tar::Archive::new(File::open(archive)?);
  let mut names = Vec::new();
  for entry in container.entries()? {
    names.push(entry?.path()?.display().to_string());
  }
  Ok(names)
}

// ─── Tar plumbing ────────────────────────────────────────────────────────────

fn append_entry(
  archive: &Path,
  name: &str,
  data: &[u8],
  now: DateTime<Utc>,
) -> Result<()> {
  let mut file = OpenOptions::new().read(true).write(true).open(archive)?;
  let len = file.metadata()?.len();
  // Step back over the closing zero blocks so the new entry overwrites
  // them; finish() writes a fresh trailer.
  if len >= TAR_TRAILER_LEN {
    file.seek(SeekFrom::Start(len - TAR_TRAILER_LEN))?;
  }
  let mut builder = tar::Builder::new(file);
  append_to_builder(&mut builder, name, data, now)?;
  builder.finish()?;
  Ok(())
}

fn append_to_builder<W: Write>(
  builder: &mut tar::Builder<W>,
  name: &str,
  data: &[u8],
  now: DateTime<Utc>,
) -> Result<()> {
  let mut gz = GzEncoder::new(Vec::new(), Compression::default());
  gz.write_all(data)?;
  let compressed = gz.finish()?;

  let mut header = tar::Header::new_gnu();
  header.set_size(compressed.len() as u64);
  header.set_mode(0o644);
  header.set_mtime(now.timestamp().max(0) as u64);
  builder.append_data(&mut header, name, compressed.as_slice())?;
  Ok(())
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  fn ts(secs: i64) -> DateTime<Utc> { Utc.timestamp_opt(secs, 0).unwrap() }

  fn write(path: &Path, content: &str) {
    fs::write(path, content).unwrap();
  }

  #[test]
  fn repeated_rotations_grow_the_archive_by_one_each() {
    let dir = tempfile::tempdir().unwrap();
    let latest = dir.path().join("watch-Advice-20250806_n3.csv");
    write(&latest, "v0");

    let archive = init_archive(&latest, ts(1_000)).unwrap();
    assert_eq!(archive_entries(&archive).unwrap().len(), 1);

    for i in 1..=3 {
      let fresh = dir.path().join("updated.csv");
      write(&fresh, &format!("v{i}"));
      rotate(&latest, &fresh, ts(1_000 + i)).unwrap();

      // Latest always equals the newest snapshot.
      assert_eq!(fs::read_to_string(&latest).unwrap(), format!("v{i}"));

      let entries = archive_entries(&archive).unwrap();
      assert_eq!(entries.len(), 1 + i as usize);
    }

    // Exactly three timestamped entries beyond the seed, and no loose
    // stamped files remain.
    let entries = archive_entries(&archive).unwrap();
    let stamped: Vec<_> =
      entries.iter().filter(|n| n.contains("-arch_")).collect();
    assert_eq!(stamped.len(), 3);
    assert!(stamped.iter().all(|n| n.ends_with(".csv.gz")));

    let loose: Vec<_> = fs::read_dir(dir.path())
      .unwrap()
      .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
      .filter(|n| n.contains("-arch_"))
      .collect();
    assert!(loose.is_empty(), "loose stamped files: {loose:?}");
  }

  #[test]
  fn rotate_refuses_without_latest() {
    let dir = tempfile::tempdir().unwrap();
    let latest = dir.path().join("watch.csv");
    let fresh = dir.path().join("updated.csv");
    write(&fresh, "v1");

    let err = rotate(&latest, &fresh, ts(1_000)).unwrap_err();
    assert!(matches!(err, Error::MissingLatest(_)));
    // The fresh file was not consumed.
    assert!(fresh.exists());
  }

  #[test]
  fn rotate_refuses_without_archive_and_mutates_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let latest = dir.path().join("watch.csv");
    let fresh = dir.path().join("updated.csv");
    write(&latest, "v0");
    write(&fresh, "v1");

    let err = rotate(&latest, &fresh, ts(1_000)).unwrap_err();
    assert!(matches!(err, Error::MissingArchive(_)));
    assert_eq!(fs::read_to_string(&latest).unwrap(), "v0");
    assert_eq!(fs::read_to_string(&fresh).unwrap(), "v1");
  }

  #[test]
  fn rotate_refuses_without_fresh_output() {
    let dir = tempfile::tempdir().unwrap();
    let latest = dir.path().join("watch.csv");
    write(&latest, "v0");
    init_archive(&latest, ts(1_000)).unwrap();

    let err =
      rotate(&latest, &dir.path().join("updated.csv"), ts(2_000)).unwrap_err();
    assert!(matches!(err, Error::MissingFresh(_)));
    assert_eq!(fs::read_to_string(&latest).unwrap(), "v0");
  }

  #[test]
  fn init_archive_requires_the_seed_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let err =
      init_archive(&dir.path().join("watch.csv"), ts(1_000)).unwrap_err();
    assert!(matches!(err, Error::MissingLatest(_)));
  }

  #[test]
  fn archive_path_is_derived_from_the_table_stem() {
    let archive =
      archive_path_for(Path::new("/data/watch-Advice-20250806_n3.csv"));
    assert_eq!(
      archive,
      Path::new("/data/watch-Advice-20250806_n3-arch.tar")
    );
  }
}
