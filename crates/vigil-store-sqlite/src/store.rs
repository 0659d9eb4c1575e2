//! [`SqliteStore`] — the SQLite implementation of [`SnapshotStore`].

use std::path::Path;

use vigil_core::{LiveSubmission, store::SnapshotStore};

use crate::{
  Error, Result,
  encode::{RawSnapshot, encode_dt},
  schema::SCHEMA,
};

/// SQLite variable limit guard; bulk reads are chunked below it.
const SELECT_CHUNK: usize = 500;

// ─── Store ───────────────────────────────────────────────────────────────────

/// A snapshot cache backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn select_chunk(&self, ids: Vec<String>) -> Result<Vec<RawSnapshot>> {
    let raws: Vec<RawSnapshot> = self
      .conn
      .call(move |conn| {
        let placeholders =
          std::iter::repeat_n("?", ids.len()).collect::<Vec<_>>().join(",");
        let sql = format!(
          "SELECT id, author, title, selftext, removed_by_category, fetched_at
           FROM snapshots WHERE id IN ({placeholders})"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(ids.iter()), |row| {
            Ok(RawSnapshot {
              id:                  row.get(0)?,
              author:              row.get(1)?,
              title:               row.get(2)?,
              selftext:            row.get(3)?,
              removed_by_category: row.get(4)?,
              fetched_at:          row.get(5)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(raws)
  }
}

// ─── SnapshotStore impl ──────────────────────────────────────────────────────

impl SnapshotStore for SqliteStore {
  type Error = Error;

  async fn get_many(&self, ids: &[String]) -> Result<Vec<LiveSubmission>> {
    let mut snapshots = Vec::new();
    for chunk in ids.chunks(SELECT_CHUNK) {
      let raws = self.select_chunk(chunk.to_vec()).await?;
      for raw in raws {
        snapshots.push(raw.into_snapshot()?);
      }
    }
    Ok(snapshots)
  }

  async fn put_many(&self, snapshots: Vec<LiveSubmission>) -> Result<()> {
    if snapshots.is_empty() {
      return Ok(());
    }
    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        {
          let mut stmt = tx.prepare(
            "INSERT OR REPLACE INTO snapshots
               (id, author, title, selftext, removed_by_category, fetched_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          )?;
          for snapshot in &snapshots {
            stmt.execute(rusqlite::params![
              snapshot.id,
              snapshot.author,
              snapshot.title,
              snapshot.selftext,
              snapshot.removed_by_category,
              encode_dt(snapshot.fetched_at),
            ])?;
          }
        }
        tx.commit()?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}
