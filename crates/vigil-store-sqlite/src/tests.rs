//! Integration tests for `SqliteStore` against an in-memory database.

use chrono::{TimeZone, Utc};
use vigil_core::{LiveSubmission, store::SnapshotStore};

use crate::SqliteStore;

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory().await.expect("in-memory store")
}

fn snapshot(id: &str) -> LiveSubmission {
  LiveSubmission {
    id:                  id.into(),
    author:              Some("someone".into()),
    title:               "a title".into(),
    selftext:            "body".into(),
    removed_by_category: None,
    fetched_at:          Utc.timestamp_opt(1_600_000_000, 0).unwrap(),
  }
}

fn ids(raw: &[&str]) -> Vec<String> {
  raw.iter().map(|s| (*s).to_string()).collect()
}

#[tokio::test]
async fn put_and_get_roundtrip() {
  let s = store().await;
  s.put_many(vec![snapshot("a"), snapshot("b")]).await.unwrap();

  let got = s.get_many(&ids(&["a", "b"])).await.unwrap();
  assert_eq!(got.len(), 2);
  let a = got.iter().find(|x| x.id == "a").unwrap();
  assert_eq!(a, &snapshot("a"));
}

#[tokio::test]
async fn unknown_ids_are_simply_absent() {
  let s = store().await;
  s.put_many(vec![snapshot("a")]).await.unwrap();

  let got = s.get_many(&ids(&["a", "ghost"])).await.unwrap();
  assert_eq!(got.len(), 1);
  assert_eq!(got[0].id, "a");
}

#[tokio::test]
async fn empty_requests_are_noops() {
  let s = store().await;
  s.put_many(Vec::new()).await.unwrap();
  assert!(s.get_many(&[]).await.unwrap().is_empty());
}

#[tokio::test]
async fn put_replaces_an_existing_row() {
  let s = store().await;
  s.put_many(vec![snapshot("a")]).await.unwrap();

  let mut updated = snapshot("a");
  updated.author = None;
  updated.selftext = "[removed]".into();
  updated.removed_by_category = Some("moderator".into());
  s.put_many(vec![updated.clone()]).await.unwrap();

  let got = s.get_many(&ids(&["a"])).await.unwrap();
  assert_eq!(got.len(), 1);
  assert_eq!(got[0], updated);
}

#[tokio::test]
async fn null_author_and_category_survive_the_roundtrip() {
  let s = store().await;
  let mut gone = snapshot("a");
  gone.author = None;
  gone.removed_by_category = Some("deleted".into());
  s.put_many(vec![gone.clone()]).await.unwrap();

  let got = s.get_many(&ids(&["a"])).await.unwrap();
  assert_eq!(got[0].author, None);
  assert_eq!(got[0].removed_by_category.as_deref(), Some("deleted"));
}

#[tokio::test]
async fn bulk_reads_span_chunk_boundaries() {
  let s = store().await;
  let many: Vec<LiveSubmission> =
    (0..1_100).map(|i| snapshot(&format!("id{i}"))).collect();
  s.put_many(many.clone()).await.unwrap();

  let all_ids: Vec<String> = many.iter().map(|x| x.id.clone()).collect();
  let got = s.get_many(&all_ids).await.unwrap();
  assert_eq!(got.len(), 1_100);
}
