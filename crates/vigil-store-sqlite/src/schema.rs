//! SQL schema for the snapshot cache.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

CREATE TABLE IF NOT EXISTS snapshots (
    id                  TEXT PRIMARY KEY,  -- base-36 identifier, unprefixed
    author              TEXT,              -- NULL when the account is gone
    title               TEXT NOT NULL,
    selftext            TEXT NOT NULL,
    removed_by_category TEXT,
    fetched_at          TEXT NOT NULL      -- RFC 3339 UTC
);

CREATE INDEX IF NOT EXISTS snapshots_fetched_idx ON snapshots(fetched_at);

PRAGMA user_version = 1;
";
