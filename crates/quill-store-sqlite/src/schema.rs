//! SQL schema for the Quill SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated
//! on `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
///
/// `AUTOINCREMENT` keeps row ids monotonic even after deletions. The
/// unique index allows at most one row per `(title, genre, version_id)`,
/// which is the store-level guarantee behind per-group version numbering.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

CREATE TABLE IF NOT EXISTS stories (
    id         INTEGER PRIMARY KEY AUTOINCREMENT,
    title      TEXT NOT NULL,
    genre      TEXT NOT NULL,
    setting    TEXT NOT NULL DEFAULT '',
    characters TEXT NOT NULL DEFAULT '',
    themes     TEXT NOT NULL DEFAULT '',
    details    TEXT NOT NULL DEFAULT '',
    status     TEXT NOT NULL DEFAULT '',
    timestamp  TEXT NOT NULL,
    content    TEXT NOT NULL DEFAULT '',
    version_id INTEGER NOT NULL DEFAULT 1,
    user_id    TEXT NOT NULL DEFAULT ''
);

CREATE UNIQUE INDEX IF NOT EXISTS stories_group_version_idx
    ON stories(title, genre, version_id);

CREATE INDEX IF NOT EXISTS stories_group_idx ON stories(title, genre);

PRAGMA user_version = 1;
";
