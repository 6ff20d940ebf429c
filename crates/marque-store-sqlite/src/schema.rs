//! SQL schema for the Marque SQLite store.
//!
//! Executed once at connection startup via `PRAGMA user_version`. Future
//! migrations will be gated on that version number.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- Identity mirror. Accounts are owned by the surrounding application; this
-- table exists so mentions resolve and author names render locally.
CREATE TABLE IF NOT EXISTS users (
    user_id   TEXT PRIMARY KEY,
    username  TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS bookmarks (
    bookmark_id   TEXT PRIMARY KEY,
    owner_id      TEXT NOT NULL REFERENCES users(user_id),
    comment_count INTEGER NOT NULL DEFAULT 0,  -- denormalised, floored at 0
    created_at    TEXT NOT NULL                -- ISO 8601 UTC
);

-- The reply tree is implicit in parent_id. Rows are soft-deleted in place;
-- no normal flow ever issues a DELETE against this table.
CREATE TABLE IF NOT EXISTS comments (
    comment_id       TEXT PRIMARY KEY,
    bookmark_id      TEXT NOT NULL REFERENCES bookmarks(bookmark_id),
    author_id        TEXT NOT NULL REFERENCES users(user_id),
    parent_id        TEXT REFERENCES comments(comment_id),
    content          TEXT NOT NULL,
    original_content TEXT,                     -- only while deleted = 1
    depth            INTEGER NOT NULL,         -- 0 for top-level, max 5
    like_count       INTEGER NOT NULL DEFAULT 0,
    dislike_count    INTEGER NOT NULL DEFAULT 0,
    deleted          INTEGER NOT NULL DEFAULT 0,
    edited           INTEGER NOT NULL DEFAULT 0,
    created_at       TEXT NOT NULL,            -- ISO 8601 UTC; server-assigned
    updated_at       TEXT
);

-- The vote ledger: at most one row per (user, comment). The UNIQUE primary
-- key resolves same-user races deterministically.
CREATE TABLE IF NOT EXISTS votes (
    user_id    TEXT NOT NULL REFERENCES users(user_id),
    comment_id TEXT NOT NULL REFERENCES comments(comment_id),
    kind       TEXT NOT NULL,                  -- 'like' | 'dislike'
    created_at TEXT NOT NULL,
    PRIMARY KEY (user_id, comment_id)
);

CREATE INDEX IF NOT EXISTS comments_bookmark_idx ON comments(bookmark_id, created_at);
CREATE INDEX IF NOT EXISTS comments_parent_idx   ON comments(parent_id);
CREATE INDEX IF NOT EXISTS votes_comment_idx     ON votes(comment_id);

PRAGMA user_version = 1;
";
