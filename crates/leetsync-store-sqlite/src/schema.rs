//! SQL schema for the leetsync SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS problems (
    id          INTEGER PRIMARY KEY,
    problem_id  INTEGER NOT NULL UNIQUE,
    frontend_id INTEGER NOT NULL UNIQUE,   -- external key for every tier
    title       TEXT    NOT NULL,
    url         TEXT    NOT NULL,
    difficulty  INTEGER NOT NULL,          -- 0 easy | 1 medium | 2 hard
    description TEXT    NOT NULL,
    premium     INTEGER NOT NULL DEFAULT 0
);

-- Tags are insert-only.
CREATE TABLE IF NOT EXISTS topic_tags (
    id   INTEGER PRIMARY KEY,
    name TEXT    NOT NULL UNIQUE
);

-- Rebuilt wholesale on every bulk refresh.
CREATE TABLE IF NOT EXISTS problem_tags (
    problem_id INTEGER NOT NULL REFERENCES problems(id)   ON DELETE CASCADE,
    tag_id     INTEGER NOT NULL REFERENCES topic_tags(id) ON DELETE CASCADE,
    PRIMARY KEY (problem_id, tag_id)
);

CREATE TABLE IF NOT EXISTS forum_channels (
    id         INTEGER PRIMARY KEY,
    group_id   INTEGER NOT NULL UNIQUE,
    channel_id INTEGER NOT NULL
);

-- At most one row per (problem_row_id, forum_channel_row_id) is maintained
-- by the registry and by bulk upserts, not by a constraint.
CREATE TABLE IF NOT EXISTS problem_threads (
    id                   INTEGER PRIMARY KEY,
    thread_id            INTEGER NOT NULL UNIQUE,
    problem_row_id       INTEGER NOT NULL REFERENCES problems(id)       ON DELETE CASCADE,
    forum_channel_row_id INTEGER NOT NULL REFERENCES forum_channels(id) ON DELETE CASCADE,
    created_at           TEXT    NOT NULL
);

CREATE INDEX IF NOT EXISTS problem_tags_tag_idx     ON problem_tags(tag_id);
CREATE INDEX IF NOT EXISTS problem_threads_pair_idx ON problem_threads(problem_row_id, forum_channel_row_id);

PRAGMA user_version = 1;
";
