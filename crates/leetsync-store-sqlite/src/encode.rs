//! Encoding and decoding helpers between domain types and the plain values
//! stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings. Platform snowflake ids (`u64`)
//! are stored bit-for-bit in `INTEGER` columns. Difficulty is stored as its
//! small integer representation.

use chrono::{DateTime, Utc};
use leetsync_core::{
  forum::{ForumChannelConfig, ThreadRecord},
  problem::{Difficulty, Problem, ProblemEntry, TopicTag},
};

use crate::{Error, Result};

// ─── Snowflakes ──────────────────────────────────────────────────────────────

// SQLite integers are signed 64-bit; the cast is lossless in both directions.
pub fn encode_snowflake(id: u64) -> i64 { id as i64 }

pub fn decode_snowflake(v: i64) -> u64 { v as u64 }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Difficulty ──────────────────────────────────────────────────────────────

pub fn encode_difficulty(d: Difficulty) -> i64 { d.db_repr() }

pub fn decode_difficulty(v: i64) -> Result<Difficulty> {
  Ok(Difficulty::from_db_repr(v)?)
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Column list matching [`raw_problem`].
pub const PROBLEM_COLUMNS: &str =
  "id, problem_id, frontend_id, title, url, difficulty, description, premium";

/// Raw values read directly from a `problems` row.
pub struct RawProblem {
  pub id:          i64,
  pub problem_id:  u32,
  pub frontend_id: u32,
  pub title:       String,
  pub url:         String,
  pub difficulty:  i64,
  pub description: String,
  pub premium:     bool,
}

pub fn raw_problem(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawProblem> {
  Ok(RawProblem {
    id:          row.get(0)?,
    problem_id:  row.get(1)?,
    frontend_id: row.get(2)?,
    title:       row.get(3)?,
    url:         row.get(4)?,
    difficulty:  row.get(5)?,
    description: row.get(6)?,
    premium:     row.get(7)?,
  })
}

/// A problem row plus the tags joined to it in the same read.
pub struct RawEntry {
  pub problem: RawProblem,
  pub tags:    Vec<TopicTag>,
}

impl RawEntry {
  pub fn into_entry(self) -> Result<ProblemEntry> {
    let p = self.problem;
    Ok(ProblemEntry {
      problem: Problem {
        id:          p.id,
        problem_id:  p.problem_id,
        frontend_id: p.frontend_id,
        title:       p.title,
        url:         p.url,
        difficulty:  decode_difficulty(p.difficulty)?,
        description: p.description,
        premium:     p.premium,
      },
      tags:    self.tags,
    })
  }
}

pub const FORUM_COLUMNS: &str = "id, group_id, channel_id";

pub fn forum_channel(row: &rusqlite::Row<'_>) -> rusqlite::Result<ForumChannelConfig> {
  Ok(ForumChannelConfig {
    id:         row.get(0)?,
    group_id:   decode_snowflake(row.get(1)?),
    channel_id: decode_snowflake(row.get(2)?),
  })
}

pub const THREAD_COLUMNS: &str =
  "id, thread_id, problem_row_id, forum_channel_row_id, created_at";

/// Raw values read directly from a `problem_threads` row.
pub struct RawThread {
  pub id:                   i64,
  pub thread_id:            i64,
  pub problem_row_id:       i64,
  pub forum_channel_row_id: i64,
  pub created_at:           String,
}

pub fn raw_thread(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawThread> {
  Ok(RawThread {
    id:                   row.get(0)?,
    thread_id:            row.get(1)?,
    problem_row_id:       row.get(2)?,
    forum_channel_row_id: row.get(3)?,
    created_at:           row.get(4)?,
  })
}

impl RawThread {
  pub fn into_record(self) -> Result<ThreadRecord> {
    Ok(ThreadRecord {
      id:                   self.id,
      thread_id:            decode_snowflake(self.thread_id),
      problem_row_id:       self.problem_row_id,
      forum_channel_row_id: self.forum_channel_row_id,
      created_at:           decode_dt(&self.created_at)?,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn snowflakes_survive_the_signed_column() {
    for id in [0, 1, 1_234_567_890_123_456_789, u64::MAX] {
      assert_eq!(decode_snowflake(encode_snowflake(id)), id);
    }
  }

  #[test]
  fn unknown_difficulty_column_is_a_decode_error() {
    assert!(matches!(decode_difficulty(9), Err(Error::Decode(_))));
  }
}
