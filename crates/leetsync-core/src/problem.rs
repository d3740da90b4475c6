//! Problem types: the records mirrored from the remote catalog.
//!
//! A problem is addressed everywhere (cache, store, remote) by its
//! `frontend_id`, the stable user-facing number. The remote-assigned
//! `problem_id` is kept as an attribute and is unique as well, but nothing is
//! ever looked up by it.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

use crate::{ParseError, Result};

/// Text used when the remote supplies no description at all.
pub const EMPTY_DESCRIPTION: &str = "No description available.";

/// Suffix appended to a description that was cut at the length limit.
pub const TRUNCATION_MARKER: &str = "...";

/// Default cap on description length, in characters.
pub const DEFAULT_DESCRIPTION_LIMIT: usize = 500;

// ─── Difficulty ──────────────────────────────────────────────────────────────

/// Problem difficulty. Stored as a small integer, parsed from the remote's
/// display string.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  PartialOrd,
  Ord,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  AsRefStr,
)]
#[strum(ascii_case_insensitive)]
pub enum Difficulty {
  Easy,
  Medium,
  Hard,
}

impl Difficulty {
  /// Parse the remote's display string (`"Easy"`, `"Medium"`, `"Hard"`).
  pub fn parse(s: &str) -> Result<Self> {
    s.trim()
      .parse()
      .map_err(|_| ParseError::UnknownDifficulty(s.to_owned()))
  }

  /// The value stored in the `difficulty` column.
  pub fn db_repr(self) -> i64 {
    match self {
      Self::Easy => 0,
      Self::Medium => 1,
      Self::Hard => 2,
    }
  }

  pub fn from_db_repr(repr: i64) -> Result<Self> {
    match repr {
      0 => Ok(Self::Easy),
      1 => Ok(Self::Medium),
      2 => Ok(Self::Hard),
      other => Err(ParseError::UnknownDifficultyRepr(other)),
    }
  }
}

// ─── Remote record ───────────────────────────────────────────────────────────

/// A problem exactly as observed on the remote catalog, with the names of its
/// topic tags. This is the unit every remote call yields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProblemRecord {
  pub problem_id:  u32,
  pub frontend_id: u32,
  pub title:       String,
  pub url:         String,
  pub difficulty:  Difficulty,
  /// Already sanitised and capped; see [`cap_description`].
  pub description: String,
  pub premium:     bool,
  pub tags:        BTreeSet<String>,
}

// ─── Stored types ────────────────────────────────────────────────────────────

/// A persisted problem row. `id` is the store-generated row id that thread
/// records reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Problem {
  pub id:          i64,
  pub problem_id:  u32,
  pub frontend_id: u32,
  pub title:       String,
  pub url:         String,
  pub difficulty:  Difficulty,
  pub description: String,
  pub premium:     bool,
}

/// A topic tag. Created on first observation, never renamed or deleted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TopicTag {
  pub id:   i64,
  pub name: String,
}

/// A problem together with its fully-resolved tags. The only shape the
/// problem cache ever holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProblemEntry {
  pub problem: Problem,
  /// Sorted by name.
  pub tags:    Vec<TopicTag>,
}

impl ProblemEntry {
  pub fn frontend_id(&self) -> u32 { self.problem.frontend_id }

  pub fn tag_names(&self) -> impl Iterator<Item = &str> {
    self.tags.iter().map(|t| t.name.as_str())
  }
}

// ─── Description ─────────────────────────────────────────────────────────────

/// Normalise an already-plain-text description for storage.
///
/// Surrounding whitespace is trimmed, runs of blank lines collapse to a single
/// blank line, and the result is cut to `limit` characters with
/// [`TRUNCATION_MARKER`] appended when anything was dropped.
pub fn cap_description(text: &str, limit: usize) -> String {
  let trimmed = text.trim();
  if trimmed.is_empty() {
    return EMPTY_DESCRIPTION.to_owned();
  }

  let mut collapsed = String::with_capacity(trimmed.len());
  let mut pending_blank = false;
  for line in trimmed.lines() {
    if line.trim().is_empty() {
      pending_blank = true;
      continue;
    }
    if !collapsed.is_empty() {
      collapsed.push_str(if pending_blank { "\n\n" } else { "\n" });
    }
    pending_blank = false;
    collapsed.push_str(line);
  }

  match collapsed.char_indices().nth(limit) {
    Some((cut, _)) => {
      let mut capped = collapsed[..cut].to_owned();
      capped.push_str(TRUNCATION_MARKER);
      capped
    }
    None => collapsed,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn difficulty_parses_case_insensitively() {
    assert_eq!(Difficulty::parse("Easy").unwrap(), Difficulty::Easy);
    assert_eq!(Difficulty::parse("medium").unwrap(), Difficulty::Medium);
    assert_eq!(Difficulty::parse(" HARD ").unwrap(), Difficulty::Hard);
  }

  #[test]
  fn difficulty_rejects_unknown_values() {
    assert_eq!(
      Difficulty::parse("Impossible"),
      Err(ParseError::UnknownDifficulty("Impossible".into()))
    );
    assert!(Difficulty::parse("").is_err());
  }

  #[test]
  fn difficulty_db_repr_is_stable() {
    for d in [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard] {
      assert_eq!(Difficulty::from_db_repr(d.db_repr()).unwrap(), d);
    }
    assert_eq!(
      Difficulty::from_db_repr(7),
      Err(ParseError::UnknownDifficultyRepr(7))
    );
    assert_eq!(Difficulty::Medium.to_string(), "Medium");
  }

  #[test]
  fn empty_description_gets_placeholder() {
    assert_eq!(cap_description("", 100), EMPTY_DESCRIPTION);
    assert_eq!(cap_description("  \n\n ", 100), EMPTY_DESCRIPTION);
  }

  #[test]
  fn blank_line_runs_collapse() {
    let text = "\n  Given an array.\n\n\n   \nReturn the sum.\nExample 1:\n";
    assert_eq!(
      cap_description(text, 100),
      "Given an array.\n\nReturn the sum.\nExample 1:"
    );
  }

  #[test]
  fn long_description_is_truncated_with_marker() {
    let capped = cap_description("abcdefghij", 4);
    assert_eq!(capped, "abcd...");

    // Exactly at the limit: no marker.
    assert_eq!(cap_description("abcd", 4), "abcd");
  }

  #[test]
  fn truncation_respects_char_boundaries() {
    let capped = cap_description("ééééé", 2);
    assert_eq!(capped, "éé...");
  }
}
