//! Forum configuration and thread records.
//!
//! A group (a chat server) designates one forum channel to host problem
//! discussions. Every discussion thread created there is remembered as a
//! [`ThreadRecord`], the durable proof that the thread exists.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::problem::ProblemEntry;

/// Tag applied to every thread the engine creates.
pub const CATALOG_TAG: &str = "LeetCode";

// ─── Configuration ───────────────────────────────────────────────────────────

/// The forum channel a group has designated for problem threads.
/// One row per group; set administratively.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForumChannelConfig {
  pub id:         i64,
  pub group_id:   u64,
  pub channel_id: u64,
}

// ─── Thread records ──────────────────────────────────────────────────────────

/// Links an external thread to the problem and forum configuration it was
/// created for. Never updated in place: a changed mapping is a delete plus an
/// insert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadRecord {
  pub id:                   i64,
  pub thread_id:            u64,
  pub problem_row_id:       i64,
  pub forum_channel_row_id: i64,
  /// Server-assigned; for migrated threads this is the migration time.
  pub created_at:           DateTime<Utc>,
}

/// Input to [`crate::store::CatalogStore::insert_thread`] and
/// [`crate::store::CatalogStore::upsert_threads`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewThreadRecord {
  pub thread_id:            u64,
  pub problem_row_id:       i64,
  pub forum_channel_row_id: i64,
}

/// A pre-existing external thread claimed for a problem in a group, as fed to
/// bulk migration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ThreadClaim {
  pub frontend_id: u32,
  pub group_id:    u64,
}

// ─── Thread creation ─────────────────────────────────────────────────────────

/// Why a thread is being opened; decides one of the applied tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThreadKind {
  #[default]
  Problem,
  Daily,
}

impl ThreadKind {
  pub fn tag(self) -> &'static str {
    match self {
      Self::Problem => "Problem",
      Self::Daily => "Daily",
    }
  }
}

/// Everything the chat platform needs to open a thread for a problem.
#[derive(Debug, Clone)]
pub struct ThreadDraft {
  pub channel_id:   u64,
  pub title:        String,
  pub body:         String,
  pub applied_tags: Vec<String>,
  /// The resolved problem, for platforms that render richer content.
  pub problem:      Arc<ProblemEntry>,
}

impl ThreadDraft {
  pub fn for_problem(
    channel_id: u64,
    entry: Arc<ProblemEntry>,
    kind: ThreadKind,
  ) -> Self {
    let problem = &entry.problem;
    Self {
      channel_id,
      title: thread_title(problem.frontend_id, &problem.title),
      body: format!("{}\n\n{}", problem.url, problem.description),
      applied_tags: vec![
        CATALOG_TAG.to_owned(),
        kind.tag().to_owned(),
        problem.difficulty.to_string(),
      ],
      problem: entry,
    }
  }
}

// ─── Thread titles ───────────────────────────────────────────────────────────

/// The naming convention for problem threads: `"1. Two Sum"`.
pub fn thread_title(frontend_id: u32, title: &str) -> String {
  format!("{frontend_id}. {title}")
}

/// Recover the frontend id from a thread title following [`thread_title`]:
/// leading ASCII digits, a `.`, then whitespace.
pub fn frontend_id_from_title(title: &str) -> Option<u32> {
  let digits = title.len() - title.trim_start_matches(|c: char| c.is_ascii_digit()).len();
  if digits == 0 {
    return None;
  }
  let mut rest = title[digits..].chars();
  if rest.next() != Some('.') || !rest.next().is_some_and(char::is_whitespace) {
    return None;
  }
  title[..digits].parse().ok()
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::problem::{Difficulty, Problem, TopicTag};

  fn entry() -> Arc<ProblemEntry> {
    Arc::new(ProblemEntry {
      problem: Problem {
        id:          7,
        problem_id:  1,
        frontend_id: 1,
        title:       "Two Sum".into(),
        url:         "https://leetcode.com/problems/two-sum/".into(),
        difficulty:  Difficulty::Easy,
        description: "Find two numbers.".into(),
        premium:     false,
      },
      tags:    vec![TopicTag { id: 1, name: "Array".into() }],
    })
  }

  #[test]
  fn draft_follows_naming_convention() {
    let draft = ThreadDraft::for_problem(99, entry(), ThreadKind::Daily);
    assert_eq!(draft.channel_id, 99);
    assert_eq!(draft.title, "1. Two Sum");
    assert!(draft.body.starts_with("https://leetcode.com/problems/two-sum/\n"));
    assert!(draft.body.ends_with("Find two numbers."));
    assert_eq!(draft.applied_tags, ["LeetCode", "Daily", "Easy"]);
  }

  #[test]
  fn title_roundtrips_through_parser() {
    assert_eq!(frontend_id_from_title(&thread_title(1234, "Foo Bar")), Some(1234));
  }

  #[test]
  fn titles_without_convention_are_rejected() {
    assert_eq!(frontend_id_from_title("Two Sum"), None);
    assert_eq!(frontend_id_from_title("1.Two Sum"), None);
    assert_eq!(frontend_id_from_title("1 Two Sum"), None);
    assert_eq!(frontend_id_from_title(". Two Sum"), None);
    assert_eq!(frontend_id_from_title("12"), None);
    assert_eq!(frontend_id_from_title("99999999999. Overflow"), None);
  }

  #[test]
  fn any_whitespace_after_the_dot_is_accepted() {
    assert_eq!(frontend_id_from_title("42.\tAnswer"), Some(42));
  }
}
