//! The `CatalogStore` trait: the durable relational tier.
//!
//! The trait is implemented by storage backends (e.g.
//! `leetsync-store-sqlite`). The cache and registry in `leetsync-sync` depend
//! on this abstraction, not on any concrete backend.

use std::future::Future;

use crate::{
  forum::{ForumChannelConfig, NewThreadRecord, ThreadRecord},
  problem::{ProblemEntry, ProblemRecord, TopicTag},
};

/// Abstraction over the relational store.
///
/// Every method is one transactional unit: it commits on success and rolls
/// back on any error, so no call leaves a transaction open.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes.
pub trait CatalogStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Problems ──────────────────────────────────────────────────────────

  /// Load one problem with its tags in a single read. `None` if absent.
  fn get_problem(
    &self,
    frontend_id: u32,
  ) -> impl Future<Output = Result<Option<ProblemEntry>, Self::Error>> + Send + '_;

  /// Load every problem with its tags.
  fn list_problems(
    &self,
  ) -> impl Future<Output = Result<Vec<ProblemEntry>, Self::Error>> + Send + '_;

  /// Persist a single resolved record: reuse the problem row if one exists
  /// for its frontend id, otherwise insert it; insert-or-reuse each tag; link
  /// the tags to the problem. Existing links are kept.
  ///
  /// A row stored for the same `problem_id` under another frontend id is
  /// moved to the record's frontend id rather than duplicated.
  fn insert_problem(
    &self,
    record: ProblemRecord,
  ) -> impl Future<Output = Result<ProblemEntry, Self::Error>> + Send + '_;

  /// Set-based upsert keyed by `problem_id`: new rows are inserted, existing
  /// rows have every attribute overwritten, frontend id included. A stored
  /// row that holds an incoming frontend id for a different problem is
  /// deleted. Returns the number of records written.
  fn upsert_problems(
    &self,
    records: Vec<ProblemRecord>,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;

  /// Delete a problem; its tag links and thread records go with it.
  /// Returns whether a row was deleted.
  fn remove_problem(
    &self,
    frontend_id: u32,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Tags ──────────────────────────────────────────────────────────────

  /// Insert tags that do not exist yet; existing tags are never touched.
  /// Returns the number of new tags.
  fn upsert_tags(
    &self,
    names: Vec<String>,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;

  fn list_tags(
    &self,
  ) -> impl Future<Output = Result<Vec<TopicTag>, Self::Error>> + Send + '_;

  /// Replace the whole problem/tag association table with `links`
  /// (`(frontend_id, tag_name)` pairs). Every link must name an existing
  /// problem and tag, otherwise nothing changes.
  fn replace_associations(
    &self,
    links: Vec<(u32, String)>,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;

  // ── Forum channels ────────────────────────────────────────────────────

  fn get_forum_channel(
    &self,
    group_id: u64,
  ) -> impl Future<Output = Result<Option<ForumChannelConfig>, Self::Error>> + Send + '_;

  fn list_forum_channels(
    &self,
  ) -> impl Future<Output = Result<Vec<ForumChannelConfig>, Self::Error>> + Send + '_;

  /// Insert the group's configuration or overwrite its channel.
  fn upsert_forum_channel(
    &self,
    group_id: u64,
    channel_id: u64,
  ) -> impl Future<Output = Result<ForumChannelConfig, Self::Error>> + Send + '_;

  // ── Threads ───────────────────────────────────────────────────────────

  fn get_thread(
    &self,
    thread_id: u64,
  ) -> impl Future<Output = Result<Option<ThreadRecord>, Self::Error>> + Send + '_;

  /// The thread recorded for a (problem row, forum channel row) pair.
  fn find_thread(
    &self,
    problem_row_id: i64,
    forum_channel_row_id: i64,
  ) -> impl Future<Output = Result<Option<ThreadRecord>, Self::Error>> + Send + '_;

  fn list_threads(
    &self,
  ) -> impl Future<Output = Result<Vec<ThreadRecord>, Self::Error>> + Send + '_;

  /// Record a newly created thread. Fails if the thread id is already taken.
  fn insert_thread(
    &self,
    input: NewThreadRecord,
  ) -> impl Future<Output = Result<ThreadRecord, Self::Error>> + Send + '_;

  /// Bulk upsert keyed by thread id: unknown ids are inserted, known ids have
  /// their problem and channel linkage overwritten. Any other thread recorded
  /// for the same (problem row, forum channel row) pair is deleted. Returns
  /// the number of records written.
  fn upsert_threads(
    &self,
    inputs: Vec<NewThreadRecord>,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;

  /// Returns whether a record was deleted.
  fn delete_thread(
    &self,
    thread_id: u64,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;
}
