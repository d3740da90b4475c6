//! [`ThreadRegistry`]: create-or-reuse discussion threads per (problem, group).
//!
//! Per (problem, group) the registry moves between two states:
//!
//! ```text
//! ABSENT ──create──▶ PRESENT ──external deletion detected──▶ ABSENT
//! ```
//!
//! The store is the source of truth for whether a thread was created; the
//! chat platform is the source of truth for whether it still exists.

use std::{
  collections::{BTreeMap, HashMap},
  future::Future,
  sync::Arc,
};

use leetsync_core::{
  catalog::RemoteCatalog,
  forum::{
    ForumChannelConfig, NewThreadRecord, ThreadClaim, ThreadDraft, ThreadKind,
    ThreadRecord,
  },
  platform::{ThreadHandle, ThreadPlatform},
  store::CatalogStore,
};
use parking_lot::RwLock;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::{
  error::{Error, Result},
  problems::ProblemCache,
};

/// How [`ThreadRegistry::reopen_or_create_thread`] satisfied the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ThreadOutcome {
  Created,
  Reused,
}

pub struct ThreadRegistry<S, R> {
  store:    Arc<S>,
  problems: Arc<ProblemCache<S, R>>,
  forums:   RwLock<HashMap<u64, ForumChannelConfig>>,
  threads:  RwLock<HashMap<u64, ThreadRecord>>,
  /// Serialises check-then-create per (problem, group).
  creating: parking_lot::Mutex<HashMap<ThreadClaim, Arc<Mutex<()>>>>,
}

impl<S, R> ThreadRegistry<S, R>
where
  S: CatalogStore,
  R: RemoteCatalog,
{
  pub fn new(store: Arc<S>, problems: Arc<ProblemCache<S, R>>) -> Self {
    Self {
      store,
      problems,
      forums: RwLock::new(HashMap::new()),
      threads: RwLock::new(HashMap::new()),
      creating: parking_lot::Mutex::new(HashMap::new()),
    }
  }

  /// Load every forum configuration and thread record into memory.
  pub async fn warm(&self) -> Result<(usize, usize)> {
    let forums = self
      .store
      .list_forum_channels()
      .await
      .map_err(Error::persistence)?;
    let threads = self.store.list_threads().await.map_err(Error::persistence)?;
    let counts = (forums.len(), threads.len());

    *self.forums.write() = forums.into_iter().map(|f| (f.group_id, f)).collect();
    *self.threads.write() = threads.into_iter().map(|t| (t.thread_id, t)).collect();
    info!(forums = counts.0, threads = counts.1, "thread registry warmed");
    Ok(counts)
  }

  // ─── Forum configuration ─────────────────────────────────────────────────

  pub async fn get_forum_config(
    &self,
    group_id: u64,
  ) -> Result<Option<ForumChannelConfig>> {
    if let Some(config) = self.forums.read().get(&group_id).cloned() {
      return Ok(Some(config));
    }
    let config = self
      .store
      .get_forum_channel(group_id)
      .await
      .map_err(Error::persistence)?;
    if let Some(config) = &config {
      self.forums.write().insert(group_id, config.clone());
    }
    Ok(config)
  }

  /// Designate `channel_id` as the group's forum, replacing any previous one.
  pub async fn set_forum_config(
    &self,
    group_id: u64,
    channel_id: u64,
  ) -> Result<ForumChannelConfig> {
    let config = self
      .store
      .upsert_forum_channel(group_id, channel_id)
      .await
      .map_err(Error::persistence)?;
    self.forums.write().insert(group_id, config.clone());
    info!(group_id, channel_id, "forum channel configured");
    Ok(config)
  }

  async fn require_forum_config(&self, group_id: u64) -> Result<ForumChannelConfig> {
    self
      .get_forum_config(group_id)
      .await?
      .ok_or(Error::ConfigNotFound { group_id })
  }

  // ─── Thread records ──────────────────────────────────────────────────────

  pub async fn get_thread(&self, thread_id: u64) -> Result<Option<ThreadRecord>> {
    if let Some(record) = self.threads.read().get(&thread_id).cloned() {
      return Ok(Some(record));
    }
    let record = self.store.get_thread(thread_id).await.map_err(Error::persistence)?;
    if let Some(record) = &record {
      self.threads.write().insert(thread_id, record.clone());
    }
    Ok(record)
  }

  pub async fn list_threads(&self) -> Result<Vec<ThreadRecord>> {
    self.store.list_threads().await.map_err(Error::persistence)
  }

  /// The recorded thread for a problem in a group, read from the store.
  ///
  /// A group without a forum channel is an error
  /// ([`Error::ConfigNotFound`]), not an absent record.
  pub async fn find_thread_record(
    &self,
    frontend_id: u32,
    group_id: u64,
  ) -> Result<Option<ThreadRecord>> {
    let entry = self.problems.get_by_frontend_id(frontend_id).await?.into_entry();
    let config = self.require_forum_config(group_id).await?;
    self
      .store
      .find_thread(entry.problem.id, config.id)
      .await
      .map_err(Error::persistence)
  }

  /// Record an already-created external thread for a problem in a group.
  ///
  /// A different thread recorded for the pair is forgotten first.
  /// Registering the thread that is already recorded returns its record.
  pub async fn register_thread(
    &self,
    frontend_id: u32,
    group_id: u64,
    thread_id: u64,
  ) -> Result<ThreadRecord> {
    let config = self.require_forum_config(group_id).await?;
    let claim = ThreadClaim { frontend_id, group_id };
    self
      .with_creation_lock(claim, self.register_locked(frontend_id, &config, thread_id))
      .await
  }

  async fn register_locked(
    &self,
    frontend_id: u32,
    config: &ForumChannelConfig,
    thread_id: u64,
  ) -> Result<ThreadRecord> {
    let entry = self.problems.get_by_frontend_id(frontend_id).await?.into_entry();
    let problem_row_id = entry.problem.id;

    while let Some(existing) = self
      .store
      .find_thread(problem_row_id, config.id)
      .await
      .map_err(Error::persistence)?
    {
      if existing.thread_id == thread_id {
        self.threads.write().insert(thread_id, existing.clone());
        return Ok(existing);
      }
      warn!(
        frontend_id,
        group_id = config.group_id,
        replaced = existing.thread_id,
        thread_id,
        "replacing recorded thread"
      );
      self.delete_thread_record(existing.thread_id).await?;
    }

    self.insert_record(thread_id, problem_row_id, config.id).await
  }

  async fn insert_record(
    &self,
    thread_id: u64,
    problem_row_id: i64,
    forum_channel_row_id: i64,
  ) -> Result<ThreadRecord> {
    let record = self
      .store
      .insert_thread(NewThreadRecord { thread_id, problem_row_id, forum_channel_row_id })
      .await
      .map_err(Error::persistence)?;
    self.threads.write().insert(thread_id, record.clone());
    debug!(thread_id, problem_row_id, forum_channel_row_id, "thread registered");
    Ok(record)
  }

  /// Forget a thread. Returns whether a record existed in the store.
  pub async fn delete_thread_record(&self, thread_id: u64) -> Result<bool> {
    let deleted = self
      .store
      .delete_thread(thread_id)
      .await
      .map_err(Error::persistence)?;
    self.threads.write().remove(&thread_id);
    debug!(thread_id, deleted, "thread record deleted");
    Ok(deleted)
  }

  /// Delete a problem through the [`ProblemCache`] and drop the thread
  /// records the store removed with it.
  pub async fn remove_problem(&self, frontend_id: u32) -> Result<bool> {
    let stored = self
      .store
      .get_problem(frontend_id)
      .await
      .map_err(Error::persistence)?;
    let removed = self.problems.remove(frontend_id).await?;

    if let Some(entry) = stored {
      let row = entry.problem.id;
      let mut threads = self.threads.write();
      let before = threads.len();
      threads.retain(|_, t| t.problem_row_id != row);
      debug!(frontend_id, evicted = before - threads.len(), "thread records evicted");
    }
    Ok(removed)
  }

  // ─── Create or reuse ─────────────────────────────────────────────────────

  fn creation_lock(&self, claim: ThreadClaim) -> Arc<Mutex<()>> {
    Arc::clone(self.creating.lock().entry(claim).or_default())
  }

  fn release_creation_lock(&self, claim: ThreadClaim) {
    let mut creating = self.creating.lock();
    // Only the map itself still holds it: nobody is waiting.
    if creating.get(&claim).is_some_and(|m| Arc::strong_count(m) == 1) {
      creating.remove(&claim);
    }
  }

  async fn with_creation_lock<T>(
    &self,
    claim: ThreadClaim,
    work: impl Future<Output = Result<T>>,
  ) -> Result<T> {
    let lock = self.creation_lock(claim);
    let result = {
      let _held = lock.lock().await;
      work.await
    };
    drop(lock);
    self.release_creation_lock(claim);
    result
  }

  /// Return the live thread for a problem in a group, creating it if there
  /// is none. A recorded thread the platform no longer resolves is forgotten
  /// and replaced exactly once.
  pub async fn reopen_or_create_thread<P>(
    &self,
    frontend_id: u32,
    group_id: u64,
    kind: ThreadKind,
    platform: &P,
  ) -> Result<(P::Handle, ThreadOutcome)>
  where
    P: ThreadPlatform,
  {
    let config = self.require_forum_config(group_id).await?;

    let claim = ThreadClaim { frontend_id, group_id };
    self
      .with_creation_lock(
        claim,
        self.reopen_or_create_locked(frontend_id, &config, kind, platform),
      )
      .await
  }

  async fn reopen_or_create_locked<P>(
    &self,
    frontend_id: u32,
    config: &ForumChannelConfig,
    kind: ThreadKind,
    platform: &P,
  ) -> Result<(P::Handle, ThreadOutcome)>
  where
    P: ThreadPlatform,
  {
    let entry = self.problems.get_by_frontend_id(frontend_id).await?.into_entry();
    let problem_row_id = entry.problem.id;

    let existing = self
      .store
      .find_thread(problem_row_id, config.id)
      .await
      .map_err(Error::persistence)?;

    if let Some(record) = existing {
      let thread_id = record.thread_id;
      match platform.resolve_thread(thread_id).await.map_err(Error::platform)? {
        Some(handle) => {
          self.threads.write().insert(thread_id, record);
          debug!(frontend_id, group_id = config.group_id, thread_id, "thread reused");
          return Ok((handle, ThreadOutcome::Reused));
        }
        None => {
          warn!(
            frontend_id,
            group_id = config.group_id,
            thread_id,
            "recorded thread no longer exists, recreating"
          );
          self.delete_thread_record(thread_id).await?;
        }
      }
    }

    let draft = ThreadDraft::for_problem(config.channel_id, entry, kind);
    let handle = platform.create_thread(draft).await.map_err(Error::platform)?;
    let thread_id = handle.thread_id();
    self.insert_record(thread_id, problem_row_id, config.id).await?;
    info!(frontend_id, group_id = config.group_id, thread_id, "thread created");
    Ok((handle, ThreadOutcome::Created))
  }

  // ─── Migration ───────────────────────────────────────────────────────────

  /// Backfill records for threads that were created before the registry
  /// existed. Keyed by thread id: re-running with the same input rewrites
  /// the same rows. Claims naming a problem that cannot be found are skipped.
  ///
  /// Each (problem, group) keeps one thread: among claims for the same pair
  /// the highest thread id wins, and any other thread already recorded for
  /// the pair is forgotten.
  pub async fn bulk_register_threads(
    &self,
    claims: BTreeMap<u64, ThreadClaim>,
  ) -> Result<usize> {
    if claims.is_empty() {
      warn!("bulk thread registration called with no threads");
      return Err(Error::Validation("no threads to register".into()));
    }

    let mut by_claim: HashMap<ThreadClaim, u64> = HashMap::with_capacity(claims.len());
    for (thread_id, claim) in claims {
      if let Some(dropped) = by_claim.insert(claim, thread_id) {
        warn!(
          dropped,
          kept = thread_id,
          frontend_id = claim.frontend_id,
          group_id = claim.group_id,
          "several threads claim one problem, keeping the newest"
        );
      }
    }
    let claims: BTreeMap<u64, ThreadClaim> =
      by_claim.into_iter().map(|(claim, thread_id)| (thread_id, claim)).collect();

    let mut configs: HashMap<u64, ForumChannelConfig> = HashMap::new();
    let mut inputs = Vec::with_capacity(claims.len());
    for (thread_id, claim) in claims {
      let config = match configs.get(&claim.group_id) {
        Some(config) => config.clone(),
        None => {
          let config = self.require_forum_config(claim.group_id).await?;
          configs.insert(claim.group_id, config.clone());
          config
        }
      };

      let entry = match self.problems.get_by_frontend_id(claim.frontend_id).await {
        Ok(resolved) => resolved.into_entry(),
        Err(Error::NotFound(_)) => {
          warn!(
            thread_id,
            frontend_id = claim.frontend_id,
            "skipping thread for unknown problem"
          );
          continue;
        }
        Err(e) => return Err(e),
      };

      inputs.push(NewThreadRecord {
        thread_id,
        problem_row_id: entry.problem.id,
        forum_channel_row_id: config.id,
      });
    }

    let written = if inputs.is_empty() {
      0
    } else {
      self.store.upsert_threads(inputs).await.map_err(Error::persistence)?
    };

    let threads = self.store.list_threads().await.map_err(Error::persistence)?;
    *self.threads.write() = threads.into_iter().map(|t| (t.thread_id, t)).collect();
    info!(written, "threads registered in bulk");
    Ok(written)
  }
}
