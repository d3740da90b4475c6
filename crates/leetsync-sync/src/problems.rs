//! [`ProblemCache`]: three-tier problem resolution and bulk refresh.
//!
//! | Tier     | Source               | Populates        |
//! |----------|----------------------|------------------|
//! | `Cache`  | in-memory map        | nothing          |
//! | `Store`  | [`CatalogStore`]     | cache            |
//! | `Remote` | [`RemoteCatalog`]    | store, then cache|
//!
//! Every tier is keyed by the problem's frontend id. The in-memory map only
//! ever holds fully-resolved entries (problem plus tags); an entry is
//! inserted only after the tier below it answered successfully.

use std::{
  collections::{BTreeMap, BTreeSet, HashMap},
  sync::Arc,
};

use leetsync_core::{
  catalog::RemoteCatalog,
  problem::{Difficulty, ProblemEntry, ProblemRecord, TopicTag},
  store::CatalogStore,
};
use parking_lot::RwLock;
use rand_core::{OsRng, RngCore as _};
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::error::{Error, Result};

// ─── Lookup results ──────────────────────────────────────────────────────────

/// Which tier answered a lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
  Cache,
  Store,
  Remote,
}

/// A resolved problem and the tier it was served from.
#[derive(Debug, Clone)]
pub struct Resolved {
  pub entry: Arc<ProblemEntry>,
  pub tier:  Tier,
}

impl Resolved {
  fn from_cache(entry: Arc<ProblemEntry>) -> Self { Self { entry, tier: Tier::Cache } }

  fn from_store(entry: Arc<ProblemEntry>) -> Self { Self { entry, tier: Tier::Store } }

  fn from_remote(entry: Arc<ProblemEntry>) -> Self { Self { entry, tier: Tier::Remote } }

  pub fn into_entry(self) -> Arc<ProblemEntry> { self.entry }
}

/// Row counts written by one [`ProblemCache::refresh`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RefreshSummary {
  pub problems:     usize,
  pub new_tags:     usize,
  pub associations: usize,
}

// ─── Cache ───────────────────────────────────────────────────────────────────

/// The problem cache. Construct one per process and share it behind an
/// [`Arc`]; fresh instances give tests full isolation.
pub struct ProblemCache<S, R> {
  store:        Arc<S>,
  remote:       Arc<R>,
  entries:      RwLock<HashMap<u32, Arc<ProblemEntry>>>,
  refresh_lock: Mutex<()>,
}

impl<S, R> ProblemCache<S, R>
where
  S: CatalogStore,
  R: RemoteCatalog,
{
  pub fn new(store: Arc<S>, remote: Arc<R>) -> Self {
    Self {
      store,
      remote,
      entries: RwLock::new(HashMap::new()),
      refresh_lock: Mutex::new(()),
    }
  }

  pub fn store(&self) -> &Arc<S> { &self.store }

  pub fn remote(&self) -> &Arc<R> { &self.remote }

  /// Replace the cache with every problem currently in the store.
  pub async fn warm(&self) -> Result<usize> {
    let entries = self
      .store
      .list_problems()
      .await
      .map_err(Error::persistence)?;
    let count = entries.len();
    self.swap(entries);
    info!(count, "problem cache warmed");
    Ok(count)
  }

  // ── Lookups ───────────────────────────────────────────────────────────────

  fn cached(&self, frontend_id: u32) -> Option<Arc<ProblemEntry>> {
    self.entries.read().get(&frontend_id).cloned()
  }

  fn admit(&self, entry: ProblemEntry) -> Arc<ProblemEntry> {
    let entry = Arc::new(entry);
    self.entries.write().insert(entry.frontend_id(), Arc::clone(&entry));
    entry
  }

  /// Resolve a problem through cache, store, then remote.
  ///
  /// Fails with [`Error::NotFound`] only when the remote reports that the
  /// problem does not exist.
  pub async fn get_by_frontend_id(&self, frontend_id: u32) -> Result<Resolved> {
    if let Some(entry) = self.cached(frontend_id) {
      debug!(frontend_id, "problem served from cache");
      return Ok(Resolved::from_cache(entry));
    }

    if let Some(entry) = self
      .store
      .get_problem(frontend_id)
      .await
      .map_err(Error::persistence)?
    {
      debug!(frontend_id, "problem served from store");
      return Ok(Resolved::from_store(self.admit(entry)));
    }

    info!(frontend_id, "problem missing locally, fetching from remote");
    let record = self
      .remote
      .fetch_by_id(frontend_id)
      .await?
      .ok_or_else(|| Error::NotFound(format!("problem {frontend_id}")))?;
    if record.frontend_id != frontend_id {
      return Err(Error::Validation(format!(
        "remote answered problem {} for {frontend_id}",
        record.frontend_id
      )));
    }
    Ok(Resolved::from_remote(self.persist(record).await?))
  }

  /// Resolve today's daily problem. The remote is always asked; its answer
  /// is then reconciled against the cache and store like any other lookup.
  pub async fn get_daily(&self) -> Result<Resolved> {
    let record = self.remote.fetch_daily().await?;
    let frontend_id = record.frontend_id;
    info!(frontend_id, "daily problem selected");

    if let Some(entry) = self.cached(frontend_id) {
      return Ok(Resolved::from_cache(entry));
    }
    if let Some(entry) = self
      .store
      .get_problem(frontend_id)
      .await
      .map_err(Error::persistence)?
    {
      return Ok(Resolved::from_store(self.admit(entry)));
    }
    Ok(Resolved::from_remote(self.persist(record).await?))
  }

  /// Write a remote record through to the store. The cache is only touched
  /// once the store transaction has committed.
  async fn persist(&self, record: ProblemRecord) -> Result<Arc<ProblemEntry>> {
    let entry = self
      .store
      .insert_problem(record)
      .await
      .map_err(Error::persistence)?;
    let (row, frontend_id) = (entry.problem.id, entry.frontend_id());
    debug!(frontend_id, tags = entry.tags.len(), "problem persisted");

    // A renumbered problem no longer answers to its old frontend id.
    self
      .entries
      .write()
      .retain(|id, e| *id == frontend_id || e.problem.id != row);
    Ok(self.admit(entry))
  }

  // ── Bulk refresh ──────────────────────────────────────────────────────────

  /// Resynchronise the store and cache with the full remote catalog.
  ///
  /// Steps run in order and the first failure aborts the rest. The cache is
  /// swapped only after every step succeeded, so a failed refresh leaves it
  /// untouched. Overlapping calls queue behind each other.
  pub async fn refresh(&self) -> Result<RefreshSummary> {
    let _guard = self.refresh_lock.lock().await;

    let records = self.remote.fetch_all().await?;
    if records.is_empty() {
      return Err(Error::Validation("remote catalog snapshot is empty".into()));
    }

    // Later duplicates of a frontend id win.
    let records: BTreeMap<u32, ProblemRecord> =
      records.into_iter().map(|r| (r.frontend_id, r)).collect();
    let tag_names: BTreeSet<String> = records
      .values()
      .flat_map(|r| r.tags.iter().cloned())
      .collect();
    let links: Vec<(u32, String)> = records
      .values()
      .flat_map(|r| r.tags.iter().map(|t| (r.frontend_id, t.clone())))
      .collect();
    info!(
      problems = records.len(),
      tags = tag_names.len(),
      links = links.len(),
      "refresh: snapshot fetched"
    );

    let problems = self
      .store
      .upsert_problems(records.into_values().collect())
      .await
      .map_err(Error::persistence)?;
    info!(problems, "refresh: problems upserted");

    let new_tags = self
      .store
      .upsert_tags(tag_names.into_iter().collect())
      .await
      .map_err(Error::persistence)?;
    info!(new_tags, "refresh: tags upserted");

    let associations = self
      .store
      .replace_associations(links)
      .await
      .map_err(Error::persistence)?;
    info!(associations, "refresh: associations rebuilt");

    let entries = self
      .store
      .list_problems()
      .await
      .map_err(Error::persistence)?;
    self.swap(entries);
    info!(cached = self.len(), "refresh: cache swapped");

    Ok(RefreshSummary { problems, new_tags, associations })
  }

  fn swap(&self, entries: Vec<ProblemEntry>) {
    let map: HashMap<u32, Arc<ProblemEntry>> = entries
      .into_iter()
      .map(|e| (e.frontend_id(), Arc::new(e)))
      .collect();
    *self.entries.write() = map;
  }

  // ── Selection and administration ──────────────────────────────────────────

  /// A uniformly random cached problem, optionally restricted to one
  /// difficulty. Premium problems are excluded unless `include_premium`.
  pub async fn random(
    &self,
    difficulty: Option<Difficulty>,
    include_premium: bool,
  ) -> Result<Arc<ProblemEntry>> {
    if self.is_empty() {
      self.warm().await?;
    }

    let candidates: Vec<Arc<ProblemEntry>> = self
      .entries
      .read()
      .values()
      .filter(|e| difficulty.is_none_or(|d| e.problem.difficulty == d))
      .filter(|e| include_premium || !e.problem.premium)
      .cloned()
      .collect();

    if candidates.is_empty() {
      return Err(Error::NotFound(match difficulty {
        Some(d) => format!("no {d} problem available"),
        None => "no problem available".into(),
      }));
    }
    let pick = (OsRng.next_u64() % candidates.len() as u64) as usize;
    Ok(Arc::clone(&candidates[pick]))
  }

  /// Delete a problem from the store and evict it. Its tag links and thread
  /// records are removed from the store with it; a [`ThreadRegistry`] over
  /// the same store should go through
  /// [`ThreadRegistry::remove_problem`] so its thread map follows.
  ///
  /// [`ThreadRegistry`]: crate::ThreadRegistry
  /// [`ThreadRegistry::remove_problem`]: crate::ThreadRegistry::remove_problem
  pub async fn remove(&self, frontend_id: u32) -> Result<bool> {
    let removed = self
      .store
      .remove_problem(frontend_id)
      .await
      .map_err(Error::persistence)?;
    self.entries.write().remove(&frontend_id);
    info!(frontend_id, removed, "problem removed");
    Ok(removed)
  }

  pub async fn tags(&self) -> Result<Vec<TopicTag>> {
    self.store.list_tags().await.map_err(Error::persistence)
  }

  pub fn len(&self) -> usize { self.entries.read().len() }

  pub fn is_empty(&self) -> bool { self.entries.read().is_empty() }

  /// Every cached entry, ordered by frontend id.
  pub fn snapshot(&self) -> Vec<Arc<ProblemEntry>> {
    let mut entries: Vec<_> = self.entries.read().values().cloned().collect();
    entries.sort_by_key(|e| e.frontend_id());
    entries
  }
}
