//! Process wiring for the `leetsync` binary.
//!
//! Loads [`SyncConfig`], opens the SQLite store and the HTTP catalog client,
//! and assembles a warmed [`Engine`].

use std::{
  path::{Path, PathBuf},
  sync::Arc,
  time::Duration,
};

use anyhow::Context as _;
use leetsync_catalog::{CatalogConfig, HttpCatalog};
use leetsync_store_sqlite::SqliteStore;
use leetsync_sync::{ProblemCache, ThreadRegistry};
use serde::Deserialize;
use tracing::info;

/// Prefix of environment variables that override the config file, e.g.
/// `LEETSYNC_STORE_PATH` or `LEETSYNC_CATALOG__TIMEOUT_SECS`.
pub const ENV_PREFIX: &str = "LEETSYNC";

// ─── Configuration ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
  pub store_path:             PathBuf,
  pub catalog:                CatalogConfig,
  pub refresh_interval_hours: u64,
}

impl Default for SyncConfig {
  fn default() -> Self {
    Self {
      store_path:             PathBuf::from("leetsync.db"),
      catalog:                CatalogConfig::default(),
      refresh_interval_hours: 168,
    }
  }
}

impl SyncConfig {
  /// Read `path` (optional) layered under `LEETSYNC_*` environment variables.
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    let settings = config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(
        config::Environment::with_prefix(ENV_PREFIX)
          .prefix_separator("_")
          .separator("__"),
      )
      .build()
      .context("failed to read config file")?;

    let cfg: Self = settings
      .try_deserialize()
      .context("failed to deserialise SyncConfig")?;
    anyhow::ensure!(
      cfg.refresh_interval_hours > 0,
      "refresh_interval_hours must be at least 1"
    );
    Ok(cfg)
  }

  pub fn refresh_interval(&self) -> Duration {
    Duration::from_secs(self.refresh_interval_hours.saturating_mul(60 * 60))
  }
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

// ─── Engine ──────────────────────────────────────────────────────────────────

pub type Problems = ProblemCache<SqliteStore, HttpCatalog>;
pub type Threads = ThreadRegistry<SqliteStore, HttpCatalog>;

/// The problem cache and thread registry over one store.
pub struct Engine {
  pub problems: Arc<Problems>,
  pub threads:  Threads,
}

impl Engine {
  /// Open the store, build the catalog client and warm both caches.
  pub async fn open(cfg: &SyncConfig) -> anyhow::Result<Self> {
    let store_path = expand_tilde(&cfg.store_path);
    let store = SqliteStore::open(&store_path)
      .await
      .with_context(|| format!("failed to open store at {store_path:?}"))?;
    let store = Arc::new(store);

    let catalog =
      HttpCatalog::new(cfg.catalog.clone()).context("failed to build HTTP client")?;

    let problems = Arc::new(ProblemCache::new(store.clone(), Arc::new(catalog)));
    let threads = ThreadRegistry::new(store, problems.clone());

    let cached = problems.warm().await.context("failed to load problems")?;
    let (forums, threads_known) =
      threads.warm().await.context("failed to load thread registry")?;
    info!(store = ?store_path, cached, forums, threads = threads_known, "engine ready");

    Ok(Self { problems, threads })
  }
}

#[cfg(test)]
mod tests {
  use config::FileFormat;

  use super::*;

  #[test]
  fn defaults_apply_to_an_empty_config() {
    let cfg: SyncConfig = config::Config::builder()
      .build()
      .unwrap()
      .try_deserialize()
      .unwrap();
    assert_eq!(cfg.store_path, PathBuf::from("leetsync.db"));
    assert_eq!(cfg.refresh_interval(), Duration::from_secs(168 * 3600));
    assert_eq!(cfg.catalog.timeout_secs, 30);
    assert_eq!(cfg.catalog.description_limit, 500);
    assert!(cfg.catalog.base_url.starts_with("https://"));
  }

  #[test]
  fn nested_catalog_settings_are_read() {
    let toml = r#"
      store_path = "/tmp/problems.db"
      refresh_interval_hours = 24

      [catalog]
      base_url = "http://localhost:8080"
      description_limit = 200
    "#;
    let cfg: SyncConfig = config::Config::builder()
      .add_source(config::File::from_str(toml, FileFormat::Toml))
      .build()
      .unwrap()
      .try_deserialize()
      .unwrap();
    assert_eq!(cfg.store_path, PathBuf::from("/tmp/problems.db"));
    assert_eq!(cfg.refresh_interval_hours, 24);
    assert_eq!(cfg.catalog.base_url, "http://localhost:8080");
    assert_eq!(cfg.catalog.description_limit, 200);
    assert_eq!(cfg.catalog.timeout_secs, 30);
  }

  #[test]
  fn huge_refresh_interval_saturates() {
    let cfg = SyncConfig { refresh_interval_hours: u64::MAX, ..SyncConfig::default() };
    assert_eq!(cfg.refresh_interval(), Duration::from_secs(u64::MAX));
  }

  #[test]
  fn tilde_expands_to_home() {
    let Ok(home) = std::env::var("HOME") else { return };
    assert_eq!(
      expand_tilde(Path::new("~/leetsync.db")),
      PathBuf::from(home).join("leetsync.db")
    );
    assert_eq!(expand_tilde(Path::new("/abs/x.db")), PathBuf::from("/abs/x.db"));
  }

  #[tokio::test]
  async fn engine_opens_over_an_in_memory_store() {
    let cfg = SyncConfig { store_path: PathBuf::from(":memory:"), ..SyncConfig::default() };
    let engine = Engine::open(&cfg).await.unwrap();
    assert!(engine.problems.is_empty());
    assert!(engine.threads.get_forum_config(1).await.unwrap().is_none());
  }
}
