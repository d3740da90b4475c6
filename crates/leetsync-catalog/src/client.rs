//! Async HTTP client for the remote problem catalog.

use std::time::Duration;

use leetsync_core::{
  catalog::{RemoteCatalog, RemoteError},
  problem::{DEFAULT_DESCRIPTION_LIMIT, ProblemRecord},
};
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use tracing::{debug, info};

use crate::{
  error::{Error, Result},
  parse::{self, DescriptionFormat},
};

pub const DEFAULT_BASE_URL: &str = "https://leetcode-api-pied.vercel.app";

pub const DEFAULT_SNAPSHOT_URL: &str = "https://raw.githubusercontent.com/noworneverev/leetcode-api/refs/heads/main/data/leetcode_questions.json";

/// Connection settings for the remote catalog.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
  /// Per-problem and daily endpoints live under this URL.
  pub base_url:          String,
  /// Full catalog dump used by bulk refresh.
  pub snapshot_url:      String,
  pub timeout_secs:      u64,
  /// Cap on stored description length, in characters.
  pub description_limit: usize,
}

impl Default for CatalogConfig {
  fn default() -> Self {
    Self {
      base_url:          DEFAULT_BASE_URL.to_owned(),
      snapshot_url:      DEFAULT_SNAPSHOT_URL.to_owned(),
      timeout_secs:      30,
      description_limit: DEFAULT_DESCRIPTION_LIMIT,
    }
  }
}

/// [`RemoteCatalog`] backed by HTTP.
///
/// Cheap to clone; the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone, Debug)]
pub struct HttpCatalog {
  client: Client,
  config: CatalogConfig,
  format: DescriptionFormat,
}

impl HttpCatalog {
  pub fn new(config: CatalogConfig) -> Result<Self> {
    let client = Client::builder()
      .timeout(Duration::from_secs(config.timeout_secs))
      .build()?;
    let format = DescriptionFormat::new(config.description_limit);
    Ok(Self { client, config, format })
  }

  /// Install the HTML-to-text conversion applied to every description.
  pub fn with_sanitizer(
    mut self,
    sanitizer: impl Fn(&str) -> String + Send + Sync + 'static,
  ) -> Self {
    self.format = self.format.with_sanitizer(sanitizer);
    self
  }

  pub fn config(&self) -> &CatalogConfig { &self.config }

  fn url(&self, path: &str) -> String {
    format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
  }

  async fn get(&self, url: &str) -> Result<Response> {
    debug!(url, "GET");
    Ok(self.client.get(url).send().await?)
  }

  fn ensure_success(url: &str, resp: Response) -> Result<Response> {
    let status = resp.status();
    if status.is_success() {
      Ok(resp)
    } else {
      Err(Error::Status { url: url.to_owned(), status })
    }
  }
}

impl RemoteCatalog for HttpCatalog {
  async fn fetch_by_id(
    &self,
    frontend_id: u32,
  ) -> Result<Option<ProblemRecord>, RemoteError> {
    let url = self.url(&format!("/problem/{frontend_id}"));
    let resp = self.get(&url).await?;
    if resp.status() == StatusCode::NOT_FOUND {
      info!(frontend_id, "problem not found on remote");
      return Ok(None);
    }

    let body = Self::ensure_success(&url, resp)?
      .bytes()
      .await
      .map_err(Error::from)?;
    let record = parse::parse_problem(&body, &self.format)?;
    info!(frontend_id, title = %record.title, "fetched problem");
    Ok(Some(record))
  }

  async fn fetch_daily(&self) -> Result<ProblemRecord, RemoteError> {
    let url = self.url("/daily");
    let resp = Self::ensure_success(&url, self.get(&url).await?)?;
    let body = resp.bytes().await.map_err(Error::from)?;
    let record = parse::parse_daily(&body, &self.format)?;
    info!(frontend_id = record.frontend_id, "fetched daily problem");
    Ok(record)
  }

  async fn fetch_all(&self) -> Result<Vec<ProblemRecord>, RemoteError> {
    let url = &self.config.snapshot_url;
    let resp = Self::ensure_success(url, self.get(url).await?)?;
    let body = resp.bytes().await.map_err(Error::from)?;
    let records = parse::parse_snapshot(&body, &self.format)?;
    info!(count = records.len(), "fetched catalog snapshot");
    Ok(records)
  }

  async fn health_check(&self) -> Result<bool, RemoteError> {
    let resp = self.get(&self.config.base_url).await?;
    let status = resp.status();
    info!(%status, "catalog health check");
    Ok(status == StatusCode::OK)
  }
}
