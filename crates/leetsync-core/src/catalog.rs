//! The `RemoteCatalog` trait: the upstream system of record for problems.
//!
//! Implemented by `leetsync-catalog` over HTTP and by in-memory fakes in
//! tests. Transport details stay behind this boundary; callers only see
//! parsed [`ProblemRecord`]s or a [`RemoteError`].

use std::future::Future;

use thiserror::Error;

use crate::{ParseError, problem::ProblemRecord};

/// Why a remote call produced no records.
#[derive(Debug, Error)]
pub enum RemoteError {
  /// Transport failure or a non-success status.
  #[error("{0}")]
  Fetch(String),

  /// The remote answered, but a record in the payload is malformed.
  #[error("malformed remote record: {0}")]
  Parse(#[from] ParseError),
}

/// Abstraction over the remote problem catalog.
pub trait RemoteCatalog: Send + Sync {
  /// Fetch one problem by frontend id. `Ok(None)` means the remote reported
  /// that the problem does not exist.
  fn fetch_by_id(
    &self,
    frontend_id: u32,
  ) -> impl Future<Output = Result<Option<ProblemRecord>, RemoteError>> + Send + '_;

  /// Fetch today's daily selection. Time-varying; never cached by callers.
  fn fetch_daily(
    &self,
  ) -> impl Future<Output = Result<ProblemRecord, RemoteError>> + Send + '_;

  /// Fetch the complete catalog snapshot. A single malformed record fails the
  /// whole call.
  fn fetch_all(
    &self,
  ) -> impl Future<Output = Result<Vec<ProblemRecord>, RemoteError>> + Send + '_;

  /// Whether the remote currently answers requests.
  fn health_check(
    &self,
  ) -> impl Future<Output = Result<bool, RemoteError>> + Send + '_;
}
