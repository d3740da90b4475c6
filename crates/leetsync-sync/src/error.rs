//! Engine error type.
//!
//! Every variant is distinguishable so the command layer can render its own
//! user-facing text. Store and chat-platform errors are boxed because their
//! concrete types are chosen by the caller's backends.

use leetsync_core::{ParseError, catalog::RemoteError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// Expected absence; not a fault.
  #[error("not found: {0}")]
  NotFound(String),

  #[error("remote catalog unavailable: {0}")]
  RemoteFetch(String),

  #[error("malformed remote record: {0}")]
  RecordParse(#[from] ParseError),

  #[error("store error: {0}")]
  Persistence(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("no forum channel configured for group {group_id}")]
  ConfigNotFound { group_id: u64 },

  #[error("invalid input: {0}")]
  Validation(String),

  #[error("chat platform error: {0}")]
  Platform(#[source] Box<dyn std::error::Error + Send + Sync>),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Error {
  pub(crate) fn persistence(e: impl std::error::Error + Send + Sync + 'static) -> Self {
    Self::Persistence(Box::new(e))
  }

  pub(crate) fn platform(e: impl std::error::Error + Send + Sync + 'static) -> Self {
    Self::Platform(Box::new(e))
  }
}

impl From<RemoteError> for Error {
  fn from(e: RemoteError) -> Self {
    match e {
      RemoteError::Fetch(m) => Self::RemoteFetch(m),
      RemoteError::Parse(p) => Self::RecordParse(p),
    }
  }
}
