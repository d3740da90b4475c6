//! Error types for the leetsync-catalog HTTP client.

use leetsync_core::{ParseError, catalog::RemoteError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("HTTP request failed: {0}")]
  Http(#[from] reqwest::Error),

  #[error("GET {url} returned {status}")]
  Status {
    url:    String,
    status: reqwest::StatusCode,
  },

  #[error(transparent)]
  Parse(#[from] ParseError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl From<Error> for RemoteError {
  fn from(e: Error) -> Self {
    match e {
      Error::Parse(p) => Self::Parse(p),
      other => Self::Fetch(other.to_string()),
    }
  }
}
