//! Error type for `leetsync-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  /// A stored column holds a value the domain types cannot represent.
  #[error("decode error: {0}")]
  Decode(#[from] leetsync_core::ParseError),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// An association names a problem or tag that is not in the store.
  #[error("association references unknown problem {frontend_id} or tag {tag:?}")]
  DanglingLink { frontend_id: u32, tag: String },

  /// A row written inside a transaction could not be read back.
  #[error("problem {0} vanished during write")]
  ProblemVanished(u32),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
