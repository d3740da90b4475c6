//! Error types for `leetsync-core`.

use thiserror::Error;

/// A remote payload that cannot be turned into a [`ProblemRecord`].
///
/// [`ProblemRecord`]: crate::problem::ProblemRecord
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
  #[error("unknown difficulty: {0:?}")]
  UnknownDifficulty(String),

  #[error("unknown stored difficulty: {0}")]
  UnknownDifficultyRepr(i64),

  #[error("missing required field `{0}`")]
  MissingField(&'static str),

  #[error("invalid value for `{field}`: {value}")]
  InvalidField { field: &'static str, value: String },

  #[error("malformed payload: {0}")]
  Malformed(String),
}

impl From<serde_json::Error> for ParseError {
  fn from(e: serde_json::Error) -> Self { Self::Malformed(e.to_string()) }
}

pub type Result<T, E = ParseError> = std::result::Result<T, E>;
