//! Error types for the purview-gazette codec.

use thiserror::Error;

/// A failure that rejects the whole document.
#[derive(Debug, Error)]
pub enum Error {
  #[error("missing required field: {0}")]
  MissingField(&'static str),

  #[error("invalid date in {field}: {value}")]
  InvalidDate { field: &'static str, value: String },

  #[error("JSON error: {0}")]
  Json(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Why a single change record was rejected during classification. The rest
/// of the envelope is unaffected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordIssue {
  #[error("malformed record: {0}")]
  Malformed(String),

  #[error("column {0:?} does not map to a category")]
  UnresolvedColumn(String),
}
