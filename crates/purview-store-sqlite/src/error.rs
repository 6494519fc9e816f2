//! Error type for `purview-store-sqlite`.

use purview_core::gazette::GazetteId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// A stored value that no longer decodes into its domain type.
  #[error("column decode error: {0}")]
  Decode(String),

  #[error("gazette {0} is already recorded with different identity fields")]
  VersionConflict(GazetteId),

  #[error("gazette {gazette} names unknown parent {parent}")]
  UnknownParent { gazette: GazetteId, parent: GazetteId },

  #[error("minister not found: {0}")]
  MinisterNotFound(uuid::Uuid),

  #[error("item not found: {0}")]
  ItemNotFound(uuid::Uuid),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
