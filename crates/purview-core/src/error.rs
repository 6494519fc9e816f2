//! Error types for `purview-core`.

use thiserror::Error;
use uuid::Uuid;

use crate::gazette::GazetteId;

#[derive(Debug, Error)]
pub enum Error {
  #[error("minister not found: {0}")]
  MinisterNotFound(Uuid),

  #[error("item not found: {0}")]
  ItemNotFound(Uuid),

  #[error("gazette {gazette} names unknown parent {parent}")]
  UnknownParent { gazette: GazetteId, parent: GazetteId },

  #[error("gazette {0} is already recorded with different identity fields")]
  VersionConflict(GazetteId),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
