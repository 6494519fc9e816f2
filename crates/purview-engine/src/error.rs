//! Error type for `purview-engine`.
//!
//! Hard failures only: a whole document is rejected before any record is
//! applied. Per-record problems never surface here; they land in the
//! amendment outcome's skip list instead.

use chrono::NaiveDate;
use purview_core::gazette::GazetteId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("gazette parse error: {0}")]
  Parse(#[from] purview_gazette::Error),

  /// The document names a parent gazette that was never recorded, so its
  /// lineage cannot be resolved.
  #[error("gazette {gazette} names unknown parent {parent}")]
  UnknownParent { gazette: GazetteId, parent: GazetteId },

  /// A version handed to `apply_amendment` without a parent link.
  #[error("gazette {0} is not an amendment")]
  NotAnAmendment(GazetteId),

  /// No versions are recorded under the lineage.
  #[error("lineage not found: {0}")]
  LineageNotFound(GazetteId),

  /// The named gazette was never recorded.
  #[error("gazette not recorded: {0}")]
  GazetteNotFound(GazetteId),

  /// The gazette is recorded, but under a different lineage than the one
  /// named in the call.
  #[error("gazette {gazette} does not belong to lineage {lineage}")]
  LineageMismatch { gazette: GazetteId, lineage: GazetteId },

  /// A new amendment dated before the lineage's latest applied amendment.
  #[error(
    "amendment {gazette} ({date}) precedes the latest applied amendment \
     {latest} ({latest_date})"
  )]
  OutOfOrder {
    gazette:     GazetteId,
    date:        NaiveDate,
    latest:      GazetteId,
    latest_date: NaiveDate,
  },

  /// A replay of an amendment that later amendments have already built on.
  /// Reapplying it would regress provenance stamps.
  #[error("gazette {gazette} is already applied and {latest} supersedes it")]
  ReplaySuperseded { gazette: GazetteId, latest: GazetteId },

  /// The store failed while recording the version itself (after one retry).
  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Error {
  /// Box a store adapter error at the engine boundary.
  pub(crate) fn store<E>(err: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Store(Box::new(err))
  }
}
