//! The diff document: the JSON change report between two gazettes.

use purview_core::gazette::GazetteId;
use serde::Serialize;

use crate::diff::{self, Snapshot, StructureDiff};

/// Change report between two gazettes of one lineage, ready for JSON
/// serialization.
#[derive(Debug, Clone, Serialize)]
pub struct DiffDocument {
  pub base_gazette:      GazetteId,
  pub amendment_gazette: GazetteId,
  pub changes:           StructureDiff,
}

impl DiffDocument {
  /// Diff `base` against `amendment` and wrap the result with both gazette
  /// ids.
  pub fn new(base: &Snapshot, amendment: &Snapshot) -> Self {
    Self {
      base_gazette:      base.gazette.clone(),
      amendment_gazette: amendment.gazette.clone(),
      changes:           diff::diff(base, amendment),
    }
  }

  pub fn to_json(&self) -> serde_json::Result<String> {
    serde_json::to_string_pretty(self)
  }
}
