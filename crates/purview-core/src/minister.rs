//! Ministers — the top-level organizational units of a structure.
//!
//! A minister is identified within its lineage by a canonical heading number
//! (the key). Display names drift across gazettes while the number persists,
//! so names are never used as identity.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  gazette::{GazetteId, Stamp},
  resolve,
};

// ─── Key ─────────────────────────────────────────────────────────────────────

/// A minister's canonical heading number, e.g. `"04"` or `"5.1"`.
///
/// Construction normalizes the raw spelling: parentheses and whitespace are
/// stripped and single digits are zero-padded to width 2, so `"4"`, `"(04)"`,
/// and `"04"` all produce the same key. Non-numeric input passes through
/// trimmed but otherwise unchanged.
#[derive(
  Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct MinisterKey(String);

impl MinisterKey {
  pub fn new(raw: &str) -> Self { Self(resolve::normalize_minister_key(raw)) }

  pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for MinisterKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

// ─── Records ─────────────────────────────────────────────────────────────────

/// A minister as persisted, with the provenance of its introduction and of
/// its most recent renumbering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MinisterRecord {
  pub minister_id: Uuid,
  pub lineage:     GazetteId,
  pub key:         MinisterKey,
  pub name:        String,
  /// Free text describing the minister's remit, when the gazette carried one.
  pub purview:     Option<String>,
  pub added:       Stamp,
  pub renumbered:  Option<Stamp>,
  /// Server-assigned audit timestamp; excluded from structure equivalence.
  pub recorded_at: DateTime<Utc>,
}

impl MinisterRecord {
  pub fn to_ref(&self) -> MinisterRef {
    MinisterRef {
      minister_id: self.minister_id,
      key:         self.key.clone(),
      existed:     true,
    }
  }
}

/// Handle returned by upserts and lookups; addresses a minister in later
/// store calls.
#[derive(Debug, Clone)]
pub struct MinisterRef {
  pub minister_id: Uuid,
  pub key:         MinisterKey,
  /// Whether the minister existed before the upsert that produced this ref.
  pub existed:     bool,
}
