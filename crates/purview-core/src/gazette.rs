//! Gazette identities, recorded versions, and provenance stamps.
//!
//! A gazette is an immutable document identity. Structures are grouped into
//! lineages: one base gazette plus every amendment transitively derived from
//! it. The store assigns each recorded gazette a sequence number within its
//! lineage; provenance comparisons are made on that sequence, not on
//! published dates, because distinct gazettes may share a date.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

// ─── Identity ────────────────────────────────────────────────────────────────

/// A gazette's official identifier, e.g. `"2289/43"`.
#[derive(
  Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct GazetteId(String);

impl GazetteId {
  pub fn new(id: impl Into<String>) -> Self { Self(id.into()) }

  pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for GazetteId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

impl From<&str> for GazetteId {
  fn from(s: &str) -> Self { Self(s.to_owned()) }
}

/// Whether a gazette establishes a structure or modifies one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GazetteKind {
  Base,
  Amendment,
}

// ─── Document metadata ───────────────────────────────────────────────────────

/// Descriptive fields carried on gazette documents. Opaque to the engine;
/// stored and returned verbatim.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMeta {
  pub published_by: Option<String>,
  pub gazette_type: Option<String>,
  pub language:     Option<String>,
  pub pdf_url:      Option<String>,
  pub president:    Option<String>,
}

// ─── Versions ────────────────────────────────────────────────────────────────

/// An immutable document identity. Created when a gazette is ingested; never
/// mutated, never deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GazetteVersion {
  pub id:             GazetteId,
  pub published_date: NaiveDate,
  pub kind:           GazetteKind,
  /// The gazette this amendment modifies. `None` for a base gazette.
  pub parent_id:      Option<GazetteId>,
  pub meta:           DocumentMeta,
}

impl GazetteVersion {
  pub fn base(id: impl Into<GazetteId>, published_date: NaiveDate) -> Self {
    Self {
      id: id.into(),
      published_date,
      kind: GazetteKind::Base,
      parent_id: None,
      meta: DocumentMeta::default(),
    }
  }

  pub fn amendment(
    id: impl Into<GazetteId>,
    published_date: NaiveDate,
    parent_id: impl Into<GazetteId>,
  ) -> Self {
    Self {
      id: id.into(),
      published_date,
      kind: GazetteKind::Amendment,
      parent_id: Some(parent_id.into()),
      meta: DocumentMeta::default(),
    }
  }
}

/// A gazette version as persisted: the version plus its resolved lineage and
/// store-assigned application sequence (base = 0, first amendment = 1, ...).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordedVersion {
  pub version:     GazetteVersion,
  /// The base gazette's id, resolved through the parent chain.
  pub lineage:     GazetteId,
  pub seq:         u32,
  /// Server-assigned audit timestamp; excluded from structure equivalence.
  pub recorded_at: DateTime<Utc>,
}

impl RecordedVersion {
  /// The provenance stamp this gazette leaves on entities it touches.
  pub fn stamp(&self) -> Stamp {
    Stamp {
      gazette_id: self.version.id.clone(),
      date:       self.version.published_date,
      seq:        self.seq,
    }
  }
}

// ─── Stamps ──────────────────────────────────────────────────────────────────

/// The `(gazette, date, seq)` triple written into provenance fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stamp {
  pub gazette_id: GazetteId,
  pub date:       NaiveDate,
  pub seq:        u32,
}
