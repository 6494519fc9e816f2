//! Items — the departments, laws, and functions a minister owns — and their
//! provenance lifecycle.
//!
//! Provenance is append-in-place: each item carries at most one `added`, one
//! `updated`, and one `removed` stamp, each overwritten only by the provenance
//! kind it belongs to. Activity is computed from the stamps at query time by
//! sequence comparison, so removal history survives re-activation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::gazette::Stamp;

// ─── Category ────────────────────────────────────────────────────────────────

/// The gazette table column an item belongs to.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize,
  Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Category {
  /// Column I — subjects and functions.
  Function,
  /// Column II — departments, statutory institutions, public corporations.
  Department,
  /// Column III — laws and acts to be implemented.
  Law,
}

impl Category {
  pub const ALL: [Category; 3] =
    [Category::Function, Category::Department, Category::Law];

  /// The typed relationship name linking a minister to items of this
  /// category.
  pub fn relationship(&self) -> &'static str {
    match self {
      Self::Function => "PERFORMS_FUNCTION",
      Self::Department => "OVERSEES_DEPARTMENT",
      Self::Law => "RESPONSIBLE_FOR_LAW",
    }
  }

  /// The discriminant string stored in the `category` column.
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Function => "function",
      Self::Department => "department",
      Self::Law => "law",
    }
  }
}

impl std::fmt::Display for Category {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

// ─── Provenance ──────────────────────────────────────────────────────────────

/// Which provenance triple a change application writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProvenanceKind {
  Added,
  Updated,
  Removed,
}

impl ProvenanceKind {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Added => "added",
      Self::Updated => "updated",
      Self::Removed => "removed",
    }
  }
}

/// The three provenance stamps of an item or relationship.
///
/// `added` records the gazette that created the item (or most recently
/// re-activated it), `updated` the most recent content change, `removed` the
/// most recent deactivation. A removal stamp is never cleared; re-activation
/// overwrites `added` and leaves `removed` in place as history.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provenance {
  pub added:   Option<Stamp>,
  pub updated: Option<Stamp>,
  pub removed: Option<Stamp>,
}

impl Provenance {
  /// Overwrite the triple named by `kind`.
  pub fn apply(&mut self, kind: ProvenanceKind, stamp: Stamp) {
    match kind {
      ProvenanceKind::Added => self.added = Some(stamp),
      ProvenanceKind::Updated => self.updated = Some(stamp),
      ProvenanceKind::Removed => self.removed = Some(stamp),
    }
  }

  /// The highest content (added/updated) sequence at or below `cutoff`.
  fn content_seq_at(&self, cutoff: u32) -> Option<u32> {
    [&self.added, &self.updated]
      .into_iter()
      .filter_map(|s| s.as_ref().map(|s| s.seq).filter(|seq| *seq <= cutoff))
      .max()
  }

  /// Whether the item existed and was active immediately after the gazette
  /// with sequence `cutoff` was applied.
  ///
  /// An item is present once a content stamp at or below the cutoff exists,
  /// and inactive only while a removal stamp is strictly newer than every
  /// content stamp. At equal sequence (one amendment removing and rewriting
  /// the same item) content wins and the item stays active.
  pub fn active_at(&self, cutoff: u32) -> bool {
    let Some(content) = self.content_seq_at(cutoff) else {
      return false;
    };
    match &self.removed {
      Some(removed) if removed.seq <= cutoff => removed.seq <= content,
      _ => true,
    }
  }

  /// Whether the item is active in the current structure.
  pub fn is_active(&self) -> bool { self.active_at(u32::MAX) }

  /// The sequence of the most recent stamp of any kind. Used to break ties
  /// between ambiguous name matches.
  pub fn last_stamped(&self) -> Option<u32> {
    [&self.added, &self.updated, &self.removed]
      .into_iter()
      .filter_map(|s| s.as_ref().map(|s| s.seq))
      .max()
  }
}

// ─── Records ─────────────────────────────────────────────────────────────────

/// An item and its minister relationship as persisted. Item and relationship
/// provenance advance in lockstep (items are scoped per minister), so one
/// record carries both ids and a single provenance view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemRecord {
  pub item_id:     Uuid,
  /// The minister→item relationship this record was read through.
  pub rel_id:      Uuid,
  pub category:    Category,
  pub number:      Option<u32>,
  pub name:        String,
  pub provenance:  Provenance,
  /// Server-assigned audit timestamp; excluded from structure equivalence.
  pub recorded_at: DateTime<Utc>,
}

impl ItemRecord {
  pub fn is_active(&self) -> bool { self.provenance.is_active() }

  pub fn to_ref(&self) -> ItemRef {
    ItemRef {
      item_id:      self.item_id,
      rel_id:       self.rel_id,
      existed:      true,
      current_name: self.name.clone(),
    }
  }
}

/// Handle returned by [`crate::store::StructureStore::upsert_item`];
/// addresses an item (and its relationship) in later store calls.
#[derive(Debug, Clone)]
pub struct ItemRef {
  pub item_id:      Uuid,
  pub rel_id:       Uuid,
  /// Whether the item existed before the upsert that produced this ref.
  pub existed:      bool,
  /// The stored name at the time the ref was produced.
  pub current_name: String,
}

/// A row of [`crate::store::StructureStore::query_active_items`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveItem {
  pub number: Option<u32>,
  pub name:   String,
}

#[cfg(test)]
mod tests {
  use chrono::NaiveDate;

  use super::*;
  use crate::gazette::GazetteId;

  fn stamp(gazette: &str, seq: u32) -> Stamp {
    Stamp {
      gazette_id: GazetteId::new(gazette),
      date:       NaiveDate::from_ymd_opt(2022, 9, 2).unwrap(),
      seq,
    }
  }

  #[test]
  fn added_item_is_active() {
    let mut p = Provenance::default();
    p.apply(ProvenanceKind::Added, stamp("base", 0));
    assert!(p.is_active());
    assert!(p.active_at(0));
  }

  #[test]
  fn removal_deactivates() {
    let mut p = Provenance::default();
    p.apply(ProvenanceKind::Added, stamp("base", 0));
    p.apply(ProvenanceKind::Removed, stamp("a1", 1));
    assert!(!p.is_active());
    // Still visible as active at the pre-removal cutoff.
    assert!(p.active_at(0));
    assert!(!p.active_at(1));
  }

  #[test]
  fn reactivation_leaves_removal_in_history() {
    let mut p = Provenance::default();
    p.apply(ProvenanceKind::Added, stamp("base", 0));
    p.apply(ProvenanceKind::Removed, stamp("a1", 1));
    p.apply(ProvenanceKind::Added, stamp("a2", 2));
    assert!(p.is_active());
    assert_eq!(p.removed.as_ref().unwrap().seq, 1);
    assert!(!p.active_at(1));
    assert!(p.active_at(2));
  }

  #[test]
  fn same_gazette_remove_and_rewrite_stays_active() {
    // An UPDATE composes a removal and a rewrite under one gazette.
    let mut p = Provenance::default();
    p.apply(ProvenanceKind::Added, stamp("base", 0));
    p.apply(ProvenanceKind::Removed, stamp("a1", 1));
    p.apply(ProvenanceKind::Updated, stamp("a1", 1));
    assert!(p.is_active());
  }

  #[test]
  fn unstamped_provenance_is_not_active() {
    assert!(!Provenance::default().is_active());
  }
}
