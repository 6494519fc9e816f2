//! The `StructureStore` trait.
//!
//! The trait is implemented by storage backends (`purview-store-sqlite`,
//! `purview-store-memory`). The reconciliation engine depends on this
//! abstraction, not on any concrete backend, so lineages can be processed
//! against whichever store a caller injects.

use std::future::Future;

use crate::{
  gazette::{GazetteId, GazetteVersion, RecordedVersion, Stamp},
  item::{ActiveItem, Category, ItemRecord, ItemRef, ProvenanceKind},
  minister::{MinisterKey, MinisterRecord, MinisterRef},
};

/// Result of [`StructureStore::renumber_minister`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenumberOutcome {
  Renumbered,
  /// No minister holds the old key.
  OldKeyMissing,
  /// Another minister already holds the new key; nothing was changed.
  NewKeyTaken,
}

/// Abstraction over a Purview structure store backend.
///
/// Writes are per-operation atomic: each upsert or stamp either fully
/// succeeds or fully fails. Nothing here spans multiple statements in one
/// transaction; the engine's idempotency rules make retries safe instead.
///
/// All methods return `Send` futures so the trait can be used from
/// multi-threaded async runtimes.
pub trait StructureStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Gazette versions ──────────────────────────────────────────────────

  /// Record a gazette version, resolving its lineage through the parent
  /// chain and assigning the next sequence number in that lineage.
  ///
  /// Idempotent by gazette id: re-recording an already-known id returns the
  /// existing row (same seq) provided the identity fields match, and errors
  /// if they do not. Recording an amendment whose parent is unknown is an
  /// error.
  fn record_version(
    &self,
    version: GazetteVersion,
  ) -> impl Future<Output = Result<RecordedVersion, Self::Error>> + Send;

  /// Retrieve a recorded version by gazette id. `None` if not recorded.
  fn get_version(
    &self,
    id: &GazetteId,
  ) -> impl Future<Output = Result<Option<RecordedVersion>, Self::Error>>
  + Send;

  /// The highest-seq version recorded in a lineage.
  fn latest_version(
    &self,
    lineage: &GazetteId,
  ) -> impl Future<Output = Result<Option<RecordedVersion>, Self::Error>>
  + Send;

  /// All versions of a lineage in application (seq) order.
  fn list_versions(
    &self,
    lineage: &GazetteId,
  ) -> impl Future<Output = Result<Vec<RecordedVersion>, Self::Error>> + Send;

  // ── Ministers ─────────────────────────────────────────────────────────

  /// Find-or-create a minister by key within a lineage.
  ///
  /// On create, `name`, `purview`, and `stamp` are persisted. On find, the
  /// stored fields are kept (first writer wins) and the returned ref has
  /// `existed = true`.
  fn upsert_minister(
    &self,
    lineage: &GazetteId,
    key: &MinisterKey,
    name: &str,
    purview: Option<&str>,
    stamp: &Stamp,
  ) -> impl Future<Output = Result<MinisterRef, Self::Error>> + Send;

  /// Retrieve a minister by key. `None` if absent from the lineage.
  fn find_minister(
    &self,
    lineage: &GazetteId,
    key: &MinisterKey,
  ) -> impl Future<Output = Result<Option<MinisterRecord>, Self::Error>>
  + Send;

  /// All ministers of a lineage in key order.
  fn list_ministers(
    &self,
    lineage: &GazetteId,
  ) -> impl Future<Output = Result<Vec<MinisterRecord>, Self::Error>> + Send;

  /// Move a minister from `old` to `new` key, recording `stamp` as its
  /// renumbering provenance. Items and their provenance are untouched.
  fn renumber_minister(
    &self,
    lineage: &GazetteId,
    old: &MinisterKey,
    new: &MinisterKey,
    stamp: &Stamp,
  ) -> impl Future<Output = Result<RenumberOutcome, Self::Error>> + Send;

  // ── Items ─────────────────────────────────────────────────────────────

  /// Find-or-create an item under a minister, keyed by `number` when
  /// present, else by name (case- and whitespace-insensitive).
  ///
  /// The returned ref reports whether the item previously existed and its
  /// stored name. Creation writes no provenance; the caller stamps via
  /// [`StructureStore::set_provenance`].
  fn upsert_item(
    &self,
    minister: &MinisterRef,
    category: Category,
    number: Option<u32>,
    name: &str,
  ) -> impl Future<Output = Result<ItemRef, Self::Error>> + Send;

  /// Replace an item's stored name. Provenance is untouched; the caller
  /// stamps the content change separately.
  fn rename_item(
    &self,
    item: &ItemRef,
    name: &str,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send;

  /// Write one provenance stamp on an item and its minister relationship
  /// together.
  fn set_provenance(
    &self,
    item: &ItemRef,
    kind: ProvenanceKind,
    stamp: &Stamp,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send;

  // ── Reads ─────────────────────────────────────────────────────────────

  /// All items of a category under a minister, active and inactive, with
  /// full provenance. Ordered by item number (unnumbered last), then name.
  fn query_items(
    &self,
    minister: &MinisterRef,
    category: Category,
  ) -> impl Future<Output = Result<Vec<ItemRecord>, Self::Error>> + Send;

  /// The active items of a category under a minister, in name order.
  fn query_active_items(
    &self,
    minister: &MinisterRef,
    category: Category,
  ) -> impl Future<Output = Result<Vec<ActiveItem>, Self::Error>> + Send;
}
