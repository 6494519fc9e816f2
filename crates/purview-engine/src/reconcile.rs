//! The reconciliation engine: ordered application of gazette documents to a
//! store.
//!
//! Each lineage advances strictly forward. An amendment is admitted only when
//! it is dated no earlier than the lineage's latest applied gazette, and only
//! the latest gazette may be replayed; everything else is rejected before a
//! single record is touched.

use std::collections::BTreeMap;

use purview_core::{
  gazette::GazetteId,
  item::Category,
  minister::MinisterKey,
  store::StructureStore,
};
use purview_gazette::{BaseGazette, ParsedAmendment, RecordIssue};
use thiserror::Error;
use tracing::{info, warn};

use crate::{
  apply::{self, ItemApplied, RecordOutcome, retry_once},
  diff::{MinisterState, Snapshot},
  error::{Error, Result},
  report::DiffDocument,
};

// ─── Outcomes ────────────────────────────────────────────────────────────────

/// Why a change record was not applied.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SkipReason {
  #[error("malformed record: {0}")]
  MalformedRecord(String),

  #[error("column {0:?} does not map to a category")]
  UnresolvedColumn(String),

  #[error("minister {0} not found in lineage")]
  MinisterNotFound(MinisterKey),

  #[error("cannot renumber {old}: key {new} is already held")]
  RenumberConflict { old: MinisterKey, new: MinisterKey },

  /// The store failed on the record, including one retry per operation.
  #[error("store failure: {0}")]
  StoreFailure(String),
}

impl From<&RecordIssue> for SkipReason {
  fn from(issue: &RecordIssue) -> Self {
    match issue {
      RecordIssue::Malformed(msg) => Self::MalformedRecord(msg.clone()),
      RecordIssue::UnresolvedColumn(code) => {
        Self::UnresolvedColumn(code.clone())
      }
    }
  }
}

/// A change record that was not applied.
#[derive(Debug, Clone)]
pub struct SkippedRecord {
  /// Position within the envelope's `changes` array.
  pub index:     usize,
  /// The `operation_type` as it appeared on the wire.
  pub operation: String,
  pub reason:    SkipReason,
}

/// Application report for one amendment.
#[derive(Debug, Clone)]
pub struct AmendmentOutcome {
  pub gazette: GazetteId,
  pub seq:     u32,
  /// Elementary changes that wrote provenance.
  pub applied: usize,
  /// Elementary changes the store already satisfied.
  pub noops:   usize,
  pub skipped: Vec<SkippedRecord>,
}

/// Application report for one base gazette table.
#[derive(Debug, Clone)]
pub struct BaseOutcome {
  pub gazette:   GazetteId,
  pub seq:       u32,
  /// Ministers carried by the table with a heading number.
  pub ministers: usize,
  /// Item stamps written.
  pub applied:   usize,
  pub noops:     usize,
  /// Table entries without a heading number.
  pub skipped:   usize,
}

// ─── Engine ──────────────────────────────────────────────────────────────────

/// The reconciliation engine over one store adapter.
///
/// Holds no state of its own; cloning is as cheap as cloning the adapter.
/// Different lineages may be reconciled concurrently through clones, but
/// amendments of one lineage must be applied by one caller at a time.
#[derive(Clone)]
pub struct Engine<S> {
  store: S,
}

impl<S> Engine<S>
where
  S: StructureStore,
{
  pub fn new(store: S) -> Self { Self { store } }

  pub fn store(&self) -> &S { &self.store }

  // ── Base gazettes ─────────────────────────────────────────────────────

  /// Seed a lineage from a parsed base gazette table.
  ///
  /// Records the version at seq 0 and stamps every minister and item as
  /// added by the base. Re-loading the same base is a no-op.
  pub async fn load_base(&self, base: &BaseGazette) -> Result<BaseOutcome> {
    let recorded =
      retry_once(|| self.store.record_version(base.version.clone()))
        .await
        .map_err(Error::store)?;
    let stamp = recorded.stamp();
    let lineage = recorded.lineage.clone();

    for entry in &base.skipped {
      warn!(
        gazette = %stamp.gazette_id,
        index = entry.index,
        name = %entry.name,
        "minister entry without a heading number skipped",
      );
    }

    let mut outcome = BaseOutcome {
      gazette:   recorded.version.id.clone(),
      seq:       recorded.seq,
      ministers: 0,
      applied:   0,
      noops:     0,
      skipped:   base.skipped.len(),
    };

    for minister in &base.ministers {
      let minister_ref = retry_once(|| {
        self.store.upsert_minister(
          &lineage,
          &minister.heading.key,
          &minister.heading.name,
          minister.purview.as_deref(),
          &stamp,
        )
      })
      .await
      .map_err(Error::store)?;
      outcome.ministers += 1;

      for category in Category::ALL {
        for item in minister.items(category) {
          let applied = apply::write_item(
            &self.store,
            &minister_ref,
            category,
            item,
            &stamp,
          )
          .await
          .map_err(Error::store)?;
          match applied {
            ItemApplied::Applied => outcome.applied += 1,
            ItemApplied::Noop => outcome.noops += 1,
          }
        }
      }
    }

    info!(
      gazette = %outcome.gazette,
      ministers = outcome.ministers,
      applied = outcome.applied,
      noops = outcome.noops,
      "base gazette loaded",
    );
    Ok(outcome)
  }

  /// Parse and load a base gazette table from JSON.
  pub async fn load_base_json(&self, input: &str) -> Result<BaseOutcome> {
    self.load_base(&purview_gazette::parse_base(input)?).await
  }

  // ── Amendments ────────────────────────────────────────────────────────

  /// Apply one parsed amendment to its lineage.
  ///
  /// Rejected outright (no record applied): unknown parent, an amendment
  /// dated before the lineage's latest applied gazette, or a replay of any
  /// gazette but the most recent. Per-record problems are collected in the
  /// outcome's skip list and do not abort the rest of the amendment.
  pub async fn apply_amendment(
    &self,
    amendment: &ParsedAmendment,
  ) -> Result<AmendmentOutcome> {
    let version = &amendment.version;
    let Some(parent_id) = version.parent_id.clone() else {
      return Err(Error::NotAnAmendment(version.id.clone()));
    };

    let parent = retry_once(|| self.store.get_version(&parent_id))
      .await
      .map_err(Error::store)?
      .ok_or_else(|| Error::UnknownParent {
        gazette: version.id.clone(),
        parent:  parent_id.clone(),
      })?;
    let lineage = parent.lineage.clone();

    let latest = retry_once(|| self.store.latest_version(&lineage))
      .await
      .map_err(Error::store)?
      .ok_or_else(|| Error::LineageNotFound(lineage.clone()))?;

    let already_recorded = retry_once(|| self.store.get_version(&version.id))
      .await
      .map_err(Error::store)?
      .is_some();
    if already_recorded {
      if latest.version.id != version.id {
        return Err(Error::ReplaySuperseded {
          gazette: version.id.clone(),
          latest:  latest.version.id.clone(),
        });
      }
    } else if version.published_date < latest.version.published_date {
      return Err(Error::OutOfOrder {
        gazette:     version.id.clone(),
        date:        version.published_date,
        latest:      latest.version.id.clone(),
        latest_date: latest.version.published_date,
      });
    }

    let recorded = retry_once(|| self.store.record_version(version.clone()))
      .await
      .map_err(Error::store)?;
    let stamp = recorded.stamp();

    let mut outcome = AmendmentOutcome {
      gazette: recorded.version.id.clone(),
      seq:     recorded.seq,
      applied: 0,
      noops:   0,
      skipped: Vec::new(),
    };

    for rejected in &amendment.rejected {
      warn!(
        gazette = %stamp.gazette_id,
        index = rejected.index,
        operation = %rejected.operation,
        reason = %rejected.issue,
        "record rejected at parse; skipped",
      );
      outcome.skipped.push(SkippedRecord {
        index:     rejected.index,
        operation: rejected.operation.clone(),
        reason:    SkipReason::from(&rejected.issue),
      });
    }

    for change in &amendment.changes {
      let record = &change.record;
      match apply::apply_change(&self.store, &lineage, record, &stamp).await {
        Ok(RecordOutcome::Done(tally)) => {
          outcome.applied += tally.applied;
          outcome.noops += tally.noops;
        }
        Ok(RecordOutcome::MinisterMissing(key)) => {
          warn!(
            gazette = %stamp.gazette_id,
            index = change.index,
            minister = %key,
            "minister not found in lineage; record skipped",
          );
          outcome.skipped.push(SkippedRecord {
            index:     change.index,
            operation: record.operation().to_owned(),
            reason:    SkipReason::MinisterNotFound(key),
          });
        }
        Ok(RecordOutcome::RenumberConflict { old, new }) => {
          warn!(
            gazette = %stamp.gazette_id,
            index = change.index,
            from = %old,
            to = %new,
            "renumbering target key already held; record skipped",
          );
          outcome.skipped.push(SkippedRecord {
            index:     change.index,
            operation: record.operation().to_owned(),
            reason:    SkipReason::RenumberConflict { old, new },
          });
        }
        Err(store_err) => {
          warn!(
            gazette = %stamp.gazette_id,
            index = change.index,
            error = %store_err,
            "store failure; record not applied",
          );
          outcome.skipped.push(SkippedRecord {
            index:     change.index,
            operation: record.operation().to_owned(),
            reason:    SkipReason::StoreFailure(store_err.to_string()),
          });
        }
      }
    }

    info!(
      gazette = %outcome.gazette,
      seq = outcome.seq,
      applied = outcome.applied,
      noops = outcome.noops,
      skipped = outcome.skipped.len(),
      "amendment reconciled",
    );
    Ok(outcome)
  }

  /// Parse and apply an amendment envelope from JSON.
  pub async fn apply_amendment_json(
    &self,
    input: &str,
  ) -> Result<AmendmentOutcome> {
    self
      .apply_amendment(&purview_gazette::parse_amendment(input)?)
      .await
  }

  // ── Snapshots ─────────────────────────────────────────────────────────

  /// The lineage's current active structure.
  pub async fn snapshot(&self, lineage: &GazetteId) -> Result<Snapshot> {
    let latest = retry_once(|| self.store.latest_version(lineage))
      .await
      .map_err(Error::store)?
      .ok_or_else(|| Error::LineageNotFound(lineage.clone()))?;
    self
      .build_snapshot(lineage, latest.version.id.clone(), latest.seq)
      .await
  }

  /// The structure as it stood immediately after `gazette` was applied,
  /// reconstructed from provenance stamps without replaying.
  pub async fn snapshot_at(
    &self,
    lineage: &GazetteId,
    gazette: &GazetteId,
  ) -> Result<Snapshot> {
    let recorded = retry_once(|| self.store.get_version(gazette))
      .await
      .map_err(Error::store)?
      .ok_or_else(|| Error::GazetteNotFound(gazette.clone()))?;
    if recorded.lineage != *lineage {
      return Err(Error::LineageMismatch {
        gazette: gazette.clone(),
        lineage: lineage.clone(),
      });
    }
    self
      .build_snapshot(lineage, recorded.version.id.clone(), recorded.seq)
      .await
  }

  async fn build_snapshot(
    &self,
    lineage: &GazetteId,
    gazette: GazetteId,
    cutoff: u32,
  ) -> Result<Snapshot> {
    let ministers = retry_once(|| self.store.list_ministers(lineage))
      .await
      .map_err(Error::store)?;

    let mut map: BTreeMap<MinisterKey, MinisterState> = BTreeMap::new();
    for minister in ministers {
      if minister.added.seq > cutoff {
        // Introduced by a later gazette than the cutoff.
        continue;
      }
      let minister_ref = minister.to_ref();
      let mut state = MinisterState {
        name: minister.name.clone(),
        ..MinisterState::default()
      };
      for category in Category::ALL {
        let items =
          retry_once(|| self.store.query_items(&minister_ref, category))
            .await
            .map_err(Error::store)?;
        let names = state.category_mut(category);
        for item in items {
          if item.provenance.active_at(cutoff) {
            names.insert(item.name);
          }
        }
      }
      map.insert(minister.key, state);
    }

    Ok(Snapshot { gazette, ministers: map })
  }

  /// Diff two recorded gazettes of one lineage into a report document.
  pub async fn diff_report(
    &self,
    from: &GazetteId,
    to: &GazetteId,
  ) -> Result<DiffDocument> {
    let recorded = retry_once(|| self.store.get_version(from))
      .await
      .map_err(Error::store)?
      .ok_or_else(|| Error::GazetteNotFound(from.clone()))?;
    let lineage = recorded.lineage.clone();
    let base = self
      .build_snapshot(&lineage, recorded.version.id.clone(), recorded.seq)
      .await?;
    let amendment = self.snapshot_at(&lineage, to).await?;
    Ok(DiffDocument::new(&base, &amendment))
  }
}
