//! The change applier: one validated change record → store writes.
//!
//! Each elementary item operation writes exactly one provenance triple.
//! Re-running an already-applied operation is detected before any write, so
//! replaying a whole amendment leaves the store untouched and reports zero
//! applied changes.

use std::future::Future;

use purview_core::{
  change::{ChangeRecord, ItemDescriptor},
  gazette::{GazetteId, Stamp},
  item::{Category, ProvenanceKind},
  minister::{MinisterKey, MinisterRef},
  store::{RenumberOutcome, StructureStore},
};
use tracing::{debug, warn};

use crate::matcher;

// ─── Retry ───────────────────────────────────────────────────────────────────

/// Run one store call, retrying once on failure.
pub(crate) async fn retry_once<T, E, Fut>(
  mut call: impl FnMut() -> Fut,
) -> Result<T, E>
where
  Fut: Future<Output = Result<T, E>>,
  E: std::fmt::Display,
{
  match call().await {
    Ok(value) => Ok(value),
    Err(first) => {
      warn!(error = %first, "store call failed, retrying once");
      call().await
    }
  }
}

// ─── Outcomes ────────────────────────────────────────────────────────────────

/// What applying one elementary item operation did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ItemApplied {
  /// A provenance triple was written.
  Applied,
  /// The store already satisfied the operation; nothing was written.
  Noop,
}

/// Applied/no-op tally for one change record.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct RecordTally {
  pub applied: usize,
  pub noops:   usize,
}

impl RecordTally {
  fn add(&mut self, applied: ItemApplied) {
    match applied {
      ItemApplied::Applied => self.applied += 1,
      ItemApplied::Noop => self.noops += 1,
    }
  }
}

/// Result of applying one change record.
#[derive(Debug)]
pub(crate) enum RecordOutcome {
  Done(RecordTally),
  /// The record references a minister absent from the lineage.
  MinisterMissing(MinisterKey),
  /// The renumbering target key is already held by another minister.
  RenumberConflict { old: MinisterKey, new: MinisterKey },
}

// ─── Item operations ─────────────────────────────────────────────────────────

/// Write one content item: create it, rename it, or re-activate it.
///
/// Matched and unchanged (stored name equals the incoming name after
/// whitespace trim) is the idempotency guard: no provenance is written. A
/// matched item that this same gazette removed earlier in the amendment is a
/// rewrite and stamps `updated`; a match on an item removed by an earlier
/// gazette is a re-activation and stamps `added`, leaving the removal stamp
/// in place as history.
pub(crate) async fn write_item<S>(
  store: &S,
  minister: &MinisterRef,
  category: Category,
  item: &ItemDescriptor,
  stamp: &Stamp,
) -> Result<ItemApplied, S::Error>
where
  S: StructureStore,
{
  let items = retry_once(|| store.query_items(minister, category)).await?;
  let Some(hit) = matcher::find(&items, item.number, &item.name) else {
    if !item.has_name() {
      warn!(
        gazette = %stamp.gazette_id,
        minister = %minister.key,
        %category,
        number = item.number,
        "content entry carries a number but no text and matches nothing; \
         skipped",
      );
      return Ok(ItemApplied::Noop);
    }
    let item_ref = retry_once(|| {
      store.upsert_item(minister, category, item.number, &item.name)
    })
    .await?;
    retry_once(|| {
      store.set_provenance(&item_ref, ProvenanceKind::Added, stamp)
    })
    .await?;
    debug!(
      gazette = %stamp.gazette_id,
      minister = %minister.key,
      %category,
      name = %item.name,
      "item added",
    );
    return Ok(ItemApplied::Applied);
  };

  if hit.ambiguous {
    warn!(
      gazette = %stamp.gazette_id,
      minister = %minister.key,
      %category,
      name = %item.name,
      chosen = %hit.record.item_id,
      "multiple name candidates; most recently stamped item chosen",
    );
  }

  let record = hit.record;
  let unchanged =
    !item.has_name() || record.name.trim() == item.name.trim();

  if record.is_active() {
    if unchanged {
      return Ok(ItemApplied::Noop);
    }
    let item_ref = record.to_ref();
    retry_once(|| store.rename_item(&item_ref, &item.name)).await?;
    retry_once(|| {
      store.set_provenance(&item_ref, ProvenanceKind::Updated, stamp)
    })
    .await?;
    debug!(
      gazette = %stamp.gazette_id,
      minister = %minister.key,
      %category,
      from = %record.name,
      to = %item.name,
      "item content replaced",
    );
    return Ok(ItemApplied::Applied);
  }

  // Inactive match. Removed by this gazette: the rewrite half of an update.
  // Removed by an earlier gazette: a re-activation.
  let removed_here = record
    .provenance
    .removed
    .as_ref()
    .is_some_and(|removed| removed.seq == stamp.seq);
  let kind = if removed_here {
    ProvenanceKind::Updated
  } else {
    ProvenanceKind::Added
  };

  let item_ref = record.to_ref();
  if !unchanged {
    retry_once(|| store.rename_item(&item_ref, &item.name)).await?;
  }
  retry_once(|| store.set_provenance(&item_ref, kind, stamp)).await?;
  debug!(
    gazette = %stamp.gazette_id,
    minister = %minister.key,
    %category,
    name = %item.name,
    reactivated = !removed_here,
    "inactive item written",
  );
  Ok(ItemApplied::Applied)
}

/// Deactivate one item. Historical provenance is preserved.
async fn remove_item<S>(
  store: &S,
  minister: &MinisterRef,
  category: Category,
  item: &ItemDescriptor,
  stamp: &Stamp,
) -> Result<ItemApplied, S::Error>
where
  S: StructureStore,
{
  let items = retry_once(|| store.query_items(minister, category)).await?;
  let Some(hit) = matcher::find(&items, item.number, &item.name) else {
    warn!(
      gazette = %stamp.gazette_id,
      minister = %minister.key,
      %category,
      number = item.number,
      name = %item.name,
      "deletion references an item never recorded; skipped",
    );
    return Ok(ItemApplied::Noop);
  };

  if hit.ambiguous {
    warn!(
      gazette = %stamp.gazette_id,
      minister = %minister.key,
      %category,
      name = %item.name,
      chosen = %hit.record.item_id,
      "multiple name candidates; most recently stamped item chosen",
    );
  }

  let record = hit.record;
  // Replays: this gazette already stamped the removal (the item may since
  // have been rewritten back to active by the same amendment's update).
  if record.provenance.removed.as_ref() == Some(stamp) {
    return Ok(ItemApplied::Noop);
  }
  if !record.is_active() {
    debug!(
      gazette = %stamp.gazette_id,
      minister = %minister.key,
      %category,
      name = %record.name,
      "item already inactive",
    );
    return Ok(ItemApplied::Noop);
  }

  let item_ref = record.to_ref();
  retry_once(|| {
    store.set_provenance(&item_ref, ProvenanceKind::Removed, stamp)
  })
  .await?;
  debug!(
    gazette = %stamp.gazette_id,
    minister = %minister.key,
    %category,
    name = %record.name,
    "item removed",
  );
  Ok(ItemApplied::Applied)
}

// ─── Record dispatch ─────────────────────────────────────────────────────────

/// Apply one change record to the lineage's structure.
///
/// Store errors have already been retried once when they surface here; the
/// caller records the whole record as failed and moves on.
pub(crate) async fn apply_change<S>(
  store: &S,
  lineage: &GazetteId,
  change: &ChangeRecord,
  stamp: &Stamp,
) -> Result<RecordOutcome, S::Error>
where
  S: StructureStore,
{
  let mut tally = RecordTally::default();

  match change {
    ChangeRecord::Insertion { minister, purview, category, items } => {
      let minister_ref = retry_once(|| {
        store.upsert_minister(
          lineage,
          &minister.key,
          &minister.name,
          purview.as_deref(),
          stamp,
        )
      })
      .await?;
      if !minister_ref.existed {
        debug!(
          gazette = %stamp.gazette_id,
          minister = %minister.key,
          name = %minister.name,
          "minister created",
        );
        tally.applied += 1;
      }
      if let Some(category) = category {
        for item in items {
          tally.add(write_item(store, &minister_ref, *category, item, stamp).await?);
        }
      }
      Ok(RecordOutcome::Done(tally))
    }

    ChangeRecord::Deletion { minister, category, items } => {
      let Some(found) =
        retry_once(|| store.find_minister(lineage, &minister.key)).await?
      else {
        return Ok(RecordOutcome::MinisterMissing(minister.key.clone()));
      };
      let minister_ref = found.to_ref();
      for item in items {
        tally.add(remove_item(store, &minister_ref, *category, item, stamp).await?);
      }
      Ok(RecordOutcome::Done(tally))
    }

    ChangeRecord::Update { minister, category, removed, written } => {
      let Some(found) =
        retry_once(|| store.find_minister(lineage, &minister.key)).await?
      else {
        return Ok(RecordOutcome::MinisterMissing(minister.key.clone()));
      };
      let minister_ref = found.to_ref();
      // Removals first, then rewrites, per the source document's reading.
      for item in removed {
        tally.add(remove_item(store, &minister_ref, *category, item, stamp).await?);
      }
      for item in written {
        tally.add(write_item(store, &minister_ref, *category, item, stamp).await?);
      }
      Ok(RecordOutcome::Done(tally))
    }

    ChangeRecord::Renumbering { minister, new_key } => {
      let outcome = retry_once(|| {
        store.renumber_minister(lineage, &minister.key, new_key, stamp)
      })
      .await?;
      match outcome {
        RenumberOutcome::Renumbered => {
          debug!(
            gazette = %stamp.gazette_id,
            from = %minister.key,
            to = %new_key,
            "minister renumbered",
          );
          tally.applied += 1;
          Ok(RecordOutcome::Done(tally))
        }
        RenumberOutcome::OldKeyMissing => {
          // A replay lands here: the minister already sits under the new
          // key.
          let replayed =
            retry_once(|| store.find_minister(lineage, new_key)).await?;
          if replayed.is_some() {
            tally.noops += 1;
            Ok(RecordOutcome::Done(tally))
          } else {
            Ok(RecordOutcome::MinisterMissing(minister.key.clone()))
          }
        }
        RenumberOutcome::NewKeyTaken => Ok(RecordOutcome::RenumberConflict {
          old: minister.key.clone(),
          new: new_key.clone(),
        }),
      }
    }

    ChangeRecord::Other { label, minister, category, removed, written } => {
      warn!(
        gazette = %stamp.gazette_id,
        operation = %label,
        minister = %minister.key,
        "custom operation applied best-effort; review manually",
      );
      let Some(found) =
        retry_once(|| store.find_minister(lineage, &minister.key)).await?
      else {
        return Ok(RecordOutcome::MinisterMissing(minister.key.clone()));
      };
      let minister_ref = found.to_ref();
      if let Some(category) = category {
        for item in removed {
          tally.add(remove_item(store, &minister_ref, *category, item, stamp).await?);
        }
        for item in written {
          tally.add(write_item(store, &minister_ref, *category, item, stamp).await?);
        }
      }
      Ok(RecordOutcome::Done(tally))
    }
  }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
