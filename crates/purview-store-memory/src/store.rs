//! The `MemoryStore` implementation.

use std::{
  collections::HashMap,
  sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use chrono::Utc;
use purview_core::{
  Error,
  gazette::{GazetteId, GazetteVersion, RecordedVersion, Stamp},
  item::{ActiveItem, Category, ItemRecord, ItemRef, Provenance, ProvenanceKind},
  minister::{MinisterKey, MinisterRecord, MinisterRef},
  store::{RenumberOutcome, StructureStore},
};
use uuid::Uuid;

/// Shared in-memory store state.
#[derive(Clone, Default)]
pub struct MemoryStore {
  inner: Arc<Mutex<Inner>>,
}

#[derive(Default)]
struct Inner {
  versions:  HashMap<GazetteId, RecordedVersion>,
  ministers: HashMap<(GazetteId, MinisterKey), MinisterRecord>,
  /// Items grouped by owning minister id.
  items:     HashMap<Uuid, Vec<ItemRecord>>,
}

impl MemoryStore {
  pub fn new() -> Self { Self::default() }

  fn lock(&self) -> MutexGuard<'_, Inner> {
    self.inner.lock().unwrap_or_else(PoisonError::into_inner)
  }
}

fn normalize(name: &str) -> String { name.trim().to_lowercase() }

impl StructureStore for MemoryStore {
  type Error = Error;

  async fn record_version(
    &self,
    version: GazetteVersion,
  ) -> Result<RecordedVersion, Error> {
    let mut inner = self.lock();

    if let Some(existing) = inner.versions.get(&version.id) {
      if existing.version == version {
        return Ok(existing.clone());
      }
      return Err(Error::VersionConflict(version.id.clone()));
    }

    let (lineage, seq) = match &version.parent_id {
      None => (version.id.clone(), 0),
      Some(parent) => {
        let Some(parent_record) = inner.versions.get(parent) else {
          return Err(Error::UnknownParent {
            gazette: version.id.clone(),
            parent:  parent.clone(),
          });
        };
        let lineage = parent_record.lineage.clone();
        let next = inner
          .versions
          .values()
          .filter(|v| v.lineage == lineage)
          .map(|v| v.seq)
          .max()
          .unwrap_or(0)
          + 1;
        (lineage, next)
      }
    };

    let recorded = RecordedVersion {
      version,
      lineage,
      seq,
      recorded_at: Utc::now(),
    };
    inner
      .versions
      .insert(recorded.version.id.clone(), recorded.clone());
    Ok(recorded)
  }

  async fn get_version(
    &self,
    id: &GazetteId,
  ) -> Result<Option<RecordedVersion>, Error> {
    Ok(self.lock().versions.get(id).cloned())
  }

  async fn latest_version(
    &self,
    lineage: &GazetteId,
  ) -> Result<Option<RecordedVersion>, Error> {
    Ok(
      self
        .lock()
        .versions
        .values()
        .filter(|v| v.lineage == *lineage)
        .max_by_key(|v| v.seq)
        .cloned(),
    )
  }

  async fn list_versions(
    &self,
    lineage: &GazetteId,
  ) -> Result<Vec<RecordedVersion>, Error> {
    let mut versions: Vec<_> = self
      .lock()
      .versions
      .values()
      .filter(|v| v.lineage == *lineage)
      .cloned()
      .collect();
    versions.sort_by_key(|v| v.seq);
    Ok(versions)
  }

  async fn upsert_minister(
    &self,
    lineage: &GazetteId,
    key: &MinisterKey,
    name: &str,
    purview: Option<&str>,
    stamp: &Stamp,
  ) -> Result<MinisterRef, Error> {
    let mut inner = self.lock();
    let map_key = (lineage.clone(), key.clone());

    if let Some(existing) = inner.ministers.get(&map_key) {
      return Ok(existing.to_ref());
    }

    let record = MinisterRecord {
      minister_id: Uuid::new_v4(),
      lineage:     lineage.clone(),
      key:         key.clone(),
      name:        name.to_owned(),
      purview:     purview.map(str::to_owned),
      added:       stamp.clone(),
      renumbered:  None,
      recorded_at: Utc::now(),
    };
    let minister_ref = MinisterRef {
      minister_id: record.minister_id,
      key:         record.key.clone(),
      existed:     false,
    };
    inner.ministers.insert(map_key, record);
    Ok(minister_ref)
  }

  async fn find_minister(
    &self,
    lineage: &GazetteId,
    key: &MinisterKey,
  ) -> Result<Option<MinisterRecord>, Error> {
    Ok(
      self
        .lock()
        .ministers
        .get(&(lineage.clone(), key.clone()))
        .cloned(),
    )
  }

  async fn list_ministers(
    &self,
    lineage: &GazetteId,
  ) -> Result<Vec<MinisterRecord>, Error> {
    let mut ministers: Vec<_> = self
      .lock()
      .ministers
      .values()
      .filter(|m| m.lineage == *lineage)
      .cloned()
      .collect();
    ministers.sort_by(|a, b| a.key.cmp(&b.key));
    Ok(ministers)
  }

  async fn renumber_minister(
    &self,
    lineage: &GazetteId,
    old: &MinisterKey,
    new: &MinisterKey,
    stamp: &Stamp,
  ) -> Result<RenumberOutcome, Error> {
    let mut inner = self.lock();
    let old_key = (lineage.clone(), old.clone());
    let new_key = (lineage.clone(), new.clone());

    if !inner.ministers.contains_key(&old_key) {
      return Ok(RenumberOutcome::OldKeyMissing);
    }
    if inner.ministers.contains_key(&new_key) {
      return Ok(RenumberOutcome::NewKeyTaken);
    }
    let Some(mut record) = inner.ministers.remove(&old_key) else {
      return Ok(RenumberOutcome::OldKeyMissing);
    };
    record.key = new.clone();
    record.renumbered = Some(stamp.clone());
    inner.ministers.insert(new_key, record);
    Ok(RenumberOutcome::Renumbered)
  }

  async fn upsert_item(
    &self,
    minister: &MinisterRef,
    category: Category,
    number: Option<u32>,
    name: &str,
  ) -> Result<ItemRef, Error> {
    let mut inner = self.lock();
    if !inner
      .ministers
      .values()
      .any(|m| m.minister_id == minister.minister_id)
    {
      return Err(Error::MinisterNotFound(minister.minister_id));
    }

    let items = inner.items.entry(minister.minister_id).or_default();
    let found = items.iter().find(|item| {
      item.category == category
        && match number {
          Some(n) => item.number == Some(n),
          None => normalize(&item.name) == normalize(name),
        }
    });
    if let Some(item) = found {
      return Ok(item.to_ref());
    }

    let record = ItemRecord {
      item_id:     Uuid::new_v4(),
      rel_id:      Uuid::new_v4(),
      category,
      number,
      name:        name.to_owned(),
      provenance:  Provenance::default(),
      recorded_at: Utc::now(),
    };
    let item_ref = ItemRef {
      item_id:      record.item_id,
      rel_id:       record.rel_id,
      existed:      false,
      current_name: record.name.clone(),
    };
    items.push(record);
    Ok(item_ref)
  }

  async fn rename_item(&self, item: &ItemRef, name: &str) -> Result<(), Error> {
    let mut inner = self.lock();
    let Some(record) = inner
      .items
      .values_mut()
      .flat_map(|items| items.iter_mut())
      .find(|record| record.item_id == item.item_id)
    else {
      return Err(Error::ItemNotFound(item.item_id));
    };
    record.name = name.to_owned();
    Ok(())
  }

  async fn set_provenance(
    &self,
    item: &ItemRef,
    kind: ProvenanceKind,
    stamp: &Stamp,
  ) -> Result<(), Error> {
    let mut inner = self.lock();
    let Some(record) = inner
      .items
      .values_mut()
      .flat_map(|items| items.iter_mut())
      .find(|record| record.item_id == item.item_id)
    else {
      return Err(Error::ItemNotFound(item.item_id));
    };
    record.provenance.apply(kind, stamp.clone());
    Ok(())
  }

  async fn query_items(
    &self,
    minister: &MinisterRef,
    category: Category,
  ) -> Result<Vec<ItemRecord>, Error> {
    let mut items: Vec<_> = self
      .lock()
      .items
      .get(&minister.minister_id)
      .map(|items| {
        items
          .iter()
          .filter(|item| item.category == category)
          .cloned()
          .collect()
      })
      .unwrap_or_default();
    items.sort_by_key(|item| {
      (item.number.is_none(), item.number.unwrap_or(0), item.name.to_lowercase())
    });
    Ok(items)
  }

  async fn query_active_items(
    &self,
    minister: &MinisterRef,
    category: Category,
  ) -> Result<Vec<ActiveItem>, Error> {
    let mut items: Vec<_> = self
      .lock()
      .items
      .get(&minister.minister_id)
      .map(|items| {
        items
          .iter()
          .filter(|item| item.category == category && item.is_active())
          .map(|item| ActiveItem {
            number: item.number,
            name:   item.name.clone(),
          })
          .collect()
      })
      .unwrap_or_default();
    items.sort_by_key(|item| item.name.to_lowercase());
    Ok(items)
  }
}

#[cfg(test)]
mod tests {
  use chrono::NaiveDate;
  use purview_core::gazette::GazetteVersion;

  use super::*;

  fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
  }

  fn stamp(gazette: &str, seq: u32) -> Stamp {
    Stamp {
      gazette_id: GazetteId::new(gazette),
      date:       date("2022-07-22"),
      seq,
    }
  }

  #[tokio::test]
  async fn version_sequence_follows_parent_chain() {
    let store = MemoryStore::new();
    let base = store
      .record_version(GazetteVersion::base("2289/10", date("2022-07-22")))
      .await
      .unwrap();
    assert_eq!(base.seq, 0);
    assert_eq!(base.lineage.as_str(), "2289/10");

    let a1 = store
      .record_version(GazetteVersion::amendment(
        "2289/43",
        date("2022-08-20"),
        "2289/10",
      ))
      .await
      .unwrap();
    assert_eq!(a1.seq, 1);

    // Amendments chain through other amendments to the same lineage.
    let a2 = store
      .record_version(GazetteVersion::amendment(
        "2300/07",
        date("2022-09-02"),
        "2289/43",
      ))
      .await
      .unwrap();
    assert_eq!(a2.seq, 2);
    assert_eq!(a2.lineage.as_str(), "2289/10");
  }

  #[tokio::test]
  async fn recording_is_idempotent_by_identity() {
    let store = MemoryStore::new();
    let version = GazetteVersion::base("2289/10", date("2022-07-22"));
    let first = store.record_version(version.clone()).await.unwrap();
    let replay = store.record_version(version.clone()).await.unwrap();
    assert_eq!(replay.seq, first.seq);

    let mut altered = version;
    altered.published_date = date("2022-07-23");
    assert!(matches!(
      store.record_version(altered).await,
      Err(Error::VersionConflict(_))
    ));
  }

  #[tokio::test]
  async fn unknown_parent_is_rejected() {
    let store = MemoryStore::new();
    let result = store
      .record_version(GazetteVersion::amendment(
        "2289/43",
        date("2022-08-20"),
        "9999/99",
      ))
      .await;
    assert!(matches!(result, Err(Error::UnknownParent { .. })));
  }

  #[tokio::test]
  async fn minister_upsert_keeps_first_writer() {
    let store = MemoryStore::new();
    let lineage = GazetteId::new("2289/10");
    let key = MinisterKey::new("01");

    let created = store
      .upsert_minister(&lineage, &key, "Minister of Defence", None, &stamp("2289/10", 0))
      .await
      .unwrap();
    assert!(!created.existed);

    let found = store
      .upsert_minister(&lineage, &key, "Renamed", None, &stamp("2289/43", 1))
      .await
      .unwrap();
    assert!(found.existed);
    assert_eq!(found.minister_id, created.minister_id);

    let record = store.find_minister(&lineage, &key).await.unwrap().unwrap();
    assert_eq!(record.name, "Minister of Defence");
    assert_eq!(record.added.seq, 0);
  }

  #[tokio::test]
  async fn renumber_rekeys_and_reports_conflicts() {
    let store = MemoryStore::new();
    let lineage = GazetteId::new("2289/10");
    let s = stamp("2289/10", 0);
    store
      .upsert_minister(&lineage, &MinisterKey::new("10"), "Justice", None, &s)
      .await
      .unwrap();
    store
      .upsert_minister(&lineage, &MinisterKey::new("02"), "Finance", None, &s)
      .await
      .unwrap();

    let moved = store
      .renumber_minister(
        &lineage,
        &MinisterKey::new("10"),
        &MinisterKey::new("07"),
        &stamp("2289/43", 1),
      )
      .await
      .unwrap();
    assert_eq!(moved, RenumberOutcome::Renumbered);
    let record = store
      .find_minister(&lineage, &MinisterKey::new("07"))
      .await
      .unwrap()
      .unwrap();
    assert_eq!(record.name, "Justice");
    assert_eq!(record.renumbered.unwrap().seq, 1);

    // Replaying the same renumbering finds the old key vacated.
    let replayed = store
      .renumber_minister(
        &lineage,
        &MinisterKey::new("10"),
        &MinisterKey::new("07"),
        &stamp("2289/43", 1),
      )
      .await
      .unwrap();
    assert_eq!(replayed, RenumberOutcome::OldKeyMissing);

    let taken = store
      .renumber_minister(
        &lineage,
        &MinisterKey::new("07"),
        &MinisterKey::new("02"),
        &stamp("2289/43", 1),
      )
      .await
      .unwrap();
    assert_eq!(taken, RenumberOutcome::NewKeyTaken);

    let gone = store
      .renumber_minister(
        &lineage,
        &MinisterKey::new("99"),
        &MinisterKey::new("98"),
        &stamp("2289/43", 1),
      )
      .await
      .unwrap();
    assert_eq!(gone, RenumberOutcome::OldKeyMissing);
  }

  #[tokio::test]
  async fn item_upsert_matches_number_then_normalized_name() {
    let store = MemoryStore::new();
    let lineage = GazetteId::new("2289/10");
    let minister = store
      .upsert_minister(
        &lineage,
        &MinisterKey::new("01"),
        "Defence",
        None,
        &stamp("2289/10", 0),
      )
      .await
      .unwrap();

    let created = store
      .upsert_item(&minister, Category::Department, Some(1), "Sri Lanka Army")
      .await
      .unwrap();
    assert!(!created.existed);

    let by_number = store
      .upsert_item(&minister, Category::Department, Some(1), "Different Name")
      .await
      .unwrap();
    assert!(by_number.existed);
    assert_eq!(by_number.item_id, created.item_id);
    assert_eq!(by_number.current_name, "Sri Lanka Army");

    let law = store
      .upsert_item(&minister, Category::Law, None, "Army Act, No. 17 of 1949")
      .await
      .unwrap();
    let by_name = store
      .upsert_item(&minister, Category::Law, None, "  army act, no. 17 of 1949 ")
      .await
      .unwrap();
    assert!(by_name.existed);
    assert_eq!(by_name.item_id, law.item_id);

    // Same number under a different category is a different item.
    let function = store
      .upsert_item(&minister, Category::Function, Some(1), "Defence policy")
      .await
      .unwrap();
    assert!(!function.existed);
  }

  #[tokio::test]
  async fn provenance_stamps_drive_active_queries() {
    let store = MemoryStore::new();
    let lineage = GazetteId::new("2289/10");
    let minister = store
      .upsert_minister(
        &lineage,
        &MinisterKey::new("01"),
        "Defence",
        None,
        &stamp("2289/10", 0),
      )
      .await
      .unwrap();

    let army = store
      .upsert_item(&minister, Category::Department, Some(1), "Sri Lanka Army")
      .await
      .unwrap();
    let navy = store
      .upsert_item(&minister, Category::Department, Some(2), "Sri Lanka Navy")
      .await
      .unwrap();
    for item in [&army, &navy] {
      store
        .set_provenance(item, ProvenanceKind::Added, &stamp("2289/10", 0))
        .await
        .unwrap();
    }
    store
      .set_provenance(&army, ProvenanceKind::Removed, &stamp("2289/43", 1))
      .await
      .unwrap();

    let active = store
      .query_active_items(&minister, Category::Department)
      .await
      .unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].name, "Sri Lanka Navy");

    // The full query still returns the removed item with its stamps.
    let all = store.query_items(&minister, Category::Department).await.unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].provenance.removed.as_ref().unwrap().seq, 1);
  }

  #[tokio::test]
  async fn items_order_numbered_first_then_by_name() {
    let store = MemoryStore::new();
    let lineage = GazetteId::new("2289/10");
    let minister = store
      .upsert_minister(
        &lineage,
        &MinisterKey::new("04"),
        "Finance",
        None,
        &stamp("2289/10", 0),
      )
      .await
      .unwrap();

    store
      .upsert_item(&minister, Category::Law, None, "Banking Act")
      .await
      .unwrap();
    store
      .upsert_item(&minister, Category::Law, Some(2), "Second")
      .await
      .unwrap();
    store
      .upsert_item(&minister, Category::Law, Some(1), "First")
      .await
      .unwrap();
    store
      .upsert_item(&minister, Category::Law, None, "Appropriation Act")
      .await
      .unwrap();

    let items = store.query_items(&minister, Category::Law).await.unwrap();
    let names: Vec<_> = items.iter().map(|i| i.name.as_str()).collect();
    assert_eq!(names, ["First", "Second", "Appropriation Act", "Banking Act"]);
  }

  #[tokio::test]
  async fn clones_share_state() {
    let store = MemoryStore::new();
    let clone = store.clone();
    store
      .record_version(GazetteVersion::base("2289/10", date("2022-07-22")))
      .await
      .unwrap();
    let seen = clone
      .get_version(&GazetteId::new("2289/10"))
      .await
      .unwrap();
    assert!(seen.is_some());
  }
}
