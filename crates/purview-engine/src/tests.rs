//! End-to-end engine scenarios over the in-memory store, with one
//! cross-adapter check against SQLite.

use chrono::NaiveDate;
use purview_core::{
  gazette::{GazetteId, GazetteVersion},
  item::Category,
  minister::MinisterKey,
  store::StructureStore as _,
};
use purview_gazette::ParsedAmendment;
use purview_store_memory::MemoryStore;
use purview_store_sqlite::SqliteStore;

use crate::{Engine, Error, SkipReason};

// ─── Fixtures ────────────────────────────────────────────────────────────────

const BASE_TABLE: &str = r#"{
  "gazette_id": "2289/10",
  "published_date": "2022-07-22",
  "ministers": [
    {
      "number": "01",
      "name": "Minister of Defence",
      "purview": "National security and defence affairs.",
      "functions": ["1. Formulation of defence policy"],
      "departments": ["1. Sri Lanka Army", "2. Sri Lanka Navy"],
      "laws": ["Army Act, No. 17 of 1949"]
    },
    {
      "number": "03",
      "name": "Minister of Public Administration",
      "departments": ["1. Department of Pensions"]
    },
    {
      "number": "04",
      "name": "Minister of Finance",
      "departments": ["1. Department of Treasury"],
      "laws": ["Banking Act, No. 30 of 1988"]
    }
  ]
}"#;

fn lineage() -> GazetteId { GazetteId::new("2289/10") }

fn date(s: &str) -> NaiveDate {
  NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn amendment(
  id: &str,
  published: &str,
  parent: &str,
  changes: serde_json::Value,
) -> String {
  serde_json::json!({
    "metadata": {
      "gazette_id": id,
      "published_date": published,
      "parent_gazette": { "gazette_id": parent },
    },
    "changes": changes,
  })
  .to_string()
}

/// One amendment exercising every operation: a new minister with an item, a
/// deletion, an update, and a renumbering.
fn composite_amendment() -> String {
  amendment("2289/43", "2022-08-20", "2289/10", serde_json::json!([
    {
      "operation_type": "INSERTION",
      "details": {
        "number": "07",
        "name": "Minister of Technology",
        "purview": "Digital government and innovation.",
        "column_no": "2",
        "added_content": ["1. Information and Communication Technology Agency"],
      },
    },
    {
      "operation_type": "DELETION",
      "details": {
        "number": "01",
        "column_no": "2",
        "deleted_sections": ["item 1"],
      },
    },
    {
      "operation_type": "UPDATE",
      "details": {
        "number": "04",
        "column_no": "2",
        "deleted_sections": ["item 1"],
        "updated_content": ["1. Department of National Treasury"],
      },
    },
    {
      "operation_type": "RENUMBERING",
      "details": { "previous_number": "03", "new_number": "05" },
    },
  ]))
}

async fn seeded() -> Engine<MemoryStore> {
  let engine = Engine::new(MemoryStore::new());
  engine.load_base_json(BASE_TABLE).await.unwrap();
  engine
}

fn names(set: &std::collections::BTreeSet<String>) -> Vec<&str> {
  set.iter().map(String::as_str).collect()
}

// ─── Base gazettes ───────────────────────────────────────────────────────────

#[tokio::test]
async fn base_load_seeds_structure() {
  let engine = Engine::new(MemoryStore::new());
  let outcome = engine.load_base_json(BASE_TABLE).await.unwrap();
  assert_eq!(outcome.gazette.as_str(), "2289/10");
  assert_eq!(outcome.seq, 0);
  assert_eq!(outcome.ministers, 3);
  assert_eq!(outcome.applied, 7);
  assert_eq!(outcome.noops, 0);
  assert_eq!(outcome.skipped, 0);

  let snap = engine.snapshot(&lineage()).await.unwrap();
  assert_eq!(snap.gazette.as_str(), "2289/10");
  let keys: Vec<_> = snap.ministers.keys().map(MinisterKey::as_str).collect();
  assert_eq!(keys, ["01", "03", "04"]);

  let defence = &snap.ministers[&MinisterKey::new("01")];
  assert_eq!(defence.name, "Minister of Defence");
  assert_eq!(names(&defence.departments), ["Sri Lanka Army", "Sri Lanka Navy"]);
  assert_eq!(names(&defence.functions), ["Formulation of defence policy"]);
  assert!(defence.laws.contains("Army Act, No. 17 of 1949"));
}

#[tokio::test]
async fn base_reload_is_idempotent() {
  let engine = seeded().await;
  let outcome = engine.load_base_json(BASE_TABLE).await.unwrap();
  assert_eq!(outcome.ministers, 3);
  assert_eq!(outcome.applied, 0);
  assert_eq!(outcome.noops, 7);
}

#[tokio::test]
async fn base_entries_without_numbers_are_reported() {
  let table = r#"{
    "gazette_id": "2200/05",
    "published_date": "2020-08-09",
    "ministers": [
      { "number": 1, "name": "Minister of Defence" },
      { "name": "State Minister of Provincial Councils" }
    ]
  }"#;
  let engine = Engine::new(MemoryStore::new());
  let outcome = engine.load_base_json(table).await.unwrap();
  assert_eq!(outcome.ministers, 1);
  assert_eq!(outcome.skipped, 1);
  assert_eq!(outcome.applied, 0);
}

// ─── Amendment admission ─────────────────────────────────────────────────────

#[tokio::test]
async fn amendment_requires_recorded_parent() {
  let engine = Engine::new(MemoryStore::new());
  let doc = amendment("2289/43", "2022-08-20", "2289/10", serde_json::json!([]));
  let err = engine.apply_amendment_json(&doc).await.unwrap_err();
  assert!(matches!(err, Error::UnknownParent { .. }));
}

#[tokio::test]
async fn version_without_parent_is_not_an_amendment() {
  let engine = seeded().await;
  let parsed = ParsedAmendment {
    version:  GazetteVersion::base("2289/43", date("2022-08-20")),
    changes:  vec![],
    rejected: vec![],
  };
  let err = engine.apply_amendment(&parsed).await.unwrap_err();
  assert!(matches!(err, Error::NotAnAmendment(_)));
}

#[tokio::test]
async fn backdated_amendments_are_rejected() {
  let engine = seeded().await;
  let a1 = amendment("2289/43", "2022-08-20", "2289/10", serde_json::json!([]));
  engine.apply_amendment_json(&a1).await.unwrap();

  let stale = amendment("2290/05", "2022-08-01", "2289/10", serde_json::json!([]));
  let err = engine.apply_amendment_json(&stale).await.unwrap_err();
  let Error::OutOfOrder { gazette, latest, .. } = err else {
    panic!("expected out-of-order rejection");
  };
  assert_eq!(gazette.as_str(), "2290/05");
  assert_eq!(latest.as_str(), "2289/43");

  // Sharing the latest gazette's date is allowed; only strictly earlier
  // dates are rejected.
  let same_day = amendment("2290/06", "2022-08-20", "2289/10", serde_json::json!([]));
  let outcome = engine.apply_amendment_json(&same_day).await.unwrap();
  assert_eq!(outcome.seq, 2);
}

#[tokio::test]
async fn superseded_replay_is_rejected() {
  let engine = seeded().await;
  let a1 = amendment("2289/43", "2022-08-20", "2289/10", serde_json::json!([]));
  let a2 = amendment("2300/07", "2022-09-02", "2289/43", serde_json::json!([]));
  engine.apply_amendment_json(&a1).await.unwrap();
  engine.apply_amendment_json(&a2).await.unwrap();

  let err = engine.apply_amendment_json(&a1).await.unwrap_err();
  let Error::ReplaySuperseded { gazette, latest } = err else {
    panic!("expected superseded-replay rejection");
  };
  assert_eq!(gazette.as_str(), "2289/43");
  assert_eq!(latest.as_str(), "2300/07");
}

// ─── Change application ──────────────────────────────────────────────────────

#[tokio::test]
async fn insertion_creates_minister_and_items() {
  let engine = seeded().await;
  let doc = amendment("2289/43", "2022-08-20", "2289/10", serde_json::json!([{
    "operation_type": "INSERTION",
    "details": {
      "number": "07",
      "name": "Minister of Technology",
      "purview": "Digital government and innovation.",
      "column_no": "2",
      "added_content": ["1. Information and Communication Technology Agency"],
    },
  }]));
  let outcome = engine.apply_amendment_json(&doc).await.unwrap();
  assert_eq!(outcome.seq, 1);
  assert_eq!(outcome.applied, 2);
  assert_eq!(outcome.noops, 0);
  assert!(outcome.skipped.is_empty());

  let snap = engine.snapshot(&lineage()).await.unwrap();
  let technology = &snap.ministers[&MinisterKey::new("07")];
  assert_eq!(technology.name, "Minister of Technology");
  assert_eq!(
    names(&technology.departments),
    ["Information and Communication Technology Agency"]
  );
}

#[tokio::test]
async fn heading_only_insertion_records_the_minister() {
  let engine = seeded().await;
  let doc = amendment("2289/43", "2022-08-20", "2289/10", serde_json::json!([{
    "operation_type": "INSERTION",
    "details": {
      "number": "09",
      "name": "Minister of Sports",
      "purview": "Sport development and youth affairs.",
    },
  }]));
  let outcome = engine.apply_amendment_json(&doc).await.unwrap();
  assert_eq!(outcome.applied, 1);

  let snap = engine.snapshot(&lineage()).await.unwrap();
  let sports = &snap.ministers[&MinisterKey::new("09")];
  assert_eq!(sports.name, "Minister of Sports");
  assert!(sports.functions.is_empty());
  assert!(sports.departments.is_empty());
  assert!(sports.laws.is_empty());
}

#[tokio::test]
async fn deletion_deactivates_items() {
  let engine = seeded().await;
  let doc = amendment("2289/43", "2022-08-20", "2289/10", serde_json::json!([{
    "operation_type": "DELETION",
    "details": {
      "number": "01",
      "column_no": "2",
      "deleted_sections": ["item 1"],
    },
  }]));
  let outcome = engine.apply_amendment_json(&doc).await.unwrap();
  assert_eq!(outcome.applied, 1);

  let snap = engine.snapshot(&lineage()).await.unwrap();
  let defence = &snap.ministers[&MinisterKey::new("01")];
  assert_eq!(names(&defence.departments), ["Sri Lanka Navy"]);
}

#[tokio::test]
async fn deletion_matches_laws_by_name() {
  let engine = seeded().await;
  let doc = amendment("2289/43", "2022-08-20", "2289/10", serde_json::json!([{
    "operation_type": "DELETION",
    "details": {
      "number": "04",
      "column_no": "3",
      "deleted_sections": ["Banking Act, No. 30 of 1988"],
    },
  }]));
  let outcome = engine.apply_amendment_json(&doc).await.unwrap();
  assert_eq!(outcome.applied, 1);

  let snap = engine.snapshot(&lineage()).await.unwrap();
  let finance = &snap.ministers[&MinisterKey::new("04")];
  assert!(finance.laws.is_empty());
}

#[tokio::test]
async fn deletion_of_unrecorded_item_is_noop() {
  let engine = seeded().await;
  let doc = amendment("2289/43", "2022-08-20", "2289/10", serde_json::json!([{
    "operation_type": "DELETION",
    "details": {
      "number": "01",
      "column_no": "2",
      "deleted_sections": ["item 9"],
    },
  }]));
  let outcome = engine.apply_amendment_json(&doc).await.unwrap();
  assert_eq!(outcome.applied, 0);
  assert_eq!(outcome.noops, 1);
  assert!(outcome.skipped.is_empty());
}

#[tokio::test]
async fn update_replaces_item_content() {
  let engine = seeded().await;
  let doc = amendment("2289/43", "2022-08-20", "2289/10", serde_json::json!([{
    "operation_type": "UPDATE",
    "details": {
      "number": "04",
      "column_no": "2",
      "deleted_sections": ["item 1"],
      "updated_content": ["1. Department of National Treasury"],
    },
  }]));
  let outcome = engine.apply_amendment_json(&doc).await.unwrap();
  assert_eq!(outcome.applied, 2);

  let snap = engine.snapshot(&lineage()).await.unwrap();
  let finance = &snap.ministers[&MinisterKey::new("04")];
  assert_eq!(names(&finance.departments), ["Department of National Treasury"]);

  // One item, rewritten in place: removal and update share the amendment's
  // stamp and the item stays active.
  let minister = engine
    .store()
    .find_minister(&lineage(), &MinisterKey::new("04"))
    .await
    .unwrap()
    .unwrap();
  let items = engine
    .store()
    .query_items(&minister.to_ref(), Category::Department)
    .await
    .unwrap();
  assert_eq!(items.len(), 1);
  let item = &items[0];
  assert_eq!(item.name, "Department of National Treasury");
  assert_eq!(item.provenance.added.as_ref().unwrap().seq, 0);
  assert_eq!(item.provenance.updated.as_ref().unwrap().seq, 1);
  assert_eq!(item.provenance.removed.as_ref().unwrap().seq, 1);
  assert!(item.is_active());
}

#[tokio::test]
async fn renumbering_moves_the_key() {
  let engine = seeded().await;
  let doc = amendment("2289/43", "2022-08-20", "2289/10", serde_json::json!([{
    "operation_type": "RENUMBERING",
    "details": { "previous_number": "03", "new_number": "05" },
  }]));
  let outcome = engine.apply_amendment_json(&doc).await.unwrap();
  assert_eq!(outcome.applied, 1);

  let snap = engine.snapshot(&lineage()).await.unwrap();
  let keys: Vec<_> = snap.ministers.keys().map(MinisterKey::as_str).collect();
  assert_eq!(keys, ["01", "04", "05"]);
  let moved = &snap.ministers[&MinisterKey::new("05")];
  assert_eq!(moved.name, "Minister of Public Administration");
  assert_eq!(names(&moved.departments), ["Department of Pensions"]);

  let record = engine
    .store()
    .find_minister(&lineage(), &MinisterKey::new("05"))
    .await
    .unwrap()
    .unwrap();
  assert_eq!(record.renumbered.unwrap().seq, 1);
}

#[tokio::test]
async fn renumbering_onto_a_held_key_is_skipped() {
  let engine = seeded().await;
  let doc = amendment("2289/43", "2022-08-20", "2289/10", serde_json::json!([{
    "operation_type": "RENUMBERING",
    "details": { "previous_number": "01", "new_number": "03" },
  }]));
  let outcome = engine.apply_amendment_json(&doc).await.unwrap();
  assert_eq!(outcome.applied, 0);
  assert_eq!(outcome.skipped.len(), 1);
  assert_eq!(outcome.skipped[0].operation, "RENUMBERING");
  assert_eq!(outcome.skipped[0].reason, SkipReason::RenumberConflict {
    old: MinisterKey::new("01"),
    new: MinisterKey::new("03"),
  });

  // Nothing moved.
  let snap = engine.snapshot(&lineage()).await.unwrap();
  let keys: Vec<_> = snap.ministers.keys().map(MinisterKey::as_str).collect();
  assert_eq!(keys, ["01", "03", "04"]);
}

#[tokio::test]
async fn records_for_unknown_ministers_are_skipped() {
  let engine = seeded().await;
  let doc = amendment("2289/43", "2022-08-20", "2289/10", serde_json::json!([{
    "operation_type": "UPDATE",
    "details": {
      "number": "99",
      "column_no": "2",
      "deleted_sections": ["item 1"],
    },
  }]));
  let outcome = engine.apply_amendment_json(&doc).await.unwrap();
  assert_eq!(outcome.applied, 0);
  assert_eq!(outcome.noops, 0);
  assert_eq!(outcome.skipped.len(), 1);
  assert_eq!(outcome.skipped[0].index, 0);
  assert_eq!(outcome.skipped[0].operation, "UPDATE");
  assert_eq!(
    outcome.skipped[0].reason,
    SkipReason::MinisterNotFound(MinisterKey::new("99"))
  );
}

#[tokio::test]
async fn unresolvable_records_skip_without_aborting() {
  let engine = seeded().await;
  let doc = amendment("2289/43", "2022-08-20", "2289/10", serde_json::json!([
    {
      "operation_type": "INSERTION",
      "details": {
        "number": "01",
        "column_no": "IV",
        "added_content": ["1. Something"],
      },
    },
    {
      "operation_type": "INSERTION",
      "details": {
        "number": "01",
        "column_no": "2",
        "added_content": ["13. Defence Services College"],
      },
    },
  ]));
  let outcome = engine.apply_amendment_json(&doc).await.unwrap();
  assert_eq!(outcome.applied, 1);
  assert_eq!(outcome.skipped.len(), 1);
  assert_eq!(outcome.skipped[0].index, 0);
  assert_eq!(
    outcome.skipped[0].reason,
    SkipReason::UnresolvedColumn("IV".to_owned())
  );

  let snap = engine.snapshot(&lineage()).await.unwrap();
  let defence = &snap.ministers[&MinisterKey::new("01")];
  assert!(defence.departments.contains("Defence Services College"));
}

#[tokio::test]
async fn custom_operations_apply_best_effort() {
  let engine = seeded().await;
  let doc = amendment("2289/43", "2022-08-20", "2289/10", serde_json::json!([{
    "operation_type": "REALLOCATION",
    "details": {
      "number": "01",
      "column_no": "2",
      "added_content": ["14. National Cadet Corps"],
    },
  }]));
  let outcome = engine.apply_amendment_json(&doc).await.unwrap();
  assert_eq!(outcome.applied, 1);

  let snap = engine.snapshot(&lineage()).await.unwrap();
  let defence = &snap.ministers[&MinisterKey::new("01")];
  assert!(defence.departments.contains("National Cadet Corps"));
}

#[tokio::test]
async fn numbered_blank_cell_matches_nothing() {
  let engine = seeded().await;
  let doc = amendment("2289/43", "2022-08-20", "2289/10", serde_json::json!([{
    "operation_type": "INSERTION",
    "details": {
      "number": "01",
      "column_no": "2",
      "added_content": ["15."],
    },
  }]));
  let outcome = engine.apply_amendment_json(&doc).await.unwrap();
  assert_eq!(outcome.applied, 0);
  assert_eq!(outcome.noops, 1);
}

// ─── Replay and provenance ───────────────────────────────────────────────────

#[tokio::test]
async fn amendment_replay_is_noop() {
  let engine = seeded().await;
  let doc = composite_amendment();

  let first = engine.apply_amendment_json(&doc).await.unwrap();
  assert_eq!(first.seq, 1);
  assert_eq!(first.applied, 6);
  assert_eq!(first.noops, 0);
  assert!(first.skipped.is_empty());
  let before = engine.snapshot(&lineage()).await.unwrap();

  let replay = engine.apply_amendment_json(&doc).await.unwrap();
  assert_eq!(replay.seq, 1);
  assert_eq!(replay.applied, 0);
  assert_eq!(replay.noops, 5);
  assert!(replay.skipped.is_empty());

  let after = engine.snapshot(&lineage()).await.unwrap();
  assert_eq!(before, after);
}

#[tokio::test]
async fn reactivation_preserves_removal_history() {
  let engine = seeded().await;
  let removal = amendment("2289/43", "2022-08-20", "2289/10", serde_json::json!([{
    "operation_type": "DELETION",
    "details": {
      "number": "01",
      "column_no": "2",
      "deleted_sections": ["item 1"],
    },
  }]));
  engine.apply_amendment_json(&removal).await.unwrap();

  let restore = amendment("2300/07", "2022-09-02", "2289/43", serde_json::json!([{
    "operation_type": "INSERTION",
    "details": {
      "number": "01",
      "column_no": "2",
      "added_content": ["1. Sri Lanka Army"],
    },
  }]));
  let outcome = engine.apply_amendment_json(&restore).await.unwrap();
  assert_eq!(outcome.applied, 1);

  // The re-activation overwrote `added` and kept the removal stamp.
  let minister = engine
    .store()
    .find_minister(&lineage(), &MinisterKey::new("01"))
    .await
    .unwrap()
    .unwrap();
  let items = engine
    .store()
    .query_items(&minister.to_ref(), Category::Department)
    .await
    .unwrap();
  let army = items.iter().find(|i| i.name == "Sri Lanka Army").unwrap();
  assert!(army.is_active());
  assert_eq!(army.provenance.added.as_ref().unwrap().seq, 2);
  assert_eq!(army.provenance.removed.as_ref().unwrap().seq, 1);
  assert!(army.provenance.updated.is_none());

  // Each cutoff sees its own era.
  let at_base =
    engine.snapshot_at(&lineage(), &lineage()).await.unwrap();
  let at_removal = engine
    .snapshot_at(&lineage(), &GazetteId::new("2289/43"))
    .await
    .unwrap();
  let current = engine.snapshot(&lineage()).await.unwrap();
  let departments =
    |snap: &crate::Snapshot| names(&snap.ministers[&MinisterKey::new("01")].departments)
      .into_iter()
      .map(str::to_owned)
      .collect::<Vec<_>>();
  assert_eq!(departments(&at_base), ["Sri Lanka Army", "Sri Lanka Navy"]);
  assert_eq!(departments(&at_removal), ["Sri Lanka Navy"]);
  assert_eq!(departments(&current), ["Sri Lanka Army", "Sri Lanka Navy"]);
}

#[tokio::test]
async fn items_are_scoped_per_minister() {
  let engine = seeded().await;
  // Finance gains a department spelled exactly like Public Administration's.
  let insert = amendment("2289/43", "2022-08-20", "2289/10", serde_json::json!([{
    "operation_type": "INSERTION",
    "details": {
      "number": "04",
      "column_no": "2",
      "added_content": ["5. Department of Pensions"],
    },
  }]));
  engine.apply_amendment_json(&insert).await.unwrap();

  let remove = amendment("2300/07", "2022-09-02", "2289/43", serde_json::json!([{
    "operation_type": "DELETION",
    "details": {
      "number": "04",
      "column_no": "2",
      "deleted_sections": ["item 5"],
    },
  }]));
  let outcome = engine.apply_amendment_json(&remove).await.unwrap();
  assert_eq!(outcome.applied, 1);

  let snap = engine.snapshot(&lineage()).await.unwrap();
  let administration = &snap.ministers[&MinisterKey::new("03")];
  assert_eq!(names(&administration.departments), ["Department of Pensions"]);
  let finance = &snap.ministers[&MinisterKey::new("04")];
  assert_eq!(names(&finance.departments), ["Department of Treasury"]);
}

// ─── Snapshots and reports ───────────────────────────────────────────────────

#[tokio::test]
async fn snapshot_at_reconstructs_each_gazette() {
  let engine = seeded().await;
  let a1 = amendment("2289/43", "2022-08-20", "2289/10", serde_json::json!([{
    "operation_type": "DELETION",
    "details": {
      "number": "01",
      "column_no": "2",
      "deleted_sections": ["item 1"],
    },
  }]));
  let a2 = amendment("2300/07", "2022-09-02", "2289/43", serde_json::json!([{
    "operation_type": "INSERTION",
    "details": {
      "number": "07",
      "name": "Minister of Technology",
      "column_no": "2",
      "added_content": ["1. Information and Communication Technology Agency"],
    },
  }]));
  engine.apply_amendment_json(&a1).await.unwrap();
  engine.apply_amendment_json(&a2).await.unwrap();

  let at_base = engine.snapshot_at(&lineage(), &lineage()).await.unwrap();
  assert_eq!(at_base.gazette.as_str(), "2289/10");
  assert!(!at_base.ministers.contains_key(&MinisterKey::new("07")));
  let defence = &at_base.ministers[&MinisterKey::new("01")];
  assert_eq!(names(&defence.departments), ["Sri Lanka Army", "Sri Lanka Navy"]);

  let at_a1 = engine
    .snapshot_at(&lineage(), &GazetteId::new("2289/43"))
    .await
    .unwrap();
  assert!(!at_a1.ministers.contains_key(&MinisterKey::new("07")));
  let defence = &at_a1.ministers[&MinisterKey::new("01")];
  assert_eq!(names(&defence.departments), ["Sri Lanka Navy"]);

  let current = engine.snapshot(&lineage()).await.unwrap();
  assert_eq!(current.gazette.as_str(), "2300/07");
  assert!(current.ministers.contains_key(&MinisterKey::new("07")));
}

#[tokio::test]
async fn snapshot_at_rejects_foreign_gazettes() {
  let engine = seeded().await;
  let second = r#"{
    "gazette_id": "1897/15",
    "published_date": "2015-01-18",
    "ministers": []
  }"#;
  engine.load_base_json(second).await.unwrap();

  let err = engine
    .snapshot_at(&lineage(), &GazetteId::new("1897/15"))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::LineageMismatch { .. }));

  let err = engine
    .snapshot_at(&lineage(), &GazetteId::new("9999/99"))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::GazetteNotFound(_)));
}

#[tokio::test]
async fn diff_report_lists_membership_changes() {
  let engine = seeded().await;
  let doc = amendment("2289/43", "2022-08-20", "2289/10", serde_json::json!([
    {
      "operation_type": "DELETION",
      "details": {
        "number": "01",
        "column_no": "2",
        "deleted_sections": ["item 1"],
      },
    },
    {
      "operation_type": "INSERTION",
      "details": {
        "number": "07",
        "name": "Minister of Technology",
        "column_no": "2",
        "added_content": ["1. Information and Communication Technology Agency"],
      },
    },
  ]));
  engine.apply_amendment_json(&doc).await.unwrap();

  let report = engine
    .diff_report(&lineage(), &GazetteId::new("2289/43"))
    .await
    .unwrap();
  assert_eq!(report.base_gazette.as_str(), "2289/10");
  assert_eq!(report.amendment_gazette.as_str(), "2289/43");
  assert_eq!(report.changes.added_ministers, ["Minister of Technology"]);
  assert!(report.changes.removed_ministers.is_empty());
  assert_eq!(report.changes.modified_ministers.len(), 1);
  let defence = &report.changes.modified_ministers[0];
  assert_eq!(defence.name, "Minister of Defence");
  assert_eq!(defence.departments.removed, ["Sri Lanka Army"]);
  assert!(defence.departments.added.is_empty());
  assert!(defence.laws.is_empty());
  assert!(defence.functions.is_empty());
}

// ─── Adapter parity ──────────────────────────────────────────────────────────

#[tokio::test]
async fn sqlite_and_memory_snapshots_agree() {
  let memory = Engine::new(MemoryStore::new());
  let sqlite = Engine::new(SqliteStore::open_in_memory().await.unwrap());
  let doc = composite_amendment();

  memory.load_base_json(BASE_TABLE).await.unwrap();
  memory.apply_amendment_json(&doc).await.unwrap();
  sqlite.load_base_json(BASE_TABLE).await.unwrap();
  sqlite.apply_amendment_json(&doc).await.unwrap();

  let a = memory.snapshot(&lineage()).await.unwrap();
  let b = sqlite.snapshot(&lineage()).await.unwrap();
  assert_eq!(a, b);

  let keys: Vec<_> = a.ministers.keys().map(MinisterKey::as_str).collect();
  assert_eq!(keys, ["01", "04", "05", "07"]);
  let finance = &a.ministers[&MinisterKey::new("04")];
  assert_eq!(names(&finance.departments), ["Department of National Treasury"]);
}
