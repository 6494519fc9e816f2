//! Structure snapshots and the pure differ.
//!
//! A snapshot is a value: the active structure of one lineage as it stood
//! after a given gazette. Diffing two snapshots is pure set arithmetic over
//! minister keys and active item names; nothing here touches the store.

use std::collections::{BTreeMap, BTreeSet};

use purview_core::{gazette::GazetteId, item::Category, minister::MinisterKey};
use serde::Serialize;

// ─── Snapshots ───────────────────────────────────────────────────────────────

/// The active structure of a lineage at one gazette.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
  pub gazette:   GazetteId,
  pub ministers: BTreeMap<MinisterKey, MinisterState>,
}

/// One minister's active items, per category.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MinisterState {
  pub name:        String,
  pub functions:   BTreeSet<String>,
  pub departments: BTreeSet<String>,
  pub laws:        BTreeSet<String>,
}

impl MinisterState {
  pub fn category(&self, category: Category) -> &BTreeSet<String> {
    match category {
      Category::Function => &self.functions,
      Category::Department => &self.departments,
      Category::Law => &self.laws,
    }
  }

  pub(crate) fn category_mut(
    &mut self,
    category: Category,
  ) -> &mut BTreeSet<String> {
    match category {
      Category::Function => &mut self.functions,
      Category::Department => &mut self.departments,
      Category::Law => &mut self.laws,
    }
  }
}

// ─── Diff result ─────────────────────────────────────────────────────────────

/// Differences between two snapshots. Serializes as the `changes` object of
/// the diff document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StructureDiff {
  pub added_ministers:    Vec<String>,
  pub removed_ministers:  Vec<String>,
  pub modified_ministers: Vec<MinisterDiff>,
}

impl StructureDiff {
  pub fn is_empty(&self) -> bool {
    self.added_ministers.is_empty()
      && self.removed_ministers.is_empty()
      && self.modified_ministers.is_empty()
  }
}

/// Category changes of one minister present in both snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MinisterDiff {
  pub name:        String,
  pub departments: CategoryDiff,
  pub laws:        CategoryDiff,
  pub functions:   CategoryDiff,
}

impl MinisterDiff {
  fn is_empty(&self) -> bool {
    self.departments.is_empty()
      && self.laws.is_empty()
      && self.functions.is_empty()
  }
}

/// Item names added and removed within one category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CategoryDiff {
  pub added:   Vec<String>,
  pub removed: Vec<String>,
}

impl CategoryDiff {
  pub fn is_empty(&self) -> bool {
    self.added.is_empty() && self.removed.is_empty()
  }
}

// ─── Differ ──────────────────────────────────────────────────────────────────

/// Compute the differences from snapshot `a` to snapshot `b`.
///
/// Ministers are matched by key; display names never participate in
/// matching. `added` means present in `b` only, `removed` present in `a`
/// only. Output ordering is deterministic: minister key order, item name
/// order.
pub fn diff(a: &Snapshot, b: &Snapshot) -> StructureDiff {
  let mut result = StructureDiff::default();

  for (key, state_b) in &b.ministers {
    match a.ministers.get(key) {
      None => result.added_ministers.push(display_name(key, state_b)),
      Some(state_a) => {
        let entry = MinisterDiff {
          name:        display_name(key, state_b),
          departments: category_diff(
            &state_a.departments,
            &state_b.departments,
          ),
          laws:        category_diff(&state_a.laws, &state_b.laws),
          functions:   category_diff(&state_a.functions, &state_b.functions),
        };
        if !entry.is_empty() {
          result.modified_ministers.push(entry);
        }
      }
    }
  }

  for (key, state_a) in &a.ministers {
    if !b.ministers.contains_key(key) {
      result.removed_ministers.push(display_name(key, state_a));
    }
  }

  result
}

fn category_diff(a: &BTreeSet<String>, b: &BTreeSet<String>) -> CategoryDiff {
  CategoryDiff {
    added:   b.difference(a).cloned().collect(),
    removed: a.difference(b).cloned().collect(),
  }
}

/// Minister display string; headings occasionally arrive nameless, in which
/// case the key still identifies them.
fn display_name(key: &MinisterKey, state: &MinisterState) -> String {
  if state.name.is_empty() {
    key.as_str().to_owned()
  } else {
    state.name.clone()
  }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use super::*;

  fn snapshot(gazette: &str, ministers: &[(&str, &str, &[&str])]) -> Snapshot {
    let ministers = ministers
      .iter()
      .map(|(key, name, departments)| {
        let state = MinisterState {
          name: (*name).to_owned(),
          departments: departments.iter().map(|d| (*d).to_owned()).collect(),
          ..MinisterState::default()
        };
        (MinisterKey::new(key), state)
      })
      .collect();
    Snapshot { gazette: GazetteId::new(gazette), ministers }
  }

  #[test]
  fn unchanged_snapshots_diff_empty() {
    let a = snapshot("g1", &[("01", "Defence", &["Army", "Navy"])]);
    assert!(diff(&a, &a).is_empty());
  }

  #[test]
  fn added_and_removed_ministers_by_key() {
    let a = snapshot("g1", &[("01", "Defence", &[])]);
    let b = snapshot("g2", &[("02", "Finance", &[])]);
    let d = diff(&a, &b);
    assert_eq!(d.added_ministers, ["Finance"]);
    assert_eq!(d.removed_ministers, ["Defence"]);
    assert!(d.modified_ministers.is_empty());
  }

  #[test]
  fn renamed_minister_is_not_a_membership_change() {
    // Same key, different display name, same items: no diff entries.
    let a = snapshot("g1", &[("01", "Defence", &["Army"])]);
    let b = snapshot("g2", &[("01", "Defence and Urban Development", &["Army"])]);
    assert!(diff(&a, &b).is_empty());
  }

  #[test]
  fn category_changes_are_directional() {
    let a = snapshot("g1", &[("01", "Defence", &["Army", "Navy"])]);
    let b = snapshot("g2", &[("01", "Defence", &["Navy", "Coast Guard"])]);
    let d = diff(&a, &b);
    assert_eq!(d.modified_ministers.len(), 1);
    let m = &d.modified_ministers[0];
    assert_eq!(m.departments.added, ["Coast Guard"]);
    assert_eq!(m.departments.removed, ["Army"]);
    assert!(m.laws.is_empty());
    assert!(m.functions.is_empty());
  }

  #[test]
  fn diff_is_antisymmetric() {
    let a = snapshot("g1", &[
      ("01", "Defence", &["Army", "Navy"][..]),
      ("02", "Finance", &["Treasury"][..]),
    ]);
    let b = snapshot("g2", &[
      ("01", "Defence", &["Navy", "Coast Guard"][..]),
      ("03", "Health", &["Hospitals"][..]),
    ]);
    let forward = diff(&a, &b);
    let backward = diff(&b, &a);
    assert_eq!(forward.added_ministers, backward.removed_ministers);
    assert_eq!(forward.removed_ministers, backward.added_ministers);
    assert_eq!(
      forward.modified_ministers[0].departments.added,
      backward.modified_ministers[0].departments.removed
    );
    assert_eq!(
      forward.modified_ministers[0].departments.removed,
      backward.modified_ministers[0].departments.added
    );
  }

  #[test]
  fn nameless_minister_falls_back_to_key() {
    let a = snapshot("g1", &[]);
    let b = snapshot("g2", &[("07", "", &[])]);
    assert_eq!(diff(&a, &b).added_ministers, ["07"]);
  }
}
