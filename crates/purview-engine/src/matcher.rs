//! Item matching within one `(minister, category)` scope.
//!
//! A pure function over the items as currently stored. Number matches are
//! authoritative; name matches are the fallback, insensitive to case and
//! surrounding whitespace. Active and inactive items both participate, so a
//! hit on an inactive item can signal a re-activation to the applier.

use purview_core::item::ItemRecord;

/// How a match was established.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchIdentity {
  ByNumber,
  ByName,
}

/// A hit against the stored items.
#[derive(Debug)]
pub struct Match<'a> {
  pub record:    &'a ItemRecord,
  pub identity:  MatchIdentity,
  /// Several name candidates existed; the most recently stamped one was
  /// chosen. Callers log this for manual audit.
  pub ambiguous: bool,
}

/// Find the stored item addressed by `number` and/or `name`.
///
/// Numbers win outright: when `number` is present and a stored item carries
/// it, that item is returned even if a different item matches by name. Only
/// when no numbered item exists does name matching run. `None` means the
/// descriptor addresses a new item.
pub fn find<'a>(
  items: &'a [ItemRecord],
  number: Option<u32>,
  name: &str,
) -> Option<Match<'a>> {
  if let Some(n) = number
    && let Some(record) = items.iter().find(|item| item.number == Some(n))
  {
    return Some(Match {
      record,
      identity: MatchIdentity::ByNumber,
      ambiguous: false,
    });
  }

  let needle = normalize(name);
  if needle.is_empty() {
    return None;
  }
  let candidates: Vec<&ItemRecord> = items
    .iter()
    .filter(|item| normalize(&item.name) == needle)
    .collect();
  let ambiguous = candidates.len() > 1;
  let record = candidates
    .into_iter()
    .max_by_key(|item| item.provenance.last_stamped())?;
  Some(Match { record, identity: MatchIdentity::ByName, ambiguous })
}

fn normalize(name: &str) -> String { name.trim().to_lowercase() }

// ─── Tests ───────────────────────────────────────────────────────────────────
