//! Raw wire structs and change-record classification.
//!
//! The extraction pipeline emits an `operation_type` string plus a `details`
//! bag of optional fields. Classification turns each record into the
//! [`ChangeRecord`] variant for its operation, carrying only the fields that
//! operation uses, and rejects records whose required fields are missing or
//! unresolvable.

use chrono::NaiveDate;
use purview_core::{
  change::{ChangeRecord, ItemDescriptor, MinisterHeading},
  item::Category,
  minister::MinisterKey,
  resolve,
};
use serde::Deserialize;

use crate::error::{Error, RecordIssue};

// ─── Raw structs ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RawEnvelope {
  pub metadata: Option<RawMetadata>,
  #[serde(default)]
  pub changes:  Vec<RawChange>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RawMetadata {
  pub gazette_id:     Option<String>,
  pub published_date: Option<String>,
  pub parent_gazette: Option<RawParent>,
  pub published_by:   Option<String>,
  pub gazette_type:   Option<String>,
  pub language:       Option<String>,
  pub pdf_url:        Option<String>,
  pub president:      Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RawParent {
  pub gazette_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RawChange {
  pub operation_type: Option<String>,
  #[serde(default)]
  pub details:        RawDetails,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct RawDetails {
  pub number:          Option<NumOrStr>,
  pub name:            Option<String>,
  pub column_no:       Option<NumOrStr>,
  #[serde(default)]
  pub added_content:   Vec<String>,
  #[serde(default)]
  pub deleted_sections: Vec<String>,
  #[serde(default)]
  pub updated_content: Vec<String>,
  pub previous_number: Option<NumOrStr>,
  pub previous_name:   Option<String>,
  pub new_number:      Option<NumOrStr>,
  pub purview:         Option<String>,
}

/// Extraction output is loosely typed; numbers arrive as JSON numbers or
/// strings interchangeably.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum NumOrStr {
  Int(i64),
  Float(f64),
  Str(String),
}

impl NumOrStr {
  pub fn into_string(self) -> String {
    match self {
      Self::Int(n) => n.to_string(),
      Self::Float(n) => n.to_string(),
      Self::Str(s) => s,
    }
  }
}

// ─── Field helpers ───────────────────────────────────────────────────────────

pub(crate) fn parse_date(
  field: &'static str,
  value: &str,
) -> Result<NaiveDate, Error> {
  NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| {
    Error::InvalidDate { field, value: value.to_owned() }
  })
}

/// Build item descriptors from content cells (`"18. Registration"` style).
/// Blank entries are dropped.
fn written_items(raw: &[String]) -> Vec<ItemDescriptor> {
  raw
    .iter()
    .filter_map(|cell| {
      let (number, name) = resolve::split_item(cell);
      (number.is_some() || !name.is_empty())
        .then_some(ItemDescriptor { number, name })
    })
    .collect()
}

/// Build item descriptors from deleted-section references, which may name an
/// item as `"item 18"`, a bare number, or a full name.
fn deleted_items(raw: &[String]) -> Vec<ItemDescriptor> {
  raw
    .iter()
    .filter_map(|cell| {
      let stripped = strip_item_marker(cell.trim());
      let (number, name) = resolve::split_item(stripped);
      (number.is_some() || !name.is_empty())
        .then_some(ItemDescriptor { number, name })
    })
    .collect()
}

/// Drop a leading `"item"`/`"items"` word from a section reference.
fn strip_item_marker(s: &str) -> &str {
  let Some(prefix) = s.get(..4) else { return s };
  if !prefix.eq_ignore_ascii_case("item") {
    return s;
  }
  let mut rest = &s[4..];
  if let Some(tail) = rest.strip_prefix(['s', 'S']) {
    rest = tail;
  }
  match rest.chars().next() {
    None => rest,
    Some(c) if c.is_whitespace() || c == '.' || c == ':' => {
      rest.trim_start_matches(|c: char| {
        c.is_whitespace() || c == '.' || c == ':'
      })
    }
    // "itemized", "itemization": not a marker.
    _ => s,
  }
}

fn require_column(
  column_no: Option<NumOrStr>,
) -> Result<Category, RecordIssue> {
  let Some(raw) = column_no else {
    return Err(RecordIssue::Malformed("missing column code".into()));
  };
  let raw = raw.into_string();
  resolve::normalize_column(&raw).ok_or(RecordIssue::UnresolvedColumn(raw))
}

fn optional_column(column_no: Option<NumOrStr>) -> Option<Category> {
  column_no.and_then(|raw| resolve::normalize_column(&raw.into_string()))
}

// ─── Classification ──────────────────────────────────────────────────────────

/// Classify one wire record into its [`ChangeRecord`] variant.
pub(crate) fn classify(change: RawChange) -> Result<ChangeRecord, RecordIssue> {
  let Some(op) = change.operation_type else {
    return Err(RecordIssue::Malformed("missing operation type".into()));
  };
  let op = op.trim().to_owned();
  let details = change.details;

  // The heading key: `previous_number` addresses the pre-change heading on
  // updates and renumberings; `number` otherwise.
  let key_raw = details
    .number
    .clone()
    .map(NumOrStr::into_string)
    .filter(|s| !s.trim().is_empty());
  let previous_raw = details
    .previous_number
    .clone()
    .map(NumOrStr::into_string)
    .filter(|s| !s.trim().is_empty());
  let Some(raw_key) = previous_raw.or(key_raw) else {
    return Err(RecordIssue::Malformed("missing minister number".into()));
  };
  let minister = MinisterHeading {
    key:  MinisterKey::new(&raw_key),
    name: details
      .name
      .or(details.previous_name)
      .map(|n| n.trim().to_owned())
      .unwrap_or_default(),
  };

  match op.to_ascii_uppercase().as_str() {
    "INSERTION" => {
      let items = written_items(&details.added_content);
      let category = if items.is_empty() {
        // A heading-only insertion carries no items to categorize.
        optional_column(details.column_no)
      } else {
        Some(require_column(details.column_no)?)
      };
      Ok(ChangeRecord::Insertion {
        minister,
        purview: details.purview,
        category,
        items,
      })
    }
    "DELETION" => {
      let items = deleted_items(&details.deleted_sections);
      if items.is_empty() {
        return Err(RecordIssue::Malformed("no deleted sections".into()));
      }
      let category = require_column(details.column_no)?;
      Ok(ChangeRecord::Deletion { minister, category, items })
    }
    "UPDATE" => {
      let removed = deleted_items(&details.deleted_sections);
      let mut written = written_items(&details.updated_content);
      written.extend(written_items(&details.added_content));
      if removed.is_empty() && written.is_empty() {
        return Err(RecordIssue::Malformed("no update content".into()));
      }
      let category = require_column(details.column_no)?;
      Ok(ChangeRecord::Update { minister, category, removed, written })
    }
    "RENUMBERING" => {
      let Some(new_raw) = details.new_number.map(NumOrStr::into_string)
      else {
        return Err(RecordIssue::Malformed("missing new number".into()));
      };
      Ok(ChangeRecord::Renumbering {
        minister,
        new_key: MinisterKey::new(&new_raw),
      })
    }
    _ => {
      let removed = deleted_items(&details.deleted_sections);
      let mut written = written_items(&details.added_content);
      written.extend(written_items(&details.updated_content));
      let category = if removed.is_empty() && written.is_empty() {
        optional_column(details.column_no)
      } else {
        Some(require_column(details.column_no)?)
      };
      Ok(ChangeRecord::Other { label: op, minister, category, removed, written })
    }
  }
}
