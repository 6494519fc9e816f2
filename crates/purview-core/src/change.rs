//! Change records — the validated unit of amendment input.
//!
//! One variant per operation type, each carrying only the fields that
//! operation uses. The wire format (an `operation_type` string plus a bag of
//! optional detail fields) is classified into this union by the gazette
//! codec; downstream code never re-checks field combinations.

use serde::{Deserialize, Serialize};

use crate::{item::Category, minister::MinisterKey};

/// The minister heading a change record addresses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MinisterHeading {
  pub key:  MinisterKey,
  pub name: String,
}

/// One item reference within a change record: a printed number, a name, or
/// both. At least one side is always present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemDescriptor {
  pub number: Option<u32>,
  pub name:   String,
}

impl ItemDescriptor {
  pub fn has_name(&self) -> bool { !self.name.is_empty() }
}

/// A single validated change operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChangeRecord {
  /// New items under a heading; creates the heading itself when it is new.
  /// `category` is absent only when `items` is empty (a heading-only
  /// insertion has no column to resolve).
  Insertion {
    minister: MinisterHeading,
    purview:  Option<String>,
    category: Option<Category>,
    items:    Vec<ItemDescriptor>,
  },
  /// Deactivation of existing items.
  Deletion {
    minister: MinisterHeading,
    category: Category,
    items:    Vec<ItemDescriptor>,
  },
  /// A removal of `removed` followed by a rewrite of `written`, in that
  /// order, under one gazette.
  Update {
    minister: MinisterHeading,
    category: Category,
    removed:  Vec<ItemDescriptor>,
    written:  Vec<ItemDescriptor>,
  },
  /// Re-keys the minister's heading number; items are untouched.
  Renumbering {
    minister: MinisterHeading,
    new_key:  MinisterKey,
  },
  /// A custom operation label (REALLOCATION, RESTRUCTURING, ...); applied
  /// best-effort with UPDATE semantics and always logged for manual review.
  Other {
    label:    String,
    minister: MinisterHeading,
    category: Option<Category>,
    removed:  Vec<ItemDescriptor>,
    written:  Vec<ItemDescriptor>,
  },
}

impl ChangeRecord {
  pub fn minister(&self) -> &MinisterHeading {
    match self {
      Self::Insertion { minister, .. }
      | Self::Deletion { minister, .. }
      | Self::Update { minister, .. }
      | Self::Renumbering { minister, .. }
      | Self::Other { minister, .. } => minister,
    }
  }

  /// The operation label as it appeared on the wire.
  pub fn operation(&self) -> &str {
    match self {
      Self::Insertion { .. } => "INSERTION",
      Self::Deletion { .. } => "DELETION",
      Self::Update { .. } => "UPDATE",
      Self::Renumbering { .. } => "RENUMBERING",
      Self::Other { label, .. } => label,
    }
  }
}
