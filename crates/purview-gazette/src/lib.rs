//! Gazette JSON codec for Purview.
//!
//! Converts the two document formats produced by the upstream extraction
//! pipeline — amendment envelopes and base gazette tables — into
//! [`purview_core`] domain types. Pure synchronous; no database dependencies.
//!
//! # Quick start
//!
//! ```no_run
//! use purview_gazette::{ParsedAmendment, parse_amendment};
//!
//! let json = r#"{
//!   "metadata": {
//!     "gazette_id": "2289/43",
//!     "published_date": "2022-08-20",
//!     "parent_gazette": { "gazette_id": "2289/10" }
//!   },
//!   "changes": []
//! }"#;
//! let parsed: ParsedAmendment = parse_amendment(json).unwrap();
//! println!("{} changes, {} rejected", parsed.changes.len(), parsed.rejected.len());
//! ```

mod amendment;
mod base;
pub mod error;
mod wire;

pub use error::{Error, RecordIssue, Result};
use purview_core::{
  change::{ChangeRecord, ItemDescriptor, MinisterHeading},
  gazette::GazetteVersion,
};

// ─── Public types ────────────────────────────────────────────────────────────

/// The result of parsing an amendment envelope.
///
/// Individual change records that fail classification land in `rejected`
/// with their envelope position; only a structurally invalid envelope fails
/// the whole parse.
#[derive(Debug, Clone)]
pub struct ParsedAmendment {
  pub version:  GazetteVersion,
  pub changes:  Vec<ParsedChange>,
  pub rejected: Vec<RejectedRecord>,
}

/// A classified change record together with its envelope position, so
/// downstream skip reports can cite the source record.
#[derive(Debug, Clone)]
pub struct ParsedChange {
  /// Position within the envelope's `changes` array.
  pub index:  usize,
  pub record: ChangeRecord,
}

/// A change record that could not be classified, kept for skip reporting.
#[derive(Debug, Clone)]
pub struct RejectedRecord {
  /// Position within the envelope's `changes` array.
  pub index:     usize,
  /// The `operation_type` as it appeared on the wire.
  pub operation: String,
  pub issue:     RecordIssue,
}

/// The result of parsing a base gazette table.
#[derive(Debug, Clone)]
pub struct BaseGazette {
  pub version:   GazetteVersion,
  pub ministers: Vec<BaseMinister>,
  /// Minister entries without a heading number, kept for skip reporting.
  pub skipped:   Vec<SkippedMinister>,
}

/// One minister column set from a base gazette table.
#[derive(Debug, Clone)]
pub struct BaseMinister {
  pub heading:     MinisterHeading,
  pub purview:     Option<String>,
  pub functions:   Vec<ItemDescriptor>,
  pub departments: Vec<ItemDescriptor>,
  pub laws:        Vec<ItemDescriptor>,
}

impl BaseMinister {
  pub fn items(&self, category: purview_core::item::Category) -> &[ItemDescriptor] {
    use purview_core::item::Category;
    match category {
      Category::Function => &self.functions,
      Category::Department => &self.departments,
      Category::Law => &self.laws,
    }
  }
}

/// A base table minister entry that carried no heading number.
#[derive(Debug, Clone)]
pub struct SkippedMinister {
  /// Position within the table's `ministers` array.
  pub index: usize,
  pub name:  String,
}

// ─── Public API ──────────────────────────────────────────────────────────────

/// Parse an amendment envelope.
///
/// Classifies each wire record into a [`ChangeRecord`] variant; records with
/// a missing minister number or an unresolvable column are collected in
/// [`ParsedAmendment::rejected`] without aborting the rest.
pub fn parse_amendment(input: &str) -> Result<ParsedAmendment> {
  amendment::parse(input)
}

/// Parse a base gazette table.
pub fn parse_base(input: &str) -> Result<BaseGazette> { base::parse(input) }
