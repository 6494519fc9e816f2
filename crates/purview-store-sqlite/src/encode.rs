//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! All timestamps are stored as RFC 3339 strings and dates as ISO 8601 days.
//! Provenance stamps and document metadata are stored as compact JSON. UUIDs
//! are stored as hyphenated lowercase strings.

use chrono::{DateTime, NaiveDate, Utc};
use purview_core::{
  gazette::{
    DocumentMeta, GazetteId, GazetteKind, GazetteVersion, RecordedVersion,
    Stamp,
  },
  item::{Category, ItemRecord, Provenance},
  minister::{MinisterKey, MinisterRecord},
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── NaiveDate ───────────────────────────────────────────────────────────────

pub fn encode_date(d: NaiveDate) -> String { d.format("%Y-%m-%d").to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d")
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── GazetteKind ─────────────────────────────────────────────────────────────

pub fn encode_kind(k: GazetteKind) -> &'static str {
  match k {
    GazetteKind::Base => "base",
    GazetteKind::Amendment => "amendment",
  }
}

pub fn decode_kind(s: &str) -> Result<GazetteKind> {
  match s {
    "base" => Ok(GazetteKind::Base),
    "amendment" => Ok(GazetteKind::Amendment),
    other => Err(Error::Decode(format!("unknown gazette kind: {other:?}"))),
  }
}

// ─── Category ────────────────────────────────────────────────────────────────

pub fn encode_category(c: Category) -> &'static str { c.as_str() }

pub fn decode_category(s: &str) -> Result<Category> {
  match s {
    "function" => Ok(Category::Function),
    "department" => Ok(Category::Department),
    "law" => Ok(Category::Law),
    other => Err(Error::Decode(format!("unknown category: {other:?}"))),
  }
}

// ─── Stamps ──────────────────────────────────────────────────────────────────

pub fn encode_stamp(s: &Stamp) -> Result<String> {
  Ok(serde_json::to_string(s)?)
}

pub fn decode_stamp(s: &str) -> Result<Stamp> { Ok(serde_json::from_str(s)?) }

pub fn decode_stamp_opt(s: Option<&str>) -> Result<Option<Stamp>> {
  s.map(decode_stamp).transpose()
}

// ─── DocumentMeta ────────────────────────────────────────────────────────────

pub fn encode_meta(m: &DocumentMeta) -> Result<String> {
  Ok(serde_json::to_string(m)?)
}

pub fn decode_meta(s: &str) -> Result<DocumentMeta> {
  Ok(serde_json::from_str(s)?)
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read directly from a `gazettes` row.
pub struct RawVersion {
  pub gazette_id:     String,
  pub published_date: String,
  pub kind:           String,
  pub parent_id:      Option<String>,
  pub lineage:        String,
  pub seq:            i64,
  pub meta_json:      String,
  pub recorded_at:    String,
}

impl RawVersion {
  pub fn into_recorded(self) -> Result<RecordedVersion> {
    let seq = u32::try_from(self.seq)
      .map_err(|_| Error::Decode(format!("negative seq: {}", self.seq)))?;
    Ok(RecordedVersion {
      version: GazetteVersion {
        id:             GazetteId::new(self.gazette_id),
        published_date: decode_date(&self.published_date)?,
        kind:           decode_kind(&self.kind)?,
        parent_id:      self.parent_id.map(GazetteId::new),
        meta:           decode_meta(&self.meta_json)?,
      },
      lineage: GazetteId::new(self.lineage),
      seq,
      recorded_at: decode_dt(&self.recorded_at)?,
    })
  }
}

/// Raw strings read directly from a `ministers` row.
pub struct RawMinister {
  pub minister_id:     String,
  pub lineage:         String,
  pub minister_key:    String,
  pub name:            String,
  pub purview:         Option<String>,
  pub added_json:      String,
  pub renumbered_json: Option<String>,
  pub recorded_at:     String,
}

impl RawMinister {
  pub fn into_record(self) -> Result<MinisterRecord> {
    Ok(MinisterRecord {
      minister_id: decode_uuid(&self.minister_id)?,
      lineage:     GazetteId::new(self.lineage),
      key:         MinisterKey::new(&self.minister_key),
      name:        self.name,
      purview:     self.purview,
      added:       decode_stamp(&self.added_json)?,
      renumbered:  decode_stamp_opt(self.renumbered_json.as_deref())?,
      recorded_at: decode_dt(&self.recorded_at)?,
    })
  }
}

/// Raw strings read from an `items` row joined with its relationship.
pub struct RawItem {
  pub item_id:      String,
  pub rel_id:       String,
  pub category:     String,
  pub number:       Option<i64>,
  pub name:         String,
  pub added_json:   Option<String>,
  pub updated_json: Option<String>,
  pub removed_json: Option<String>,
  pub recorded_at:  String,
}

impl RawItem {
  pub fn into_record(self) -> Result<ItemRecord> {
    let number = self
      .number
      .map(|n| {
        u32::try_from(n)
          .map_err(|_| Error::Decode(format!("bad item number: {n}")))
      })
      .transpose()?;
    Ok(ItemRecord {
      item_id:    decode_uuid(&self.item_id)?,
      rel_id:     decode_uuid(&self.rel_id)?,
      category:   decode_category(&self.category)?,
      number,
      name:       self.name,
      provenance: Provenance {
        added:   decode_stamp_opt(self.added_json.as_deref())?,
        updated: decode_stamp_opt(self.updated_json.as_deref())?,
        removed: decode_stamp_opt(self.removed_json.as_deref())?,
      },
      recorded_at: decode_dt(&self.recorded_at)?,
    })
  }
}
