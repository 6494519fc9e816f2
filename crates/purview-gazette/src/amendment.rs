//! Amendment envelope parsing.

use purview_core::gazette::{DocumentMeta, GazetteId, GazetteVersion};

use crate::{
  ParsedAmendment, ParsedChange, RejectedRecord,
  error::{Error, Result},
  wire::{self, RawEnvelope},
};

pub(crate) fn parse(input: &str) -> Result<ParsedAmendment> {
  let raw: RawEnvelope = serde_json::from_str(input)?;
  let meta = raw.metadata.ok_or(Error::MissingField("metadata"))?;

  let id = meta
    .gazette_id
    .filter(|s| !s.trim().is_empty())
    .ok_or(Error::MissingField("metadata.gazette_id"))?;
  let date_raw = meta
    .published_date
    .ok_or(Error::MissingField("metadata.published_date"))?;
  let date = wire::parse_date("metadata.published_date", &date_raw)?;
  // An amendment cannot be applied without a parent to resolve its lineage.
  let parent = meta
    .parent_gazette
    .and_then(|p| p.gazette_id)
    .filter(|s| !s.trim().is_empty())
    .ok_or(Error::MissingField("metadata.parent_gazette.gazette_id"))?;

  let mut version =
    GazetteVersion::amendment(GazetteId::new(id.trim()), date, parent.trim());
  version.meta = DocumentMeta {
    published_by: meta.published_by,
    gazette_type: meta.gazette_type,
    language:     meta.language,
    pdf_url:      meta.pdf_url,
    president:    meta.president,
  };

  let mut changes = Vec::new();
  let mut rejected = Vec::new();
  for (index, change) in raw.changes.into_iter().enumerate() {
    let operation = change.operation_type.clone().unwrap_or_default();
    match wire::classify(change) {
      Ok(record) => changes.push(ParsedChange { index, record }),
      Err(issue) => rejected.push(RejectedRecord { index, operation, issue }),
    }
  }

  Ok(ParsedAmendment { version, changes, rejected })
}
