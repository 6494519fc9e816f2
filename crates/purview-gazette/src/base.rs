//! Base gazette table parsing.
//!
//! A base table lists every minister with its three item columns. Function
//! and department cells carry printed numbering (`"1. Sri Lanka Army"`); law
//! cells are bare names and stay unsplit so embedded act numbers never become
//! item numbers.

use purview_core::{
  change::{ItemDescriptor, MinisterHeading},
  gazette::{DocumentMeta, GazetteId, GazetteVersion},
  minister::MinisterKey,
  resolve,
};
use serde::Deserialize;

use crate::{
  BaseGazette, BaseMinister, SkippedMinister,
  error::{Error, Result},
  wire::{self, NumOrStr},
};

#[derive(Debug, Clone, Deserialize)]
struct RawBase {
  gazette_id:     Option<String>,
  published_date: Option<String>,
  published_by:   Option<String>,
  gazette_type:   Option<String>,
  language:       Option<String>,
  pdf_url:        Option<String>,
  president:      Option<String>,
  #[serde(default)]
  ministers:      Vec<RawBaseMinister>,
}

#[derive(Debug, Clone, Deserialize)]
struct RawBaseMinister {
  number:      Option<NumOrStr>,
  name:        Option<String>,
  purview:     Option<String>,
  #[serde(default)]
  functions:   Vec<String>,
  #[serde(default)]
  departments: Vec<String>,
  #[serde(default)]
  laws:        Vec<String>,
}

fn numbered_items(cells: &[String]) -> Vec<ItemDescriptor> {
  cells
    .iter()
    .filter_map(|cell| {
      let (number, name) = resolve::split_item(cell);
      (number.is_some() || !name.is_empty())
        .then_some(ItemDescriptor { number, name })
    })
    .collect()
}

fn law_items(cells: &[String]) -> Vec<ItemDescriptor> {
  cells
    .iter()
    .filter_map(|cell| {
      let name = cell.trim();
      (!name.is_empty()).then(|| ItemDescriptor {
        number: None,
        name:   name.to_owned(),
      })
    })
    .collect()
}

pub(crate) fn parse(input: &str) -> Result<BaseGazette> {
  let raw: RawBase = serde_json::from_str(input)?;

  let id = raw
    .gazette_id
    .filter(|s| !s.trim().is_empty())
    .ok_or(Error::MissingField("gazette_id"))?;
  let date_raw = raw
    .published_date
    .ok_or(Error::MissingField("published_date"))?;
  let date = wire::parse_date("published_date", &date_raw)?;

  let mut version = GazetteVersion::base(GazetteId::new(id.trim()), date);
  version.meta = DocumentMeta {
    published_by: raw.published_by,
    gazette_type: raw.gazette_type,
    language:     raw.language,
    pdf_url:      raw.pdf_url,
    president:    raw.president,
  };

  let mut ministers = Vec::new();
  let mut skipped = Vec::new();
  for (index, minister) in raw.ministers.into_iter().enumerate() {
    let name = minister.name.map(|n| n.trim().to_owned()).unwrap_or_default();
    let Some(number) = minister
      .number
      .map(NumOrStr::into_string)
      .filter(|s| !s.trim().is_empty())
    else {
      skipped.push(SkippedMinister { index, name });
      continue;
    };
    ministers.push(BaseMinister {
      heading:     MinisterHeading { key: MinisterKey::new(&number), name },
      purview:     minister.purview,
      functions:   numbered_items(&minister.functions),
      departments: numbered_items(&minister.departments),
      laws:        law_items(&minister.laws),
    });
  }

  Ok(BaseGazette { version, ministers, skipped })
}
