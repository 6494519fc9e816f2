//! [`SqliteStore`] — the SQLite implementation of [`StructureStore`].

use std::path::Path;

use chrono::Utc;
use purview_core::{
  gazette::{GazetteId, GazetteVersion, RecordedVersion, Stamp},
  item::{ActiveItem, Category, ItemRecord, ItemRef, ProvenanceKind},
  minister::{MinisterKey, MinisterRecord, MinisterRef},
  store::{RenumberOutcome, StructureStore},
};
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use crate::{
  Error, Result,
  encode::{
    RawItem, RawMinister, RawVersion, decode_uuid, encode_category, encode_date,
    encode_dt, encode_kind, encode_meta, encode_stamp, encode_uuid,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Purview structure store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn fetch_version(
    &self,
    id: &GazetteId,
  ) -> Result<Option<RecordedVersion>> {
    let id_str = id.as_str().to_owned();

    let raw: Option<RawVersion> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT gazette_id, published_date, kind, parent_id, lineage,
                      seq, meta_json, recorded_at
               FROM gazettes WHERE gazette_id = ?1",
              rusqlite::params![id_str],
              |row| {
                Ok(RawVersion {
                  gazette_id:     row.get(0)?,
                  published_date: row.get(1)?,
                  kind:           row.get(2)?,
                  parent_id:      row.get(3)?,
                  lineage:        row.get(4)?,
                  seq:            row.get(5)?,
                  meta_json:      row.get(6)?,
                  recorded_at:    row.get(7)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawVersion::into_recorded).transpose()
  }
}

// ─── StructureStore impl ─────────────────────────────────────────────────────

impl StructureStore for SqliteStore {
  type Error = Error;

  // ── Gazette versions ──────────────────────────────────────────────────────

  async fn record_version(
    &self,
    version: GazetteVersion,
  ) -> Result<RecordedVersion> {
    if let Some(existing) = self.fetch_version(&version.id).await? {
      if existing.version == version {
        return Ok(existing);
      }
      return Err(Error::VersionConflict(version.id.clone()));
    }

    let (lineage, seq) = match &version.parent_id {
      None => (version.id.clone(), 0),
      Some(parent) => {
        let parent_str = parent.as_str().to_owned();
        let resolved: Option<(String, i64)> = self
          .conn
          .call(move |conn| {
            let lineage: Option<String> = conn
              .query_row(
                "SELECT lineage FROM gazettes WHERE gazette_id = ?1",
                rusqlite::params![parent_str],
                |row| row.get(0),
              )
              .optional()?;
            let Some(lineage) = lineage else { return Ok(None) };
            let max_seq: i64 = conn.query_row(
              "SELECT MAX(seq) FROM gazettes WHERE lineage = ?1",
              rusqlite::params![lineage.clone()],
              |row| row.get(0),
            )?;
            Ok(Some((lineage, max_seq)))
          })
          .await?;

        let Some((lineage_str, max_seq)) = resolved else {
          return Err(Error::UnknownParent {
            gazette: version.id.clone(),
            parent:  parent.clone(),
          });
        };
        let next = u32::try_from(max_seq + 1)
          .map_err(|_| Error::Decode(format!("bad lineage seq: {max_seq}")))?;
        (GazetteId::new(lineage_str), next)
      }
    };

    let recorded = RecordedVersion {
      version,
      lineage,
      seq,
      recorded_at: Utc::now(),
    };

    let id_str      = recorded.version.id.as_str().to_owned();
    let date_str    = encode_date(recorded.version.published_date);
    let kind_str    = encode_kind(recorded.version.kind).to_owned();
    let parent_str  = recorded
      .version
      .parent_id
      .as_ref()
      .map(|p| p.as_str().to_owned());
    let lineage_str = recorded.lineage.as_str().to_owned();
    let seq_val     = i64::from(recorded.seq);
    let meta_str    = encode_meta(&recorded.version.meta)?;
    let at_str      = encode_dt(recorded.recorded_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO gazettes (
             gazette_id, published_date, kind, parent_id, lineage,
             seq, meta_json, recorded_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
          rusqlite::params![
            id_str,
            date_str,
            kind_str,
            parent_str,
            lineage_str,
            seq_val,
            meta_str,
            at_str,
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(recorded)
  }

  async fn get_version(&self, id: &GazetteId) -> Result<Option<RecordedVersion>> {
    self.fetch_version(id).await
  }

  async fn latest_version(
    &self,
    lineage: &GazetteId,
  ) -> Result<Option<RecordedVersion>> {
    let lineage_str = lineage.as_str().to_owned();

    let raw: Option<RawVersion> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT gazette_id, published_date, kind, parent_id, lineage,
                      seq, meta_json, recorded_at
               FROM gazettes WHERE lineage = ?1
               ORDER BY seq DESC LIMIT 1",
              rusqlite::params![lineage_str],
              |row| {
                Ok(RawVersion {
                  gazette_id:     row.get(0)?,
                  published_date: row.get(1)?,
                  kind:           row.get(2)?,
                  parent_id:      row.get(3)?,
                  lineage:        row.get(4)?,
                  seq:            row.get(5)?,
                  meta_json:      row.get(6)?,
                  recorded_at:    row.get(7)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawVersion::into_recorded).transpose()
  }

  async fn list_versions(
    &self,
    lineage: &GazetteId,
  ) -> Result<Vec<RecordedVersion>> {
    let lineage_str = lineage.as_str().to_owned();

    let raws: Vec<RawVersion> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT gazette_id, published_date, kind, parent_id, lineage,
                  seq, meta_json, recorded_at
           FROM gazettes WHERE lineage = ?1
           ORDER BY seq",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![lineage_str], |row| {
            Ok(RawVersion {
              gazette_id:     row.get(0)?,
              published_date: row.get(1)?,
              kind:           row.get(2)?,
              parent_id:      row.get(3)?,
              lineage:        row.get(4)?,
              seq:            row.get(5)?,
              meta_json:      row.get(6)?,
              recorded_at:    row.get(7)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawVersion::into_recorded).collect()
  }

  // ── Ministers ─────────────────────────────────────────────────────────────

  async fn upsert_minister(
    &self,
    lineage: &GazetteId,
    key: &MinisterKey,
    name: &str,
    purview: Option<&str>,
    stamp: &Stamp,
  ) -> Result<MinisterRef> {
    let lineage_str = lineage.as_str().to_owned();
    let key_str     = key.as_str().to_owned();
    let name        = name.to_owned();
    let purview     = purview.map(str::to_owned);
    let added_str   = encode_stamp(stamp)?;
    let at_str      = encode_dt(Utc::now());
    let new_id_str  = encode_uuid(Uuid::new_v4());

    let (id_str, existed): (String, bool) = self
      .conn
      .call(move |conn| {
        let found: Option<String> = conn
          .query_row(
            "SELECT minister_id FROM ministers
             WHERE lineage = ?1 AND minister_key = ?2",
            rusqlite::params![lineage_str, key_str],
            |row| row.get(0),
          )
          .optional()?;
        if let Some(id) = found {
          return Ok((id, true));
        }

        conn.execute(
          "INSERT INTO ministers (
             minister_id, lineage, minister_key, name, purview,
             added_json, renumbered_json, recorded_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, NULL, ?7)",
          rusqlite::params![
            new_id_str,
            lineage_str,
            key_str,
            name,
            purview,
            added_str,
            at_str,
          ],
        )?;
        Ok((new_id_str, false))
      })
      .await?;

    Ok(MinisterRef {
      minister_id: decode_uuid(&id_str)?,
      key: key.clone(),
      existed,
    })
  }

  async fn find_minister(
    &self,
    lineage: &GazetteId,
    key: &MinisterKey,
  ) -> Result<Option<MinisterRecord>> {
    let lineage_str = lineage.as_str().to_owned();
    let key_str     = key.as_str().to_owned();

    let raw: Option<RawMinister> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT minister_id, lineage, minister_key, name, purview,
                      added_json, renumbered_json, recorded_at
               FROM ministers WHERE lineage = ?1 AND minister_key = ?2",
              rusqlite::params![lineage_str, key_str],
              |row| {
                Ok(RawMinister {
                  minister_id:     row.get(0)?,
                  lineage:         row.get(1)?,
                  minister_key:    row.get(2)?,
                  name:            row.get(3)?,
                  purview:         row.get(4)?,
                  added_json:      row.get(5)?,
                  renumbered_json: row.get(6)?,
                  recorded_at:     row.get(7)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawMinister::into_record).transpose()
  }

  async fn list_ministers(
    &self,
    lineage: &GazetteId,
  ) -> Result<Vec<MinisterRecord>> {
    let lineage_str = lineage.as_str().to_owned();

    let raws: Vec<RawMinister> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT minister_id, lineage, minister_key, name, purview,
                  added_json, renumbered_json, recorded_at
           FROM ministers WHERE lineage = ?1
           ORDER BY minister_key",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![lineage_str], |row| {
            Ok(RawMinister {
              minister_id:     row.get(0)?,
              lineage:         row.get(1)?,
              minister_key:    row.get(2)?,
              name:            row.get(3)?,
              purview:         row.get(4)?,
              added_json:      row.get(5)?,
              renumbered_json: row.get(6)?,
              recorded_at:     row.get(7)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawMinister::into_record).collect()
  }

  async fn renumber_minister(
    &self,
    lineage: &GazetteId,
    old: &MinisterKey,
    new: &MinisterKey,
    stamp: &Stamp,
  ) -> Result<RenumberOutcome> {
    let lineage_str = lineage.as_str().to_owned();
    let old_str     = old.as_str().to_owned();
    let new_str     = new.as_str().to_owned();
    let stamp_str   = encode_stamp(stamp)?;

    let outcome = self
      .conn
      .call(move |conn| {
        let old_exists: bool = conn
          .query_row(
            "SELECT 1 FROM ministers WHERE lineage = ?1 AND minister_key = ?2",
            rusqlite::params![lineage_str, old_str],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false);
        if !old_exists {
          return Ok(RenumberOutcome::OldKeyMissing);
        }

        let new_taken: bool = conn
          .query_row(
            "SELECT 1 FROM ministers WHERE lineage = ?1 AND minister_key = ?2",
            rusqlite::params![lineage_str, new_str],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false);
        if new_taken {
          return Ok(RenumberOutcome::NewKeyTaken);
        }

        conn.execute(
          "UPDATE ministers SET minister_key = ?3, renumbered_json = ?4
           WHERE lineage = ?1 AND minister_key = ?2",
          rusqlite::params![lineage_str, old_str, new_str, stamp_str],
        )?;
        Ok(RenumberOutcome::Renumbered)
      })
      .await?;

    Ok(outcome)
  }

  // ── Items ─────────────────────────────────────────────────────────────────

  async fn upsert_item(
    &self,
    minister: &MinisterRef,
    category: Category,
    number: Option<u32>,
    name: &str,
  ) -> Result<ItemRef> {
    let minister_id_str = encode_uuid(minister.minister_id);

    let known: bool = {
      let id_str = minister_id_str.clone();
      self
        .conn
        .call(move |conn| {
          Ok(
            conn
              .query_row(
                "SELECT 1 FROM ministers WHERE minister_id = ?1",
                rusqlite::params![id_str],
                |_| Ok(true),
              )
              .optional()?
              .unwrap_or(false),
          )
        })
        .await?
    };
    if !known {
      return Err(Error::MinisterNotFound(minister.minister_id));
    }

    let category_str    = encode_category(category).to_owned();
    let rel_type        = category.relationship().to_owned();
    let number_val      = number.map(i64::from);
    let name            = name.to_owned();
    let needle          = name.trim().to_lowercase();
    let at_str          = encode_dt(Utc::now());
    let new_item_str    = encode_uuid(Uuid::new_v4());
    let new_rel_str     = encode_uuid(Uuid::new_v4());

    let (item_str, rel_str, current_name, existed): (String, String, String, bool) =
      self
        .conn
        .call(move |conn| {
          let found: Option<(String, String, String)> = match number_val {
            Some(n) => conn
              .query_row(
                "SELECT i.item_id, r.rel_id, i.name
                 FROM items i
                 JOIN relationships r ON r.item_id = i.item_id
                 WHERE i.minister_id = ?1 AND i.category = ?2
                   AND i.number = ?3",
                rusqlite::params![minister_id_str, category_str, n],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
              )
              .optional()?,
            None => conn
              .query_row(
                "SELECT i.item_id, r.rel_id, i.name
                 FROM items i
                 JOIN relationships r ON r.item_id = i.item_id
                 WHERE i.minister_id = ?1 AND i.category = ?2
                   AND LOWER(TRIM(i.name)) = ?3",
                rusqlite::params![minister_id_str, category_str, needle],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
              )
              .optional()?,
          };
          if let Some((item_id, rel_id, stored_name)) = found {
            return Ok((item_id, rel_id, stored_name, true));
          }

          conn.execute(
            "INSERT INTO items (
               item_id, minister_id, category, number, name,
               added_json, updated_json, removed_json, recorded_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, NULL, NULL, NULL, ?6)",
            rusqlite::params![
              new_item_str,
              minister_id_str,
              category_str,
              number_val,
              name,
              at_str,
            ],
          )?;
          conn.execute(
            "INSERT INTO relationships (
               rel_id, minister_id, item_id, rel_type,
               added_json, updated_json, removed_json
             ) VALUES (?1, ?2, ?3, ?4, NULL, NULL, NULL)",
            rusqlite::params![new_rel_str, minister_id_str, new_item_str, rel_type],
          )?;
          Ok((new_item_str, new_rel_str, name, false))
        })
        .await?;

    Ok(ItemRef {
      item_id: decode_uuid(&item_str)?,
      rel_id: decode_uuid(&rel_str)?,
      existed,
      current_name,
    })
  }

  async fn rename_item(&self, item: &ItemRef, name: &str) -> Result<()> {
    let item_id_str = encode_uuid(item.item_id);
    let name        = name.to_owned();

    let updated: usize = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE items SET name = ?2 WHERE item_id = ?1",
          rusqlite::params![item_id_str, name],
        )?)
      })
      .await?;

    if updated == 0 {
      return Err(Error::ItemNotFound(item.item_id));
    }
    Ok(())
  }

  async fn set_provenance(
    &self,
    item: &ItemRef,
    kind: ProvenanceKind,
    stamp: &Stamp,
  ) -> Result<()> {
    let column = match kind {
      ProvenanceKind::Added => "added_json",
      ProvenanceKind::Updated => "updated_json",
      ProvenanceKind::Removed => "removed_json",
    };
    let item_id_str = encode_uuid(item.item_id);
    let rel_id_str  = encode_uuid(item.rel_id);
    let stamp_str   = encode_stamp(stamp)?;

    let updated: usize = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let n = tx.execute(
          &format!("UPDATE items SET {column} = ?1 WHERE item_id = ?2"),
          rusqlite::params![stamp_str, item_id_str],
        )?;
        tx.execute(
          &format!("UPDATE relationships SET {column} = ?1 WHERE rel_id = ?2"),
          rusqlite::params![stamp_str, rel_id_str],
        )?;
        tx.commit()?;
        Ok(n)
      })
      .await?;

    if updated == 0 {
      return Err(Error::ItemNotFound(item.item_id));
    }
    Ok(())
  }

  // ── Reads ─────────────────────────────────────────────────────────────────

  async fn query_items(
    &self,
    minister: &MinisterRef,
    category: Category,
  ) -> Result<Vec<ItemRecord>> {
    let minister_id_str = encode_uuid(minister.minister_id);
    let category_str    = encode_category(category).to_owned();

    let raws: Vec<RawItem> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT i.item_id, r.rel_id, i.category, i.number, i.name,
                  i.added_json, i.updated_json, i.removed_json, i.recorded_at
           FROM items i
           JOIN relationships r ON r.item_id = i.item_id
           WHERE i.minister_id = ?1 AND i.category = ?2
           ORDER BY (i.number IS NULL), i.number, LOWER(i.name)",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![minister_id_str, category_str], |row| {
            Ok(RawItem {
              item_id:      row.get(0)?,
              rel_id:       row.get(1)?,
              category:     row.get(2)?,
              number:       row.get(3)?,
              name:         row.get(4)?,
              added_json:   row.get(5)?,
              updated_json: row.get(6)?,
              removed_json: row.get(7)?,
              recorded_at:  row.get(8)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawItem::into_record).collect()
  }

  async fn query_active_items(
    &self,
    minister: &MinisterRef,
    category: Category,
  ) -> Result<Vec<ActiveItem>> {
    // Activity is derived from stamps in Rust, not stored in a column.
    let mut items: Vec<ActiveItem> = self
      .query_items(minister, category)
      .await?
      .into_iter()
      .filter(ItemRecord::is_active)
      .map(|item| ActiveItem { number: item.number, name: item.name })
      .collect();
    items.sort_by_key(|item| item.name.to_lowercase());
    Ok(items)
  }
}
