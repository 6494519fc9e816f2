//! SQL schema for the Purview SQLite store.
//!
//! Executed at every connection startup; `CREATE TABLE IF NOT EXISTS` keeps
//! it idempotent. Future migrations will be gated on `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- Gazette rows are immutable once inserted.
-- No UPDATE or DELETE is ever issued against this table.
CREATE TABLE IF NOT EXISTS gazettes (
    gazette_id     TEXT PRIMARY KEY,
    published_date TEXT NOT NULL,     -- ISO 8601 date
    kind           TEXT NOT NULL,     -- 'base' | 'amendment'
    parent_id      TEXT REFERENCES gazettes(gazette_id),
    lineage        TEXT NOT NULL,     -- base gazette id of the chain
    seq            INTEGER NOT NULL,  -- application order within the lineage
    meta_json      TEXT NOT NULL DEFAULT '{}',
    recorded_at    TEXT NOT NULL,     -- ISO 8601 UTC; server-assigned
    UNIQUE (lineage, seq)
);

CREATE TABLE IF NOT EXISTS ministers (
    minister_id     TEXT PRIMARY KEY,
    lineage         TEXT NOT NULL,
    minister_key    TEXT NOT NULL,     -- normalized heading number
    name            TEXT NOT NULL,
    purview         TEXT,
    added_json      TEXT NOT NULL,     -- JSON-encoded stamp
    renumbered_json TEXT,              -- JSON-encoded stamp or NULL
    recorded_at     TEXT NOT NULL,
    UNIQUE (lineage, minister_key)
);

-- Activity is never stored; it is derived from the three stamp columns at
-- read time so removal history survives re-activation.
CREATE TABLE IF NOT EXISTS items (
    item_id      TEXT PRIMARY KEY,
    minister_id  TEXT NOT NULL REFERENCES ministers(minister_id),
    category     TEXT NOT NULL,     -- 'function' | 'department' | 'law'
    number       INTEGER,           -- printed item number, when present
    name         TEXT NOT NULL,
    added_json   TEXT,
    updated_json TEXT,
    removed_json TEXT,
    recorded_at  TEXT NOT NULL
);

-- Typed minister-to-item relationships; their stamps advance in lockstep
-- with the item row's.
CREATE TABLE IF NOT EXISTS relationships (
    rel_id       TEXT PRIMARY KEY,
    minister_id  TEXT NOT NULL REFERENCES ministers(minister_id),
    item_id      TEXT NOT NULL REFERENCES items(item_id),
    rel_type     TEXT NOT NULL,     -- PERFORMS_FUNCTION | OVERSEES_DEPARTMENT | RESPONSIBLE_FOR_LAW
    added_json   TEXT,
    updated_json TEXT,
    removed_json TEXT,
    UNIQUE (minister_id, item_id)
);

CREATE INDEX IF NOT EXISTS gazettes_lineage_idx  ON gazettes(lineage);
CREATE INDEX IF NOT EXISTS ministers_lineage_idx ON ministers(lineage);
CREATE INDEX IF NOT EXISTS items_minister_idx    ON items(minister_id);
CREATE INDEX IF NOT EXISTS rels_item_idx         ON relationships(item_id);

PRAGMA user_version = 1;
";
