//! SQL schema for the muster SQLite store.
//!
//! Executed once at connection startup via `PRAGMA user_version`. Future
//! migrations will be gated on that version number.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS directory_records (
    identifier        TEXT PRIMARY KEY,
    given_name        TEXT NOT NULL,
    family_name       TEXT NOT NULL,
    display_name      TEXT NOT NULL,
    sort_name         TEXT NOT NULL,
    -- email/login_id are deliberately not UNIQUE: the roster is
    -- authoritative and collisions across identifiers are last-writer-wins.
    email             TEXT,
    login_id          TEXT,
    grade             TEXT,
    status            TEXT NOT NULL,   -- 'active' | 'suspended'
    status_changed_at TEXT NOT NULL,
    updated_at        TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS import_batches (
    batch_id    TEXT PRIMARY KEY,
    imported_at TEXT NOT NULL
);

-- The change log is strictly append-only.
-- The only DELETE ever issued is the explicit cascade in delete_batch.
CREATE TABLE IF NOT EXISTS change_log (
    entry_id   TEXT PRIMARY KEY,
    batch_id   TEXT REFERENCES import_batches(batch_id),
    identifier TEXT NOT NULL,
    field      TEXT NOT NULL,    -- 'create' | mutated column | 'status'
    old_value  TEXT,
    new_value  TEXT,
    changed_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS records_status_idx        ON directory_records(status);
CREATE INDEX IF NOT EXISTS change_log_batch_idx      ON change_log(batch_id);
CREATE INDEX IF NOT EXISTS change_log_identifier_idx ON change_log(identifier);

PRAGMA user_version = 1;
";
