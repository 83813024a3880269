//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! All timestamps are stored as RFC 3339 strings; UUIDs as hyphenated
//! lowercase strings. Every column is scalar text — no JSON payloads.

use chrono::{DateTime, Utc};
use muster_core::{
  audit::{ChangeField, ChangeLogEntry, ImportBatch},
  record::{DirectoryRecord, RecordStatus},
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

// ─── RecordStatus ────────────────────────────────────────────────────────────

pub fn encode_status(s: RecordStatus) -> &'static str { s.as_str() }

pub fn decode_status(s: &str) -> Result<RecordStatus> {
  match s {
    "active" => Ok(RecordStatus::Active),
    "suspended" => Ok(RecordStatus::Suspended),
    other => Err(Error::UnknownStatus(other.to_owned())),
  }
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read from (or written to) a `directory_records` row.
pub struct RawRecord {
  pub identifier:        String,
  pub given_name:        String,
  pub family_name:       String,
  pub display_name:      String,
  pub sort_name:         String,
  pub email:             Option<String>,
  pub login_id:          Option<String>,
  pub grade:             Option<String>,
  pub status:            String,
  pub status_changed_at: String,
  pub updated_at:        String,
}

impl RawRecord {
  pub fn from_record(rec: &DirectoryRecord) -> Self {
    Self {
      identifier:        rec.identifier.clone(),
      given_name:        rec.given_name.clone(),
      family_name:       rec.family_name.clone(),
      display_name:      rec.display_name.clone(),
      sort_name:         rec.sort_name.clone(),
      email:             rec.email.clone(),
      login_id:          rec.login_id.clone(),
      grade:             rec.grade.clone(),
      status:            encode_status(rec.status).to_owned(),
      status_changed_at: encode_dt(rec.status_changed_at),
      updated_at:        encode_dt(rec.updated_at),
    }
  }

  pub fn into_record(self) -> Result<DirectoryRecord> {
    Ok(DirectoryRecord {
      identifier:        self.identifier,
      given_name:        self.given_name,
      family_name:       self.family_name,
      display_name:      self.display_name,
      sort_name:         self.sort_name,
      email:             self.email,
      login_id:          self.login_id,
      grade:             self.grade,
      status:            decode_status(&self.status)?,
      status_changed_at: decode_dt(&self.status_changed_at)?,
      updated_at:        decode_dt(&self.updated_at)?,
    })
  }
}

/// Raw strings read from an `import_batches` row.
pub struct RawBatch {
  pub batch_id:    String,
  pub imported_at: String,
}

impl RawBatch {
  pub fn into_batch(self) -> Result<ImportBatch> {
    Ok(ImportBatch {
      batch_id:    decode_uuid(&self.batch_id)?,
      imported_at: decode_dt(&self.imported_at)?,
    })
  }
}

/// Raw strings read from (or written to) a `change_log` row.
pub struct RawEntry {
  pub entry_id:   String,
  pub batch_id:   Option<String>,
  pub identifier: String,
  pub field:      String,
  pub old_value:  Option<String>,
  pub new_value:  Option<String>,
  pub changed_at: String,
}

impl RawEntry {
  pub fn from_entry(entry: &ChangeLogEntry) -> Self {
    Self {
      entry_id:   encode_uuid(entry.entry_id),
      batch_id:   entry.batch_id.map(encode_uuid),
      identifier: entry.identifier.clone(),
      field:      entry.field.column_name().to_owned(),
      old_value:  entry.old_value.clone(),
      new_value:  entry.new_value.clone(),
      changed_at: encode_dt(entry.changed_at),
    }
  }

  pub fn into_entry(self) -> Result<ChangeLogEntry> {
    Ok(ChangeLogEntry {
      entry_id:   decode_uuid(&self.entry_id)?,
      batch_id:   self.batch_id.as_deref().map(decode_uuid).transpose()?,
      identifier: self.identifier,
      field:      ChangeField::from_column_name(&self.field)
        .map_err(Error::Core)?,
      old_value:  self.old_value,
      new_value:  self.new_value,
      changed_at: decode_dt(&self.changed_at)?,
    })
  }
}
