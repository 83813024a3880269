//! [`SqliteDirectory`] — the SQLite implementation of [`DirectoryStore`].

use std::path::Path;

use muster_core::{
  audit::{ChangeLogEntry, ImportBatch},
  reconcile::ReconcilePlan,
  record::DirectoryRecord,
  store::DirectoryStore,
};
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use crate::{
  Error, Result,
  encode::{RawBatch, RawEntry, RawRecord, encode_dt, encode_uuid},
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A muster directory backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteDirectory {
  conn: tokio_rusqlite::Connection,
}

impl SqliteDirectory {
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
}

/// Read one `directory_records` row into its raw string form.
fn read_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawRecord> {
  Ok(RawRecord {
    identifier:        row.get(0)?,
    given_name:        row.get(1)?,
    family_name:       row.get(2)?,
    display_name:      row.get(3)?,
    sort_name:         row.get(4)?,
    email:             row.get(5)?,
    login_id:          row.get(6)?,
    grade:             row.get(7)?,
    status:            row.get(8)?,
    status_changed_at: row.get(9)?,
    updated_at:        row.get(10)?,
  })
}

/// Write one record row through a prepared INSERT/UPDATE statement.
fn record_params(row: &RawRecord) -> [&dyn rusqlite::ToSql; 11] {
  [
    &row.identifier,
    &row.given_name,
    &row.family_name,
    &row.display_name,
    &row.sort_name,
    &row.email,
    &row.login_id,
    &row.grade,
    &row.status,
    &row.status_changed_at,
    &row.updated_at,
  ]
}

// ─── DirectoryStore impl ─────────────────────────────────────────────────────

impl DirectoryStore for SqliteDirectory {
  type Error = Error;

  // ── Records ───────────────────────────────────────────────────────────────

  async fn list_records(&self) -> Result<Vec<DirectoryRecord>> {
    let raws: Vec<RawRecord> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT identifier, given_name, family_name, display_name,
                  sort_name, email, login_id, grade, status,
                  status_changed_at, updated_at
           FROM directory_records
           ORDER BY identifier",
        )?;
        let rows = stmt
          .query_map([], read_record)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawRecord::into_record).collect()
  }

  async fn get_record(&self, identifier: &str) -> Result<Option<DirectoryRecord>> {
    let id = identifier.to_owned();

    let raw: Option<RawRecord> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT identifier, given_name, family_name, display_name,
                      sort_name, email, login_id, grade, status,
                      status_changed_at, updated_at
               FROM directory_records
               WHERE identifier = ?1",
              rusqlite::params![id],
              read_record,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawRecord::into_record).transpose()
  }

  async fn put_record(&self, record: &DirectoryRecord) -> Result<()> {
    let row = RawRecord::from_record(record);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT OR REPLACE INTO directory_records (
             identifier, given_name, family_name, display_name, sort_name,
             email, login_id, grade, status, status_changed_at, updated_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
          &record_params(&row)[..],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  // ── Reconciliation ────────────────────────────────────────────────────────

  async fn apply(&self, plan: &ReconcilePlan) -> Result<()> {
    let batch_id = encode_uuid(plan.batch.batch_id);
    let imported_at = encode_dt(plan.batch.imported_at);
    let creates: Vec<RawRecord> =
      plan.creates.iter().map(RawRecord::from_record).collect();
    // Suspensions are ordinary row replacements once planned.
    let updates: Vec<RawRecord> = plan
      .updates
      .iter()
      .chain(&plan.suspends)
      .map(RawRecord::from_record)
      .collect();
    let entries: Vec<RawEntry> =
      plan.entries.iter().map(RawEntry::from_entry).collect();

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute(
          "INSERT INTO import_batches (batch_id, imported_at) VALUES (?1, ?2)",
          rusqlite::params![batch_id, imported_at],
        )?;
        {
          let mut insert = tx.prepare(
            "INSERT INTO directory_records (
               identifier, given_name, family_name, display_name, sort_name,
               email, login_id, grade, status, status_changed_at, updated_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
          )?;
          for row in &creates {
            insert.execute(&record_params(row)[..])?;
          }

          let mut update = tx.prepare(
            "UPDATE directory_records SET
               given_name = ?2, family_name = ?3, display_name = ?4,
               sort_name = ?5, email = ?6, login_id = ?7, grade = ?8,
               status = ?9, status_changed_at = ?10, updated_at = ?11
             WHERE identifier = ?1",
          )?;
          for row in &updates {
            update.execute(&record_params(row)[..])?;
          }

          let mut append = tx.prepare(
            "INSERT INTO change_log (
               entry_id, batch_id, identifier, field,
               old_value, new_value, changed_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
          )?;
          for entry in &entries {
            append.execute(rusqlite::params![
              entry.entry_id,
              entry.batch_id,
              entry.identifier,
              entry.field,
              entry.old_value,
              entry.new_value,
              entry.changed_at,
            ])?;
          }
        }
        tx.commit()?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  // ── Audit trail ───────────────────────────────────────────────────────────

  async fn list_batches(&self) -> Result<Vec<ImportBatch>> {
    let raws: Vec<RawBatch> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT batch_id, imported_at FROM import_batches
           ORDER BY imported_at DESC",
        )?;
        let rows = stmt
          .query_map([], |row| {
            Ok(RawBatch {
              batch_id:    row.get(0)?,
              imported_at: row.get(1)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawBatch::into_batch).collect()
  }

  async fn changes(&self, batch_id: Uuid) -> Result<Vec<ChangeLogEntry>> {
    let id_str = encode_uuid(batch_id);

    let raws: Vec<RawEntry> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT entry_id, batch_id, identifier, field,
                  old_value, new_value, changed_at
           FROM change_log
           WHERE batch_id = ?1
           ORDER BY rowid",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![id_str], |row| {
            Ok(RawEntry {
              entry_id:   row.get(0)?,
              batch_id:   row.get(1)?,
              identifier: row.get(2)?,
              field:      row.get(3)?,
              old_value:  row.get(4)?,
              new_value:  row.get(5)?,
              changed_at: row.get(6)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawEntry::into_entry).collect()
  }

  async fn delete_batch(&self, batch_id: Uuid) -> Result<()> {
    let id_str = encode_uuid(batch_id);

    let deleted: bool = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        // Owned entries go first — explicit cascade, not an FK action.
        tx.execute(
          "DELETE FROM change_log WHERE batch_id = ?1",
          rusqlite::params![id_str],
        )?;
        let n = tx.execute(
          "DELETE FROM import_batches WHERE batch_id = ?1",
          rusqlite::params![id_str],
        )?;
        tx.commit()?;
        Ok(n > 0)
      })
      .await?;

    if deleted {
      Ok(())
    } else {
      Err(Error::BatchNotFound(batch_id))
    }
  }
}
