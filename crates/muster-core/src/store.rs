//! The `DirectoryStore` trait.
//!
//! The trait is implemented by storage backends (e.g. `muster-store-sqlite`).
//! Higher layers (`muster-cli`, the reconcile driver) depend on this
//! abstraction, not on any concrete backend.

use std::future::Future;

use uuid::Uuid;

use crate::{
  audit::{ChangeLogEntry, ImportBatch},
  reconcile::ReconcilePlan,
  record::DirectoryRecord,
};

/// Abstraction over a muster directory backend.
///
/// Directory records are mutable in place; the change log and batch tables
/// are append-only. [`apply`](Self::apply) is the only write path used by
/// reconciliation and must be atomic: the batch row, every record mutation,
/// and every log entry commit together or not at all.
///
/// All methods return `Send` futures so the trait can be used from
/// multi-threaded async runtimes.
pub trait DirectoryStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Records ───────────────────────────────────────────────────────────

  /// The full directory, sorted by identifier.
  fn list_records(
    &self,
  ) -> impl Future<Output = Result<Vec<DirectoryRecord>, Self::Error>> + Send + '_;

  /// Look up one record by identifier. Returns `None` if not found.
  fn get_record<'a>(
    &'a self,
    identifier: &'a str,
  ) -> impl Future<Output = Result<Option<DirectoryRecord>, Self::Error>> + Send + 'a;

  /// Insert or replace one record.
  ///
  /// Used by custom-record management; reconciliation writes exclusively
  /// through [`apply`](Self::apply).
  fn put_record<'a>(
    &'a self,
    record: &'a DirectoryRecord,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  // ── Reconciliation ────────────────────────────────────────────────────

  /// Apply one reconciliation plan atomically.
  fn apply<'a>(
    &'a self,
    plan: &'a ReconcilePlan,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  // ── Audit trail ───────────────────────────────────────────────────────

  /// All import batches, newest first.
  fn list_batches(
    &self,
  ) -> impl Future<Output = Result<Vec<ImportBatch>, Self::Error>> + Send + '_;

  /// The change-log entries recorded by one batch, in insertion order.
  fn changes(
    &self,
    batch_id: Uuid,
  ) -> impl Future<Output = Result<Vec<ChangeLogEntry>, Self::Error>> + Send + '_;

  /// Delete a batch and, in the same transaction, every entry it owns.
  /// Errors if the batch does not exist.
  fn delete_batch(
    &self,
    batch_id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}
