//! Integration tests for `SqliteDirectory` against an in-memory database.

use chrono::{DateTime, TimeZone, Utc};
use muster_core::{
  audit::{ChangeField, ChangeLogEntry, ImportBatch},
  reconcile::{self, ReconcilePlan},
  record::{self, DirectoryRecord, RecordStatus, RosterRow},
  store::DirectoryStore,
};
use uuid::Uuid;

use crate::{Error, SqliteDirectory};

async fn store() -> SqliteDirectory {
  SqliteDirectory::open_in_memory()
    .await
    .expect("in-memory store")
}

fn t0() -> DateTime<Utc> { Utc.with_ymd_and_hms(2024, 9, 1, 8, 0, 0).unwrap() }

fn t1() -> DateTime<Utc> { Utc.with_ymd_and_hms(2024, 9, 2, 8, 0, 0).unwrap() }

fn row(id: &str, given: &str, family: &str, email: &str, grade: &str) -> RosterRow {
  RosterRow {
    identifier:  id.to_owned(),
    given_name:  given.to_owned(),
    family_name: family.to_owned(),
    email:       record::normalize_email(email),
    grade:       if grade.is_empty() {
      None
    } else {
      Some(grade.to_owned())
    },
  }
}

// ─── Records ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn put_and_get_round_trip() {
  let s = store().await;

  let rec = DirectoryRecord::custom(
    "staff-pjones",
    "Pat",
    "Jones",
    Some("PJones@school.org"),
    RecordStatus::Active,
    t0(),
  )
  .unwrap();
  s.put_record(&rec).await.unwrap();

  let fetched = s.get_record("staff-pjones").await.unwrap().unwrap();
  assert_eq!(fetched, rec);
  assert_eq!(fetched.email.as_deref(), Some("pjones@school.org"));
}

#[tokio::test]
async fn get_record_missing_returns_none() {
  let s = store().await;
  assert!(s.get_record("u000042").await.unwrap().is_none());
}

#[tokio::test]
async fn list_records_sorted_by_identifier() {
  let s = store().await;
  let roster = vec![
    row("u000007", "Bob", "Lee", "", ""),
    row("u000001", "Alice", "Smith", "", ""),
  ];
  reconcile::reconcile(&s, &roster).await.unwrap();

  let all = s.list_records().await.unwrap();
  let ids: Vec<&str> = all.iter().map(|r| r.identifier.as_str()).collect();
  assert_eq!(ids, ["u000001", "u000007"]);
}

// ─── Reconciliation through the store ────────────────────────────────────────

#[tokio::test]
async fn first_import_creates_everything() {
  let s = store().await;
  let roster = vec![
    row("u000001", "Alice", "Smith", "alice@x.org", ""),
    row("u000002", "Bob", "Lee", "bob@x.org", "11"),
  ];

  let summary = reconcile::reconcile(&s, &roster).await.unwrap();
  assert_eq!(summary.created, 2);
  assert_eq!(summary.updated, 0);
  assert_eq!(summary.suspended, 0);

  let entries = s.changes(summary.batch_id).await.unwrap();
  assert_eq!(entries.len(), 2);
  assert!(entries.iter().all(|e| e.field == ChangeField::Create));

  let alice = s.get_record("u000001").await.unwrap().unwrap();
  assert_eq!(alice.status, RecordStatus::Active);
  assert_eq!(alice.login_id.as_deref(), Some("alice@x.org"));
}

#[tokio::test]
async fn second_import_is_idempotent() {
  let s = store().await;
  let roster = vec![
    row("u000001", "Alice", "Smith", "alice@x.org", ""),
    row("u000002", "Bob", "Lee", "bob@x.org", "11"),
  ];

  reconcile::reconcile(&s, &roster).await.unwrap();
  let before = s.list_records().await.unwrap();

  let second = reconcile::reconcile(&s, &roster).await.unwrap();
  assert_eq!(second.created, 0);
  assert_eq!(second.updated, 0);
  assert_eq!(second.suspended, 0);

  // The second batch exists but recorded nothing.
  assert!(s.changes(second.batch_id).await.unwrap().is_empty());
  assert_eq!(s.list_batches().await.unwrap().len(), 2);
  assert_eq!(s.list_records().await.unwrap(), before);
}

#[tokio::test]
async fn absent_then_returning_record() {
  let s = store().await;
  let bob = vec![row("u000002", "Bob", "Lee", "bob@x.org", "")];

  reconcile::reconcile(&s, &bob).await.unwrap();
  let gone = reconcile::reconcile(&s, &[]).await.unwrap();
  assert_eq!(gone.suspended, 1);

  let rec = s.get_record("u000002").await.unwrap().unwrap();
  assert_eq!(rec.status, RecordStatus::Suspended);

  let entries = s.changes(gone.batch_id).await.unwrap();
  assert_eq!(entries.len(), 1);
  assert_eq!(entries[0].field, ChangeField::Status);
  assert_eq!(entries[0].new_value.as_deref(), Some("suspended"));

  // Returning to the roster reactivates with one logged transition.
  let back = reconcile::reconcile(&s, &bob).await.unwrap();
  assert_eq!(back.updated, 1);
  let rec = s.get_record("u000002").await.unwrap().unwrap();
  assert_eq!(rec.status, RecordStatus::Active);

  let entries = s.changes(back.batch_id).await.unwrap();
  assert_eq!(entries.len(), 1);
  assert_eq!(entries[0].old_value.as_deref(), Some("suspended"));
  assert_eq!(entries[0].new_value.as_deref(), Some("active"));
}

#[tokio::test]
async fn custom_records_survive_imports() {
  let s = store().await;
  let custom = DirectoryRecord::custom(
    "kiosk-front-desk",
    "Front",
    "Desk",
    None,
    RecordStatus::Active,
    t0(),
  )
  .unwrap();
  s.put_record(&custom).await.unwrap();

  // An import that mentions nobody suspends managed records only.
  reconcile::reconcile(&s, &[]).await.unwrap();
  let fetched = s.get_record("kiosk-front-desk").await.unwrap().unwrap();
  assert_eq!(fetched, custom);
}

#[tokio::test]
async fn scenario_email_change_suspension_creation() {
  let s = store().await;
  reconcile::reconcile(
    &s,
    &[
      row("u000001", "Alice", "Smith", "", ""),
      row("u000002", "Bob", "Lee", "", ""),
    ],
  )
  .await
  .unwrap();

  let summary = reconcile::reconcile(
    &s,
    &[
      row("u000001", "Alice", "Smith", "alice@x.org", ""),
      row("u000003", "Cara", "Diaz", "cara@x.org", "10"),
    ],
  )
  .await
  .unwrap();

  assert_eq!(summary.created, 1);
  assert_eq!(summary.updated, 1);
  assert_eq!(summary.suspended, 1);

  let entries = s.changes(summary.batch_id).await.unwrap();
  assert_eq!(entries.len(), 3);
  // Roster-order entries first, suspensions last.
  assert_eq!(entries[0].identifier, "u000001");
  assert_eq!(entries[0].field, ChangeField::Email);
  assert_eq!(entries[1].identifier, "u000003");
  assert_eq!(entries[1].field, ChangeField::Create);
  assert_eq!(entries[2].identifier, "u000002");
  assert_eq!(entries[2].field, ChangeField::Status);
}

// ─── Atomicity ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn failed_apply_leaves_no_trace() {
  let s = store().await;
  reconcile::reconcile(&s, &[row("u000001", "Alice", "Smith", "", "")])
    .await
    .unwrap();
  let records_before = s.list_records().await.unwrap();
  let batches_before = s.list_batches().await.unwrap();

  // A plan whose second create violates the identifier primary key: the
  // batch row and the first create succeed, then the whole run must roll
  // back.
  let batch = ImportBatch::new(t1());
  let cara = DirectoryRecord::from_roster(
    &row("u000003", "Cara", "Diaz", "cara@x.org", "10"),
    t1(),
  );
  let entry = ChangeLogEntry::for_batch(
    &batch,
    &cara.identifier,
    ChangeField::Create,
    None,
    None,
  );
  let plan = ReconcilePlan {
    batch,
    creates: vec![cara.clone(), cara],
    updates: vec![],
    suspends: vec![],
    entries: vec![entry],
  };

  let err = s.apply(&plan).await.unwrap_err();
  assert!(matches!(err, Error::Database(_)));

  assert_eq!(s.list_records().await.unwrap(), records_before);
  assert_eq!(s.list_batches().await.unwrap().len(), batches_before.len());
  assert!(s.get_record("u000003").await.unwrap().is_none());
}

// ─── Batch lifecycle ─────────────────────────────────────────────────────────

#[tokio::test]
async fn batches_listed_newest_first() {
  let s = store().await;

  let first = reconcile::plan(&[], &[row("u000001", "Alice", "Smith", "", "")], t0());
  s.apply(&first).await.unwrap();
  let existing = s.list_records().await.unwrap();
  let second = reconcile::plan(&existing, &[], t1());
  s.apply(&second).await.unwrap();

  let batches = s.list_batches().await.unwrap();
  assert_eq!(batches.len(), 2);
  assert_eq!(batches[0].batch_id, second.batch.batch_id);
  assert_eq!(batches[0].imported_at, t1());
  assert_eq!(batches[1].batch_id, first.batch.batch_id);
}

#[tokio::test]
async fn delete_batch_cascades_to_entries() {
  let s = store().await;
  let summary =
    reconcile::reconcile(&s, &[row("u000001", "Alice", "Smith", "", "")])
      .await
      .unwrap();
  assert_eq!(s.changes(summary.batch_id).await.unwrap().len(), 1);

  s.delete_batch(summary.batch_id).await.unwrap();
  assert!(s.list_batches().await.unwrap().is_empty());
  assert!(s.changes(summary.batch_id).await.unwrap().is_empty());

  // The directory itself is untouched by batch cleanup.
  assert!(s.get_record("u000001").await.unwrap().is_some());
}

#[tokio::test]
async fn delete_missing_batch_errors() {
  let s = store().await;
  let id = Uuid::new_v4();
  let err = s.delete_batch(id).await.unwrap_err();
  assert!(matches!(err, Error::BatchNotFound(b) if b == id));
}
