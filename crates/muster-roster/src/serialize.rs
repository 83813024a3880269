//! Canonical directory export.
//!
//! The column layout is the one downstream tooling consumes; `short_name`
//! and `full_name` both carry the display name.

use muster_core::record::DirectoryRecord;

use crate::{Error, Result};

const HEADER: [&str; 10] = [
  "user_id",
  "login_id",
  "first_name",
  "last_name",
  "short_name",
  "sortable_name",
  "full_name",
  "email",
  "status",
  "grade",
];

pub(crate) fn to_csv(records: &[DirectoryRecord]) -> Result<String> {
  let mut writer = csv::Writer::from_writer(Vec::new());
  writer.write_record(HEADER)?;

  for rec in records {
    writer.write_record([
      rec.identifier.as_str(),
      rec.login_id.as_deref().unwrap_or(""),
      rec.given_name.as_str(),
      rec.family_name.as_str(),
      rec.display_name.as_str(),
      rec.sort_name.as_str(),
      rec.display_name.as_str(),
      rec.email.as_deref().unwrap_or(""),
      rec.status.as_str(),
      rec.grade.as_deref().unwrap_or(""),
    ])?;
  }

  let bytes = writer
    .into_inner()
    .map_err(|e| Error::Csv(csv::Error::from(e.into_error())))?;
  Ok(String::from_utf8(bytes)?)
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use chrono::{TimeZone, Utc};
  use muster_core::record::{DirectoryRecord, RecordStatus, RosterRow};

  use super::*;

  fn record(id: &str, given: &str, family: &str, email: &str) -> DirectoryRecord {
    let now = Utc.with_ymd_and_hms(2024, 9, 1, 8, 0, 0).unwrap();
    DirectoryRecord::from_roster(
      &RosterRow {
        identifier:  id.to_owned(),
        given_name:  given.to_owned(),
        family_name: family.to_owned(),
        email:       if email.is_empty() {
          None
        } else {
          Some(email.to_owned())
        },
        grade:       None,
      },
      now,
    )
  }

  #[test]
  fn header_and_row_layout() {
    let rec = record("u000042", "Alice", "Smith", "alice@x.org");
    let csv = to_csv(&[rec]).unwrap();
    let mut lines = csv.lines();

    assert_eq!(
      lines.next().unwrap(),
      "user_id,login_id,first_name,last_name,short_name,sortable_name,\
       full_name,email,status,grade"
    );
    assert_eq!(
      lines.next().unwrap(),
      "u000042,alice@x.org,Alice,Smith,Alice Smith,\"Smith, Alice\",\
       Alice Smith,alice@x.org,active,"
    );
    assert!(lines.next().is_none());
  }

  #[test]
  fn suspended_and_sparse_records() {
    let mut rec = record("u000007", "Bob", "Lee", "");
    rec.status = RecordStatus::Suspended;
    let csv = to_csv(&[rec]).unwrap();
    let row = csv.lines().nth(1).unwrap();
    assert_eq!(row, "u000007,,Bob,Lee,Bob Lee,\"Lee, Bob\",Bob Lee,,suspended,");
  }

  #[test]
  fn empty_directory_yields_header_only() {
    let csv = to_csv(&[]).unwrap();
    assert_eq!(csv.lines().count(), 1);
  }
}
