//! Import batches and the append-only change log.
//!
//! Every reconciliation run creates one [`ImportBatch`]; every observed
//! mutation or lifecycle event in that run appends one [`ChangeLogEntry`]
//! referencing it. Entries are never updated or deleted — removing a batch
//! (operational cleanup only) removes its entries with it, by explicit
//! code-level cascade in the store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Import batch ────────────────────────────────────────────────────────────

/// One reconciliation run. Immutable after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportBatch {
  pub batch_id:    Uuid,
  pub imported_at: DateTime<Utc>,
}

impl ImportBatch {
  pub fn new(imported_at: DateTime<Utc>) -> Self {
    Self {
      batch_id: Uuid::new_v4(),
      imported_at,
    }
  }
}

// ─── Change log ──────────────────────────────────────────────────────────────

/// Which attribute a change-log entry records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeField {
  /// New-record creation; both values are `None`.
  Create,
  GivenName,
  FamilyName,
  DisplayName,
  SortName,
  Email,
  Grade,
  Status,
}

impl ChangeField {
  /// The string stored in the `field` column.
  /// Must match the `rename_all = "snake_case"` serde tags above.
  pub fn column_name(self) -> &'static str {
    match self {
      Self::Create => "create",
      Self::GivenName => "given_name",
      Self::FamilyName => "family_name",
      Self::DisplayName => "display_name",
      Self::SortName => "sort_name",
      Self::Email => "email",
      Self::Grade => "grade",
      Self::Status => "status",
    }
  }

  /// Inverse of [`column_name`](Self::column_name).
  pub fn from_column_name(s: &str) -> Result<Self> {
    match s {
      "create" => Ok(Self::Create),
      "given_name" => Ok(Self::GivenName),
      "family_name" => Ok(Self::FamilyName),
      "display_name" => Ok(Self::DisplayName),
      "sort_name" => Ok(Self::SortName),
      "email" => Ok(Self::Email),
      "grade" => Ok(Self::Grade),
      "status" => Ok(Self::Status),
      other => Err(Error::UnknownChangeField(other.to_owned())),
    }
  }
}

/// One observed field mutation or lifecycle event. Append-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeLogEntry {
  pub entry_id:   Uuid,
  /// The owning batch; `None` for mutations made outside an import.
  pub batch_id:   Option<Uuid>,
  pub identifier: String,
  pub field:      ChangeField,
  pub old_value:  Option<String>,
  pub new_value:  Option<String>,
  pub changed_at: DateTime<Utc>,
}

impl ChangeLogEntry {
  /// Build an entry owned by `batch`.
  pub fn for_batch(
    batch: &ImportBatch,
    identifier: &str,
    field: ChangeField,
    old_value: Option<String>,
    new_value: Option<String>,
  ) -> Self {
    Self {
      entry_id: Uuid::new_v4(),
      batch_id: Some(batch.batch_id),
      identifier: identifier.to_owned(),
      field,
      old_value,
      new_value,
      changed_at: batch.imported_at,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn column_names_round_trip() {
    for field in [
      ChangeField::Create,
      ChangeField::GivenName,
      ChangeField::FamilyName,
      ChangeField::DisplayName,
      ChangeField::SortName,
      ChangeField::Email,
      ChangeField::Grade,
      ChangeField::Status,
    ] {
      let parsed = ChangeField::from_column_name(field.column_name()).unwrap();
      assert_eq!(parsed, field);
    }
  }

  #[test]
  fn unknown_column_name_is_rejected() {
    let err = ChangeField::from_column_name("login_id").unwrap_err();
    assert!(matches!(err, Error::UnknownChangeField(_)));
  }
}
