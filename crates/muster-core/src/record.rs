//! Directory records and the roster rows that feed them.
//!
//! A [`DirectoryRecord`] is the persistent row for one known person. Records
//! are created the first time their identifier appears in a roster, mutated
//! in place on later reconciliations, and suspended (never deleted) when they
//! drop out of the roster.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result, identifier};

// ─── Status ──────────────────────────────────────────────────────────────────

/// Whether a record appeared in the most recently reconciled snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordStatus {
  Active,
  Suspended,
}

impl RecordStatus {
  /// The string stored in the `status` column and in status change-log
  /// entries.
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Active => "active",
      Self::Suspended => "suspended",
    }
  }

  pub fn is_active(self) -> bool { matches!(self, Self::Active) }
}

// ─── Roster input ────────────────────────────────────────────────────────────

/// One validated row of an incoming roster snapshot.
///
/// Produced by the roster parser: the identifier is already canonical, names
/// are trimmed, the email is lower-cased, and empty optional fields are
/// `None`. Rows are deduplicated by identifier before reconciliation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RosterRow {
  pub identifier:  String,
  pub given_name:  String,
  pub family_name: String,
  pub email:       Option<String>,
  /// Student grade level; `None` for staff.
  pub grade:       Option<String>,
}

// ─── Directory record ────────────────────────────────────────────────────────

/// The persistent row for one known person.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryRecord {
  /// Canonical stable external ID. Immutable once created.
  pub identifier:        String,
  pub given_name:        String,
  pub family_name:       String,
  pub display_name:      String,
  pub sort_name:         String,
  /// Lower-cased; mirrored into `login_id` on every write.
  pub email:             Option<String>,
  pub login_id:          Option<String>,
  pub grade:             Option<String>,
  pub status:            RecordStatus,
  /// Updated only when `status` transitions.
  pub status_changed_at: DateTime<Utc>,
  /// Updated on any field mutation; status transitions alone do not touch it.
  pub updated_at:        DateTime<Utc>,
}

impl DirectoryRecord {
  /// Build a fresh active record from a roster row.
  pub fn from_roster(row: &RosterRow, now: DateTime<Utc>) -> Self {
    let email = row.email.as_deref().and_then(normalize_email);
    Self {
      identifier:        row.identifier.clone(),
      given_name:        row.given_name.clone(),
      family_name:       row.family_name.clone(),
      display_name:      display_name(&row.given_name, &row.family_name),
      sort_name:         sort_name(&row.given_name, &row.family_name),
      email:             email.clone(),
      login_id:          email,
      grade:             row.grade.clone(),
      status:            RecordStatus::Active,
      status_changed_at: now,
      updated_at:        now,
    }
  }

  /// Build an operator-managed custom record.
  ///
  /// Custom records live outside the reconciler's reach, so their identifier
  /// must not collide with the system-managed pattern — otherwise the next
  /// import would adopt or suspend them.
  pub fn custom(
    identifier: &str,
    given_name: &str,
    family_name: &str,
    email: Option<&str>,
    status: RecordStatus,
    now: DateTime<Utc>,
  ) -> Result<Self> {
    let identifier = identifier.trim();
    if identifier.is_empty() {
      return Err(Error::EmptyIdentifier);
    }
    if identifier::is_managed(identifier) {
      return Err(Error::ReservedIdentifier(identifier.to_owned()));
    }

    let email = email.and_then(normalize_email);
    Ok(Self {
      identifier:        identifier.to_owned(),
      given_name:        given_name.trim().to_owned(),
      family_name:       family_name.trim().to_owned(),
      display_name:      display_name(given_name.trim(), family_name.trim()),
      sort_name:         sort_name(given_name.trim(), family_name.trim()),
      email:             email.clone(),
      login_id:          email,
      grade:             None,
      status,
      status_changed_at: now,
      updated_at:        now,
    })
  }

  /// True iff this record is owned by reconciliation rather than an operator.
  pub fn is_managed(&self) -> bool { identifier::is_managed(&self.identifier) }
}

// ─── Name derivation ─────────────────────────────────────────────────────────

/// `"{given} {family}"`, trimmed so a missing part leaves no stray space.
pub fn display_name(given: &str, family: &str) -> String {
  format!("{given} {family}").trim().to_owned()
}

/// `"{family}, {given}"`, with the separator trimmed when either part is
/// empty (`("", "Lee")` → `"Lee"`).
pub fn sort_name(given: &str, family: &str) -> String {
  format!("{family}, {given}")
    .trim_matches([',', ' '])
    .to_owned()
}

/// Lower-case and trim an email; empty input becomes `None`.
pub fn normalize_email(email: &str) -> Option<String> {
  let email = email.trim();
  if email.is_empty() {
    None
  } else {
    Some(email.to_lowercase())
  }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
