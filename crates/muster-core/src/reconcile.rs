//! Roster reconciliation: incoming snapshot → minimal directory mutations.
//!
//! [`plan`] is a pure diff of one roster snapshot against the current
//! directory state; it produces a [`ReconcilePlan`] of creates, updates,
//! suspensions, and the change-log entries documenting them. [`reconcile`]
//! drives a store through one full run: load, plan, apply atomically.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::{
  audit::{ChangeField, ChangeLogEntry, ImportBatch},
  record::{self, DirectoryRecord, RecordStatus, RosterRow},
  store::DirectoryStore,
};

// ─── Plan types ──────────────────────────────────────────────────────────────

/// The result of diffing a roster snapshot against the current directory.
///
/// Records in `updates` and `suspends` carry their full post-run state; the
/// store replaces the stored row wholesale. Applying a plan is all-or-nothing.
#[derive(Debug, Clone)]
pub struct ReconcilePlan {
  pub batch:    ImportBatch,
  pub creates:  Vec<DirectoryRecord>,
  pub updates:  Vec<DirectoryRecord>,
  pub suspends: Vec<DirectoryRecord>,
  pub entries:  Vec<ChangeLogEntry>,
}

impl ReconcilePlan {
  pub fn summary(&self) -> ReconcileSummary {
    ReconcileSummary {
      batch_id:  self.batch.batch_id,
      created:   self.creates.len(),
      updated:   self.updates.len(),
      suspended: self.suspends.len(),
    }
  }
}

/// Counts reported to the caller after a successful run.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ReconcileSummary {
  pub batch_id:  Uuid,
  /// Records created on first sight.
  pub created:   usize,
  /// Records with at least one field change or a reactivation.
  pub updated:   usize,
  pub suspended: usize,
}

// ─── Planner ─────────────────────────────────────────────────────────────────

/// Diff `roster` against `existing` and produce the minimal set of mutations.
///
/// Only system-managed records participate; custom records are invisible to
/// the diff and to the suspend pass. Incoming empty values never overwrite
/// stored data. No-op rows produce no entries but still count as seen, which
/// is what keeps an unchanged record from being suspended.
pub fn plan(
  existing: &[DirectoryRecord],
  roster: &[RosterRow],
  now: DateTime<Utc>,
) -> ReconcilePlan {
  let managed: HashMap<&str, &DirectoryRecord> = existing
    .iter()
    .filter(|r| r.is_managed())
    .map(|r| (r.identifier.as_str(), r))
    .collect();

  let batch = ImportBatch::new(now);
  let mut creates: Vec<DirectoryRecord> = Vec::new();
  let mut updates: Vec<DirectoryRecord> = Vec::new();
  let mut suspends: Vec<DirectoryRecord> = Vec::new();
  let mut entries: Vec<ChangeLogEntry> = Vec::new();
  let mut seen: HashSet<&str> = HashSet::new();

  for row in roster {
    // The parser only emits canonical identifiers; anything else would
    // collide with an operator-owned custom record, so ignore it outright.
    if !crate::identifier::is_managed(&row.identifier) {
      continue;
    }
    seen.insert(row.identifier.as_str());

    let Some(&current) = managed.get(row.identifier.as_str()) else {
      let rec = DirectoryRecord::from_roster(row, now);
      entries.push(ChangeLogEntry::for_batch(
        &batch,
        &rec.identifier,
        ChangeField::Create,
        None,
        None,
      ));
      creates.push(rec);
      continue;
    };

    let mut rec = current.clone();
    let mut changed = false;

    if !row.given_name.is_empty() && rec.given_name != row.given_name {
      entries.push(ChangeLogEntry::for_batch(
        &batch,
        &rec.identifier,
        ChangeField::GivenName,
        Some(rec.given_name.clone()),
        Some(row.given_name.clone()),
      ));
      rec.given_name = row.given_name.clone();
      changed = true;
    }

    if !row.family_name.is_empty() && rec.family_name != row.family_name {
      entries.push(ChangeLogEntry::for_batch(
        &batch,
        &rec.identifier,
        ChangeField::FamilyName,
        Some(rec.family_name.clone()),
        Some(row.family_name.clone()),
      ));
      rec.family_name = row.family_name.clone();
      changed = true;
    }

    // Display and sort names are derived from the incoming row, not from the
    // (possibly partially updated) stored names.
    let display = record::display_name(&row.given_name, &row.family_name);
    if !display.is_empty() && rec.display_name != display {
      entries.push(ChangeLogEntry::for_batch(
        &batch,
        &rec.identifier,
        ChangeField::DisplayName,
        Some(rec.display_name.clone()),
        Some(display.clone()),
      ));
      rec.display_name = display;
      changed = true;
    }

    let sortable = record::sort_name(&row.given_name, &row.family_name);
    if !sortable.is_empty() && rec.sort_name != sortable {
      entries.push(ChangeLogEntry::for_batch(
        &batch,
        &rec.identifier,
        ChangeField::SortName,
        Some(rec.sort_name.clone()),
        Some(sortable.clone()),
      ));
      rec.sort_name = sortable;
      changed = true;
    }

    if let Some(email) = row.email.as_deref().and_then(record::normalize_email)
      && rec.email.as_deref() != Some(email.as_str())
    {
      entries.push(ChangeLogEntry::for_batch(
        &batch,
        &rec.identifier,
        ChangeField::Email,
        rec.email.clone(),
        Some(email.clone()),
      ));
      // login_id mirrors email; the mirror is not separately logged.
      rec.email = Some(email.clone());
      rec.login_id = Some(email);
      changed = true;
    }

    if let Some(grade) = row.grade.as_deref().map(str::trim).filter(|g| !g.is_empty())
      && rec.grade.as_deref() != Some(grade)
    {
      entries.push(ChangeLogEntry::for_batch(
        &batch,
        &rec.identifier,
        ChangeField::Grade,
        rec.grade.clone(),
        Some(grade.to_owned()),
      ));
      rec.grade = Some(grade.to_owned());
      changed = true;
    }

    let mut reactivated = false;
    if !rec.status.is_active() {
      entries.push(ChangeLogEntry::for_batch(
        &batch,
        &rec.identifier,
        ChangeField::Status,
        Some(rec.status.as_str().to_owned()),
        Some(RecordStatus::Active.as_str().to_owned()),
      ));
      rec.status = RecordStatus::Active;
      rec.status_changed_at = now;
      reactivated = true;
    }

    if changed {
      rec.updated_at = now;
    }
    if changed || reactivated {
      updates.push(rec);
    }
  }

  // Suspend pass: managed records that dropped out of the snapshot.
  for current in existing.iter().filter(|r| r.is_managed()) {
    if seen.contains(current.identifier.as_str()) || !current.status.is_active()
    {
      continue;
    }
    let mut rec = current.clone();
    entries.push(ChangeLogEntry::for_batch(
      &batch,
      &rec.identifier,
      ChangeField::Status,
      Some(RecordStatus::Active.as_str().to_owned()),
      Some(RecordStatus::Suspended.as_str().to_owned()),
    ));
    rec.status = RecordStatus::Suspended;
    rec.status_changed_at = now;
    suspends.push(rec);
  }

  ReconcilePlan {
    batch,
    creates,
    updates,
    suspends,
    entries,
  }
}

// ─── Driver ──────────────────────────────────────────────────────────────────

/// Run one full reconciliation against `store`.
///
/// Loads the current directory, plans against the current time, and applies
/// the plan in one atomic store operation. On any store error nothing is
/// persisted; the caller retries with the whole snapshot.
pub async fn reconcile<S: DirectoryStore>(
  store: &S,
  roster: &[RosterRow],
) -> Result<ReconcileSummary, S::Error> {
  let existing = store.list_records().await?;
  let plan = plan(&existing, roster, Utc::now());
  store.apply(&plan).await?;
  Ok(plan.summary())
}

// ─── Tests ───────────────────────────────────────────────────────────────────
