//! SIS export parser.
//!
//! The export is delimited text with a header row. Column positions are
//! resolved by header name, so extra or reordered columns are harmless.

use std::collections::HashMap;

use csv::ReaderBuilder;
use muster_core::{identifier, record::{self, RosterRow}};

use crate::{Error, ParsedRoster, Result};

/// UTF-8 BOM bytes; some SIS exports lead with one.
const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

const COL_USER_ID: &str = "USER ID";
const COL_NAME: &str = "NAME";
const COL_SURNAME: &str = "SURNAME";
const COL_EMAIL: &str = "EMAIL";
const COL_GRADE: &str = "CLASS LEVEL";

pub(crate) fn parse(data: &[u8]) -> Result<ParsedRoster> {
  let data = data.strip_prefix(UTF8_BOM).unwrap_or(data);

  // Rows shorter than the header are common in hand-edited exports.
  let mut reader = ReaderBuilder::new().flexible(true).from_reader(data);

  let headers = reader.headers()?.clone();
  let column = |name: &str| headers.iter().position(|h| h.trim() == name);

  let id_col = column(COL_USER_ID).ok_or(Error::MissingColumn(COL_USER_ID))?;
  let name_col = column(COL_NAME);
  let surname_col = column(COL_SURNAME);
  let email_col = column(COL_EMAIL);
  let grade_col = column(COL_GRADE);

  let mut rows: Vec<RosterRow> = Vec::new();
  let mut by_id: HashMap<String, usize> = HashMap::new();
  let mut skipped = 0usize;

  for result in reader.records() {
    let raw = result?;
    let cell =
      |col: Option<usize>| col.and_then(|i| raw.get(i)).unwrap_or("").trim();

    let Some(id) = identifier::format(raw.get(id_col).unwrap_or("")) else {
      skipped += 1;
      continue;
    };

    let row = RosterRow {
      identifier:  id.clone(),
      given_name:  cell(name_col).to_owned(),
      family_name: cell(surname_col).to_owned(),
      email:       record::normalize_email(cell(email_col)),
      grade:       non_empty(cell(grade_col)),
    };

    // Last occurrence of a duplicated id wins, in the first occurrence's
    // position.
    match by_id.get(&id) {
      Some(&i) => rows[i] = row,
      None => {
        by_id.insert(id, rows.len());
        rows.push(row);
      }
    }
  }

  Ok(ParsedRoster { rows, skipped })
}

fn non_empty(s: &str) -> Option<String> {
  if s.is_empty() { None } else { Some(s.to_owned()) }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
