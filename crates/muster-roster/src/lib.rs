//! SIS CSV codec for muster.
//!
//! Converts between the SIS export format and [`muster_core`] domain types.
//! Pure synchronous; no database dependencies.
//!
//! # Quick start
//!
//! ```
//! let data = "USER ID,NAME,SURNAME,EMAIL,CLASS LEVEL\n\
//!             42,Alice,Smith,Alice@X.org,10\n";
//! let parsed = muster_roster::parse(data.as_bytes()).unwrap();
//! assert_eq!(parsed.rows[0].identifier, "u000042");
//! ```

pub mod error;
mod parse;
mod serialize;

pub use error::{Error, Result};
use muster_core::record::{DirectoryRecord, RosterRow};

// ─── Public types ────────────────────────────────────────────────────────────

/// The result of parsing one SIS export file.
#[derive(Debug)]
pub struct ParsedRoster {
  /// Validated rows, deduplicated by identifier (last occurrence wins).
  pub rows:    Vec<RosterRow>,
  /// Data rows dropped because their id column did not normalise to a
  /// canonical identifier.
  pub skipped: usize,
}

// ─── Public API ──────────────────────────────────────────────────────────────

/// Parse an SIS export (UTF-8, optional BOM, header row) into roster rows.
///
/// The `USER ID` column is required; `NAME`, `SURNAME`, `EMAIL`, and
/// `CLASS LEVEL` are read when present. Rows with an unusable id are counted
/// in [`ParsedRoster::skipped`] rather than failing the whole file.
pub fn parse(data: &[u8]) -> Result<ParsedRoster> { parse::parse(data) }

/// Serialize directory records as the canonical directory export CSV.
pub fn to_csv(records: &[DirectoryRecord]) -> Result<String> {
  serialize::to_csv(records)
}
