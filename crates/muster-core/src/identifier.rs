//! Canonical identifier handling.
//!
//! System-managed records carry identifiers of the form `u` followed by six
//! digits (`u000042`), produced from the numeric id column of the SIS
//! export. Any other identifier belongs to a custom record, which
//! reconciliation never touches.

/// Width of the numeric part of a canonical identifier.
const WIDTH: usize = 6;

/// Normalise a raw numeric id into its canonical form (`"42"` → `"u000042"`).
///
/// Returns `None` when the input is not a decimal integer or does not fit
/// the fixed width. Callers are expected to skip such rows.
pub fn format(raw: &str) -> Option<String> {
  let num: u64 = raw.trim().parse().ok()?;
  if num >= 10u64.pow(WIDTH as u32) {
    return None;
  }
  Some(format!("u{num:0width$}", width = WIDTH))
}

/// True iff `id` is a system-managed identifier.
pub fn is_managed(id: &str) -> bool {
  let Some(digits) = id.strip_prefix('u') else {
    return false;
  };
  digits.len() == WIDTH && digits.bytes().all(|b| b.is_ascii_digit())
}
