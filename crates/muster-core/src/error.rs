//! Error types for `muster-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// A custom record may not carry a system-managed identifier — the next
  /// roster import would adopt or suspend it.
  #[error("identifier {0:?} is reserved for system-managed records")]
  ReservedIdentifier(String),

  #[error("identifier must not be empty")]
  EmptyIdentifier,

  #[error("unknown change-log field: {0:?}")]
  UnknownChangeField(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
