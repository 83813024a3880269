//! Error type for `muster-store-sqlite`.

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] muster_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  #[error("unknown record status: {0:?}")]
  UnknownStatus(String),

  /// Attempted to delete a batch that does not exist.
  #[error("import batch not found: {0}")]
  BatchNotFound(Uuid),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
