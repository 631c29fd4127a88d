//! Error type for `subtrack-store-sqlite`.

use subtrack_core::{Classify, ErrorKind};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] subtrack_core::Error),

  /// A schema `CHECK`/`NOT NULL`/`UNIQUE` constraint rejected the write.
  #[error("constraint violated: {0}")]
  Constraint(String),

  /// The caller dropped the call before it finished; nothing was written.
  #[error("store call interrupted")]
  Interrupted,

  #[error("storage unavailable: {0}")]
  Unavailable(#[source] tokio_rusqlite::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),
}

impl From<tokio_rusqlite::Error> for Error {
  fn from(e: tokio_rusqlite::Error) -> Self {
    if let tokio_rusqlite::Error::Rusqlite(inner) = &e {
      match inner.sqlite_error_code() {
        Some(rusqlite::ErrorCode::ConstraintViolation) => {
          return Error::Constraint(inner.to_string());
        }
        Some(rusqlite::ErrorCode::OperationInterrupted) => return Error::Interrupted,
        _ => {}
      }
    }
    Error::Unavailable(e)
  }
}

impl Classify for Error {
  fn kind(&self) -> ErrorKind {
    match self {
      Error::Core(e) => e.kind(),
      Error::Constraint(_) => ErrorKind::Constraint,
      Error::Interrupted => ErrorKind::Interrupted,
      // Undecodable rows mean the storage itself is unhealthy.
      Error::Unavailable(_) | Error::Uuid(_) | Error::DateParse(_) => {
        ErrorKind::Unavailable
      }
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
