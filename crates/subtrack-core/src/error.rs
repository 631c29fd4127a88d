//! Error types for `subtrack-core`.

use thiserror::Error;

use crate::month::Month;

#[derive(Debug, Error)]
pub enum Error {
  #[error("invalid billing window: {to} is before {from}")]
  InvalidWindow { from: Month, to: Month },

  #[error("invalid month: {0}")]
  InvalidMonth(String),

  #[error("constraint violated: {0}")]
  Constraint(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

// ─── Classification ──────────────────────────────────────────────────────────

/// Backend-independent category of a store failure.
///
/// Not-found is never an error: stores report it as `None` or `false`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
  /// The record violates a store-level invariant.
  Constraint,
  /// A summary window whose `to` precedes its `from`.
  InvalidWindow,
  /// The caller abandoned the call before it completed; no write happened.
  Interrupted,
  /// I/O or connectivity failure; never retried by the store.
  Unavailable,
}

/// Implemented by every store error type so request layers can map failures
/// without knowing the backend.
pub trait Classify {
  fn kind(&self) -> ErrorKind;
}

impl Classify for Error {
  fn kind(&self) -> ErrorKind {
    match self {
      Error::InvalidWindow { .. } => ErrorKind::InvalidWindow,
      Error::InvalidMonth(_) | Error::Constraint(_) => ErrorKind::Constraint,
    }
  }
}
