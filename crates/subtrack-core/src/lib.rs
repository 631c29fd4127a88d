//! Core types and trait definitions for the subtrack subscription ledger.
//!
//! No HTTP or database dependencies. Billing arithmetic and filter
//! composition live here, and every backend shares them.

pub mod billing;
pub mod error;
pub mod filter;
pub mod month;
pub mod store;
pub mod subscription;

pub use error::{Classify, Error, ErrorKind, Result};
pub use month::Month;
