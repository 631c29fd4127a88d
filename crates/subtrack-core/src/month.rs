//! Calendar month — the unit of subscription activity and billing.
//!
//! Day-of-month carries no meaning anywhere in subtrack: a month always
//! stands for its first day.

use std::{fmt, str::FromStr};

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// A (year, month) pair. Ordering is chronological.
///
/// The wire form is `MM-YYYY`, e.g. `"07-2025"`.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(try_from = "String", into = "String")]
pub struct Month {
  // Field order matters: the derived `Ord` compares year first.
  year:  i32,
  month: u32,
}

impl Month {
  pub const MIN_YEAR: i32 = 1;
  pub const MAX_YEAR: i32 = 9999;

  pub fn new(year: i32, month: u32) -> Result<Self> {
    if !(1..=12).contains(&month) {
      return Err(Error::InvalidMonth(format!("month {month} out of range 1..=12")));
    }
    if !(Self::MIN_YEAR..=Self::MAX_YEAR).contains(&year) {
      return Err(Error::InvalidMonth(format!("year {year} out of range")));
    }
    Ok(Self { year, month })
  }

  /// Truncate a date to its month.
  pub fn from_date(date: NaiveDate) -> Result<Self> {
    Self::new(date.year(), date.month())
  }

  pub fn year(self) -> i32 { self.year }

  pub fn month(self) -> u32 { self.month }

  /// Months since year 0, used for O(1) interval arithmetic.
  fn ordinal(self) -> i64 { i64::from(self.year) * 12 + i64::from(self.month) - 1 }

  /// Number of months in `[self, end]`, counting both ends.
  ///
  /// Zero or negative when `end` precedes `self`.
  pub fn months_through(self, end: Month) -> i64 { end.ordinal() - self.ordinal() + 1 }
}

impl fmt::Display for Month {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{:02}-{:04}", self.month, self.year)
  }
}

impl FromStr for Month {
  type Err = Error;

  /// Parse `MM-YYYY`. A single-digit month (`7-2025`) is accepted.
  fn from_str(s: &str) -> Result<Self> {
    let (mm, yyyy) = s
      .trim()
      .split_once('-')
      .ok_or_else(|| Error::InvalidMonth(format!("{s:?}: expected MM-YYYY")))?;

    let month: u32 = mm
      .parse()
      .map_err(|_| Error::InvalidMonth(format!("{s:?}: bad month")))?;
    let year: i32 = yyyy
      .parse()
      .map_err(|_| Error::InvalidMonth(format!("{s:?}: bad year")))?;

    Self::new(year, month)
  }
}

impl TryFrom<String> for Month {
  type Error = Error;

  fn try_from(s: String) -> Result<Self> { s.parse() }
}

impl From<Month> for String {
  fn from(m: Month) -> Self { m.to_string() }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn m(year: i32, month: u32) -> Month { Month::new(year, month).unwrap() }

  #[test]
  fn parses_mm_yyyy() {
    assert_eq!("01-2024".parse::<Month>().unwrap(), m(2024, 1));
    assert_eq!("12-1999".parse::<Month>().unwrap(), m(1999, 12));
    assert_eq!("7-2025".parse::<Month>().unwrap(), m(2025, 7));
  }

  #[test]
  fn rejects_malformed_months() {
    for bad in ["", "2024-01-01", "13-2024", "00-2024", "ab-2024", "01-0", "01/2024"] {
      assert!(bad.parse::<Month>().is_err(), "{bad:?} should not parse");
    }
  }

  #[test]
  fn display_is_zero_padded() {
    assert_eq!(m(2024, 3).to_string(), "03-2024");
  }

  #[test]
  fn ordering_is_chronological() {
    assert!(m(2023, 12) < m(2024, 1));
    assert!(m(2024, 2) > m(2024, 1));
  }

  #[test]
  fn months_through_is_inclusive() {
    assert_eq!(m(2024, 1).months_through(m(2024, 1)), 1);
    assert_eq!(m(2024, 1).months_through(m(2024, 3)), 3);
    assert_eq!(m(2023, 11).months_through(m(2024, 2)), 4);
    assert_eq!(m(2024, 5).months_through(m(2024, 4)), 0);
  }

  #[test]
  fn from_date_truncates_day() {
    let d = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
    let month = Month::from_date(d).unwrap();
    assert_eq!(month, m(2024, 2));
    assert_eq!((month.year(), month.month()), (2024, 2));
  }

  #[test]
  fn serde_uses_wire_form() {
    let json = serde_json::to_string(&m(2024, 6)).unwrap();
    assert_eq!(json, "\"06-2024\"");
    let back: Month = serde_json::from_str(&json).unwrap();
    assert_eq!(back, m(2024, 6));
    assert!(serde_json::from_str::<Month>("\"2024-06\"").is_err());
  }
}
