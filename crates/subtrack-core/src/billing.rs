//! Interval-overlap billing.
//!
//! A subscription is billed a full `price` for every calendar month of its
//! active range that falls inside the query window. There is no day-level
//! proration. Overlap is computed from the interval endpoints, so the cost of
//! a subscription is O(1) regardless of how wide the window is or whether the
//! subscription is open-ended.

use crate::{Error, Month, Result};

// ─── Inputs ──────────────────────────────────────────────────────────────────

/// The billing-relevant slice of a subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BillablePeriod {
  pub price: i64,
  pub start: Month,
  /// `None` means open-ended.
  pub end:   Option<Month>,
}

/// A closed `[from, to]` month range. Construction guarantees `from <= to`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BillingWindow {
  from: Month,
  to:   Month,
}

impl BillingWindow {
  pub fn new(from: Month, to: Month) -> Result<Self> {
    if to < from {
      return Err(Error::InvalidWindow { from, to });
    }
    Ok(Self { from, to })
  }

  pub fn from(&self) -> Month { self.from }

  pub fn to(&self) -> Month { self.to }

  /// Whether an active range `[start, end]` intersects the window at all.
  pub fn intersects(&self, start: Month, end: Option<Month>) -> bool {
    start <= self.to && end.is_none_or(|e| e >= self.from)
  }

  /// The intersection of `[start, end]` with the window, if any.
  pub fn overlap(&self, start: Month, end: Option<Month>) -> Option<(Month, Month)> {
    if !self.intersects(start, end) {
      return None;
    }
    let overlap_start = self.from.max(start);
    let overlap_end = end.map_or(self.to, |e| e.min(self.to));
    Some((overlap_start, overlap_end))
  }

  /// Months of `[start, end]` that fall inside the window, both ends counted.
  pub fn billed_months(&self, start: Month, end: Option<Month>) -> i64 {
    self
      .overlap(start, end)
      .map_or(0, |(first, last)| first.months_through(last))
  }

  /// `price * billed_months`, saturating rather than overflowing.
  pub fn contribution(&self, period: &BillablePeriod) -> i64 {
    period
      .price
      .saturating_mul(self.billed_months(period.start, period.end))
  }

  /// Sum of contributions. An empty input totals `0`.
  pub fn total<'a, I>(&self, periods: I) -> i64
  where
    I: IntoIterator<Item = &'a BillablePeriod>,
  {
    periods
      .into_iter()
      .fold(0_i64, |acc, p| acc.saturating_add(self.contribution(p)))
  }
}
