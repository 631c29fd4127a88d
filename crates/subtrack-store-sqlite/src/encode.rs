//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as fixed-width RFC 3339 strings (nanosecond
//! precision, `Z` suffix) so lexical order equals chronological order. Months
//! are stored as `YYYY-MM-01`, which sorts the same way. UUIDs are stored as
//! hyphenated lowercase strings.

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use subtrack_core::{Month, billing::BillablePeriod, subscription::Subscription};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Month ───────────────────────────────────────────────────────────────────

pub fn encode_month(m: Month) -> String {
  format!("{:04}-{:02}-01", m.year(), m.month())
}

pub fn decode_month(s: &str) -> Result<Month> {
  let date = NaiveDate::parse_from_str(s, "%Y-%m-%d")
    .map_err(|e| Error::DateParse(format!("{s:?}: {e}")))?;
  Month::from_date(date).map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Column list matching the field order of [`RawSubscription::from_row`].
pub const SUBSCRIPTION_COLUMNS: &str =
  "id, service_name, price, user_id, start_date, end_date, created_at, updated_at";

/// Raw values read directly from a `subscriptions` row.
pub struct RawSubscription {
  pub id:           String,
  pub service_name: String,
  pub price:        i64,
  pub user_id:      String,
  pub start_date:   String,
  pub end_date:     Option<String>,
  pub created_at:   String,
  pub updated_at:   String,
}

impl RawSubscription {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:           row.get(0)?,
      service_name: row.get(1)?,
      price:        row.get(2)?,
      user_id:      row.get(3)?,
      start_date:   row.get(4)?,
      end_date:     row.get(5)?,
      created_at:   row.get(6)?,
      updated_at:   row.get(7)?,
    })
  }

  pub fn into_subscription(self) -> Result<Subscription> {
    Ok(Subscription {
      id:           decode_uuid(&self.id)?,
      service_name: self.service_name,
      price:        self.price,
      user_id:      decode_uuid(&self.user_id)?,
      start_date:   decode_month(&self.start_date)?,
      end_date:     self.end_date.as_deref().map(decode_month).transpose()?,
      created_at:   decode_dt(&self.created_at)?,
      updated_at:   decode_dt(&self.updated_at)?,
    })
  }
}

/// Raw `price, start_date, end_date` columns fetched for billing.
pub struct RawBillable {
  pub price:      i64,
  pub start_date: String,
  pub end_date:   Option<String>,
}

impl RawBillable {
  pub fn into_period(self) -> Result<BillablePeriod> {
    Ok(BillablePeriod {
      price: self.price,
      start: decode_month(&self.start_date)?,
      end:   self.end_date.as_deref().map(decode_month).transpose()?,
    })
  }
}
