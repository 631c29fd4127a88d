//! Request validation: turns loosely-typed query strings and JSON bodies into
//! the typed values the store expects.
//!
//! Nothing malformed gets past this module: months are parsed from `MM-YYYY`,
//! ids from UUID strings, service names are trimmed, and the end-before-start
//! invariant is checked here first.

use serde::Deserialize;
use subtrack_core::{Month, subscription::NewSubscription};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::ApiError;

// ─── Body ────────────────────────────────────────────────────────────────────

/// JSON body accepted by `POST /subscriptions` and `PUT /subscriptions/{id}`.
///
/// Every field is optional at the serde level so that a missing field yields
/// `"missing required fields"` rather than a deserialisation error.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct SubscriptionPayload {
  #[serde(default)]
  #[schema(example = "Yandex Plus")]
  pub service_name: Option<String>,
  #[serde(default)]
  #[schema(example = 400)]
  pub price:        Option<i64>,
  /// UUID string.
  #[serde(default)]
  #[schema(example = "60601fee-2bf1-4721-ae6f-7636e79a0cba")]
  pub user_id:      Option<String>,
  /// `MM-YYYY`.
  #[serde(default)]
  #[schema(example = "07-2025")]
  pub start_date:   Option<String>,
  /// `MM-YYYY`, `null`, or `""` for open-ended.
  #[serde(default)]
  pub end_date:     Option<String>,
}

impl SubscriptionPayload {
  pub fn validate(self) -> Result<NewSubscription, ApiError> {
    let service_name = self.service_name.as_deref().map(str::trim).unwrap_or_default();
    let user_id = self.user_id.as_deref().map(str::trim).unwrap_or_default();
    let start_date = self.start_date.as_deref().map(str::trim).unwrap_or_default();

    if service_name.is_empty() || user_id.is_empty() || start_date.is_empty() {
      return Err(bad("missing required fields"));
    }
    let price = self.price.ok_or_else(|| bad("missing required fields"))?;
    if price < 0 {
      return Err(bad("price must not be negative"));
    }

    let user_id = Uuid::parse_str(user_id).map_err(|_| bad("bad user_id"))?;
    let start_date: Month = start_date
      .parse()
      .map_err(|_| bad("bad start_date, use MM-YYYY"))?;
    let end_date = match self.end_date.as_deref().map(str::trim) {
      None | Some("") => None,
      Some(raw) => Some(
        raw
          .parse::<Month>()
          .map_err(|_| bad("bad end_date, use MM-YYYY"))?,
      ),
    };
    if let Some(end) = end_date
      && end < start_date
    {
      return Err(bad("end_date before start_date"));
    }

    Ok(NewSubscription {
      service_name: service_name.to_owned(),
      price,
      user_id,
      start_date,
      end_date,
    })
  }
}

// ─── Query-string helpers ────────────────────────────────────────────────────

/// Parse a path id.
pub fn parse_id(raw: &str) -> Result<Uuid, ApiError> {
  Uuid::parse_str(raw.trim()).map_err(|_| bad("bad id"))
}

/// Blank or absent means "no filter".
pub fn optional_user_id(raw: Option<&str>) -> Result<Option<Uuid>, ApiError> {
  match raw.map(str::trim) {
    None | Some("") => Ok(None),
    Some(s) => Uuid::parse_str(s).map(Some).map_err(|_| bad("bad user_id")),
  }
}

/// Blank or absent means "no filter"; otherwise trimmed.
pub fn optional_service_name(raw: Option<&str>) -> Option<String> {
  raw.map(str::trim).filter(|s| !s.is_empty()).map(str::to_owned)
}

/// Parse a required `MM-YYYY` query parameter.
pub fn required_month(raw: Option<&str>, name: &str) -> Result<Month, ApiError> {
  let raw = raw
    .map(str::trim)
    .filter(|s| !s.is_empty())
    .ok_or_else(|| bad("from/to required MM-YYYY"))?;
  raw.parse().map_err(|_| bad(&format!("bad {name}")))
}

/// Lenient page-size parsing: absent, unparsable or non-positive values fall
/// back to `default`; values above `max` are clamped.
pub fn page_limit(raw: Option<&str>, default: usize, max: usize) -> usize {
  match raw.and_then(|s| s.trim().parse::<i64>().ok()) {
    Some(v) if v > 0 => usize::try_from(v).map_or(max, |v| v.min(max)),
    _ => default.min(max),
  }
}

/// Lenient offset parsing: anything but a non-negative integer means `0`.
pub fn page_offset(raw: Option<&str>) -> usize {
  raw
    .and_then(|s| s.trim().parse::<i64>().ok())
    .and_then(|v| usize::try_from(v).ok())
    .unwrap_or(0)
}

fn bad(message: &str) -> ApiError { ApiError::BadRequest(message.to_owned()) }

#[cfg(test)]
mod tests {
  use super::*;

  fn payload() -> SubscriptionPayload {
    SubscriptionPayload {
      service_name: Some("  Yandex Plus ".into()),
      price:        Some(400),
      user_id:      Some("60601fee-2bf1-4721-ae6f-7636e79a0cba".into()),
      start_date:   Some("07-2025".into()),
      end_date:     None,
    }
  }

  fn message(err: ApiError) -> String {
    match err {
      ApiError::BadRequest(m) => m,
      other => panic!("expected BadRequest, got {other:?}"),
    }
  }

  #[test]
  fn valid_payload_is_trimmed_and_typed() {
    let s = payload().validate().unwrap();
    assert_eq!(s.service_name, "Yandex Plus");
    assert_eq!(s.price, 400);
    assert_eq!(s.start_date, Month::new(2025, 7).unwrap());
    assert!(s.end_date.is_none());
  }

  #[test]
  fn empty_end_date_means_open_ended() {
    let mut p = payload();
    p.end_date = Some("".into());
    assert!(p.validate().unwrap().end_date.is_none());
  }

  #[test]
  fn missing_fields_are_reported_together() {
    for strip in 0..4 {
      let mut p = payload();
      match strip {
        0 => p.service_name = Some("   ".into()),
        1 => p.price = None,
        2 => p.user_id = None,
        _ => p.start_date = Some(String::new()),
      }
      assert_eq!(message(p.validate().unwrap_err()), "missing required fields");
    }
  }

  #[test]
  fn field_specific_errors() {
    let mut p = payload();
    p.user_id = Some("not-a-uuid".into());
    assert_eq!(message(p.validate().unwrap_err()), "bad user_id");

    let mut p = payload();
    p.start_date = Some("2025-07".into());
    assert_eq!(message(p.validate().unwrap_err()), "bad start_date, use MM-YYYY");

    let mut p = payload();
    p.end_date = Some("13-2025".into());
    assert_eq!(message(p.validate().unwrap_err()), "bad end_date, use MM-YYYY");

    let mut p = payload();
    p.end_date = Some("06-2025".into());
    assert_eq!(message(p.validate().unwrap_err()), "end_date before start_date");

    let mut p = payload();
    p.price = Some(-5);
    assert_eq!(message(p.validate().unwrap_err()), "price must not be negative");
  }

  #[test]
  fn filters_treat_blank_as_absent() {
    assert_eq!(optional_user_id(Some("  ")).unwrap(), None);
    assert!(optional_user_id(Some("nope")).is_err());
    assert_eq!(optional_service_name(Some(" Netflix ")), Some("Netflix".into()));
    assert_eq!(optional_service_name(Some("")), None);
  }

  #[test]
  fn paging_is_lenient() {
    assert_eq!(page_limit(None, 50, 200), 50);
    assert_eq!(page_limit(Some("abc"), 50, 200), 50);
    assert_eq!(page_limit(Some("0"), 50, 200), 50);
    assert_eq!(page_limit(Some("-3"), 50, 200), 50);
    assert_eq!(page_limit(Some("20"), 50, 200), 20);
    assert_eq!(page_limit(Some("5000"), 50, 200), 200);

    assert_eq!(page_offset(None), 0);
    assert_eq!(page_offset(Some("-1")), 0);
    assert_eq!(page_offset(Some("15")), 15);
  }

  #[test]
  fn summary_months() {
    assert_eq!(required_month(Some("01-2024"), "from").unwrap(), Month::new(2024, 1).unwrap());
    assert_eq!(message(required_month(None, "from").unwrap_err()), "from/to required MM-YYYY");
    assert_eq!(message(required_month(Some("2024"), "to").unwrap_err()), "bad to");
  }
}
