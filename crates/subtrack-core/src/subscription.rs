//! Subscription — the sole entity of the ledger.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{Error, Month, Result, billing::BillablePeriod};

// ─── Subscription ────────────────────────────────────────────────────────────

/// A persisted subscription. `id`, `created_at` and `updated_at` are owned by
/// the store; everything else is replaced wholesale on update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Subscription {
  pub id:           Uuid,
  #[schema(example = "Yandex Plus")]
  pub service_name: String,
  /// Flat monthly rate in the smallest whole currency unit.
  #[schema(example = 400)]
  pub price:        i64,
  pub user_id:      Uuid,
  #[schema(value_type = String, example = "07-2025")]
  pub start_date:   Month,
  /// `null` means still active.
  #[schema(value_type = Option<String>, example = "12-2025")]
  pub end_date:     Option<Month>,
  pub created_at:   DateTime<Utc>,
  pub updated_at:   DateTime<Utc>,
}

impl Subscription {
  /// The caller-supplied fields, as they would be passed back to `update`.
  pub fn fields(&self) -> NewSubscription {
    NewSubscription {
      service_name: self.service_name.clone(),
      price:        self.price,
      user_id:      self.user_id,
      start_date:   self.start_date,
      end_date:     self.end_date,
    }
  }

  pub fn billable_period(&self) -> BillablePeriod {
    BillablePeriod {
      price: self.price,
      start: self.start_date,
      end:   self.end_date,
    }
  }
}

// ─── NewSubscription ─────────────────────────────────────────────────────────

/// Input to [`crate::store::SubscriptionStore::create`] and
/// [`crate::store::SubscriptionStore::update`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSubscription {
  pub service_name: String,
  pub price:        i64,
  pub user_id:      Uuid,
  pub start_date:   Month,
  pub end_date:     Option<Month>,
}

impl NewSubscription {
  pub fn new(
    service_name: impl Into<String>,
    price: i64,
    user_id: Uuid,
    start_date: Month,
  ) -> Self {
    Self {
      service_name: service_name.into(),
      price,
      user_id,
      start_date,
      end_date: None,
    }
  }

  pub fn ending(mut self, end_date: Month) -> Self {
    self.end_date = Some(end_date);
    self
  }

  /// Check the invariants a store must refuse to persist.
  ///
  /// The request layer rejects these earlier with friendlier messages; this
  /// is the last line before storage.
  pub fn validate(&self) -> Result<()> {
    if self.service_name.trim().is_empty() {
      return Err(Error::Constraint("service_name must not be empty".into()));
    }
    if self.service_name.trim() != self.service_name {
      return Err(Error::Constraint(
        "service_name must not carry surrounding whitespace".into(),
      ));
    }
    if self.price < 0 {
      return Err(Error::Constraint(format!("price {} is negative", self.price)));
    }
    if let Some(end) = self.end_date
      && end < self.start_date
    {
      return Err(Error::Constraint(format!(
        "end_date {end} precedes start_date {}",
        self.start_date
      )));
    }
    Ok(())
  }
}
