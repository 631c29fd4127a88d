//! The `SubscriptionStore` trait and supporting query types.
//!
//! The trait is implemented by storage backends (e.g. `subtrack-store-sqlite`).
//! The request layer (`subtrack-api`) depends on this abstraction, not on any
//! concrete backend.

use std::future::Future;

use uuid::Uuid;

use crate::{
  Classify, Month,
  filter::SubscriptionFilter,
  subscription::{NewSubscription, Subscription},
};

// ─── Query type ──────────────────────────────────────────────────────────────

/// Page size used when the caller passes `limit == 0`.
pub const DEFAULT_LIST_LIMIT: usize = 50;

/// Parameters for [`SubscriptionStore::list`].
#[derive(Debug, Clone, Default)]
pub struct ListQuery {
  pub filter: SubscriptionFilter,
  /// Maximum rows returned; `0` means [`DEFAULT_LIST_LIMIT`]. Upper bounds are
  /// the request layer's business.
  pub limit:  usize,
  /// Leading rows to skip.
  pub offset: usize,
}

impl ListQuery {
  pub fn new(filter: SubscriptionFilter) -> Self {
    Self { filter, ..Default::default() }
  }

  pub fn effective_limit(&self) -> usize {
    if self.limit == 0 { DEFAULT_LIST_LIMIT } else { self.limit }
  }
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a subscription store backend.
///
/// Every method is a single atomic unit; there are no cross-call
/// transactions. Concurrent writers to one id are last-writer-wins.
/// Not-found is reported as `None`/`false`, never as an error.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`). Dropping a future abandons the
/// call, which is how request-layer deadlines are enforced.
pub trait SubscriptionStore: Send + Sync {
  type Error: std::error::Error + Classify + Send + Sync + 'static;

  /// Persist a new subscription; the store assigns `id`, `created_at` and
  /// `updated_at`.
  fn create(
    &self,
    input: NewSubscription,
  ) -> impl Future<Output = Result<Subscription, Self::Error>> + Send + '_;

  /// Retrieve a subscription by id. Returns `None` if not found.
  fn get(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Subscription>, Self::Error>> + Send + '_;

  /// Replace every mutable field and refresh `updated_at`.
  /// Returns `false` if `id` does not exist.
  fn update(
    &self,
    id: Uuid,
    input: NewSubscription,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Returns `false` if `id` does not exist.
  fn delete(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Matching subscriptions, newest-created first, windowed by
  /// `limit`/`offset`.
  fn list<'a>(
    &'a self,
    query: &'a ListQuery,
  ) -> impl Future<Output = Result<Vec<Subscription>, Self::Error>> + Send + 'a;

  /// Total billed across `[from, to]` for subscriptions matching `filter`.
  /// See [`crate::billing::BillingWindow::total`].
  ///
  /// Fails with an `InvalidWindow` error when `to` precedes `from`.
  fn summary<'a>(
    &'a self,
    from: Month,
    to: Month,
    filter: &'a SubscriptionFilter,
  ) -> impl Future<Output = Result<i64, Self::Error>> + Send + 'a;

  /// Cheap round-trip to the backend, for health checks.
  fn ping(&self) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}
