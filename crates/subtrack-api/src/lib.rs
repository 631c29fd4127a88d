//! JSON REST API for subtrack.
//!
//! Exposes an axum [`Router`] backed by any
//! [`subtrack_core::store::SubscriptionStore`]. This is the validation
//! boundary: malformed months, ids and payloads are rejected here and never
//! reach the store. Transport concerns (tracing, request ids, shutdown) are the
//! caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .merge(subtrack_api::api_router(store.clone(), ApiConfig::default()))
//! ```

pub mod docs;
pub mod error;
pub mod subscriptions;
pub mod validate;

use std::{future::Future, sync::Arc, time::Duration};

use axum::{Router, routing::get};
use subtrack_core::store::{DEFAULT_LIST_LIMIT, SubscriptionStore};

pub use docs::ApiDoc;
pub use error::ApiError;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Request-layer limits.
#[derive(Debug, Clone)]
pub struct ApiConfig {
  /// Deadline applied to every store call.
  pub store_timeout: Duration,
  /// Page size when the caller gives none.
  pub default_limit: usize,
  /// Hard cap on page size.
  pub max_limit:     usize,
}

impl Default for ApiConfig {
  fn default() -> Self {
    Self {
      store_timeout: Duration::from_secs(5),
      default_limit: DEFAULT_LIST_LIMIT,
      max_limit:     200,
    }
  }
}

// ─── State ────────────────────────────────────────────────────────────────────

/// Shared state threaded through all handlers.
pub struct ApiState<S> {
  pub store:  Arc<S>,
  pub config: Arc<ApiConfig>,
}

impl<S> Clone for ApiState<S> {
  fn clone(&self) -> Self {
    Self { store: Arc::clone(&self.store), config: Arc::clone(&self.config) }
  }
}

impl<S: SubscriptionStore> ApiState<S> {
  /// Run a store call under the configured deadline. Expiry abandons the call
  /// and surfaces as [`ApiError::Timeout`], never as a data error.
  pub async fn within_deadline<T, F>(&self, call: F) -> Result<T, ApiError>
  where
    F: Future<Output = Result<T, S::Error>>,
  {
    let limit = self.config.store_timeout;
    match tokio::time::timeout(limit, call).await {
      Ok(result) => result.map_err(ApiError::from_store),
      Err(_) => {
        tracing::warn!(timeout = ?limit, "store call exceeded deadline");
        Err(ApiError::Timeout(limit))
      }
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be merged into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: Arc<S>, config: ApiConfig) -> Router<()>
where
  S: SubscriptionStore + 'static,
{
  let state = ApiState { store, config: Arc::new(config) };
  Router::new()
    .route(
      "/subscriptions",
      get(subscriptions::list::<S>).post(subscriptions::create::<S>),
    )
    .route("/subscriptions/summary", get(subscriptions::summary::<S>))
    .route(
      "/subscriptions/{id}",
      get(subscriptions::get_one::<S>)
        .put(subscriptions::update::<S>)
        .delete(subscriptions::delete_one::<S>),
    )
    .with_state(state)
}

// ─── Router tests ─────────────────────────────────────────────────────────────
