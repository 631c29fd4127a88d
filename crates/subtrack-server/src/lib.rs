//! HTTP server assembly for subtrack.
//!
//! Mounts the [`subtrack_api`] router next to a `/healthz` probe and the
//! Swagger UI, then wraps everything in the transport middleware: request ids,
//! request tracing and panic recovery.

use std::{path::PathBuf, sync::Arc, time::Duration};

use axum::{
  Router,
  extract::State,
  http::{Request, StatusCode},
  response::IntoResponse,
  routing::get,
};
use serde::Deserialize;
use subtrack_api::{ApiConfig, ApiDoc, ApiState, api_router};
use subtrack_core::store::SubscriptionStore;
use tower_http::{
  catch_panic::CatchPanicLayer,
  request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
  trace::TraceLayer,
};
use utoipa::OpenApi as _;
use utoipa_swagger_ui::SwaggerUi;

/// Where the generated OpenAPI document is served.
pub const OPENAPI_PATH: &str = "/api-docs/openapi.json";

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `SUBTRACK_*` environment variables. Every field has a default.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
  pub host:                String,
  pub port:                u16,
  pub store_path:          PathBuf,
  /// Deadline for a single store call, in milliseconds.
  pub store_timeout_ms:    u64,
  pub default_limit:       usize,
  pub max_limit:           usize,
  /// How long in-flight requests may run after a shutdown signal.
  pub shutdown_grace_secs: u64,
}

impl Default for ServerConfig {
  fn default() -> Self {
    let api = ApiConfig::default();
    Self {
      host:                "0.0.0.0".to_owned(),
      port:                8080,
      store_path:          PathBuf::from("subscriptions.db"),
      store_timeout_ms:    5000,
      default_limit:       api.default_limit,
      max_limit:           api.max_limit,
      shutdown_grace_secs: 10,
    }
  }
}

impl ServerConfig {
  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }

  pub fn shutdown_grace(&self) -> Duration {
    Duration::from_secs(self.shutdown_grace_secs)
  }

  pub fn api_config(&self) -> ApiConfig {
    ApiConfig {
      store_timeout: Duration::from_millis(self.store_timeout_ms),
      default_limit: self.default_limit,
      max_limit:     self.max_limit.max(1),
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the complete application router for `store`.
pub fn router<S>(store: Arc<S>, config: &ServerConfig) -> Router
where
  S: SubscriptionStore + 'static,
{
  let api = config.api_config();
  let health = Router::new()
    .route("/healthz", get(healthz::<S>))
    .with_state(ApiState { store: Arc::clone(&store), config: Arc::new(api.clone()) });

  Router::new()
    .merge(api_router(store, api))
    .merge(health)
    .merge(SwaggerUi::new("/swagger").url(OPENAPI_PATH, ApiDoc::openapi()))
    .layer(CatchPanicLayer::new())
    .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<_>| {
      let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("-");

      tracing::info_span!(
        "http_request",
        request_id = %request_id,
        method = %request.method(),
        uri = %request.uri(),
      )
    }))
    .layer(PropagateRequestIdLayer::x_request_id())
    .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
}

/// `GET /healthz` — 200 `ok` when the store answers a ping in time.
async fn healthz<S>(State(state): State<ApiState<S>>) -> impl IntoResponse
where
  S: SubscriptionStore,
{
  match state.within_deadline(state.store.ping()).await {
    Ok(()) => (StatusCode::OK, "ok"),
    Err(e) => {
      tracing::warn!(error = %e, "health check failed");
      (StatusCode::SERVICE_UNAVAILABLE, "unavailable")
    }
  }
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use super::*;

  use axum::body::Body;
  use subtrack_store_sqlite::SqliteStore;
  use tower::ServiceExt as _;

  async fn app() -> Router {
    let store = SqliteStore::open_in_memory().await.unwrap();
    router(Arc::new(store), &ServerConfig::default())
  }

  fn get_req(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
  }

  #[test]
  fn defaults_match_documented_values() {
    let c = ServerConfig::default();
    assert_eq!(c.address(), "0.0.0.0:8080");
    assert_eq!(c.store_path, PathBuf::from("subscriptions.db"));
    assert_eq!(c.shutdown_grace(), Duration::from_secs(10));

    let api = c.api_config();
    assert_eq!(api.store_timeout, Duration::from_secs(5));
    assert_eq!(api.default_limit, 50);
    assert_eq!(api.max_limit, 200);
  }

  #[test]
  fn partial_config_keeps_defaults() {
    let settings = config::Config::builder()
      .set_override("port", 9090)
      .unwrap()
      .set_override("store_path", "/tmp/subs.db")
      .unwrap()
      .build()
      .unwrap();
    let c: ServerConfig = settings.try_deserialize().unwrap();
    assert_eq!(c.port, 9090);
    assert_eq!(c.store_path, PathBuf::from("/tmp/subs.db"));
    assert_eq!(c.host, "0.0.0.0");
    assert_eq!(c.max_limit, 200);
  }

  #[tokio::test]
  async fn healthz_reports_ok() {
    let resp = app().await.oneshot(get_req("/healthz")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&body[..], b"ok");
  }

  #[tokio::test]
  async fn responses_carry_a_request_id() {
    let resp = app().await.oneshot(get_req("/subscriptions")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.headers().contains_key("x-request-id"));
  }

  #[tokio::test]
  async fn caller_request_id_is_echoed() {
    let req = Request::builder()
      .uri("/healthz")
      .header("x-request-id", "abc-123")
      .body(Body::empty())
      .unwrap();
    let resp = app().await.oneshot(req).await.unwrap();
    assert_eq!(resp.headers()["x-request-id"], "abc-123");
  }

  #[tokio::test]
  async fn openapi_document_is_served() {
    let resp = app().await.oneshot(get_req(OPENAPI_PATH)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let doc: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert!(doc["openapi"].is_string());
    assert!(doc["paths"]["/subscriptions/summary"]["get"].is_object());
  }

  #[tokio::test]
  async fn swagger_ui_is_mounted() {
    let resp = app().await.oneshot(get_req("/swagger/")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
  }

  #[tokio::test]
  async fn api_routes_are_mounted() {
    let resp = app()
      .await
      .oneshot(get_req("/subscriptions/summary?from=01-2024&to=12-2024"))
      .await
      .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(value["total"], 0);
  }
}
