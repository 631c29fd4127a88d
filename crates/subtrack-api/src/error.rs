//! API error type and [`axum::response::IntoResponse`] implementation.

use std::time::Duration;

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use subtrack_core::{Classify, ErrorKind};
use thiserror::Error;
use utoipa::ToSchema;

/// JSON body of every error response.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
  #[schema(example = "missing required fields")]
  pub error: String,
}

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  /// The store refused a record the request layer let through.
  #[error("constraint violated: {0}")]
  Constraint(String),

  #[error("store did not answer within {0:?}")]
  Timeout(Duration),

  /// The store gave up on the call before completing it.
  #[error("store call interrupted")]
  Interrupted,

  #[error("store unavailable: {0}")]
  Unavailable(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  /// Map a backend error by its [`ErrorKind`].
  pub fn from_store<E>(e: E) -> Self
  where
    E: std::error::Error + Classify + Send + Sync + 'static,
  {
    match e.kind() {
      ErrorKind::InvalidWindow => ApiError::BadRequest(e.to_string()),
      ErrorKind::Constraint => ApiError::Constraint(e.to_string()),
      ErrorKind::Interrupted => ApiError::Interrupted,
      ErrorKind::Unavailable => {
        tracing::error!(error = %e, "store failure");
        ApiError::Unavailable(Box::new(e))
      }
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match &self {
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
      ApiError::Constraint(m) => (StatusCode::UNPROCESSABLE_ENTITY, m.clone()),
      ApiError::Timeout(_) | ApiError::Interrupted => {
        (StatusCode::GATEWAY_TIMEOUT, self.to_string())
      }
      // Details stay in the log.
      ApiError::Unavailable(_) => {
        (StatusCode::SERVICE_UNAVAILABLE, "storage unavailable".to_owned())
      }
    };
    (status, Json(ErrorBody { error: message })).into_response()
  }
}
