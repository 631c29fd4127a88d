//! Handlers for `/subscriptions` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `POST`   | `/subscriptions` | Body: [`SubscriptionPayload`]; returns 201 + `{"id": ...}` |
//! | `GET`    | `/subscriptions` | Optional `user_id`, `service_name`, `limit`, `offset` |
//! | `GET`    | `/subscriptions/summary` | `from`, `to` (`MM-YYYY`) required; optional `user_id`, `service_name` |
//! | `GET`    | `/subscriptions/{id}` | 404 if not found |
//! | `PUT`    | `/subscriptions/{id}` | Full replacement; 404 if not found |
//! | `DELETE` | `/subscriptions/{id}` | 204; 404 if not found |

use axum::{
  Json,
  extract::{Path, Query, State, rejection::JsonRejection},
  http::StatusCode,
  response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use subtrack_core::{
  Month,
  billing::BillingWindow,
  filter::SubscriptionFilter,
  store::{ListQuery, SubscriptionStore},
  subscription::Subscription,
};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::{
  ApiState,
  error::{ApiError, ErrorBody},
  validate::{
    SubscriptionPayload, optional_service_name, optional_user_id, page_limit,
    page_offset, parse_id, required_month,
  },
};

fn body(
  payload: Result<Json<SubscriptionPayload>, JsonRejection>,
) -> Result<SubscriptionPayload, ApiError> {
  payload
    .map(|Json(p)| p)
    .map_err(|_| ApiError::BadRequest("invalid json".to_owned()))
}

// ─── Response bodies ──────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Created {
  pub id: Uuid,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Updated {
  #[schema(example = "updated")]
  pub status: String,
}

// ─── Create ───────────────────────────────────────────────────────────────────

/// `POST /subscriptions` — returns 201 + `{"id": "<uuid>"}`.
#[utoipa::path(
  post,
  path = "/subscriptions",
  tag = "subscriptions",
  request_body = SubscriptionPayload,
  responses(
    (status = 201, description = "Subscription created", body = Created),
    (status = 400, description = "Invalid payload", body = ErrorBody),
  )
)]
pub async fn create<S>(
  State(state): State<ApiState<S>>,
  payload: Result<Json<SubscriptionPayload>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError>
where
  S: SubscriptionStore,
{
  let input = body(payload)?.validate()?;
  let created = state.within_deadline(state.store.create(input)).await?;
  Ok((StatusCode::CREATED, Json(Created { id: created.id })))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /subscriptions/{id}`
#[utoipa::path(
  get,
  path = "/subscriptions/{id}",
  tag = "subscriptions",
  params(("id" = String, Path, description = "Subscription id (UUID)")),
  responses(
    (status = 200, description = "The subscription", body = Subscription),
    (status = 400, description = "Malformed id", body = ErrorBody),
    (status = 404, description = "No such subscription", body = ErrorBody),
  )
)]
pub async fn get_one<S>(
  State(state): State<ApiState<S>>,
  Path(id): Path<String>,
) -> Result<Json<Subscription>, ApiError>
where
  S: SubscriptionStore,
{
  let id = parse_id(&id)?;
  let subscription = state
    .within_deadline(state.store.get(id))
    .await?
    .ok_or_else(|| ApiError::NotFound("not found".to_owned()))?;
  Ok(Json(subscription))
}

// ─── Update ───────────────────────────────────────────────────────────────────

/// `PUT /subscriptions/{id}` — replaces every mutable field.
#[utoipa::path(
  put,
  path = "/subscriptions/{id}",
  tag = "subscriptions",
  params(("id" = String, Path, description = "Subscription id (UUID)")),
  request_body = SubscriptionPayload,
  responses(
    (status = 200, description = "Subscription replaced", body = Updated),
    (status = 400, description = "Invalid payload or id", body = ErrorBody),
    (status = 404, description = "No such subscription", body = ErrorBody),
  )
)]
pub async fn update<S>(
  State(state): State<ApiState<S>>,
  Path(id): Path<String>,
  payload: Result<Json<SubscriptionPayload>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError>
where
  S: SubscriptionStore,
{
  let id = parse_id(&id)?;
  let input = body(payload)?.validate()?;
  if !state.within_deadline(state.store.update(id, input)).await? {
    return Err(ApiError::NotFound("not found".to_owned()));
  }
  Ok(Json(Updated { status: "updated".to_owned() }))
}

// ─── Delete ───────────────────────────────────────────────────────────────────

/// `DELETE /subscriptions/{id}` — 204 on success.
#[utoipa::path(
  delete,
  path = "/subscriptions/{id}",
  tag = "subscriptions",
  params(("id" = String, Path, description = "Subscription id (UUID)")),
  responses(
    (status = 204, description = "Subscription deleted"),
    (status = 404, description = "No such subscription", body = ErrorBody),
  )
)]
pub async fn delete_one<S>(
  State(state): State<ApiState<S>>,
  Path(id): Path<String>,
) -> Result<StatusCode, ApiError>
where
  S: SubscriptionStore,
{
  let id = parse_id(&id)?;
  if !state.within_deadline(state.store.delete(id)).await? {
    return Err(ApiError::NotFound("not found".to_owned()));
  }
  Ok(StatusCode::NO_CONTENT)
}

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListParams {
  /// Only this user's subscriptions.
  pub user_id:      Option<String>,
  /// Exact service name.
  pub service_name: Option<String>,
  /// Page size; falls back to the configured default, capped at the
  /// configured maximum.
  pub limit:        Option<String>,
  pub offset:       Option<String>,
}

/// `GET /subscriptions[?user_id=...][&service_name=...][&limit=...][&offset=...]`
#[utoipa::path(
  get,
  path = "/subscriptions",
  tag = "subscriptions",
  params(ListParams),
  responses(
    (status = 200, description = "Newest first", body = Vec<Subscription>),
    (status = 400, description = "Malformed user_id", body = ErrorBody),
  )
)]
pub async fn list<S>(
  State(state): State<ApiState<S>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<Subscription>>, ApiError>
where
  S: SubscriptionStore,
{
  let query = ListQuery {
    filter: SubscriptionFilter {
      user_id:      optional_user_id(params.user_id.as_deref())?,
      service_name: optional_service_name(params.service_name.as_deref()),
    },
    limit:  page_limit(
      params.limit.as_deref(),
      state.config.default_limit,
      state.config.max_limit,
    ),
    offset: page_offset(params.offset.as_deref()),
  };

  let subscriptions = state.within_deadline(state.store.list(&query)).await?;
  Ok(Json(subscriptions))
}

// ─── Summary ──────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SummaryParams {
  /// First billed month, `MM-YYYY`.
  pub from:         Option<String>,
  /// Last billed month, `MM-YYYY`.
  pub to:           Option<String>,
  pub user_id:      Option<String>,
  pub service_name: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct SummaryResponse {
  #[schema(value_type = String, example = "01-2024")]
  pub from:  Month,
  #[schema(value_type = String, example = "12-2024")]
  pub to:    Month,
  pub total: i64,
}

/// `GET /subscriptions/summary?from=MM-YYYY&to=MM-YYYY[&user_id=...][&service_name=...]`
#[utoipa::path(
  get,
  path = "/subscriptions/summary",
  tag = "subscriptions",
  params(SummaryParams),
  responses(
    (status = 200, description = "Total billed across the window", body = SummaryResponse),
    (status = 400, description = "Missing or malformed window", body = ErrorBody),
  )
)]
pub async fn summary<S>(
  State(state): State<ApiState<S>>,
  Query(params): Query<SummaryParams>,
) -> Result<Json<SummaryResponse>, ApiError>
where
  S: SubscriptionStore,
{
  let from = required_month(params.from.as_deref(), "from")?;
  let to = required_month(params.to.as_deref(), "to")?;
  BillingWindow::new(from, to).map_err(|_| ApiError::BadRequest("to before from".to_owned()))?;

  let filter = SubscriptionFilter {
    user_id:      optional_user_id(params.user_id.as_deref())?,
    service_name: optional_service_name(params.service_name.as_deref()),
  };

  let total = state
    .within_deadline(state.store.summary(from, to, &filter))
    .await?;
  Ok(Json(SummaryResponse { from, to, total }))
}
