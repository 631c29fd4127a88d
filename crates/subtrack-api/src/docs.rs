//! OpenAPI document for the subscription routes, served by the server crate
//! next to Swagger UI.

use utoipa::OpenApi;

use crate::{
  error::ErrorBody,
  subscriptions::{self, Created, SummaryResponse, Updated},
  validate::SubscriptionPayload,
};

#[derive(OpenApi)]
#[openapi(
  paths(
    subscriptions::create,
    subscriptions::list,
    subscriptions::get_one,
    subscriptions::update,
    subscriptions::delete_one,
    subscriptions::summary,
  ),
  components(schemas(
    subtrack_core::subscription::Subscription,
    SubscriptionPayload,
    Created,
    Updated,
    SummaryResponse,
    ErrorBody,
  )),
  tags((name = "subscriptions", description = "Subscription records and billing summaries")),
  info(title = "subtrack", description = "Subscription ledger REST API")
)]
pub struct ApiDoc;
