//! Subscription plan and agent subscription handlers.

use axum::{
    extract::State,
    routing::{get, post},
    Extension, Json, Router,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::api::extractors::ValidatedJson;
use crate::api::middleware::CurrentUser;
use crate::api::AppState;
use crate::domain::{NewPlan, SubscriptionPlan, SubscriptionView};
use crate::errors::AppResult;
use crate::types::Created;

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubscribeRequest {
    pub plan_id: Uuid,
}

pub fn public_routes() -> Router<AppState> {
    Router::new().route("/subscriptions/plans", get(list_plans))
}

pub fn admin_routes() -> Router<AppState> {
    Router::new().route("/subscriptions/plans", post(create_plan))
}

pub fn agent_routes() -> Router<AppState> {
    Router::new()
        .route("/subscriptions/subscribe", post(subscribe))
        .route("/subscriptions/my-subscription", get(my_subscription))
}

/// Plans open for subscription, cheapest first
#[utoipa::path(
    get,
    path = "/api/subscriptions/plans",
    tag = "Subscriptions",
    responses((status = 200, description = "Active plans", body = [SubscriptionPlan]))
)]
pub async fn list_plans(State(state): State<AppState>) -> AppResult<Json<Vec<SubscriptionPlan>>> {
    let plans = state.services.subscriptions().list_plans().await?;
    Ok(Json(plans))
}

#[utoipa::path(
    post,
    path = "/api/subscriptions/plans",
    tag = "Subscriptions",
    security(("bearer_auth" = [])),
    request_body = NewPlan,
    responses(
        (status = 201, description = "Plan created", body = SubscriptionPlan),
        (status = 403, description = "Admin only"),
        (status = 409, description = "Plan name already exists")
    )
)]
pub async fn create_plan(
    State(state): State<AppState>,
    ValidatedJson(plan): ValidatedJson<NewPlan>,
) -> AppResult<Created<SubscriptionPlan>> {
    let plan = state.services.subscriptions().create_plan(plan).await?;
    Ok(Created(plan))
}

#[utoipa::path(
    post,
    path = "/api/subscriptions/subscribe",
    tag = "Subscriptions",
    security(("bearer_auth" = [])),
    request_body = SubscribeRequest,
    responses(
        (status = 201, description = "New subscription period started", body = SubscriptionView),
        (status = 403, description = "Agents only"),
        (status = 404, description = "Subscription plan not found")
    )
)]
pub async fn subscribe(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Json(request): Json<SubscribeRequest>,
) -> AppResult<Created<SubscriptionView>> {
    let view = state
        .services
        .subscriptions()
        .subscribe(current_user.id, request.plan_id)
        .await?;
    Ok(Created(view))
}

#[utoipa::path(
    get,
    path = "/api/subscriptions/my-subscription",
    tag = "Subscriptions",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Current subscription with its plan", body = SubscriptionView),
        (status = 404, description = "No active subscription")
    )
)]
pub async fn my_subscription(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
) -> AppResult<Json<SubscriptionView>> {
    let view = state
        .services
        .subscriptions()
        .current(current_user.id)
        .await?;
    Ok(Json(view))
}
