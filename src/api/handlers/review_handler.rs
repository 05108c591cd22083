//! Review handlers.

use axum::{
    extract::{Path, Query, State},
    routing::{get, post, put},
    Extension, Json, Router,
};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::api::middleware::CurrentUser;
use crate::api::AppState;
use crate::domain::{ReviewDraft, ReviewPatch, ReviewSortQuery, ReviewView};
use crate::errors::AppResult;
use crate::types::{Created, MessageResponse, Paginated, PaginationParams};

#[derive(Debug, Serialize, ToSchema)]
pub struct LikeResponse {
    /// Like count after the toggle
    pub likes: usize,
}

pub fn public_routes() -> Router<AppState> {
    Router::new().route("/reviews/property/:id", get(property_reviews))
}

/// Authoring routes, for any signed-in user
pub fn author_routes() -> Router<AppState> {
    Router::new()
        .route("/reviews/property/:id", post(create_review))
        .route("/reviews/my-reviews", get(my_reviews))
        .route("/reviews/:id", put(update_review).delete(delete_review))
        .route("/reviews/:id/like", post(toggle_like))
}

#[utoipa::path(
    get,
    path = "/api/reviews/property/{id}",
    tag = "Reviews",
    params(("id" = Uuid, Path, description = "Property ID"), ReviewSortQuery, PaginationParams),
    responses((status = 200, description = "Reviews with reviewer names, `{ data, meta }`"))
)]
pub async fn property_reviews(
    State(state): State<AppState>,
    Path(property_id): Path<Uuid>,
    Query(sort): Query<ReviewSortQuery>,
    Query(page): Query<PaginationParams>,
) -> AppResult<Json<Paginated<ReviewView>>> {
    let page = state
        .services
        .reviews()
        .list_for_property(property_id, sort.sort, page)
        .await?;
    Ok(Json(page))
}

#[utoipa::path(
    post,
    path = "/api/reviews/property/{id}",
    tag = "Reviews",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Property ID")),
    request_body = ReviewDraft,
    responses(
        (status = 201, description = "Review created, rating refreshed", body = ReviewView),
        (status = 400, description = "Validation error"),
        (status = 404, description = "Property not found"),
        (status = 409, description = "Already reviewed")
    )
)]
pub async fn create_review(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(property_id): Path<Uuid>,
    Json(draft): Json<ReviewDraft>,
) -> AppResult<Created<ReviewView>> {
    let view = state
        .services
        .reviews()
        .create(current_user.id, property_id, draft)
        .await?;
    Ok(Created(view))
}

#[utoipa::path(
    get,
    path = "/api/reviews/my-reviews",
    tag = "Reviews",
    security(("bearer_auth" = [])),
    params(PaginationParams),
    responses((status = 200, description = "The caller's reviews, `{ data, meta }`"))
)]
pub async fn my_reviews(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Query(page): Query<PaginationParams>,
) -> AppResult<Json<Paginated<ReviewView>>> {
    let page = state
        .services
        .reviews()
        .list_mine(current_user.id, page)
        .await?;
    Ok(Json(page))
}

#[utoipa::path(
    put,
    path = "/api/reviews/{id}",
    tag = "Reviews",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Review ID")),
    request_body = ReviewPatch,
    responses(
        (status = 200, description = "Review updated", body = ReviewView),
        (status = 404, description = "Review not found or not authorized")
    )
)]
pub async fn update_review(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    Json(patch): Json<ReviewPatch>,
) -> AppResult<Json<ReviewView>> {
    let view = state
        .services
        .reviews()
        .update(current_user.id, id, patch)
        .await?;
    Ok(Json(view))
}

#[utoipa::path(
    delete,
    path = "/api/reviews/{id}",
    tag = "Reviews",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Review ID")),
    responses(
        (status = 200, description = "Review deleted, rating refreshed", body = MessageResponse),
        (status = 404, description = "Review not found or not authorized")
    )
)]
pub async fn delete_review(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<MessageResponse>> {
    state.services.reviews().delete(current_user.id, id).await?;
    Ok(Json(MessageResponse::new("Review deleted successfully")))
}

#[utoipa::path(
    post,
    path = "/api/reviews/{id}/like",
    tag = "Reviews",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Review ID")),
    responses(
        (status = 200, description = "Like toggled", body = LikeResponse),
        (status = 404, description = "Review not found")
    )
)]
pub async fn toggle_like(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<LikeResponse>> {
    let likes = state
        .services
        .reviews()
        .toggle_like(current_user.id, id)
        .await?;
    Ok(Json(LikeResponse { likes }))
}
