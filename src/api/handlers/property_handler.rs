//! Listing handlers: public search and reads, agent workflows, saved lists.

use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Extension, Json, Router,
};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::api::extractors::ListingForm;
use crate::api::middleware::CurrentUser;
use crate::api::AppState;
use crate::domain::{PropertyDraft, PropertyFilter, PropertyPatch, PropertyView, SavedList};
use crate::errors::AppResult;
use crate::services::SavedLists;
use crate::types::{Created, MessageResponse, Paginated, PaginationParams};

#[derive(Debug, Serialize, ToSchema)]
pub struct FavoritesResponse {
    pub favorites: Vec<Uuid>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct WishlistResponse {
    pub wishlist: Vec<Uuid>,
}

/// Anonymous reads
pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/properties", get(list_properties))
        .route("/properties/:id", get(get_property))
}

/// Saved lists, for any signed-in user
pub fn saved_routes() -> Router<AppState> {
    Router::new()
        .route("/properties/favorites", get(favorites))
        .route("/properties/wishlist", get(wishlist))
        .route("/properties/sync", post(sync_saved))
        .route("/properties/:id/favorite", post(toggle_favorite))
        .route("/properties/:id/wishlist", post(toggle_wishlist))
}

/// Listing management, for agents and admins
pub fn listing_routes() -> Router<AppState> {
    Router::new()
        .route("/properties", post(create_property))
        .route("/properties/my-properties", get(my_properties))
        .route(
            "/properties/:id",
            axum::routing::put(update_property).delete(delete_property),
        )
}

#[utoipa::path(
    get,
    path = "/api/properties",
    tag = "Properties",
    params(PropertyFilter, PaginationParams),
    responses((status = 200, description = "Newest listings first, `{ data, meta }`"))
)]
pub async fn list_properties(
    State(state): State<AppState>,
    Query(filter): Query<PropertyFilter>,
    Query(page): Query<PaginationParams>,
) -> AppResult<Json<Paginated<PropertyView>>> {
    let page = state.services.listings().list(filter, page).await?;
    Ok(Json(page))
}

/// Fetch one listing; counts as a view
#[utoipa::path(
    get,
    path = "/api/properties/{id}",
    tag = "Properties",
    params(("id" = Uuid, Path, description = "Property ID")),
    responses(
        (status = 200, description = "Listing with location and owner", body = PropertyView),
        (status = 404, description = "Property not found")
    )
)]
pub async fn get_property(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<PropertyView>> {
    let view = state.services.listings().get(id).await?;
    Ok(Json(view))
}

/// Create a listing from a multipart form (`data` JSON part + up to 10 `images`)
#[utoipa::path(
    post,
    path = "/api/properties",
    tag = "Properties",
    security(("bearer_auth" = [])),
    request_body(content = PropertyDraft, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Listing created", body = PropertyView),
        (status = 400, description = "Validation error"),
        (status = 403, description = "No active subscription, quota reached, or wrong role")
    )
)]
pub async fn create_property(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    form: ListingForm<PropertyDraft>,
) -> AppResult<Created<PropertyView>> {
    let (draft, images) = form.require_data()?;
    let view = state
        .services
        .listings()
        .create(current_user.actor(), draft, images)
        .await?;
    Ok(Created(view))
}

#[utoipa::path(
    put,
    path = "/api/properties/{id}",
    tag = "Properties",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Property ID")),
    request_body(content = PropertyPatch, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Listing updated, new images appended", body = PropertyView),
        (status = 404, description = "Property not found or not authorized")
    )
)]
pub async fn update_property(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    form: ListingForm<PropertyPatch>,
) -> AppResult<Json<PropertyView>> {
    let patch = form.data.unwrap_or_default();
    let view = state
        .services
        .listings()
        .update(current_user.actor(), id, patch, form.images)
        .await?;
    Ok(Json(view))
}

#[utoipa::path(
    delete,
    path = "/api/properties/{id}",
    tag = "Properties",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Property ID")),
    responses(
        (status = 200, description = "Listing, its location and images removed", body = MessageResponse),
        (status = 404, description = "Property not found or not authorized")
    )
)]
pub async fn delete_property(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<MessageResponse>> {
    state
        .services
        .listings()
        .delete(current_user.actor(), id)
        .await?;
    Ok(Json(MessageResponse::new("Property deleted successfully")))
}

#[utoipa::path(
    get,
    path = "/api/properties/my-properties",
    tag = "Properties",
    security(("bearer_auth" = [])),
    params(PaginationParams),
    responses((status = 200, description = "The caller's listings, `{ data, meta }`"))
)]
pub async fn my_properties(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Query(page): Query<PaginationParams>,
) -> AppResult<Json<Paginated<PropertyView>>> {
    let page = state
        .services
        .listings()
        .list_mine(current_user.id, page)
        .await?;
    Ok(Json(page))
}

#[utoipa::path(
    get,
    path = "/api/properties/favorites",
    tag = "Saved",
    security(("bearer_auth" = [])),
    responses((status = 200, description = "Favorite listings", body = [PropertyView]))
)]
pub async fn favorites(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
) -> AppResult<Json<Vec<PropertyView>>> {
    let views = state
        .services
        .saved()
        .list(current_user.id, SavedList::Favorites)
        .await?;
    Ok(Json(views))
}

#[utoipa::path(
    get,
    path = "/api/properties/wishlist",
    tag = "Saved",
    security(("bearer_auth" = [])),
    responses((status = 200, description = "Wishlisted listings", body = [PropertyView]))
)]
pub async fn wishlist(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
) -> AppResult<Json<Vec<PropertyView>>> {
    let views = state
        .services
        .saved()
        .list(current_user.id, SavedList::Wishlist)
        .await?;
    Ok(Json(views))
}

/// Merge lists kept by a signed-out client into the account
#[utoipa::path(
    post,
    path = "/api/properties/sync",
    tag = "Saved",
    security(("bearer_auth" = [])),
    request_body = SavedLists,
    responses((status = 200, description = "Merged lists", body = SavedLists))
)]
pub async fn sync_saved(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Json(incoming): Json<SavedLists>,
) -> AppResult<Json<SavedLists>> {
    let merged = state
        .services
        .saved()
        .sync(current_user.id, incoming)
        .await?;
    Ok(Json(merged))
}

#[utoipa::path(
    post,
    path = "/api/properties/{id}/favorite",
    tag = "Saved",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Property ID")),
    responses(
        (status = 200, description = "Updated favorites", body = FavoritesResponse),
        (status = 404, description = "Property not found")
    )
)]
pub async fn toggle_favorite(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<FavoritesResponse>> {
    let favorites = state
        .services
        .saved()
        .toggle(current_user.id, SavedList::Favorites, id)
        .await?;
    Ok(Json(FavoritesResponse { favorites }))
}

#[utoipa::path(
    post,
    path = "/api/properties/{id}/wishlist",
    tag = "Saved",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Property ID")),
    responses(
        (status = 200, description = "Updated wishlist", body = WishlistResponse),
        (status = 404, description = "Property not found")
    )
)]
pub async fn toggle_wishlist(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<WishlistResponse>> {
    let wishlist = state
        .services
        .saved()
        .toggle(current_user.id, SavedList::Wishlist, id)
        .await?;
    Ok(Json(WishlistResponse { wishlist }))
}
