//! Standalone image upload and delete.

use axum::{
    extract::{Path, State},
    routing::{delete, post},
    Json, Router,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::api::extractors::ImageFiles;
use crate::api::AppState;
use crate::errors::{AppError, AppResult};
use crate::services::StoredImage;
use crate::types::{Created, MessageResponse};

#[derive(Debug, Serialize, ToSchema)]
pub struct UploadResponse {
    pub message: String,
    pub images: Vec<StoredImage>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/images/upload", post(upload_images))
        .route("/images/:key", delete(delete_image))
}

/// Normalize and store up to 10 `images` parts
#[utoipa::path(
    post,
    path = "/api/images/upload",
    tag = "Images",
    security(("bearer_auth" = [])),
    request_body(content = Vec<u8>, description = "One or more `images` file parts", content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Images stored", body = UploadResponse),
        (status = 400, description = "No images uploaded"),
        (status = 500, description = "Failed to upload images")
    )
)]
pub async fn upload_images(
    State(state): State<AppState>,
    ImageFiles(files): ImageFiles,
) -> AppResult<Created<UploadResponse>> {
    if files.is_empty() {
        return Err(AppError::bad_request("No images uploaded"));
    }

    let images = state.services.images().upload_many(files).await?;
    Ok(Created(UploadResponse {
        message: "Images uploaded successfully".to_string(),
        images,
    }))
}

#[utoipa::path(
    delete,
    path = "/api/images/{key}",
    tag = "Images",
    security(("bearer_auth" = [])),
    params(("key" = String, Path, description = "Image key")),
    responses(
        (status = 200, description = "Image deleted (idempotent)", body = MessageResponse),
        (status = 500, description = "Failed to delete image")
    )
)]
pub async fn delete_image(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> AppResult<Json<MessageResponse>> {
    state.services.images().delete(key).await?;
    Ok(Json(MessageResponse::new("Image deleted successfully")))
}
