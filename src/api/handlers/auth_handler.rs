//! Authentication handlers.

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::api::extractors::ValidatedJson;
use crate::api::middleware::CurrentUser;
use crate::api::AppState;
use crate::domain::{UserResponse, UserRole};
use crate::errors::AppResult;
use crate::services::{LoginResponse, Registration};
use crate::types::{Created, MessageResponse};

/// User registration request
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[validate(length(min = 1, message = "Name is required"))]
    #[schema(example = "Jane Doe")]
    pub name: String,
    #[validate(email(message = "Invalid email format"))]
    #[schema(example = "jane@example.com")]
    pub email: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    #[schema(example = "SecurePass123!")]
    pub password: String,
    #[validate(length(min = 1, message = "Phone number is required"))]
    #[schema(example = "+250788000000")]
    pub phone_number: String,
    /// Defaults to `user`
    #[serde(default)]
    pub role: UserRole,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResponse {
    pub message: String,
    pub user_id: Uuid,
}

/// User login request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email format"))]
    #[schema(example = "jane@example.com")]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ForgotPasswordRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ResetPasswordRequest {
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
}

/// Public authentication routes
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/verify/:token", get(verify_email))
        .route("/auth/forgot-password", post(forgot_password))
        .route("/auth/reset-password/:token", post(reset_password))
}

/// Routes for any signed-in user
pub fn account_routes() -> Router<AppState> {
    Router::new().route("/auth/me", get(me))
}

/// Register a new account and send its verification email
#[utoipa::path(
    post,
    path = "/api/auth/register",
    tag = "Authentication",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Registered, verification email queued", body = RegisterResponse),
        (status = 400, description = "Validation error"),
        (status = 409, description = "Email or phone number already registered")
    )
)]
pub async fn register(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<RegisterRequest>,
) -> AppResult<Created<RegisterResponse>> {
    let user = state
        .services
        .auth()
        .register(Registration {
            name: payload.name,
            email: payload.email,
            password: payload.password,
            phone_number: payload.phone_number,
            role: payload.role,
        })
        .await?;

    Ok(Created(RegisterResponse {
        message: "Registration successful. Please check your email to verify your account."
            .to_string(),
        user_id: user.id,
    }))
}

#[utoipa::path(
    get,
    path = "/api/auth/verify/{token}",
    tag = "Authentication",
    params(("token" = String, Path, description = "Verification token from the email")),
    responses(
        (status = 200, description = "Email verified", body = MessageResponse),
        (status = 400, description = "Invalid or expired verification token")
    )
)]
pub async fn verify_email(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> AppResult<Json<MessageResponse>> {
    state.services.auth().verify_email(&token).await?;
    Ok(Json(MessageResponse::new("Email verified successfully")))
}

/// Login and get a bearer token
#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "Authentication",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 401, description = "Invalid credentials or unverified email")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    let response = state
        .services
        .auth()
        .login(payload.email, payload.password)
        .await?;
    Ok(Json(response))
}

#[utoipa::path(
    post,
    path = "/api/auth/forgot-password",
    tag = "Authentication",
    request_body = ForgotPasswordRequest,
    responses(
        (status = 200, description = "Reset email queued", body = MessageResponse),
        (status = 404, description = "User not found")
    )
)]
pub async fn forgot_password(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<ForgotPasswordRequest>,
) -> AppResult<Json<MessageResponse>> {
    state.services.auth().forgot_password(payload.email).await?;
    Ok(Json(MessageResponse::new("Password reset email sent")))
}

#[utoipa::path(
    post,
    path = "/api/auth/reset-password/{token}",
    tag = "Authentication",
    params(("token" = String, Path, description = "Reset token from the email")),
    request_body = ResetPasswordRequest,
    responses(
        (status = 200, description = "Password changed", body = MessageResponse),
        (status = 400, description = "Invalid or expired reset token")
    )
)]
pub async fn reset_password(
    State(state): State<AppState>,
    Path(token): Path<String>,
    ValidatedJson(payload): ValidatedJson<ResetPasswordRequest>,
) -> AppResult<Json<MessageResponse>> {
    state
        .services
        .auth()
        .reset_password(&token, payload.password)
        .await?;
    Ok(Json(MessageResponse::new("Password reset successful")))
}

#[utoipa::path(
    get,
    path = "/api/auth/me",
    tag = "Authentication",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Current user profile", body = UserResponse),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn me(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
) -> AppResult<Json<UserResponse>> {
    let user = state.services.auth().me(current_user.id).await?;
    Ok(Json(UserResponse::from(user)))
}
