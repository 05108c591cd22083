//! JWT authentication and role guards.

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::api::AppState;
use crate::config::BEARER_TOKEN_PREFIX;
use crate::domain::{Actor, UserRole};
use crate::errors::AppError;

/// Authenticated user extracted from JWT token
#[derive(Clone, Debug)]
pub struct CurrentUser {
    pub id: Uuid,
    pub email: String,
    pub role: UserRole,
}

impl CurrentUser {
    pub fn actor(&self) -> Actor {
        Actor::new(self.id, self.role)
    }
}

/// Validate the bearer token and put a [`CurrentUser`] into the request extensions.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix(BEARER_TOKEN_PREFIX))
        .ok_or(AppError::Unauthorized)?;

    let claims = state.services.auth().verify_token(token)?;

    let current_user = CurrentUser {
        id: claims.sub,
        role: claims.role(),
        email: claims.email,
    };
    request.extensions_mut().insert(current_user);

    Ok(next.run(request).await)
}

fn guard(request: &Request, allowed: fn(UserRole) -> bool) -> Result<(), AppError> {
    let user = request
        .extensions()
        .get::<CurrentUser>()
        .ok_or(AppError::Unauthorized)?;

    if allowed(user.role) {
        Ok(())
    } else {
        tracing::debug!(user_id = %user.id, role = %user.role, "Role guard rejected request");
        Err(AppError::forbidden("Not authorized for this action"))
    }
}

/// Agents and admins.
pub async fn require_lister(request: Request, next: Next) -> Result<Response, AppError> {
    guard(&request, |role| role.can_list_properties())?;
    Ok(next.run(request).await)
}

pub async fn require_agent(request: Request, next: Next) -> Result<Response, AppError> {
    guard(&request, |role| role == UserRole::Agent)?;
    Ok(next.run(request).await)
}

pub async fn require_admin(request: Request, next: Next) -> Result<Response, AppError> {
    guard(&request, |role| role.is_admin())?;
    Ok(next.run(request).await)
}
