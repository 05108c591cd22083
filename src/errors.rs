//! Centralized error handling.
//!
//! Provides a unified error type for the entire application,
//! with automatic HTTP response conversion. Clients only ever see a
//! status code and a short message.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use sea_orm::{DbErr, SqlErr};
use serde::Serialize;
use thiserror::Error;

/// Reasons the quota engine refuses a new listing.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuotaError {
    #[error("Active subscription required to post properties")]
    NoActiveSubscription,

    #[error("Property limit reached for current subscription")]
    QuotaExceeded,
}

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Authentication & Authorization
    #[error("Not authorized")]
    Unauthorized,

    #[error("Please verify your email before logging in")]
    Unverified,

    #[error("{0}")]
    Forbidden(String),

    #[error(transparent)]
    Quota(#[from] QuotaError),

    #[error("Invalid credentials")]
    InvalidCredentials,

    // Resource errors
    #[error("{0} not found")]
    NotFound(String),

    /// Ownership-scoped lookup; "missing" and "not yours" are indistinguishable.
    #[error("{0} not found or not authorized")]
    NotFoundOrUnauthorized(String),

    #[error("{0}")]
    Conflict(String),

    // Validation
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    BadRequest(String),

    // Object storage
    #[error("Failed to upload image")]
    UploadFailure,

    #[error("Failed to delete image")]
    DeleteFailure,

    // External service errors
    #[error("Database error")]
    Database(#[from] DbErr),

    #[error("Authentication error")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    // Internal
    #[error("Internal server error")]
    Internal(String),
}

/// Error response body
#[derive(Debug, Serialize)]
struct ErrorResponse {
    message: String,
}

impl AppError {
    /// Get HTTP status code
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Unauthorized
            | AppError::Unverified
            | AppError::InvalidCredentials
            | AppError::Jwt(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) | AppError::Quota(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) | AppError::NotFoundOrUnauthorized(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Validation(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::UploadFailure
            | AppError::DeleteFailure
            | AppError::Database(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get user-facing message (hides internal details)
    fn user_message(&self) -> String {
        match self {
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                "Server error".to_string()
            }
            AppError::Jwt(e) => {
                tracing::debug!("JWT error: {:?}", e);
                "Not authorized".to_string()
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                "Server error".to_string()
            }
            _ => self.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorResponse {
            message: self.user_message(),
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias
pub type AppResult<T> = Result<T, AppError>;

/// Extension trait for Option -> AppError conversion
pub trait OptionExt<T> {
    fn ok_or_not_found(self, entity: &str) -> AppResult<T>;
    fn ok_or_not_owned(self, entity: &str) -> AppResult<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_not_found(self, entity: &str) -> AppResult<T> {
        self.ok_or_else(|| AppError::NotFound(entity.to_string()))
    }

    fn ok_or_not_owned(self, entity: &str) -> AppResult<T> {
        self.ok_or_else(|| AppError::NotFoundOrUnauthorized(entity.to_string()))
    }
}

/// Convenience constructors
impl AppError {
    pub fn conflict(msg: impl Into<String>) -> Self {
        AppError::Conflict(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        AppError::Forbidden(msg.into())
    }

    pub fn not_found(entity: impl Into<String>) -> Self {
        AppError::NotFound(entity.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        AppError::Validation(msg.into())
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        AppError::BadRequest(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        AppError::Internal(msg.into())
    }

    /// Map a store error, turning unique-index violations into `Conflict`.
    pub fn from_db_unique(err: DbErr, conflict_message: &str) -> Self {
        let sql_err = err.sql_err();
        Self::from_sql_err(sql_err, err, conflict_message)
    }

    fn from_sql_err(sql_err: Option<SqlErr>, err: DbErr, conflict_message: &str) -> Self {
        match sql_err {
            Some(SqlErr::UniqueConstraintViolation(detail)) => {
                tracing::debug!(detail = %detail, "Unique constraint violation");
                AppError::conflict(conflict_message)
            }
            _ => AppError::Database(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quota_errors_are_forbidden() {
        let err = AppError::from(QuotaError::QuotaExceeded);
        assert_eq!(err.status(), StatusCode::FORBIDDEN);
        assert_eq!(
            err.to_string(),
            "Property limit reached for current subscription"
        );

        let err = AppError::from(QuotaError::NoActiveSubscription);
        assert_eq!(err.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_ownership_scoped_lookup_is_not_found() {
        let err = AppError::NotFoundOrUnauthorized("Property".into());
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.to_string(), "Property not found or not authorized");
    }

    #[test]
    fn test_internal_details_are_hidden() {
        let err = AppError::internal("connection pool exhausted on shard 3");
        assert_eq!(err.user_message(), "Server error");
    }

    #[test]
    fn test_option_ext() {
        let missing: Option<u8> = None;
        assert!(matches!(
            missing.ok_or_not_found("Review"),
            Err(AppError::NotFound(e)) if e == "Review"
        ));
        assert_eq!(Some(3).ok_or_not_owned("Review").unwrap(), 3);
    }

    #[test]
    fn test_non_unique_db_error_stays_database() {
        let err = AppError::from_db_unique(DbErr::Custom("boom".into()), "dup");
        assert!(matches!(err, AppError::Database(_)));
    }

    #[test]
    fn test_unique_violation_becomes_conflict() {
        let violation = SqlErr::UniqueConstraintViolation(
            "duplicate key value violates unique constraint \"users_email_key\"".into(),
        );
        let err = AppError::from_sql_err(
            Some(violation),
            DbErr::Custom("insert failed".into()),
            "Email already registered",
        );
        assert_eq!(err.status(), StatusCode::CONFLICT);
        assert_eq!(err.to_string(), "Email already registered");
    }

    #[test]
    fn test_foreign_key_violation_stays_database() {
        let violation = SqlErr::ForeignKeyConstraintViolation("fk_reviews_property".into());
        let err = AppError::from_sql_err(Some(violation), DbErr::Custom("insert".into()), "dup");
        assert!(matches!(err, AppError::Database(_)));
    }
}
