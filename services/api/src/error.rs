//! Custom error types for the API service

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// Custom error type for the API service
///
/// Failures are terminal for the current request: handlers translate them
/// into the `{error, msg}` envelope at the boundary and the caller must
/// resubmit.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Bad or missing input, including uniqueness conflicts
    #[error("{0}")]
    Validation(String),

    /// Missing or malformed credentials
    #[error("{0}")]
    Unauthorized(String),

    /// Credentials that were presented but rejected
    #[error("{0}")]
    Forbidden(String),

    /// Missing entity
    #[error("{0}")]
    NotFound(String),

    /// Unexpected runtime failure
    #[error("An unexpected error occurred on the server")]
    Internal,

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, msg) = match self {
            ApiError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "An unexpected error occurred on the server".to_string(),
            ),
            ApiError::Database(err) => {
                tracing::error!("Database error: {err}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An unexpected error occurred on the server".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": true,
            "msg": msg,
        }));

        (status, body).into_response()
    }
}

/// Whether a database error is a unique-constraint violation
///
/// Uniqueness conflicts (duplicate email, duplicate product name) surface
/// as validation failures rather than internal errors.
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

/// Type alias for API results
pub type ApiResult<T> = Result<T, ApiError>;
