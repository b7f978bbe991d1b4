// crates/server/src/error.rs
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use watchtower_core::ValidationError;
use watchtower_db::DbError;

use crate::auth::AuthError;
use crate::watch::WatchError;

/// Structured JSON error response for API errors
#[derive(Debug, Serialize)]
#[cfg_attr(test, derive(serde::Deserialize))]
pub struct ErrorResponse {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: None,
        }
    }

    pub fn with_details(error: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: Some(details.into()),
        }
    }
}

/// API error types that map to HTTP status codes
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Watch error: {0}")]
    Watch(#[from] WatchError),

    #[error("Database error: {0}")]
    Database(#[from] DbError),

    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_response) = match &self {
            ApiError::Validation(err) => {
                tracing::warn!(field = err.field(), "Validation failed");
                (
                    StatusCode::BAD_REQUEST,
                    ErrorResponse::with_details("Validation error", err.to_string()),
                )
            }
            ApiError::NotFound(msg) => {
                tracing::warn!(message = %msg, "Not found");
                (
                    StatusCode::NOT_FOUND,
                    ErrorResponse::with_details("Not found", msg.clone()),
                )
            }
            ApiError::BadRequest(msg) => {
                tracing::warn!(message = %msg, "Bad request");
                (
                    StatusCode::BAD_REQUEST,
                    ErrorResponse::with_details("Bad request", msg.clone()),
                )
            }
            ApiError::Unauthorized(msg) => {
                tracing::warn!(message = %msg, "Unauthorized");
                (
                    StatusCode::UNAUTHORIZED,
                    ErrorResponse::with_details("Unauthorized", msg.clone()),
                )
            }
            ApiError::Conflict(msg) => {
                tracing::warn!(message = %msg, "Conflict");
                (
                    StatusCode::CONFLICT,
                    ErrorResponse::with_details("Conflict", msg.clone()),
                )
            }
            ApiError::Watch(watch_err) => match watch_err {
                WatchError::PathNotFound(path) => {
                    tracing::warn!(path = %path, "Watch path not found");
                    (
                        StatusCode::BAD_REQUEST,
                        ErrorResponse::with_details("Path not found", watch_err.to_string()),
                    )
                }
                WatchError::NotADirectory(path) => {
                    tracing::warn!(path = %path, "Watch path is not a directory");
                    (
                        StatusCode::BAD_REQUEST,
                        ErrorResponse::with_details("Not a directory", watch_err.to_string()),
                    )
                }
                WatchError::NoActiveSession => (
                    StatusCode::BAD_REQUEST,
                    ErrorResponse::new("No active watch session"),
                ),
                WatchError::Pattern(_) => (
                    StatusCode::BAD_REQUEST,
                    ErrorResponse::with_details(
                        "Invalid tracked-file pattern",
                        watch_err.to_string(),
                    ),
                ),
                WatchError::Adapter(e) => {
                    tracing::error!(error = %e, "File watcher failed to start");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        ErrorResponse::new("Failed to start file watcher"),
                    )
                }
            },
            ApiError::Database(db_err) => match db_err {
                DbError::Validation(err) => (
                    StatusCode::BAD_REQUEST,
                    ErrorResponse::with_details("Validation error", err.to_string()),
                ),
                DbError::DuplicateEmail(email) => {
                    tracing::warn!(email = %email, "Duplicate account");
                    (
                        StatusCode::CONFLICT,
                        ErrorResponse::with_details("Conflict", "email already registered"),
                    )
                }
                _ => {
                    tracing::error!(error = %db_err, "Database error");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        ErrorResponse::new("Database error"),
                    )
                }
            },
            ApiError::Auth(auth_err) => match auth_err {
                AuthError::Token(e) => {
                    tracing::warn!(error = %e, "Rejected token");
                    (
                        StatusCode::UNAUTHORIZED,
                        ErrorResponse::with_details("Unauthorized", "invalid or expired token"),
                    )
                }
                AuthError::Hash(msg) => {
                    tracing::error!(message = %msg, "Password hashing failed");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        ErrorResponse::new("Internal server error"),
                    )
                }
            },
            ApiError::Internal(msg) => {
                tracing::error!(message = %msg, "Internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::new("Internal server error"),
                )
            }
        };

        (status, Json(error_response)).into_response()
    }
}

/// Result type alias for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
