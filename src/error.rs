// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with consistent API responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Authentication required")]
    Unauthorized,

    #[error("Refresh token is expired or superseded")]
    RefreshTokenExpired,

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Media store error: {0}")]
    Media(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, details) = match &self {
            AppError::Validation(msg) => {
                (StatusCode::BAD_REQUEST, "bad_request", Some(msg.clone()))
            }
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", Some(msg.clone())),
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized", None),
            // Distinct code so clients force a fresh login instead of
            // retrying the rotation.
            AppError::RefreshTokenExpired => {
                (StatusCode::UNAUTHORIZED, "refresh_token_expired", None)
            }
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", Some(msg.clone())),
            AppError::Media(msg) => (StatusCode::BAD_GATEWAY, "media_error", Some(msg.clone())),
            AppError::Database(msg) => {
                tracing::error!(error = %msg, "Database error");
                (StatusCode::INTERNAL_SERVER_ERROR, "database_error", None)
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", None)
            }
        };

        let body = ErrorResponse {
            error: error.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        let cases = [
            (
                AppError::Validation("missing field".into()),
                StatusCode::BAD_REQUEST,
            ),
            (
                AppError::Conflict("email taken".into()),
                StatusCode::CONFLICT,
            ),
            (AppError::Unauthorized, StatusCode::UNAUTHORIZED),
            (AppError::RefreshTokenExpired, StatusCode::UNAUTHORIZED),
            (AppError::NotFound("user".into()), StatusCode::NOT_FOUND),
            (
                AppError::Media("upload failed".into()),
                StatusCode::BAD_GATEWAY,
            ),
            (
                AppError::Database("connection reset".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }
}
