// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with consistent API responses.

use crate::db::RepositoryError;
use crate::services::{CheckInError, UserError};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Authentication required")]
    Unauthorized,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error(transparent)]
    CheckIn(#[from] CheckInError),

    #[error(transparent)]
    User(#[from] UserError),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<RepositoryError> for AppError {
    fn from(e: RepositoryError) -> Self {
        AppError::Database(e.to_string())
    }
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
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized", None),
            AppError::InvalidToken => (StatusCode::UNAUTHORIZED, "invalid_token", None),
            AppError::Validation(errors) => (
                StatusCode::BAD_REQUEST,
                "validation_error",
                Some(errors.to_string()),
            ),
            AppError::CheckIn(err) => match err {
                CheckInError::ResourceNotFound => {
                    (StatusCode::NOT_FOUND, "resource_not_found", None)
                }
                CheckInError::MaxDistanceExceeded { .. } => (
                    StatusCode::BAD_REQUEST,
                    "max_distance_exceeded",
                    Some(err.to_string()),
                ),
                CheckInError::MaxCheckInsReached => {
                    (StatusCode::CONFLICT, "max_check_ins_reached", None)
                }
                CheckInError::LateValidationWindowExpired => (
                    StatusCode::CONFLICT,
                    "late_validation_window_expired",
                    Some(err.to_string()),
                ),
                CheckInError::AlreadyValidated => {
                    (StatusCode::CONFLICT, "already_validated", None)
                }
                CheckInError::Repository(e) => {
                    tracing::error!(error = %e, "Database error");
                    (StatusCode::INTERNAL_SERVER_ERROR, "database_error", None)
                }
            },
            AppError::User(err) => match err {
                UserError::AlreadyExists => (StatusCode::CONFLICT, "user_already_exists", None),
                UserError::InvalidCredentials => {
                    (StatusCode::BAD_REQUEST, "invalid_credentials", None)
                }
                UserError::ResourceNotFound => (StatusCode::NOT_FOUND, "resource_not_found", None),
                UserError::PasswordHash(msg) => {
                    tracing::error!(error = %msg, "Password hashing failed");
                    (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", None)
                }
                UserError::Repository(e) => {
                    tracing::error!(error = %e, "Database error");
                    (StatusCode::INTERNAL_SERVER_ERROR, "database_error", None)
                }
            },
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
