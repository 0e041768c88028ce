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
///
/// Domain errors carry the message shown to the client. Infrastructure
/// errors carry the underlying cause, which is logged and never returned.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("User already exist. Try again.")]
    DuplicateUser,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Avatar upload failed: {0}")]
    Upload(String),

    #[error("{0}")]
    NotAuthorized(String),

    #[error("Forbidden")]
    Forbidden,

    #[error("{0}")]
    NotFound(String),

    #[error("Cache write error: {0}")]
    CacheWrite(String),

    #[error("Cache read error: {0}")]
    CacheRead(String),

    #[error("Queue error: {0}")]
    Queue(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Email error: {0}")]
    Email(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub const TOKEN_NOT_AVAILABLE: &'static str = "Token is not available, please login";
    pub const TOKEN_INVALID: &'static str = "Token is invalid, please login";
    pub const AUTHENTICATION_REQUIRED: &'static str =
        "Authentication is required to access this route";

    /// HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_)
            | AppError::DuplicateUser
            | AppError::InvalidCredentials
            | AppError::Upload(_) => StatusCode::BAD_REQUEST,
            AppError::NotAuthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::CacheWrite(_)
            | AppError::CacheRead(_)
            | AppError::Queue(_)
            | AppError::Database(_)
            | AppError::Email(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to return to the client.
    pub fn client_message(&self) -> String {
        match self {
            AppError::Validation(msg) | AppError::NotAuthorized(msg) | AppError::NotFound(msg) => {
                msg.clone()
            }
            AppError::DuplicateUser | AppError::InvalidCredentials | AppError::Forbidden => {
                self.to_string()
            }
            AppError::Upload(_) => "File upload: Error occurred. Try again.".to_string(),
            AppError::CacheWrite(_) => "Error saving user to cache".to_string(),
            AppError::CacheRead(_) => "Error retrieving user from cache".to_string(),
            AppError::Queue(_) => "Error queueing background job".to_string(),
            AppError::Email(_) => "Error sending email".to_string(),
            AppError::Database(_) | AppError::Internal(_) => "Internal server error".to_string(),
        }
    }
}

/// JSON error response body
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorResponse {
    message: String,
    status_code: u16,
    status: &'static str,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        match &self {
            AppError::Upload(cause) => tracing::warn!(error = %cause, "Avatar upload failed"),
            AppError::CacheWrite(cause) | AppError::CacheRead(cause) => {
                tracing::error!(error = %cause, "Cache error")
            }
            AppError::Queue(cause) => tracing::error!(error = %cause, "Queue error"),
            AppError::Database(cause) => tracing::error!(error = %cause, "Database error"),
            AppError::Email(cause) => tracing::error!(error = %cause, "Email error"),
            AppError::Internal(err) => tracing::error!(error = %err, "Internal server error"),
            _ => {}
        }

        let body = ErrorResponse {
            message: self.client_message(),
            status_code: status.as_u16(),
            status: "error",
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;
