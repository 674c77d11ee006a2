//! Error handling for the safewatch service

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Error types
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Inference endpoint returned 429 — backpressure, never retried
    #[error("Rate limited by inference endpoint")]
    RateLimited,

    /// Inference endpoint unreachable after retries
    #[error("Inference endpoint unreachable: {0}")]
    Unreachable(String),

    /// Clip could not be opened at all (fatal to that clip's sweep only)
    #[error("Clip unreadable: {0}")]
    ClipUnreadable(String),

    /// Nothing to validate — reported as a no-op, not a failure
    #[error("No pending detection data: {0}")]
    NoPendingData(String),

    /// Record store failure
    #[error("Record store failure: {0}")]
    Store(String),

    /// Not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Validation error (bad request input)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// HTTP client error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match &self {
            Error::RateLimited => (
                StatusCode::TOO_MANY_REQUESTS,
                "RATE_LIMITED",
                self.to_string(),
            ),
            Error::Unreachable(msg) => (StatusCode::BAD_GATEWAY, "UNREACHABLE", msg.clone()),
            Error::ClipUnreadable(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "CLIP_UNREADABLE",
                msg.clone(),
            ),
            Error::NoPendingData(msg) => (StatusCode::NOT_FOUND, "NO_PENDING_DATA", msg.clone()),
            Error::Store(msg) => (StatusCode::BAD_GATEWAY, "STORE_FAILURE", msg.clone()),
            Error::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            Error::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            Error::Serialization(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "SERIALIZATION_ERROR",
                e.to_string(),
            ),
            Error::Http(e) => (StatusCode::BAD_GATEWAY, "HTTP_ERROR", e.to_string()),
            Error::Io(e) => (StatusCode::INTERNAL_SERVER_ERROR, "IO_ERROR", e.to_string()),
            Error::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                msg.clone(),
            ),
        };

        tracing::error!(
            status = %status,
            error_code = %error_code,
            message = %message,
            "Request error"
        );

        let body = Json(json!({
            "error_code": error_code,
            "message": message
        }));

        (status, body).into_response()
    }
}
