//! Error types for marquee-resolver
//!
//! Translates domain errors from the catalog and resolver into HTTP
//! responses; everything below this layer propagates errors verbatim.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Resource not found (404)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Conflict (409) - e.g., an ambiguous catalog match
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Unprocessable (422) - e.g., resolved metadata without a runtime
    #[error("Unprocessable: {0}")]
    Unprocessable(String),

    /// Upstream provider failure (502)
    #[error("Provider error: {0}")]
    BadGateway(String),

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<marquee_common::Error> for ApiError {
    fn from(err: marquee_common::Error) -> Self {
        use marquee_common::Error as E;

        match err {
            E::NotFound(msg) => ApiError::NotFound(msg),
            E::EmptyCatalog(msg) => ApiError::NotFound(msg),
            E::Ambiguous(msg) => ApiError::Conflict(msg),
            E::InvalidInput(msg) => ApiError::BadRequest(msg),
            e @ E::IndexOutOfRange { .. } => ApiError::BadRequest(e.to_string()),
            e @ E::SessionState(_) => ApiError::BadRequest(e.to_string()),
            e @ E::MissingRuntime(_) => ApiError::Unprocessable(e.to_string()),
            E::Provider(msg) => ApiError::BadGateway(msg),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg),
            ApiError::Unprocessable(msg) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "UNPROCESSABLE", msg)
            }
            ApiError::BadGateway(msg) => (StatusCode::BAD_GATEWAY, "PROVIDER_ERROR", msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", msg),
            ApiError::Io(ref err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "IO_ERROR",
                err.to_string(),
            ),
            ApiError::Other(ref err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                err.to_string(),
            ),
        };

        let body = Json(json!({
            "error": {
                "code": error_code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
