//! API error types with structured JSON responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

/// Structured error response body
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: &'static str,
    pub message: String,
}

/// API-level errors with HTTP status mapping.
///
/// The three core failure categories keep their identity on the wire
/// so clients can choose retry vs. fail-fast per category.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Authentication required")]
    Unauthorized,
    #[error("Invalid request: {0}")]
    BadRequest(String),
    #[error("Configuration unavailable: {0}")]
    ConfigUnavailable(String),
    #[error("Intake log unavailable: {0}")]
    StorageUnavailable(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            ApiError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "AUTH_REQUIRED",
                "Authentication required".to_string(),
            ),
            ApiError::BadRequest(detail) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", detail),
            ApiError::ConfigUnavailable(detail) => {
                tracing::error!(detail = %detail, "schedule configuration unavailable");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "CONFIG_UNAVAILABLE",
                    detail,
                )
            }
            ApiError::StorageUnavailable(detail) => {
                tracing::error!(detail = %detail, "intake log unavailable");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "STORAGE_UNAVAILABLE",
                    detail,
                )
            }
        };

        let body = ErrorBody {
            error: ErrorDetail { code, message },
        };
        (status, Json(body)).into_response()
    }
}

impl From<medrem_core::Error> for ApiError {
    fn from(err: medrem_core::Error) -> Self {
        match err {
            medrem_core::Error::Config(detail) => ApiError::ConfigUnavailable(detail),
            err @ medrem_core::Error::Validation { .. } => ApiError::BadRequest(err.to_string()),
            medrem_core::Error::Storage(detail) => ApiError::StorageUnavailable(detail),
        }
    }
}
