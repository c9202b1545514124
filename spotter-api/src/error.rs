//! Error types for spotter-api
//!
//! Every failure reaching the HTTP boundary maps to one status code and a
//! stable machine-readable code so the presentation layer can tell "please
//! sign in" (401) apart from "you don't have access" (403).

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::services::lifecycle::LifecycleError;
use crate::services::reconciler::IdentifyError;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Bad coordinates, missing field, malformed id (400)
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Request body over the router limit (413)
    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    /// No actor identity where one is required (401)
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Actor identified but policy denies (403)
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Referenced record does not exist (404)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Approve on a record that is no longer pending (409)
    #[error("Conflict: {0}")]
    AlreadyApproved(String),

    /// External classifier failed or is not configured (503)
    #[error("Classifier unavailable: {0}")]
    UpstreamUnavailable(String),

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),

    /// spotter-common error
    #[error("Common error: {0}")]
    Common(#[from] spotter_common::Error),
}

impl From<LifecycleError> for ApiError {
    fn from(err: LifecycleError) -> Self {
        match err {
            LifecycleError::Validation(msg) => ApiError::Validation(msg),
            LifecycleError::Unauthorized(msg) => ApiError::Unauthorized(msg),
            LifecycleError::Forbidden(msg) => ApiError::Forbidden(msg),
            LifecycleError::NotFound(id) => ApiError::NotFound(format!("Sighting {}", id)),
            LifecycleError::AlreadyApproved(id) => {
                ApiError::AlreadyApproved(format!("Sighting {} is already approved", id))
            }
            LifecycleError::Store(e) => ApiError::Common(e),
        }
    }
}

impl From<IdentifyError> for ApiError {
    fn from(err: IdentifyError) -> Self {
        ApiError::UpstreamUnavailable(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            ApiError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg),
            ApiError::PayloadTooLarge(msg) => {
                (StatusCode::PAYLOAD_TOO_LARGE, "PAYLOAD_TOO_LARGE", msg)
            }
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, "FORBIDDEN", msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg),
            ApiError::AlreadyApproved(msg) => (StatusCode::CONFLICT, "ALREADY_APPROVED", msg),
            ApiError::UpstreamUnavailable(msg) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "UPSTREAM_UNAVAILABLE",
                msg,
            ),
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "Internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", msg)
            }
            ApiError::Common(err) => match err {
                spotter_common::Error::NotFound(msg) => {
                    (StatusCode::NOT_FOUND, "NOT_FOUND", msg)
                }
                spotter_common::Error::InvalidInput(msg) => {
                    (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg)
                }
                other => {
                    tracing::error!(error = %other, "Store error");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "INTERNAL_ERROR",
                        "Internal storage error".to_string(),
                    )
                }
            },
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
