//! API error types.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use sampleit_metadata::MetadataError;
use sampleit_storage::StorageError;
use serde::Serialize;

/// API error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
}

/// API error type.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("payload too large: {0}")]
    PayloadTooLarge(String),

    #[error("upload failed: {0}")]
    UploadFailure(String),

    #[error("internal error: {0}")]
    Internal(String),

    #[error("metadata error: {0}")]
    Metadata(#[from] MetadataError),

    #[error("invalid input: {0}")]
    Core(#[from] sampleit_core::Error),
}

impl ApiError {
    /// Get the error code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            Self::BadRequest(_) | Self::Core(_) => "bad_request",
            Self::Unauthorized(_) => "unauthorized",
            Self::Forbidden(_) => "forbidden",
            Self::NotFound(_) => "not_found",
            Self::Conflict(_) => "conflict",
            Self::PayloadTooLarge(_) => "payload_too_large",
            Self::UploadFailure(_) => "upload_failure",
            Self::Internal(_) => "internal_error",
            Self::Metadata(e) => match e {
                MetadataError::NotFound(_) => "not_found",
                MetadataError::Conflict(_) => "conflict",
                _ => "internal_error",
            },
        }
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) | Self::Core(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            Self::UploadFailure(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Metadata(e) => match e {
                MetadataError::NotFound(_) => StatusCode::NOT_FOUND,
                MetadataError::Conflict(_) => StatusCode::CONFLICT,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(key) => Self::NotFound(format!("object not found: {key}")),
            StorageError::InvalidKey(key) => Self::BadRequest(format!("invalid key: {key}")),
            StorageError::Source(msg) => Self::BadRequest(format!("upload body error: {msg}")),
            other => Self::UploadFailure(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }
        let body = ErrorResponse {
            code: self.code().to_string(),
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// Result type for API handlers.
pub type ApiResult<T> = std::result::Result<T, ApiError>;
