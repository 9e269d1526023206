//! Error types for the djtl-id service and CLI

use crate::audio::AudioError;
use crate::consolidation::ConsolidationError;
use crate::export::ExportError;
use crate::recognition::RecognitionError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Session and API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Resource not found (404)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Detection records violate ordering or segment invariants (422)
    #[error("Invalid detection data: {0}")]
    Consolidation(#[from] ConsolidationError),

    /// Download or segmentation failure
    #[error("Audio error: {0}")]
    Audio(#[from] AudioError),

    /// Recognizer could not be constructed or failed fatally
    #[error("Recognition error: {0}")]
    Recognition(#[from] RecognitionError),

    /// Writing a tracklist failed
    #[error("Export error: {0}")]
    Export(#[from] ExportError),

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// djtl-common error
    #[error("Common error: {0}")]
    Common(#[from] djtl_common::Error),
}

impl ApiError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            ApiError::Consolidation(ConsolidationError::InvalidConfig(_)) => {
                (StatusCode::BAD_REQUEST, "INVALID_CONFIG")
            }
            ApiError::Consolidation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "INVALID_DETECTIONS"),
            ApiError::Audio(_) => (StatusCode::BAD_GATEWAY, "AUDIO_ERROR"),
            ApiError::Recognition(RecognitionError::Config(_)) => {
                (StatusCode::BAD_REQUEST, "RECOGNIZER_CONFIG")
            }
            ApiError::Recognition(_) => (StatusCode::BAD_GATEWAY, "RECOGNITION_ERROR"),
            ApiError::Export(_) => (StatusCode::INTERNAL_SERVER_ERROR, "EXPORT_ERROR"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
            ApiError::Io(_) => (StatusCode::INTERNAL_SERVER_ERROR, "IO_ERROR"),
            ApiError::Common(djtl_common::Error::Config(_))
            | ApiError::Common(djtl_common::Error::InvalidInput(_)) => {
                (StatusCode::BAD_REQUEST, "BAD_REQUEST")
            }
            ApiError::Common(_) => (StatusCode::INTERNAL_SERVER_ERROR, "COMMON_ERROR"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code) = self.status_and_code();
        let message = match &self {
            ApiError::NotFound(msg) | ApiError::BadRequest(msg) | ApiError::Internal(msg) => {
                msg.clone()
            }
            other => other.to_string(),
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
