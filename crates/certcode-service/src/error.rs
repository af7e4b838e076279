//! API error types and responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use certcode_core::CodeError;

/// API error type.
///
/// Response bodies are a flat `{"error": "<message>"}` object.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Unknown, used or malformed code. Never says which.
    #[error("Invalid or used code")]
    InvalidOrUsedCode,

    /// Missing, empty or undecodable request fields.
    #[error("Invalid request")]
    InvalidRequest,

    /// Batch size out of range.
    #[error("Invalid count")]
    InvalidCount,

    /// Missing or blank certificate category.
    #[error("Invalid type")]
    InvalidType,

    /// Missing or invalid admin credentials.
    #[error("Unauthorized")]
    Unauthorized,

    /// The code was claimed but its certificate could not be rendered.
    #[error("Certificate rendering failed")]
    RenderingFailed,

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

/// JSON error response body.
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::InvalidOrUsedCode => StatusCode::NOT_FOUND,
            Self::InvalidRequest | Self::InvalidCount | Self::InvalidType => {
                StatusCode::BAD_REQUEST
            }
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::RenderingFailed => StatusCode::BAD_GATEWAY,
            Self::Internal(msg) => {
                tracing::error!(error = %msg, "Internal server error");
                let body = ErrorResponse {
                    error: "An internal error occurred".to_string(),
                };
                return (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response();
            }
        };

        let body = ErrorResponse {
            error: self.to_string(),
        };

        (status, Json(body)).into_response()
    }
}

impl From<CodeError> for ApiError {
    fn from(err: CodeError) -> Self {
        match err {
            CodeError::NotFound | CodeError::AlreadyUsed | CodeError::NotRedeemed => {
                Self::InvalidOrUsedCode
            }
            CodeError::InvalidRequest(_) => Self::InvalidRequest,
            CodeError::InvalidCount(_) => Self::InvalidCount,
            CodeError::InvalidCategory => Self::InvalidType,
            CodeError::RenderingFailure(_) => Self::RenderingFailed,
            CodeError::DuplicateCode(code) => Self::Internal(format!("duplicate code: {code}")),
            CodeError::Storage(msg) => Self::Internal(msg),
        }
    }
}
