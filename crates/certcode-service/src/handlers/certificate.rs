//! Recipient handlers: validate a code, redeem it, retry its render.
//!
//! Request bodies are decoded into all-optional structures so that missing
//! fields and malformed JSON both end in `400 Invalid request` rather than
//! axum's default rejections.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use certcode_core::{ArtifactRef, CodeError, RedemptionRequest};

use crate::error::ApiError;
use crate::state::AppState;

const VALID_CODE_MESSAGE: &str = "Code valid. Please submit your details.";
const CERTIFICATE_GENERATED_MESSAGE: &str = "Certificate generated successfully!";

/// Query of `GET /certificate`.
#[derive(Debug, Default, Deserialize)]
pub struct ValidateQuery {
    /// Code to check.
    pub code: Option<String>,
}

/// Body of `POST /certificate`.
#[derive(Debug, Default, Deserialize)]
pub struct RedeemBody {
    /// Code to redeem.
    pub code: Option<String>,
    /// Recipient name printed on the certificate.
    pub name: Option<String>,
    /// Recipient email.
    pub email: Option<String>,
}

/// Body of `POST /certificate/retry`.
#[derive(Debug, Default, Deserialize)]
pub struct RetryBody {
    /// Previously redeemed code.
    pub code: Option<String>,
    /// Email given at redemption.
    pub email: Option<String>,
}

/// Plain message response.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    /// Human-readable message.
    pub message: String,
}

/// Successful redemption response.
#[derive(Debug, Serialize)]
pub struct CertificateResponse {
    /// Human-readable message.
    pub message: String,
    /// Path of the rendered certificate.
    pub jpeg_url: String,
}

impl CertificateResponse {
    fn generated(artifact: &ArtifactRef) -> Self {
        Self {
            message: CERTIFICATE_GENERATED_MESSAGE.to_string(),
            jpeg_url: artifact.to_string(),
        }
    }
}

/// Check whether a code can be redeemed.
pub async fn validate_code(
    State(state): State<Arc<AppState>>,
    query: Option<Query<ValidateQuery>>,
) -> Result<Json<MessageResponse>, ApiError> {
    let code = query
        .and_then(|Query(q)| q.code)
        .ok_or(ApiError::InvalidOrUsedCode)?;

    state.validator.validate(&code).map_err(|e| {
        tracing::debug!(code = %code, error = %e, "Code validation failed");
        ApiError::from(e)
    })?;

    Ok(Json(MessageResponse {
        message: VALID_CODE_MESSAGE.to_string(),
    }))
}

/// Redeem a code and render its certificate.
pub async fn redeem_code(
    State(state): State<Arc<AppState>>,
    body: Result<Json<RedeemBody>, JsonRejection>,
) -> Result<Json<CertificateResponse>, ApiError> {
    let Json(body) = body.map_err(|e| {
        tracing::debug!(error = %e, "Rejected redemption body");
        ApiError::InvalidRequest
    })?;

    let request = RedemptionRequest::new(
        body.code.as_deref(),
        body.name.as_deref(),
        body.email.as_deref(),
    )?;

    let artifact = state.redemption.redeem(request).await?;

    Ok(Json(CertificateResponse::generated(&artifact)))
}

/// Render the certificate of an already redeemed code again.
pub async fn retry_render(
    State(state): State<Arc<AppState>>,
    body: Result<Json<RetryBody>, JsonRejection>,
) -> Result<Json<CertificateResponse>, ApiError> {
    let Json(body) = body.map_err(|e| {
        tracing::debug!(error = %e, "Rejected retry body");
        ApiError::InvalidRequest
    })?;

    let code = required(body.code.as_deref(), "code")?;
    let email = required(body.email.as_deref(), "email")?;

    let artifact = state
        .redemption
        .retry_render(code, email)
        .await
        .map_err(|e| {
            tracing::debug!(code = %code, error = %e, "Render retry failed");
            ApiError::from(e)
        })?;

    Ok(Json(CertificateResponse::generated(&artifact)))
}

fn required<'a>(value: Option<&'a str>, field: &'static str) -> Result<&'a str, CodeError> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or(CodeError::InvalidRequest(field))
}
