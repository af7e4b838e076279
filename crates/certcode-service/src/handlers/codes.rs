//! Admin handlers: issuance, statistics, render recovery.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use certcode_store::CategoryStats;

use crate::auth::AdminAuth;
use crate::codes::{IssueBatch, IssuedCode, RecoveryReport};
use crate::error::ApiError;
use crate::state::AppState;

/// Pending certificates rendered per recovery request by default.
const DEFAULT_RECOVERY_LIMIT: usize = 1000;

/// Body of `POST /v1/codes`.
#[derive(Debug, Default, Deserialize)]
pub struct IssueCodesBody {
    /// Number of codes to issue. Kept raw so that fractional, negative and
    /// non-numeric counts are rejected as an invalid count rather than a
    /// malformed body.
    pub count: Option<serde_json::Value>,
    /// Certificate category.
    #[serde(rename = "type")]
    pub category: Option<String>,
    /// Labels for every code in the batch.
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Response of `POST /v1/codes`.
#[derive(Debug, Serialize)]
pub struct IssueCodesResponse {
    /// Issued codes in issuance order.
    pub codes: Vec<IssuedCode>,
}

/// Response of `GET /v1/codes/stats`.
#[derive(Debug, Serialize)]
pub struct StatsResponse {
    /// All codes ever issued.
    pub total: u64,
    /// Codes not yet redeemed.
    pub unused: u64,
    /// Counts per certificate category.
    pub by_type: BTreeMap<String, CategoryStats>,
}

/// Query of `POST /v1/codes/recover`.
#[derive(Debug, Default, Deserialize)]
pub struct RecoverQuery {
    /// Maximum number of pending certificates to render.
    pub limit: Option<usize>,
}

/// Issue a batch of codes.
pub async fn issue_codes(
    admin: AdminAuth,
    State(state): State<Arc<AppState>>,
    body: Result<Json<IssueCodesBody>, JsonRejection>,
) -> Result<Json<IssueCodesResponse>, ApiError> {
    let Json(body) = body.map_err(|e| {
        tracing::debug!(error = %e, "Rejected issuance body");
        ApiError::InvalidRequest
    })?;

    let count = body
        .count
        .as_ref()
        .and_then(serde_json::Value::as_u64)
        .and_then(|c| usize::try_from(c).ok())
        .ok_or(ApiError::InvalidCount)?;
    let category = body.category.ok_or(ApiError::InvalidType)?;

    let batch = IssueBatch {
        category,
        count,
        tags: body.tags,
    };

    let codes = state.issuer.issue_batch(&batch)?;

    tracing::info!(
        admin_id = %admin.admin_id,
        category = %batch.category,
        count = codes.len(),
        "Admin issued codes"
    );

    Ok(Json(IssueCodesResponse { codes }))
}

/// Code counts, overall and per category.
pub async fn code_stats(
    _admin: AdminAuth,
    State(state): State<Arc<AppState>>,
) -> Result<Json<StatsResponse>, ApiError> {
    let stats = state.store.stats().map_err(|e| ApiError::Internal(e.to_string()))?;

    Ok(Json(StatsResponse {
        total: stats.total,
        unused: stats.unused,
        by_type: stats.by_category,
    }))
}

/// Render every claimed code whose certificate is still pending.
pub async fn recover_pending(
    admin: AdminAuth,
    State(state): State<Arc<AppState>>,
    query: Option<Query<RecoverQuery>>,
) -> Result<Json<RecoveryReport>, ApiError> {
    let limit = query
        .and_then(|Query(q)| q.limit)
        .unwrap_or(DEFAULT_RECOVERY_LIMIT);

    tracing::info!(admin_id = %admin.admin_id, limit, "Admin triggered render recovery");

    let report = state.redemption.recover_pending(limit).await?;

    Ok(Json(report))
}
