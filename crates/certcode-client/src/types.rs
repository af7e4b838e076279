//! Request and response types for the certcode client.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Plain message response.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MessageResponse {
    /// Human-readable message.
    pub message: String,
}

/// A generated certificate.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Certificate {
    /// Human-readable message.
    pub message: String,
    /// Path of the certificate image on the service.
    pub jpeg_url: String,
}

/// Redemption request.
#[derive(Debug, Clone, Serialize)]
pub struct RedeemRequest {
    /// Code to redeem.
    pub code: String,
    /// Name printed on the certificate.
    pub name: String,
    /// Recipient email.
    pub email: String,
}

/// Render retry request.
#[derive(Debug, Clone, Serialize)]
pub struct RetryRequest {
    /// Previously redeemed code.
    pub code: String,
    /// Email given at redemption.
    pub email: String,
}

/// Batch issuance request.
#[derive(Debug, Clone, Serialize)]
pub struct IssueCodesRequest {
    /// Number of codes.
    pub count: u32,
    /// Certificate category.
    #[serde(rename = "type")]
    pub category: String,
    /// Labels for every code in the batch.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

/// A freshly issued code.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct IssuedCode {
    /// The code.
    pub code: String,
    /// Redemption URL.
    pub url: String,
}

/// Batch issuance response.
#[derive(Debug, Clone, Deserialize)]
pub struct IssueCodesResponse {
    /// Issued codes in issuance order.
    pub codes: Vec<IssuedCode>,
}

/// Code counts for one category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct CategoryStats {
    /// Codes issued.
    pub total: u64,
    /// Codes not yet redeemed.
    pub unused: u64,
}

/// Code counts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CodeStats {
    /// Codes issued.
    pub total: u64,
    /// Codes not yet redeemed.
    pub unused: u64,
    /// Counts per certificate category.
    #[serde(default)]
    pub by_type: BTreeMap<String, CategoryStats>,
}

/// Result of a pending-certificate recovery run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct RecoveryReport {
    /// Certificates rendered.
    pub rendered: usize,
    /// Certificates that failed again.
    pub failed: usize,
}

/// Error response body.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiErrorResponse {
    pub error: String,
}
