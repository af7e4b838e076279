//! Rendering service wire types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Request body for `POST /render`.
#[derive(Debug, Clone, Serialize)]
pub struct RenderRequest {
    /// Code printed on the certificate.
    pub code: String,
    /// Certificate category, selects the artwork.
    pub category: String,
    /// Name printed on the certificate.
    pub name: String,
    /// Redeemer email.
    pub email: String,
    /// Redemption time.
    pub redeemed_at: DateTime<Utc>,
    /// Redemption date, formatted `mm.dd.yyyy` for printing.
    pub date: String,
    /// File name the artifact should be written to.
    pub file_name: String,
}

/// Successful render response.
#[derive(Debug, Clone, Deserialize)]
pub struct RenderResponse {
    /// File name of the rendered artifact inside the certificates directory.
    pub file_name: String,
}

/// Error response from the rendering service.
#[derive(Debug, Clone, Deserialize)]
pub struct RenderErrorResponse {
    /// Error message.
    pub error: String,
}
