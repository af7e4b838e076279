//! Certificate rendering.
//!
//! Rendering the artwork is done by an external service. This module defines
//! the seam the redemption processor calls through, and an HTTP client for
//! the rendering service.
//!
//! Renderers must be idempotent per code: rendering the same code twice
//! overwrites the same artifact instead of producing a second certificate.

pub mod client;
pub mod types;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use certcode_core::{ArtifactRef, Code, CodeRecord};

pub use client::HttpRenderer;

/// Everything a renderer needs to produce one certificate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderJob {
    /// The redeemed code, printed on the certificate.
    pub code: Code,
    /// Certificate category.
    pub category: String,
    /// Redeemer name.
    pub name: String,
    /// Redeemer email.
    pub email: String,
    /// When the code was redeemed.
    pub redeemed_at: DateTime<Utc>,
}

impl RenderJob {
    /// Build a job from a claimed record. Returns `None` for unused records.
    #[must_use]
    pub fn from_record(record: &CodeRecord) -> Option<Self> {
        let redemption = record.redemption.as_ref()?;
        Some(Self {
            code: record.code.clone(),
            category: record.category.clone(),
            name: redemption.redeemer.name.clone(),
            email: redemption.redeemer.email.clone(),
            redeemed_at: redemption.redeemed_at,
        })
    }
}

/// Errors that can occur while rendering a certificate.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The renderer answered with an error.
    #[error("renderer error: {status} - {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Error message.
        message: String,
    },

    /// The renderer did not finish in time.
    #[error("renderer timed out after {0}s")]
    Timeout(u64),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Configuration(String),
}

/// Produces the certificate artifact for a claimed code.
#[async_trait]
pub trait CertificateRenderer: Send + Sync {
    /// Render the certificate and return a reference to the artifact.
    ///
    /// # Errors
    ///
    /// Returns an error if the artifact could not be produced.
    async fn render(&self, job: &RenderJob) -> Result<ArtifactRef, RenderError>;
}
