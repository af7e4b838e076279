//! Application state.

use std::sync::Arc;
use std::time::Duration;

use certcode_store::CodeStore;

use crate::codes::{CodeIssuer, CodeValidator, RedemptionProcessor};
use crate::config::ServiceConfig;
use crate::render::CertificateRenderer;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// The storage backend.
    pub store: Arc<dyn CodeStore>,

    /// Service configuration.
    pub config: ServiceConfig,

    /// Batch code issuance.
    pub issuer: CodeIssuer,

    /// Read-only code checks.
    pub validator: CodeValidator,

    /// Claims and certificate rendering.
    pub redemption: RedemptionProcessor,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(
        store: Arc<dyn CodeStore>,
        renderer: Arc<dyn CertificateRenderer>,
        config: ServiceConfig,
    ) -> Self {
        let issuer = CodeIssuer::new(
            Arc::clone(&store),
            &config.public_base_url,
            config.max_batch_size,
        );
        let validator = CodeValidator::new(Arc::clone(&store));
        let redemption = RedemptionProcessor::new(
            Arc::clone(&store),
            renderer,
            Duration::from_secs(config.render_timeout_seconds),
        );

        if config.admin_api_key.is_none() {
            tracing::warn!(
                "ADMIN_API_KEY not configured - admin endpoints will reject all requests"
            );
        }

        Self {
            store,
            config,
            issuer,
            validator,
            redemption,
        }
    }
}
