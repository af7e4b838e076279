//! Router configuration.
//!
//! This module sets up the Axum router with all routes and middleware.

use std::sync::Arc;
use std::time::Duration;

use axum::routing::{get, post};
use axum::Router;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::services::ServeDir;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::handlers::{certificate, codes, health};
use crate::state::AppState;

// ============================================================================
// Concurrency Limiting Constants
// ============================================================================

/// Maximum concurrent requests for recipient endpoints.
/// Each redemption may hold a slot for a full certificate render.
const CERTIFICATE_MAX_CONCURRENT_REQUESTS: usize = 100;

/// Maximum concurrent requests for admin endpoints.
const ADMIN_MAX_CONCURRENT_REQUESTS: usize = 10;

/// Create the service router with all routes and middleware.
///
/// # Routes
///
/// ## Public
/// - `GET /health` - Health check
/// - `GET /certificates/{file}` - Rendered certificates
///
/// ## Recipients (code is the credential, rate-limited)
/// - `GET /certificate?code=` - Validate a code
/// - `POST /certificate` - Redeem a code and render the certificate
/// - `POST /certificate/retry` - Render a redeemed code's certificate again
///
/// ## Admin (`X-Admin-Key` auth, rate-limited)
/// - `POST /v1/codes` - Issue a batch of codes
/// - `GET /v1/codes/stats` - Code counts
/// - `POST /v1/codes/recover` - Render all pending certificates
pub fn create_router(state: AppState) -> Router {
    // Extract config values before moving state
    let cors_origins = state.config.cors_origins.clone();
    let certificates_dir = state.config.certificates_dir.clone();
    let max_body_bytes = state.config.max_body_bytes;
    let request_timeout_seconds = state.config.request_timeout_seconds;

    let cors = build_cors_layer(&cors_origins);

    let state = Arc::new(state);

    let certificate_routes = Router::new()
        .route(
            "/certificate",
            get(certificate::validate_code).post(certificate::redeem_code),
        )
        .route("/certificate/retry", post(certificate::retry_render))
        .layer(ConcurrencyLimitLayer::new(CERTIFICATE_MAX_CONCURRENT_REQUESTS));

    let admin_routes = Router::new()
        .route("/codes", post(codes::issue_codes))
        .route("/codes/stats", get(codes::code_stats))
        .route("/codes/recover", post(codes::recover_pending))
        .layer(ConcurrencyLimitLayer::new(ADMIN_MAX_CONCURRENT_REQUESTS));

    Router::new()
        // Health (public, no rate limit)
        .route("/health", get(health::health))
        .merge(certificate_routes)
        .nest("/v1", admin_routes)
        // Rendered artifacts, written by the renderer into the shared directory
        .nest_service("/certificates", ServeDir::new(certificates_dir))
        // Global middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .layer(TimeoutLayer::new(Duration::from_secs(
            request_timeout_seconds,
        )))
        .with_state(state)
}

/// Build the CORS layer from configured origins.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|o| o == "*") {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    }
}
