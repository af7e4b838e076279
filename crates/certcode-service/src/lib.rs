//! Certcode HTTP API Service.
//!
//! This crate provides the code lifecycle and the HTTP API around it:
//!
//! - Code validation and redemption for certificate recipients
//! - Certificate rendering through an external renderer
//! - Batch issuance, statistics and render recovery for administrators
//!
//! # Authentication
//!
//! Recipient endpoints are public; a code is its own credential. Admin
//! endpoints under `/v1` require the `X-Admin-Key` header.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
// Allow some pedantic lints that are noisy for Axum handler functions
#![allow(clippy::missing_errors_doc)] // Axum handlers all return Result
#![allow(clippy::unused_async)] // Handlers are async for a uniform router

pub mod auth;
pub mod codes;
pub mod config;
pub mod error;
pub mod handlers;
pub mod render;
pub mod routes;
pub mod state;

pub use codes::{CodeIssuer, CodeValidator, RecoveryReport, RedemptionProcessor};
pub use config::ServiceConfig;
pub use error::ApiError;
pub use render::{CertificateRenderer, HttpRenderer, RenderError, RenderJob};
pub use routes::create_router;
pub use state::AppState;
