//! Core types for certcode.
//!
//! This crate provides the foundational types shared by the store, the service
//! and the client:
//!
//! - **Identifiers**: `Code`, `ArtifactRef`
//! - **Records**: `CodeRecord`, `Redemption`, `Redeemer`, `CodeState`, `ArtifactStatus`
//! - **Requests**: `RedemptionRequest`
//! - **Errors**: `CodeError`
//!
//! # Code lifecycle
//!
//! ```text
//! UNUSED --claim--> USED(pending artifact) --render--> USED(rendered artifact)
//! ```
//!
//! A code is claimed exactly once. The claim is never rolled back, even when
//! rendering the certificate fails afterwards.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod ids;
pub mod record;
pub mod request;

pub use error::{CodeError, Result};
pub use ids::{ArtifactRef, Code, IdError, ARTIFACT_URL_PREFIX, MAX_CODE_LEN};
pub use record::{ArtifactStatus, CodeRecord, CodeState, Redeemer, Redemption};
pub use request::RedemptionRequest;
