//! Certcode Client SDK.
//!
//! This crate provides a client library for the certcode HTTP API: the
//! recipient flow (validate, redeem, retry) and the admin endpoints.
//!
//! # Example
//!
//! ```no_run
//! use certcode_client::{CertcodeClient, ClientOptions};
//!
//! # async fn example() -> Result<(), certcode_client::ClientError> {
//! let client = CertcodeClient::new("http://certcode:8080")?;
//!
//! client.validate("01J7Z3K8ZQ6V3YQ0F6M2C2W4XR").await?;
//! let certificate = client
//!     .redeem("01J7Z3K8ZQ6V3YQ0F6M2C2W4XR", "John Doe", "johndoe@example.com")
//!     .await?;
//! println!("Certificate at {}", client.certificate_url(&certificate));
//!
//! // Admin endpoints need the admin key
//! let admin = CertcodeClient::with_options(
//!     "http://certcode:8080",
//!     ClientOptions::with_admin_key("admin-key"),
//! )?;
//! let codes = admin.issue_codes(100, "Kraftakt", &[]).await?;
//! println!("Issued {} codes", codes.len());
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod client;
mod error;
mod types;

pub use client::{CertcodeClient, ClientOptions};
pub use error::ClientError;
pub use types::*;
