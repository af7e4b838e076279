//! Code lifecycle components.
//!
//! - [`CodeIssuer`] fills the store with unused codes.
//! - [`CodeValidator`] reads a code's state without changing it.
//! - [`RedemptionProcessor`] claims a code and has its certificate rendered.
//!
//! All three share one store handle; none of them keeps state of its own.

pub mod issuer;
pub mod redemption;
pub mod validator;

pub use issuer::{CodeIssuer, IssueBatch, IssuedCode};
pub use redemption::{RecoveryReport, RedemptionProcessor};
pub use validator::{CodeValidator, Validation};
