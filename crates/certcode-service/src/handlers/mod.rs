//! API handlers.

pub mod certificate;
pub mod codes;
pub mod health;
