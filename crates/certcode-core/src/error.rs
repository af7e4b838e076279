//! Error types for certcode.

use crate::ids::IdError;

/// Result type for certcode operations.
pub type Result<T> = std::result::Result<T, CodeError>;

/// Errors that can occur across the code lifecycle.
///
/// `NotFound`, `AlreadyUsed` and `NotRedeemed` are kept apart here so they can
/// be logged precisely. The HTTP layer reports all three identically.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodeError {
    /// The code was never issued.
    #[error("code not found")]
    NotFound,

    /// The code has already been redeemed.
    #[error("code already used")]
    AlreadyUsed,

    /// A required request field is missing or empty.
    #[error("invalid request: missing or empty field `{0}`")]
    InvalidRequest(&'static str),

    /// The requested batch size is zero or above the configured maximum.
    #[error("invalid count: {0}")]
    InvalidCount(String),

    /// The certificate category is empty.
    #[error("invalid category")]
    InvalidCategory,

    /// A generated code collided with an existing one.
    #[error("duplicate code: {0}")]
    DuplicateCode(String),

    /// A render retry was requested for a code that was never redeemed.
    #[error("code not redeemed")]
    NotRedeemed,

    /// The external renderer failed after the code was claimed.
    #[error("rendering failed: {0}")]
    RenderingFailure(String),

    /// Storage backend failure.
    #[error("storage error: {0}")]
    Storage(String),
}

impl CodeError {
    /// Whether the error must be reported as the generic "invalid or used code".
    #[must_use]
    pub const fn is_invalid_or_used(&self) -> bool {
        matches!(self, Self::NotFound | Self::AlreadyUsed | Self::NotRedeemed)
    }
}

impl From<IdError> for CodeError {
    fn from(err: IdError) -> Self {
        match err {
            // A code that cannot be parsed can never have been issued.
            IdError::EmptyCode | IdError::CodeTooLong | IdError::InvalidCodeCharacter(_) => {
                Self::NotFound
            }
        }
    }
}
