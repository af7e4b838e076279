//! Error types for certcode storage.

use certcode_core::CodeError;

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors that can occur in storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Database operation failed.
    #[error("database error: {0}")]
    Database(String),

    /// Serialization/deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// No record exists for the code.
    #[error("code not found")]
    NotFound,

    /// The code has already been claimed.
    #[error("code already used")]
    AlreadyUsed,

    /// The code is still unused, so it has no artifact to finalize.
    #[error("code not redeemed")]
    NotRedeemed,

    /// A record with the same code already exists.
    #[error("duplicate code: {code}")]
    DuplicateCode {
        /// The code that already exists.
        code: String,
    },
}

impl From<StoreError> for CodeError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => Self::NotFound,
            StoreError::AlreadyUsed => Self::AlreadyUsed,
            StoreError::NotRedeemed => Self::NotRedeemed,
            StoreError::DuplicateCode { code } => Self::DuplicateCode(code),
            StoreError::Database(msg) | StoreError::Serialization(msg) => Self::Storage(msg),
        }
    }
}

impl From<CodeError> for StoreError {
    /// Lift a record-level transition error into a store error.
    fn from(err: CodeError) -> Self {
        match err {
            CodeError::NotFound => Self::NotFound,
            CodeError::AlreadyUsed => Self::AlreadyUsed,
            CodeError::NotRedeemed => Self::NotRedeemed,
            CodeError::DuplicateCode(code) => Self::DuplicateCode { code },
            other => Self::Database(other.to_string()),
        }
    }
}
