//! Read-only code validation.

use std::sync::Arc;

use certcode_core::{Code, CodeError, CodeState};
use certcode_store::CodeStore;

/// Result of validating a redeemable code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Validation {
    /// The code exists and has not been redeemed.
    Valid {
        /// Certificate category of the code.
        category: String,
    },
}

/// Checks whether a code can be redeemed. Never mutates the store.
#[derive(Clone)]
pub struct CodeValidator {
    store: Arc<dyn CodeStore>,
}

impl CodeValidator {
    /// Create a validator over `store`.
    #[must_use]
    pub fn new(store: Arc<dyn CodeStore>) -> Self {
        Self { store }
    }

    /// Validate a code presented by a caller.
    ///
    /// # Errors
    ///
    /// - `CodeError::NotFound` if the code was never issued or is malformed.
    /// - `CodeError::AlreadyUsed` if the code has been redeemed.
    /// - `CodeError::Storage` if the store fails.
    pub fn validate(&self, code: &str) -> Result<Validation, CodeError> {
        let code = Code::parse(code.trim())?;
        let record = self.store.get(&code)?;

        match record.state() {
            CodeState::Unused => Ok(Validation::Valid {
                category: record.category,
            }),
            CodeState::Used => Err(CodeError::AlreadyUsed),
        }
    }
}
