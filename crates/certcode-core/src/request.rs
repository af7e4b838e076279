//! Validated redemption requests.

use crate::error::{CodeError, Result};
use crate::ids::Code;
use crate::record::Redeemer;

/// A redemption request whose required fields have been checked.
///
/// Building one never touches storage, so malformed payloads are rejected
/// before any state is read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedemptionRequest {
    /// The code being redeemed.
    pub code: Code,
    /// Who the certificate is for.
    pub redeemer: Redeemer,
}

impl RedemptionRequest {
    /// Validate the raw request fields.
    ///
    /// Fields are trimmed. The checks run in the order `code`, `name`,
    /// `email`, and the first missing field is reported.
    ///
    /// # Errors
    ///
    /// - `CodeError::InvalidRequest` if a field is absent or blank.
    /// - `CodeError::NotFound` if the code is present but malformed, since
    ///   such a code can never have been issued.
    pub fn new(code: Option<&str>, name: Option<&str>, email: Option<&str>) -> Result<Self> {
        let code = required("code", code)?;
        let name = required("name", name)?;
        let email = required("email", email)?;

        Ok(Self {
            code: Code::parse(code)?,
            redeemer: Redeemer {
                name: name.to_string(),
                email: email.to_string(),
            },
        })
    }
}

fn required<'a>(field: &'static str, value: Option<&'a str>) -> Result<&'a str> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(CodeError::InvalidRequest(field)),
    }
}
