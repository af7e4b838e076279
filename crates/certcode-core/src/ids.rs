//! Identifier types for certcode.
//!
//! Codes are opaque strings. Freshly issued codes are ULIDs, but any code that
//! satisfies the URL-safe alphabet is accepted so that imported or
//! hand-assigned codes keep working.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ulid::Ulid;

/// Maximum accepted length of a code, in bytes.
pub const MAX_CODE_LEN: usize = 128;

/// Path prefix under which rendered certificates are served.
pub const ARTIFACT_URL_PREFIX: &str = "/certificates/";

/// A single-use redemption code.
///
/// Only ASCII alphanumerics, `-` and `_` are allowed, so a code can be placed
/// in a query string or a file name without escaping.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Code(String);

impl Code {
    /// Generate a new unpredictable code.
    ///
    /// The code is a ULID: 48 bits of timestamp followed by 80 random bits,
    /// encoded as 26 Crockford base32 characters.
    #[must_use]
    pub fn generate() -> Self {
        Self(Ulid::new().to_string())
    }

    /// Parse a code presented by a caller.
    ///
    /// # Errors
    ///
    /// Returns an error if the code is empty, too long, or contains a
    /// character outside the URL-safe alphabet.
    pub fn parse(value: &str) -> Result<Self, IdError> {
        if value.is_empty() {
            return Err(IdError::EmptyCode);
        }
        if value.len() > MAX_CODE_LEN {
            return Err(IdError::CodeTooLong);
        }
        if let Some(c) = value
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || *c == '-' || *c == '_'))
        {
            return Err(IdError::InvalidCodeCharacter(c));
        }
        Ok(Self(value.to_string()))
    }

    /// Return the code as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Code {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Debug for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Code({})", self.0)
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Code {
    type Error = IdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Code> for String {
    fn from(code: Code) -> Self {
        code.0
    }
}

impl AsRef<[u8]> for Code {
    fn as_ref(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

/// Reference to a rendered certificate, relative to the service root.
///
/// Always of the form `/certificates/<file>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArtifactRef(String);

impl ArtifactRef {
    /// The reference reserved for a code at claim time.
    #[must_use]
    pub fn reserved_for(code: &Code) -> Self {
        Self::from_file_name(&Self::default_file_name(code))
    }

    /// Default artifact file name for a code.
    #[must_use]
    pub fn default_file_name(code: &Code) -> String {
        format!("{code}.jpg")
    }

    /// Build a reference from the file name the renderer produced.
    #[must_use]
    pub fn from_file_name(file_name: &str) -> Self {
        Self(format!(
            "{ARTIFACT_URL_PREFIX}{}",
            file_name.trim_start_matches('/')
        ))
    }

    /// Return the reference as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Return the file name part of the reference.
    #[must_use]
    pub fn file_name(&self) -> &str {
        self.0.strip_prefix(ARTIFACT_URL_PREFIX).unwrap_or(&self.0)
    }
}

impl fmt::Display for ArtifactRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<ArtifactRef> for String {
    fn from(artifact: ArtifactRef) -> Self {
        artifact.0
    }
}

/// Errors that can occur when parsing identifiers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdError {
    /// The code is empty.
    #[error("empty code")]
    EmptyCode,

    /// The code exceeds `MAX_CODE_LEN` bytes.
    #[error("code exceeds {MAX_CODE_LEN} bytes")]
    CodeTooLong,

    /// The code contains a character outside the URL-safe alphabet.
    #[error("invalid character in code: {0:?}")]
    InvalidCodeCharacter(char),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_codes_are_url_safe_ulids() {
        let code = Code::generate();
        assert_eq!(code.as_str().len(), 26);
        assert!(Ulid::from_string(code.as_str()).is_ok());
        assert_eq!(Code::parse(code.as_str()).unwrap(), code);
    }

    #[test]
    fn generated_codes_differ() {
        let a = Code::generate();
        let b = Code::generate();
        assert_ne!(a, b);
    }

    #[test]
    fn hand_assigned_codes_are_accepted() {
        let code: Code = "validcode123".parse().unwrap();
        assert_eq!(code.to_string(), "validcode123");
        assert!(Code::parse("batch-2024_a").is_ok());
    }

    #[test]
    fn malformed_codes_are_rejected() {
        assert_eq!(Code::parse(""), Err(IdError::EmptyCode));
        assert_eq!(
            Code::parse("../etc/passwd"),
            Err(IdError::InvalidCodeCharacter('.'))
        );
        assert_eq!(
            Code::parse("with space"),
            Err(IdError::InvalidCodeCharacter(' '))
        );
        assert_eq!(
            Code::parse(&"a".repeat(MAX_CODE_LEN + 1)),
            Err(IdError::CodeTooLong)
        );
    }

    #[test]
    fn code_serde_rejects_invalid() {
        let parsed: Code = serde_json::from_str("\"abc123\"").unwrap();
        assert_eq!(parsed.as_str(), "abc123");
        assert!(serde_json::from_str::<Code>("\"a/b\"").is_err());
    }

    #[test]
    fn artifact_ref_format() {
        let code = Code::parse("validcode123").unwrap();
        let reserved = ArtifactRef::reserved_for(&code);
        assert_eq!(reserved.as_str(), "/certificates/validcode123.jpg");
        assert_eq!(reserved.file_name(), "validcode123.jpg");

        let rendered = ArtifactRef::from_file_name("/validcode123-v2.jpg");
        assert_eq!(rendered.as_str(), "/certificates/validcode123-v2.jpg");
    }
}
