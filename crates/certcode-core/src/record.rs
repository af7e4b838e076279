//! Code records.
//!
//! A `CodeRecord` is created once at issuance and changes at most twice
//! afterwards: when it is claimed, and when its certificate has been rendered.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CodeError, Result};
use crate::ids::{ArtifactRef, Code};

/// Externally visible state of a code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CodeState {
    /// Issued and not yet redeemed.
    Unused,
    /// Redeemed. Never returns to `Unused`.
    Used,
}

/// Rendering progress of a claimed code's certificate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactStatus {
    /// The code is claimed, the certificate has not been rendered yet.
    Pending,
    /// The certificate has been rendered and the final reference stored.
    Rendered,
}

/// The person a code was redeemed for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Redeemer {
    /// Name printed on the certificate.
    pub name: String,
    /// Contact email of the redeemer.
    pub email: String,
}

impl Redeemer {
    /// Whether `email` belongs to this redeemer (ASCII case-insensitive).
    #[must_use]
    pub fn matches_email(&self, email: &str) -> bool {
        self.email.eq_ignore_ascii_case(email.trim())
    }
}

/// Everything recorded by a successful claim.
///
/// These fields only exist together, so a partially redeemed record cannot be
/// represented.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Redemption {
    /// Who redeemed the code.
    pub redeemer: Redeemer,
    /// Artifact reference: reserved at claim time, final once rendered.
    pub artifact_ref: ArtifactRef,
    /// Rendering progress.
    pub artifact_status: ArtifactStatus,
    /// When the code was claimed.
    pub redeemed_at: DateTime<Utc>,
    /// When the certificate was rendered.
    pub rendered_at: Option<DateTime<Utc>>,
}

/// A stored code and its lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeRecord {
    /// The code itself.
    pub code: Code,
    /// Certificate category (type) assigned at issuance.
    pub category: String,
    /// Free-form labels assigned at issuance.
    #[serde(default)]
    pub tags: Vec<String>,
    /// When the code was issued.
    pub created_at: DateTime<Utc>,
    /// Present once the code has been claimed.
    pub redemption: Option<Redemption>,
}

impl CodeRecord {
    /// Create a new, unused record.
    #[must_use]
    pub fn new(code: Code, category: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            code,
            category: category.into(),
            tags: Vec::new(),
            created_at,
            redemption: None,
        }
    }

    /// Attach tags to the record.
    #[must_use]
    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    /// Current state of the code.
    #[must_use]
    pub const fn state(&self) -> CodeState {
        if self.redemption.is_some() {
            CodeState::Used
        } else {
            CodeState::Unused
        }
    }

    /// Whether the code can still be redeemed.
    #[must_use]
    pub const fn is_unused(&self) -> bool {
        self.redemption.is_none()
    }

    /// Whether the code is claimed but its certificate is not rendered yet.
    #[must_use]
    pub fn is_pending_artifact(&self) -> bool {
        self.redemption
            .as_ref()
            .is_some_and(|r| r.artifact_status == ArtifactStatus::Pending)
    }

    /// Claim the code for `redeemer`.
    ///
    /// Callers must hold whatever per-code exclusion their backend uses; this
    /// method only enforces the state transition.
    ///
    /// # Errors
    ///
    /// Returns `CodeError::AlreadyUsed` if the code has been claimed before.
    /// The record is left untouched in that case.
    pub fn claim(
        &mut self,
        redeemer: Redeemer,
        artifact_ref: ArtifactRef,
        now: DateTime<Utc>,
    ) -> Result<()> {
        if self.redemption.is_some() {
            return Err(CodeError::AlreadyUsed);
        }
        self.redemption = Some(Redemption {
            redeemer,
            artifact_ref,
            artifact_status: ArtifactStatus::Pending,
            redeemed_at: now,
            rendered_at: None,
        });
        Ok(())
    }

    /// Record the final artifact of a claimed code.
    ///
    /// Repeating the call with a rendered record keeps the first render time.
    ///
    /// # Errors
    ///
    /// Returns `CodeError::NotRedeemed` if the code is still unused.
    pub fn finalize_artifact(
        &mut self,
        artifact_ref: ArtifactRef,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let redemption = self.redemption.as_mut().ok_or(CodeError::NotRedeemed)?;
        redemption.artifact_ref = artifact_ref;
        if redemption.artifact_status == ArtifactStatus::Pending {
            redemption.artifact_status = ArtifactStatus::Rendered;
            redemption.rendered_at = Some(now);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> CodeRecord {
        CodeRecord::new(Code::parse("validcode123").unwrap(), "Kraftakt", Utc::now())
    }

    fn redeemer() -> Redeemer {
        Redeemer {
            name: "John Doe".into(),
            email: "johndoe@example.com".into(),
        }
    }

    #[test]
    fn new_record_is_unused() {
        let record = record();
        assert_eq!(record.state(), CodeState::Unused);
        assert!(record.is_unused());
        assert!(!record.is_pending_artifact());
    }

    #[test]
    fn claim_sets_all_redemption_fields() {
        let mut record = record();
        let reserved = ArtifactRef::reserved_for(&record.code);
        let now = Utc::now();

        record.claim(redeemer(), reserved.clone(), now).unwrap();

        assert_eq!(record.state(), CodeState::Used);
        let redemption = record.redemption.as_ref().unwrap();
        assert_eq!(redemption.redeemer, redeemer());
        assert_eq!(redemption.artifact_ref, reserved);
        assert_eq!(redemption.artifact_status, ArtifactStatus::Pending);
        assert_eq!(redemption.redeemed_at, now);
        assert!(redemption.rendered_at.is_none());
        assert!(record.is_pending_artifact());
    }

    #[test]
    fn second_claim_is_rejected_without_mutation() {
        let mut record = record();
        record
            .claim(redeemer(), ArtifactRef::reserved_for(&record.code), Utc::now())
            .unwrap();
        let before = record.clone();

        let other = Redeemer {
            name: "Jane Roe".into(),
            email: "jane@example.com".into(),
        };
        let result = record.claim(other, ArtifactRef::from_file_name("x.jpg"), Utc::now());

        assert_eq!(result, Err(CodeError::AlreadyUsed));
        assert_eq!(record, before);
    }

    #[test]
    fn finalize_requires_claim() {
        let mut record = record();
        let result = record.finalize_artifact(ArtifactRef::from_file_name("a.jpg"), Utc::now());
        assert_eq!(result, Err(CodeError::NotRedeemed));
        assert!(record.is_unused());
    }

    #[test]
    fn finalize_is_idempotent() {
        let mut record = record();
        record
            .claim(redeemer(), ArtifactRef::reserved_for(&record.code), Utc::now())
            .unwrap();

        let final_ref = ArtifactRef::from_file_name("validcode123.jpg");
        record.finalize_artifact(final_ref.clone(), Utc::now()).unwrap();
        let first_rendered_at = record.redemption.as_ref().unwrap().rendered_at;

        record.finalize_artifact(final_ref.clone(), Utc::now()).unwrap();
        let redemption = record.redemption.as_ref().unwrap();
        assert_eq!(redemption.artifact_status, ArtifactStatus::Rendered);
        assert_eq!(redemption.artifact_ref, final_ref);
        assert_eq!(redemption.rendered_at, first_rendered_at);
        assert!(!record.is_pending_artifact());
    }

    #[test]
    fn email_match_ignores_case_and_whitespace() {
        let redeemer = redeemer();
        assert!(redeemer.matches_email(" JohnDoe@Example.com "));
        assert!(!redeemer.matches_email("someone@example.com"));
    }
}
