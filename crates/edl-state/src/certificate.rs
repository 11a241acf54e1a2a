//! # Certificate Lifecycle State Machine
//!
//! Models an academic certificate from issuance to (optional) revocation.
//!
//! ## States
//!
//! ```text
//! VALID ──▶ REVOKED (terminal)
//! ```
//!
//! ## Invariants
//!
//! - `certificate_id` never changes once issued.
//! - `REVOKED` never returns to `VALID`.
//! - `revoked_at` is present iff the status is `REVOKED`.
//!
//! Revocation is deliberately not idempotent: revoking twice is reported as
//! [`CertificateError::AlreadyRevoked`] so that duplicate revocation
//! attempts surface instead of silently rewriting the reason.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use edl_core::{CertificateId, ContentHash, IssuerId, SubjectId, Timestamp};

/// Free-form certificate attributes (degree, major, GPA, ...).
pub type Metadata = BTreeMap<String, serde_json::Value>;

// ─── Certificate Status ──────────────────────────────────────────────

/// Revocation status of a certificate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CertificateStatus {
    /// Certificate is in force.
    #[default]
    Valid,
    /// Certificate has been revoked by its issuer (terminal).
    Revoked,
}

impl CertificateStatus {
    /// Whether this status is terminal.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Revoked)
    }

    /// Stable upper-case name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Valid => "VALID",
            Self::Revoked => "REVOKED",
        }
    }
}

impl std::fmt::Display for CertificateStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── Errors ──────────────────────────────────────────────────────────

/// Errors raised by certificate checks and transitions.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CertificateError {
    /// The presented content hash differs from the stored one.
    #[error("certificate {certificate_id} hash mismatch")]
    HashMismatch {
        /// Certificate that failed the integrity check.
        certificate_id: CertificateId,
    },

    /// The certificate has been revoked.
    #[error("certificate {certificate_id} has been revoked")]
    Revoked {
        /// The revoked certificate.
        certificate_id: CertificateId,
    },

    /// A revocation was attempted on an already revoked certificate.
    #[error("certificate {certificate_id} was already revoked at {revoked_at}")]
    AlreadyRevoked {
        /// The revoked certificate.
        certificate_id: CertificateId,
        /// When the original revocation happened.
        revoked_at: Timestamp,
    },
}

// ─── Issuance Request ────────────────────────────────────────────────

/// Everything an issuer supplies when putting a certificate on the ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CertificateIssuance {
    /// Primary key of the new certificate.
    pub certificate_id: CertificateId,
    /// Fingerprint of the off-ledger certificate document.
    pub content_hash: ContentHash,
    /// Issuing institution.
    pub issuer_id: IssuerId,
    /// The student the certificate describes.
    pub subject_id: SubjectId,
    /// Institution-local student number, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject_reference: Option<String>,
    /// Content-addressed location of the document (e.g. an IPFS CID).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_uri: Option<String>,
    /// Free-form attributes.
    #[serde(default)]
    pub metadata: Metadata,
}

// ─── Certificate ─────────────────────────────────────────────────────

/// An academic certificate as held on the ledger.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Certificate {
    /// Primary key.
    pub certificate_id: CertificateId,
    /// Fingerprint of the off-ledger document.
    pub content_hash: ContentHash,
    /// Issuing institution; only it may revoke.
    pub issuer_id: IssuerId,
    /// The student the certificate describes.
    pub subject_id: SubjectId,
    /// Institution-local student number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject_reference: Option<String>,
    /// Content-addressed location of the document.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_uri: Option<String>,
    /// When the certificate was issued.
    pub issued_at: Timestamp,
    /// Current revocation status.
    pub status: CertificateStatus,
    /// When the certificate was revoked. Present iff `status == REVOKED`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revoked_at: Option<Timestamp>,
    /// Issuer's stated reason for revocation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revocation_reason: Option<String>,
    /// Free-form attributes.
    #[serde(default)]
    pub metadata: Metadata,
}

impl Certificate {
    /// Materialize a newly issued certificate.
    pub fn issue(issuance: CertificateIssuance, issued_at: Timestamp) -> Self {
        Self {
            certificate_id: issuance.certificate_id,
            content_hash: issuance.content_hash,
            issuer_id: issuance.issuer_id,
            subject_id: issuance.subject_id,
            subject_reference: issuance.subject_reference,
            document_uri: issuance.document_uri,
            issued_at,
            status: CertificateStatus::Valid,
            revoked_at: None,
            revocation_reason: None,
            metadata: issuance.metadata,
        }
    }

    /// Check a presented hash against the stored one.
    ///
    /// The hash is checked before the revocation status so that a tampered
    /// document and a revoked certificate produce different errors.
    pub fn verify(&self, presented: &ContentHash) -> Result<(), CertificateError> {
        if !self.content_hash.matches(presented) {
            return Err(CertificateError::HashMismatch {
                certificate_id: self.certificate_id.clone(),
            });
        }
        if self.status == CertificateStatus::Revoked {
            return Err(CertificateError::Revoked {
                certificate_id: self.certificate_id.clone(),
            });
        }
        Ok(())
    }

    /// Revoke the certificate (VALID → REVOKED).
    pub fn revoke(&mut self, reason: impl Into<String>, at: Timestamp) -> Result<(), CertificateError> {
        if self.status.is_terminal() {
            return Err(CertificateError::AlreadyRevoked {
                certificate_id: self.certificate_id.clone(),
                revoked_at: self.revoked_at.unwrap_or_default(),
            });
        }
        self.status = CertificateStatus::Revoked;
        self.revoked_at = Some(at);
        self.revocation_reason = Some(reason.into());
        Ok(())
    }

    /// Whether the certificate is currently in force.
    pub fn is_valid(&self) -> bool {
        self.status == CertificateStatus::Valid
    }
}

// ─── Tests ───────────────────────────────────────────────────────────
