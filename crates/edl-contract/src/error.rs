//! # Contract Errors
//!
//! One enum for every failure a contract operation can report. Lower-layer
//! errors convert in via `From`, so operations propagate with `?`.

use serde::Serialize;
use thiserror::Error;

use edl_core::{CertificateId, ConsentId, RecordKind, SubjectId, Timestamp, ValidationError};
use edl_state::{CertificateError, ConsentError, EnvelopeError};
use edl_store::{StoreError, TxError};

/// Stable, machine-readable error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    Unauthorized,
    NotFound,
    DuplicateKey,
    AlreadyRevoked,
    Revoked,
    OwnershipMismatch,
    VerifierMismatch,
    HashMismatch,
    RevokedConsent,
    ExpiredConsent,
    AlreadyExpired,
    MalformedInput,
    StoreUnavailable,
}

impl ErrorKind {
    /// Upper-case code used in API responses.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unauthorized => "UNAUTHORIZED",
            Self::NotFound => "NOT_FOUND",
            Self::DuplicateKey => "DUPLICATE_KEY",
            Self::AlreadyRevoked => "ALREADY_REVOKED",
            Self::Revoked => "REVOKED",
            Self::OwnershipMismatch => "OWNERSHIP_MISMATCH",
            Self::VerifierMismatch => "VERIFIER_MISMATCH",
            Self::HashMismatch => "HASH_MISMATCH",
            Self::RevokedConsent => "REVOKED_CONSENT",
            Self::ExpiredConsent => "EXPIRED_CONSENT",
            Self::AlreadyExpired => "ALREADY_EXPIRED",
            Self::MalformedInput => "MALFORMED_INPUT",
            Self::StoreUnavailable => "STORE_UNAVAILABLE",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure of a contract operation.
#[derive(Error, Debug)]
pub enum ContractError {
    /// The caller may not perform this operation.
    #[error("unauthorized to {operation}: {reason}")]
    Unauthorized {
        /// Operation attempted.
        operation: &'static str,
        /// Why it was refused.
        reason: String,
    },

    /// No record with this id.
    #[error("{kind} {id} not found")]
    NotFound {
        /// Kind of record looked up.
        kind: RecordKind,
        /// Id looked up.
        id: String,
    },

    /// A record with this id already exists.
    #[error("{kind} {id} already exists")]
    DuplicateKey {
        /// Kind of record.
        kind: RecordKind,
        /// The conflicting id.
        id: String,
    },

    #[error("certificate {certificate_id} was already revoked at {revoked_at}")]
    AlreadyRevoked {
        certificate_id: CertificateId,
        revoked_at: Timestamp,
    },

    #[error("certificate {certificate_id} has been revoked")]
    Revoked { certificate_id: CertificateId },

    /// Consent requested for a certificate that belongs to someone else.
    #[error("certificate {certificate_id} does not belong to subject {subject_id}")]
    OwnershipMismatch {
        certificate_id: CertificateId,
        subject_id: SubjectId,
    },

    #[error("consent {consent_id} was not granted to this verifier")]
    VerifierMismatch { consent_id: ConsentId },

    #[error("certificate {certificate_id} hash mismatch")]
    HashMismatch { certificate_id: CertificateId },

    #[error("consent {consent_id} has been revoked")]
    RevokedConsent { consent_id: ConsentId },

    /// The consent lapsed and has just been marked EXPIRED. This failure
    /// commits.
    #[error("consent {consent_id} expired at {expires_at}")]
    ExpiredConsent {
        consent_id: ConsentId,
        expires_at: Timestamp,
    },

    #[error("consent {consent_id} is expired")]
    AlreadyExpired { consent_id: ConsentId },

    /// Input failed validation, or a stored record could not be decoded.
    #[error("malformed input: {0}")]
    MalformedInput(String),

    /// The ledger failed; propagated verbatim.
    #[error("ledger error: {0}")]
    StoreUnavailable(#[from] StoreError),
}

impl ContractError {
    /// Classification of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Unauthorized { .. } => ErrorKind::Unauthorized,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::DuplicateKey { .. } => ErrorKind::DuplicateKey,
            Self::AlreadyRevoked { .. } => ErrorKind::AlreadyRevoked,
            Self::Revoked { .. } => ErrorKind::Revoked,
            Self::OwnershipMismatch { .. } => ErrorKind::OwnershipMismatch,
            Self::VerifierMismatch { .. } => ErrorKind::VerifierMismatch,
            Self::HashMismatch { .. } => ErrorKind::HashMismatch,
            Self::RevokedConsent { .. } => ErrorKind::RevokedConsent,
            Self::ExpiredConsent { .. } => ErrorKind::ExpiredConsent,
            Self::AlreadyExpired { .. } => ErrorKind::AlreadyExpired,
            Self::MalformedInput(_) => ErrorKind::MalformedInput,
            Self::StoreUnavailable(_) => ErrorKind::StoreUnavailable,
        }
    }

    pub(crate) fn not_found(kind: RecordKind, id: impl std::fmt::Display) -> Self {
        Self::NotFound {
            kind,
            id: id.to_string(),
        }
    }

    pub(crate) fn unauthorized(operation: &'static str, reason: impl Into<String>) -> Self {
        Self::Unauthorized {
            operation,
            reason: reason.into(),
        }
    }
}

impl TxError for ContractError {
    fn commits_writes(&self) -> bool {
        matches!(self, Self::ExpiredConsent { .. })
    }
}

impl From<ValidationError> for ContractError {
    fn from(err: ValidationError) -> Self {
        Self::MalformedInput(err.to_string())
    }
}

impl From<EnvelopeError> for ContractError {
    fn from(err: EnvelopeError) -> Self {
        Self::MalformedInput(err.to_string())
    }
}

impl From<CertificateError> for ContractError {
    fn from(err: CertificateError) -> Self {
        match err {
            CertificateError::HashMismatch { certificate_id } => Self::HashMismatch { certificate_id },
            CertificateError::Revoked { certificate_id } => Self::Revoked { certificate_id },
            CertificateError::AlreadyRevoked {
                certificate_id,
                revoked_at,
            } => Self::AlreadyRevoked {
                certificate_id,
                revoked_at,
            },
        }
    }
}

impl From<ConsentError> for ContractError {
    fn from(err: ConsentError) -> Self {
        match err {
            ConsentError::VerifierMismatch { consent_id } => Self::VerifierMismatch { consent_id },
            ConsentError::RevokedConsent { consent_id } => Self::RevokedConsent { consent_id },
            ConsentError::AlreadyExpired { consent_id } => Self::AlreadyExpired { consent_id },
            ConsentError::ExpiredConsent {
                consent_id,
                expires_at,
            } => Self::ExpiredConsent {
                consent_id,
                expires_at,
            },
            ConsentError::InvalidDuration { days } => {
                Self::MalformedInput(format!("consent duration must be a positive number of days, got {days}"))
            }
        }
    }
}
