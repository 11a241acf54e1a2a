//! # Consent Lifecycle State Machine
//!
//! Models a subject's time-bounded grant of access to one certificate for
//! one verifier, restricted to a set of metadata fields.
//!
//! ## States
//!
//! ```text
//! ACTIVE ──▶ REVOKED (terminal)
//!    │
//!    └────▶ EXPIRED (terminal)
//! ```
//!
//! ## Lazy Expiry
//!
//! Nothing sweeps consents in the background. An ACTIVE consent whose
//! `expires_at` has passed stays ACTIVE in storage until the next access
//! attempt, which moves it to EXPIRED and fails. Readers that need the
//! truth between accesses use [`ConsentRecord::effective_status`].
//!
//! ## Access Check Order
//!
//! 1. verifier must match,
//! 2. status must be ACTIVE,
//! 3. expiry (transition to EXPIRED, fail),
//! 4. otherwise count the access.
//!
//! Steps 3 and 4 each mutate the record exactly once; steps 1 and 2 never
//! mutate.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use edl_core::{CertificateId, ConsentId, SubjectId, Timestamp, VerifierId};

/// Metadata field names a verifier may see.
pub type DataScope = BTreeSet<String>;

// ─── Consent Status ──────────────────────────────────────────────────

/// The lifecycle state of a consent grant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConsentStatus {
    /// Consent is in force.
    #[default]
    Active,
    /// Subject withdrew consent (terminal).
    Revoked,
    /// Consent lapsed past its expiry (terminal).
    Expired,
}

impl ConsentStatus {
    /// Whether this state is terminal.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Revoked | Self::Expired)
    }

    /// Stable upper-case name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "ACTIVE",
            Self::Revoked => "REVOKED",
            Self::Expired => "EXPIRED",
        }
    }
}

impl std::fmt::Display for ConsentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ConsentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "ACTIVE" => Ok(Self::Active),
            "REVOKED" => Ok(Self::Revoked),
            "EXPIRED" => Ok(Self::Expired),
            other => Err(format!("unknown consent status {other:?}")),
        }
    }
}

// ─── Errors ──────────────────────────────────────────────────────────

/// Errors raised by consent checks and transitions.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConsentError {
    /// The requesting verifier is not the one consent was granted to.
    #[error("consent {consent_id} was not granted to this verifier")]
    VerifierMismatch {
        /// The consent being accessed.
        consent_id: ConsentId,
    },

    /// The consent was revoked by its subject.
    #[error("consent {consent_id} has been revoked")]
    RevokedConsent {
        /// The revoked consent.
        consent_id: ConsentId,
    },

    /// The consent was already found expired by an earlier access.
    #[error("consent {consent_id} is expired")]
    AlreadyExpired {
        /// The expired consent.
        consent_id: ConsentId,
    },

    /// The consent passed its expiry and has just transitioned to EXPIRED.
    ///
    /// Unlike every other error, the record **was** mutated and must be
    /// persisted.
    #[error("consent {consent_id} expired at {expires_at}")]
    ExpiredConsent {
        /// The consent that lapsed.
        consent_id: ConsentId,
        /// Its expiry time.
        expires_at: Timestamp,
    },

    /// Grant duration is zero or overflows the timestamp range.
    #[error("consent duration of {days} days is invalid")]
    InvalidDuration {
        /// The rejected duration.
        days: i64,
    },
}

impl ConsentError {
    /// Whether the record was mutated despite the failure.
    pub fn mutated_record(&self) -> bool {
        matches!(self, Self::ExpiredConsent { .. })
    }
}

// ─── Grant Request ───────────────────────────────────────────────────

/// Everything a subject supplies when granting consent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsentGrant {
    /// Primary key of the new consent.
    pub consent_id: ConsentId,
    /// The student granting access.
    pub subject_id: SubjectId,
    /// The employer receiving access.
    pub verifier_id: VerifierId,
    /// The certificate access is granted to.
    pub certificate_id: CertificateId,
    /// Why access is granted ("employment", "transfer", ...).
    pub purpose: String,
    /// Metadata fields the verifier may see.
    pub data_scope: DataScope,
    /// Lifetime of the grant in days.
    pub duration_days: i64,
}

// ─── Consent Record ──────────────────────────────────────────────────

/// A consent grant as held on the ledger.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsentRecord {
    /// Primary key.
    pub consent_id: ConsentId,
    /// The student who granted access.
    pub subject_id: SubjectId,
    /// The employer granted access.
    pub verifier_id: VerifierId,
    /// The certificate access was granted to.
    pub certificate_id: CertificateId,
    /// Why access was granted.
    pub purpose: String,
    /// Metadata fields the verifier may see.
    #[serde(default)]
    pub data_scope: DataScope,
    /// When consent was granted.
    pub granted_at: Timestamp,
    /// When consent lapses. Always after `granted_at`.
    pub expires_at: Timestamp,
    /// Stored lifecycle state (may lag true expiry, see module docs).
    pub status: ConsentStatus,
    /// Number of successful accesses. Never decreases.
    #[serde(default)]
    pub access_count: u64,
    /// Time of the most recent successful access.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_accessed_at: Option<Timestamp>,
    /// When the subject revoked the consent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revoked_at: Option<Timestamp>,
    /// Subject's stated reason for revocation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revocation_reason: Option<String>,
}

impl ConsentRecord {
    /// Materialize a new ACTIVE consent expiring `duration_days` after `now`.
    pub fn grant(grant: ConsentGrant, now: Timestamp) -> Result<Self, ConsentError> {
        let invalid = ConsentError::InvalidDuration {
            days: grant.duration_days,
        };
        let days = u32::try_from(grant.duration_days).map_err(|_| invalid.clone())?;
        if days == 0 {
            return Err(invalid);
        }
        let expires_at = now.checked_add_days(days).ok_or(invalid)?;
        Ok(Self {
            consent_id: grant.consent_id,
            subject_id: grant.subject_id,
            verifier_id: grant.verifier_id,
            certificate_id: grant.certificate_id,
            purpose: grant.purpose,
            data_scope: grant.data_scope,
            granted_at: now,
            expires_at,
            status: ConsentStatus::Active,
            access_count: 0,
            last_accessed_at: None,
            revoked_at: None,
            revocation_reason: None,
        })
    }

    /// Checked, mutating access by `verifier` at time `now`.
    ///
    /// On `Ok` the access counter has been bumped. On
    /// [`ConsentError::ExpiredConsent`] the status has moved to EXPIRED.
    /// Every other error leaves the record untouched.
    pub fn access(&mut self, verifier: &VerifierId, now: Timestamp) -> Result<(), ConsentError> {
        if &self.verifier_id != verifier {
            return Err(ConsentError::VerifierMismatch {
                consent_id: self.consent_id.clone(),
            });
        }
        self.require_active()?;
        if now > self.expires_at {
            self.status = ConsentStatus::Expired;
            return Err(ConsentError::ExpiredConsent {
                consent_id: self.consent_id.clone(),
                expires_at: self.expires_at,
            });
        }
        self.access_count += 1;
        self.last_accessed_at = Some(now);
        Ok(())
    }

    /// Withdraw consent (ACTIVE → REVOKED).
    ///
    /// Terminal records are rejected with the error matching their status,
    /// so a second revocation cannot overwrite the first reason.
    pub fn revoke(&mut self, reason: impl Into<String>, now: Timestamp) -> Result<(), ConsentError> {
        self.require_active()?;
        self.status = ConsentStatus::Revoked;
        self.revoked_at = Some(now);
        self.revocation_reason = Some(reason.into());
        Ok(())
    }

    /// Status as of `now`, accounting for expiry that has not yet been
    /// materialized in storage.
    pub fn effective_status(&self, now: Timestamp) -> ConsentStatus {
        if self.status == ConsentStatus::Active && now > self.expires_at {
            ConsentStatus::Expired
        } else {
            self.status
        }
    }

    /// Whether the consent would admit an access at `now`.
    pub fn is_effectively_active(&self, now: Timestamp) -> bool {
        self.effective_status(now) == ConsentStatus::Active
    }

    fn require_active(&self) -> Result<(), ConsentError> {
        match self.status {
            ConsentStatus::Active => Ok(()),
            ConsentStatus::Revoked => Err(ConsentError::RevokedConsent {
                consent_id: self.consent_id.clone(),
            }),
            ConsentStatus::Expired => Err(ConsentError::AlreadyExpired {
                consent_id: self.consent_id.clone(),
            }),
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(s: &str) -> Timestamp {
        Timestamp::parse(s).unwrap()
    }

    fn verifier() -> VerifierId {
        VerifierId::new("E1").unwrap()
    }

    fn grant_request(days: i64) -> ConsentGrant {
        ConsentGrant {
            consent_id: ConsentId::new("K1").unwrap(),
            subject_id: SubjectId::new("S1").unwrap(),
            verifier_id: verifier(),
            certificate_id: CertificateId::new("C1").unwrap(),
            purpose: "employment".to_string(),
            data_scope: ["degree".to_string()].into_iter().collect(),
            duration_days: days,
        }
    }

    fn make_consent() -> ConsentRecord {
        ConsentRecord::grant(grant_request(30), ts("2026-01-01T00:00:00Z")).unwrap()
    }

    #[test]
    fn test_grant_sets_expiry() {
        let consent = make_consent();
        assert_eq!(consent.status, ConsentStatus::Active);
        assert_eq!(consent.access_count, 0);
        assert_eq!(consent.expires_at, ts("2026-01-31T00:00:00Z"));
        assert!(consent.expires_at > consent.granted_at);
    }

    #[test]
    fn test_grant_rejects_non_positive_duration() {
        let now = ts("2026-01-01T00:00:00Z");
        assert_eq!(
            ConsentRecord::grant(grant_request(0), now).unwrap_err(),
            ConsentError::InvalidDuration { days: 0 }
        );
        assert!(ConsentRecord::grant(grant_request(-5), now).is_err());
    }

    #[test]
    fn test_access_counts() {
        let mut consent = make_consent();
        let now = ts("2026-01-02T00:00:00Z");
        consent.access(&verifier(), now).unwrap();
        consent.access(&verifier(), now).unwrap();
        assert_eq!(consent.access_count, 2);
        assert_eq!(consent.last_accessed_at, Some(now));
    }

    #[test]
    fn test_access_wrong_verifier_does_not_mutate() {
        let mut consent = make_consent();
        let before = consent.clone();
        let err = consent
            .access(&VerifierId::new("E2").unwrap(), ts("2026-01-02T00:00:00Z"))
            .unwrap_err();
        assert!(matches!(err, ConsentError::VerifierMismatch { .. }));
        assert!(!err.mutated_record());
        assert_eq!(consent, before);
    }

    #[test]
    fn test_access_at_expiry_instant_is_allowed() {
        let mut consent = make_consent();
        let at = consent.expires_at;
        consent.access(&verifier(), at).unwrap();
        assert_eq!(consent.status, ConsentStatus::Active);
    }

    #[test]
    fn test_lazy_expiry() {
        let mut consent = make_consent();
        let late = ts("2026-02-15T00:00:00Z");
        let first = consent.access(&verifier(), late).unwrap_err();
        assert!(matches!(first, ConsentError::ExpiredConsent { .. }));
        assert!(first.mutated_record());
        assert_eq!(consent.status, ConsentStatus::Expired);

        let second = consent.access(&verifier(), late).unwrap_err();
        assert!(matches!(second, ConsentError::AlreadyExpired { .. }));
        assert!(!second.mutated_record());
        assert_eq!(consent.access_count, 0);
    }

    #[test]
    fn test_verifier_checked_before_status() {
        let mut consent = make_consent();
        consent.revoke("changed my mind", ts("2026-01-02T00:00:00Z")).unwrap();
        let err = consent
            .access(&VerifierId::new("E2").unwrap(), ts("2026-01-03T00:00:00Z"))
            .unwrap_err();
        assert!(matches!(err, ConsentError::VerifierMismatch { .. }));
    }

    #[test]
    fn test_revoke() {
        let mut consent = make_consent();
        consent.revoke("job filled", ts("2026-01-05T00:00:00Z")).unwrap();
        assert_eq!(consent.status, ConsentStatus::Revoked);
        assert_eq!(consent.revocation_reason.as_deref(), Some("job filled"));
        let err = consent.access(&verifier(), ts("2026-01-06T00:00:00Z")).unwrap_err();
        assert!(matches!(err, ConsentError::RevokedConsent { .. }));
    }

    #[test]
    fn test_revoke_terminal_rejected() {
        let mut consent = make_consent();
        consent.revoke("first", ts("2026-01-05T00:00:00Z")).unwrap();
        let err = consent.revoke("second", ts("2026-01-06T00:00:00Z")).unwrap_err();
        assert!(matches!(err, ConsentError::RevokedConsent { .. }));
        assert_eq!(consent.revocation_reason.as_deref(), Some("first"));

        let mut expired = make_consent();
        let _ = expired.access(&verifier(), ts("2026-03-01T00:00:00Z"));
        let err = expired.revoke("late", ts("2026-03-02T00:00:00Z")).unwrap_err();
        assert!(matches!(err, ConsentError::AlreadyExpired { .. }));
    }

    #[test]
    fn test_effective_status() {
        let consent = make_consent();
        assert_eq!(consent.effective_status(ts("2026-01-10T00:00:00Z")), ConsentStatus::Active);
        assert_eq!(consent.effective_status(ts("2026-02-10T00:00:00Z")), ConsentStatus::Expired);
        assert_eq!(consent.status, ConsentStatus::Active);
    }

    #[test]
    fn test_status_parse_and_display() {
        assert_eq!("active".parse::<ConsentStatus>().unwrap(), ConsentStatus::Active);
        assert_eq!("EXPIRED".parse::<ConsentStatus>().unwrap(), ConsentStatus::Expired);
        assert!("pending".parse::<ConsentStatus>().is_err());
        assert_eq!(ConsentStatus::Revoked.to_string(), "REVOKED");
    }
}
