//! # Consent Engine
//!
//! Lets a certificate's subject grant a verifier time-bounded, field-scoped
//! access, and enforces that grant on every access.
//!
//! ## Access Algorithm
//!
//! [`ConsentEngine::verify_and_access`] is the single gate every disclosure
//! passes through:
//!
//! 1. load the consent, else `NotFound`;
//! 2. the requesting verifier must be the grantee, else `VerifierMismatch`;
//! 3. the stored status must be ACTIVE, else `RevokedConsent` or
//!    `AlreadyExpired`;
//! 4. past `expires_at`: mark EXPIRED, persist, fail `ExpiredConsent`;
//! 5. otherwise bump the access counter, persist, succeed.
//!
//! Step 4 is the one failure whose write commits; see
//! [`TxError::commits_writes`](edl_store::TxError::commits_writes).
//!
//! ## Hardened Mode
//!
//! With `enforce_subject_identity`, granting and revoking require the caller
//! principal to be the consent's subject. Without it, any caller may act on
//! a subject's behalf, which suits deployments where a gateway has already
//! authenticated the student.

use edl_core::{ConsentId, IndexNamespace, RecordKind, SubjectId, VerifierId};
use edl_state::{Certificate, ConsentGrant, ConsentRecord, ConsentStatus, Disclosure, LedgerRecord};
use edl_store::Selector;

use crate::config::ContractConfig;
use crate::context::TxContext;
use crate::error::ContractError;
use crate::events::ContractEvent;
use crate::index::IndexManager;

/// Consent operations under a given contract configuration.
#[derive(Debug, Clone, Copy)]
pub struct ConsentEngine<'c> {
    config: &'c ContractConfig,
}

impl<'c> ConsentEngine<'c> {
    pub fn new(config: &'c ContractConfig) -> Self {
        Self { config }
    }

    fn require_subject(
        &self,
        ctx: &TxContext<'_>,
        subject: &SubjectId,
        operation: &'static str,
    ) -> Result<(), ContractError> {
        if !self.config.enforce_subject_identity {
            return Ok(());
        }
        let principal = ctx.caller().caller_principal();
        if subject.is_principal(principal) {
            Ok(())
        } else {
            Err(ContractError::unauthorized(
                operation,
                format!("{principal:?} is not subject {subject}"),
            ))
        }
    }

    fn check_duration(&self, days: i64) -> Result<(), ContractError> {
        if days <= 0 {
            return Err(ContractError::MalformedInput(format!(
                "consent duration must be a positive number of days, got {days}"
            )));
        }
        if days > self.config.max_consent_days {
            return Err(ContractError::MalformedInput(format!(
                "consent duration of {days} days exceeds the maximum of {}",
                self.config.max_consent_days
            )));
        }
        Ok(())
    }

    /// Grant `verifier` access to one of the subject's certificates.
    pub fn grant(&self, ctx: &mut TxContext<'_>, grant: ConsentGrant) -> Result<ConsentRecord, ContractError> {
        self.check_duration(grant.duration_days)?;
        self.require_subject(ctx, &grant.subject_id, "grant consent")?;

        let certificate: Certificate = ctx.require(grant.certificate_id.as_str())?;
        if certificate.subject_id != grant.subject_id {
            return Err(ContractError::OwnershipMismatch {
                certificate_id: grant.certificate_id,
                subject_id: grant.subject_id,
            });
        }
        if ctx.exists(RecordKind::Consent, grant.consent_id.as_str())? {
            return Err(ContractError::DuplicateKey {
                kind: RecordKind::Consent,
                id: grant.consent_id.into_inner(),
            });
        }

        let consent = ConsentRecord::grant(grant, ctx.now())?;
        ctx.save(&consent)?;
        let id = consent.consent_id.as_str();
        IndexManager::put_entry(ctx, IndexNamespace::VerifierConsents, consent.verifier_id.as_str(), id)?;
        IndexManager::put_entry(ctx, IndexNamespace::SubjectConsents, consent.subject_id.as_str(), id)?;
        ctx.emit(ContractEvent::ConsentGranted {
            consent_id: consent.consent_id.clone(),
            subject_id: consent.subject_id.clone(),
            verifier_id: consent.verifier_id.clone(),
            certificate_id: consent.certificate_id.clone(),
        });
        Ok(consent)
    }

    pub fn read(&self, ctx: &mut TxContext<'_>, id: &ConsentId) -> Result<ConsentRecord, ContractError> {
        ctx.require(id.as_str())
    }

    /// Checked, counted access by `verifier`. Exactly one write per call
    /// that gets past the verifier and status checks.
    pub fn verify_and_access(
        &self,
        ctx: &mut TxContext<'_>,
        id: &ConsentId,
        verifier: &VerifierId,
    ) -> Result<ConsentRecord, ContractError> {
        let mut consent: ConsentRecord = ctx.require(id.as_str())?;
        match consent.access(verifier, ctx.now()) {
            Ok(()) => {
                ctx.save(&consent)?;
                Ok(consent)
            }
            Err(err) => {
                if err.mutated_record() {
                    ctx.save(&consent)?;
                }
                Err(err.into())
            }
        }
    }

    /// Access the consent and return the certificate restricted to its
    /// data scope.
    pub fn disclose(
        &self,
        ctx: &mut TxContext<'_>,
        id: &ConsentId,
        verifier: &VerifierId,
    ) -> Result<Disclosure, ContractError> {
        let consent = self.verify_and_access(ctx, id, verifier)?;
        let certificate: Certificate = ctx.require(consent.certificate_id.as_str())?;
        Ok(Disclosure::scoped(&certificate, &consent.data_scope))
    }

    /// Withdraw an ACTIVE consent. Terminal consents are rejected.
    pub fn revoke(
        &self,
        ctx: &mut TxContext<'_>,
        id: &ConsentId,
        reason: &str,
    ) -> Result<ConsentRecord, ContractError> {
        let mut consent: ConsentRecord = ctx.require(id.as_str())?;
        self.require_subject(ctx, &consent.subject_id, "revoke consent")?;
        consent.revoke(reason, ctx.now())?;
        ctx.save(&consent)?;
        ctx.emit(ContractEvent::ConsentRevoked {
            consent_id: consent.consent_id.clone(),
            verifier_id: consent.verifier_id.clone(),
            reason: reason.to_string(),
        });
        Ok(consent)
    }

    /// Every consent `subject` has granted, in consent-id order.
    pub fn list_by_subject(
        &self,
        ctx: &mut TxContext<'_>,
        subject: &SubjectId,
    ) -> Result<Vec<ConsentRecord>, ContractError> {
        IndexManager::load_all(ctx, IndexNamespace::SubjectConsents, subject.as_str())
    }

    /// Every consent granted to `verifier`, in consent-id order.
    ///
    /// With `active_only`, keeps consents that would admit an access right
    /// now: stored ACTIVE and not past expiry. Nothing is written.
    pub fn list_by_verifier(
        &self,
        ctx: &mut TxContext<'_>,
        verifier: &VerifierId,
        active_only: bool,
    ) -> Result<Vec<ConsentRecord>, ContractError> {
        let consents: Vec<ConsentRecord> =
            IndexManager::load_all(ctx, IndexNamespace::VerifierConsents, verifier.as_str())?;
        if !active_only {
            return Ok(consents);
        }
        let now = ctx.now();
        Ok(consents
            .into_iter()
            .filter(|c| c.is_effectively_active(now))
            .collect())
    }

    /// Consents whose *stored* status is `status`.
    ///
    /// Lapsed consents that nobody has touched since expiry are still stored
    /// ACTIVE; use [`ConsentRecord::effective_status`] on the results when
    /// that distinction matters.
    pub fn query_by_status(
        &self,
        ctx: &mut TxContext<'_>,
        status: ConsentStatus,
    ) -> Result<Vec<ConsentRecord>, ContractError> {
        let selector = Selector::new()
            .key_prefix(RecordKind::Consent.key_prefix())
            .field_eq("kind", RecordKind::Consent.as_str())
            .field_eq("record.status", status.as_str());
        ctx.store()
            .rich_query(&selector)?
            .into_iter()
            .map(|(_, bytes)| ConsentRecord::decode(&bytes).map_err(ContractError::from))
            .collect()
    }
}
