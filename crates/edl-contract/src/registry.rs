//! # Registry Facade
//!
//! Binds the contract components to a [`Ledger`]: every public method runs
//! as exactly one transaction, flushes buffered events after a successful
//! commit, and logs the outcome.
//!
//! Mutating methods take the caller's identity; reads run as an anonymous
//! caller because nothing on the read path is access-controlled.

use std::sync::Arc;

use edl_core::{CertificateId, ConsentId, ContentHash, SubjectId, VerifierId};
use edl_state::{Certificate, CertificateIssuance, ConsentGrant, ConsentRecord, ConsentStatus, Disclosure};
use edl_store::Ledger;

use crate::config::ContractConfig;
use crate::consent::ConsentEngine;
use crate::context::TxContext;
use crate::credential::CredentialStore;
use crate::error::ContractError;
use crate::events::{EventSink, TracingEventSink};
use crate::history::{HistoryEntry, HistoryReader};
use crate::identity::{CallerIdentity, IdentityProvider};

/// The credential registry over ledger `L`.
pub struct Registry<L: Ledger> {
    ledger: L,
    config: ContractConfig,
    events: Arc<dyn EventSink>,
}

impl<L: Ledger> Registry<L> {
    /// A registry that logs its events through `tracing`.
    pub fn new(ledger: L, config: ContractConfig) -> Self {
        Self::with_event_sink(ledger, config, Arc::new(TracingEventSink))
    }

    pub fn with_event_sink(ledger: L, config: ContractConfig, events: Arc<dyn EventSink>) -> Self {
        Self {
            ledger,
            config,
            events,
        }
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    pub fn config(&self) -> &ContractConfig {
        &self.config
    }

    fn credentials(&self) -> CredentialStore<'_> {
        CredentialStore::new(&self.config)
    }

    fn consents(&self) -> ConsentEngine<'_> {
        ConsentEngine::new(&self.config)
    }

    /// Run `op` as one transaction on behalf of `caller`.
    ///
    /// Events queued by `op` reach the sink only if the transaction
    /// committed and the operation succeeded.
    pub fn transact<T>(
        &self,
        caller: &dyn IdentityProvider,
        op: impl FnOnce(&mut TxContext<'_>) -> Result<T, ContractError>,
    ) -> Result<T, ContractError> {
        let mut events = Vec::new();
        let outcome = self.ledger.transact(|store| {
            let mut ctx = TxContext::new(store, caller);
            let result = op(&mut ctx);
            events = ctx.take_events();
            result
        });
        if outcome.is_ok() {
            for event in &events {
                self.events.emit(event.name(), &event.payload());
            }
        }
        outcome
    }

    fn read_only<T>(
        &self,
        op: impl FnOnce(&mut TxContext<'_>) -> Result<T, ContractError>,
    ) -> Result<T, ContractError> {
        self.transact(&CallerIdentity::anonymous(), op)
    }

    // ─── Certificates ────────────────────────────────────────────────

    pub fn issue_certificate(
        &self,
        caller: &dyn IdentityProvider,
        issuance: CertificateIssuance,
    ) -> Result<Certificate, ContractError> {
        let certificate = self.transact(caller, |ctx| self.credentials().issue(ctx, issuance))?;
        tracing::info!(
            certificate_id = %certificate.certificate_id,
            subject_id = %certificate.subject_id,
            issuer_id = %certificate.issuer_id,
            "certificate issued"
        );
        Ok(certificate)
    }

    pub fn read_certificate(&self, id: &CertificateId) -> Result<Certificate, ContractError> {
        tracing::debug!(certificate_id = %id, "reading certificate");
        self.read_only(|ctx| self.credentials().read(ctx, id))
    }

    pub fn verify_certificate(&self, id: &CertificateId, presented: &ContentHash) -> Result<bool, ContractError> {
        tracing::debug!(certificate_id = %id, "verifying certificate hash");
        self.read_only(|ctx| self.credentials().verify(ctx, id, presented))
    }

    pub fn revoke_certificate(
        &self,
        caller: &dyn IdentityProvider,
        id: &CertificateId,
        reason: &str,
    ) -> Result<Certificate, ContractError> {
        let certificate = self.transact(caller, |ctx| self.credentials().revoke(ctx, id, reason))?;
        tracing::info!(certificate_id = %id, reason, "certificate revoked");
        Ok(certificate)
    }

    pub fn certificates_by_subject(&self, subject: &SubjectId) -> Result<Vec<Certificate>, ContractError> {
        tracing::debug!(subject_id = %subject, "listing certificates");
        self.read_only(|ctx| self.credentials().list_by_subject(ctx, subject))
    }

    pub fn certificate_history(&self, id: &CertificateId) -> Result<Vec<HistoryEntry<Certificate>>, ContractError> {
        tracing::debug!(certificate_id = %id, "reading certificate history");
        self.read_only(|ctx| HistoryReader::certificate(ctx, id)?.collect())
    }

    // ─── Consents ────────────────────────────────────────────────────

    pub fn grant_consent(
        &self,
        caller: &dyn IdentityProvider,
        grant: ConsentGrant,
    ) -> Result<ConsentRecord, ContractError> {
        let consent = self.transact(caller, |ctx| self.consents().grant(ctx, grant))?;
        tracing::info!(
            consent_id = %consent.consent_id,
            subject_id = %consent.subject_id,
            verifier_id = %consent.verifier_id,
            expires_at = %consent.expires_at,
            "consent granted"
        );
        Ok(consent)
    }

    pub fn read_consent(&self, id: &ConsentId) -> Result<ConsentRecord, ContractError> {
        tracing::debug!(consent_id = %id, "reading consent");
        self.read_only(|ctx| self.consents().read(ctx, id))
    }

    /// Checked, counted access. The verifier identity is the one presented
    /// in the request.
    pub fn access_consent(&self, id: &ConsentId, verifier: &VerifierId) -> Result<ConsentRecord, ContractError> {
        let result = self.read_only(|ctx| self.consents().verify_and_access(ctx, id, verifier));
        match &result {
            Ok(consent) => tracing::info!(
                consent_id = %id,
                verifier_id = %verifier,
                access_count = consent.access_count,
                "consent accessed"
            ),
            Err(ContractError::ExpiredConsent { .. }) => {
                tracing::info!(consent_id = %id, "consent expired on access")
            }
            Err(err) => tracing::debug!(consent_id = %id, error = %err, "consent access refused"),
        }
        result
    }

    pub fn disclose(&self, id: &ConsentId, verifier: &VerifierId) -> Result<Disclosure, ContractError> {
        let disclosure = self.read_only(|ctx| self.consents().disclose(ctx, id, verifier))?;
        tracing::info!(
            consent_id = %id,
            verifier_id = %verifier,
            fields = disclosure.fields.len(),
            "certificate disclosed"
        );
        Ok(disclosure)
    }

    pub fn revoke_consent(
        &self,
        caller: &dyn IdentityProvider,
        id: &ConsentId,
        reason: &str,
    ) -> Result<ConsentRecord, ContractError> {
        let consent = self.transact(caller, |ctx| self.consents().revoke(ctx, id, reason))?;
        tracing::info!(consent_id = %id, reason, "consent revoked");
        Ok(consent)
    }

    pub fn consents_by_subject(&self, subject: &SubjectId) -> Result<Vec<ConsentRecord>, ContractError> {
        self.read_only(|ctx| self.consents().list_by_subject(ctx, subject))
    }

    pub fn consents_by_verifier(
        &self,
        verifier: &VerifierId,
        active_only: bool,
    ) -> Result<Vec<ConsentRecord>, ContractError> {
        self.read_only(|ctx| self.consents().list_by_verifier(ctx, verifier, active_only))
    }

    pub fn consents_by_status(&self, status: ConsentStatus) -> Result<Vec<ConsentRecord>, ContractError> {
        self.read_only(|ctx| self.consents().query_by_status(ctx, status))
    }

    pub fn consent_history(&self, id: &ConsentId) -> Result<Vec<HistoryEntry<ConsentRecord>>, ContractError> {
        self.read_only(|ctx| HistoryReader::consent(ctx, id)?.collect())
    }
}
