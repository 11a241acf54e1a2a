//! # Credential Store
//!
//! Issuance, lookup, integrity verification, and revocation of academic
//! certificates.
//!
//! ## Authorization
//!
//! - **Issue**: caller organization must be the configured issuer
//!   organization, and the caller principal must be the `issuer_id` the
//!   certificate names. Both are checked before anything else, so an
//!   outsider learns nothing about which ids exist, and the issuer of
//!   record is always the principal that issued.
//! - **Revoke**: caller organization must be the issuer organization *and*
//!   the caller principal must be the certificate's issuer of record.
//! - Reads, verification, and listings are open.

use edl_core::{CertificateId, ContentHash, IndexNamespace, RecordKind, SubjectId};
use edl_state::{Certificate, CertificateIssuance};

use crate::config::ContractConfig;
use crate::context::TxContext;
use crate::error::ContractError;
use crate::events::ContractEvent;
use crate::index::IndexManager;

/// Certificate operations under a given contract configuration.
#[derive(Debug, Clone, Copy)]
pub struct CredentialStore<'c> {
    config: &'c ContractConfig,
}

impl<'c> CredentialStore<'c> {
    pub fn new(config: &'c ContractConfig) -> Self {
        Self { config }
    }

    fn require_issuer_org(&self, ctx: &TxContext<'_>, operation: &'static str) -> Result<(), ContractError> {
        let org = ctx.caller().caller_org();
        if org != self.config.issuer_org {
            return Err(ContractError::unauthorized(
                operation,
                format!("organization {org:?} is not an issuing organization"),
            ));
        }
        Ok(())
    }

    /// Put a new certificate on the ledger, VALID, indexed under its subject.
    pub fn issue(
        &self,
        ctx: &mut TxContext<'_>,
        issuance: CertificateIssuance,
    ) -> Result<Certificate, ContractError> {
        self.require_issuer_org(ctx, "issue certificate")?;
        let principal = ctx.caller().caller_principal();
        if !issuance.issuer_id.is_principal(principal) {
            return Err(ContractError::unauthorized(
                "issue certificate",
                format!("{principal:?} cannot issue as {}", issuance.issuer_id),
            ));
        }
        let id = issuance.certificate_id.as_str();
        if ctx.exists(RecordKind::Certificate, id)? {
            return Err(ContractError::DuplicateKey {
                kind: RecordKind::Certificate,
                id: id.to_string(),
            });
        }

        let certificate = Certificate::issue(issuance, ctx.now());
        ctx.save(&certificate)?;
        IndexManager::put_entry(
            ctx,
            IndexNamespace::SubjectCertificates,
            certificate.subject_id.as_str(),
            certificate.certificate_id.as_str(),
        )?;
        ctx.emit(ContractEvent::CertificateIssued {
            certificate_id: certificate.certificate_id.clone(),
            subject_id: certificate.subject_id.clone(),
            issuer_id: certificate.issuer_id.clone(),
        });
        Ok(certificate)
    }

    pub fn read(&self, ctx: &mut TxContext<'_>, id: &CertificateId) -> Result<Certificate, ContractError> {
        ctx.require(id.as_str())
    }

    /// Integrity check of a presented document hash.
    ///
    /// Returns `Ok(true)` only for a matching hash on a VALID certificate;
    /// every other outcome is a typed error.
    pub fn verify(
        &self,
        ctx: &mut TxContext<'_>,
        id: &CertificateId,
        presented: &ContentHash,
    ) -> Result<bool, ContractError> {
        let certificate: Certificate = ctx.require(id.as_str())?;
        certificate.verify(presented)?;
        Ok(true)
    }

    /// Revoke a certificate on behalf of its issuer.
    pub fn revoke(
        &self,
        ctx: &mut TxContext<'_>,
        id: &CertificateId,
        reason: &str,
    ) -> Result<Certificate, ContractError> {
        self.require_issuer_org(ctx, "revoke certificate")?;
        let mut certificate: Certificate = ctx.require(id.as_str())?;
        let principal = ctx.caller().caller_principal();
        if !certificate.issuer_id.is_principal(principal) {
            return Err(ContractError::unauthorized(
                "revoke certificate",
                format!("{principal:?} is not the issuer of record"),
            ));
        }

        certificate.revoke(reason, ctx.now())?;
        ctx.save(&certificate)?;
        ctx.emit(ContractEvent::CertificateRevoked {
            certificate_id: certificate.certificate_id.clone(),
            reason: reason.to_string(),
        });
        Ok(certificate)
    }

    /// Every certificate issued to `subject`, in certificate-id order.
    pub fn list_by_subject(
        &self,
        ctx: &mut TxContext<'_>,
        subject: &SubjectId,
    ) -> Result<Vec<Certificate>, ContractError> {
        IndexManager::load_all(ctx, IndexNamespace::SubjectCertificates, subject.as_str())
    }
}
