//! # Consent Subcommand
//!
//! Consent lifecycle against the local ledger snapshot.
//!
//! - `grant`: A subject grants a verifier scoped, time-bounded access.
//! - `show`: Current state of a consent.
//! - `access`: Checked, counted access by a verifier.
//! - `disclose`: Access and print the scoped certificate.
//! - `revoke`: Withdraw a consent.
//! - `list`: Consents of a subject or held by a verifier.
//! - `query`: Consents by stored status.
//! - `history`: Every committed version of a consent.

use anyhow::{bail, Result};
use clap::{Args, Subcommand};

use edl_core::{CertificateId, ConsentId, SubjectId, VerifierId};
use edl_state::{ConsentGrant, ConsentStatus, DataScope};

use crate::{print_json, Session};

/// Arguments for the `edl consent` subcommand.
#[derive(Args, Debug)]
pub struct ConsentArgs {
    #[command(subcommand)]
    pub command: ConsentCommand,
}

/// Consent subcommands.
#[derive(Subcommand, Debug)]
pub enum ConsentCommand {
    /// Grant a verifier access to one certificate.
    Grant {
        #[arg(long)]
        id: String,
        /// The student granting access.
        #[arg(long)]
        subject: String,
        /// The party receiving access.
        #[arg(long)]
        verifier: String,
        #[arg(long)]
        certificate: String,
        /// Why access is granted ("employment", "transfer", ...).
        #[arg(long)]
        purpose: String,
        /// Metadata fields the verifier may see, comma separated.
        #[arg(long, value_delimiter = ',')]
        scope: Vec<String>,
        /// Lifetime of the grant in days.
        #[arg(long, allow_negative_numbers = true)]
        days: i64,
    },

    /// Show a consent.
    Show { id: String },

    /// Access a consent as a verifier.
    Access {
        id: String,
        #[arg(long)]
        verifier: String,
    },

    /// Access a consent and print the certificate fields it discloses.
    Disclose {
        id: String,
        #[arg(long)]
        verifier: String,
    },

    /// Withdraw a consent.
    Revoke {
        id: String,
        #[arg(long)]
        reason: String,
    },

    /// List consents granted by a subject or held by a verifier.
    List {
        #[arg(long, conflicts_with = "verifier")]
        subject: Option<String>,
        #[arg(long)]
        verifier: Option<String>,
        /// With --verifier, only consents that would admit an access now.
        #[arg(long, requires = "verifier")]
        active_only: bool,
    },

    /// Consents whose stored status is ACTIVE, REVOKED or EXPIRED.
    Query {
        #[arg(long)]
        status: String,
    },

    /// Show every committed version of a consent.
    History { id: String },
}

/// Execute the consent subcommand.
pub fn run_consent(args: &ConsentArgs, session: &Session) -> Result<u8> {
    match &args.command {
        ConsentCommand::Grant {
            id,
            subject,
            verifier,
            certificate,
            purpose,
            scope,
            days,
        } => {
            let grant = ConsentGrant {
                consent_id: ConsentId::new(id.as_str())?,
                subject_id: SubjectId::new(subject.as_str())?,
                verifier_id: VerifierId::new(verifier.as_str())?,
                certificate_id: CertificateId::new(certificate.as_str())?,
                purpose: purpose.clone(),
                data_scope: scope
                    .iter()
                    .map(|field| field.trim().to_string())
                    .filter(|field| !field.is_empty())
                    .collect::<DataScope>(),
                duration_days: *days,
            };
            let consent = session.with_registry(|registry, caller| registry.grant_consent(caller, grant))?;
            print_json(&consent)?;
        }

        ConsentCommand::Show { id } => {
            let id = ConsentId::new(id.as_str())?;
            print_json(&session.with_registry(|registry, _| registry.read_consent(&id))?)?;
        }

        ConsentCommand::Access { id, verifier } => {
            let id = ConsentId::new(id.as_str())?;
            let verifier = VerifierId::new(verifier.as_str())?;
            print_json(&session.with_registry(|registry, _| registry.access_consent(&id, &verifier))?)?;
        }

        ConsentCommand::Disclose { id, verifier } => {
            let id = ConsentId::new(id.as_str())?;
            let verifier = VerifierId::new(verifier.as_str())?;
            print_json(&session.with_registry(|registry, _| registry.disclose(&id, &verifier))?)?;
        }

        ConsentCommand::Revoke { id, reason } => {
            let id = ConsentId::new(id.as_str())?;
            let consent =
                session.with_registry(|registry, caller| registry.revoke_consent(caller, &id, reason))?;
            print_json(&consent)?;
        }

        ConsentCommand::List {
            subject,
            verifier,
            active_only,
        } => {
            let consents = match (subject, verifier) {
                (Some(subject), None) => {
                    let subject = SubjectId::new(subject.as_str())?;
                    session.with_registry(|registry, _| registry.consents_by_subject(&subject))?
                }
                (None, Some(verifier)) => {
                    let verifier = VerifierId::new(verifier.as_str())?;
                    session.with_registry(|registry, _| {
                        registry.consents_by_verifier(&verifier, *active_only)
                    })?
                }
                _ => bail!("give exactly one of --subject or --verifier"),
            };
            print_json(&consents)?;
        }

        ConsentCommand::Query { status } => {
            let status: ConsentStatus = status.parse().map_err(anyhow::Error::msg)?;
            print_json(&session.with_registry(|registry, _| registry.consents_by_status(status))?)?;
        }

        ConsentCommand::History { id } => {
            let id = ConsentId::new(id.as_str())?;
            print_json(&session.with_registry(|registry, _| registry.consent_history(&id))?)?;
        }
    }
    Ok(0)
}
