//! # Certificate Subcommand
//!
//! Certificate lifecycle against the local ledger snapshot.
//!
//! - `issue`: Put a new VALID certificate on the ledger.
//! - `show`: Current state of a certificate.
//! - `verify`: Check a presented hash or document.
//! - `revoke`: Revoke a certificate (issuer of record only).
//! - `list`: Certificates of a subject.
//! - `history`: Every committed version of a certificate.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Subcommand};
use serde_json::{json, Value};

use edl_core::{CertificateId, IssuerId, SubjectId};
use edl_state::{CertificateIssuance, Metadata};

use crate::hash::resolve_hash;
use crate::{print_json, Session};

/// Arguments for the `edl certificate` subcommand.
#[derive(Args, Debug)]
pub struct CertificateArgs {
    #[command(subcommand)]
    pub command: CertificateCommand,
}

/// Certificate subcommands.
#[derive(Subcommand, Debug)]
pub enum CertificateCommand {
    /// Issue a new certificate.
    Issue {
        #[arg(long)]
        id: String,
        /// The student the certificate describes.
        #[arg(long)]
        subject: String,
        /// Issuing institution (issuer of record).
        #[arg(long)]
        issuer: String,
        /// Precomputed content hash.
        #[arg(long)]
        hash: Option<String>,
        /// Document to hash instead of --hash.
        #[arg(long)]
        document: Option<PathBuf>,
        /// Institution-local student number.
        #[arg(long)]
        subject_reference: Option<String>,
        /// Where the document is stored (e.g. an IPFS CID).
        #[arg(long)]
        document_uri: Option<String>,
        /// Metadata field as key=value. Values that parse as JSON are kept typed.
        #[arg(long = "field", value_parser = parse_field)]
        fields: Vec<(String, Value)>,
    },

    /// Show a certificate.
    Show { id: String },

    /// Verify a presented hash or document against the ledger.
    Verify {
        id: String,
        #[arg(long)]
        hash: Option<String>,
        #[arg(long)]
        document: Option<PathBuf>,
    },

    /// Revoke a certificate.
    Revoke {
        id: String,
        #[arg(long)]
        reason: String,
    },

    /// List the certificates of a subject.
    List {
        #[arg(long)]
        subject: String,
    },

    /// Show every committed version of a certificate.
    History { id: String },
}

/// Parse a `key=value` metadata field.
pub fn parse_field(raw: &str) -> Result<(String, Value), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got {raw:?}"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty field name in {raw:?}"));
    }
    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((key.to_string(), value))
}

/// Execute the certificate subcommand.
pub fn run_certificate(args: &CertificateArgs, session: &Session) -> Result<u8> {
    match &args.command {
        CertificateCommand::Issue {
            id,
            subject,
            issuer,
            hash,
            document,
            subject_reference,
            document_uri,
            fields,
        } => {
            let issuance = CertificateIssuance {
                certificate_id: CertificateId::new(id.as_str())?,
                content_hash: resolve_hash(hash.as_deref(), document.as_deref())?,
                issuer_id: IssuerId::new(issuer.as_str())?,
                subject_id: SubjectId::new(subject.as_str())?,
                subject_reference: subject_reference.clone(),
                document_uri: document_uri.clone(),
                metadata: fields.iter().cloned().collect::<Metadata>(),
            };
            let certificate =
                session.with_registry(|registry, caller| registry.issue_certificate(caller, issuance))?;
            print_json(&certificate)?;
        }

        CertificateCommand::Show { id } => {
            let id = CertificateId::new(id.as_str())?;
            print_json(&session.with_registry(|registry, _| registry.read_certificate(&id))?)?;
        }

        CertificateCommand::Verify { id, hash, document } => {
            let id = CertificateId::new(id.as_str())?;
            let presented = resolve_hash(hash.as_deref(), document.as_deref())?;
            let valid =
                session.with_registry(|registry, _| registry.verify_certificate(&id, &presented))?;
            print_json(&json!({ "certificate_id": id, "valid": valid }))?;
        }

        CertificateCommand::Revoke { id, reason } => {
            let id = CertificateId::new(id.as_str())?;
            let certificate =
                session.with_registry(|registry, caller| registry.revoke_certificate(caller, &id, reason))?;
            print_json(&certificate)?;
        }

        CertificateCommand::List { subject } => {
            let subject = SubjectId::new(subject.as_str())?;
            print_json(&session.with_registry(|registry, _| registry.certificates_by_subject(&subject))?)?;
        }

        CertificateCommand::History { id } => {
            let id = CertificateId::new(id.as_str())?;
            print_json(&session.with_registry(|registry, _| registry.certificate_history(&id))?)?;
        }
    }
    Ok(0)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::testing::*;
    use edl_state::CertificateStatus;

    pub fn issue(session: &Session, id: &str) -> Result<u8> {
        let args = CertificateArgs {
            command: CertificateCommand::Issue {
                id: id.into(),
                subject: STUDENT.into(),
                issuer: ISSUER.into(),
                hash: Some("abc123".into()),
                document: None,
                subject_reference: Some("S-1001".into()),
                document_uri: None,
                fields: vec![
                    ("degree".into(), Value::String("BSc".into())),
                    ("gpa".into(), json!(3.9)),
                ],
            },
        };
        run_certificate(&args, session)
    }

    fn revoke(session: &Session, id: &str) -> Result<u8> {
        let args = CertificateArgs {
            command: CertificateCommand::Revoke {
                id: id.into(),
                reason: "issued in error".into(),
            },
        };
        run_certificate(&args, session)
    }

    fn verify(session: &Session, id: &str, hash: &str) -> Result<u8> {
        let args = CertificateArgs {
            command: CertificateCommand::Verify {
                id: id.into(),
                hash: Some(hash.into()),
                document: None,
            },
        };
        run_certificate(&args, session)
    }

    #[test]
    fn parse_field_keeps_json_types() {
        assert_eq!(parse_field("gpa=3.9").unwrap(), ("gpa".into(), json!(3.9)));
        assert_eq!(
            parse_field("degree=BSc Physics").unwrap(),
            ("degree".into(), json!("BSc Physics"))
        );
        assert_eq!(parse_field("note=a=b").unwrap(), ("note".into(), json!("a=b")));
        assert!(parse_field("novalue").is_err());
        assert!(parse_field("=x").is_err());
    }

    #[test]
    fn issue_persists_to_ledger_file() {
        let dir = tempfile::tempdir().unwrap();
        let (session, _) = session(&dir);
        assert_eq!(issue(&session, "CERT-1").unwrap(), 0);
        assert!(session.ledger_path.exists());

        let id = CertificateId::new("CERT-1").unwrap();
        let certificate = session
            .with_registry(|registry, _| registry.read_certificate(&id))
            .unwrap();
        assert_eq!(certificate.status, CertificateStatus::Valid);
        assert_eq!(certificate.metadata["gpa"], json!(3.9));
        assert_eq!(certificate.subject_reference.as_deref(), Some("S-1001"));
    }

    #[test]
    fn issue_rejected_for_other_org() {
        let dir = tempfile::tempdir().unwrap();
        let (session, _) = session(&dir);
        let outsider = acting_as(&session, "Org2MSP", ISSUER);
        let err = issue(&outsider, "CERT-1").unwrap_err();
        assert!(err.to_string().starts_with("UNAUTHORIZED"));
        assert!(!session.ledger_path.exists());
    }

    #[test]
    fn duplicate_issue_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let (session, _) = session(&dir);
        issue(&session, "CERT-1").unwrap();
        let err = issue(&session, "CERT-1").unwrap_err();
        assert!(err.to_string().starts_with("DUPLICATE_KEY"));
    }

    #[test]
    fn verify_then_revoke() {
        let dir = tempfile::tempdir().unwrap();
        let (session, _) = session(&dir);
        issue(&session, "CERT-1").unwrap();

        assert_eq!(verify(&session, "CERT-1", "abc123").unwrap(), 0);
        let err = verify(&session, "CERT-1", "abc124").unwrap_err();
        assert!(err.to_string().starts_with("HASH_MISMATCH"));

        revoke(&session, "CERT-1").unwrap();
        let err = verify(&session, "CERT-1", "abc123").unwrap_err();
        assert!(err.to_string().starts_with("REVOKED"));

        let err = revoke(&session, "CERT-1").unwrap_err();
        assert!(err.to_string().starts_with("ALREADY_REVOKED"));
    }

    #[test]
    fn history_spans_invocations() {
        let dir = tempfile::tempdir().unwrap();
        let (session, clock) = session(&dir);
        issue(&session, "CERT-1").unwrap();
        clock.advance_days(1);
        revoke(&session, "CERT-1").unwrap();

        let id = CertificateId::new("CERT-1").unwrap();
        let history = session
            .with_registry(|registry, _| registry.certificate_history(&id))
            .unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].record.status, CertificateStatus::Valid);
        assert_eq!(history[1].record.status, CertificateStatus::Revoked);
        assert!(history[0].timestamp < history[1].timestamp);
    }
}
