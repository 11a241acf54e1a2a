//! # Scoped Disclosure
//!
//! The view of a certificate a verifier receives through a consent. It
//! always carries the certificate identity, status and issuer, plus only
//! those metadata fields named in the consent's data scope.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use edl_core::{CertificateId, IssuerId};

use crate::certificate::{Certificate, CertificateStatus};
use crate::consent::DataScope;

/// A certificate filtered down to a consent's data scope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Disclosure {
    /// The disclosed certificate.
    pub certificate_id: CertificateId,
    /// Its current revocation status.
    pub status: CertificateStatus,
    /// The institution that issued it.
    pub issuer_id: IssuerId,
    /// Scoped metadata. Keys outside the scope never appear; scope entries
    /// absent from the certificate are omitted rather than null.
    pub fields: BTreeMap<String, serde_json::Value>,
}

impl Disclosure {
    /// Build the disclosure of `certificate` restricted to `scope`.
    pub fn scoped(certificate: &Certificate, scope: &DataScope) -> Self {
        let fields = scope
            .iter()
            .filter_map(|key| {
                certificate
                    .metadata
                    .get(key)
                    .map(|value| (key.clone(), value.clone()))
            })
            .collect();
        Self {
            certificate_id: certificate.certificate_id.clone(),
            status: certificate.status,
            issuer_id: certificate.issuer_id.clone(),
            fields,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::certificate::{CertificateIssuance, Metadata};
    use edl_core::{ContentHash, SubjectId, Timestamp};
    use serde_json::json;

    fn certificate() -> Certificate {
        let mut metadata = Metadata::new();
        metadata.insert("degree".into(), json!("BSc"));
        metadata.insert("gpa".into(), json!(3.8));
        metadata.insert("major".into(), json!("CS"));
        Certificate::issue(
            CertificateIssuance {
                certificate_id: CertificateId::new("C1").unwrap(),
                content_hash: ContentHash::new("h1").unwrap(),
                issuer_id: IssuerId::new("U1").unwrap(),
                subject_id: SubjectId::new("S1").unwrap(),
                subject_reference: None,
                document_uri: None,
                metadata,
            },
            Timestamp::parse("2026-01-15T12:00:00Z").unwrap(),
        )
    }

    fn scope(keys: &[&str]) -> DataScope {
        keys.iter().map(|k| k.to_string()).collect()
    }

    #[test]
    fn test_only_scoped_fields_disclosed() {
        let d = Disclosure::scoped(&certificate(), &scope(&["degree", "major"]));
        assert_eq!(d.fields.len(), 2);
        assert_eq!(d.fields["degree"], json!("BSc"));
        assert!(!d.fields.contains_key("gpa"));
        assert_eq!(d.status, CertificateStatus::Valid);
        assert_eq!(d.issuer_id.as_str(), "U1");
    }

    #[test]
    fn test_missing_scope_keys_omitted() {
        let d = Disclosure::scoped(&certificate(), &scope(&["degree", "honours"]));
        assert_eq!(d.fields.keys().collect::<Vec<_>>(), vec!["degree"]);
    }

    #[test]
    fn test_empty_scope_discloses_identity_only() {
        let d = Disclosure::scoped(&certificate(), &DataScope::new());
        assert!(d.fields.is_empty());
        assert_eq!(d.certificate_id.as_str(), "C1");
    }

    #[test]
    fn test_revoked_status_carried() {
        let mut cert = certificate();
        cert.revoke("fraud", Timestamp::parse("2026-02-01T00:00:00Z").unwrap())
            .unwrap();
        let d = Disclosure::scoped(&cert, &scope(&["gpa"]));
        assert_eq!(d.status, CertificateStatus::Revoked);
        let json = serde_json::to_value(&d).unwrap();
        assert_eq!(json["status"], "REVOKED");
        assert_eq!(json["fields"]["gpa"], json!(3.8));
    }
}
