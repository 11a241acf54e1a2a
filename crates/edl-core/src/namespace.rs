//! # Record Kinds and Key Namespaces
//!
//! Every persisted entity is one of a closed set of record kinds, and each
//! kind owns a distinct primary-key prefix. Secondary indexes likewise live
//! in closed namespaces, each tied to the record kind it points at.
//!
//! Primary keys look like `certificate/C1`. Index keys are composite keys
//! beginning with `\0` (see `edl-store`), so the two key spaces are disjoint
//! by construction.

use serde::{Deserialize, Serialize};

/// The kind of entity a ledger record holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    /// An academic certificate.
    Certificate,
    /// A consent grant from a subject to a verifier.
    Consent,
}

impl RecordKind {
    /// All record kinds.
    pub const ALL: [RecordKind; 2] = [Self::Certificate, Self::Consent];

    /// Stable lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Certificate => "certificate",
            Self::Consent => "consent",
        }
    }

    /// Primary-key prefix for records of this kind.
    pub fn key_prefix(&self) -> &'static str {
        match self {
            Self::Certificate => "certificate/",
            Self::Consent => "consent/",
        }
    }

    /// Primary key for the entity with the given id.
    pub fn primary_key(&self, id: &str) -> String {
        format!("{}{id}", self.key_prefix())
    }
}

impl std::fmt::Display for RecordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A secondary-index namespace: owner attribute → entity id.
///
/// Variants are declared in tag order, so the derived ordering agrees with
/// byte order over encoded index keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum IndexNamespace {
    /// Subject → certificates issued to them.
    SubjectCertificates,
    /// Subject → consents they granted.
    SubjectConsents,
    /// Verifier → consents granted to them.
    VerifierConsents,
}

impl IndexNamespace {
    /// All index namespaces.
    pub const ALL: [IndexNamespace; 3] = [
        Self::SubjectCertificates,
        Self::SubjectConsents,
        Self::VerifierConsents,
    ];

    /// Look a namespace up by its tag.
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|ns| ns.as_str() == tag)
    }

    /// Namespace tag written into the composite key.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SubjectCertificates => "subject~certificate",
            Self::VerifierConsents => "verifier~consent",
            Self::SubjectConsents => "subject~consent",
        }
    }

    /// The kind of record the index entries point at.
    pub fn target(&self) -> RecordKind {
        match self {
            Self::SubjectCertificates => RecordKind::Certificate,
            Self::VerifierConsents | Self::SubjectConsents => RecordKind::Consent,
        }
    }
}

impl std::fmt::Display for IndexNamespace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primary_keys_are_prefixed_per_kind() {
        assert_eq!(RecordKind::Certificate.primary_key("C1"), "certificate/C1");
        assert_eq!(RecordKind::Consent.primary_key("C1"), "consent/C1");
        assert_ne!(
            RecordKind::Certificate.primary_key("X"),
            RecordKind::Consent.primary_key("X")
        );
    }

    #[test]
    fn test_index_targets() {
        assert_eq!(IndexNamespace::SubjectCertificates.target(), RecordKind::Certificate);
        assert_eq!(IndexNamespace::VerifierConsents.target(), RecordKind::Consent);
        assert_eq!(IndexNamespace::SubjectConsents.target(), RecordKind::Consent);
    }

    #[test]
    fn test_from_tag() {
        for ns in IndexNamespace::ALL {
            assert_eq!(IndexNamespace::from_tag(ns.as_str()), Some(ns));
        }
        assert_eq!(IndexNamespace::from_tag("student~certificate"), None);
    }

    #[test]
    fn test_namespace_tags_are_distinct() {
        let tags = [
            IndexNamespace::SubjectCertificates.as_str(),
            IndexNamespace::VerifierConsents.as_str(),
            IndexNamespace::SubjectConsents.as_str(),
        ];
        assert_eq!(tags.len(), tags.iter().collect::<std::collections::HashSet<_>>().len());
    }

    #[test]
    fn test_namespace_order_follows_tags() {
        let mut by_variant = IndexNamespace::ALL.to_vec();
        by_variant.sort();
        let mut by_tag = IndexNamespace::ALL.to_vec();
        by_tag.sort_by_key(|ns| ns.as_str());
        assert_eq!(by_variant, by_tag);
        assert!(IndexNamespace::SubjectCertificates < IndexNamespace::VerifierConsents);
    }

    #[test]
    fn test_record_kind_serde() {
        assert_eq!(serde_json::to_string(&RecordKind::Consent).unwrap(), "\"consent\"");
    }
}
