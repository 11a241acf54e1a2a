//! # Persistence Envelope
//!
//! Every value written to the ledger, and therefore every entry in the
//! history log, is wrapped in a versioned envelope:
//!
//! ```json
//! {"kind":"certificate","record":{...},"schema":1}
//! ```
//!
//! Envelopes are serialized with RFC 8785 (JCS) canonicalization so that
//! two peers executing the same transaction produce byte-identical writes.
//!
//! ## Schema Evolution
//!
//! Readers accept any `schema <= SCHEMA_VERSION`. Fields introduced by a
//! later schema carry `#[serde(default)]` on the record type, so older
//! payloads decode with zero values. Envelopes from a newer schema are
//! rejected: silently dropping unknown fields would lose data on rewrite.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use edl_core::RecordKind;

use crate::certificate::Certificate;
use crate::consent::ConsentRecord;

/// Current persistence schema.
pub const SCHEMA_VERSION: u32 = 1;

/// Failures reading or writing a persisted record.
#[derive(Error, Debug)]
pub enum EnvelopeError {
    /// The envelope holds a different kind of record.
    #[error("expected a {expected} record, found {found}")]
    WrongKind {
        /// Kind the caller asked for.
        expected: RecordKind,
        /// Kind actually stored.
        found: RecordKind,
    },

    /// The envelope was written by a newer schema than this reader knows.
    #[error("record schema {found} is newer than supported schema {max}", max = SCHEMA_VERSION)]
    UnsupportedSchema {
        /// Schema found in the envelope.
        found: u32,
    },

    /// The bytes are not a valid envelope or record.
    #[error("malformed record: {0}")]
    Malformed(#[source] serde_json::Error),

    /// Canonical serialization failed.
    #[error("record encoding failed: {0}")]
    Encode(#[source] serde_json::Error),
}

#[derive(Serialize, Deserialize)]
struct Envelope {
    schema: u32,
    kind: RecordKind,
    record: serde_json::Value,
}

impl Envelope {
    fn parse(bytes: &[u8]) -> Result<Self, EnvelopeError> {
        let envelope: Envelope = serde_json::from_slice(bytes).map_err(EnvelopeError::Malformed)?;
        if envelope.schema > SCHEMA_VERSION {
            return Err(EnvelopeError::UnsupportedSchema {
                found: envelope.schema,
            });
        }
        Ok(envelope)
    }
}

/// A lifecycle record that can be persisted under its own key prefix.
pub trait LedgerRecord: Serialize + DeserializeOwned + Default {
    /// The kind tag written into the envelope.
    const KIND: RecordKind;

    /// The record's primary identifier.
    fn record_id(&self) -> &str;

    /// Primary key under which this record is stored.
    fn primary_key(&self) -> String {
        Self::KIND.primary_key(self.record_id())
    }

    /// Encode as a canonical envelope at the current schema.
    fn encode(&self) -> Result<Vec<u8>, EnvelopeError> {
        let record = serde_json::to_value(self).map_err(EnvelopeError::Encode)?;
        let envelope = Envelope {
            schema: SCHEMA_VERSION,
            kind: Self::KIND,
            record,
        };
        serde_jcs::to_vec(&envelope).map_err(EnvelopeError::Encode)
    }

    /// Decode an envelope that must hold a record of this kind.
    fn decode(bytes: &[u8]) -> Result<Self, EnvelopeError> {
        let envelope = Envelope::parse(bytes)?;
        if envelope.kind != Self::KIND {
            return Err(EnvelopeError::WrongKind {
                expected: Self::KIND,
                found: envelope.kind,
            });
        }
        serde_json::from_value(envelope.record).map_err(EnvelopeError::Malformed)
    }

    /// Decode for history replay: empty or malformed payloads become the
    /// zero value instead of failing the whole timeline.
    fn decode_lenient(bytes: &[u8]) -> Self {
        if bytes.is_empty() {
            return Self::default();
        }
        Self::decode(bytes).unwrap_or_default()
    }
}

impl LedgerRecord for Certificate {
    const KIND: RecordKind = RecordKind::Certificate;

    fn record_id(&self) -> &str {
        self.certificate_id.as_str()
    }
}

impl LedgerRecord for ConsentRecord {
    const KIND: RecordKind = RecordKind::Consent;

    fn record_id(&self) -> &str {
        self.consent_id.as_str()
    }
}

// ─── Stored Record Variant ───────────────────────────────────────────

/// Any persisted entity, tagged by kind.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "record", rename_all = "snake_case")]
pub enum StoredRecord {
    /// A certificate.
    Certificate(Certificate),
    /// A consent grant.
    Consent(ConsentRecord),
}

impl StoredRecord {
    /// The variant's kind tag.
    pub fn kind(&self) -> RecordKind {
        match self {
            Self::Certificate(_) => RecordKind::Certificate,
            Self::Consent(_) => RecordKind::Consent,
        }
    }

    /// Primary key of the wrapped record.
    pub fn primary_key(&self) -> String {
        match self {
            Self::Certificate(c) => c.primary_key(),
            Self::Consent(c) => c.primary_key(),
        }
    }

    /// Encode the wrapped record.
    pub fn encode(&self) -> Result<Vec<u8>, EnvelopeError> {
        match self {
            Self::Certificate(c) => c.encode(),
            Self::Consent(c) => c.encode(),
        }
    }

    /// Decode an envelope of either kind.
    pub fn decode_any(bytes: &[u8]) -> Result<Self, EnvelopeError> {
        let envelope = Envelope::parse(bytes)?;
        match envelope.kind {
            RecordKind::Certificate => serde_json::from_value(envelope.record)
                .map(Self::Certificate)
                .map_err(EnvelopeError::Malformed),
            RecordKind::Consent => serde_json::from_value(envelope.record)
                .map(Self::Consent)
                .map_err(EnvelopeError::Malformed),
        }
    }
}

impl From<Certificate> for StoredRecord {
    fn from(c: Certificate) -> Self {
        Self::Certificate(c)
    }
}

impl From<ConsentRecord> for StoredRecord {
    fn from(c: ConsentRecord) -> Self {
        Self::Consent(c)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::certificate::CertificateIssuance;
    use crate::consent::ConsentGrant;
    use edl_core::{CertificateId, ConsentId, ContentHash, IssuerId, SubjectId, Timestamp, VerifierId};

    fn ts() -> Timestamp {
        Timestamp::parse("2026-01-15T12:00:00Z").unwrap()
    }

    fn certificate() -> Certificate {
        Certificate::issue(
            CertificateIssuance {
                certificate_id: CertificateId::new("C1").unwrap(),
                content_hash: ContentHash::new("h1").unwrap(),
                issuer_id: IssuerId::new("U1").unwrap(),
                subject_id: SubjectId::new("S1").unwrap(),
                subject_reference: None,
                document_uri: Some("ipfs://bafy".into()),
                metadata: Default::default(),
            },
            ts(),
        )
    }

    fn consent() -> ConsentRecord {
        ConsentRecord::grant(
            ConsentGrant {
                consent_id: ConsentId::new("K1").unwrap(),
                subject_id: SubjectId::new("S1").unwrap(),
                verifier_id: VerifierId::new("E1").unwrap(),
                certificate_id: CertificateId::new("C1").unwrap(),
                purpose: "employment".into(),
                data_scope: Default::default(),
                duration_days: 30,
            },
            ts(),
        )
        .unwrap()
    }

    #[test]
    fn test_encoding_is_canonical() {
        let bytes = certificate().encode().unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.starts_with("{\"kind\":\"certificate\",\"record\":{"));
        assert!(text.ends_with(",\"schema\":1}"));
        assert!(!text.contains(' '));
    }

    #[test]
    fn test_decode_rejects_wrong_kind() {
        let bytes = consent().encode().unwrap();
        let err = Certificate::decode(&bytes).unwrap_err();
        assert!(matches!(
            err,
            EnvelopeError::WrongKind {
                expected: RecordKind::Certificate,
                found: RecordKind::Consent,
            }
        ));
    }

    #[test]
    fn test_newer_schema_rejected() {
        let bytes = br#"{"kind":"consent","record":{},"schema":2}"#;
        let err = ConsentRecord::decode(bytes).unwrap_err();
        assert!(matches!(err, EnvelopeError::UnsupportedSchema { found: 2 }));
    }

    #[test]
    fn test_missing_optional_fields_default() {
        let bytes = br#"{"kind":"consent","record":{"consent_id":"K1","subject_id":"S1","verifier_id":"E1","certificate_id":"C1","purpose":"p","granted_at":"2026-01-01T00:00:00Z","expires_at":"2026-02-01T00:00:00Z","status":"ACTIVE"},"schema":1}"#;
        let record = ConsentRecord::decode(bytes).unwrap();
        assert_eq!(record.access_count, 0);
        assert!(record.data_scope.is_empty());
        assert!(record.last_accessed_at.is_none());
    }

    #[test]
    fn test_lenient_decode_degrades_to_zero_value() {
        assert_eq!(Certificate::decode_lenient(b""), Certificate::default());
        assert_eq!(Certificate::decode_lenient(b"{not json"), Certificate::default());
        assert_eq!(Certificate::decode_lenient(&certificate().encode().unwrap()), certificate());
    }

    #[test]
    fn test_stored_record_dispatch() {
        let stored = StoredRecord::decode_any(&consent().encode().unwrap()).unwrap();
        assert_eq!(stored.kind(), RecordKind::Consent);
        assert_eq!(stored.primary_key(), "consent/K1");
        let from_cert: StoredRecord = certificate().into();
        assert_eq!(from_cert.primary_key(), "certificate/C1");
        assert_eq!(StoredRecord::decode_any(&from_cert.encode().unwrap()).unwrap(), from_cert);
    }
}
