//! # Contract Events
//!
//! Every committed mutation announces itself through an [`EventSink`].
//! Events are buffered in the transaction context and handed to the sink
//! only after the ledger commits, so a discarded transaction never emits.
//! Delivery is fire-and-forget.

use parking_lot::Mutex;
use serde_json::{json, Value};

use edl_core::{CertificateId, ConsentId, IssuerId, SubjectId, VerifierId};

/// A domain event produced by a contract operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContractEvent {
    CertificateIssued {
        certificate_id: CertificateId,
        subject_id: SubjectId,
        issuer_id: IssuerId,
    },
    CertificateRevoked {
        certificate_id: CertificateId,
        reason: String,
    },
    ConsentGranted {
        consent_id: ConsentId,
        subject_id: SubjectId,
        verifier_id: VerifierId,
        certificate_id: CertificateId,
    },
    ConsentRevoked {
        consent_id: ConsentId,
        verifier_id: VerifierId,
        reason: String,
    },
}

impl ContractEvent {
    /// Event name as seen by subscribers.
    pub fn name(&self) -> &'static str {
        match self {
            Self::CertificateIssued { .. } => "CertificateIssued",
            Self::CertificateRevoked { .. } => "CertificateRevoked",
            Self::ConsentGranted { .. } => "ConsentGranted",
            Self::ConsentRevoked { .. } => "ConsentRevoked",
        }
    }

    /// JSON payload, tagged with an `action` field.
    pub fn payload(&self) -> Value {
        match self {
            Self::CertificateIssued {
                certificate_id,
                subject_id,
                issuer_id,
            } => json!({
                "certificate_id": certificate_id,
                "subject_id": subject_id,
                "issuer_id": issuer_id,
                "action": "ISSUED",
            }),
            Self::CertificateRevoked {
                certificate_id,
                reason,
            } => json!({
                "certificate_id": certificate_id,
                "revocation_reason": reason,
                "action": "REVOKED",
            }),
            Self::ConsentGranted {
                consent_id,
                subject_id,
                verifier_id,
                certificate_id,
            } => json!({
                "consent_id": consent_id,
                "subject_id": subject_id,
                "verifier_id": verifier_id,
                "certificate_id": certificate_id,
                "action": "GRANTED",
            }),
            Self::ConsentRevoked {
                consent_id,
                verifier_id,
                reason,
            } => json!({
                "consent_id": consent_id,
                "verifier_id": verifier_id,
                "revocation_reason": reason,
                "action": "REVOKED",
            }),
        }
    }
}

/// Destination for committed contract events.
pub trait EventSink: Send + Sync {
    /// Publish one event. Must not fail the caller.
    fn emit(&self, name: &str, payload: &Value);
}

/// Writes each event to the `tracing` log.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingEventSink;

impl EventSink for TracingEventSink {
    fn emit(&self, name: &str, payload: &Value) {
        tracing::info!(event = name, payload = %payload, "contract event");
    }
}

/// Keeps every event in memory, in emission order.
#[derive(Debug, Default)]
pub struct RecordingEventSink {
    events: Mutex<Vec<(String, Value)>>,
}

impl RecordingEventSink {
    /// An empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything emitted so far.
    pub fn events(&self) -> Vec<(String, Value)> {
        self.events.lock().clone()
    }

    /// Names of everything emitted so far.
    pub fn names(&self) -> Vec<String> {
        self.events.lock().iter().map(|(name, _)| name.clone()).collect()
    }
}

impl EventSink for RecordingEventSink {
    fn emit(&self, name: &str, payload: &Value) {
        self.events.lock().push((name.to_string(), payload.clone()));
    }
}
