//! # edl-state — Credential and Consent Lifecycles
//!
//! Pure state machines with no storage access. The contract layer loads a
//! record, asks it to transition, and persists whatever it returns.
//!
//! ## State Machines
//!
//! - **Certificate** (`certificate.rs`): `VALID → REVOKED`. Revocation is not
//!   idempotent; a second attempt is an error and leaves the first
//!   revocation stamp untouched.
//!
//! - **Consent** (`consent.rs`): `ACTIVE → REVOKED | EXPIRED`, both terminal.
//!   Expiry is lazy: it is materialized by the first access attempt after
//!   `expires_at`.
//!
//! ## Disclosure
//!
//! `disclosure.rs` builds the least-privilege view of a certificate that a
//! verifier receives under a consent's data scope.
//!
//! ## Persistence
//!
//! `envelope.rs` defines the versioned byte layout shared by the current
//! state and the history log, and the [`StoredRecord`] variant that tags
//! every persisted entity with its kind.

pub mod certificate;
pub mod consent;
pub mod disclosure;
pub mod envelope;

pub use certificate::{Certificate, CertificateError, CertificateIssuance, CertificateStatus, Metadata};
pub use consent::{ConsentError, ConsentGrant, ConsentRecord, ConsentStatus, DataScope};
pub use disclosure::Disclosure;
pub use envelope::{EnvelopeError, LedgerRecord, StoredRecord, SCHEMA_VERSION};
