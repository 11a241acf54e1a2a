//! # edl-core — Foundational Types for edu-ledger
//!
//! The leaf crate of the workspace. Everything that the registry's
//! lifecycle, storage, and contract layers agree on lives here:
//!
//! 1. **Identifier newtypes.** `CertificateId`, `ConsentId`, `SubjectId`,
//!    `IssuerId`, `VerifierId`. You cannot pass a verifier where a subject
//!    is expected. Constructors reject empty values and the composite-key
//!    separator byte.
//!
//! 2. **UTC-only timestamps.** [`Timestamp`] is seconds-precision UTC. Time is
//!    read through the [`Clock`] trait so that expiry logic is testable.
//!
//! 3. **Content hashes.** [`ContentHash`] is the fingerprint of the off-ledger
//!    certificate document; integrity checks compare against it.
//!
//! 4. **Record kinds and index namespaces.** [`RecordKind`] and
//!    [`IndexNamespace`] are closed enums, so key-prefix and index logic is
//!    checked by `match`, not by string comparison.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `edl-*` crates.
//! - No `unsafe` code.
//! - No `.unwrap()` outside tests.

pub mod digest;
pub mod error;
pub mod identity;
pub mod namespace;
pub mod temporal;

pub use digest::ContentHash;
pub use error::ValidationError;
pub use identity::{CertificateId, ConsentId, IssuerId, SubjectId, VerifierId, MAX_IDENTIFIER_LEN};
pub use namespace::{IndexNamespace, RecordKind};
pub use temporal::{Clock, ManualClock, SystemClock, Timestamp};
