//! # edl-contract — Credential Registry Transaction Logic
//!
//! The code that would run as a smart contract on a permissioned ledger.
//! It owns no storage and no clock: each operation receives a
//! [`TxContext`] wrapping one ledger transaction and the caller identity.
//!
//! ## Components
//!
//! - [`CredentialStore`]: issue, read, verify, revoke, list certificates.
//! - [`ConsentEngine`]: grant, checked access, scoped disclosure, revoke,
//!   list and query consents.
//! - [`IndexManager`]: owner → entity secondary indexes shared by both.
//! - [`HistoryReader`]: per-entity timelines from the change log.
//! - [`Registry`]: one-transaction-per-call facade with event flushing.
//!
//! ## Dependency Direction
//!
//! ```text
//! Registry ──▶ ConsentEngine ──▶ CredentialStore records
//!    │               │
//!    └──▶ CredentialStore ──▶ IndexManager ──▶ LedgerStore
//! ```

pub mod config;
pub mod consent;
pub mod context;
pub mod credential;
pub mod error;
pub mod events;
pub mod history;
pub mod identity;
pub mod index;
pub mod registry;

pub use config::ContractConfig;
pub use consent::ConsentEngine;
pub use context::TxContext;
pub use credential::CredentialStore;
pub use error::{ContractError, ErrorKind};
pub use events::{ContractEvent, EventSink, RecordingEventSink, TracingEventSink};
pub use history::{HistoryEntry, HistoryReader, RecordHistory};
pub use identity::{CallerIdentity, IdentityProvider};
pub use index::IndexManager;
pub use registry::Registry;
