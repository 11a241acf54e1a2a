//! # edl-store — Ledger Storage Capability
//!
//! The contract layer never touches storage directly. It receives a
//! [`LedgerStore`] for the duration of one transaction from a [`Ledger`],
//! which owns commit and discard.
//!
//! ## Contents
//!
//! - `ledger.rs`: the [`LedgerStore`] / [`Ledger`] / [`TxError`] traits and
//!   the [`HistoryRecord`] change-log entry.
//! - `key.rs`: composite secondary-index keys (`\0ns\0owner\0entity\0`).
//! - `query.rs`: equality [`Selector`] for rich queries.
//! - `memory.rs`: [`MemoryLedger`], a versioned in-memory ledger with
//!   optimistic concurrency, history, failure injection, and JSON snapshots.

pub mod error;
pub mod key;
pub mod ledger;
pub mod memory;
pub mod query;

pub use error::StoreError;
pub use key::{IndexKey, COMPOSITE_SEPARATOR, INDEX_SENTINEL};
pub use ledger::{HistoryIter, HistoryRecord, Ledger, LedgerStore, TxError};
pub use memory::{MemoryLedger, MemoryTx};
pub use query::Selector;
