//! # Ledger Capabilities
//!
//! Two seams separate contract logic from the ledger substrate:
//!
//! - [`LedgerStore`] is the per-transaction view: reads, buffered writes,
//!   index scans, rich queries, and the immutable change log. It also
//!   carries the transaction id and timestamp, which are the only sources
//!   of identity and time contract code may use.
//! - [`Ledger`] is the transaction boundary: it opens a store, runs one
//!   contract operation against it, and commits or discards the writes.
//!
//! ## Commit Rule
//!
//! Writes commit when the operation succeeds, and also when it fails with
//! an error whose [`TxError::commits_writes`] is true. The latter exists
//! for state transitions that must persist even though the call reports a
//! failure (lazy consent expiry).

use edl_core::{IndexNamespace, Timestamp};
use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::key::IndexKey;
use crate::query::Selector;

/// One committed write in a key's change log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryRecord {
    /// Transaction that produced the write.
    pub tx_id: String,
    /// Transaction timestamp.
    pub timestamp: Timestamp,
    /// Whether the write deleted the key.
    pub is_delete: bool,
    /// Value written (empty on delete).
    pub value: Vec<u8>,
}

/// Forward-only iterator over a key's change log, oldest first.
///
/// Reflects the log as committed when the iterator was obtained.
pub type HistoryIter<'a> = Box<dyn Iterator<Item = Result<HistoryRecord, StoreError>> + 'a>;

/// The per-transaction view of the ledger.
pub trait LedgerStore {
    /// Id of the running transaction.
    fn tx_id(&self) -> &str;

    /// Timestamp of the running transaction.
    fn tx_timestamp(&self) -> Timestamp;

    /// Read a key. Sees this transaction's own buffered writes.
    fn get(&mut self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    /// Buffer a write, applied on commit.
    fn put(&mut self, key: &str, value: Vec<u8>) -> Result<(), StoreError>;

    /// Encode an index entry as a composite key.
    fn make_index_key(
        &self,
        namespace: IndexNamespace,
        owner: &str,
        entity: &str,
    ) -> Result<String, StoreError> {
        IndexKey::new(namespace, owner, entity).map(|k| k.encode())
    }

    /// All index entries of `owner` in `namespace`, in key order.
    fn scan_by_index_prefix(
        &mut self,
        namespace: IndexNamespace,
        owner: &str,
    ) -> Result<Vec<IndexKey>, StoreError>;

    /// Primary-key entries whose JSON value satisfies `selector`, in key order.
    fn rich_query(&mut self, _selector: &Selector) -> Result<Vec<(String, Vec<u8>)>, StoreError> {
        Err(StoreError::RichQueryUnsupported)
    }

    /// Committed change log of `key`.
    fn get_history(&mut self, key: &str) -> Result<HistoryIter<'_>, StoreError>;
}

/// Errors that can flow out of a ledger transaction.
pub trait TxError: From<StoreError> {
    /// Whether buffered writes should commit despite this error.
    fn commits_writes(&self) -> bool {
        false
    }
}

impl TxError for StoreError {}

/// A transaction boundary.
pub trait Ledger: Send + Sync {
    /// Run `op` in a fresh transaction.
    ///
    /// Commit failures (conflicts, unavailability) replace the operation's
    /// own result.
    fn transact<T, E, F>(&self, op: F) -> Result<T, E>
    where
        E: TxError,
        F: FnOnce(&mut dyn LedgerStore) -> Result<T, E>;
}
