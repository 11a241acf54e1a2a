//! # In-Memory Versioned Ledger
//!
//! A single-process ledger with the transaction semantics contract code
//! relies on:
//!
//! - **Buffered writes.** A transaction's writes are invisible to others
//!   until commit, and visible to its own later reads.
//! - **Optimistic concurrency.** Every key read records the version it saw.
//!   Commit re-checks those versions under the write lock; if any moved, the
//!   transaction fails with [`StoreError::Conflict`] and nothing is applied
//!   (first committer wins).
//! - **Immutable change log.** Every committed write appends to the key's
//!   history with the transaction id and timestamp.
//!
//! The lock is `parking_lot::RwLock` and is never held while contract code
//! runs, only during individual reads and the commit itself.
//!
//! Snapshots serialize current state, versions, and history as JSON so the
//! CLI and API can persist a ledger between runs.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use edl_core::{Clock, IndexNamespace, SystemClock, Timestamp};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::StoreError;
use crate::key::IndexKey;
use crate::ledger::{HistoryIter, HistoryRecord, Ledger, LedgerStore, TxError};
use crate::query::Selector;

#[derive(Debug, Clone, PartialEq, Eq)]
struct Versioned {
    value: Vec<u8>,
    version: u64,
}

#[derive(Debug, Default)]
struct LedgerState {
    entries: BTreeMap<String, Versioned>,
    history: BTreeMap<String, Vec<HistoryRecord>>,
    height: u64,
}

// ─── Ledger ──────────────────────────────────────────────────────────

/// Thread-safe, cloneable in-memory ledger. Clones share state.
#[derive(Debug, Clone)]
pub struct MemoryLedger {
    state: Arc<RwLock<LedgerState>>,
    clock: Arc<dyn Clock>,
    available: Arc<AtomicBool>,
}

impl MemoryLedger {
    /// Create an empty ledger stamping transactions from `clock`.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            state: Arc::new(RwLock::new(LedgerState::default())),
            clock,
            available: Arc::new(AtomicBool::new(true)),
        }
    }

    /// The clock transactions are stamped from.
    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Simulate an outage (`false`) or recovery (`true`).
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Whether the ledger is currently serving requests.
    pub fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }

    /// Number of committed writing transactions.
    pub fn height(&self) -> u64 {
        self.state.read().height
    }

    /// Number of keys in current state (primary and index).
    pub fn len(&self) -> usize {
        self.state.read().entries.len()
    }

    /// Whether current state holds no keys.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.is_available() {
            Ok(())
        } else {
            Err(StoreError::Unavailable("ledger is offline".to_string()))
        }
    }

    fn begin(&self) -> MemoryTx<'_> {
        MemoryTx {
            ledger: self,
            tx_id: Uuid::new_v4().to_string(),
            timestamp: self.clock.now(),
            reads: HashMap::new(),
            writes: BTreeMap::new(),
        }
    }
}

impl Default for MemoryLedger {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock))
    }
}

impl Ledger for MemoryLedger {
    fn transact<T, E, F>(&self, op: F) -> Result<T, E>
    where
        E: TxError,
        F: FnOnce(&mut dyn LedgerStore) -> Result<T, E>,
    {
        self.check_available()?;
        let mut tx = self.begin();
        let outcome = op(&mut tx);
        let commit = match &outcome {
            Ok(_) => true,
            Err(e) => e.commits_writes(),
        };
        if commit {
            tx.commit()?;
        } else {
            tracing::debug!(tx_id = %tx.tx_id, buffered = tx.writes.len(), "transaction discarded");
        }
        outcome
    }
}

// ─── Transaction ─────────────────────────────────────────────────────

/// A running transaction against a [`MemoryLedger`].
#[derive(Debug)]
pub struct MemoryTx<'a> {
    ledger: &'a MemoryLedger,
    tx_id: String,
    timestamp: Timestamp,
    reads: HashMap<String, u64>,
    writes: BTreeMap<String, Vec<u8>>,
}

impl MemoryTx<'_> {
    fn commit(self) -> Result<(), StoreError> {
        self.ledger.check_available()?;
        let mut state = self.ledger.state.write();
        for (key, seen) in &self.reads {
            let current = state.entries.get(key).map_or(0, |e| e.version);
            if current != *seen {
                tracing::warn!(tx_id = %self.tx_id, key = ?key, "read-set conflict, transaction aborted");
                return Err(StoreError::Conflict { key: key.clone() });
            }
        }
        if self.writes.is_empty() {
            return Ok(());
        }
        let written = self.writes.len();
        for (key, value) in self.writes {
            let version = state.entries.get(&key).map_or(0, |e| e.version) + 1;
            state.history.entry(key.clone()).or_default().push(HistoryRecord {
                tx_id: self.tx_id.clone(),
                timestamp: self.timestamp,
                is_delete: false,
                value: value.clone(),
            });
            state.entries.insert(key, Versioned { value, version });
        }
        state.height += 1;
        tracing::debug!(tx_id = %self.tx_id, written, height = state.height, "transaction committed");
        Ok(())
    }
}

impl LedgerStore for MemoryTx<'_> {
    fn tx_id(&self) -> &str {
        &self.tx_id
    }

    fn tx_timestamp(&self) -> Timestamp {
        self.timestamp
    }

    fn get(&mut self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        self.ledger.check_available()?;
        if let Some(value) = self.writes.get(key) {
            return Ok(Some(value.clone()));
        }
        let state = self.ledger.state.read();
        let entry = state.entries.get(key);
        self.reads
            .entry(key.to_string())
            .or_insert_with(|| entry.map_or(0, |e| e.version));
        Ok(entry.map(|e| e.value.clone()))
    }

    fn put(&mut self, key: &str, value: Vec<u8>) -> Result<(), StoreError> {
        self.ledger.check_available()?;
        self.writes.insert(key.to_string(), value);
        Ok(())
    }

    fn scan_by_index_prefix(
        &mut self,
        namespace: IndexNamespace,
        owner: &str,
    ) -> Result<Vec<IndexKey>, StoreError> {
        self.ledger.check_available()?;
        let prefix = IndexKey::owner_prefix(namespace, owner)?;
        let mut keys: BTreeSet<String> = {
            let state = self.ledger.state.read();
            state
                .entries
                .range(prefix.clone()..)
                .take_while(|(k, _)| k.starts_with(&prefix))
                .map(|(k, _)| k.clone())
                .collect()
        };
        keys.extend(
            self.writes
                .range(prefix.clone()..)
                .take_while(|(k, _)| k.starts_with(&prefix))
                .map(|(k, _)| k.clone()),
        );
        keys.iter().map(|k| IndexKey::parse(k)).collect()
    }

    fn rich_query(&mut self, selector: &Selector) -> Result<Vec<(String, Vec<u8>)>, StoreError> {
        self.ledger.check_available()?;
        let mut view: BTreeMap<String, Vec<u8>> = {
            let state = self.ledger.state.read();
            state
                .entries
                .iter()
                .filter(|(k, _)| !IndexKey::is_composite(k) && selector.matches_key(k))
                .map(|(k, e)| (k.clone(), e.value.clone()))
                .collect()
        };
        for (k, v) in &self.writes {
            if !IndexKey::is_composite(k) && selector.matches_key(k) {
                view.insert(k.clone(), v.clone());
            }
        }
        Ok(view
            .into_iter()
            .filter(|(k, v)| selector.matches(k, v))
            .collect())
    }

    /// The change log is copied out under the read lock, so the iterator is
    /// a point-in-time view: commits after this call do not appear in it.
    fn get_history(&mut self, key: &str) -> Result<HistoryIter<'_>, StoreError> {
        self.ledger.check_available()?;
        let records = self
            .ledger
            .state
            .read()
            .history
            .get(key)
            .cloned()
            .unwrap_or_default();
        Ok(Box::new(records.into_iter().map(Ok)))
    }
}

// ─── Snapshots ───────────────────────────────────────────────────────

#[derive(Serialize, Deserialize)]
struct LedgerSnapshot {
    height: u64,
    entries: BTreeMap<String, SnapshotEntry>,
    #[serde(default)]
    history: BTreeMap<String, Vec<SnapshotHistory>>,
}

#[derive(Serialize, Deserialize)]
struct SnapshotEntry {
    version: u64,
    value: String,
}

#[derive(Serialize, Deserialize)]
struct SnapshotHistory {
    tx_id: String,
    timestamp: Timestamp,
    #[serde(default)]
    is_delete: bool,
    value: String,
}

fn utf8(key: &str, bytes: &[u8]) -> Result<String, StoreError> {
    String::from_utf8(bytes.to_vec())
        .map_err(|_| StoreError::Snapshot(format!("value of {key:?} is not UTF-8")))
}

impl MemoryLedger {
    /// Serialize current state, versions, and history as JSON.
    pub fn snapshot(&self) -> Result<String, StoreError> {
        let state = self.state.read();
        let entries: BTreeMap<String, SnapshotEntry> = state
            .entries
            .iter()
            .map(|(k, e)| {
                Ok((
                    k.clone(),
                    SnapshotEntry {
                        version: e.version,
                        value: utf8(k, &e.value)?,
                    },
                ))
            })
            .collect::<Result<_, StoreError>>()?;
        let history: BTreeMap<String, Vec<SnapshotHistory>> = state
            .history
            .iter()
            .map(|(k, records)| {
                let records: Vec<SnapshotHistory> = records
                    .iter()
                    .map(|r| {
                        Ok(SnapshotHistory {
                            tx_id: r.tx_id.clone(),
                            timestamp: r.timestamp,
                            is_delete: r.is_delete,
                            value: utf8(k, &r.value)?,
                        })
                    })
                    .collect::<Result<_, StoreError>>()?;
                Ok((k.clone(), records))
            })
            .collect::<Result<_, StoreError>>()?;
        let snapshot = LedgerSnapshot {
            height: state.height,
            entries,
            history,
        };
        serde_json::to_string_pretty(&snapshot).map_err(|e| StoreError::Snapshot(e.to_string()))
    }

    /// Rebuild a ledger from [`MemoryLedger::snapshot`] output.
    pub fn from_snapshot(json: &str, clock: Arc<dyn Clock>) -> Result<Self, StoreError> {
        let snapshot: LedgerSnapshot =
            serde_json::from_str(json).map_err(|e| StoreError::Snapshot(e.to_string()))?;
        let state = LedgerState {
            entries: snapshot
                .entries
                .into_iter()
                .map(|(k, e)| {
                    (
                        k,
                        Versioned {
                            value: e.value.into_bytes(),
                            version: e.version,
                        },
                    )
                })
                .collect(),
            history: snapshot
                .history
                .into_iter()
                .map(|(k, records)| {
                    let records = records
                        .into_iter()
                        .map(|r| HistoryRecord {
                            tx_id: r.tx_id,
                            timestamp: r.timestamp,
                            is_delete: r.is_delete,
                            value: r.value.into_bytes(),
                        })
                        .collect();
                    (k, records)
                })
                .collect(),
            height: snapshot.height,
        };
        Ok(Self {
            state: Arc::new(RwLock::new(state)),
            clock,
            available: Arc::new(AtomicBool::new(true)),
        })
    }
}
