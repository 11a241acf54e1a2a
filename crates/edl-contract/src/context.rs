//! # Transaction Context
//!
//! What a contract operation sees while it runs: the transaction's ledger
//! view, the caller, and an outbox of events that the [`Registry`] flushes
//! after commit.
//!
//! [`Registry`]: crate::Registry

use edl_core::{RecordKind, Timestamp};
use edl_state::LedgerRecord;
use edl_store::LedgerStore;

use crate::error::ContractError;
use crate::events::ContractEvent;
use crate::identity::IdentityProvider;

/// Per-transaction state handed to every contract operation.
pub struct TxContext<'a> {
    store: &'a mut dyn LedgerStore,
    caller: &'a dyn IdentityProvider,
    events: Vec<ContractEvent>,
}

impl<'a> TxContext<'a> {
    /// Wrap a ledger view for one operation by `caller`.
    pub fn new(store: &'a mut dyn LedgerStore, caller: &'a dyn IdentityProvider) -> Self {
        Self {
            store,
            caller,
            events: Vec::new(),
        }
    }

    /// The transaction timestamp. The only clock contract code reads.
    pub fn now(&self) -> Timestamp {
        self.store.tx_timestamp()
    }

    /// Id of the running transaction.
    pub fn tx_id(&self) -> &str {
        self.store.tx_id()
    }

    /// The invoking identity.
    pub fn caller(&self) -> &dyn IdentityProvider {
        self.caller
    }

    /// Direct access to the ledger view.
    pub fn store(&mut self) -> &mut (dyn LedgerStore + 'a) {
        &mut *self.store
    }

    /// Load and decode a record by id.
    pub fn load<R: LedgerRecord>(&mut self, id: &str) -> Result<Option<R>, ContractError> {
        match self.store.get(&R::KIND.primary_key(id))? {
            Some(bytes) => Ok(Some(R::decode(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Load a record, failing `NotFound` if absent.
    pub fn require<R: LedgerRecord>(&mut self, id: &str) -> Result<R, ContractError> {
        self.load(id)?
            .ok_or_else(|| ContractError::not_found(R::KIND, id))
    }

    /// Whether a primary key exists for `id`.
    pub fn exists(&mut self, kind: RecordKind, id: &str) -> Result<bool, ContractError> {
        Ok(self.store.get(&kind.primary_key(id))?.is_some())
    }

    /// Encode and buffer a record write.
    pub fn save<R: LedgerRecord>(&mut self, record: &R) -> Result<(), ContractError> {
        let bytes = record.encode()?;
        self.store.put(&record.primary_key(), bytes)?;
        Ok(())
    }

    /// Queue an event for emission after commit.
    pub fn emit(&mut self, event: ContractEvent) {
        self.events.push(event);
    }

    /// Drain the queued events.
    pub fn take_events(&mut self) -> Vec<ContractEvent> {
        std::mem::take(&mut self.events)
    }
}
