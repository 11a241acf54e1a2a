//! # History Reader
//!
//! Rebuilds an entity's mutation timeline from the ledger's change log.
//! Each entry pairs the transaction that wrote it with the record as it
//! stood after that write.
//!
//! The ledger hands over a point-in-time copy of the raw change log; turning
//! each write into a record happens lazily, one entry per `next()`. The
//! sequence is forward-only and finite. A write whose payload is empty or
//! cannot be decoded yields the record's zero value instead of ending the
//! timeline.

use std::marker::PhantomData;

use serde::Serialize;

use edl_core::{CertificateId, ConsentId, Timestamp};
use edl_state::{Certificate, ConsentRecord, LedgerRecord};
use edl_store::{HistoryIter, HistoryRecord};

use crate::context::TxContext;
use crate::error::ContractError;

/// One point in an entity's timeline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryEntry<R> {
    /// Transaction that produced this version.
    pub tx_id: String,
    /// When that transaction ran.
    pub timestamp: Timestamp,
    /// Whether the transaction deleted the entity.
    pub is_delete: bool,
    /// The entity after the write.
    pub record: R,
}

impl<R: LedgerRecord> HistoryEntry<R> {
    fn from_raw(raw: HistoryRecord) -> Self {
        let record = if raw.is_delete {
            R::default()
        } else {
            R::decode_lenient(&raw.value)
        };
        Self {
            tx_id: raw.tx_id,
            timestamp: raw.timestamp,
            is_delete: raw.is_delete,
            record,
        }
    }
}

/// Iterator over an entity's timeline, oldest first.
pub struct RecordHistory<'a, R> {
    inner: HistoryIter<'a>,
    _record: PhantomData<R>,
}

impl<R: LedgerRecord> Iterator for RecordHistory<'_, R> {
    type Item = Result<HistoryEntry<R>, ContractError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner
            .next()
            .map(|raw| raw.map(HistoryEntry::from_raw).map_err(ContractError::from))
    }
}

/// Read-only access to change logs.
pub struct HistoryReader;

impl HistoryReader {
    /// Timeline of the record of type `R` with id `id`. Unknown ids yield an
    /// empty timeline.
    pub fn history<'t, R: LedgerRecord>(
        ctx: &'t mut TxContext<'_>,
        id: &str,
    ) -> Result<RecordHistory<'t, R>, ContractError> {
        let key = R::KIND.primary_key(id);
        let inner = ctx.store().get_history(&key)?;
        Ok(RecordHistory {
            inner,
            _record: PhantomData,
        })
    }

    pub fn certificate<'t>(
        ctx: &'t mut TxContext<'_>,
        id: &CertificateId,
    ) -> Result<RecordHistory<'t, Certificate>, ContractError> {
        Self::history(ctx, id.as_str())
    }

    pub fn consent<'t>(
        ctx: &'t mut TxContext<'_>,
        id: &ConsentId,
    ) -> Result<RecordHistory<'t, ConsentRecord>, ContractError> {
        Self::history(ctx, id.as_str())
    }
}
