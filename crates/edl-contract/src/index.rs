//! # Index Manager
//!
//! Owner → entity secondary indexes. Entries are written in the same
//! transaction as the entity they point at and are never deleted, because
//! the entities themselves are never deleted.
//!
//! | Namespace             | Owner      | Entity        |
//! |-----------------------|------------|---------------|
//! | `subject~certificate` | subject    | certificate   |
//! | `verifier~consent`    | verifier   | consent       |
//! | `subject~consent`     | subject    | consent       |

use edl_core::IndexNamespace;
use edl_state::LedgerRecord;
use edl_store::INDEX_SENTINEL;

use crate::context::TxContext;
use crate::error::ContractError;

/// Reads and writes secondary-index entries.
pub struct IndexManager;

impl IndexManager {
    /// Record that `owner` owns `entity` in `namespace`.
    pub fn put_entry(
        ctx: &mut TxContext<'_>,
        namespace: IndexNamespace,
        owner: &str,
        entity: &str,
    ) -> Result<(), ContractError> {
        let store = ctx.store();
        let key = store.make_index_key(namespace, owner, entity)?;
        store.put(&key, INDEX_SENTINEL.to_vec())?;
        Ok(())
    }

    /// Entity ids owned by `owner`, in lexicographic order.
    pub fn entity_ids(
        ctx: &mut TxContext<'_>,
        namespace: IndexNamespace,
        owner: &str,
    ) -> Result<Vec<String>, ContractError> {
        let keys = ctx.store().scan_by_index_prefix(namespace, owner)?;
        Ok(keys.into_iter().map(|k| k.entity).collect())
    }

    /// Load every record an index points at.
    ///
    /// Entries whose record is missing are skipped with a warning rather than
    /// failing the listing.
    pub fn load_all<R: LedgerRecord>(
        ctx: &mut TxContext<'_>,
        namespace: IndexNamespace,
        owner: &str,
    ) -> Result<Vec<R>, ContractError> {
        debug_assert_eq!(namespace.target(), R::KIND);
        let ids = Self::entity_ids(ctx, namespace, owner)?;
        let mut records = Vec::with_capacity(ids.len());
        for id in ids {
            match ctx.load::<R>(&id)? {
                Some(record) => records.push(record),
                None => tracing::warn!(
                    namespace = %namespace,
                    owner,
                    entity = %id,
                    "index entry points at a missing record, skipping"
                ),
            }
        }
        Ok(records)
    }
}
