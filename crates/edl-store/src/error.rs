//! # Store Errors

use thiserror::Error;

/// Failures raised by the ledger substrate.
///
/// Contract code never inspects these beyond propagating them; they surface
/// to callers as `StoreUnavailable`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The ledger could not serve the request.
    #[error("ledger unavailable: {0}")]
    Unavailable(String),

    /// Another transaction committed a write to a key this one read.
    #[error("transaction conflict on key {key:?}")]
    Conflict {
        /// The first key whose version moved.
        key: String,
    },

    /// A composite key was malformed or an attribute contained the separator.
    #[error("invalid composite key: {0}")]
    InvalidKey(String),

    /// The backing store has no rich-query engine.
    #[error("rich queries are not supported by this ledger")]
    RichQueryUnsupported,

    /// A snapshot could not be produced or loaded.
    #[error("snapshot error: {0}")]
    Snapshot(String),
}
