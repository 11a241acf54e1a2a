//! # Validation Errors
//!
//! Errors raised when constructing core domain values from untrusted input.
//! Higher layers wrap these into their own error enums via `#[from]`.

use thiserror::Error;

/// Rejection of a domain value at construction time.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Identifier is empty or whitespace-only.
    #[error("{kind} must be non-empty")]
    EmptyIdentifier {
        /// Which identifier kind was rejected.
        kind: &'static str,
    },

    /// Identifier exceeds the maximum permitted length.
    #[error("{kind} must not exceed {max} bytes (got {len})")]
    IdentifierTooLong {
        /// Which identifier kind was rejected.
        kind: &'static str,
        /// Length of the rejected value.
        len: usize,
        /// Maximum permitted length.
        max: usize,
    },

    /// Identifier contains a control character (including the composite-key
    /// separator `\0`).
    #[error("{kind} contains a control character")]
    ControlCharacter {
        /// Which identifier kind was rejected.
        kind: &'static str,
    },

    /// Content hash is empty.
    #[error("content hash must be non-empty")]
    EmptyHash,

    /// Timestamp string is not valid UTC RFC 3339.
    #[error("invalid timestamp: \"{value}\" ({reason})")]
    InvalidTimestamp {
        /// The string that failed to parse.
        value: String,
        /// Why it was rejected.
        reason: String,
    },

    /// Timestamp arithmetic left the representable range.
    #[error("timestamp out of range")]
    TimestampOutOfRange,
}
