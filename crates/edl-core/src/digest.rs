//! # Content Hash — Certificate Document Fingerprints
//!
//! A certificate on the ledger does not carry the document itself, only the
//! fingerprint of the document held off-ledger. Verification is a plain
//! equality check between the presented hash and the stored one; tampering
//! with the document changes its hash and fails that check.
//!
//! Issuers may compute hashes any way they like; [`ContentHash::of_document`]
//! is the default SHA-256 scheme used by the CLI tooling.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::ValidationError;

/// Fingerprint of an off-ledger certificate document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ContentHash(String);

impl TryFrom<String> for ContentHash {
    type Error = ValidationError;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        Self::new(raw)
    }
}

impl From<ContentHash> for String {
    fn from(hash: ContentHash) -> Self {
        hash.0
    }
}

impl ContentHash {
    /// Wrap an externally computed hash.
    ///
    /// The value is compared byte-for-byte; no case folding is applied.
    pub fn new(raw: impl Into<String>) -> Result<Self, ValidationError> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            return Err(ValidationError::EmptyHash);
        }
        Ok(Self(raw))
    }

    /// SHA-256 of a document, as 64 lowercase hex characters.
    pub fn of_document(bytes: &[u8]) -> Self {
        let hash = Sha256::digest(bytes);
        Self(hash.iter().map(|b| format!("{b:02x}")).collect())
    }

    /// Whether a presented hash matches this one exactly.
    pub fn matches(&self, presented: &ContentHash) -> bool {
        self.0 == presented.0
    }

    /// Borrow the hash as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ContentHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
