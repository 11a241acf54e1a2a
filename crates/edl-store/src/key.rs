//! # Composite Index Keys
//!
//! Secondary-index entries are stored under composite keys of the form
//!
//! ```text
//! \0<namespace>\0<owner>\0<entity>\0
//! ```
//!
//! with a one-byte sentinel value. Because `\0` sorts below every other
//! byte, lexicographic order over encoded keys is exactly tuple order over
//! `(namespace, owner, entity)`, and a prefix ending in `\0<owner>\0`
//! selects one owner's entries and nothing else.
//!
//! Primary keys never start with `\0`, so the two key spaces cannot collide.

use edl_core::IndexNamespace;

use crate::error::StoreError;

/// Separator and leading byte of every composite key.
pub const COMPOSITE_SEPARATOR: char = '\u{0}';

/// Value stored under every index key. Index entries carry no payload.
pub const INDEX_SENTINEL: &[u8] = &[0x00];

/// A decoded secondary-index entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IndexKey {
    /// The index the entry belongs to.
    pub namespace: IndexNamespace,
    /// Owner attribute (subject or verifier id).
    pub owner: String,
    /// Id of the indexed entity.
    pub entity: String,
}

impl IndexKey {
    /// Build an index entry, rejecting attributes that would corrupt the key.
    pub fn new(
        namespace: IndexNamespace,
        owner: impl Into<String>,
        entity: impl Into<String>,
    ) -> Result<Self, StoreError> {
        let owner = owner.into();
        let entity = entity.into();
        check_attribute(&owner)?;
        check_attribute(&entity)?;
        Ok(Self {
            namespace,
            owner,
            entity,
        })
    }

    /// Encode as a composite key.
    pub fn encode(&self) -> String {
        let mut key = owner_prefix_unchecked(self.namespace, &self.owner);
        key.push_str(&self.entity);
        key.push(COMPOSITE_SEPARATOR);
        key
    }

    /// Prefix selecting every entry of `owner` in `namespace`.
    pub fn owner_prefix(namespace: IndexNamespace, owner: &str) -> Result<String, StoreError> {
        check_attribute(owner)?;
        Ok(owner_prefix_unchecked(namespace, owner))
    }

    /// Decode a composite key produced by [`IndexKey::encode`].
    pub fn parse(key: &str) -> Result<Self, StoreError> {
        let inner = key
            .strip_prefix(COMPOSITE_SEPARATOR)
            .and_then(|k| k.strip_suffix(COMPOSITE_SEPARATOR))
            .ok_or_else(|| StoreError::InvalidKey(format!("{key:?} is not a composite key")))?;
        let parts: Vec<&str> = inner.split(COMPOSITE_SEPARATOR).collect();
        let [tag, owner, entity] = parts.as_slice() else {
            return Err(StoreError::InvalidKey(format!(
                "expected 3 attributes, found {}",
                parts.len()
            )));
        };
        let namespace = IndexNamespace::from_tag(tag)
            .ok_or_else(|| StoreError::InvalidKey(format!("unknown index namespace {tag:?}")))?;
        Self::new(namespace, *owner, *entity)
    }

    /// Whether `key` lives in the composite key space.
    pub fn is_composite(key: &str) -> bool {
        key.starts_with(COMPOSITE_SEPARATOR)
    }
}

fn owner_prefix_unchecked(namespace: IndexNamespace, owner: &str) -> String {
    let mut key = String::with_capacity(namespace.as_str().len() + owner.len() + 3);
    key.push(COMPOSITE_SEPARATOR);
    key.push_str(namespace.as_str());
    key.push(COMPOSITE_SEPARATOR);
    key.push_str(owner);
    key.push(COMPOSITE_SEPARATOR);
    key
}

fn check_attribute(attr: &str) -> Result<(), StoreError> {
    if attr.is_empty() {
        return Err(StoreError::InvalidKey("empty attribute".to_string()));
    }
    if attr.contains(COMPOSITE_SEPARATOR) {
        return Err(StoreError::InvalidKey(format!(
            "attribute {attr:?} contains the separator"
        )));
    }
    Ok(())
}
