//! # Rich-Query Selectors
//!
//! A small subset of the document-store selector language: a key prefix
//! plus exact-match constraints on dotted JSON paths. Stores that keep
//! JSON values can evaluate it; stores that cannot return
//! [`StoreError::RichQueryUnsupported`](crate::StoreError::RichQueryUnsupported).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Equality selector over stored JSON documents.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Selector {
    /// Only keys starting with this prefix are considered.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_prefix: Option<String>,
    /// Dotted path → required value.
    #[serde(default)]
    pub fields: BTreeMap<String, Value>,
}

impl Selector {
    /// An empty selector matching every JSON document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict to keys under `prefix`.
    pub fn key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = Some(prefix.into());
        self
    }

    /// Require the value at `path` (e.g. `record.status`) to equal `value`.
    pub fn field_eq(mut self, path: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(path.into(), value.into());
        self
    }

    /// Whether the key is in scope.
    pub fn matches_key(&self, key: &str) -> bool {
        self.key_prefix
            .as_deref()
            .map_or(true, |prefix| key.starts_with(prefix))
    }

    /// Whether a parsed document satisfies every field constraint.
    pub fn matches_document(&self, doc: &Value) -> bool {
        self.fields
            .iter()
            .all(|(path, expected)| lookup(doc, path) == Some(expected))
    }

    /// Key and raw bytes check combined. Non-JSON values never match.
    pub fn matches(&self, key: &str, bytes: &[u8]) -> bool {
        if !self.matches_key(key) {
            return false;
        }
        match serde_json::from_slice::<Value>(bytes) {
            Ok(doc) => self.matches_document(&doc),
            Err(_) => false,
        }
    }
}

fn lookup<'a>(doc: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(doc, |node, segment| node.get(segment))
}
