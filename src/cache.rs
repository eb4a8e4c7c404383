//! Process-wide RAM cache store.
//!
//! `cache key → (hash → payload)`. Nothing is ever evicted or expired: a
//! route's namespace grows with the number of distinct hashes it sees, for
//! the lifetime of the process. Routes sharing a cache key share a namespace.

use std::collections::HashMap;
use std::sync::Arc;

use dashmap::DashMap;
use serde_json::Value;

/// A stored success payload. `None` is a success envelope sent without a
/// `result`.
pub type Payload = Option<Value>;

#[derive(Clone, Default)]
pub struct CacheStore {
    inner: Arc<DashMap<String, HashMap<String, Payload>>>,
}

impl CacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes sure the namespace for `key` exists.
    pub fn ensure(&self, key: &str) {
        self.inner.entry(key.to_owned()).or_default();
    }

    pub fn get(&self, key: &str, hash: &str) -> Option<Payload> {
        self.inner.get(key)?.get(hash).cloned()
    }

    /// Stores a payload. A concurrent writer for the same entry may overwrite
    /// it; last write wins.
    pub fn insert(&self, key: &str, hash: String, payload: Payload) {
        self.inner.entry(key.to_owned()).or_default().insert(hash, payload);
    }

    /// Number of entries stored under `key`.
    pub fn len(&self, key: &str) -> usize {
        self.inner.get(key).map_or(0, |namespace| namespace.len())
    }

    pub fn contains_namespace(&self, key: &str) -> bool {
        self.inner.contains_key(key)
    }
}
