//! In-process cache store
//!
//! A `HashMap`-backed [`CacheStore`] keyed by encoded key string. Glob
//! enumeration is exact filename-style matching over the encoded keys of a
//! namespace. Used by embedders that index into local memory and by tests.

use super::{CacheKey, CacheRecord, CacheStore, Namespace};
use glob::Pattern;
use std::collections::HashMap;

#[derive(Default)]
pub struct MemoryCache {
    records: HashMap<String, CacheRecord>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a record under its encoded key.
    pub fn put(&mut self, record: CacheRecord) {
        self.records.insert(record.key.encode(), record);
    }
}

impl CacheStore for MemoryCache {
    fn get(&self, namespace: Namespace, key: &CacheKey) -> Option<CacheRecord> {
        debug_assert_eq!(namespace, key.namespace());
        self.records.get(&key.encode()).cloned()
    }

    fn get_all(&self, namespace: Namespace, keys: &[CacheKey]) -> Vec<CacheRecord> {
        keys.iter()
            .filter_map(|key| self.get(namespace, key))
            .collect()
    }

    fn filter_identifiers(&self, namespace: Namespace, pattern: &str) -> Vec<String> {
        let Ok(pattern) = Pattern::new(pattern) else {
            tracing::warn!("invalid glob pattern: {}", pattern);
            return Vec::new();
        };

        let prefix = format!("{}:{}:", super::key::PROVIDER, namespace.as_str());
        let mut matches: Vec<String> = self
            .records
            .keys()
            .filter(|key| key.starts_with(&prefix) && pattern.matches(key))
            .cloned()
            .collect();
        // Stable output independent of map iteration order.
        matches.sort();
        matches
    }
}
