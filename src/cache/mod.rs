//! Namespaced resource cache read interface
//!
//! The cache is pre-populated by an external indexer; this crate only reads
//! it. Records carry their composite key, a JSON attribute blob, and typed
//! edges into the other namespaces.
//!
//! # Module Structure
//!
//! - [`key`] - Composite key codec and glob pattern helpers
//! - [`memory`] - In-process store implementation backed by a `HashMap`

pub mod key;
pub mod memory;

pub use key::{CacheKey, Namespace};
pub use memory::MemoryCache;

use serde_json::Value;

/// Typed adjacency of a cache record. One slot per namespace a record may
/// relate to, so an unexpected namespace cannot appear at runtime.
#[derive(Debug, Clone, Default)]
pub struct Relations {
    images: Vec<CacheKey>,
    named_images: Vec<CacheKey>,
    instances: Vec<CacheKey>,
    load_balancers: Vec<CacheKey>,
}

impl Relations {
    /// Add an edge; the slot is chosen by the key's own namespace.
    pub fn push(&mut self, key: CacheKey) {
        match key.namespace() {
            Namespace::Image => self.images.push(key),
            Namespace::NamedImage => self.named_images.push(key),
            Namespace::Instance => self.instances.push(key),
            Namespace::LoadBalancer => self.load_balancers.push(key),
        }
    }

    pub fn related(&self, namespace: Namespace) -> &[CacheKey] {
        match namespace {
            Namespace::Image => &self.images,
            Namespace::NamedImage => &self.named_images,
            Namespace::Instance => &self.instances,
            Namespace::LoadBalancer => &self.load_balancers,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
            && self.named_images.is_empty()
            && self.instances.is_empty()
            && self.load_balancers.is_empty()
    }
}

impl FromIterator<CacheKey> for Relations {
    fn from_iter<I: IntoIterator<Item = CacheKey>>(iter: I) -> Self {
        let mut relations = Relations::default();
        for key in iter {
            relations.push(key);
        }
        relations
    }
}

/// One cached item plus its edges into other namespaces' items.
#[derive(Debug, Clone)]
pub struct CacheRecord {
    pub key: CacheKey,
    pub attributes: Value,
    pub relations: Relations,
}

impl CacheRecord {
    pub fn new(key: CacheKey) -> Self {
        Self {
            key,
            attributes: Value::Null,
            relations: Relations::default(),
        }
    }

    pub fn with_attributes(mut self, attributes: Value) -> Self {
        self.attributes = attributes;
        self
    }

    pub fn with_relation(mut self, key: CacheKey) -> Self {
        self.relations.push(key);
        self
    }
}

/// Read interface of the external cache store. Implementations must support
/// concurrent reads; this crate never writes through this trait.
pub trait CacheStore: Send + Sync {
    /// Exact-key lookup.
    fn get(&self, namespace: Namespace, key: &CacheKey) -> Option<CacheRecord>;

    /// Multi-get; absent keys are silently skipped.
    fn get_all(&self, namespace: Namespace, keys: &[CacheKey]) -> Vec<CacheRecord>;

    /// Enumerate the encoded keys of a namespace matching a glob pattern.
    fn filter_identifiers(&self, namespace: Namespace, pattern: &str) -> Vec<String>;
}
