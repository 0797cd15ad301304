//! gcpcache - cache query engine for GCP resources
//!
//! A read path over a namespaced, relationship-bearing resource cache plus
//! batched existence resolvers against the Compute Engine API. The cache is
//! populated by an external indexer; this crate resolves identifiers against
//! it (named images, instances, load balancers) and searches external
//! collections with first-match and aggregate-not-found semantics.
//!
//! # Module Structure
//!
//! - [`cache`] - Key codec, record model, and store interface
//! - [`metadata`] - Map/list-of-pairs metadata codec
//! - [`query`] - Cross-namespace joins producing aggregate views
//! - [`resolve`] - Batched image, instance, and load balancer resolvers
//! - [`gcp`] - Compute Engine client used by the resolvers
//!
//! # Example
//!
//! ```ignore
//! use gcpcache::query::named_images;
//!
//! let views = named_images::search(&cache, Some("myapp"), None, Some("us-central1"))?;
//! for view in views {
//!     println!("{}: {:?}", view.name, view.images_by_region);
//! }
//! ```

pub mod cache;
pub mod error;
pub mod gcp;
pub mod metadata;
pub mod query;
pub mod resolve;

pub use cache::{CacheKey, CacheRecord, CacheStore, MemoryCache, Namespace, Relations};
pub use error::{Error, Result};
