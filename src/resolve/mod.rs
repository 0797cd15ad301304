//! Existence resolvers
//!
//! Batched lookups against external resource collections: images across
//! ordered candidate projects, instances across zones, load balancers across
//! an application's directory. First match wins by declared list position,
//! never by response arrival; misses are reported exhaustively in one error.

pub mod images;
pub mod instances;
pub mod load_balancers;

pub use images::{find_image, ImageQuery};
pub use instances::resolve_instance_urls;
pub use load_balancers::{
    backends_differ, resolve_load_balancers, url_map_differs, CachedLoadBalancers,
    HttpLoadBalancerSpec, LoadBalancerDirectory, LoadBalancerView, UrlMap,
};
