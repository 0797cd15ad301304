//! Cache query layer
//!
//! Read-side queries that join records across namespaces into aggregate
//! views. Views are built per call and discarded with the response; nothing
//! here writes to the cache.

pub mod named_images;

pub use named_images::{get_by_exact_id, NamedImageView};
