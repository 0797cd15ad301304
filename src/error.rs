//! Error taxonomy for cache queries and resolvers
//!
//! "Not found" conditions are always reported exhaustively: resolvers batch
//! every missing identifier into a single error rather than failing fast on
//! the first miss, so callers see the full list in deterministic input order.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// One or more identifiers absent after exhaustive search.
    #[error("{0}")]
    NotFound(String),

    /// Caller input failed a precondition (e.g. query term too short).
    #[error("{0}")]
    InvalidQuery(String),

    /// The cache contains a key this codec cannot parse. This indicates an
    /// upstream indexer bug, not a caller error.
    #[error("malformed cache key: {0}")]
    MalformedKey(String),

    /// No candidate project contained the requested image.
    #[error("Image {image} not found in any of projects [{}].", projects.join(", "))]
    ImageNotFound { image: String, projects: Vec<String> },

    /// Requested instance names that no zone of the target region contained,
    /// in original request order.
    #[error("Instances [{}] not found.", names.join(", "))]
    InstancesNotFound { names: Vec<String> },

    /// Requested load balancer names with no matching view, in original
    /// request order.
    #[error("Load balancers [{}] not found.", names.join(", "))]
    LoadBalancersNotFound { names: Vec<String> },

    /// Transport-level failure; propagated unchanged, never retried here.
    #[error(transparent)]
    Transport(#[from] anyhow::Error),
}
