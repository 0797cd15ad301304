//! Instance URL resolution
//!
//! Resolves requested instance names to their API URLs using one
//! aggregated-by-zone listing for the whole project. Only zones belonging to
//! the target region count; a name that only exists in another region is
//! treated identically to one that does not exist at all.

use crate::error::{Error, Result};
use crate::gcp::ComputeClient;
use std::collections::HashMap;

/// Resolve `names` to instance self links, in request order (one output per
/// input occurrence). Fails with [`Error::InstancesNotFound`] enumerating
/// every unresolved name in original request order.
pub async fn resolve_instance_urls(
    client: &ComputeClient,
    project: &str,
    region: &str,
    names: &[String],
) -> Result<Vec<String>> {
    let by_zone = client.aggregated_list_instances(project).await?;

    let mut found: HashMap<String, String> = HashMap::new();
    for (scope, instances) in &by_zone {
        let zone = scope.strip_prefix("zones/").unwrap_or(scope);
        if zone_region(zone) != region {
            continue;
        }
        for instance in instances {
            if names.contains(&instance.name) {
                found
                    .entry(instance.name.clone())
                    .or_insert_with(|| instance.self_link.clone());
            }
        }
    }

    let mut urls = Vec::with_capacity(names.len());
    let mut missing: Vec<String> = Vec::new();
    for name in names {
        match found.get(name) {
            Some(url) => urls.push(url.clone()),
            None => {
                if !missing.contains(name) {
                    missing.push(name.clone());
                }
            }
        }
    }

    if !missing.is_empty() {
        return Err(Error::InstancesNotFound { names: missing });
    }

    tracing::debug!(
        "resolved {} instance urls in {}/{}",
        urls.len(),
        project,
        region
    );
    Ok(urls)
}

/// Region of a zone: the zone name minus its final dash segment
/// (`us-central1-b` belongs to `us-central1`).
fn zone_region(zone: &str) -> &str {
    let mut parts = zone.rsplitn(2, '-');
    let _suffix = parts.next();
    parts.next().unwrap_or(zone)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zone_region_strips_last_segment() {
        assert_eq!(zone_region("us-central1-b"), "us-central1");
        assert_eq!(zone_region("europe-west1-d"), "europe-west1");
    }

    #[test]
    fn zone_without_dash_is_its_own_region() {
        assert_eq!(zone_region("local"), "local");
    }
}
