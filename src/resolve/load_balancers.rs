//! Load balancer resolution and drift detection
//!
//! Resolves a server group's declared load balancer names against a
//! directory of views, and detects structural drift between a remote URL map
//! document and a desired declarative description.

use crate::cache::{CacheKey, CacheStore, Namespace};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// One load balancer as seen by callers: identity plus the backend service
/// and certificate it fronts, when known.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadBalancerView {
    pub name: String,
    pub account: String,
    pub region: String,
    #[serde(default)]
    pub backend_service: Option<String>,
    #[serde(default)]
    pub certificate: Option<String>,
}

/// Directory of load balancers visible to an application scope.
pub trait LoadBalancerDirectory {
    fn application_load_balancers(&self, application: &str) -> Result<Vec<LoadBalancerView>>;
}

/// Cache-backed directory: load balancers whose name starts with the
/// application prefix, across all accounts and regions.
pub struct CachedLoadBalancers<'a> {
    cache: &'a dyn CacheStore,
}

impl<'a> CachedLoadBalancers<'a> {
    pub fn new(cache: &'a dyn CacheStore) -> Self {
        Self { cache }
    }
}

impl LoadBalancerDirectory for CachedLoadBalancers<'_> {
    fn application_load_balancers(&self, application: &str) -> Result<Vec<LoadBalancerView>> {
        let pattern = crate::cache::key::search_pattern(
            Namespace::LoadBalancer,
            &["*", "*", &format!("{application}*")],
        );
        let ids = self.cache.filter_identifiers(Namespace::LoadBalancer, &pattern);
        let keys = ids
            .iter()
            .map(|id| CacheKey::decode(id))
            .collect::<Result<Vec<_>>>()?;

        let views = self
            .cache
            .get_all(Namespace::LoadBalancer, &keys)
            .into_iter()
            .filter_map(|record| {
                let name = record.key.field("name")?.to_string();
                let region = record.key.field("region")?.to_string();
                let attrs = &record.attributes;
                Some(LoadBalancerView {
                    name,
                    account: record.key.account().to_string(),
                    region,
                    backend_service: attrs
                        .get("backendService")
                        .and_then(|v| v.as_str())
                        .map(String::from),
                    certificate: attrs
                        .get("certificate")
                        .and_then(|v| v.as_str())
                        .map(String::from),
                })
            })
            .collect();
        Ok(views)
    }
}

/// Resolve each requested name against the application's directory, in
/// request order. Fails with [`Error::LoadBalancersNotFound`] listing every
/// name with no matching view.
pub fn resolve_load_balancers(
    directory: &dyn LoadBalancerDirectory,
    application: &str,
    names: &[String],
) -> Result<Vec<LoadBalancerView>> {
    let views = directory.application_load_balancers(application)?;

    let mut by_name: HashMap<&str, &LoadBalancerView> = HashMap::new();
    for view in &views {
        by_name.entry(view.name.as_str()).or_insert(view);
    }

    let mut resolved = Vec::with_capacity(names.len());
    let mut missing: Vec<String> = Vec::new();
    for name in names {
        match by_name.get(name.as_str()) {
            Some(view) => resolved.push((*view).clone()),
            None => {
                if !missing.contains(name) {
                    missing.push(name.clone());
                }
            }
        }
    }

    if !missing.is_empty() {
        return Err(Error::LoadBalancersNotFound { names: missing });
    }
    Ok(resolved)
}

/// Whether a backend service's current membership needs an update against
/// the load balancers a server group declares: the backend count must equal
/// the number of associated views and every view's backend service must be
/// present by name.
pub fn backends_differ(actual_backends: &[String], load_balancers: &[LoadBalancerView]) -> bool {
    if actual_backends.len() != load_balancers.len() {
        return true;
    }
    load_balancers.iter().any(|lb| match lb.backend_service.as_deref() {
        Some(wanted) => !actual_backends.iter().any(|a| last_segment(a) == wanted),
        None => true,
    })
}

// --- URL map documents -------------------------------------------------

/// Remote URL map document as returned by the urlMaps API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UrlMap {
    pub name: String,
    #[serde(default)]
    pub default_service: Option<String>,
    #[serde(default)]
    pub host_rules: Vec<HostRule>,
    #[serde(default)]
    pub path_matchers: Vec<PathMatcher>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostRule {
    pub hosts: Vec<String>,
    pub path_matcher: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathMatcher {
    pub name: String,
    #[serde(default)]
    pub default_service: Option<String>,
    #[serde(default)]
    pub path_rules: Vec<PathRule>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathRule {
    pub paths: Vec<String>,
    #[serde(default)]
    pub service: Option<String>,
}

/// Desired declarative description of an HTTP(S) load balancer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpLoadBalancerSpec {
    pub default_service: String,
    #[serde(default)]
    pub certificate: Option<String>,
    #[serde(default)]
    pub host_rules: Vec<HostRuleSpec>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostRuleSpec {
    pub host_patterns: Vec<String>,
    pub path_matcher: PathMatcherSpec,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathMatcherSpec {
    pub default_service: String,
    #[serde(default)]
    pub path_rules: Vec<PathRuleSpec>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathRuleSpec {
    pub paths: Vec<String>,
    pub backend_service: String,
}

/// Whether the remote URL map differs structurally from the desired
/// description. Any mismatch in presence, cardinality, or value at any level
/// means an update is required. Backend services are compared by name; the
/// remote side carries full resource URLs.
pub fn url_map_differs(
    remote: &UrlMap,
    remote_certificate: Option<&str>,
    desired: &HttpLoadBalancerSpec,
) -> bool {
    if remote.default_service.as_deref().map(last_segment) != Some(desired.default_service.as_str())
    {
        return true;
    }
    if remote_certificate.map(last_segment) != desired.certificate.as_deref() {
        return true;
    }
    if remote.host_rules.len() != desired.host_rules.len() {
        return true;
    }

    let matchers: HashMap<&str, &PathMatcher> = remote
        .path_matchers
        .iter()
        .map(|m| (m.name.as_str(), m))
        .collect();

    // Each remote rule may satisfy at most one desired rule, so duplicate
    // host sets are compared as a multiset.
    let mut remote_rules: Vec<&HostRule> = remote.host_rules.iter().collect();
    for rule in &desired.host_rules {
        let wanted_hosts: BTreeSet<&str> = rule.host_patterns.iter().map(String::as_str).collect();
        let Some(pos) = remote_rules.iter().position(|r| {
            r.hosts.iter().map(String::as_str).collect::<BTreeSet<_>>() == wanted_hosts
        }) else {
            return true;
        };
        let remote_rule = remote_rules.swap_remove(pos);
        let Some(&matcher) = matchers.get(remote_rule.path_matcher.as_str()) else {
            return true;
        };
        if path_matcher_differs(matcher, &rule.path_matcher) {
            return true;
        }
    }
    false
}

fn path_matcher_differs(remote: &PathMatcher, desired: &PathMatcherSpec) -> bool {
    if remote.default_service.as_deref().map(last_segment)
        != Some(desired.default_service.as_str())
    {
        return true;
    }
    if remote.path_rules.len() != desired.path_rules.len() {
        return true;
    }
    for rule in &desired.path_rules {
        let wanted_paths: BTreeSet<&str> = rule.paths.iter().map(String::as_str).collect();
        let Some(remote_rule) = remote.path_rules.iter().find(|r| {
            r.paths.iter().map(String::as_str).collect::<BTreeSet<_>>() == wanted_paths
        }) else {
            return true;
        };
        if remote_rule.service.as_deref().map(last_segment) != Some(rule.backend_service.as_str())
        {
            return true;
        }
    }
    false
}

/// Short name of a GCP resource URL
/// e.g., ".../global/backendServices/my-service" -> "my-service"
fn last_segment(url: &str) -> &str {
    url.rsplit('/').next().unwrap_or(url)
}
