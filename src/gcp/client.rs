//! Compute Engine client
//!
//! Typed list calls over the REST API. The endpoint is configurable so tests
//! can point the client at a local mock server.

use super::auth::Credentials;
use super::http::GcpHttpClient;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use url::Url;

/// Production Compute Engine endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://compute.googleapis.com/compute/v1/";

/// A compute image as returned by the images list API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Image {
    pub name: String,
    #[serde(default)]
    pub self_link: Option<String>,
    #[serde(default)]
    pub family: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImageList {
    #[serde(default)]
    items: Vec<Image>,
    #[serde(default)]
    next_page_token: Option<String>,
}

/// A compute instance as returned by the aggregated instances list API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Instance {
    pub name: String,
    pub self_link: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub zone: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct InstancesScopedList {
    #[serde(default)]
    instances: Vec<Instance>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AggregatedInstanceList {
    #[serde(default)]
    items: BTreeMap<String, InstancesScopedList>,
    #[serde(default)]
    next_page_token: Option<String>,
}

/// Compute Engine API client
#[derive(Clone)]
pub struct ComputeClient {
    credentials: Credentials,
    http: GcpHttpClient,
    endpoint: String,
}

impl ComputeClient {
    /// Create a client against the production endpoint using Application
    /// Default Credentials.
    pub async fn new() -> Result<Self> {
        let credentials = Credentials::adc()
            .await
            .context("Failed to initialize GCP credentials")?;
        Self::with_endpoint(DEFAULT_ENDPOINT, credentials)
    }

    /// Create a client against an explicit endpoint, e.g. a mock server.
    pub fn with_endpoint(endpoint: &str, credentials: Credentials) -> Result<Self> {
        let parsed: Url = endpoint.parse().context("Invalid compute endpoint URL")?;
        let mut endpoint = parsed.to_string();
        if !endpoint.ends_with('/') {
            endpoint.push('/');
        }

        Ok(Self {
            credentials,
            http: GcpHttpClient::new()?,
            endpoint,
        })
    }

    /// Build a Compute Engine API URL under a project.
    fn compute_url(&self, project: &str, path: &str) -> String {
        format!("{}projects/{}/{}", self.endpoint, project, path)
    }

    fn with_page_token(url: &str, token: Option<&str>) -> String {
        match token {
            Some(token) => format!("{}?pageToken={}", url, urlencoding::encode(token)),
            None => url.to_string(),
        }
    }

    /// List all images of a project (auto-paginate).
    pub async fn list_images(&self, project: &str) -> Result<Vec<Image>> {
        let base = self.compute_url(project, "global/images");
        let token = self.credentials.get_token().await?;

        let mut images = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let url = Self::with_page_token(&base, page_token.as_deref());
            let response = self.http.get(&url, &token).await?;
            let page: ImageList = serde_json::from_value(response)
                .context("Failed to parse image list response")?;

            images.extend(page.items);
            if page.next_page_token.is_none() {
                break;
            }
            page_token = page.next_page_token;
        }

        tracing::debug!("project {} has {} images", project, images.len());
        Ok(images)
    }

    /// List instances of a project across all zones, keyed by zone scope
    /// (e.g. `zones/us-central1-b`), auto-paginating and merging pages.
    pub async fn aggregated_list_instances(
        &self,
        project: &str,
    ) -> Result<BTreeMap<String, Vec<Instance>>> {
        let base = self.compute_url(project, "aggregated/instances");
        let token = self.credentials.get_token().await?;

        let mut by_zone: BTreeMap<String, Vec<Instance>> = BTreeMap::new();
        let mut page_token: Option<String> = None;

        loop {
            let url = Self::with_page_token(&base, page_token.as_deref());
            let response = self.http.get(&url, &token).await?;
            let page: AggregatedInstanceList = serde_json::from_value(response)
                .context("Failed to parse aggregated instance list response")?;

            for (scope, scoped) in page.items {
                // Zones without instances still appear, carrying only a warning.
                if !scoped.instances.is_empty() {
                    by_zone.entry(scope).or_default().extend(scoped.instances);
                }
            }
            if page.next_page_token.is_none() {
                break;
            }
            page_token = page.next_page_token;
        }

        Ok(by_zone)
    }
}
