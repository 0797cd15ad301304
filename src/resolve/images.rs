//! Source image search across candidate projects
//!
//! A named image may live in the deployment project itself, in a project
//! pinned by the account configuration, or in one of the shared base-image
//! projects. All candidate projects are listed in one concurrent batch; the
//! winner is the first exact name match in candidate order, regardless of
//! which response arrived first.

use crate::error::{Error, Result};
use crate::gcp::{ComputeClient, Image};
use futures::future::join_all;

/// What to look for, plus the project pinned by the image's associated
/// account configuration, if any.
#[derive(Debug, Clone)]
pub struct ImageQuery {
    pub name: String,
    pub pinned_project: Option<String>,
}

impl ImageQuery {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            pinned_project: None,
        }
    }

    pub fn with_pinned_project(mut self, project: &str) -> Self {
        self.pinned_project = Some(project.to_string());
        self
    }
}

/// Search an ordered list of candidate projects for an image whose name
/// exactly equals `query.name`. Fails with [`Error::ImageNotFound`] when no
/// candidate project contains it.
pub async fn find_image(
    client: &ComputeClient,
    primary_project: &str,
    query: &ImageQuery,
    fallback_projects: &[String],
) -> Result<Image> {
    let candidates = candidate_projects(primary_project, query, fallback_projects);
    tracing::debug!(
        "searching for image {} across projects [{}]",
        query.name,
        candidates.join(", ")
    );

    // Scatter: every list call goes out at once. Gather: join_all yields
    // results in input order, so inspection below follows candidate order
    // rather than network timing.
    let listings = join_all(candidates.iter().map(|p| client.list_images(p))).await;

    for (project, listing) in candidates.iter().zip(listings) {
        let images = listing?;
        if let Some(image) = images.into_iter().find(|image| image.name == query.name) {
            tracing::debug!("image {} found in project {}", query.name, project);
            return Ok(image);
        }
    }

    Err(Error::ImageNotFound {
        image: query.name.clone(),
        projects: candidates,
    })
}

/// Effective search order: primary project, then the pinned project, then
/// the fallbacks, duplicates removed preserving first occurrence.
fn candidate_projects(
    primary: &str,
    query: &ImageQuery,
    fallback_projects: &[String],
) -> Vec<String> {
    let mut candidates: Vec<String> = Vec::new();
    let ordered = std::iter::once(primary)
        .chain(query.pinned_project.as_deref())
        .chain(fallback_projects.iter().map(String::as_str));
    for project in ordered {
        if !candidates.iter().any(|c| c == project) {
            candidates.push(project.to_string());
        }
    }
    candidates
}
