//! Named image lookup
//!
//! A named image is an aggregate view: the cache stores one record per
//! logical name per account in the `namedImage` namespace and one record per
//! concrete image per region in the `image` namespace, linked by
//! relationships. Searching joins both namespaces and reconstructs one view
//! per logical name, merging accounts and per-region image ids.

use crate::cache::{key, CacheKey, CacheRecord, CacheStore, Namespace};
use crate::error::{Error, Result};
use std::collections::{BTreeMap, BTreeSet};

/// Minimum query term length for [`search`].
const MIN_QUERY_LEN: usize = 2;

/// Sort rank for a view whose name does not contain the query term at all.
/// Such views sort after every view that does contain it.
const NO_MATCH_RANK: usize = usize::MAX;

/// Aggregate view over one logical image name, joined from the `namedImage`
/// and `image` namespaces. Every region key present has a non-empty id set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedImageView {
    pub name: String,
    pub accounts: BTreeSet<String>,
    pub images_by_region: BTreeMap<String, BTreeSet<String>>,
}

impl NamedImageView {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            accounts: BTreeSet::new(),
            images_by_region: BTreeMap::new(),
        }
    }

    fn add_image(&mut self, region: &str, image_id: &str) {
        self.images_by_region
            .entry(region.to_string())
            .or_default()
            .insert(image_id.to_string());
    }
}

/// Exact-key record lookup, requiring at least one relationship into
/// `required`. Absence and presence-without-relationships are both reported
/// as not found; callers cannot tell them apart.
pub fn get_by_exact_id(
    cache: &dyn CacheStore,
    key: &CacheKey,
    required: Namespace,
) -> Result<CacheRecord> {
    cache
        .get(key.namespace(), key)
        .filter(|record| !record.relations.related(required).is_empty())
        .ok_or_else(|| Error::NotFound(format!("{} not found.", key.encode())))
}

/// Search named images by free-text term, optionally scoped to an account
/// and/or region. Results are ranked by how early the term appears in the
/// logical name, ties broken lexically; without a term the order is purely
/// lexical.
pub fn search(
    cache: &dyn CacheStore,
    query_term: Option<&str>,
    account: Option<&str>,
    region: Option<&str>,
) -> Result<Vec<NamedImageView>> {
    if let Some(term) = query_term {
        if term.len() < MIN_QUERY_LEN {
            return Err(Error::InvalidQuery(format!(
                "at least {MIN_QUERY_LEN} characters are required to search named images"
            )));
        }
    }

    let name_glob = query_term.map(key::wrap_glob).unwrap_or_else(|| "*".to_string());
    let account_glob = account.unwrap_or("*");
    let region_glob = region.unwrap_or("*");

    let named_pattern = key::search_pattern(Namespace::NamedImage, &[account_glob, &name_glob]);
    let image_pattern =
        key::search_pattern(Namespace::Image, &[account_glob, region_glob, &name_glob]);

    let named_ids = cache.filter_identifiers(Namespace::NamedImage, &named_pattern);
    let image_ids = cache.filter_identifiers(Namespace::Image, &image_pattern);
    tracing::debug!(
        "named image search matched {} named and {} image keys",
        named_ids.len(),
        image_ids.len()
    );

    if named_ids.is_empty() && image_ids.is_empty() {
        return Err(Error::NotFound(format!(
            "No named images found matching '{name_glob}'."
        )));
    }

    let named_keys = decode_all(&named_ids)?;
    let image_keys = decode_all(&image_ids)?;
    let named_records = cache.get_all(Namespace::NamedImage, &named_keys);
    let image_records = cache.get_all(Namespace::Image, &image_keys);

    let mut views: BTreeMap<String, NamedImageView> = BTreeMap::new();

    // A named-image record contributes its own account plus every related
    // image's id under that image's region.
    for record in &named_records {
        let Some(name) = record.key.field("name") else {
            continue;
        };
        let view = views
            .entry(name.to_string())
            .or_insert_with(|| NamedImageView::new(name));
        view.accounts.insert(record.key.account().to_string());
        for image_key in record.relations.related(Namespace::Image) {
            if let (Some(region), Some(id)) =
                (image_key.field("region"), image_key.field("imageId"))
            {
                view.add_image(region, id);
            }
        }
    }

    // An image record belongs to the view of its first related named image;
    // by construction every image has exactly one owning named image.
    for record in &image_records {
        let Some(owner) = record.relations.related(Namespace::NamedImage).first() else {
            continue;
        };
        let Some(name) = owner.field("name") else {
            continue;
        };
        let view = views
            .entry(name.to_string())
            .or_insert_with(|| NamedImageView::new(name));
        view.accounts.insert(record.key.account().to_string());
        if let (Some(region), Some(id)) = (record.key.field("region"), record.key.field("imageId"))
        {
            view.add_image(region, id);
        }
    }

    // Lexical by construction of the BTreeMap.
    let mut results: Vec<NamedImageView> = views
        .into_values()
        .filter(|view| match region {
            Some(region) => view.images_by_region.contains_key(region),
            None => true,
        })
        .collect();

    if results.is_empty() {
        return Err(Error::NotFound(format!(
            "No named images found matching '{name_glob}'."
        )));
    }

    if let Some(term) = query_term {
        results.sort_by(|a, b| {
            let rank_a = a.name.find(term).unwrap_or(NO_MATCH_RANK);
            let rank_b = b.name.find(term).unwrap_or(NO_MATCH_RANK);
            rank_a.cmp(&rank_b).then_with(|| a.name.cmp(&b.name))
        });
    }

    Ok(results)
}

fn decode_all(ids: &[String]) -> Result<Vec<CacheKey>> {
    ids.iter().map(|id| CacheKey::decode(id)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCache;

    /// One named image linked to one concrete image, both directions.
    fn link(cache: &mut MemoryCache, account: &str, name: &str, region: &str, image_id: &str) {
        let named_key = CacheKey::named_image(account, name);
        let image_key = CacheKey::image(account, region, image_id);
        cache.put(CacheRecord::new(named_key.clone()).with_relation(image_key.clone()));
        cache.put(CacheRecord::new(image_key).with_relation(named_key));
    }

    fn sample_cache() -> MemoryCache {
        let mut cache = MemoryCache::new();
        link(&mut cache, "prod", "derpful", "us-central1", "derpful-1234");
        link(&mut cache, "prod", "xderpx", "us-central1", "xderpx-1234");
        link(&mut cache, "prod", "unrelated", "europe-west1", "unrelated-1");
        cache
    }

    #[test]
    fn short_query_term_is_rejected() {
        let cache = sample_cache();
        let err = search(&cache, Some("d"), None, None).unwrap_err();
        assert!(matches!(err, Error::InvalidQuery(_)));

        // Rejected even when the cache is empty.
        let empty = MemoryCache::new();
        let err = search(&empty, Some("d"), None, None).unwrap_err();
        assert!(matches!(err, Error::InvalidQuery(_)));
    }

    #[test]
    fn search_ranks_by_substring_position() {
        let cache = sample_cache();
        let results = search(&cache, Some("derp"), None, None).unwrap();
        let names: Vec<&str> = results.iter().map(|v| v.name.as_str()).collect();
        // "derpful" matches at index 0, "xderpx" at index 1; "unrelated" is
        // excluded entirely.
        assert_eq!(names, vec!["derpful", "xderpx"]);
    }

    #[test]
    fn search_without_term_sorts_lexically() {
        let cache = sample_cache();
        let results = search(&cache, None, None, None).unwrap();
        let names: Vec<&str> = results.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(names, vec!["derpful", "unrelated", "xderpx"]);
    }

    #[test]
    fn search_merges_accounts_and_regions_across_namespaces() {
        let mut cache = MemoryCache::new();
        link(&mut cache, "prod", "derpful", "us-central1", "derpful-1234");
        // Same logical name indexed under a second account in another region.
        link(&mut cache, "dev", "derpful", "europe-west1", "derpful-1234");

        let results = search(&cache, Some("derp"), None, None).unwrap();
        assert_eq!(results.len(), 1);
        let view = &results[0];
        assert_eq!(
            view.accounts,
            BTreeSet::from(["prod".to_string(), "dev".to_string()])
        );
        assert!(view.images_by_region.contains_key("us-central1"));
        assert!(view.images_by_region.contains_key("europe-west1"));
    }

    #[test]
    fn region_filter_drops_views_without_that_region() {
        let cache = sample_cache();
        let results = search(&cache, None, None, Some("europe-west1")).unwrap();
        let names: Vec<&str> = results.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(names, vec!["unrelated"]);
    }

    #[test]
    fn no_candidates_is_not_found() {
        let cache = sample_cache();
        let err = search(&cache, Some("nosuchimage"), None, None).unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn region_filter_eliminating_everything_is_not_found() {
        let cache = sample_cache();
        let err = search(&cache, Some("derp"), None, Some("asia-east1")).unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn glob_terms_are_used_verbatim() {
        let cache = sample_cache();
        // "derp*" anchors at the start of the name field, so only "derpful"
        // matches.
        let results = search(&cache, Some("derp*"), None, None).unwrap();
        let names: Vec<&str> = results.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(names, vec!["derpful"]);
    }

    #[test]
    fn account_filter_scopes_both_namespaces() {
        let mut cache = MemoryCache::new();
        link(&mut cache, "prod", "derpful", "us-central1", "derpful-1234");
        link(&mut cache, "dev", "derpless", "us-central1", "derpless-1");

        let results = search(&cache, Some("derp"), Some("dev"), None).unwrap();
        let names: Vec<&str> = results.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(names, vec!["derpless"]);
    }

    #[test]
    fn get_by_exact_id_requires_relationships() {
        let mut cache = MemoryCache::new();
        let named_key = CacheKey::named_image("prod", "orphan");
        cache.put(CacheRecord::new(named_key.clone()));

        // Present but with zero image relationships: reported as not found.
        let err = get_by_exact_id(&cache, &named_key, Namespace::Image).unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));

        // Entirely absent: same story.
        let missing = CacheKey::named_image("prod", "ghost");
        let err = get_by_exact_id(&cache, &missing, Namespace::Image).unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn get_by_exact_id_returns_linked_record() {
        let mut cache = MemoryCache::new();
        link(&mut cache, "prod", "derpful", "us-central1", "derpful-1234");

        let record = get_by_exact_id(
            &cache,
            &CacheKey::named_image("prod", "derpful"),
            Namespace::Image,
        )
        .unwrap();
        assert_eq!(record.relations.related(Namespace::Image).len(), 1);
    }
}
