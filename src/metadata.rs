//! Metadata codec
//!
//! Compute Engine represents instance metadata as a list of key/value items;
//! callers want a plain map. Both directions round-trip exactly, including
//! the empty case.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One entry of the provider's metadata list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataItem {
    pub key: String,
    pub value: String,
}

/// Convert a map into the provider's list-of-pairs form, one item per key,
/// in sorted key order so the output is stable.
pub fn to_items(map: &HashMap<String, String>) -> Vec<MetadataItem> {
    let mut items: Vec<MetadataItem> = map
        .iter()
        .map(|(key, value)| MetadataItem {
            key: key.clone(),
            value: value.clone(),
        })
        .collect();
    items.sort_by(|a, b| a.key.cmp(&b.key));
    items
}

/// Convert the provider's list-of-pairs form back into a map. Duplicate keys
/// (malformed upstream data) resolve last-write-wins.
pub fn from_items(items: &[MetadataItem]) -> HashMap<String, String> {
    items
        .iter()
        .map(|item| (item.key.clone(), item.value.clone()))
        .collect()
}
