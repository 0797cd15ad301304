//! Cache key codec
//!
//! Composite resource identifiers are flattened into string keys of the form
//! `gce:{namespace}:{field}:{field}...` with a fixed field order per
//! namespace. Field values are percent-encoded so the `:` separator can never
//! appear unescaped inside a value, which makes encoding injective and
//! decoding exact.

use crate::error::{Error, Result};
use std::fmt;

/// Provider prefix shared by every key in the cache.
pub const PROVIDER: &str = "gce";

/// Separator between the provider prefix, namespace, and field values.
pub const SEPARATOR: char = ':';

/// Glob metacharacters recognized by the key enumeration index.
const GLOB_METACHARS: &[char] = &['*', '?', '[', '\\'];

/// Logical partitions of the cache. Each namespace has its own key schema
/// with a fixed field order; relating a record to a namespace outside this
/// set is a compile-time error rather than a runtime surprise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Namespace {
    /// Keyed by account, region, image id.
    Image,
    /// Keyed by account, logical name.
    NamedImage,
    /// Keyed by account, region, instance name.
    Instance,
    /// Keyed by account, region, load balancer name.
    LoadBalancer,
}

impl Namespace {
    pub fn as_str(&self) -> &'static str {
        match self {
            Namespace::Image => "image",
            Namespace::NamedImage => "namedImage",
            Namespace::Instance => "instance",
            Namespace::LoadBalancer => "loadBalancer",
        }
    }

    fn from_str(s: &str) -> Option<Self> {
        match s {
            "image" => Some(Namespace::Image),
            "namedImage" => Some(Namespace::NamedImage),
            "instance" => Some(Namespace::Instance),
            "loadBalancer" => Some(Namespace::LoadBalancer),
            _ => None,
        }
    }

    /// Field names in encoding order.
    pub fn field_names(&self) -> &'static [&'static str] {
        match self {
            Namespace::Image => &["account", "region", "imageId"],
            Namespace::NamedImage => &["account", "name"],
            Namespace::Instance => &["account", "region", "name"],
            Namespace::LoadBalancer => &["account", "region", "name"],
        }
    }

    fn arity(&self) -> usize {
        self.field_names().len()
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A decoded composite key. Immutable value type; field values are stored in
/// the namespace's documented order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey {
    namespace: Namespace,
    fields: Vec<String>,
}

impl CacheKey {
    fn new(namespace: Namespace, fields: Vec<String>) -> Self {
        debug_assert_eq!(fields.len(), namespace.arity());
        Self { namespace, fields }
    }

    pub fn image(account: &str, region: &str, image_id: &str) -> Self {
        Self::new(
            Namespace::Image,
            vec![account.to_string(), region.to_string(), image_id.to_string()],
        )
    }

    pub fn named_image(account: &str, name: &str) -> Self {
        Self::new(
            Namespace::NamedImage,
            vec![account.to_string(), name.to_string()],
        )
    }

    pub fn instance(account: &str, region: &str, name: &str) -> Self {
        Self::new(
            Namespace::Instance,
            vec![account.to_string(), region.to_string(), name.to_string()],
        )
    }

    pub fn load_balancer(account: &str, region: &str, name: &str) -> Self {
        Self::new(
            Namespace::LoadBalancer,
            vec![account.to_string(), region.to_string(), name.to_string()],
        )
    }

    pub fn namespace(&self) -> Namespace {
        self.namespace
    }

    /// Look up a field value by its schema name.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.namespace
            .field_names()
            .iter()
            .position(|n| *n == name)
            .map(|i| self.fields[i].as_str())
    }

    /// Every key schema starts with the owning account.
    pub fn account(&self) -> &str {
        &self.fields[0]
    }

    /// Encode into the flat string form stored in the cache.
    pub fn encode(&self) -> String {
        let mut out = String::new();
        out.push_str(PROVIDER);
        out.push(SEPARATOR);
        out.push_str(self.namespace.as_str());
        for field in &self.fields {
            out.push(SEPARATOR);
            out.push_str(&urlencoding::encode(field));
        }
        out
    }

    /// Decode a flat key back into its namespace and field values.
    ///
    /// Fails with [`Error::MalformedKey`] when the provider prefix or
    /// namespace is unrecognized, or the field count does not match the
    /// namespace's arity.
    pub fn decode(key: &str) -> Result<Self> {
        let mut parts = key.split(SEPARATOR);

        if parts.next() != Some(PROVIDER) {
            return Err(Error::MalformedKey(format!(
                "unrecognized provider prefix in '{key}'"
            )));
        }
        let namespace = parts
            .next()
            .and_then(Namespace::from_str)
            .ok_or_else(|| Error::MalformedKey(format!("unrecognized namespace in '{key}'")))?;

        let fields = parts
            .map(|raw| {
                urlencoding::decode(raw)
                    .map(|cow| cow.into_owned())
                    .map_err(|_| Error::MalformedKey(format!("invalid field encoding in '{key}'")))
            })
            .collect::<Result<Vec<_>>>()?;

        if fields.len() != namespace.arity() {
            return Err(Error::MalformedKey(format!(
                "expected {} fields for namespace {}, got {} in '{key}'",
                namespace.arity(),
                namespace,
                fields.len()
            )));
        }

        Ok(Self { namespace, fields })
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

/// Wrap free text into a glob pattern. Text already containing glob
/// metacharacters is used verbatim.
pub fn wrap_glob(term: &str) -> String {
    if term.contains(GLOB_METACHARS) {
        term.to_string()
    } else {
        format!("*{term}*")
    }
}

/// Build the key enumeration pattern for a namespace, one glob segment per
/// schema field.
pub fn search_pattern(namespace: Namespace, segments: &[&str]) -> String {
    debug_assert_eq!(segments.len(), namespace.arity());
    let mut out = String::new();
    out.push_str(PROVIDER);
    out.push(SEPARATOR);
    out.push_str(namespace.as_str());
    for segment in segments {
        out.push(SEPARATOR);
        out.push_str(segment);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_key_round_trips() {
        let key = CacheKey::image("my-account", "us-central1", "my-image-1234");
        let decoded = CacheKey::decode(&key.encode()).unwrap();
        assert_eq!(decoded, key);
        assert_eq!(decoded.field("region"), Some("us-central1"));
        assert_eq!(decoded.field("imageId"), Some("my-image-1234"));
    }

    #[test]
    fn separator_in_field_value_round_trips() {
        let key = CacheKey::named_image("account", "name:with:colons");
        let encoded = key.encode();
        let decoded = CacheKey::decode(&encoded).unwrap();
        assert_eq!(decoded.field("name"), Some("name:with:colons"));
    }

    #[test]
    fn distinct_field_tuples_never_collide() {
        // Without escaping, ("a:b", "c") and ("a", "b:c") would encode the same.
        let left = CacheKey::named_image("a:b", "c");
        let right = CacheKey::named_image("a", "b:c");
        assert_ne!(left.encode(), right.encode());
    }

    #[test]
    fn decode_rejects_unknown_prefix() {
        let err = CacheKey::decode("aws:image:account:region:id").unwrap_err();
        assert!(matches!(err, Error::MalformedKey(_)));
    }

    #[test]
    fn decode_rejects_unknown_namespace() {
        let err = CacheKey::decode("gce:cluster:account:name").unwrap_err();
        assert!(matches!(err, Error::MalformedKey(_)));
    }

    #[test]
    fn decode_rejects_wrong_arity() {
        let err = CacheKey::decode("gce:image:account:region").unwrap_err();
        assert!(matches!(err, Error::MalformedKey(_)));
    }

    #[test]
    fn wrap_glob_wraps_plain_terms() {
        assert_eq!(wrap_glob("derp"), "*derp*");
    }

    #[test]
    fn wrap_glob_keeps_patterns_verbatim() {
        assert_eq!(wrap_glob("derp*"), "derp*");
        assert_eq!(wrap_glob("d?rp"), "d?rp");
        assert_eq!(wrap_glob("[dx]erp"), "[dx]erp");
    }

    #[test]
    fn search_pattern_joins_segments() {
        let pattern = search_pattern(Namespace::NamedImage, &["*", "*derp*"]);
        assert_eq!(pattern, "gce:namedImage:*:*derp*");
    }
}
