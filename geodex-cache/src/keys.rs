//! Cache key derivation.
//!
//! Keys are namespaced strings: `prefix:kind:part[:part…]`. The layout is
//! deterministic so any process holding the same prefix derives the same
//! key for the same entity, and prefix patterns can bulk-delete a record's
//! whole projection.

use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

/// Separator between key segments.
const SEPARATOR: char = ':';

/// Bytes of the content hash kept in hashed keys (32 hex chars).
const HASH_LEN: usize = 16;

/// Kinds of cached entities, each with its own namespace segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Dataset,
    Header,
    Samples,
}

impl EntityKind {
    /// Stable namespace segment for this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Dataset => "dataset",
            EntityKind::Header => "header",
            EntityKind::Samples => "samples",
        }
    }
}

/// Derives namespaced cache keys under a fixed prefix.
#[derive(Debug, Clone)]
pub struct KeyCodec {
    prefix: String,
}

impl KeyCodec {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Join prefix, entity kind, and parts into a key.
    ///
    /// Same inputs always yield the same key.
    pub fn make_key(&self, kind: EntityKind, parts: &[&str]) -> String {
        let mut key = String::with_capacity(
            self.prefix.len() + kind.as_str().len() + parts.iter().map(|p| p.len() + 1).sum::<usize>() + 1,
        );
        key.push_str(&self.prefix);
        key.push(SEPARATOR);
        key.push_str(kind.as_str());
        for part in parts {
            key.push(SEPARATOR);
            key.push_str(part);
        }
        key
    }

    /// Derive a key whose tail is a content hash of `payload` plus
    /// canonicalized `params`.
    ///
    /// Params are consumed through a `BTreeMap`, so insertion order is
    /// irrelevant: reordering parameters never changes the hash.
    pub fn hash_key(
        &self,
        kind: EntityKind,
        payload: &str,
        params: &BTreeMap<String, String>,
    ) -> String {
        let mut hasher = Sha256::new();
        hasher.update(payload.as_bytes());
        for (k, v) in params {
            hasher.update(b"\x1f");
            hasher.update(k.as_bytes());
            hasher.update(b"=");
            hasher.update(v.as_bytes());
        }
        let digest = hasher.finalize();
        let tail = hex::encode(&digest[..HASH_LEN]);
        self.make_key(kind, &[tail.as_str()])
    }

    /// Glob pattern matching every sub-key under a dataset's namespace.
    ///
    /// The separator sits before the wildcard so `GSE1` can never match
    /// keys belonging to `GSE10`. The bare dataset key itself is not
    /// covered; invalidation deletes it separately.
    pub fn dataset_pattern(&self, accession: &str) -> String {
        format!("{}{}*", self.make_key(EntityKind::Dataset, &[accession]), SEPARATOR)
    }

    /// The key for a dataset record projection.
    pub fn dataset_key(&self, accession: &str) -> String {
        self.make_key(EntityKind::Dataset, &[accession])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_make_key_layout() {
        let codec = KeyCodec::new("geodex");
        assert_eq!(
            codec.make_key(EntityKind::Dataset, &["GSE123456"]),
            "geodex:dataset:GSE123456"
        );
        assert_eq!(
            codec.make_key(EntityKind::Samples, &["GSE1", "page2"]),
            "geodex:samples:GSE1:page2"
        );
    }

    #[test]
    fn test_make_key_deterministic() {
        let codec = KeyCodec::new("geodex");
        let a = codec.make_key(EntityKind::Header, &["GSE9"]);
        let b = codec.make_key(EntityKind::Header, &["GSE9"]);
        assert_eq!(a, b);
    }

    #[test]
    fn test_hash_key_fixed_length_and_order_insensitive() {
        let codec = KeyCodec::new("geodex");

        let mut params_a = BTreeMap::new();
        params_a.insert("organism".to_string(), "human".to_string());
        params_a.insert("platform".to_string(), "GPL570".to_string());

        // Same pairs inserted in the opposite order.
        let mut params_b = BTreeMap::new();
        params_b.insert("platform".to_string(), "GPL570".to_string());
        params_b.insert("organism".to_string(), "human".to_string());

        let a = codec.hash_key(EntityKind::Samples, "GSE1", &params_a);
        let b = codec.hash_key(EntityKind::Samples, "GSE1", &params_b);
        assert_eq!(a, b);

        let tail = a.rsplit(':').next().expect("hash tail");
        assert_eq!(tail.len(), HASH_LEN * 2);
    }

    #[test]
    fn test_hash_key_distinguishes_params() {
        let codec = KeyCodec::new("geodex");
        let mut params = BTreeMap::new();
        params.insert("organism".to_string(), "human".to_string());
        let a = codec.hash_key(EntityKind::Samples, "GSE1", &params);
        params.insert("organism".to_string(), "mouse".to_string());
        let b = codec.hash_key(EntityKind::Samples, "GSE1", &params);
        assert_ne!(a, b);
    }

    #[test]
    fn test_dataset_pattern_scopes_to_sub_keys() {
        let codec = KeyCodec::new("geodex");
        let pattern = codec.dataset_pattern("GSE55");
        assert_eq!(pattern, "geodex:dataset:GSE55:*");
        // A sibling accession sharing the prefix is outside the namespace.
        assert!(!codec.dataset_key("GSE551").starts_with(pattern.trim_end_matches('*')));
    }
}

#[cfg(test)]
mod prop_tests {
    use super::*;
    use proptest::prelude::*;

    fn params_strategy() -> impl Strategy<Value = Vec<(String, String)>> {
        proptest::collection::vec(("[a-z]{1,8}", "[a-zA-Z0-9]{0,12}"), 0..6)
    }

    proptest! {
        /// Hashing is invariant under parameter insertion order.
        #[test]
        fn prop_hash_key_order_insensitive(payload in "[A-Z0-9]{1,12}", pairs in params_strategy()) {
            let codec = KeyCodec::new("geodex");

            let forward: BTreeMap<_, _> = pairs.iter().cloned().collect();
            let reversed: BTreeMap<_, _> = pairs.iter().rev().cloned().collect();

            prop_assert_eq!(
                codec.hash_key(EntityKind::Dataset, &payload, &forward),
                codec.hash_key(EntityKind::Dataset, &payload, &reversed)
            );
        }

        /// Hashed keys always share the fixed layout and hash length.
        #[test]
        fn prop_hash_key_fixed_shape(payload in "[A-Z0-9]{1,12}", pairs in params_strategy()) {
            let codec = KeyCodec::new("geodex");
            let params: BTreeMap<_, _> = pairs.into_iter().collect();
            let key = codec.hash_key(EntityKind::Dataset, &payload, &params);

            prop_assert!(key.starts_with("geodex:dataset:"));
            let tail = key.rsplit(':').next().expect("hash tail");
            prop_assert_eq!(tail.len(), 32);
        }

        /// Different payloads never collide on the full key.
        #[test]
        fn prop_distinct_payloads_distinct_keys(a in "[A-Z0-9]{1,12}", b in "[A-Z0-9]{1,12}") {
            prop_assume!(a != b);
            let codec = KeyCodec::new("geodex");
            let params = BTreeMap::new();
            prop_assert_ne!(
                codec.hash_key(EntityKind::Dataset, &a, &params),
                codec.hash_key(EntityKind::Dataset, &b, &params)
            );
        }
    }
}
