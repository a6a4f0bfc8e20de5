//! Cache envelope carried around every fast-tier value.
//!
//! Serialized records are wrapped with lifecycle metadata so a reader can
//! tell how a value got into the cache and how old it is. This envelope is
//! the single serialization path for cached values.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::record::DatasetRecord;

/// How a value entered the fast tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheSource {
    /// Written alongside a durable update.
    WriteThrough,
    /// Copied up from the durable tier after a read miss.
    Promotion,
}

/// A record plus cache-lifecycle metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedRecord {
    pub record: DatasetRecord,
    pub cached_at: DateTime<Utc>,
    pub cache_source: CacheSource,
    pub ttl_secs: u64,
}

impl CachedRecord {
    pub fn new(record: DatasetRecord, cache_source: CacheSource, ttl: Duration) -> Self {
        Self {
            record,
            cached_at: Utc::now(),
            cache_source,
            ttl_secs: ttl.as_secs(),
        }
    }

    /// How long ago this value was cached, as of `now`.
    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        now.signed_duration_since(self.cached_at)
            .to_std()
            .unwrap_or(Duration::ZERO)
    }

    /// Whether the envelope has outlived its TTL, as of `now`.
    ///
    /// The fast tier expires entries on its own; this check exists for
    /// fallback entries, which carry no tier-side TTL.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.age(now) > Duration::from_secs(self.ttl_secs)
    }

    pub fn into_record(self) -> DatasetRecord {
        self.record
    }
}
