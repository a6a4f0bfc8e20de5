//! Cache and retry configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the tiered cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Namespace prefix for every fast-tier key.
    pub key_prefix: String,
    /// TTL applied to every fast-tier entry.
    pub entry_ttl: Duration,
    /// Per-operation timeout for fast-tier round trips.
    pub fast_tier_timeout: Duration,
    /// Whether the in-process fallback tier is consulted when the fast tier
    /// fails.
    pub fallback_enabled: bool,
    /// Maximum entries held by the in-process fallback tier.
    pub fallback_capacity: usize,
    /// Timeout for each external discovery call.
    pub discovery_timeout: Duration,
    /// Upper bound on samples requested from the discovery provider.
    pub max_sample_results: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            key_prefix: "geodex".to_string(),
            entry_ttl: Duration::from_secs(3600),
            fast_tier_timeout: Duration::from_secs(2),
            fallback_enabled: true,
            fallback_capacity: 512,
            discovery_timeout: Duration::from_secs(30),
            max_sample_results: 500,
        }
    }
}

impl CacheConfig {
    /// Create a new cache config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the key namespace prefix.
    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = prefix.into();
        self
    }

    /// Set the fast-tier entry TTL.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.entry_ttl = ttl;
        self
    }

    /// Set the fast-tier per-operation timeout.
    pub fn with_fast_tier_timeout(mut self, timeout: Duration) -> Self {
        self.fast_tier_timeout = timeout;
        self
    }

    /// Enable or disable the in-process fallback tier.
    pub fn with_fallback(mut self, enabled: bool) -> Self {
        self.fallback_enabled = enabled;
        self
    }

    /// Set the fallback tier capacity.
    pub fn with_fallback_capacity(mut self, capacity: usize) -> Self {
        self.fallback_capacity = capacity;
        self
    }

    /// Set the discovery call timeout.
    pub fn with_discovery_timeout(mut self, timeout: Duration) -> Self {
        self.discovery_timeout = timeout;
        self
    }

    /// Set the maximum sample results per discovery call.
    pub fn with_max_sample_results(mut self, max: usize) -> Self {
        self.max_sample_results = max;
        self
    }
}

/// Exponential backoff policy for re-enrichment of incomplete records.
///
/// The schedule maps the current retry count to the minimum wait since the
/// last attempt. Once `retry_count` reaches `max_retries` the record stays
/// incomplete until manually invalidated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Retry ceiling. Checked before the schedule is consulted.
    pub max_retries: u32,
    /// Backoff schedule in minutes, indexed by retry count.
    pub backoff_minutes: Vec<i64>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff_minutes: vec![5, 30, 120],
        }
    }
}

impl RetryPolicy {
    /// Backoff for a given retry count, in minutes.
    ///
    /// Only meaningful for `retry_count < max_retries`; the ceiling check
    /// runs first so the schedule is never indexed past its end.
    pub fn backoff_for(&self, retry_count: u32) -> chrono::Duration {
        let minutes = self
            .backoff_minutes
            .get(retry_count as usize)
            .copied()
            .unwrap_or_else(|| self.backoff_minutes.last().copied().unwrap_or(0));
        chrono::Duration::minutes(minutes)
    }
}
