//! Fast tier: volatile key-value store with TTL.
//!
//! Two layers: [`FastTierBackend`] is the fallible transport contract a
//! concrete store (Redis, memcached, in-process) implements, and
//! [`FastTierClient`] is what the cache talks to. The client guards every
//! round trip with a timeout and converts ANY transport failure into a
//! sentinel return plus an error-counter increment - callers never see a
//! fast-tier error, they just fall through to the next tier.

use async_trait::async_trait;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::warn;

use geodex_core::GeodexResult;

use crate::stats::StatsCollector;

/// Transport contract for fast-tier stores.
///
/// Implementations are fallible; failure handling lives in
/// [`FastTierClient`]. Values are serialized envelopes - the tier stores
/// opaque strings.
#[async_trait]
pub trait FastTierBackend: Send + Sync {
    /// Get a value.
    async fn get(&self, key: &str) -> GeodexResult<Option<String>>;

    /// Set a value with a TTL.
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> GeodexResult<()>;

    /// Get many values in a single round trip. The result has the same
    /// length and order as `keys`.
    async fn batch_get(&self, keys: &[String]) -> GeodexResult<Vec<Option<String>>>;

    /// Set many values in a single round trip, all with the same TTL.
    async fn batch_set(&self, entries: &[(String, String)], ttl: Duration) -> GeodexResult<()>;

    /// Delete every key matching a glob pattern. Returns the deleted count.
    async fn delete_pattern(&self, pattern: &str) -> GeodexResult<u64>;

    /// Liveness probe.
    async fn ping(&self) -> GeodexResult<()>;
}

// ============================================================================
// IN-MEMORY BACKEND
// ============================================================================

/// In-process fast-tier backend with TTL expiry on read.
///
/// Never fails. Useful as a default for single-process deployments and as
/// the backend under test.
#[derive(Debug, Default)]
pub struct InMemoryFastTier {
    entries: RwLock<HashMap<String, (String, Instant)>>,
}

impl InMemoryFastTier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live (non-expired) entries.
    pub async fn len(&self) -> usize {
        let now = Instant::now();
        self.entries
            .read()
            .await
            .values()
            .filter(|(_, deadline)| *deadline > now)
            .count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

/// Match `candidate` against a glob `pattern` where `*` matches any run of
/// characters. Matching is greedy segment-wise, enough for the key-namespace
/// patterns the cache produces.
fn glob_match(pattern: &str, candidate: &str) -> bool {
    let segments: Vec<&str> = pattern.split('*').collect();
    if segments.len() == 1 {
        return pattern == candidate;
    }

    let mut rest = candidate;
    for (i, segment) in segments.iter().enumerate() {
        if segment.is_empty() {
            continue;
        }
        if i == 0 {
            match rest.strip_prefix(segment) {
                Some(tail) => rest = tail,
                None => return false,
            }
        } else if i == segments.len() - 1 {
            return rest.ends_with(segment);
        } else {
            match rest.find(segment) {
                Some(pos) => rest = &rest[pos + segment.len()..],
                None => return false,
            }
        }
    }
    // Pattern ended with '*' (or consumed everything).
    segments.last().map(|s| s.is_empty()).unwrap_or(false) || rest.is_empty()
}

#[async_trait]
impl FastTierBackend for InMemoryFastTier {
    async fn get(&self, key: &str) -> GeodexResult<Option<String>> {
        let now = Instant::now();
        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                Some((value, deadline)) if *deadline > now => return Ok(Some(value.clone())),
                Some(_) => {}
                None => return Ok(None),
            }
        }
        // Expired: drop it under the write lock.
        self.entries.write().await.remove(key);
        Ok(None)
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> GeodexResult<()> {
        let deadline = Instant::now() + ttl;
        self.entries
            .write()
            .await
            .insert(key.to_string(), (value.to_string(), deadline));
        Ok(())
    }

    async fn batch_get(&self, keys: &[String]) -> GeodexResult<Vec<Option<String>>> {
        let now = Instant::now();
        let entries = self.entries.read().await;
        Ok(keys
            .iter()
            .map(|key| match entries.get(key) {
                Some((value, deadline)) if *deadline > now => Some(value.clone()),
                _ => None,
            })
            .collect())
    }

    async fn batch_set(&self, pairs: &[(String, String)], ttl: Duration) -> GeodexResult<()> {
        let deadline = Instant::now() + ttl;
        let mut entries = self.entries.write().await;
        for (key, value) in pairs {
            entries.insert(key.clone(), (value.clone(), deadline));
        }
        Ok(())
    }

    async fn delete_pattern(&self, pattern: &str) -> GeodexResult<u64> {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|key, _| !glob_match(pattern, key));
        Ok((before - entries.len()) as u64)
    }

    async fn ping(&self) -> GeodexResult<()> {
        Ok(())
    }
}

// ============================================================================
// CLIENT
// ============================================================================

/// Failure-swallowing fast-tier client.
///
/// Every operation returns a sentinel on transport failure or timeout
/// (`None`, `false`, `0`) and increments the shared error counter. No
/// operation ever raises.
pub struct FastTierClient {
    backend: Arc<dyn FastTierBackend>,
    timeout: Duration,
    stats: Arc<StatsCollector>,
}

impl FastTierClient {
    pub fn new(
        backend: Arc<dyn FastTierBackend>,
        timeout: Duration,
        stats: Arc<StatsCollector>,
    ) -> Self {
        Self {
            backend,
            timeout,
            stats,
        }
    }

    /// Run a backend call under the timeout, flattening timeout and
    /// transport failure into `None`.
    async fn guarded<T, F>(&self, op: &'static str, fut: F) -> Option<T>
    where
        F: Future<Output = GeodexResult<T>>,
    {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(Ok(value)) => Some(value),
            Ok(Err(err)) => {
                self.stats.record_error();
                warn!(op, error = %err, "fast tier operation failed");
                None
            }
            Err(_) => {
                self.stats.record_error();
                warn!(op, timeout_ms = self.timeout.as_millis() as u64, "fast tier operation timed out");
                None
            }
        }
    }

    pub async fn get(&self, key: &str) -> Option<String> {
        self.guarded("get", self.backend.get(key)).await.flatten()
    }

    /// Returns true iff the write reached the tier.
    pub async fn set(&self, key: &str, value: &str, ttl: Duration) -> bool {
        self.guarded("set", self.backend.set(key, value, ttl))
            .await
            .is_some()
    }

    /// Single-round-trip multi-get. On failure every slot is `None`.
    pub async fn batch_get(&self, keys: &[String]) -> Vec<Option<String>> {
        match self.guarded("batch_get", self.backend.batch_get(keys)).await {
            Some(values) => values,
            None => vec![None; keys.len()],
        }
    }

    pub async fn batch_set(&self, pairs: &[(String, String)], ttl: Duration) -> bool {
        self.guarded("batch_set", self.backend.batch_set(pairs, ttl))
            .await
            .is_some()
    }

    /// Returns the number of deleted keys, or 0 on failure.
    pub async fn delete_pattern(&self, pattern: &str) -> u64 {
        self.guarded("delete_pattern", self.backend.delete_pattern(pattern))
            .await
            .unwrap_or(0)
    }

    pub async fn ping(&self) -> bool {
        self.guarded("ping", self.backend.ping()).await.is_some()
    }
}

impl std::fmt::Debug for FastTierClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FastTierClient")
            .field("timeout", &self.timeout)
            .finish()
    }
}
