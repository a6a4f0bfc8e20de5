//! Cache statistics collection.
//!
//! The collector is an injected collaborator shared via `Arc`, not a
//! process-wide singleton. Counters are process-local and reset only on
//! restart; they are never persisted.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Atomic hit/miss/error counters for the tiered cache.
///
/// Increments use relaxed ordering: counters are monotonic telemetry, and
/// no other memory is synchronized through them.
#[derive(Debug, Default)]
pub struct StatsCollector {
    hits: AtomicU64,
    misses: AtomicU64,
    db_queries: AtomicU64,
    errors: AtomicU64,
    promotions: AtomicU64,
    evictions: AtomicU64,
}

impl StatsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_db_query(&self) {
        self.db_queries.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_promotion(&self) {
        self.promotions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_eviction(&self) {
        self.evictions.fetch_add(1, Ordering::Relaxed);
    }

    /// Point-in-time snapshot of all counters.
    ///
    /// `fallback_entry_count` is owned by the tiered cache and filled in
    /// there; it defaults to zero here.
    pub fn snapshot(&self) -> CacheStats {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        CacheStats {
            hits,
            misses,
            db_queries: self.db_queries.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
            promotions: self.promotions.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            fallback_entry_count: 0,
        }
    }
}

/// Snapshot of cache statistics at a point in time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub db_queries: u64,
    pub errors: u64,
    pub promotions: u64,
    pub evictions: u64,
    pub fallback_entry_count: u64,
}

impl CacheStats {
    /// Total get-path requests observed.
    pub fn total_requests(&self) -> u64 {
        self.hits + self.misses
    }

    /// Hit rate (0.0 to 1.0). Returns 0.0 before any request.
    pub fn hit_rate(&self) -> f64 {
        let total = self.total_requests();
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}
