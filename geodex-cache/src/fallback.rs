//! In-process fallback tier.
//!
//! Keeps reads servable while the fast tier is down. Capacity-bounded with
//! FIFO-by-insertion eviction: when full, the single oldest-inserted entry
//! is dropped before the new one goes in. Access order is NOT tracked -
//! this is deliberately not an LRU.
//!
//! There is no circuit-breaker state: each cache operation tries the fast
//! tier first and only lands here after that call fails.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::stats::StatsCollector;

#[derive(Debug)]
struct FallbackInner {
    entries: HashMap<String, String>,
    insertion_order: VecDeque<String>,
}

/// Bounded in-process key-value store used when the fast tier is unreachable.
#[derive(Debug)]
pub struct MemoryFallback {
    inner: Mutex<FallbackInner>,
    capacity: usize,
    stats: Arc<StatsCollector>,
}

impl MemoryFallback {
    pub fn new(capacity: usize, stats: Arc<StatsCollector>) -> Self {
        Self {
            inner: Mutex::new(FallbackInner {
                entries: HashMap::with_capacity(capacity),
                insertion_order: VecDeque::with_capacity(capacity),
            }),
            capacity,
            stats,
        }
    }

    pub async fn get(&self, key: &str) -> Option<String> {
        self.inner.lock().await.entries.get(key).cloned()
    }

    /// Insert a value, evicting the oldest-inserted entry if at capacity.
    ///
    /// Re-inserting an existing key refreshes its value without consuming
    /// capacity or changing its position in the eviction queue.
    pub async fn put(&self, key: &str, value: String) {
        if self.capacity == 0 {
            return;
        }
        let mut inner = self.inner.lock().await;
        if inner.entries.contains_key(key) {
            inner.entries.insert(key.to_string(), value);
            return;
        }
        if inner.entries.len() >= self.capacity {
            if let Some(oldest) = inner.insertion_order.pop_front() {
                inner.entries.remove(&oldest);
                self.stats.record_eviction();
            }
        }
        inner.entries.insert(key.to_string(), value);
        inner.insertion_order.push_back(key.to_string());
    }

    /// Remove a key. Returns true iff it was present.
    pub async fn remove(&self, key: &str) -> bool {
        let mut inner = self.inner.lock().await;
        let removed = inner.entries.remove(key).is_some();
        if removed {
            inner.insertion_order.retain(|k| k != key);
        }
        removed
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fallback(capacity: usize) -> (MemoryFallback, Arc<StatsCollector>) {
        let stats = Arc::new(StatsCollector::new());
        (MemoryFallback::new(capacity, Arc::clone(&stats)), stats)
    }

    #[tokio::test]
    async fn test_put_get_remove() {
        let (cache, _) = fallback(4);
        cache.put("a", "1".into()).await;
        assert_eq!(cache.get("a").await.as_deref(), Some("1"));
        assert!(cache.remove("a").await);
        assert!(!cache.remove("a").await);
        assert_eq!(cache.get("a").await, None);
    }

    #[tokio::test]
    async fn test_eviction_bound_is_exact() {
        let n = 3;
        let (cache, stats) = fallback(n);
        for i in 0..=n {
            cache.put(&format!("k{i}"), format!("v{i}")).await;
        }
        // N+1 inserts into capacity N leaves exactly N entries.
        assert_eq!(cache.len().await, n);
        // The first-inserted key is the one evicted.
        assert_eq!(cache.get("k0").await, None);
        assert_eq!(cache.get("k3").await.as_deref(), Some("v3"));
        assert_eq!(stats.snapshot().evictions, 1);
    }

    #[tokio::test]
    async fn test_eviction_is_fifo_not_lru() {
        let (cache, _) = fallback(2);
        cache.put("a", "1".into()).await;
        cache.put("b", "2".into()).await;
        // Touch "a"; FIFO ignores access recency.
        assert!(cache.get("a").await.is_some());
        cache.put("c", "3".into()).await;
        assert_eq!(cache.get("a").await, None);
        assert_eq!(cache.get("b").await.as_deref(), Some("2"));
    }

    #[tokio::test]
    async fn test_reinsert_updates_without_eviction() {
        let (cache, stats) = fallback(2);
        cache.put("a", "1".into()).await;
        cache.put("b", "2".into()).await;
        cache.put("a", "updated".into()).await;
        assert_eq!(cache.len().await, 2);
        assert_eq!(cache.get("a").await.as_deref(), Some("updated"));
        assert_eq!(stats.snapshot().evictions, 0);
    }

    #[tokio::test]
    async fn test_zero_capacity_stores_nothing() {
        let (cache, _) = fallback(0);
        cache.put("a", "1".into()).await;
        assert_eq!(cache.len().await, 0);
        assert_eq!(cache.get("a").await, None);
    }
}

#[cfg(test)]
mod prop_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Entry count never exceeds capacity, whatever the insert sequence.
        #[test]
        fn prop_capacity_bound_holds(
            capacity in 1usize..16,
            keys in proptest::collection::vec("[a-e][0-9]", 0..64),
        ) {
            let rt = tokio::runtime::Builder::new_current_thread()
                .build()
                .expect("runtime");
            rt.block_on(async {
                let stats = Arc::new(StatsCollector::new());
                let cache = MemoryFallback::new(capacity, stats);
                for (i, key) in keys.iter().enumerate() {
                    cache.put(key, format!("v{i}")).await;
                    prop_assert!(cache.len().await <= capacity);
                }
                Ok(())
            })?;
        }
    }
}
