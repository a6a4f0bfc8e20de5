//! GEODEX Cache - Tiered Metadata Cache
//!
//! Serves dataset records through a fast volatile tier backed by a durable
//! store, self-healing incomplete records via background enrichment.
//!
//! # Tiers
//!
//! 1. **Fast tier** - volatile TTL store behind [`FastTierBackend`]. Every
//!    round trip is timeout-guarded; failures degrade, they never surface.
//! 2. **Fallback** - bounded in-process FIFO map, consulted only when a
//!    fast-tier call fails.
//! 3. **Durable store** - the system of record behind [`DurableStore`].
//!
//! # Example
//!
//! ```ignore
//! let stats = Arc::new(StatsCollector::new());
//! let cache = TieredCache::new(
//!     Arc::new(InMemoryFastTier::new()),
//!     Arc::new(MemoryDurableStore::new()),
//!     metadata_provider,
//!     sample_discovery,
//!     CacheConfig::default(),
//!     stats,
//! );
//!
//! if let Some(record) = cache.get(&accession).await? {
//!     println!("{} has {} samples", record.accession, record.samples.len());
//! }
//! ```

pub mod durable;
pub mod fallback;
pub mod fast_tier;
pub mod keys;
pub mod retry;
pub mod stats;
pub mod tiered;

pub use durable::{DurableStore, MemoryDurableStore};
pub use fallback::MemoryFallback;
pub use fast_tier::{FastTierBackend, FastTierClient, InMemoryFastTier};
pub use keys::{EntityKind, KeyCodec};
pub use retry::RetryScheduler;
pub use stats::{CacheStats, StatsCollector};
pub use tiered::TieredCache;
