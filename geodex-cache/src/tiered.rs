//! Tiered cache orchestration.
//!
//! The read path walks fast tier -> in-process fallback -> durable store,
//! promoting on miss and transparently self-healing incomplete records via
//! auto-discovery. Tier failures degrade; only durable-store errors on the
//! write path surface to callers.

use chrono::Utc;
use futures_util::future::join_all;
use std::sync::Arc;
use tracing::{debug, warn};

use geodex_core::{
    Accession, CacheConfig, CacheSource, CachedRecord, DatasetRecord, GeodexResult, RetryPolicy,
};
use geodex_discovery::{MetadataProvider, SampleDiscovery};

use crate::durable::DurableStore;
use crate::fallback::MemoryFallback;
use crate::fast_tier::{FastTierBackend, FastTierClient};
use crate::keys::KeyCodec;
use crate::retry::RetryScheduler;
use crate::stats::{CacheStats, StatsCollector};

/// Tiered cache over a fast tier, an in-process fallback, and a durable
/// store, with auto-discovery of absent or incomplete records.
///
/// # Concurrency
///
/// There is no per-accession single-flight: two concurrent cold `get`s for
/// the same accession may both run discovery. Upserts are idempotent and
/// last-writer-wins, so both arrive at the same record.
pub struct TieredCache<D>
where
    D: DurableStore,
{
    durable: Arc<D>,
    metadata: Arc<dyn MetadataProvider>,
    discovery: Arc<dyn SampleDiscovery>,
    fast_tier: FastTierClient,
    fallback: MemoryFallback,
    scheduler: RetryScheduler,
    codec: KeyCodec,
    config: CacheConfig,
    stats: Arc<StatsCollector>,
}

impl<D> TieredCache<D>
where
    D: DurableStore,
{
    /// Build a tiered cache from its collaborators.
    ///
    /// The stats collector is injected so the host can share one snapshot
    /// surface across components; all tiers report into it.
    pub fn new(
        fast_backend: Arc<dyn FastTierBackend>,
        durable: Arc<D>,
        metadata: Arc<dyn MetadataProvider>,
        discovery: Arc<dyn SampleDiscovery>,
        config: CacheConfig,
        stats: Arc<StatsCollector>,
    ) -> Self {
        Self {
            fast_tier: FastTierClient::new(
                fast_backend,
                config.fast_tier_timeout,
                Arc::clone(&stats),
            ),
            fallback: MemoryFallback::new(config.fallback_capacity, Arc::clone(&stats)),
            scheduler: RetryScheduler::new(RetryPolicy::default()),
            codec: KeyCodec::new(config.key_prefix.clone()),
            durable,
            metadata,
            discovery,
            config,
            stats,
        }
    }

    /// Override the retry policy for re-enrichment scheduling.
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.scheduler = RetryScheduler::new(policy);
        self
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Get a record, resolving through the tiers and self-healing where
    /// the retry policy allows.
    pub async fn get(&self, accession: &Accession) -> GeodexResult<Option<DatasetRecord>> {
        let key = self.codec.dataset_key(accession.as_str());

        // Fast tier first. A hit never touches the durable store.
        if let Some(raw) = self.fast_tier.get(&key).await {
            if let Some(envelope) = decode_envelope(&key, &raw) {
                self.stats.record_hit();
                return Ok(Some(envelope.into_record()));
            }
        }

        // Fallback tier, only consulted when the fast tier had nothing.
        if self.config.fallback_enabled {
            if let Some(raw) = self.fallback.get(&key).await {
                match decode_envelope(&key, &raw) {
                    Some(envelope) if !envelope.is_expired(Utc::now()) => {
                        self.stats.record_hit();
                        return Ok(Some(envelope.into_record()));
                    }
                    _ => {
                        self.fallback.remove(&key).await;
                    }
                }
            }
        }

        self.stats.record_miss();
        self.stats.record_db_query();
        let stored = self.durable.get_complete_record(accession).await?;

        let resolved = match stored {
            None => {
                debug!(accession = %accession, "record absent, attempting discovery");
                self.auto_discover(accession, None).await
            }
            Some(record) if record.is_incomplete() => {
                if self.scheduler.should_retry(&record.enrichment, Utc::now()) {
                    debug!(accession = %accession, retry_count = record.enrichment.retry_count,
                        "incomplete record due for re-enrichment");
                    // Prefer the enriched result; keep the incomplete record
                    // when discovery fails outright.
                    match self
                        .auto_discover(accession, Some(record.enrichment.retry_count))
                        .await
                    {
                        Some(enriched) => Some(enriched),
                        None => Some(record),
                    }
                } else {
                    Some(record)
                }
            }
            Some(record) => Some(record),
        };

        if let Some(record) = &resolved {
            self.promote(&key, record).await;
        }
        Ok(resolved)
    }

    /// Get by raw id string. Malformed ids resolve to absent (logged),
    /// never an error.
    pub async fn get_raw(&self, raw_id: &str) -> GeodexResult<Option<DatasetRecord>> {
        match Accession::parse(raw_id) {
            Ok(accession) => self.get(&accession).await,
            Err(err) => {
                warn!(raw_id, error = %err, "rejected malformed accession");
                Ok(None)
            }
        }
    }

    /// Write a record through both tiers.
    ///
    /// The durable write MUST succeed or the call fails. The fast-tier
    /// write is best-effort and falls back to the in-process tier, so the
    /// cached projection is never silently skipped on both tiers.
    pub async fn update(&self, record: &DatasetRecord) -> GeodexResult<bool> {
        self.durable.upsert_record(record).await?;

        let key = self.codec.dataset_key(record.accession.as_str());
        let envelope = CachedRecord::new(
            record.clone(),
            CacheSource::WriteThrough,
            self.config.entry_ttl,
        );
        match serde_json::to_string(&envelope) {
            Ok(raw) => {
                if !self.fast_tier.set(&key, &raw, self.config.entry_ttl).await {
                    self.fallback.put(&key, raw).await;
                }
            }
            Err(err) => warn!(key = %key, error = %err, "failed to serialize cache envelope"),
        }
        Ok(true)
    }

    /// Drop the cached projection of a record. The durable copy is never
    /// touched. Returns true iff anything was removed.
    pub async fn invalidate(&self, accession: &Accession) -> bool {
        let key = self.codec.dataset_key(accession.as_str());
        let pattern = self.codec.dataset_pattern(accession.as_str());
        // The bare key and its sub-key namespace are deleted separately so
        // sibling accessions sharing a prefix are never swept up.
        let deleted = self.fast_tier.delete_pattern(&key).await
            + self.fast_tier.delete_pattern(&pattern).await;
        let removed_fallback = self.fallback.remove(&key).await;
        deleted > 0 || removed_fallback
    }

    /// Invalidate many records concurrently. Returns how many had a cached
    /// projection to remove.
    pub async fn invalidate_batch(&self, accessions: &[Accession]) -> usize {
        let results = join_all(accessions.iter().map(|acc| self.invalidate(acc))).await;
        results.into_iter().filter(|removed| *removed).count()
    }

    /// Resolve many records concurrently, counting those found. Used to
    /// pre-populate the fast tier after a restart.
    pub async fn warm_up(&self, accessions: &[Accession]) -> usize {
        let results = join_all(accessions.iter().map(|acc| self.get(acc))).await;
        results
            .into_iter()
            .filter(|result| matches!(result, Ok(Some(_))))
            .count()
    }

    /// Snapshot of cache statistics, including the live fallback size.
    pub async fn stats(&self) -> CacheStats {
        let mut snapshot = self.stats.snapshot();
        snapshot.fallback_entry_count = self.fallback.len().await as u64;
        snapshot
    }

    /// Liveness of the fast tier. A false return means reads are being
    /// served from the fallback and durable tiers.
    pub async fn fast_tier_healthy(&self) -> bool {
        self.fast_tier.ping().await
    }

    /// Populate an absent or incomplete record via the discovery providers.
    ///
    /// `prior_retry_count` is `Some` only on the scheduled-retry path; a
    /// retry that discovers nothing increments it, any successful discovery
    /// resets it to zero.
    ///
    /// Returns the re-read persisted record, or `None` when the header
    /// fetch or the persistence step fails - a failed header fetch never
    /// persists a partial record.
    async fn auto_discover(
        &self,
        accession: &Accession,
        prior_retry_count: Option<u32>,
    ) -> Option<DatasetRecord> {
        let header = match tokio::time::timeout(
            self.config.discovery_timeout,
            self.metadata.fetch_header(accession),
        )
        .await
        {
            Ok(Ok(header)) => header,
            Ok(Err(err)) => {
                self.stats.record_error();
                warn!(accession = %accession, error = %err, "header fetch failed");
                return None;
            }
            Err(_) => {
                self.stats.record_error();
                warn!(accession = %accession, "header fetch timed out");
                return None;
            }
        };

        // Sample discovery is best-effort: the header alone is worth keeping.
        let samples = match tokio::time::timeout(
            self.config.discovery_timeout,
            self.discovery
                .discover_samples(accession, &header, self.config.max_sample_results),
        )
        .await
        {
            Ok(Ok(samples)) => samples,
            Ok(Err(err)) => {
                self.stats.record_error();
                warn!(accession = %accession, error = %err, "sample discovery failed");
                Vec::new()
            }
            Err(_) => {
                self.stats.record_error();
                warn!(accession = %accession, "sample discovery timed out");
                Vec::new()
            }
        };

        let discovered_count = samples.len() as u32;
        let retry_count = match prior_retry_count {
            Some(previous) if discovered_count == 0 => previous + 1,
            _ => 0,
        };

        let now = Utc::now();
        let mut record = DatasetRecord::from_header(accession.clone(), header, now);
        record.samples = samples;
        record.enrichment.last_attempt = Some(now);
        record.enrichment.retry_count = retry_count;
        record.enrichment.discovered_count = discovered_count;
        record.enrichment.discovery_success = discovered_count > 0;

        if let Err(err) = self.durable.upsert_record(&record).await {
            self.stats.record_error();
            warn!(accession = %accession, error = %err, "failed to persist discovered record");
            return None;
        }

        self.stats.record_db_query();
        match self.durable.get_complete_record(accession).await {
            Ok(record) => record,
            Err(err) => {
                self.stats.record_error();
                warn!(accession = %accession, error = %err, "failed to re-read discovered record");
                None
            }
        }
    }

    /// Best-effort promotion into the fast tier, falling back to the
    /// in-process tier. Failures are logged, never surfaced.
    async fn promote(&self, key: &str, record: &DatasetRecord) {
        let envelope = CachedRecord::new(
            record.clone(),
            CacheSource::Promotion,
            self.config.entry_ttl,
        );
        let raw = match serde_json::to_string(&envelope) {
            Ok(raw) => raw,
            Err(err) => {
                warn!(key, error = %err, "failed to serialize promotion envelope");
                return;
            }
        };

        if self.fast_tier.set(key, &raw, self.config.entry_ttl).await {
            self.stats.record_promotion();
        } else if self.config.fallback_enabled {
            self.fallback.put(key, raw).await;
            self.stats.record_promotion();
        } else {
            debug!(key, "promotion skipped, no tier available");
        }
    }
}

impl<D> std::fmt::Debug for TieredCache<D>
where
    D: DurableStore,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TieredCache")
            .field("config", &self.config)
            .finish()
    }
}

fn decode_envelope(key: &str, raw: &str) -> Option<CachedRecord> {
    match serde_json::from_str::<CachedRecord>(raw) {
        Ok(envelope) => Some(envelope),
        Err(err) => {
            warn!(key, error = %err, "dropping undecodable cache envelope");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use geodex_core::{DatasetHeader, GeodexResult, SampleRecord};
    use geodex_discovery::request_failed;

    use crate::durable::MemoryDurableStore;
    use crate::fast_tier::InMemoryFastTier;

    struct StaticMetadata {
        header: Option<DatasetHeader>,
    }

    #[async_trait]
    impl MetadataProvider for StaticMetadata {
        async fn fetch_header(&self, accession: &Accession) -> GeodexResult<DatasetHeader> {
            self.header
                .clone()
                .ok_or_else(|| request_failed("mock", 404, format!("no header for {accession}")))
        }
    }

    struct StaticDiscovery {
        samples: Vec<SampleRecord>,
    }

    #[async_trait]
    impl SampleDiscovery for StaticDiscovery {
        async fn discover_samples(
            &self,
            _accession: &Accession,
            _header: &DatasetHeader,
            max_results: usize,
        ) -> GeodexResult<Vec<SampleRecord>> {
            Ok(self.samples.iter().take(max_results).cloned().collect())
        }
    }

    fn acc(raw: &str) -> Accession {
        Accession::parse(raw).expect("valid accession")
    }

    fn cache_with(
        header: Option<DatasetHeader>,
        samples: Vec<SampleRecord>,
    ) -> (TieredCache<MemoryDurableStore>, Arc<MemoryDurableStore>) {
        let durable = Arc::new(MemoryDurableStore::new());
        let cache = TieredCache::new(
            Arc::new(InMemoryFastTier::new()),
            Arc::clone(&durable),
            Arc::new(StaticMetadata { header }),
            Arc::new(StaticDiscovery { samples }),
            CacheConfig::default(),
            Arc::new(StatsCollector::new()),
        );
        (cache, durable)
    }

    #[tokio::test]
    async fn test_get_raw_rejects_malformed_id() {
        let (cache, durable) = cache_with(None, Vec::new());
        let result = cache.get_raw("drop table datasets").await.expect("no error");
        assert!(result.is_none());
        // Malformed input never reaches the durable tier.
        assert_eq!(durable.query_count(), 0);
    }

    #[tokio::test]
    async fn test_update_then_get_hits_fast_tier() {
        let (cache, durable) = cache_with(None, Vec::new());
        let mut record = DatasetRecord::from_header(acc("GSE10"), DatasetHeader::default(), Utc::now());
        record.header.title = Some("hello".into());
        record.samples.push(SampleRecord::new(
            geodex_core::SampleAccession::parse("GSM1").expect("valid accession"),
        ));

        assert!(cache.update(&record).await.expect("update ok"));

        let loaded = cache.get(&acc("GSE10")).await.expect("get ok").expect("present");
        assert_eq!(loaded.header.title.as_deref(), Some("hello"));
        // Served from the write-through projection: no durable read.
        assert_eq!(durable.query_count(), 0);
        assert_eq!(cache.stats().await.hits, 1);
    }

    #[tokio::test]
    async fn test_invalidate_removes_projection_keeps_durable() {
        let (cache, durable) = cache_with(None, Vec::new());
        let mut record = DatasetRecord::from_header(acc("GSE11"), DatasetHeader::default(), Utc::now());
        record.samples.push(SampleRecord::new(
            geodex_core::SampleAccession::parse("GSM2").expect("valid accession"),
        ));
        cache.update(&record).await.expect("update ok");

        assert!(cache.invalidate(&acc("GSE11")).await);
        // Projection gone: the next get goes to the durable tier.
        let loaded = cache.get(&acc("GSE11")).await.expect("get ok");
        assert!(loaded.is_some());
        assert_eq!(durable.query_count(), 1);
    }

    #[tokio::test]
    async fn test_invalidate_absent_returns_false() {
        let (cache, _) = cache_with(None, Vec::new());
        assert!(!cache.invalidate(&acc("GSE404")).await);
    }

    #[tokio::test]
    async fn test_discovery_failure_keeps_incomplete_record() {
        // Header provider down: the stored incomplete record is returned as-is.
        let (cache, durable) = cache_with(None, Vec::new());
        let record = DatasetRecord::from_header(acc("GSE12"), DatasetHeader::default(), Utc::now());
        durable.insert_raw(record);

        let loaded = cache.get(&acc("GSE12")).await.expect("get ok").expect("present");
        assert!(loaded.is_incomplete());
        // Nothing extra was persisted by the failed discovery.
        assert_eq!(durable.len(), 1);
    }

    #[tokio::test]
    async fn test_stats_surface_fallback_size() {
        let (cache, _) = cache_with(None, Vec::new());
        let snapshot = cache.stats().await;
        assert_eq!(snapshot.fallback_entry_count, 0);
        assert_eq!(snapshot.total_requests(), 0);
    }
}
