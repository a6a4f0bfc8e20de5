//! GEODEX Test Utilities
//!
//! Centralized test infrastructure for the geodex workspace:
//! - Mock discovery providers with programmable behavior
//! - A fault-injecting fast-tier backend
//! - Fixture builders for common record shapes
//! - Proptest generators for entity types

// Re-export the in-memory implementations tests wire together
pub use geodex_cache::{InMemoryFastTier, MemoryDurableStore, StatsCollector};

// Re-export core types for convenience
pub use geodex_core::{
    Accession, AttemptStatus, CacheConfig, CacheSource, CachedRecord, DatasetHeader,
    DatasetRecord, EnrichmentMetadata, FetchAttempt, GeodexError, GeodexResult, RetryPolicy,
    SampleAccession, SampleRecord,
};

use async_trait::async_trait;
use chrono::Utc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use geodex_cache::FastTierBackend;
use geodex_core::TransportError;
use geodex_discovery::{request_failed, MetadataProvider, SampleDiscovery};

// ============================================================================
// MOCK PROVIDERS
// ============================================================================

/// Mock metadata provider with a programmable header and failure switch.
#[derive(Debug, Default)]
pub struct MockMetadataProvider {
    header: Mutex<Option<DatasetHeader>>,
    fail: AtomicBool,
    calls: AtomicUsize,
}

impl MockMetadataProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the header returned by subsequent calls.
    pub fn set_header(&self, header: DatasetHeader) {
        *self.header.lock().expect("mock lock") = Some(header);
    }

    /// Make subsequent calls fail.
    pub fn set_failing(&self, failing: bool) {
        self.fail.store(failing, Ordering::SeqCst);
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MetadataProvider for MockMetadataProvider {
    async fn fetch_header(&self, accession: &Accession) -> GeodexResult<DatasetHeader> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(request_failed("mock", 500, "forced failure"));
        }
        self.header
            .lock()
            .expect("mock lock")
            .clone()
            .ok_or_else(|| request_failed("mock", 404, format!("no header for {accession}")))
    }
}

/// Mock sample-discovery provider with programmable results.
#[derive(Debug, Default)]
pub struct MockSampleDiscovery {
    samples: Mutex<Vec<SampleRecord>>,
    fail: AtomicBool,
    calls: AtomicUsize,
}

impl MockSampleDiscovery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_samples(&self, samples: Vec<SampleRecord>) {
        *self.samples.lock().expect("mock lock") = samples;
    }

    pub fn set_failing(&self, failing: bool) {
        self.fail.store(failing, Ordering::SeqCst);
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SampleDiscovery for MockSampleDiscovery {
    async fn discover_samples(
        &self,
        _accession: &Accession,
        _header: &DatasetHeader,
        max_results: usize,
    ) -> GeodexResult<Vec<SampleRecord>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(request_failed("mock", 503, "forced failure"));
        }
        let samples = self.samples.lock().expect("mock lock");
        Ok(samples.iter().take(max_results).cloned().collect())
    }
}

// ============================================================================
// FAULT-INJECTING FAST TIER
// ============================================================================

/// Fast-tier backend wrapping [`InMemoryFastTier`] with a failure switch.
///
/// While failing, every operation returns a transport error, driving the
/// cache onto its fallback paths; flip the switch back to observe recovery.
#[derive(Debug, Default)]
pub struct FlakyFastTier {
    inner: InMemoryFastTier,
    fail: AtomicBool,
}

impl FlakyFastTier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.fail.store(failing, Ordering::SeqCst);
    }

    fn check(&self) -> GeodexResult<()> {
        if self.fail.load(Ordering::SeqCst) {
            Err(TransportError::Unreachable {
                reason: "injected fault".into(),
            }
            .into())
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl FastTierBackend for FlakyFastTier {
    async fn get(&self, key: &str) -> GeodexResult<Option<String>> {
        self.check()?;
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> GeodexResult<()> {
        self.check()?;
        self.inner.set(key, value, ttl).await
    }

    async fn batch_get(&self, keys: &[String]) -> GeodexResult<Vec<Option<String>>> {
        self.check()?;
        self.inner.batch_get(keys).await
    }

    async fn batch_set(&self, pairs: &[(String, String)], ttl: Duration) -> GeodexResult<()> {
        self.check()?;
        self.inner.batch_set(pairs, ttl).await
    }

    async fn delete_pattern(&self, pattern: &str) -> GeodexResult<u64> {
        self.check()?;
        self.inner.delete_pattern(pattern).await
    }

    async fn ping(&self) -> GeodexResult<()> {
        self.check()?;
        self.inner.ping().await
    }
}

// ============================================================================
// FIXTURES
// ============================================================================

/// A complete dataset record with one sample.
pub fn dataset(raw: &str) -> DatasetRecord {
    let mut record = incomplete_dataset(raw);
    record.samples.push(sample("GSM1"));
    record
}

/// An incomplete (zero-sample) dataset record with populated header fields.
pub fn incomplete_dataset(raw: &str) -> DatasetRecord {
    DatasetRecord::from_header(
        Accession::parse(raw).expect("valid accession"),
        DatasetHeader {
            title: Some("Fixture dataset".into()),
            category: Some("Expression profiling by array".into()),
            platform: Some("GPL570".into()),
            summary: Some("Fixture summary.".into()),
        },
        Utc::now(),
    )
}

/// A sample record with one successful fetch attempt.
pub fn sample(raw: &str) -> SampleRecord {
    let mut record = SampleRecord::new(SampleAccession::parse(raw).expect("valid accession"));
    record
        .attempts
        .push(FetchAttempt::success(Utc::now(), format!("/data/{raw}.txt.gz")));
    record
}

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod strategies {
    use super::*;
    use proptest::prelude::*;

    pub fn accession() -> impl Strategy<Value = Accession> {
        (1u64..999_999_999)
            .prop_map(|n| Accession::parse(format!("GSE{n}")).expect("valid accession"))
    }

    pub fn sample_accession() -> impl Strategy<Value = SampleAccession> {
        (1u64..999_999_999)
            .prop_map(|n| SampleAccession::parse(format!("GSM{n}")).expect("valid accession"))
    }

    pub fn dataset_header() -> impl Strategy<Value = DatasetHeader> {
        (
            proptest::option::of("[a-zA-Z0-9 ]{1,40}"),
            proptest::option::of("[a-zA-Z ]{1,30}"),
            proptest::option::of("GPL[0-9]{1,5}"),
            proptest::option::of("[a-zA-Z0-9 .]{0,80}"),
        )
            .prop_map(|(title, category, platform, summary)| DatasetHeader {
                title,
                category,
                platform,
                summary,
            })
    }

    pub fn sample_record() -> impl Strategy<Value = SampleRecord> {
        (sample_accession(), proptest::option::of("[a-zA-Z0-9 ]{1,30}")).prop_map(
            |(accession, title)| SampleRecord {
                accession,
                title,
                source: None,
                organism: None,
                attempts: Vec::new(),
            },
        )
    }

    pub fn enrichment_metadata() -> impl Strategy<Value = EnrichmentMetadata> {
        (0u32..5, 0u32..10, any::<bool>(), 0i64..10_000).prop_map(
            |(retry_count, discovered_count, attempted, minutes_ago)| EnrichmentMetadata {
                last_attempt: attempted
                    .then(|| Utc::now() - chrono::Duration::minutes(minutes_ago)),
                retry_count,
                discovered_count,
                discovery_success: discovered_count > 0,
            },
        )
    }

    pub fn dataset_record() -> impl Strategy<Value = DatasetRecord> {
        (
            accession(),
            dataset_header(),
            proptest::collection::vec(sample_record(), 0..8),
            enrichment_metadata(),
        )
            .prop_map(|(accession, header, samples, enrichment)| DatasetRecord {
                accession,
                header,
                samples,
                enrichment,
                updated_at: Utc::now(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[tokio::test]
    async fn test_mock_metadata_provider_modes() {
        let provider = MockMetadataProvider::new();
        let acc = Accession::parse("GSE1").expect("valid accession");

        // Unprogrammed: not found.
        assert!(provider.fetch_header(&acc).await.is_err());

        provider.set_header(DatasetHeader::default());
        assert!(provider.fetch_header(&acc).await.is_ok());

        provider.set_failing(true);
        assert!(provider.fetch_header(&acc).await.is_err());
        assert_eq!(provider.call_count(), 3);
    }

    #[tokio::test]
    async fn test_flaky_fast_tier_switch() {
        let tier = FlakyFastTier::new();
        assert!(tier.set("k", "v", Duration::from_secs(60)).await.is_ok());

        tier.set_failing(true);
        assert!(tier.get("k").await.is_err());

        tier.set_failing(false);
        let value = tier.get("k").await.expect("transport ok");
        assert_eq!(value.as_deref(), Some("v"));
    }

    #[test]
    fn test_fixtures_shape() {
        assert!(dataset("GSE1").samples.len() == 1);
        assert!(incomplete_dataset("GSE2").is_incomplete());
        let s = sample("GSM3");
        assert_eq!(s.attempts.len(), 1);
        assert_eq!(s.attempts[0].status, AttemptStatus::Success);
    }

    proptest! {
        /// Generated records always roundtrip through the cache envelope.
        #[test]
        fn prop_generated_records_serialize(record in strategies::dataset_record()) {
            let envelope = CachedRecord::new(record, CacheSource::Promotion, Duration::from_secs(60));
            let json = serde_json::to_string(&envelope).expect("serialize");
            let back: CachedRecord = serde_json::from_str(&json).expect("deserialize");
            prop_assert_eq!(envelope, back);
        }
    }
}
