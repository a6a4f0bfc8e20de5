//! Durable tier contract.
//!
//! The durable store is the system of record; the cache only ever holds a
//! projection of it. `MemoryDurableStore` is a complete in-memory
//! implementation honoring the merge contract, used in single-process
//! deployments and as the store under test.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

use geodex_core::{
    Accession, DatasetRecord, EnrichmentMetadata, GeodexResult, StorageError,
};

/// Source-of-truth persistent store for dataset records.
///
/// # Upsert contract
///
/// Upserts are last-writer-wins per header field: a field the incoming
/// record sets overwrites the stored one, a field it leaves unset is kept.
/// Samples are replaced only when the incoming record carries any, and the
/// `enrichment` sub-object is merged as a unit, so an update touching only
/// header fields can never clobber retry bookkeeping written by a
/// concurrent enrichment run.
#[async_trait]
pub trait DurableStore: Send + Sync {
    /// Fetch a record with all linked samples. Absence is `Ok(None)`.
    async fn get_complete_record(
        &self,
        accession: &Accession,
    ) -> GeodexResult<Option<DatasetRecord>>;

    /// Insert or merge a record per the upsert contract.
    async fn upsert_record(&self, record: &DatasetRecord) -> GeodexResult<()>;
}

/// In-memory durable store.
///
/// Tracks a query counter so tests can assert that promoted reads stop
/// touching the durable tier.
#[derive(Debug, Default)]
pub struct MemoryDurableStore {
    records: RwLock<HashMap<String, DatasetRecord>>,
    queries: AtomicU64,
}

impl MemoryDurableStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `get_complete_record` calls served so far.
    pub fn query_count(&self) -> u64 {
        self.queries.load(Ordering::Relaxed)
    }

    /// Seed a record directly, bypassing merge semantics. Test setup helper.
    pub fn insert_raw(&self, record: DatasetRecord) {
        self.records
            .write()
            .expect("store lock")
            .insert(record.accession.as_str().to_string(), record);
    }

    pub fn len(&self) -> usize {
        self.records.read().expect("store lock").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Merge `incoming` over `existing` per the [`DurableStore`] contract.
fn merge_records(existing: &DatasetRecord, incoming: &DatasetRecord) -> DatasetRecord {
    let mut merged = existing.clone();

    if incoming.header.title.is_some() {
        merged.header.title = incoming.header.title.clone();
    }
    if incoming.header.category.is_some() {
        merged.header.category = incoming.header.category.clone();
    }
    if incoming.header.platform.is_some() {
        merged.header.platform = incoming.header.platform.clone();
    }
    if incoming.header.summary.is_some() {
        merged.header.summary = incoming.header.summary.clone();
    }

    if !incoming.samples.is_empty() {
        merged.samples = incoming.samples.clone();
    }

    // The enrichment sub-object moves as a unit. An untouched (default)
    // sub-object on the incoming record means the writer was not an
    // enrichment run, so the stored bookkeeping is kept.
    if incoming.enrichment != EnrichmentMetadata::default() {
        merged.enrichment = incoming.enrichment.clone();
    }

    merged.updated_at = incoming.updated_at.max(existing.updated_at);
    merged
}

#[async_trait]
impl DurableStore for MemoryDurableStore {
    async fn get_complete_record(
        &self,
        accession: &Accession,
    ) -> GeodexResult<Option<DatasetRecord>> {
        self.queries.fetch_add(1, Ordering::Relaxed);
        let records = self
            .records
            .read()
            .map_err(|_| StorageError::LockPoisoned)?;
        Ok(records.get(accession.as_str()).cloned())
    }

    async fn upsert_record(&self, record: &DatasetRecord) -> GeodexResult<()> {
        let mut records = self
            .records
            .write()
            .map_err(|_| StorageError::LockPoisoned)?;
        let key = record.accession.as_str().to_string();
        let merged = match records.get(&key) {
            Some(existing) => merge_records(existing, record),
            None => record.clone(),
        };
        records.insert(key, merged);
        Ok(())
    }
}
