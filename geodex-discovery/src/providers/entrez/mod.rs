//! Entrez esummary provider implementation.
//!
//! Talks to an NCBI-eutils-style JSON endpoint. The same document summary
//! carries both the series header and its linked samples, so one client
//! implements both provider traits.

pub mod types;

use async_trait::async_trait;
use reqwest::Client;

use geodex_core::{
    Accession, DatasetHeader, GeodexResult, SampleAccession, SampleRecord,
};

use crate::{invalid_response, request_failed, MetadataProvider, SampleDiscovery};
use types::{SeriesDocSum, SummaryEnvelope};

const PROVIDER: &str = "entrez";

/// Entrez esummary client for dataset metadata and sample discovery.
pub struct EntrezProvider {
    client: Client,
    base_url: String,
    db: String,
}

impl EntrezProvider {
    /// Create a new Entrez provider.
    ///
    /// # Arguments
    /// * `base_url` - eutils endpoint root (e.g. "https://eutils.ncbi.nlm.nih.gov/entrez/eutils")
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
            db: "gds".to_string(),
        }
    }

    /// Override the Entrez database name.
    pub fn with_db(mut self, db: impl Into<String>) -> Self {
        self.db = db.into();
        self
    }

    async fn fetch_docsum(&self, accession: &Accession) -> GeodexResult<SeriesDocSum> {
        let url = format!(
            "{}/esummary.fcgi?db={}&retmode=json&acc={}",
            self.base_url, self.db, accession
        );
        let response = self.client.get(&url).send().await.map_err(|e| {
            request_failed(PROVIDER, 0, format!("HTTP request failed: {}", e))
        })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(request_failed(PROVIDER, status.as_u16() as i32, error_text));
        }

        let envelope: SummaryEnvelope = response.json().await.map_err(|e| {
            invalid_response(PROVIDER, format!("Failed to parse response: {}", e))
        })?;

        let uid = envelope.result.uids.first().ok_or_else(|| {
            invalid_response(PROVIDER, format!("No document for {}", accession))
        })?;
        let doc = envelope.result.docs.get(uid).ok_or_else(|| {
            invalid_response(PROVIDER, format!("Missing docsum for uid {}", uid))
        })?;

        serde_json::from_value(doc.clone())
            .map_err(|e| invalid_response(PROVIDER, format!("Malformed docsum: {}", e)))
    }
}

#[async_trait]
impl MetadataProvider for EntrezProvider {
    async fn fetch_header(&self, accession: &Accession) -> GeodexResult<DatasetHeader> {
        let doc = self.fetch_docsum(accession).await?;
        Ok(DatasetHeader {
            title: doc.title,
            category: doc.gds_type,
            platform: doc.platform,
            summary: doc.summary,
        })
    }
}

#[async_trait]
impl SampleDiscovery for EntrezProvider {
    async fn discover_samples(
        &self,
        accession: &Accession,
        _header: &DatasetHeader,
        max_results: usize,
    ) -> GeodexResult<Vec<SampleRecord>> {
        let doc = self.fetch_docsum(accession).await?;

        let mut samples = Vec::with_capacity(doc.samples.len().min(max_results));
        for raw in doc.samples.into_iter().take(max_results) {
            // Providers occasionally return non-GSM members (supplementary
            // listings); skip them rather than failing the whole discovery.
            let Ok(sample_accession) = SampleAccession::parse(&raw.accession) else {
                continue;
            };
            samples.push(SampleRecord {
                accession: sample_accession,
                title: raw.title,
                source: raw.source,
                organism: raw.organism,
                attempts: Vec::new(),
            });
        }
        Ok(samples)
    }
}

impl std::fmt::Debug for EntrezProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntrezProvider")
            .field("base_url", &self.base_url)
            .field("db", &self.db)
            .finish()
    }
}
