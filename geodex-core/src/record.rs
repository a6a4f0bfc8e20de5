//! Dataset and sample record entities.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::accession::{Accession, SampleAccession};

/// Outcome of a single fetch attempt against a sample's source files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptStatus {
    Success,
    Failed,
    Skipped,
}

/// One entry in a sample's ordered attempt history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchAttempt {
    pub status: AttemptStatus,
    pub timestamp: DateTime<Utc>,
    /// Local path of the fetched artifact, when the attempt succeeded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Failure detail, when the attempt did not succeed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FetchAttempt {
    /// Record a successful attempt at `path`.
    pub fn success(timestamp: DateTime<Utc>, path: impl Into<String>) -> Self {
        Self {
            status: AttemptStatus::Success,
            timestamp,
            path: Some(path.into()),
            error: None,
        }
    }

    /// Record a failed attempt with an error description.
    pub fn failed(timestamp: DateTime<Utc>, error: impl Into<String>) -> Self {
        Self {
            status: AttemptStatus::Failed,
            timestamp,
            path: None,
            error: Some(error.into()),
        }
    }
}

/// Linked sub-record: one sample belonging to a dataset series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleRecord {
    pub accession: SampleAccession,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organism: Option<String>,
    /// Ordered attempt history, append-only.
    #[serde(default)]
    pub attempts: Vec<FetchAttempt>,
}

impl SampleRecord {
    pub fn new(accession: SampleAccession) -> Self {
        Self {
            accession,
            title: None,
            source: None,
            organism: None,
            attempts: Vec::new(),
        }
    }
}

/// Header fields of a dataset record, as returned by a metadata provider.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DatasetHeader {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

/// Enrichment bookkeeping embedded in the record.
///
/// Lives inside the record (not a separate scheduler store) so the retry
/// state survives restarts together with the data it describes. The durable
/// store merges this sub-object as a unit on upsert.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnrichmentMetadata {
    /// When enrichment last ran. `None` means never attempted.
    ///
    /// An unparseable persisted timestamp deserializes to `None` rather than
    /// erroring, so corrupt bookkeeping can never permanently block retries.
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub last_attempt: Option<DateTime<Utc>>,
    /// Failed/empty re-enrichment attempts so far. Reset implied by success:
    /// a successful discovery writes a fresh record with count 0.
    #[serde(default)]
    pub retry_count: u32,
    /// Samples found by the most recent discovery run.
    #[serde(default)]
    pub discovered_count: u32,
    #[serde(default)]
    pub discovery_success: bool,
}

/// Deserialize a timestamp failing OPEN: anything unparseable becomes `None`.
fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(raw.and_then(|value| serde_json::from_value::<DateTime<Utc>>(value).ok()))
}

/// A dataset record: immutable accession, header fields, linked samples,
/// and enrichment bookkeeping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetRecord {
    pub accession: Accession,
    #[serde(flatten)]
    pub header: DatasetHeader,
    #[serde(default)]
    pub samples: Vec<SampleRecord>,
    #[serde(default)]
    pub enrichment: EnrichmentMetadata,
    pub updated_at: DateTime<Utc>,
}

impl DatasetRecord {
    /// Create a record from a header with no samples yet.
    pub fn from_header(accession: Accession, header: DatasetHeader, now: DateTime<Utc>) -> Self {
        Self {
            accession,
            header,
            samples: Vec::new(),
            enrichment: EnrichmentMetadata::default(),
            updated_at: now,
        }
    }

    /// A record is incomplete iff it has zero linked samples. Incomplete
    /// records are eligible for scheduled re-enrichment.
    pub fn is_incomplete(&self) -> bool {
        self.samples.is_empty()
    }
}
