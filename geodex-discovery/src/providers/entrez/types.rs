//! Wire types for the Entrez esummary JSON API.

use serde::Deserialize;

/// Top-level esummary envelope: `{"result": {"uids": [...], "<uid>": {...}}}`.
#[derive(Debug, Deserialize)]
pub struct SummaryEnvelope {
    pub result: SummaryResult,
}

#[derive(Debug, Deserialize)]
pub struct SummaryResult {
    #[serde(default)]
    pub uids: Vec<String>,
    #[serde(flatten)]
    pub docs: std::collections::HashMap<String, serde_json::Value>,
}

/// One document summary for a series accession.
#[derive(Debug, Deserialize)]
pub struct SeriesDocSum {
    #[serde(default)]
    pub title: Option<String>,
    /// Experiment category, e.g. "Expression profiling by array".
    #[serde(default, rename = "gdstype")]
    pub gds_type: Option<String>,
    /// Platform accession, e.g. "GPL570".
    #[serde(default, rename = "gpl")]
    pub platform: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub samples: Vec<SampleDocSum>,
}

/// One linked sample inside a series document summary.
#[derive(Debug, Deserialize)]
pub struct SampleDocSum {
    pub accession: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, rename = "source_name")]
    pub source: Option<String>,
    #[serde(default)]
    pub organism: Option<String>,
}
