//! GEODEX Discovery - Enrichment Provider Traits
//!
//! Provider-agnostic traits for dataset metadata lookup and linked-sample
//! discovery. The cache consumes these seams; concrete providers are wired
//! in by the host application. An HTTP implementation against an
//! Entrez-style JSON API ships in [`providers`].

use async_trait::async_trait;
use geodex_core::{Accession, DatasetHeader, DiscoveryError, GeodexResult, SampleRecord};

pub mod providers;

pub use providers::EntrezProvider;

/// Trait for dataset metadata providers.
/// Implementations must be thread-safe (Send + Sync).
///
/// # Example
/// ```ignore
/// struct MyProvider { /* ... */ }
///
/// #[async_trait]
/// impl MetadataProvider for MyProvider {
///     async fn fetch_header(&self, accession: &Accession) -> GeodexResult<DatasetHeader> {
///         // Call the metadata service
///     }
/// }
/// ```
#[async_trait]
pub trait MetadataProvider: Send + Sync {
    /// Fetch the header fields for a dataset.
    ///
    /// # Returns
    /// * `Ok(DatasetHeader)` - the header, possibly with sparse fields
    /// * `Err(GeodexError::Discovery)` - if the provider call fails
    async fn fetch_header(&self, accession: &Accession) -> GeodexResult<DatasetHeader>;
}

/// Trait for linked-sample discovery providers.
/// Implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait SampleDiscovery: Send + Sync {
    /// Discover samples linked to a dataset.
    ///
    /// # Arguments
    /// * `accession` - the dataset the samples belong to
    /// * `header` - the already-fetched header, which providers may use to
    ///   narrow the search
    /// * `max_results` - upper bound on returned samples
    ///
    /// # Returns
    /// * `Ok(Vec<SampleRecord>)` - discovered samples, possibly empty
    /// * `Err(GeodexError::Discovery)` - if the provider call fails
    async fn discover_samples(
        &self,
        accession: &Accession,
        header: &DatasetHeader,
        max_results: usize,
    ) -> GeodexResult<Vec<SampleRecord>>;
}

/// Build a `RequestFailed` discovery error.
pub fn request_failed(
    provider: impl Into<String>,
    status: i32,
    message: impl Into<String>,
) -> geodex_core::GeodexError {
    DiscoveryError::RequestFailed {
        provider: provider.into(),
        status,
        message: message.into(),
    }
    .into()
}

/// Build an `InvalidResponse` discovery error.
pub fn invalid_response(
    provider: impl Into<String>,
    reason: impl Into<String>,
) -> geodex_core::GeodexError {
    DiscoveryError::InvalidResponse {
        provider: provider.into(),
        reason: reason.into(),
    }
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use geodex_core::GeodexError;

    #[test]
    fn test_request_failed_builds_discovery_variant() {
        let err = request_failed("entrez", 500, "boom");
        match err {
            GeodexError::Discovery(DiscoveryError::RequestFailed {
                provider, status, ..
            }) => {
                assert_eq!(provider, "entrez");
                assert_eq!(status, 500);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_invalid_response_builds_discovery_variant() {
        let err = invalid_response("entrez", "truncated body");
        assert!(matches!(
            err,
            GeodexError::Discovery(DiscoveryError::InvalidResponse { .. })
        ));
    }
}
