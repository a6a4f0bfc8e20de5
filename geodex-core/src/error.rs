//! Error types for geodex operations

use thiserror::Error;

/// Fast-tier transport errors.
///
/// These are always recovered locally (fallback tier, sentinel returns) and
/// never surfaced to callers of the cache API.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("Fast tier unreachable: {reason}")]
    Unreachable { reason: String },

    #[error("Fast tier operation timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },
}

/// Durable store errors.
///
/// Absence is NOT an error: lookups return `Ok(None)` for missing records.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StorageError {
    #[error("Upsert failed for {accession}: {reason}")]
    UpsertFailed { accession: String, reason: String },

    #[error("Query failed for {accession}: {reason}")]
    QueryFailed { accession: String, reason: String },

    #[error("Storage lock poisoned")]
    LockPoisoned,
}

/// Discovery provider errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DiscoveryError {
    #[error("Request to {provider} failed with status {status}: {message}")]
    RequestFailed {
        provider: String,
        status: i32,
        message: String,
    },

    #[error("Invalid response from {provider}: {reason}")]
    InvalidResponse { provider: String, reason: String },

    #[error("Discovery call to {provider} timed out")]
    Timeout { provider: String },
}

/// Validation errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Invalid accession: {value:?}")]
    InvalidAccession { value: String },

    #[error("Empty payload for {field}")]
    EmptyPayload { field: String },
}

/// Master error type for all geodex errors.
#[derive(Debug, Clone, Error)]
pub enum GeodexError {
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Discovery error: {0}")]
    Discovery(#[from] DiscoveryError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

/// Result type alias for geodex operations.
pub type GeodexResult<T> = Result<T, GeodexError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_error_display() {
        let err = TransportError::Timeout { timeout_ms: 2000 };
        let msg = format!("{}", err);
        assert!(msg.contains("timed out"));
        assert!(msg.contains("2000"));
    }

    #[test]
    fn test_storage_error_display_upsert_failed() {
        let err = StorageError::UpsertFailed {
            accession: "GSE1".to_string(),
            reason: "connection reset".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("GSE1"));
        assert!(msg.contains("connection reset"));
    }

    #[test]
    fn test_discovery_error_display_request_failed() {
        let err = DiscoveryError::RequestFailed {
            provider: "entrez".to_string(),
            status: 503,
            message: "unavailable".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("entrez"));
        assert!(msg.contains("503"));
        assert!(msg.contains("unavailable"));
    }

    #[test]
    fn test_validation_error_display_invalid_accession() {
        let err = ValidationError::InvalidAccession {
            value: "bogus".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("Invalid accession"));
        assert!(msg.contains("bogus"));
    }

    #[test]
    fn test_geodex_error_from_variants() {
        let transport = GeodexError::from(TransportError::Unreachable {
            reason: "refused".to_string(),
        });
        assert!(matches!(transport, GeodexError::Transport(_)));

        let storage = GeodexError::from(StorageError::LockPoisoned);
        assert!(matches!(storage, GeodexError::Storage(_)));

        let discovery = GeodexError::from(DiscoveryError::Timeout {
            provider: "entrez".to_string(),
        });
        assert!(matches!(discovery, GeodexError::Discovery(_)));

        let validation = GeodexError::from(ValidationError::EmptyPayload {
            field: "header".to_string(),
        });
        assert!(matches!(validation, GeodexError::Validation(_)));
    }
}
