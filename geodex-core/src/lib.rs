//! GEODEX Core - Entity Types
//!
//! Pure data structures with no behavior. All other crates depend on this.
//! This crate contains ONLY data types, validation, and configuration -
//! no caching or discovery logic.

pub mod accession;
pub mod config;
pub mod envelope;
pub mod error;
pub mod record;

pub use accession::{Accession, SampleAccession};
pub use config::{CacheConfig, RetryPolicy};
pub use envelope::{CacheSource, CachedRecord};
pub use error::{
    DiscoveryError, GeodexError, GeodexResult, StorageError, TransportError, ValidationError,
};
pub use record::{
    AttemptStatus, DatasetHeader, DatasetRecord, EnrichmentMetadata, FetchAttempt, SampleRecord,
};

use chrono::{DateTime, Utc};

/// Timestamp type using UTC timezone.
pub type Timestamp = DateTime<Utc>;
