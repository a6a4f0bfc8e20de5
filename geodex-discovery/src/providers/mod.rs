//! Discovery provider implementations
//!
//! Concrete implementations of the MetadataProvider and SampleDiscovery
//! traits for external metadata services.

pub mod entrez;

pub use entrez::EntrezProvider;
