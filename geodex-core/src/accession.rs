//! Accession identifiers for dataset and sample records.
//!
//! An accession can ONLY be constructed through validation. Code holding an
//! [`Accession`] never needs to re-check its format - malformed ids are
//! rejected at the boundary, including deserialization.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

use crate::error::ValidationError;

static SERIES_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^GSE[0-9]{1,9}$").expect("series accession regex is valid"));

static SAMPLE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^GSM[0-9]{1,9}$").expect("sample accession regex is valid"));

/// Format-validated identifier of a dataset record (`GSE` series accession).
///
/// Immutable post-creation: there is no mutable access to the inner string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Accession(String);

impl Accession {
    /// Parse and validate a series accession.
    ///
    /// # Returns
    /// * `Ok(Accession)` - the validated id
    /// * `Err(ValidationError::InvalidAccession)` - if the format is wrong
    pub fn parse(value: impl AsRef<str>) -> Result<Self, ValidationError> {
        let value = value.as_ref().trim();
        if SERIES_RE.is_match(value) {
            Ok(Self(value.to_string()))
        } else {
            Err(ValidationError::InvalidAccession {
                value: value.to_string(),
            })
        }
    }

    /// The accession as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Accession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Accession {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for Accession {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Accession::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// Format-validated identifier of a linked sample record (`GSM` accession).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct SampleAccession(String);

impl SampleAccession {
    /// Parse and validate a sample accession.
    pub fn parse(value: impl AsRef<str>) -> Result<Self, ValidationError> {
        let value = value.as_ref().trim();
        if SAMPLE_RE.is_match(value) {
            Ok(Self(value.to_string()))
        } else {
            Err(ValidationError::InvalidAccession {
                value: value.to_string(),
            })
        }
    }

    /// The accession as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SampleAccession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for SampleAccession {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for SampleAccession {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        SampleAccession::parse(&raw).map_err(serde::de::Error::custom)
    }
}
