//! Driver version parsing
//!
//! Splits a raw driver version such as `1.3.73-release+git.1f2e` into the
//! semantic-version part and the vendor revision suffix.

use crate::error::{FeatureDiscoveryError, Result};
use std::str::FromStr;

/// Characters that end the semantic-version part of a driver version
const REVISION_SEPARATORS: [char; 3] = ['-', '+', '~'];

/// Parsed driver version
///
/// Components are kept as strings; non-numeric schemes pass through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverVersion {
    /// Semantic-version part, e.g. `1.3.73`
    pub full: String,
    /// First dot component
    pub major: String,
    /// Second dot component
    pub minor: String,
    /// Third dot component
    pub patch: String,
    /// Everything after the first separator, verbatim
    pub revision: Option<String>,
}

impl DriverVersion {
    /// Parse a raw version string
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();

        let (full, revision) = match trimmed.find(REVISION_SEPARATORS) {
            Some(idx) => (&trimmed[..idx], Some(&trimmed[idx + 1..])),
            None => (trimmed, None),
        };

        let mut parts = full.split('.');
        let (Some(major), Some(minor), Some(patch)) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(FeatureDiscoveryError::MalformedVersion(trimmed.to_string()));
        };

        Ok(Self {
            full: full.to_string(),
            major: major.to_string(),
            minor: minor.to_string(),
            patch: patch.to_string(),
            revision: revision.map(str::to_string),
        })
    }
}

impl FromStr for DriverVersion {
    type Err = FeatureDiscoveryError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
