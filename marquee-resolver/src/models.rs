//! Resolved movie metadata model

use chrono::{DateTime, Utc};
use marquee_common::{Error, Result};
use serde::{Deserialize, Serialize};

/// Current metadata blob schema version
pub const METADATA_VERSION: u32 = 1;

/// Base URL for reciprocal IMDb links
pub const IMDB_URL_BASE: &str = "https://www.imdb.com/title/tt";

/// Versioned, engine-neutral record of full provider metadata.
///
/// Stored as JSON text in `movies.metadata`. The resolver never interprets
/// it except for runtime extraction and link building.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieMetadata {
    /// Blob schema version (currently 1)
    pub version: u32,
    /// IMDb identifier digits (no "tt" prefix)
    pub imdb_id: String,
    /// Long-form provider title, e.g. "Toy Story (1995)"
    pub long_title: String,
    /// Runtime in minutes; absent when the provider record has none
    pub runtime_minutes: Option<u32>,
    /// When this record was fetched from the provider
    pub fetched_at: DateTime<Utc>,
}

impl MovieMetadata {
    /// Reciprocal IMDb link for this record
    pub fn imdb_url(&self) -> String {
        format!("{}{}", IMDB_URL_BASE, self.imdb_id)
    }

    /// Serialize for storage in the catalog
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| Error::Metadata(e.to_string()))
    }

    /// Deserialize a stored blob
    pub fn from_json(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).map_err(|e| Error::Metadata(e.to_string()))
    }
}
