//! Catalog document model

use crate::{Catalog, PresenceOracle};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use zi_errors::{Error, FeedError};
use zi_types::Feed;

/// Supported catalog document format version
pub const SUPPORTED_CATALOG_VERSION: u32 = 1;

/// A set of parsed feeds as stored on disk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogDocument {
    #[serde(default = "default_version")]
    pub version: u32,
    /// When the feeds were last fetched
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub feeds: Vec<Feed>,
}

fn default_version() -> u32 {
    SUPPORTED_CATALOG_VERSION
}

impl Default for CatalogDocument {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl CatalogDocument {
    /// Create a document stamped with the current time
    #[must_use]
    pub fn new(feeds: Vec<Feed>) -> Self {
        Self {
            version: SUPPORTED_CATALOG_VERSION,
            timestamp: Some(Utc::now()),
            feeds,
        }
    }

    /// Parse a document from JSON
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or does not describe feeds.
    pub fn from_json(json: &str) -> Result<Self, Error> {
        serde_json::from_str(json).map_err(|e| {
            FeedError::InvalidFormat {
                message: format!("invalid catalog JSON: {e}"),
            }
            .into()
        })
    }

    /// Serialize the document to JSON
    ///
    /// # Errors
    ///
    /// Returns an error if the document cannot be serialized.
    pub fn to_json(&self) -> Result<String, Error> {
        serde_json::to_string_pretty(self).map_err(|e| {
            FeedError::InvalidFormat {
                message: format!("failed to serialize catalog: {e}"),
            }
            .into()
        })
    }

    /// Validate format version and every feed
    ///
    /// # Errors
    ///
    /// Returns an error if the format version is newer than supported or a
    /// feed is malformed (empty URL, duplicate implementation ids).
    pub fn validate(&self) -> Result<(), Error> {
        if self.version > SUPPORTED_CATALOG_VERSION {
            return Err(FeedError::InvalidFormat {
                message: format!(
                    "catalog version {} is newer than supported version {}",
                    self.version, SUPPORTED_CATALOG_VERSION
                ),
            }
            .into());
        }

        for feed in &self.feeds {
            feed.validate()?;
        }
        Ok(())
    }

    /// Total number of implementations across all feeds
    #[must_use]
    pub fn implementation_count(&self) -> usize {
        self.feeds.iter().map(|feed| feed.implementations.len()).sum()
    }

    /// Build a catalog, registering each feed under its own URL and under
    /// every interface it declares itself a feed for
    #[must_use]
    pub fn into_catalog(self, oracle: impl PresenceOracle + 'static) -> Catalog {
        let mut catalog = Catalog::new(oracle);
        for feed in self.feeds {
            let feed = std::sync::Arc::new(feed);
            for interface in feed.interfaces() {
                catalog.register_feed(interface, feed.clone());
            }
        }
        catalog
    }
}
