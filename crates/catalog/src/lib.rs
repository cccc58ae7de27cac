#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Feed catalog for zi
//!
//! The catalog maps interface URIs to the feeds registered for them and
//! answers "which implementations exist for this interface?" for the solver.
//! It does no network I/O and no parsing; feeds arrive already parsed, either
//! registered directly or loaded from a JSON catalog file.

mod file;
mod models;
mod oracle;

pub use file::CatalogFile;
pub use models::{CatalogDocument, SUPPORTED_CATALOG_VERSION};
pub use oracle::{CachedSet, PresenceOracle, StoreOracle};

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;
use zi_types::{Feed, Implementation, InterfaceUri};

/// One implementation offered for an interface, with the feed it came from
#[derive(Debug, Clone, Copy)]
pub struct Candidate<'a> {
    pub feed: &'a str,
    pub implementation: &'a Implementation,
}

/// Registered feeds plus the local presence oracle
///
/// Built once, then shared read-only with any number of solves.
#[derive(Clone)]
pub struct Catalog {
    interfaces: BTreeMap<InterfaceUri, Vec<Arc<Feed>>>,
    oracle: Arc<dyn PresenceOracle>,
}

impl Catalog {
    /// Create an empty catalog using `oracle` for presence checks
    pub fn new(oracle: impl PresenceOracle + 'static) -> Self {
        Self {
            interfaces: BTreeMap::new(),
            oracle: Arc::new(oracle),
        }
    }

    /// Register `feed` as a source of implementations for `interface`
    ///
    /// Registering a feed whose URL is already present for the interface
    /// replaces it in place, keeping its position.
    pub fn register_feed(&mut self, interface: impl Into<InterfaceUri>, feed: impl Into<Arc<Feed>>) {
        let interface = interface.into();
        let feed = feed.into();
        let feeds = self.interfaces.entry(interface.clone()).or_default();

        if let Some(existing) = feeds.iter_mut().find(|existing| existing.url == feed.url) {
            debug!(interface = %interface, feed = %feed.url, "replacing feed");
            *existing = feed;
        } else {
            debug!(
                interface = %interface,
                feed = %feed.url,
                implementations = feed.implementations.len(),
                "registering feed"
            );
            feeds.push(feed);
        }
    }

    /// All implementations for `interface`, in feed registration order and
    /// then document order
    #[must_use]
    pub fn implementations_for(&self, interface: &str) -> Vec<Candidate<'_>> {
        self.feeds_for(interface)
            .iter()
            .flat_map(|feed| {
                feed.implementations.iter().map(|implementation| Candidate {
                    feed: feed.url.as_str(),
                    implementation,
                })
            })
            .collect()
    }

    /// Feeds registered for `interface`
    #[must_use]
    pub fn feeds_for(&self, interface: &str) -> &[Arc<Feed>] {
        self.interfaces
            .get(interface)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Interfaces with at least one registered feed
    pub fn interfaces(&self) -> impl Iterator<Item = &InterfaceUri> {
        self.interfaces.keys()
    }

    /// Whether `implementation` is available without downloading
    #[must_use]
    pub fn is_cached(&self, implementation: &Implementation) -> bool {
        self.oracle.is_present(implementation)
    }

    /// The presence oracle this catalog consults
    #[must_use]
    pub fn oracle(&self) -> &dyn PresenceOracle {
        self.oracle.as_ref()
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new(CachedSet::new())
    }
}

impl fmt::Debug for Catalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Catalog")
            .field("interfaces", &self.interfaces.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}
