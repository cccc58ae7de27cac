//! What needs downloading before a selection can run

use crate::selections::{Selection, Selections};
use serde::Serialize;
use zi_catalog::PresenceOracle;
use zi_types::pretty_size;

/// Bytes assumed for an implementation whose feed gives no size
pub const UNKNOWN_SIZE_ESTIMATE: u64 = 4096;

/// A selected implementation that is not present locally
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FetchItem<'a> {
    pub selection: &'a Selection,
    /// Declared size, or [`UNKNOWN_SIZE_ESTIMATE`]
    pub expected_size: u64,
}

impl FetchItem<'_> {
    /// Whether `expected_size` is a guess
    #[must_use]
    pub fn is_estimate(&self) -> bool {
        self.selection.implementation.size.is_none()
    }
}

/// Downloads needed for a snapshot, in selection order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FetchPlan<'a> {
    pub items: Vec<FetchItem<'a>>,
    pub total_bytes: u64,
}

impl FetchPlan<'_> {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// One-line description such as `Need to download 2 implementations (1.5 MB)`
    #[must_use]
    pub fn summary(&self) -> String {
        if self.items.is_empty() {
            return "All selected implementations are already cached".to_string();
        }
        let noun = if self.items.len() == 1 {
            "implementation"
        } else {
            "implementations"
        };
        let about = if self.items.iter().any(FetchItem::is_estimate) {
            "about "
        } else {
            ""
        };
        format!(
            "Need to download {} {noun} ({about}{})",
            self.items.len(),
            pretty_size(Some(self.total_bytes))
        )
    }
}

/// Work out which selected implementations must be downloaded
#[must_use]
pub fn derive_fetch_plan<'a>(
    selections: &'a Selections,
    oracle: &dyn PresenceOracle,
) -> FetchPlan<'a> {
    let items: Vec<FetchItem<'a>> = selections
        .all()
        .iter()
        .filter(|selection| !oracle.is_present(&selection.implementation))
        .map(|selection| FetchItem {
            selection,
            expected_size: selection
                .implementation
                .size
                .unwrap_or(UNKNOWN_SIZE_ESTIMATE),
        })
        .collect();

    let total_bytes = items
        .iter()
        .map(|item| item.expected_size)
        .fold(0, u64::saturating_add);
    FetchPlan { items, total_bytes }
}
