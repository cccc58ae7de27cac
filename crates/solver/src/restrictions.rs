//! Per-interface version restriction accumulator

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use zi_types::{InterfaceUri, Version, VersionRange};

/// Every range seen on edges into one interface, and their intersection
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Restriction {
    ranges: Vec<VersionRange>,
    /// `None` once the ranges no longer overlap
    combined: Option<VersionRange>,
}

impl Restriction {
    fn new(range: VersionRange) -> Self {
        Self {
            ranges: vec![range.clone()],
            combined: Some(range),
        }
    }

    fn add(&mut self, range: &VersionRange) {
        if self.ranges.contains(range) {
            return;
        }
        self.ranges.push(range.clone());
        self.combined = self
            .combined
            .as_ref()
            .and_then(|combined| combined.intersect(range));
    }

    /// Ranges in the order they were added
    #[must_use]
    pub fn ranges(&self) -> &[VersionRange] {
        &self.ranges
    }

    /// Intersection of all ranges, `None` if it is empty
    #[must_use]
    pub fn combined(&self) -> Option<&VersionRange> {
        self.combined.as_ref()
    }

    /// Whether no version can satisfy every range
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.combined.is_none()
    }

    #[must_use]
    pub fn permits(&self, version: &Version) -> bool {
        self.combined
            .as_ref()
            .is_some_and(|range| range.contains(version))
    }
}

impl fmt::Display for Restriction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(range) = &self.combined {
            return write!(f, "{range}");
        }
        let ranges: Vec<String> = self.ranges.iter().map(ToString::to_string).collect();
        write!(f, "no version in all of {}", ranges.join(", "))
    }
}

/// Restrictions keyed by interface
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Restrictions {
    by_interface: BTreeMap<InterfaceUri, Restriction>,
}

impl Restrictions {
    pub(crate) fn add(&mut self, interface: &InterfaceUri, range: &VersionRange) {
        match self.by_interface.get_mut(interface) {
            Some(restriction) => restriction.add(range),
            None => {
                self.by_interface
                    .insert(interface.clone(), Restriction::new(range.clone()));
            }
        }
    }

    pub(crate) fn get(&self, interface: &str) -> Option<&Restriction> {
        self.by_interface.get(interface)
    }

    /// Unrestricted interfaces permit every version
    pub(crate) fn permits(&self, interface: &str, version: &Version) -> bool {
        self.get(interface)
            .is_none_or(|restriction| restriction.permits(version))
    }
}
