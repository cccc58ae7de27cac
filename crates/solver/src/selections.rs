//! The result of a successful solve

use serde::{Deserialize, Serialize};
use std::fmt;
use zi_errors::{Error, FeedError};
use zi_types::{Implementation, InterfaceUri, Version};

/// The implementation chosen for one interface
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub interface: InterfaceUri,
    /// Feed the implementation was found in
    pub feed: String,
    pub implementation: Implementation,
    /// Commands requested on this implementation, in request order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub commands: Vec<String>,
}

impl Selection {
    #[must_use]
    pub fn id(&self) -> &str {
        &self.implementation.id
    }

    #[must_use]
    pub fn version(&self) -> &Version {
        &self.implementation.version
    }
}

/// One interface per entry, in the order the solver discovered them
///
/// Produced whole by one solve and never modified afterwards; a re-solve
/// produces a new value, compared with the old one via
/// [`changes_from`](Self::changes_from).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selections {
    interface: InterfaceUri,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    command: Option<String>,
    selections: Vec<Selection>,
}

impl Selections {
    pub(crate) fn new(
        interface: InterfaceUri,
        command: Option<String>,
        selections: Vec<Selection>,
    ) -> Self {
        Self {
            interface,
            command,
            selections,
        }
    }

    /// Parse a saved snapshot
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed.
    pub fn from_json(json: &str) -> Result<Self, Error> {
        serde_json::from_str(json).map_err(|e| {
            FeedError::InvalidFormat {
                message: format!("invalid selections JSON: {e}"),
            }
            .into()
        })
    }

    /// Root interface
    #[must_use]
    pub fn root(&self) -> &InterfaceUri {
        &self.interface
    }

    /// Command requested on the root, if any
    #[must_use]
    pub fn command(&self) -> Option<&str> {
        self.command.as_deref()
    }

    #[must_use]
    pub fn get(&self, interface: &str) -> Option<&Selection> {
        self.selections
            .iter()
            .find(|selection| selection.interface.as_str() == interface)
    }

    /// All selections in discovery order, root first
    #[must_use]
    pub fn all(&self) -> &[Selection] {
        &self.selections
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.selections.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.selections.is_empty()
    }

    /// What differs between `previous` and this snapshot
    ///
    /// Interfaces present in both are reported when the chosen implementation
    /// changed. Added and changed entries follow this snapshot's order;
    /// removed entries follow `previous`.
    #[must_use]
    pub fn changes_from(&self, previous: &Selections) -> Vec<SelectionChange> {
        let mut changes = Vec::new();

        for selection in &self.selections {
            match previous.get(selection.interface.as_str()) {
                None => changes.push(SelectionChange::Added {
                    interface: selection.interface.clone(),
                    version: selection.version().clone(),
                }),
                Some(old) if old.id() != selection.id() => {
                    changes.push(SelectionChange::Changed {
                        interface: selection.interface.clone(),
                        from: old.version().clone(),
                        to: selection.version().clone(),
                    });
                }
                Some(_) => {}
            }
        }

        for old in &previous.selections {
            if self.get(old.interface.as_str()).is_none() {
                changes.push(SelectionChange::Removed {
                    interface: old.interface.clone(),
                    version: old.version().clone(),
                });
            }
        }

        changes
    }
}

/// A difference between two snapshots
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "change", rename_all = "lowercase")]
pub enum SelectionChange {
    Added {
        interface: InterfaceUri,
        version: Version,
    },
    Removed {
        interface: InterfaceUri,
        version: Version,
    },
    /// A different implementation was chosen (possibly with the same version)
    Changed {
        interface: InterfaceUri,
        from: Version,
        to: Version,
    },
}

impl fmt::Display for SelectionChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Added { interface, version } => write!(f, "{interface}: new -> {version}"),
            Self::Removed { interface, version } => write!(f, "{interface}: {version} -> none"),
            Self::Changed {
                interface,
                from,
                to,
            } => write!(f, "{interface}: {from} -> {to}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn selection(interface: &str, id: &str, version: &str) -> Selection {
        Selection {
            interface: InterfaceUri::new(interface),
            feed: interface.to_string(),
            implementation: Implementation::new(id, Version::parse(version).unwrap()),
            commands: Vec::new(),
        }
    }

    #[test]
    fn test_lookup_and_order() {
        let selections = Selections::new(
            InterfaceUri::new("app"),
            Some("run".into()),
            vec![selection("app", "a1", "1.0"), selection("lib", "l1", "2.0")],
        );
        assert_eq!(selections.root().as_str(), "app");
        assert_eq!(selections.command(), Some("run"));
        assert_eq!(selections.get("lib").unwrap().id(), "l1");
        assert!(selections.get("other").is_none());
        assert_eq!(selections.all()[0].interface.as_str(), "app");
    }

    #[test]
    fn test_changes_from() {
        let old = Selections::new(
            InterfaceUri::new("app"),
            None,
            vec![
                selection("app", "a1", "1.0"),
                selection("lib", "l1", "2.0"),
                selection("gone", "g1", "0.1"),
            ],
        );
        let new = Selections::new(
            InterfaceUri::new("app"),
            None,
            vec![
                selection("app", "a1", "1.0"),
                selection("lib", "l2", "2.1"),
                selection("extra", "e1", "3.0"),
            ],
        );

        let changes = new.changes_from(&old);
        assert_eq!(changes.len(), 3);
        assert_eq!(changes[0].to_string(), "lib: 2.0 -> 2.1");
        assert_eq!(changes[1].to_string(), "extra: new -> 3.0");
        assert_eq!(changes[2].to_string(), "gone: 0.1 -> none");
        assert!(new.changes_from(&new).is_empty());
    }

    #[test]
    fn test_json_round_trip() {
        let selections = Selections::new(
            InterfaceUri::new("app"),
            Some("run".into()),
            vec![selection("app", "a1", "1.0")],
        );
        let json = serde_json::to_string(&selections).unwrap();
        assert_eq!(Selections::from_json(&json).unwrap(), selections);
        assert!(Selections::from_json("{").is_err());
    }
}
