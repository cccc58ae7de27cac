//! Why a solve failed

use crate::restrictions::Restriction;
use serde::Serialize;
use std::fmt;
use thiserror::Error;
use zi_errors::SolveError;
use zi_types::{Arch, InterfaceUri, Version, VersionRange};

/// Why an implementation was not selected
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum RejectReason {
    /// Built for an OS or CPU the policy does not allow
    IncompatibleArch { arch: Arch },
    /// Not in the cache and the network may not be used
    NotCachedOffline,
    /// Rated insecure; never selected
    Insecure,
    /// Outside the accumulated version restriction
    OutsideRange { restriction: String },
    /// Lacks a command that was requested on this interface
    MissingCommand { command: String },
    /// A selected implementation lists this interface as a conflict
    ForbiddenBy { implementation: String },
    /// Declares a conflict with an interface that is already selected
    ConflictsWith { interface: InterfaceUri },
    /// Restricts an already selected interface to versions that exclude
    /// its selection
    ExcludesSelected {
        interface: InterfaceUri,
        range: VersionRange,
    },
    /// Needs a command that the selected implementation of a dependency
    /// does not provide
    DependencyLacksCommand {
        interface: InterfaceUri,
        command: String,
    },
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IncompatibleArch { arch } => write!(f, "incompatible architecture {arch}"),
            Self::NotCachedOffline => write!(f, "not cached and network use is off-line"),
            Self::Insecure => write!(f, "insecure"),
            Self::OutsideRange { restriction } => write!(f, "version not in {restriction}"),
            Self::MissingCommand { command } => write!(f, "no '{command}' command"),
            Self::ForbiddenBy { implementation } => {
                write!(f, "conflicts with selected implementation {implementation}")
            }
            Self::ConflictsWith { interface } => write!(f, "conflicts with {interface}"),
            Self::ExcludesSelected { interface, range } => {
                write!(f, "requires {interface} {range}, which excludes its selection")
            }
            Self::DependencyLacksCommand { interface, command } => {
                write!(f, "requires command '{command}' missing from selected {interface}")
            }
        }
    }
}

/// One implementation that was ruled out
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rejection {
    pub id: String,
    pub version: Version,
    pub reason: RejectReason,
}

/// An interface for which no implementation could be chosen
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Conflict {
    pub interface: InterfaceUri,
    /// Accumulated version restriction at the time of the failure
    pub restriction: Option<Restriction>,
    pub rejected: Vec<Rejection>,
    /// The catalog has no implementations at all for the interface
    pub missing: bool,
}

impl fmt::Display for Conflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.interface)?;
        if self.missing {
            return write!(f, ": no known implementations");
        }
        if let Some(restriction) = &self.restriction {
            write!(f, " (restricted to {restriction})")?;
        }
        for rejection in &self.rejected {
            write!(
                f,
                "\n    {} ({}): {}",
                rejection.id, rejection.version, rejection.reason
            )?;
        }
        Ok(())
    }
}

/// No assignment satisfies every constraint
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("no usable selection exists:{}", render_conflicts(.conflicts))]
pub struct UnsatisfiableError {
    pub conflicts: Vec<Conflict>,
}

impl UnsatisfiableError {
    /// First conflict recorded for `interface`
    #[must_use]
    pub fn conflict(&self, interface: &str) -> Option<&Conflict> {
        self.conflicts_for(interface).next()
    }

    /// Every distinct conflict recorded for `interface`, oldest first
    pub fn conflicts_for<'a, 'b>(&'a self, interface: &'b str) -> impl Iterator<Item = &'a Conflict> + use<'a, 'b> {
        self.conflicts
            .iter()
            .filter(move |conflict| conflict.interface.as_str() == interface)
    }
}

fn render_conflicts(conflicts: &[Conflict]) -> String {
    conflicts
        .iter()
        .map(|conflict| format!("\n  {conflict}"))
        .collect()
}

/// The root or an essential dependency has no implementations in the catalog
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("no implementations known for: {}", join(.interfaces))]
pub struct MissingInterfaceError {
    pub interfaces: Vec<InterfaceUri>,
}

fn join(interfaces: &[InterfaceUri]) -> String {
    interfaces
        .iter()
        .map(InterfaceUri::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

/// A failed solve
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SolveFailure {
    #[error(transparent)]
    Unsatisfiable(#[from] UnsatisfiableError),
    #[error(transparent)]
    MissingInterface(#[from] MissingInterfaceError),
}

impl SolveFailure {
    /// Interfaces named by the failure, each once
    #[must_use]
    pub fn interfaces(&self) -> Vec<&InterfaceUri> {
        let named: Vec<&InterfaceUri> = match self {
            Self::Unsatisfiable(err) => err.conflicts.iter().map(|c| &c.interface).collect(),
            Self::MissingInterface(err) => err.interfaces.iter().collect(),
        };
        let mut interfaces = Vec::with_capacity(named.len());
        for interface in named {
            if !interfaces.contains(&interface) {
                interfaces.push(interface);
            }
        }
        interfaces
    }
}

impl From<SolveFailure> for zi_errors::Error {
    fn from(failure: SolveFailure) -> Self {
        let interfaces = failure
            .interfaces()
            .into_iter()
            .map(ToString::to_string)
            .collect();
        let err = match failure {
            SolveFailure::Unsatisfiable(err) => SolveError::Unsatisfiable {
                interfaces,
                message: render_conflicts(&err.conflicts).trim_start().to_string(),
            },
            SolveFailure::MissingInterface(_) => SolveError::MissingInterface { interfaces },
        };
        err.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_interface_display() {
        let failure = SolveFailure::from(MissingInterfaceError {
            interfaces: vec![InterfaceUri::new("http://example.com/gone")],
        });
        assert_eq!(
            failure.to_string(),
            "no implementations known for: http://example.com/gone"
        );

        let err: zi_errors::Error = failure.into();
        assert!(matches!(
            err,
            zi_errors::Error::Solve(SolveError::MissingInterface { .. })
        ));
    }

    #[test]
    fn test_unsatisfiable_display_lists_rejections() {
        let error = UnsatisfiableError {
            conflicts: vec![Conflict {
                interface: InterfaceUri::new("http://example.com/lib"),
                restriction: None,
                rejected: vec![Rejection {
                    id: "sha256=old".into(),
                    version: Version::parse("0.9").unwrap(),
                    reason: RejectReason::OutsideRange {
                        restriction: "1.0..!2.0".into(),
                    },
                }],
                missing: false,
            }],
        };
        let text = error.to_string();
        assert!(text.contains("http://example.com/lib"));
        assert!(text.contains("sha256=old (0.9): version not in 1.0..!2.0"));
        assert!(error.conflict("http://example.com/lib").is_some());
    }

    #[test]
    fn test_interfaces_are_named_once() {
        let conflict = |restriction: &str| Conflict {
            interface: InterfaceUri::new("http://example.com/lib"),
            restriction: None,
            rejected: vec![Rejection {
                id: "sha256=lib".into(),
                version: Version::parse("1.0").unwrap(),
                reason: RejectReason::OutsideRange {
                    restriction: restriction.into(),
                },
            }],
            missing: false,
        };
        let failure = SolveFailure::from(UnsatisfiableError {
            conflicts: vec![conflict("3.0.."), conflict("5.0..")],
        });
        assert_eq!(failure.interfaces().len(), 1);

        let SolveFailure::Unsatisfiable(error) = &failure else {
            panic!("expected unsatisfiable");
        };
        assert_eq!(error.conflicts_for("http://example.com/lib").count(), 2);
        let text = failure.to_string();
        assert!(text.contains("version not in 3.0.."));
        assert!(text.contains("version not in 5.0.."));
    }
}
