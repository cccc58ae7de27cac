#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Core type definitions for zi
//!
//! This crate holds the values every other crate passes around: the Zero
//! Install version model, the parsed feed data model (interfaces, feeds,
//! implementations, dependencies, bindings, commands) and the selection
//! policy.

pub mod arch;
pub mod model;
pub mod policy;
pub mod size;
pub mod stability;
pub mod version;

// Re-export commonly used types
pub use arch::Arch;
pub use model::{
    Binding, Command, Dependency, EnvironmentMode, Feed, Implementation, Importance,
    InterfaceUri, DEFAULT_COMMAND,
};
pub use policy::{ArchPolicy, NetworkUse, Policy};
pub use size::pretty_size;
pub use stability::Stability;
pub use version::{Version, VersionRange};
