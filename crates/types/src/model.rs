//! Feed data model
//!
//! Feeds arrive already parsed and trusted; these types are the in-memory
//! form the catalog stores and the solver reads.

use crate::{Arch, Stability, Version, VersionRange};
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::path::PathBuf;
use zi_errors::FeedError;

/// Command requested when nothing else is named
pub const DEFAULT_COMMAND: &str = "run";

/// URI identifying an interface
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InterfaceUri(String);

impl InterfaceUri {
    #[must_use]
    pub fn new(uri: impl Into<String>) -> Self {
        Self(uri.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InterfaceUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for InterfaceUri {
    fn from(uri: &str) -> Self {
        Self::new(uri)
    }
}

impl From<String> for InterfaceUri {
    fn from(uri: String) -> Self {
        Self(uri)
    }
}

impl Borrow<str> for InterfaceUri {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// How strongly a dependency is needed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Importance {
    /// Selection fails if this cannot be satisfied
    #[default]
    Essential,
    /// Selected when possible, silently dropped otherwise
    Recommended,
    /// Never pulls the interface in; only constrains its version if
    /// something else selects it
    Restricts,
}

/// How an environment binding combines with an existing value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnvironmentMode {
    #[default]
    Prepend,
    Append,
    Replace,
}

/// Tells a program where to find a selected implementation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Binding {
    /// Set an environment variable to a path inside the implementation
    Environment {
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        insert: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        value: Option<String>,
        #[serde(default)]
        mode: EnvironmentMode,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        separator: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        default: Option<String>,
    },
    /// Put the path of an executable command in a variable
    ExecutableInVar {
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        command: Option<String>,
    },
    /// Put an executable command on `$PATH` under `name`
    ExecutableInPath {
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        command: Option<String>,
    },
}

impl Binding {
    /// Environment binding inserting `insert` into `name`
    #[must_use]
    pub fn environment(name: impl Into<String>, insert: impl Into<String>) -> Self {
        Self::Environment {
            name: name.into(),
            insert: Some(insert.into()),
            value: None,
            mode: EnvironmentMode::default(),
            separator: None,
            default: None,
        }
    }

    /// Executable binding exposing `command` (default `run`) in a variable
    #[must_use]
    pub fn executable_in_var(name: impl Into<String>, command: Option<&str>) -> Self {
        Self::ExecutableInVar {
            name: name.into(),
            command: command.map(str::to_string),
        }
    }

    /// Executable binding exposing `command` (default `run`) on the path
    #[must_use]
    pub fn executable_in_path(name: impl Into<String>, command: Option<&str>) -> Self {
        Self::ExecutableInPath {
            name: name.into(),
            command: command.map(str::to_string),
        }
    }

    /// Command the bound implementation must provide, if any
    #[must_use]
    pub fn required_command(&self) -> Option<&str> {
        match self {
            Self::Environment { .. } => None,
            Self::ExecutableInVar { command, .. } | Self::ExecutableInPath { command, .. } => {
                Some(command.as_deref().unwrap_or(DEFAULT_COMMAND))
            }
        }
    }
}

/// An edge from an implementation or command to another interface
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    pub interface: InterfaceUri,
    #[serde(default)]
    pub importance: Importance,
    /// Acceptable versions, `[min, max)`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<VersionRange>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub bindings: Vec<Binding>,
}

impl Dependency {
    #[must_use]
    pub fn new(interface: impl Into<InterfaceUri>, importance: Importance) -> Self {
        Self {
            interface: interface.into(),
            importance,
            version: None,
            bindings: Vec::new(),
        }
    }

    #[must_use]
    pub fn essential(interface: impl Into<InterfaceUri>) -> Self {
        Self::new(interface, Importance::Essential)
    }

    #[must_use]
    pub fn recommended(interface: impl Into<InterfaceUri>) -> Self {
        Self::new(interface, Importance::Recommended)
    }

    #[must_use]
    pub fn restricts(interface: impl Into<InterfaceUri>) -> Self {
        Self::new(interface, Importance::Restricts)
    }

    #[must_use]
    pub fn with_range(mut self, range: VersionRange) -> Self {
        self.version = Some(range);
        self
    }

    #[must_use]
    pub fn with_binding(mut self, binding: Binding) -> Self {
        self.bindings.push(binding);
        self
    }

    /// Commands this edge needs on the target, deduplicated, in binding order
    #[must_use]
    pub fn required_commands(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.bindings
            .iter()
            .filter_map(Binding::required_command)
            .filter(|command| seen.insert(*command))
            .collect()
    }
}

/// A named way of running an implementation
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Command {
    /// Executable path relative to the implementation root
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
    /// Extra dependencies needed only when this command is used
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub requires: Vec<Dependency>,
    /// Interface whose `run` command executes this one (e.g. an interpreter)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runner: Option<Dependency>,
}

impl Command {
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: Some(path.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn requires(mut self, dependency: Dependency) -> Self {
        self.requires.push(dependency);
        self
    }

    #[must_use]
    pub fn with_runner(mut self, runner: Dependency) -> Self {
        self.runner = Some(runner);
        self
    }
}

/// One concrete, downloadable (or already present) version of an interface
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Implementation {
    /// Content digest, also the directory name in the store
    pub id: String,
    pub version: Version,
    #[serde(default)]
    pub stability: Stability,
    #[serde(default)]
    pub arch: Arch,
    /// Download size in bytes, if the feed says
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    /// Already on disk at this path; never downloaded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_path: Option<PathBuf>,
    /// Shorthand for a `run` command with this path
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub main: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub requires: Vec<Dependency>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub bindings: Vec<Binding>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub commands: BTreeMap<String, Command>,
    /// Interfaces that must not be selected alongside this implementation
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conflicts: Vec<InterfaceUri>,
}

impl Implementation {
    #[must_use]
    pub fn new(id: impl Into<String>, version: Version) -> Self {
        Self {
            id: id.into(),
            version,
            stability: Stability::default(),
            arch: Arch::any(),
            size: None,
            local_path: None,
            main: None,
            requires: Vec::new(),
            bindings: Vec::new(),
            commands: BTreeMap::new(),
            conflicts: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_stability(mut self, stability: Stability) -> Self {
        self.stability = stability;
        self
    }

    #[must_use]
    pub fn with_arch(mut self, arch: Arch) -> Self {
        self.arch = arch;
        self
    }

    #[must_use]
    pub fn with_size(mut self, size: u64) -> Self {
        self.size = Some(size);
        self
    }

    #[must_use]
    pub fn with_local_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.local_path = Some(path.into());
        self
    }

    #[must_use]
    pub fn with_main(mut self, main: impl Into<String>) -> Self {
        self.main = Some(main.into());
        self
    }

    #[must_use]
    pub fn requires(mut self, dependency: Dependency) -> Self {
        self.requires.push(dependency);
        self
    }

    #[must_use]
    pub fn with_binding(mut self, binding: Binding) -> Self {
        self.bindings.push(binding);
        self
    }

    #[must_use]
    pub fn with_command(mut self, name: impl Into<String>, command: Command) -> Self {
        self.commands.insert(name.into(), command);
        self
    }

    #[must_use]
    pub fn conflicts_with(mut self, interface: impl Into<InterfaceUri>) -> Self {
        self.conflicts.push(interface.into());
        self
    }

    /// Whether the implementation provides the named command
    ///
    /// A `main` path counts as a `run` command with no dependencies.
    #[must_use]
    pub fn has_command(&self, name: &str) -> bool {
        self.commands.contains_key(name) || (name == DEFAULT_COMMAND && self.main.is_some())
    }

    /// Declared command, if any (a bare `main` has no declaration)
    #[must_use]
    pub fn command(&self, name: &str) -> Option<&Command> {
        self.commands.get(name)
    }
}

/// A list of implementations published at one URL
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feed {
    /// Feed URL; also the interface it describes
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Additional interfaces this feed provides implementations for
    #[serde(default, rename = "feed-for", skip_serializing_if = "Vec::is_empty")]
    pub feed_for: Vec<InterfaceUri>,
    #[serde(default)]
    pub implementations: Vec<Implementation>,
}

impl Feed {
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            name: None,
            feed_for: Vec::new(),
            implementations: Vec::new(),
        }
    }

    #[must_use]
    pub fn feed_for(mut self, interface: impl Into<InterfaceUri>) -> Self {
        self.feed_for.push(interface.into());
        self
    }

    #[must_use]
    pub fn with_implementation(mut self, implementation: Implementation) -> Self {
        self.implementations.push(implementation);
        self
    }

    /// Interfaces the feed should be registered under: its own URL first,
    /// then each `feed-for` entry
    #[must_use]
    pub fn interfaces(&self) -> Vec<InterfaceUri> {
        let mut interfaces = vec![InterfaceUri::new(self.url.clone())];
        for uri in &self.feed_for {
            if !interfaces.contains(uri) {
                interfaces.push(uri.clone());
            }
        }
        interfaces
    }

    /// Check structural invariants
    ///
    /// # Errors
    ///
    /// Returns `FeedError::MissingInterface` if the URL is empty and
    /// `FeedError::DuplicateImplementation` if two implementations share an id.
    pub fn validate(&self) -> Result<(), FeedError> {
        if self.url.trim().is_empty() {
            return Err(FeedError::MissingInterface {
                feed: self.name.clone().unwrap_or_default(),
            });
        }

        let mut ids = HashSet::new();
        for implementation in &self.implementations {
            if !ids.insert(implementation.id.as_str()) {
                return Err(FeedError::DuplicateImplementation {
                    feed: self.url.clone(),
                    id: implementation.id.clone(),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> Version {
        Version::parse(s).unwrap()
    }

    #[test]
    fn test_binding_required_command() {
        assert_eq!(Binding::environment("PATH", "bin").required_command(), None);
        assert_eq!(
            Binding::executable_in_var("PYTHON", None).required_command(),
            Some("run")
        );
        assert_eq!(
            Binding::executable_in_path("make-it", Some("compile")).required_command(),
            Some("compile")
        );
    }

    #[test]
    fn test_dependency_required_commands_dedup() {
        let dep = Dependency::essential("http://example.com/python")
            .with_binding(Binding::executable_in_var("PYTHON", None))
            .with_binding(Binding::environment("PYTHONPATH", "lib"))
            .with_binding(Binding::executable_in_path("python", Some("run")));
        assert_eq!(dep.required_commands(), vec!["run"]);
    }

    #[test]
    fn test_main_counts_as_run() {
        let implementation = Implementation::new("sha256=aa", v("1.0")).with_main("bin/app");
        assert!(implementation.has_command("run"));
        assert!(!implementation.has_command("test"));
        assert!(implementation.command("run").is_none());
    }

    #[test]
    fn test_feed_validate_duplicate_ids() {
        let feed = Feed::new("http://example.com/app")
            .with_implementation(Implementation::new("sha256=aa", v("1.0")))
            .with_implementation(Implementation::new("sha256=aa", v("1.1")));
        assert!(matches!(
            feed.validate(),
            Err(FeedError::DuplicateImplementation { .. })
        ));

        assert!(matches!(
            Feed::new(" ").validate(),
            Err(FeedError::MissingInterface { .. })
        ));
    }

    #[test]
    fn test_feed_interfaces() {
        let feed = Feed::new("http://mirror.example.com/app.xml")
            .feed_for("http://example.com/app")
            .feed_for("http://example.com/app");
        let interfaces = feed.interfaces();
        assert_eq!(interfaces.len(), 2);
        assert_eq!(interfaces[1].as_str(), "http://example.com/app");
    }

    #[test]
    fn test_feed_json_shape() {
        let json = r#"{
            "url": "http://example.com/app",
            "implementations": [{
                "id": "sha256=aa",
                "version": "1.0-rc2",
                "stability": "stable",
                "arch": "Linux-x86_64",
                "requires": [{
                    "interface": "http://example.com/lib",
                    "version": "1.0..!2.0",
                    "bindings": [{"type": "executable-in-var", "name": "LIB"}]
                }],
                "commands": {"run": {"path": "bin/app"}}
            }]
        }"#;
        let feed: Feed = serde_json::from_str(json).unwrap();
        let implementation = &feed.implementations[0];
        assert_eq!(implementation.version, v("1.0-rc2"));
        assert_eq!(implementation.stability, Stability::Stable);
        assert_eq!(implementation.requires[0].importance, Importance::Essential);
        assert_eq!(implementation.requires[0].required_commands(), vec!["run"]);
        assert!(implementation.has_command("run"));
    }
}
