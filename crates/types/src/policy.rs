//! Selection policy
//!
//! A [`Policy`] tells the ranker which implementations are acceptable and in
//! what order they should be tried.

use crate::{Arch, Stability};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use zi_errors::ConfigError;

/// How much network access selection may assume
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkUse {
    /// Only implementations already on disk
    #[serde(rename = "off-line", alias = "offline")]
    Offline,
    /// Prefer what is on disk, download only when necessary
    Minimal,
    #[default]
    Full,
}

impl NetworkUse {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Offline => "off-line",
            Self::Minimal => "minimal",
            Self::Full => "full",
        }
    }
}

impl fmt::Display for NetworkUse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NetworkUse {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "off-line" | "offline" => Ok(Self::Offline),
            "minimal" => Ok(Self::Minimal),
            "full" => Ok(Self::Full),
            _ => Err(ConfigError::InvalidValue {
                field: "network_use".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

// Implement clap::ValueEnum for NetworkUse
impl clap::ValueEnum for NetworkUse {
    fn value_variants<'a>() -> &'a [Self] {
        &[Self::Offline, Self::Minimal, Self::Full]
    }

    fn to_possible_value(&self) -> Option<clap::builder::PossibleValue> {
        Some(match self {
            Self::Offline => clap::builder::PossibleValue::new("off-line").alias("offline"),
            Self::Minimal => clap::builder::PossibleValue::new("minimal"),
            Self::Full => clap::builder::PossibleValue::new("full"),
        })
    }
}

/// Operating systems and CPUs the host can run
///
/// A `"*"` entry accepts any name, except that the `src` CPU is only
/// accepted when listed explicitly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchPolicy {
    pub os: Vec<String>,
    pub cpus: Vec<String>,
}

impl ArchPolicy {
    #[must_use]
    pub fn new<S: Into<String>>(
        os: impl IntoIterator<Item = S>,
        cpus: impl IntoIterator<Item = S>,
    ) -> Self {
        Self {
            os: os.into_iter().map(Into::into).collect(),
            cpus: cpus.into_iter().map(Into::into).collect(),
        }
    }

    /// Accept every binary architecture
    #[must_use]
    pub fn any() -> Self {
        Self::new(["*"], ["*"])
    }

    /// Architectures the current machine can execute
    #[must_use]
    pub fn host() -> Self {
        Self::for_platform(std::env::consts::OS, std::env::consts::ARCH)
    }

    /// Architectures a machine with the given Rust `OS`/`ARCH` constants can execute
    #[must_use]
    pub fn for_platform(os: &str, arch: &str) -> Self {
        let os: Vec<&str> = match os {
            "linux" => vec!["Linux", "POSIX"],
            "macos" => vec!["Darwin", "MacOSX", "POSIX"],
            "freebsd" => vec!["FreeBSD", "POSIX"],
            "windows" => vec!["Windows"],
            other => vec![other, "POSIX"],
        };
        let cpus: Vec<&str> = match arch {
            "x86_64" => vec!["x86_64", "i686", "i586", "i486", "i386"],
            "x86" => vec!["i686", "i586", "i486", "i386"],
            "aarch64" => vec!["aarch64"],
            "arm" => vec!["armv7l", "armv6l"],
            other => vec![other],
        };
        Self::new(os, cpus)
    }

    /// Whether an implementation built for `arch` may be selected
    #[must_use]
    pub fn permits(&self, arch: &Arch) -> bool {
        let os_ok = arch
            .os
            .as_deref()
            .is_none_or(|os| self.os.iter().any(|allowed| allowed == "*" || allowed == os));
        let cpu_ok = arch.cpu.as_deref().is_none_or(|cpu| {
            self.cpus
                .iter()
                .any(|allowed| allowed == cpu || (allowed == "*" && cpu != "src"))
        });
        os_ok && cpu_ok
    }
}

impl Default for ArchPolicy {
    fn default() -> Self {
        Self::host()
    }
}

/// Everything the ranker needs to order candidates
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Policy {
    /// Candidates below this rating are only tried as a last resort
    pub stability_threshold: Stability,
    pub network_use: NetworkUse,
    /// Rank cached implementations first even with full network use
    pub prefer_cached: bool,
    pub architecture: ArchPolicy,
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            stability_threshold: Stability::Stable,
            network_use: NetworkUse::Full,
            prefer_cached: false,
            architecture: ArchPolicy::host(),
        }
    }
}

impl Policy {
    #[must_use]
    pub fn with_stability_threshold(mut self, threshold: Stability) -> Self {
        self.stability_threshold = threshold;
        self
    }

    #[must_use]
    pub fn with_network_use(mut self, network_use: NetworkUse) -> Self {
        self.network_use = network_use;
        self
    }

    #[must_use]
    pub fn with_prefer_cached(mut self, prefer_cached: bool) -> Self {
        self.prefer_cached = prefer_cached;
        self
    }

    #[must_use]
    pub fn with_architecture(mut self, architecture: ArchPolicy) -> Self {
        self.architecture = architecture;
        self
    }

    /// Whether cache presence outranks stability and version
    #[must_use]
    pub fn ranks_cached_first(&self) -> bool {
        self.prefer_cached || self.network_use != NetworkUse::Full
    }
}
