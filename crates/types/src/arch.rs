//! Architecture tags on implementations

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use zi_errors::FeedError;

/// Operating system and CPU an implementation runs on
///
/// `None` in either position is the `*` wildcard. The CPU `src` marks source
/// code, which needs compiling before it can run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Arch {
    pub os: Option<String>,
    pub cpu: Option<String>,
}

impl Arch {
    /// Create an arch tag; `"*"` means any
    #[must_use]
    pub fn new(os: &str, cpu: &str) -> Self {
        Self {
            os: wildcard(os),
            cpu: wildcard(cpu),
        }
    }

    /// Runs anywhere
    #[must_use]
    pub fn any() -> Self {
        Self::default()
    }

    /// Whether this is a source implementation
    #[must_use]
    pub fn is_source(&self) -> bool {
        self.cpu.as_deref() == Some("src")
    }
}

fn wildcard(part: &str) -> Option<String> {
    (part != "*").then(|| part.to_string())
}

impl FromStr for Arch {
    type Err = FeedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('-') {
            Some((os, cpu)) if !os.is_empty() && !cpu.is_empty() && !cpu.contains('-') => {
                Ok(Self::new(os, cpu))
            }
            _ => Err(FeedError::InvalidArch {
                input: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}",
            self.os.as_deref().unwrap_or("*"),
            self.cpu.as_deref().unwrap_or("*")
        )
    }
}

impl Serialize for Arch {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Arch {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}
