//! Stability ratings

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use zi_errors::FeedError;

/// How much an implementation can be trusted to work
///
/// Declaration order is the preference order, `Preferred` being the most
/// trusted. The derived `Ord` relies on it.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Stability {
    /// Known to have security problems
    Insecure,
    Buggy,
    Developer,
    /// Default rating for a newly published implementation
    #[default]
    Testing,
    Stable,
    /// Provided by the distribution's package manager
    Packaged,
    /// Set by the user; outranks everything else
    Preferred,
}

impl Stability {
    /// All ratings, least trusted first
    pub const ALL: [Stability; 7] = [
        Self::Insecure,
        Self::Buggy,
        Self::Developer,
        Self::Testing,
        Self::Stable,
        Self::Packaged,
        Self::Preferred,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Insecure => "insecure",
            Self::Buggy => "buggy",
            Self::Developer => "developer",
            Self::Testing => "testing",
            Self::Stable => "stable",
            Self::Packaged => "packaged",
            Self::Preferred => "preferred",
        }
    }
}

impl fmt::Display for Stability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Stability {
    type Err = FeedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|stability| stability.as_str() == s)
            .ok_or_else(|| FeedError::UnknownStability {
                input: s.to_string(),
            })
    }
}
