//! Version numbers and version ranges
//!
//! Versions use the Zero Install scheme rather than semver:
//! - `1.2.3` - dotted list of non-negative integers
//! - `1.2-pre3`, `1.2-rc1` - pre-releases, sorting before `1.2`
//! - `1.2-post` - post-release, sorting after `1.2`
//! - `1.2-4` - revision 4 of `1.2`
//!
//! Ranges are half-open, `1.0..!2.0` meaning `1.0 <= v < 2.0`.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use zi_errors::VersionError;

/// Modifier following a dotted component list
///
/// Declaration order is the sort order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Modifier {
    Pre,
    Rc,
    Release,
    Post,
}

impl Modifier {
    fn parse(word: &str, input: &str) -> Result<Self, VersionError> {
        match word {
            "pre" => Ok(Self::Pre),
            "rc" => Ok(Self::Rc),
            "" => Ok(Self::Release),
            "post" => Ok(Self::Post),
            other => Err(VersionError::UnknownModifier {
                input: input.to_string(),
                modifier: other.to_string(),
            }),
        }
    }

    /// Text written after the `-` separator
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pre => "pre",
            Self::Rc => "rc",
            Self::Release => "",
            Self::Post => "post",
        }
    }
}

/// One numeric component, stored as its digits without leading zeros
///
/// Components of any length are accepted, so date stamps such as
/// `20240101123000000000` compare numerically.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct Component(String);

impl Component {
    fn parse(text: &str) -> Option<Self> {
        if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let trimmed = text.trim_start_matches('0');
        let digits = if trimmed.is_empty() { "0" } else { trimmed };
        Some(Self(digits.to_string()))
    }
}

impl Ord for Component {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0
            .len()
            .cmp(&other.0.len())
            .then_with(|| self.0.cmp(&other.0))
    }
}

impl PartialOrd for Component {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A dotted list of numbers and the modifier that follows it
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
struct Segment {
    numbers: Vec<Component>,
    modifier: Modifier,
}

/// A parsed version
///
/// Ordering compares segments lexicographically; a version whose segment
/// list is a prefix of another's sorts first.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version {
    segments: Vec<Segment>,
}

impl Version {
    /// Parse a version string
    ///
    /// # Errors
    ///
    /// Returns `VersionError` if the string is empty, contains an empty or
    /// non-numeric component, or uses an unknown modifier.
    pub fn parse(input: &str) -> Result<Self, VersionError> {
        if input.is_empty() {
            return Err(VersionError::Empty {
                input: input.to_string(),
            });
        }

        let mut parts = input.split('-');
        let first = parts.next().unwrap_or_default();
        let mut current = parse_dotted(first, input)?;
        let mut segments = Vec::new();
        let mut ends_with_modifier = false;

        for part in parts {
            let split = part
                .find(|c: char| !c.is_ascii_lowercase())
                .unwrap_or(part.len());
            let (word, dotted) = part.split_at(split);
            let modifier = Modifier::parse(word, input)?;

            segments.push(Segment {
                numbers: std::mem::take(&mut current),
                modifier,
            });

            ends_with_modifier = dotted.is_empty();
            if !dotted.is_empty() {
                current = parse_dotted(dotted, input)?;
            }
        }

        if !ends_with_modifier {
            segments.push(Segment {
                numbers: current,
                modifier: Modifier::Release,
            });
        }

        Ok(Self { segments })
    }

    /// Check whether `min <= self < max_exclusive`
    #[must_use]
    pub fn in_range(&self, min: &Version, max_exclusive: Option<&Version>) -> bool {
        in_range(self, min, max_exclusive)
    }
}

/// Check whether `min <= version < max_exclusive` (no upper bound when `None`)
#[must_use]
pub fn in_range(version: &Version, min: &Version, max_exclusive: Option<&Version>) -> bool {
    version >= min && max_exclusive.is_none_or(|max| version < max)
}

fn parse_dotted(text: &str, input: &str) -> Result<Vec<Component>, VersionError> {
    text.split('.')
        .map(|component| {
            if component.is_empty() {
                return Err(VersionError::EmptyComponent {
                    input: input.to_string(),
                });
            }
            Component::parse(component).ok_or_else(|| VersionError::InvalidComponent {
                input: input.to_string(),
                component: component.to_string(),
            })
        })
        .collect()
}

impl FromStr for Version {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let last = self.segments.len().saturating_sub(1);
        for (i, segment) in self.segments.iter().enumerate() {
            let numbers: Vec<String> = segment.numbers.iter().map(ToString::to_string).collect();
            write!(f, "{}", numbers.join("."))?;
            if i != last || segment.modifier != Modifier::Release {
                write!(f, "-{}", segment.modifier.as_str())?;
            }
        }
        Ok(())
    }
}

impl Serialize for Version {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Version {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Self::parse(&text).map_err(serde::de::Error::custom)
    }
}

/// Half-open version range `[min, max_exclusive)`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VersionRange {
    min: Version,
    max_exclusive: Option<Version>,
}

impl VersionRange {
    /// Create a range, rejecting empty ones
    ///
    /// # Errors
    ///
    /// Returns `VersionError::EmptyRange` if `max_exclusive <= min`.
    pub fn new(min: Version, max_exclusive: Option<Version>) -> Result<Self, VersionError> {
        if let Some(max) = &max_exclusive {
            if max <= &min {
                return Err(VersionError::EmptyRange {
                    input: format!("{min}..!{max}"),
                });
            }
        }
        Ok(Self { min, max_exclusive })
    }

    /// Range with no upper bound
    #[must_use]
    pub fn at_least(min: Version) -> Self {
        Self {
            min,
            max_exclusive: None,
        }
    }

    #[must_use]
    pub fn min(&self) -> &Version {
        &self.min
    }

    #[must_use]
    pub fn max_exclusive(&self) -> Option<&Version> {
        self.max_exclusive.as_ref()
    }

    /// Check if a version lies inside the range
    #[must_use]
    pub fn contains(&self, version: &Version) -> bool {
        in_range(version, &self.min, self.max_exclusive.as_ref())
    }

    /// Intersect two ranges, `None` when nothing satisfies both
    #[must_use]
    pub fn intersect(&self, other: &VersionRange) -> Option<VersionRange> {
        let min = std::cmp::max(&self.min, &other.min).clone();
        let max_exclusive = match (&self.max_exclusive, &other.max_exclusive) {
            (Some(a), Some(b)) => Some(std::cmp::min(a, b).clone()),
            (Some(a), None) => Some(a.clone()),
            (None, Some(b)) => Some(b.clone()),
            (None, None) => None,
        };
        Self::new(min, max_exclusive).ok()
    }
}

impl FromStr for VersionRange {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let Some((min, rest)) = s.split_once("..") else {
            return Err(VersionError::InvalidRange {
                input: s.to_string(),
            });
        };
        if min.is_empty() {
            return Err(VersionError::InvalidRange {
                input: s.to_string(),
            });
        }
        let min = Version::parse(min)?;

        if rest.is_empty() {
            return Ok(Self::at_least(min));
        }
        let Some(max) = rest.strip_prefix('!') else {
            return Err(VersionError::InvalidRange {
                input: s.to_string(),
            });
        };
        let max = Version::parse(max)?;
        Self::new(min, Some(max))
    }
}

impl fmt::Display for VersionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.max_exclusive {
            Some(max) => write!(f, "{}..!{}", self.min, max),
            None => write!(f, "{}..", self.min),
        }
    }
}

impl Serialize for VersionRange {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for VersionRange {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}
