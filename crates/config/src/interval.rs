//! Time intervals written as `30d`, `4h`, `3.5m`

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use zi_errors::ConfigError;

const MINUTE: u64 = 60;
const HOUR: u64 = 60 * MINUTE;
const DAY: u64 = 24 * HOUR;

/// A whole number of seconds, displayed in the largest fitting unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct TimeInterval(u64);

impl TimeInterval {
    #[must_use]
    pub const fn from_secs(secs: u64) -> Self {
        Self(secs)
    }

    #[must_use]
    pub const fn from_days(days: u64) -> Self {
        Self(days * DAY)
    }

    #[must_use]
    pub const fn as_secs(self) -> u64 {
        self.0
    }

    #[must_use]
    pub const fn as_duration(self) -> Duration {
        Duration::from_secs(self.0)
    }
}

impl FromStr for TimeInterval {
    type Err = ConfigError;

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim();
        let split = text
            .find(|c: char| c.is_ascii_alphabetic())
            .unwrap_or(text.len());
        let (number, unit) = text.split_at(split);

        let scale = match unit {
            "" | "s" => 1,
            "m" => MINUTE,
            "h" => HOUR,
            "d" => DAY,
            other => {
                return Err(ConfigError::UnknownTimeUnit {
                    value: s.to_string(),
                    unit: other.to_string(),
                })
            }
        };

        let invalid = || ConfigError::InvalidValue {
            field: "freshness".to_string(),
            value: s.to_string(),
        };
        let value: f64 = number.parse().map_err(|_| invalid())?;
        if !value.is_finite() || value < 0.0 {
            return Err(invalid());
        }

        #[allow(clippy::cast_precision_loss)]
        let secs = (value * scale as f64).round();
        Ok(Self(secs as u64))
    }
}

impl fmt::Display for TimeInterval {
    #[allow(clippy::cast_precision_loss)]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (scale, unit) = match self.0 {
            secs if secs < MINUTE => (1, "s"),
            secs if secs < HOUR => (MINUTE, "m"),
            secs if secs < DAY => (HOUR, "h"),
            _ => (DAY, "d"),
        };
        if self.0 % scale == 0 {
            write!(f, "{}{unit}", self.0 / scale)
        } else {
            write!(f, "{}{unit}", self.0 as f64 / scale as f64)
        }
    }
}

impl Serialize for TimeInterval {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TimeInterval {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interval_round_trip() {
        for period in ["1s", "2d", "3.5m", "4h", "5d"] {
            let interval: TimeInterval = period.parse().unwrap();
            assert_eq!(interval.to_string(), period);
        }
    }

    #[test]
    fn test_interval_values() {
        assert_eq!("5m".parse::<TimeInterval>().unwrap().as_secs(), 300);
        assert_eq!("3.5m".parse::<TimeInterval>().unwrap().as_secs(), 210);
        assert_eq!("90".parse::<TimeInterval>().unwrap().as_secs(), 90);
        assert_eq!(TimeInterval::from_days(30).to_string(), "30d");
        assert_eq!(TimeInterval::default().to_string(), "0s");
    }

    #[test]
    fn test_interval_errors() {
        assert!(matches!(
            "3w".parse::<TimeInterval>(),
            Err(ConfigError::UnknownTimeUnit { .. })
        ));
        assert!(matches!(
            "soon".parse::<TimeInterval>(),
            Err(ConfigError::UnknownTimeUnit { .. })
        ));
        assert!(matches!(
            "-1d".parse::<TimeInterval>(),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(matches!(
            "d".parse::<TimeInterval>(),
            Err(ConfigError::InvalidValue { .. })
        ));
    }
}
