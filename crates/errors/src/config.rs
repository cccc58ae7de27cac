//! Configuration error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[non_exhaustive]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    NotFound { path: String },

    #[error("parse error: {message}")]
    ParseError { message: String },

    #[error("unknown setting: {name}")]
    UnknownSetting { name: String },

    #[error("invalid value for {field}: {value}")]
    InvalidValue { field: String, value: String },

    #[error("unknown time unit \"{unit}\" in {value}")]
    UnknownTimeUnit { value: String, unit: String },

    #[error("failed to write config to {path}: {error}")]
    WriteError { path: String, error: String },

    #[error("failed to serialize config: {error}")]
    SerializeError { error: String },
}

impl UserFacingError for ConfigError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::NotFound { .. } => Some("Run `zi config NAME VALUE` to create a settings file."),
            Self::UnknownSetting { .. } => {
                Some("Known settings are network_use, freshness and help_with_testing.")
            }
            Self::UnknownTimeUnit { .. } => Some("Use e.g. 5d for 5 days (units: s, m, h, d)."),
            Self::InvalidValue { .. } | Self::ParseError { .. } => {
                Some("Fix the configuration value and retry the command.")
            }
            Self::WriteError { .. } => Some("Ensure the config path is writable and retry."),
            Self::SerializeError { .. } => None,
        }
    }

    fn user_code(&self) -> Option<&'static str> {
        let code = match self {
            Self::NotFound { .. } => "config.not_found",
            Self::ParseError { .. } => "config.parse_error",
            Self::UnknownSetting { .. } => "config.unknown_setting",
            Self::InvalidValue { .. } => "config.invalid_value",
            Self::UnknownTimeUnit { .. } => "config.unknown_time_unit",
            Self::WriteError { .. } => "config.write_error",
            Self::SerializeError { .. } => "config.serialize_error",
        };
        Some(code)
    }
}
