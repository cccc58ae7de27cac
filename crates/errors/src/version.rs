//! Version and range parsing error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[non_exhaustive]
pub enum VersionError {
    #[error("invalid version: {input} (empty version string)")]
    Empty { input: String },

    #[error("invalid version: {input} (empty numeric component)")]
    EmptyComponent { input: String },

    #[error("invalid version: {input} (component '{component}' is not a number)")]
    InvalidComponent { input: String, component: String },

    #[error("invalid version: {input} (unknown modifier '{modifier}')")]
    UnknownModifier { input: String, modifier: String },

    #[error("invalid version range: {input}")]
    InvalidRange { input: String },

    #[error("empty version range: {input} (upper bound is not above lower bound)")]
    EmptyRange { input: String },
}

impl UserFacingError for VersionError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::Empty { .. }
            | Self::EmptyComponent { .. }
            | Self::InvalidComponent { .. }
            | Self::UnknownModifier { .. } => Some(
                "Versions are dotted numbers with optional -pre, -rc, -post or -N suffixes, e.g. 1.2-rc1.",
            ),
            Self::InvalidRange { .. } | Self::EmptyRange { .. } => {
                Some("Ranges are written MIN..!MAX or MIN.., e.g. 1.0..!2.0.")
            }
        }
    }

    fn user_code(&self) -> Option<&'static str> {
        let code = match self {
            Self::Empty { .. } => "version.empty",
            Self::EmptyComponent { .. } => "version.empty_component",
            Self::InvalidComponent { .. } => "version.invalid_component",
            Self::UnknownModifier { .. } => "version.unknown_modifier",
            Self::InvalidRange { .. } => "version.invalid_range",
            Self::EmptyRange { .. } => "version.empty_range",
        };
        Some(code)
    }
}
