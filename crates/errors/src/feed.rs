//! Feed data error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[non_exhaustive]
pub enum FeedError {
    #[error("invalid feed document: {message}")]
    InvalidFormat { message: String },

    #[error("invalid architecture: {input}")]
    InvalidArch { input: String },

    #[error("unknown stability rating: {input}")]
    UnknownStability { input: String },

    #[error("duplicate implementation {id} in feed {feed}")]
    DuplicateImplementation { feed: String, id: String },

    #[error("feed {feed} has an empty interface URI")]
    MissingInterface { feed: String },
}

impl UserFacingError for FeedError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::InvalidArch { .. } => Some("Architectures are written OS-CPU, e.g. Linux-x86_64 or *-*."),
            Self::UnknownStability { .. } => Some(
                "Use one of insecure, buggy, developer, testing, stable, packaged or preferred.",
            ),
            _ => None,
        }
    }

    fn user_code(&self) -> Option<&'static str> {
        let code = match self {
            Self::InvalidFormat { .. } => "feed.invalid_format",
            Self::InvalidArch { .. } => "feed.invalid_arch",
            Self::UnknownStability { .. } => "feed.unknown_stability",
            Self::DuplicateImplementation { .. } => "feed.duplicate_implementation",
            Self::MissingInterface { .. } => "feed.missing_interface",
        };
        Some(code)
    }
}
