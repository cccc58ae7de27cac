//! Storage and filesystem-related error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[non_exhaustive]
pub enum StorageError {
    #[error("permission denied: {path}")]
    PermissionDenied { path: String },

    #[error("path not found: {path}")]
    PathNotFound { path: String },

    #[error("IO error: {message}")]
    IoError { message: String },

    #[error("atomic rename failed: {message}")]
    AtomicRenameFailed { message: String },
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        Self::IoError {
            message: err.to_string(),
        }
    }
}

impl StorageError {
    /// Convert an `io::Error` into a `StorageError` with an associated path
    #[must_use]
    pub fn from_io_with_path(err: &std::io::Error, path: &std::path::Path) -> Self {
        match err.kind() {
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied {
                path: path.display().to_string(),
            },
            std::io::ErrorKind::NotFound => Self::PathNotFound {
                path: path.display().to_string(),
            },
            _ => Self::IoError {
                message: format!("{}: {}", path.display(), err),
            },
        }
    }
}

impl UserFacingError for StorageError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::PermissionDenied { .. } => {
                Some("Adjust filesystem permissions or retry with elevated privileges.")
            }
            Self::PathNotFound { .. } => Some("Check the catalog path passed with --catalog."),
            _ => None,
        }
    }

    fn is_retryable(&self) -> bool {
        matches!(self, Self::IoError { .. })
    }

    fn user_code(&self) -> Option<&'static str> {
        let code = match self {
            Self::PermissionDenied { .. } => "storage.permission_denied",
            Self::PathNotFound { .. } => "storage.path_not_found",
            Self::IoError { .. } => "storage.io_error",
            Self::AtomicRenameFailed { .. } => "storage.atomic_rename_failed",
        };
        Some(code)
    }
}
