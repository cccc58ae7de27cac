//! Catalog file on disk

use crate::models::CatalogDocument;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tokio::fs;
use tracing::{debug, warn};
use zi_errors::{Error, StorageError};

/// A JSON catalog document stored at a fixed path
#[derive(Debug, Clone)]
pub struct CatalogFile {
    path: PathBuf,
}

impl CatalogFile {
    #[must_use]
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load and validate the document
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing or unreadable, or its content
    /// is not a valid catalog document.
    pub async fn load(&self) -> Result<CatalogDocument, Error> {
        let content = fs::read_to_string(&self.path)
            .await
            .map_err(|e| StorageError::from_io_with_path(&e, &self.path))?;

        let document = CatalogDocument::from_json(&content)?;
        document.validate()?;
        debug!(
            path = %self.path.display(),
            feeds = document.feeds.len(),
            "loaded catalog"
        );
        Ok(document)
    }

    /// Save the document, replacing any existing file atomically
    ///
    /// # Errors
    ///
    /// Returns an error if the parent directory cannot be created or the file
    /// cannot be written.
    pub async fn save(&self, document: &CatalogDocument) -> Result<(), Error> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| StorageError::IoError {
                    message: format!("failed to create catalog dir: {e}"),
                })?;
        }

        let json = document.to_json()?;

        // Write to temporary file first
        let temp_path = self.path.with_extension("tmp");
        fs::write(&temp_path, &json)
            .await
            .map_err(|e| StorageError::IoError {
                message: format!("failed to write catalog: {e}"),
            })?;

        fs::rename(&temp_path, &self.path)
            .await
            .map_err(|e| StorageError::AtomicRenameFailed {
                message: format!("failed to rename catalog file: {e}"),
            })?;

        Ok(())
    }

    /// Check if the file exists
    pub async fn exists(&self) -> bool {
        fs::metadata(&self.path).await.is_ok()
    }

    /// Time since the file was last written, `None` if it does not exist
    ///
    /// # Errors
    ///
    /// Returns an error if the modification time cannot be read.
    pub async fn age(&self) -> Result<Option<Duration>, Error> {
        match fs::metadata(&self.path).await {
            Ok(metadata) => {
                let modified = metadata.modified().map_err(|e| StorageError::IoError {
                    message: format!("failed to get modification time: {e}"),
                })?;

                let age = SystemTime::now()
                    .duration_since(modified)
                    .unwrap_or(Duration::ZERO);

                Ok(Some(age))
            }
            Err(_) => Ok(None),
        }
    }

    /// Whether the feeds should be refreshed
    ///
    /// A missing file is always stale. A zero `freshness` disables the check.
    ///
    /// # Errors
    ///
    /// Returns an error if the modification time cannot be read.
    pub async fn is_stale(&self, freshness: Duration) -> Result<bool, Error> {
        let Some(age) = self.age().await? else {
            return Ok(true);
        };
        if freshness.is_zero() {
            return Ok(false);
        }

        let stale = age > freshness;
        if stale {
            warn!(
                path = %self.path.display(),
                age_secs = age.as_secs(),
                freshness_secs = freshness.as_secs(),
                "catalog is older than the freshness interval"
            );
        }
        Ok(stale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;
    use zi_types::{Feed, Implementation, Version};

    #[tokio::test]
    async fn test_catalog_file_operations() {
        let temp = tempdir().unwrap();
        let file = CatalogFile::new(temp.path().join("feeds").join("catalog.json"));

        assert!(!file.exists().await);
        assert!(file.load().await.is_err());
        assert!(file.age().await.unwrap().is_none());
        assert!(file.is_stale(Duration::from_secs(60)).await.unwrap());

        let document = CatalogDocument::new(vec![Feed::new("http://example.com/app")
            .with_implementation(Implementation::new(
                "sha256=aa",
                Version::parse("1.0").unwrap(),
            ))]);
        file.save(&document).await.unwrap();

        assert!(file.exists().await);
        let loaded = file.load().await.unwrap();
        assert_eq!(loaded, document);

        let age = file.age().await.unwrap().unwrap();
        assert!(age < Duration::from_secs(10));
        assert!(!file.is_stale(Duration::from_secs(3600)).await.unwrap());
        assert!(!file.is_stale(Duration::ZERO).await.unwrap());
    }

    #[tokio::test]
    async fn test_load_rejects_invalid_feed() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("catalog.json");
        std::fs::write(
            &path,
            r#"{"feeds": [{"url": "http://example.com/app", "implementations": [
                {"id": "dup", "version": "1.0"}, {"id": "dup", "version": "2.0"}
            ]}]}"#,
        )
        .unwrap();

        let err = CatalogFile::new(&path).load().await.unwrap_err();
        assert!(matches!(
            err,
            Error::Feed(zi_errors::FeedError::DuplicateImplementation { .. })
        ));
    }
}
