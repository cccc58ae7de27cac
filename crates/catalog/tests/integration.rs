//! Integration tests for the catalog

#[cfg(test)]
mod tests {
    use tempfile::tempdir;
    use zi_catalog::*;
    use zi_types::{Feed, Implementation, Version};

    #[tokio::test]
    async fn test_saved_catalog_reloads_with_store() {
        let temp = tempdir().unwrap();
        let store = temp.path().join("implementations");
        std::fs::create_dir_all(store.join("sha256=old")).unwrap();

        let document = CatalogDocument::new(vec![Feed::new("http://example.com/lib")
            .with_implementation(Implementation::new("sha256=old", Version::parse("1.0").unwrap()))
            .with_implementation(Implementation::new("sha256=new", Version::parse("2.0").unwrap()))]);

        let file = CatalogFile::new(temp.path().join("catalog.json"));
        file.save(&document).await.unwrap();

        let catalog = file
            .load()
            .await
            .unwrap()
            .into_catalog(StoreOracle::new([&store]));

        let candidates = catalog.implementations_for("http://example.com/lib");
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].feed, "http://example.com/lib");
        assert!(catalog.is_cached(candidates[0].implementation));
        assert!(!catalog.is_cached(candidates[1].implementation));
    }

    #[test]
    fn test_unknown_interface_is_empty() {
        let catalog = Catalog::default();
        assert!(catalog.feeds_for("http://example.com/nothing").is_empty());
        assert_eq!(catalog.interfaces().count(), 0);
    }
}
