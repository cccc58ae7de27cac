//! Local presence checks

use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use zi_types::Implementation;

/// Answers whether an implementation is already available locally
///
/// Implementations must be cheap to call; the solver asks once per candidate.
pub trait PresenceOracle: Send + Sync {
    /// Whether the store holds an implementation with this id
    fn contains(&self, id: &str) -> bool;

    /// Whether `implementation` can be used without downloading
    ///
    /// Implementations with a `local_path` are always present.
    fn is_present(&self, implementation: &Implementation) -> bool {
        implementation.local_path.is_some() || self.contains(&implementation.id)
    }
}

/// Explicit set of cached implementation ids
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CachedSet {
    ids: HashSet<String>,
}

impl CachedSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: impl Into<String>) {
        self.ids.insert(id.into());
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for CachedSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            ids: iter.into_iter().map(Into::into).collect(),
        }
    }
}

impl PresenceOracle for CachedSet {
    fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }
}

/// Content-addressed implementation store on disk
///
/// An implementation is present when a directory named after its id exists
/// under any of the roots.
#[derive(Clone, PartialEq, Eq)]
pub struct StoreOracle {
    roots: Vec<PathBuf>,
}

impl StoreOracle {
    #[must_use]
    pub fn new<P: AsRef<Path>>(roots: impl IntoIterator<Item = P>) -> Self {
        Self {
            roots: roots
                .into_iter()
                .map(|root| root.as_ref().to_path_buf())
                .collect(),
        }
    }

    #[must_use]
    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }
}

impl fmt::Debug for StoreOracle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(&self.roots).finish()
    }
}

impl PresenceOracle for StoreOracle {
    fn contains(&self, id: &str) -> bool {
        // ids are single path components
        if id.is_empty() || id == "." || id == ".." || id.contains(['/', '\\']) {
            return false;
        }
        self.roots.iter().any(|root| root.join(id).is_dir())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;
    use zi_types::Version;

    fn implementation(id: &str) -> Implementation {
        Implementation::new(id, Version::parse("1.0").unwrap())
    }

    #[test]
    fn test_cached_set() {
        let cached: CachedSet = ["sha256=aa"].into_iter().collect();
        assert!(cached.is_present(&implementation("sha256=aa")));
        assert!(!cached.is_present(&implementation("sha256=bb")));
        assert!(cached.is_present(&implementation("sha256=bb").with_local_path("/opt/bb")));
    }

    #[test]
    fn test_store_oracle() {
        let first = tempdir().unwrap();
        let second = tempdir().unwrap();
        std::fs::create_dir(second.path().join("sha256=aa")).unwrap();
        std::fs::write(first.path().join("sha256=file"), b"not a dir").unwrap();

        let store = StoreOracle::new([first.path(), second.path()]);
        assert!(store.contains("sha256=aa"));
        assert!(!store.contains("sha256=bb"));
        assert!(!store.contains("sha256=file"));
        assert!(!store.contains(".."));
        assert!(!store.contains("../sha256=aa"));
    }
}
