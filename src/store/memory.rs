//! In-memory fragment store.
//!
//! Reference backend for tests and embedded callers. Content is held in a
//! sorted map so enumeration order is deterministic by construction.

use std::collections::BTreeMap;
use std::sync::RwLock;

use super::traits::{FragmentStore, StoreError};

/// Fragment store backed by an in-memory map of path to content.
#[derive(Debug, Default)]
pub struct InMemoryFragmentStore {
    files: RwLock<BTreeMap<String, String>>,
}

impl InMemoryFragmentStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a file.
    pub fn insert(&self, path: impl Into<String>, content: impl Into<String>) {
        if let Ok(mut files) = self.files.write() {
            files.insert(path.into(), content.into());
        }
    }

    /// Removes a file, if present.
    pub fn remove(&self, path: &str) {
        if let Ok(mut files) = self.files.write() {
            files.remove(path);
        }
    }
}

impl FragmentStore for InMemoryFragmentStore {
    fn read(&self, path: &str) -> Result<Option<String>, StoreError> {
        let files = self.files.read().map_err(|_| StoreError::Io {
            path: path.to_string(),
            message: "poisoned lock".to_string(),
        })?;
        Ok(files.get(path).cloned())
    }

    fn list(&self, dir: &str) -> Result<Vec<String>, StoreError> {
        let files = self.files.read().map_err(|_| StoreError::Io {
            path: dir.to_string(),
            message: "poisoned lock".to_string(),
        })?;

        let prefix = if dir.is_empty() || dir.ends_with('/') {
            dir.to_string()
        } else {
            format!("{dir}/")
        };

        let names = files
            .keys()
            .filter_map(|path| {
                let rest = path.strip_prefix(&prefix)?;
                // Only direct children; nested paths belong to subdirectories.
                if rest.is_empty() || rest.contains('/') {
                    None
                } else {
                    Some(rest.to_string())
                }
            })
            .collect();

        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_round_trips_inserted_content() {
        let store = InMemoryFragmentStore::new();
        store.insert("init.js", "var a = 1;");
        assert_eq!(store.read("init.js").unwrap().unwrap(), "var a = 1;");
    }

    #[test]
    fn read_missing_is_none() {
        let store = InMemoryFragmentStore::new();
        assert!(store.read("nope.js").unwrap().is_none());
    }

    #[test]
    fn list_returns_direct_children_only() {
        let store = InMemoryFragmentStore::new();
        store.insert("lib/a.js", "");
        store.insert("lib/b.js", "");
        store.insert("lib/nested/c.js", "");
        store.insert("main.js", "");
        assert_eq!(store.list("lib").unwrap(), vec!["a.js", "b.js"]);
    }

    #[test]
    fn list_missing_directory_is_empty() {
        let store = InMemoryFragmentStore::new();
        assert!(store.list("lib").unwrap().is_empty());
    }

    #[test]
    fn remove_deletes_a_file() {
        let store = InMemoryFragmentStore::new();
        store.insert("x.js", "var x;");
        store.remove("x.js");
        assert!(store.read("x.js").unwrap().is_none());
    }
}
