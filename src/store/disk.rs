//! Disk-backed fragment store.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use super::traits::{FragmentStore, StoreError};

/// Fragment store rooted at a project directory on disk.
#[derive(Debug, Clone)]
pub struct DiskFragmentStore {
    root: PathBuf,
}

impl DiskFragmentStore {
    /// Creates a store rooted at `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Returns the project root this store reads from.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, rel: &str) -> PathBuf {
        let mut full = self.root.clone();
        for part in rel.split('/').filter(|p| !p.is_empty()) {
            full.push(part);
        }
        full
    }
}

impl FragmentStore for DiskFragmentStore {
    fn read(&self, path: &str) -> Result<Option<String>, StoreError> {
        let full = self.resolve(path);
        match std::fs::read(&full) {
            Ok(bytes) => match String::from_utf8(bytes) {
                Ok(text) => Ok(Some(text)),
                Err(_) => Err(StoreError::InvalidEncoding {
                    path: path.to_string(),
                }),
            },
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(StoreError::Io {
                path: path.to_string(),
                message: err.to_string(),
            }),
        }
    }

    fn list(&self, dir: &str) -> Result<Vec<String>, StoreError> {
        let full = self.resolve(dir);
        let entries = match std::fs::read_dir(&full) {
            Ok(entries) => entries,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => {
                return Err(StoreError::Io {
                    path: dir.to_string(),
                    message: err.to_string(),
                })
            }
        };

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|err| StoreError::Io {
                path: dir.to_string(),
                message: err.to_string(),
            })?;
            let is_file = entry
                .file_type()
                .map_err(|err| StoreError::Io {
                    path: dir.to_string(),
                    message: err.to_string(),
                })?
                .is_file();
            if !is_file {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                names.push(name.to_string());
            }
        }

        // Directory enumeration order is filesystem-dependent; sort by name
        // so the stable-sort tiebreak downstream stays deterministic.
        names.sort();
        Ok(names)
    }
}
