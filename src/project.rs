//! Project descriptors and the per-project configuration record.
//!
//! Scaffolding (out of scope here) creates the project layout; the core only
//! consumes a descriptor pointing at the `init`, `globals` and `entry`
//! fragments, the library directory, and the optional explicit library
//! order. The explicit order is persisted in `scriptline.json`; its absence
//! means "no explicit order", never an error.

use serde::{Deserialize, Serialize};

use crate::error::{AssemblyError, ScriptlineError, ScriptlineResult};
use crate::store::FragmentStore;

/// File name of the per-project configuration record.
pub const CONFIG_FILE: &str = "scriptline.json";

/// Logical paths describing one project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectDescriptor {
    /// Path of the `init` fragment.
    pub init_path: String,
    /// Path of the `globals` fragment.
    pub globals_path: String,
    /// Directory containing the `library` fragments.
    pub library_dir: String,
    /// Path of the `entry` fragment.
    pub entry_path: String,
    /// Explicit library order; empty means fallback sorting applies.
    #[serde(default)]
    pub library_order: Vec<String>,
}

impl ProjectDescriptor {
    /// The conventional project layout produced by the scaffolding tooling.
    #[must_use]
    pub fn conventional() -> Self {
        Self {
            init_path: "init.js".to_string(),
            globals_path: "globals.js".to_string(),
            library_dir: "lib".to_string(),
            entry_path: "main.js".to_string(),
            library_order: Vec::new(),
        }
    }

    /// Replaces the entry fragment path.
    #[must_use]
    pub fn with_entry(mut self, entry_path: impl Into<String>) -> Self {
        self.entry_path = entry_path.into();
        self
    }

    /// Replaces the explicit library order.
    #[must_use]
    pub fn with_library_order(mut self, order: Vec<String>) -> Self {
        self.library_order = order;
        self
    }

    /// Loads the project configuration record from the store and applies it.
    ///
    /// An absent `scriptline.json` leaves the descriptor unchanged; a present
    /// but malformed one is an error.
    pub fn load_config(mut self, store: &dyn FragmentStore) -> ScriptlineResult<Self> {
        match ProjectConfig::load(store)? {
            Some(config) => {
                self.library_order = config.library_order;
                Ok(self)
            }
            None => Ok(self),
        }
    }
}

impl Default for ProjectDescriptor {
    fn default() -> Self {
        Self::conventional()
    }
}

/// The persisted per-project configuration record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Explicit library load order (file names within the library directory).
    #[serde(default)]
    pub library_order: Vec<String>,
}

impl ProjectConfig {
    /// Reads the configuration record, if one exists.
    pub fn load(store: &dyn FragmentStore) -> ScriptlineResult<Option<Self>> {
        let Some(text) = store
            .read(CONFIG_FILE)
            .map_err(AssemblyError::from)
            .map_err(ScriptlineError::from)?
        else {
            return Ok(None);
        };

        let config = serde_json::from_str(&text).map_err(|err| {
            ScriptlineError::from(AssemblyError::InvalidConfig {
                path: CONFIG_FILE.to_string(),
                message: err.to_string(),
            })
        })?;
        Ok(Some(config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryFragmentStore;

    #[test]
    fn conventional_layout() {
        let descriptor = ProjectDescriptor::conventional();
        assert_eq!(descriptor.init_path, "init.js");
        assert_eq!(descriptor.globals_path, "globals.js");
        assert_eq!(descriptor.library_dir, "lib");
        assert_eq!(descriptor.entry_path, "main.js");
        assert!(descriptor.library_order.is_empty());
    }

    #[test]
    fn with_entry_overrides_entry_path() {
        let descriptor = ProjectDescriptor::conventional().with_entry("flows/night.js");
        assert_eq!(descriptor.entry_path, "flows/night.js");
    }

    #[test]
    fn absent_config_means_no_explicit_order() {
        let store = InMemoryFragmentStore::new();
        let descriptor = ProjectDescriptor::conventional()
            .load_config(&store)
            .unwrap();
        assert!(descriptor.library_order.is_empty());
    }

    #[test]
    fn config_supplies_library_order() {
        let store = InMemoryFragmentStore::new();
        store.insert(
            CONFIG_FILE,
            r#"{"library_order": ["billing.js", "routing.js"]}"#,
        );
        let descriptor = ProjectDescriptor::conventional()
            .load_config(&store)
            .unwrap();
        assert_eq!(descriptor.library_order, vec!["billing.js", "routing.js"]);
    }

    #[test]
    fn malformed_config_is_an_error() {
        let store = InMemoryFragmentStore::new();
        store.insert(CONFIG_FILE, "{not json");
        let err = ProjectDescriptor::conventional()
            .load_config(&store)
            .unwrap_err();
        assert!(err.is_assembly());
        assert!(format!("{err}").contains(CONFIG_FILE));
    }

    #[test]
    fn config_tolerates_unknown_fields() {
        let store = InMemoryFragmentStore::new();
        store.insert(
            CONFIG_FILE,
            r#"{"library_order": [], "created_by": "scaffold 2.1"}"#,
        );
        assert!(ProjectConfig::load(&store).unwrap().is_some());
    }
}
