//! One-shot simulation sessions.
//!
//! A session wires the pieces together: resolve the load order, build a
//! fresh platform mock, execute, report. Sessions share nothing, so
//! simulations can run concurrently from separate threads without
//! observing each other's state.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ExecutionError, ScriptlineResult};
use crate::fragment::{load_fragments, MissingPolicy};
use crate::project::ProjectDescriptor;
use crate::runtime::context::{Environment, HttpMode, RuntimeContext, StorageMode};
use crate::runtime::executor::{self, ExecutionReport};
use crate::store::FragmentStore;

/// Default whole-run execution budget.
pub const DEFAULT_TIMEOUT_MS: u64 = 5_000;

/// Unique identifier for a simulation session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(Uuid);

impl SessionId {
    /// Generates a fresh random identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// The underlying UUID.
    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Knobs for one simulation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionOptions {
    /// Environment tag exposed to the scripts.
    pub environment: Environment,
    /// HTTP behavior.
    pub http_mode: HttpMode,
    /// Storage behavior.
    pub storage_mode: StorageMode,
    /// Whole-run budget in milliseconds. Must be positive.
    pub timeout_ms: u64,
    /// Run a different entry script instead of the project's configured
    /// one. Useful for exercising a single handler in isolation.
    pub entry_script_name: Option<String>,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            environment: Environment::Development,
            http_mode: HttpMode::Stub,
            storage_mode: StorageMode::Memory,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            entry_script_name: None,
        }
    }
}

/// A single simulated execution of a project's call flow.
#[derive(Debug)]
pub struct SimulationSession {
    id: SessionId,
    options: SessionOptions,
}

impl SimulationSession {
    /// Creates a session with a fresh identifier.
    ///
    /// Fails early when `timeout_ms` is zero or a reserved mode is
    /// requested, before any fragment is read.
    pub fn new(options: SessionOptions) -> ScriptlineResult<Self> {
        if options.timeout_ms == 0 {
            return Err(ExecutionError::InvalidTimeout {
                timeout_ms: options.timeout_ms,
            }
            .into());
        }
        // Validate modes now; the run builds its own context later.
        RuntimeContext::new(options.environment, options.http_mode, options.storage_mode)
            .map_err(crate::error::ScriptlineError::from)?;
        Ok(Self {
            id: SessionId::new(),
            options,
        })
    }

    /// This session's identifier.
    #[must_use]
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// The options this session runs with.
    #[must_use]
    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    /// Loads the project's fragments and executes them.
    ///
    /// Fragments are read fresh from the store, so edits between runs are
    /// picked up without any notion of cache invalidation. Missing
    /// required fragments are skipped with a warning rather than failing,
    /// which keeps partially-built projects simulatable.
    pub fn execute(
        &self,
        store: &dyn FragmentStore,
        descriptor: &ProjectDescriptor,
    ) -> ScriptlineResult<ExecutionReport> {
        let descriptor = match &self.options.entry_script_name {
            Some(entry) => descriptor.clone().with_entry(entry.clone()),
            None => descriptor.clone(),
        };

        tracing::info!(
            session = %self.id,
            environment = %self.options.environment,
            entry = %descriptor.entry_path,
            "starting simulation"
        );

        let fragments = load_fragments(store, &descriptor, MissingPolicy::WarnSkip)?;
        let ctx = RuntimeContext::new(
            self.options.environment,
            self.options.http_mode,
            self.options.storage_mode,
        )
        .map_err(crate::error::ScriptlineError::from)?;

        let report = executor::run(&ctx, self.id, &fragments, self.options.timeout_ms)?;
        tracing::info!(
            session = %self.id,
            elapsed_ms = report.elapsed_ms,
            fragments = report.fragments_loaded.len(),
            "simulation finished"
        );
        Ok(report)
    }
}

/// Convenience wrapper: build a session from `options` and execute once.
pub fn simulate(
    store: &dyn FragmentStore,
    descriptor: &ProjectDescriptor,
    options: SessionOptions,
) -> ScriptlineResult<ExecutionReport> {
    SimulationSession::new(options)?.execute(store, descriptor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryFragmentStore;

    fn seeded_store() -> InMemoryFragmentStore {
        let store = InMemoryFragmentStore::new();
        store.insert("init.js", "var initialized = true;");
        store.insert("globals.js", "var RETRIES = 3;");
        store.insert(
            "lib/util.js",
            "function recordCaller(id) { session.variables.caller = id; }",
        );
        store.insert("main.js", "recordCaller('+31-20-1234567');");
        store
    }

    #[test]
    fn zero_timeout_is_rejected_before_loading() {
        let err = SimulationSession::new(SessionOptions {
            timeout_ms: 0,
            ..SessionOptions::default()
        })
        .unwrap_err();
        assert!(format!("{err}").contains("timeout"));
    }

    #[test]
    fn reserved_modes_fail_session_construction() {
        let err = SimulationSession::new(SessionOptions {
            http_mode: HttpMode::Real,
            ..SessionOptions::default()
        })
        .unwrap_err();
        assert!(err.is_unsupported_mode());
    }

    #[test]
    fn execute_runs_the_full_load_order() {
        let store = seeded_store();
        let report = simulate(
            &store,
            &ProjectDescriptor::conventional(),
            SessionOptions::default(),
        )
        .unwrap();
        assert_eq!(
            report.fragments_loaded,
            vec!["init.js", "globals.js", "lib/util.js", "main.js"]
        );
        assert_eq!(report.session_variables["caller"], "+31-20-1234567");
    }

    #[test]
    fn entry_override_replaces_the_configured_entry() {
        let store = seeded_store();
        store.insert("scratch.js", "session.variables.mode = 'scratch';");
        let report = simulate(
            &store,
            &ProjectDescriptor::conventional(),
            SessionOptions {
                entry_script_name: Some("scratch.js".to_string()),
                ..SessionOptions::default()
            },
        )
        .unwrap();
        assert_eq!(report.fragments_loaded.last().unwrap(), "scratch.js");
        assert_eq!(report.session_variables["mode"], "scratch");
    }

    #[test]
    fn missing_fragments_are_skipped_not_fatal() {
        let store = seeded_store();
        store.remove("globals.js");
        let report = simulate(
            &store,
            &ProjectDescriptor::conventional(),
            SessionOptions::default(),
        )
        .unwrap();
        assert!(!report.fragments_loaded.contains(&"globals.js".to_string()));
    }

    #[test]
    fn sessions_do_not_share_state() {
        let store = seeded_store();
        store.insert(
            "main.js",
            "var prior = storageRead('count');\n\
             var n = prior.found ? prior.value + 1 : 1;\n\
             storageWrite('count', n);\n\
             session.variables.count = n;",
        );
        let descriptor = ProjectDescriptor::conventional();
        let first = simulate(&store, &descriptor, SessionOptions::default()).unwrap();
        let second = simulate(&store, &descriptor, SessionOptions::default()).unwrap();
        // Storage is per-session, so both runs see a fresh store.
        assert_eq!(first.session_variables["count"], 1.0);
        assert_eq!(second.session_variables["count"], 1.0);
        assert_ne!(first.session_id, second.session_id);
    }

    #[test]
    fn edits_between_runs_are_picked_up() {
        let store = seeded_store();
        let descriptor = ProjectDescriptor::conventional();
        let first = simulate(&store, &descriptor, SessionOptions::default()).unwrap();
        assert_eq!(first.session_variables["caller"], "+31-20-1234567");
        store.insert("main.js", "recordCaller('anonymous');");
        let second = simulate(&store, &descriptor, SessionOptions::default()).unwrap();
        assert_eq!(second.session_variables["caller"], "anonymous");
    }
}
