//! Fragments and load-order resolution.
//!
//! A fragment is one source file contributing to the assembled output,
//! tagged with a logical role. The load order is always: `init` first,
//! `globals` second, the `library` fragments in sorted order, `entry` last.
//! Both the assembler and the simulation session resolve the order through
//! [`load_fragments`], so the two subsystems can never disagree about it.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{AssemblyError, ScriptlineError, ScriptlineResult};
use crate::order::order_fragments;
use crate::project::ProjectDescriptor;
use crate::store::FragmentStore;

/// Logical role of a fragment within the load order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FragmentRole {
    /// Platform bootstrap, always loaded first.
    Init,
    /// Shared global declarations, loaded second.
    Globals,
    /// Customer library code, loaded in sorted order.
    Library,
    /// The call-flow entry script, always loaded last.
    Entry,
}

impl fmt::Display for FragmentRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            Self::Init => "init",
            Self::Globals => "globals",
            Self::Library => "library",
            Self::Entry => "entry",
        };
        write!(f, "{tag}")
    }
}

/// A named unit of source text. Content is immutable once read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    /// Logical role.
    pub role: FragmentRole,
    /// Relative path identifying the fragment.
    pub name: String,
    /// Raw source text.
    pub text: String,
}

/// What to do when a required fragment is absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingPolicy {
    /// Fail the whole operation (assembly).
    Fail,
    /// Log a warning and skip the fragment (development-mode simulation,
    /// which permits partial-project iteration).
    WarnSkip,
}

/// Resolves the full load order and reads every fragment fresh.
///
/// Library fragments are enumerated from the library directory and ordered
/// with the project's explicit order taking precedence over the fallback
/// rule. A missing library directory is treated as an empty library set.
pub fn load_fragments(
    store: &dyn FragmentStore,
    descriptor: &ProjectDescriptor,
    missing: MissingPolicy,
) -> ScriptlineResult<Vec<Fragment>> {
    let mut fragments = Vec::new();

    for (role, path) in [
        (FragmentRole::Init, descriptor.init_path.as_str()),
        (FragmentRole::Globals, descriptor.globals_path.as_str()),
    ] {
        push_required(store, role, path, missing, &mut fragments)?;
    }

    let library_names = store.list(&descriptor.library_dir).map_err(to_store_err)?;
    let ordered = order_fragments(&library_names, &descriptor.library_order);
    for name in ordered {
        let path = join(&descriptor.library_dir, &name);
        match store.read(&path).map_err(to_store_err)? {
            Some(text) => fragments.push(Fragment {
                role: FragmentRole::Library,
                name: path,
                text,
            }),
            // Listed but unreadable on re-read: the set changed under us.
            None => {
                tracing::warn!(fragment = %path, "library fragment disappeared during load");
            }
        }
    }

    push_required(
        store,
        FragmentRole::Entry,
        &descriptor.entry_path,
        missing,
        &mut fragments,
    )?;

    Ok(fragments)
}

fn push_required(
    store: &dyn FragmentStore,
    role: FragmentRole,
    path: &str,
    missing: MissingPolicy,
    fragments: &mut Vec<Fragment>,
) -> ScriptlineResult<()> {
    match store.read(path).map_err(to_store_err)? {
        Some(text) => {
            fragments.push(Fragment {
                role,
                name: path.to_string(),
                text,
            });
            Ok(())
        }
        None => match missing {
            MissingPolicy::Fail => Err(ScriptlineError::from(AssemblyError::MissingFragment {
                role,
                path: path.to_string(),
            })),
            MissingPolicy::WarnSkip => {
                tracing::warn!(%role, fragment = %path, "required fragment missing; skipping");
                Ok(())
            }
        },
    }
}

fn to_store_err(err: crate::store::StoreError) -> ScriptlineError {
    ScriptlineError::from(AssemblyError::from(err))
}

fn join(dir: &str, name: &str) -> String {
    if dir.is_empty() {
        name.to_string()
    } else {
        format!("{}/{name}", dir.trim_end_matches('/'))
    }
}
