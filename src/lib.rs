//! # Scriptline - Call-Flow Script Assembly and Simulation
//!
//! Scriptline is the core library behind tooling for developing call-handling
//! scripts against a telephony platform that executes a constrained legacy
//! dialect. It covers the two workflows that tooling needs:
//!
//! - **Assembly**: read a project's fragments (`init`, `globals`, the sorted
//!   `library` files, `entry`), scan them for constructs the platform
//!   rejects, and concatenate them deterministically into one deployable
//!   file with a BLAKE3 checksum.
//! - **Simulation**: execute the same fragment order inside a sandboxed
//!   mock of the platform runtime, capturing log lines, stubbed HTTP calls
//!   and storage operations into an inspectable report.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use scriptline::{
//!     assemble, simulate, AssembleOptions, ProjectDescriptor, SessionOptions,
//! };
//! use scriptline::store::DiskFragmentStore;
//!
//! let store = DiskFragmentStore::new("projects/helpdesk");
//! let descriptor = ProjectDescriptor::conventional().load_config(&store)?;
//!
//! // Strict production build: any compliance violation rejects it.
//! let assembly = assemble(&store, &descriptor, AssembleOptions { production: true })?;
//! println!("{} bytes, checksum {}", assembly.stats.size, assembly.stats.checksum);
//!
//! // Dry-run the call flow in the sandbox.
//! let report = simulate(&store, &descriptor, SessionOptions::default())?;
//! println!("{} log lines", report.log_lines.len());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]

// Assembly pipeline
pub mod assembler;
pub mod fragment;
pub mod order;
pub mod project;
pub mod scanner;
pub mod store;

// Simulation pipeline
pub mod dialect;
pub mod runtime;
pub mod session;

pub mod error;

// Re-export primary types at crate root for convenience
pub use assembler::{assemble, AssembleOptions, Assembly, AssemblyStats};
pub use error::{
    AssemblyError, ExecutionError, ScriptlineError, ScriptlineResult,
};
pub use fragment::{Fragment, FragmentRole};
pub use project::{ProjectConfig, ProjectDescriptor, CONFIG_FILE};
pub use runtime::{
    Environment, ExecutionReport, HttpCall, HttpMode, LogLevel, LogLine, RuntimeContext,
    StorageMode,
};
pub use scanner::{scan, FragmentViolation, RuleId, RuleSet, Violation};
pub use session::{
    simulate, SessionId, SessionOptions, SimulationSession, DEFAULT_TIMEOUT_MS,
};
pub use store::{DiskFragmentStore, FragmentStore, InMemoryFragmentStore, StoreError};
