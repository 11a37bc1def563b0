//! Sandboxed stand-in for the call-handling execution platform.
//!
//! [`context::RuntimeContext`] mocks the host surface a deployed script
//! sees: the session object, logging, HTTP and key-value storage, plus the
//! poisoned names the platform removes. [`executor`] drives fragments
//! through the interpreter against one context and produces the report the
//! simulation session returns.

pub mod context;
pub mod executor;

pub use context::{Environment, HttpCall, HttpMode, LogLevel, LogLine, RuntimeContext, StorageMode};
pub use executor::ExecutionReport;
