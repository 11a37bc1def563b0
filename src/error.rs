//! Error types for scriptline.
//!
//! All errors are strongly typed using thiserror. The scanner and the sorter
//! never fail; the assembler and the simulation session are the failure
//! boundary and convert accumulated diagnostics into one explicit error that
//! carries the full payload.

use thiserror::Error;

use crate::fragment::FragmentRole;
use crate::scanner::FragmentViolation;
use crate::store::StoreError;

/// Errors raised while assembling a project into one output file.
#[derive(Debug, Error)]
pub enum AssemblyError {
    /// A required fragment (`init`, `globals`, `entry`) is absent.
    #[error("Required {role} fragment not found: {path}")]
    MissingFragment {
        /// Logical role of the missing fragment.
        role: FragmentRole,
        /// Path that was looked up.
        path: String,
    },

    /// Production assembly found forbidden constructs.
    ///
    /// Every violation found is carried here; nothing is truncated to the
    /// first match.
    #[error("Assembly rejected: {} compliance violation(s)", violations.len())]
    ComplianceRejected {
        /// All violations, tagged with the fragment they were found in.
        violations: Vec<FragmentViolation>,
    },

    /// The project configuration record could not be parsed.
    #[error("Invalid project configuration at {path}: {message}")]
    InvalidConfig {
        /// Path of the configuration record.
        path: String,
        /// Parser diagnostic.
        message: String,
    },

    /// The fragment store failed.
    #[error("Fragment store error: {0}")]
    Store(#[from] StoreError),
}

/// Errors raised while executing fragments in the sandbox.
#[derive(Debug, Error)]
pub enum ExecutionError {
    /// A fragment threw during sandboxed evaluation.
    ///
    /// No fragment after the failing one is evaluated.
    #[error("Evaluation of '{fragment}' failed{}: {message}", line.map(|l| format!(" at line {l}")).unwrap_or_default())]
    EvaluationFailed {
        /// Name of the fragment that failed.
        fragment: String,
        /// 1-based source line, when derivable from the underlying error.
        line: Option<u32>,
        /// Underlying error message.
        message: String,
    },

    /// The run exceeded its wall-clock budget.
    #[error("Evaluation of '{fragment}' exceeded the {budget_ms}ms execution budget")]
    Timeout {
        /// Fragment in progress when the budget ran out.
        fragment: String,
        /// The overall budget for the run, in milliseconds.
        budget_ms: u64,
    },

    /// A reserved mode was requested before an implementation exists.
    #[error("Unsupported {capability} mode '{mode}': not implemented")]
    UnsupportedMode {
        /// The capability (`http`, `storage`).
        capability: String,
        /// The requested mode tag.
        mode: String,
    },

    /// The execution budget was not a positive number of milliseconds.
    #[error("Invalid timeout: {timeout_ms}ms (must be positive)")]
    InvalidTimeout {
        /// The rejected value.
        timeout_ms: u64,
    },

    /// The fragment store failed while loading the fragment set.
    #[error("Fragment store error: {0}")]
    Store(#[from] StoreError),
}

/// Top-level error type for scriptline.
#[derive(Debug, Error)]
pub enum ScriptlineError {
    /// Assembly error.
    #[error("Assembly error: {0}")]
    Assembly(#[from] AssemblyError),

    /// Execution error.
    #[error("Execution error: {0}")]
    Execution(#[from] ExecutionError),

    /// Internal error.
    #[error("Internal error: {message}")]
    Internal {
        /// Diagnostic message.
        message: String,
    },
}

impl ScriptlineError {
    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns true if this is an assembly error.
    #[must_use]
    pub const fn is_assembly(&self) -> bool {
        matches!(self, Self::Assembly(_))
    }

    /// Returns true if this is an execution error.
    #[must_use]
    pub const fn is_execution(&self) -> bool {
        matches!(self, Self::Execution(_))
    }

    /// Returns true if this error is a compliance rejection.
    #[must_use]
    pub const fn is_compliance_rejection(&self) -> bool {
        matches!(
            self,
            Self::Assembly(AssemblyError::ComplianceRejected { .. })
        )
    }

    /// Returns true if this error is an execution timeout.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Execution(ExecutionError::Timeout { .. }))
    }

    /// Returns true if this error is an unsupported-mode failure.
    #[must_use]
    pub const fn is_unsupported_mode(&self) -> bool {
        matches!(self, Self::Execution(ExecutionError::UnsupportedMode { .. }))
    }
}

/// Result type alias for scriptline operations.
pub type ScriptlineResult<T> = Result<T, ScriptlineError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::{RuleId, Violation};

    #[test]
    fn missing_fragment_names_role_and_path() {
        let err = AssemblyError::MissingFragment {
            role: FragmentRole::Entry,
            path: "main.js".to_string(),
        };
        let msg = format!("{err}");
        assert!(msg.contains("entry"));
        assert!(msg.contains("main.js"));
    }

    #[test]
    fn compliance_rejected_counts_violations() {
        let err = AssemblyError::ComplianceRejected {
            violations: vec![
                FragmentViolation {
                    fragment: "lib/a.js".to_string(),
                    violation: Violation {
                        rule: RuleId::BlockScopedDeclaration,
                        line: 3,
                        message: "block-scoped declaration".to_string(),
                        snippet: "let y = 2;".to_string(),
                    },
                },
                FragmentViolation {
                    fragment: "lib/b.js".to_string(),
                    violation: Violation {
                        rule: RuleId::ArrowFunction,
                        line: 1,
                        message: "arrow function".to_string(),
                        snippet: "var f = () => 1;".to_string(),
                    },
                },
            ],
        };
        assert!(format!("{err}").contains("2 compliance violation(s)"));
    }

    #[test]
    fn evaluation_failed_includes_line_when_present() {
        let err = ExecutionError::EvaluationFailed {
            fragment: "main.js".to_string(),
            line: Some(7),
            message: "greet is not a function".to_string(),
        };
        let msg = format!("{err}");
        assert!(msg.contains("main.js"));
        assert!(msg.contains("line 7"));
        assert!(msg.contains("greet is not a function"));
    }

    #[test]
    fn evaluation_failed_omits_line_when_unknown() {
        let err = ExecutionError::EvaluationFailed {
            fragment: "main.js".to_string(),
            line: None,
            message: "parse error".to_string(),
        };
        assert!(!format!("{err}").contains("line"));
    }

    #[test]
    fn timeout_names_fragment_and_budget() {
        let err = ExecutionError::Timeout {
            fragment: "lib/slow.js".to_string(),
            budget_ms: 5000,
        };
        let msg = format!("{err}");
        assert!(msg.contains("lib/slow.js"));
        assert!(msg.contains("5000ms"));
    }

    #[test]
    fn top_level_predicates() {
        let err: ScriptlineError = ExecutionError::Timeout {
            fragment: "a".to_string(),
            budget_ms: 1,
        }
        .into();
        assert!(err.is_execution());
        assert!(err.is_timeout());
        assert!(!err.is_assembly());
        assert!(!err.is_unsupported_mode());

        let err: ScriptlineError = AssemblyError::ComplianceRejected {
            violations: Vec::new(),
        }
        .into();
        assert!(err.is_assembly());
        assert!(err.is_compliance_rejection());

        let err = ScriptlineError::internal("unexpected state");
        assert!(format!("{err}").contains("unexpected state"));
    }
}
