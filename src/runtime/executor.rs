//! Drives fragments through the interpreter and builds the report.

use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::dialect::{parse, EvalAbort, Interpreter};
use crate::error::{ExecutionError, ScriptlineError, ScriptlineResult};
use crate::fragment::Fragment;
use crate::runtime::context::{HttpCall, LogLine, RuntimeContext};
use crate::session::SessionId;

/// Everything a simulation run produced, for assertions and inspection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionReport {
    /// Identifier of the session that produced this report.
    pub session_id: SessionId,
    /// Wall-clock execution time in milliseconds.
    pub elapsed_ms: u64,
    /// Names of the fragments that ran, in execution order.
    pub fragments_loaded: Vec<String>,
    /// Number of recorded HTTP calls.
    pub http_call_count: u64,
    /// Number of storage reads plus writes.
    pub storage_op_count: u64,
    /// JSON snapshot of `session.variables` after the entry script ran.
    pub session_variables: serde_json::Value,
    /// Every recorded HTTP call, in order.
    pub http_calls: Vec<HttpCall>,
    /// Every captured log line, in order.
    pub log_lines: Vec<LogLine>,
    /// When execution finished.
    pub finished_at: DateTime<Utc>,
}

/// Runs `fragments` in order against one context and a single shared
/// global scope, stopping at the first failure or at the deadline.
///
/// The timeout covers the whole run, not each fragment: a slow library
/// fragment eats into the entry script's budget.
pub fn run(
    ctx: &RuntimeContext,
    session_id: SessionId,
    fragments: &[Fragment],
    timeout_ms: u64,
) -> ScriptlineResult<ExecutionReport> {
    let started = Instant::now();
    let deadline = started + Duration::from_millis(timeout_ms);
    let mut globals = ctx.bindings();
    let mut loaded = Vec::with_capacity(fragments.len());

    for fragment in fragments {
        tracing::debug!(session = %session_id, fragment = %fragment.name, "executing fragment");
        let program = parse(&fragment.text).map_err(|err| {
            ExecutionError::EvaluationFailed {
                fragment: fragment.name.clone(),
                line: Some(err.line),
                message: format!("syntax error: {}", err.message),
            }
        })?;

        let mut interpreter = Interpreter::new(&mut globals, deadline);
        interpreter.run_program(&program).map_err(|abort| match abort {
            EvalAbort::Thrown { message, line } => {
                ScriptlineError::from(ExecutionError::EvaluationFailed {
                    fragment: fragment.name.clone(),
                    line,
                    message,
                })
            }
            EvalAbort::Deadline => ScriptlineError::from(ExecutionError::Timeout {
                fragment: fragment.name.clone(),
                budget_ms: timeout_ms,
            }),
        })?;
        loaded.push(fragment.name.clone());
    }

    let session_variables = ctx
        .variables_snapshot()
        .map_err(|e| ScriptlineError::internal(format!("session snapshot failed: {e}")))?;
    let http_calls = ctx.http_calls();
    let log_lines = ctx.log_lines();

    Ok(ExecutionReport {
        session_id,
        elapsed_ms: started.elapsed().as_millis() as u64,
        fragments_loaded: loaded,
        http_call_count: http_calls.len() as u64,
        storage_op_count: ctx.storage_op_count(),
        session_variables,
        http_calls,
        log_lines,
        finished_at: Utc::now(),
    })
}
