//! The platform runtime mock.
//!
//! Builds the global bindings a call-flow script sees in production and
//! captures every observable side effect (log lines, HTTP calls, storage
//! operations) for the execution report. Host functions are closures over
//! shared interior state, so script code and the report always observe the
//! same session.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::dialect::Value;
use crate::error::ExecutionError;

/// Deployment environment a simulation impersonates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Environment {
    /// Developer sandbox; the default for simulations.
    #[default]
    Development,
    /// Pre-production acceptance stage.
    Acceptance,
    /// Live call handling.
    Production,
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            Self::Development => "development",
            Self::Acceptance => "acceptance",
            Self::Production => "production",
        };
        write!(f, "{tag}")
    }
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "development" => Ok(Self::Development),
            "acceptance" => Ok(Self::Acceptance),
            "production" => Ok(Self::Production),
            other => Err(format!("unknown environment '{other}'")),
        }
    }
}

/// How `httpRequest` behaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum HttpMode {
    /// Record the call and return a canned success response.
    #[default]
    Stub,
    /// Perform real network calls. Reserved; rejected at construction.
    Real,
}

impl fmt::Display for HttpMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            Self::Stub => "stub",
            Self::Real => "real",
        };
        write!(f, "{tag}")
    }
}

/// Where `storageRead`/`storageWrite` keep their data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StorageMode {
    /// Per-session in-memory map, discarded when the session ends.
    #[default]
    Memory,
    /// Durable on-disk storage. Reserved; rejected at construction.
    Disk,
}

impl fmt::Display for StorageMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            Self::Memory => "memory",
            Self::Disk => "disk",
        };
        write!(f, "{tag}")
    }
}

/// Severity of a captured log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    /// `logInfo`.
    Info,
    /// `logWarn`.
    Warn,
    /// `logError`.
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        };
        write!(f, "{tag}")
    }
}

/// One line emitted through the script logging functions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogLine {
    /// Severity.
    pub level: LogLevel,
    /// Rendered message (arguments joined with spaces).
    pub message: String,
    /// Capture time.
    pub at: DateTime<Utc>,
}

/// One recorded `httpRequest` invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpCall {
    /// Upper-cased request method; `GET` when the script gave none.
    pub method: String,
    /// Request URL as the script supplied it.
    pub url: String,
    /// Request body, when one was given.
    pub body: Option<String>,
    /// Capture time.
    pub at: DateTime<Utc>,
}

/// Names the platform removes from scripts. Reading a member of one, or
/// calling one, fails the fragment with a descriptive error.
const POISONED: &[&str] = &[
    "console",
    "setTimeout",
    "setInterval",
    "setImmediate",
    "clearTimeout",
    "clearInterval",
    "require",
    "eval",
    "process",
    "Promise",
];

/// Shared mutable session state the host closures capture.
#[derive(Debug)]
struct RuntimeInner {
    variables: Rc<RefCell<BTreeMap<String, Value>>>,
    logs: RefCell<Vec<LogLine>>,
    http_calls: RefCell<Vec<HttpCall>>,
    storage: RefCell<BTreeMap<String, serde_json::Value>>,
    storage_ops: Cell<u64>,
}

/// The mocked platform surface for one simulation.
#[derive(Debug)]
pub struct RuntimeContext {
    environment: Environment,
    http_mode: HttpMode,
    storage_mode: StorageMode,
    inner: Rc<RuntimeInner>,
}

impl RuntimeContext {
    /// Creates a context for the given modes.
    ///
    /// The reserved modes (`HttpMode::Real`, `StorageMode::Disk`) are
    /// rejected here rather than at first use, so a misconfigured session
    /// fails before any fragment runs.
    pub fn new(
        environment: Environment,
        http_mode: HttpMode,
        storage_mode: StorageMode,
    ) -> Result<Self, ExecutionError> {
        if http_mode == HttpMode::Real {
            return Err(ExecutionError::UnsupportedMode {
                capability: "http".to_string(),
                mode: http_mode.to_string(),
            });
        }
        if storage_mode == StorageMode::Disk {
            return Err(ExecutionError::UnsupportedMode {
                capability: "storage".to_string(),
                mode: storage_mode.to_string(),
            });
        }

        let variables = Rc::new(RefCell::new(BTreeMap::new()));
        variables
            .borrow_mut()
            .insert("environment".to_string(), Value::str(environment.to_string()));
        variables
            .borrow_mut()
            .insert("httpMode".to_string(), Value::str(http_mode.to_string()));

        Ok(Self {
            environment,
            http_mode,
            storage_mode,
            inner: Rc::new(RuntimeInner {
                variables,
                logs: RefCell::new(Vec::new()),
                http_calls: RefCell::new(Vec::new()),
                storage: RefCell::new(BTreeMap::new()),
                storage_ops: Cell::new(0),
            }),
        })
    }

    /// The environment this context impersonates.
    #[must_use]
    pub fn environment(&self) -> Environment {
        self.environment
    }

    /// The HTTP mode in effect.
    #[must_use]
    pub fn http_mode(&self) -> HttpMode {
        self.http_mode
    }

    /// The storage mode in effect.
    #[must_use]
    pub fn storage_mode(&self) -> StorageMode {
        self.storage_mode
    }

    /// Builds the full global scope for a fresh simulation run.
    #[must_use]
    pub fn bindings(&self) -> HashMap<String, Value> {
        let mut globals = HashMap::new();

        globals.insert("session".to_string(), self.session_object());
        self.install_logging(&mut globals);
        self.install_http(&mut globals);
        self.install_storage(&mut globals);
        install_stdlib(&mut globals);

        for name in POISONED {
            globals.insert((*name).to_string(), Value::Forbidden(name));
        }

        globals
    }

    /// Captured log lines, in emission order.
    #[must_use]
    pub fn log_lines(&self) -> Vec<LogLine> {
        self.inner.logs.borrow().clone()
    }

    /// Recorded HTTP calls, in emission order.
    #[must_use]
    pub fn http_calls(&self) -> Vec<HttpCall> {
        self.inner.http_calls.borrow().clone()
    }

    /// Total `storageRead` + `storageWrite` invocations.
    #[must_use]
    pub fn storage_op_count(&self) -> u64 {
        self.inner.storage_ops.get()
    }

    /// JSON snapshot of `session.variables` as the scripts left it.
    pub fn variables_snapshot(&self) -> Result<serde_json::Value, String> {
        Value::Object(Rc::clone(&self.inner.variables)).to_json()
    }

    fn session_object(&self) -> Value {
        let session = Value::object();
        if let Value::Object(map) = &session {
            let mut map = map.borrow_mut();
            map.insert(
                "variables".to_string(),
                Value::Object(Rc::clone(&self.inner.variables)),
            );
            map.insert(
                "environment".to_string(),
                Value::str(self.environment.to_string()),
            );
            map.insert("httpMode".to_string(), Value::str(self.http_mode.to_string()));
        }
        session
    }

    fn install_logging(&self, globals: &mut HashMap<String, Value>) {
        for (name, level) in [
            ("logInfo", LogLevel::Info),
            ("logWarn", LogLevel::Warn),
            ("logError", LogLevel::Error),
        ] {
            let inner = Rc::clone(&self.inner);
            globals.insert(
                name.to_string(),
                Value::native(name, move |args| {
                    let message = args
                        .iter()
                        .map(render_log_arg)
                        .collect::<Vec<_>>()
                        .join(" ");
                    match level {
                        LogLevel::Info => tracing::info!(target: "scriptline::script", "{message}"),
                        LogLevel::Warn => tracing::warn!(target: "scriptline::script", "{message}"),
                        LogLevel::Error => {
                            tracing::error!(target: "scriptline::script", "{message}");
                        }
                    }
                    inner.logs.borrow_mut().push(LogLine {
                        level,
                        message,
                        at: Utc::now(),
                    });
                    Ok(Value::Undefined)
                }),
            );
        }
    }

    fn install_http(&self, globals: &mut HashMap<String, Value>) {
        let inner = Rc::clone(&self.inner);
        globals.insert(
            "httpRequest".to_string(),
            Value::native("httpRequest", move |args| {
                // Two accepted shapes: httpRequest(url[, options]) and
                // httpRequest(options) with a 'url' member.
                let (url, options) = match args.first() {
                    Some(Value::Str(url)) if !url.is_empty() => {
                        (url.as_ref().clone(), args.get(1).cloned())
                    }
                    Some(Value::Object(options)) => {
                        let url = match options.borrow().get("url") {
                            Some(Value::Str(url)) if !url.is_empty() => url.as_ref().clone(),
                            _ => {
                                return Err(
                                    "httpRequest options need a non-empty 'url'".to_string()
                                )
                            }
                        };
                        (url, args.first().cloned())
                    }
                    _ => return Err("httpRequest requires a url".to_string()),
                };
                let (method, body) = match &options {
                    Some(Value::Object(options)) => {
                        let options = options.borrow();
                        let method = options
                            .get("method")
                            .map_or_else(|| "GET".to_string(), |m| {
                                m.to_display().to_uppercase()
                            });
                        let body = options.get("body").and_then(|b| match b {
                            Value::Undefined | Value::Null => None,
                            other => Some(other.to_display()),
                        });
                        (method, body)
                    }
                    _ => ("GET".to_string(), None),
                };

                inner.http_calls.borrow_mut().push(HttpCall {
                    method: method.clone(),
                    url: url.clone(),
                    body,
                    at: Utc::now(),
                });

                // Canned success envelope; scripts branch on success/status.
                let response = Value::object();
                if let Value::Object(map) = &response {
                    let mut map = map.borrow_mut();
                    map.insert("success".to_string(), Value::Bool(true));
                    map.insert("status".to_string(), Value::Number(200.0));
                    map.insert("data".to_string(), Value::object());
                    map.insert("headers".to_string(), Value::object());
                }
                Ok(response)
            }),
        );
    }

    fn install_storage(&self, globals: &mut HashMap<String, Value>) {
        let inner = Rc::clone(&self.inner);
        globals.insert(
            "storageRead".to_string(),
            Value::native("storageRead", move |args| {
                let key = match args.first() {
                    Some(Value::Str(key)) => key.as_ref().clone(),
                    _ => return Err("storageRead requires a string key".to_string()),
                };
                inner.storage_ops.set(inner.storage_ops.get() + 1);
                let result = Value::object();
                if let Value::Object(map) = &result {
                    let mut map = map.borrow_mut();
                    match inner.storage.borrow().get(&key) {
                        Some(stored) => {
                            map.insert("found".to_string(), Value::Bool(true));
                            map.insert("value".to_string(), Value::from_json(stored));
                        }
                        None => {
                            map.insert("found".to_string(), Value::Bool(false));
                        }
                    }
                }
                Ok(result)
            }),
        );

        let inner = Rc::clone(&self.inner);
        globals.insert(
            "storageWrite".to_string(),
            Value::native("storageWrite", move |args| {
                let key = match args.first() {
                    Some(Value::Str(key)) => key.as_ref().clone(),
                    _ => return Err("storageWrite requires a string key".to_string()),
                };
                let value = args
                    .get(1)
                    .cloned()
                    .unwrap_or(Value::Undefined)
                    .to_json()
                    .map_err(|e| format!("storageWrite value is not storable: {e}"))?;
                inner.storage_ops.set(inner.storage_ops.get() + 1);
                inner.storage.borrow_mut().insert(key, value);
                Ok(Value::Undefined)
            }),
        );
    }
}

/// Renders one log argument: objects and arrays are JSON-stringified so
/// structured values survive into the captured line.
fn render_log_arg(value: &Value) -> String {
    match value {
        Value::Object(_) | Value::Array(_) => value
            .to_json()
            .ok()
            .and_then(|json| serde_json::to_string(&json).ok())
            .unwrap_or_else(|| value.to_display()),
        other => other.to_display(),
    }
}

/// Installs the dialect's guaranteed library surface: `JSON`, `Math`,
/// `parseInt`, `parseFloat`, `String`, `Number`.
fn install_stdlib(globals: &mut HashMap<String, Value>) {
    let json = Value::object();
    if let Value::Object(map) = &json {
        let mut map = map.borrow_mut();
        map.insert(
            "stringify".to_string(),
            Value::native("JSON.stringify", |args| {
                let value = args.first().cloned().unwrap_or(Value::Undefined);
                match value {
                    Value::Undefined => Ok(Value::Undefined),
                    other => {
                        let json = other.to_json()?;
                        serde_json::to_string(&json)
                            .map(Value::str)
                            .map_err(|e| format!("JSON.stringify failed: {e}"))
                    }
                }
            }),
        );
        map.insert(
            "parse".to_string(),
            Value::native("JSON.parse", |args| {
                let text = match args.first() {
                    Some(Value::Str(s)) => s.as_ref().clone(),
                    Some(other) => other.to_display(),
                    None => return Err("JSON.parse requires a string".to_string()),
                };
                let parsed: serde_json::Value = serde_json::from_str(&text)
                    .map_err(|e| format!("JSON.parse failed: {e}"))?;
                Ok(Value::from_json(&parsed))
            }),
        );
    }
    globals.insert("JSON".to_string(), json);

    let math = Value::object();
    if let Value::Object(map) = &math {
        let mut map = map.borrow_mut();
        let unary = |name: &'static str, f: fn(f64) -> f64| {
            Value::native(name, move |args| {
                Ok(Value::Number(f(args
                    .first()
                    .map_or(f64::NAN, Value::to_number))))
            })
        };
        map.insert("floor".to_string(), unary("Math.floor", f64::floor));
        map.insert("ceil".to_string(), unary("Math.ceil", f64::ceil));
        map.insert("round".to_string(), unary("Math.round", f64::round));
        map.insert("abs".to_string(), unary("Math.abs", f64::abs));
        map.insert(
            "max".to_string(),
            Value::native("Math.max", |args| {
                Ok(Value::Number(
                    args.iter()
                        .map(Value::to_number)
                        .fold(f64::NEG_INFINITY, f64::max),
                ))
            }),
        );
        map.insert(
            "min".to_string(),
            Value::native("Math.min", |args| {
                Ok(Value::Number(
                    args.iter().map(Value::to_number).fold(f64::INFINITY, f64::min),
                ))
            }),
        );
    }
    globals.insert("Math".to_string(), math);

    globals.insert(
        "parseInt".to_string(),
        Value::native("parseInt", |args| {
            let text = args.first().map_or_else(String::new, Value::to_display);
            let trimmed = text.trim();
            let (sign, digits) = match trimmed.strip_prefix('-') {
                Some(rest) => (-1.0, rest),
                None => (1.0, trimmed.strip_prefix('+').unwrap_or(trimmed)),
            };
            let leading: String = digits.chars().take_while(char::is_ascii_digit).collect();
            Ok(match leading.parse::<f64>() {
                Ok(n) => Value::Number(sign * n),
                Err(_) => Value::Number(f64::NAN),
            })
        }),
    );
    globals.insert(
        "parseFloat".to_string(),
        Value::native("parseFloat", |args| {
            let text = args.first().map_or_else(String::new, Value::to_display);
            let trimmed = text.trim();
            // Longest numeric prefix, like the legacy engine.
            let mut end = 0;
            for (i, _) in trimmed.char_indices().map(|(i, c)| (i + c.len_utf8(), c)) {
                if trimmed[..i].parse::<f64>().is_ok() {
                    end = i;
                }
            }
            Ok(match trimmed[..end].parse::<f64>() {
                Ok(n) => Value::Number(n),
                Err(_) => Value::Number(f64::NAN),
            })
        }),
    );
    globals.insert(
        "String".to_string(),
        Value::native("String", |args| {
            Ok(Value::str(
                args.first().map_or_else(
                    || "undefined".to_string(),
                    Value::to_display,
                ),
            ))
        }),
    );
    globals.insert(
        "Number".to_string(),
        Value::native("Number", |args| {
            Ok(Value::Number(args.first().map_or(0.0, Value::to_number)))
        }),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context() -> RuntimeContext {
        RuntimeContext::new(Environment::Development, HttpMode::Stub, StorageMode::Memory)
            .unwrap()
    }

    #[test]
    fn reserved_modes_are_rejected_at_construction() {
        let err = RuntimeContext::new(
            Environment::Development,
            HttpMode::Real,
            StorageMode::Memory,
        )
        .unwrap_err();
        assert!(matches!(err, ExecutionError::UnsupportedMode { .. }));

        let err = RuntimeContext::new(
            Environment::Development,
            HttpMode::Stub,
            StorageMode::Disk,
        )
        .unwrap_err();
        assert!(matches!(err, ExecutionError::UnsupportedMode { .. }));
    }

    #[test]
    fn bindings_expose_session_and_poison_platform_names() {
        let ctx = context();
        let globals = ctx.bindings();
        assert!(matches!(globals.get("session"), Some(Value::Object(_))));
        assert!(matches!(globals.get("logInfo"), Some(Value::Native(_))));
        assert!(matches!(globals.get("JSON"), Some(Value::Object(_))));
        for name in super::POISONED {
            assert!(
                matches!(globals.get(*name), Some(Value::Forbidden(_))),
                "{name} should be poisoned"
            );
        }
    }

    #[test]
    fn session_variables_are_seeded_with_environment() {
        let ctx = context();
        let snapshot = ctx.variables_snapshot().unwrap();
        assert_eq!(snapshot["environment"], "development");
        assert_eq!(snapshot["httpMode"], "stub");
    }

    #[test]
    fn logging_is_captured_in_order() {
        let ctx = context();
        let globals = ctx.bindings();
        let Some(Value::Native(log_info)) = globals.get("logInfo") else {
            panic!("logInfo missing");
        };
        (log_info.func)(&[Value::str("first"), Value::Number(2.0)]).unwrap();
        let detail = Value::object();
        if let Value::Object(map) = &detail {
            map.borrow_mut()
                .insert("queue".to_string(), Value::str("sales"));
        }
        (log_info.func)(&[Value::str("routed"), detail]).unwrap();
        let lines = ctx.log_lines();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].message, "first 2");
        assert_eq!(lines[0].level, LogLevel::Info);
        // Structured arguments are JSON-stringified, not "[object Object]".
        assert_eq!(lines[1].message, "routed {\"queue\":\"sales\"}");
    }

    #[test]
    fn http_requests_are_recorded_and_stubbed() {
        let ctx = context();
        let globals = ctx.bindings();
        let Some(Value::Native(http)) = globals.get("httpRequest") else {
            panic!("httpRequest missing");
        };
        let options = Value::object();
        if let Value::Object(map) = &options {
            map.borrow_mut()
                .insert("url".to_string(), Value::str("https://api.example/v1"));
            map.borrow_mut()
                .insert("method".to_string(), Value::str("post"));
        }
        let response = (http.func)(&[options]).unwrap();
        let Value::Object(response) = response else {
            panic!("expected object response");
        };
        assert!(matches!(
            response.borrow().get("success"),
            Some(Value::Bool(true))
        ));
        assert!(matches!(
            response.borrow().get("status"),
            Some(Value::Number(n)) if *n == 200.0
        ));

        // String-first shape defaults to GET.
        (http.func)(&[Value::str("https://api.example/ping")]).unwrap();

        let calls = ctx.http_calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].method, "POST");
        assert_eq!(calls[0].url, "https://api.example/v1");
        assert_eq!(calls[1].method, "GET");
        assert_eq!(calls[1].url, "https://api.example/ping");
    }

    #[test]
    fn http_request_without_url_fails() {
        let ctx = context();
        let globals = ctx.bindings();
        let Some(Value::Native(http)) = globals.get("httpRequest") else {
            panic!("httpRequest missing");
        };
        assert!((http.func)(&[Value::object()]).is_err());
        assert!(ctx.http_calls().is_empty());
    }

    #[test]
    fn storage_round_trip_and_op_count() {
        let ctx = context();
        let globals = ctx.bindings();
        let Some(Value::Native(write)) = globals.get("storageWrite") else {
            panic!("storageWrite missing");
        };
        let Some(Value::Native(read)) = globals.get("storageRead") else {
            panic!("storageRead missing");
        };

        let miss = (read.func)(&[Value::str("absent")]).unwrap();
        let Value::Object(miss) = miss else {
            panic!("expected object");
        };
        assert!(matches!(miss.borrow().get("found"), Some(Value::Bool(false))));

        (write.func)(&[Value::str("k"), Value::Number(9.0)]).unwrap();
        let hit = (read.func)(&[Value::str("k")]).unwrap();
        let Value::Object(hit) = hit else {
            panic!("expected object");
        };
        assert!(matches!(hit.borrow().get("found"), Some(Value::Bool(true))));
        assert!(matches!(hit.borrow().get("value"), Some(Value::Number(n)) if *n == 9.0));

        assert_eq!(ctx.storage_op_count(), 3);
    }

    #[test]
    fn environment_round_trips_through_from_str() {
        for env in [
            Environment::Development,
            Environment::Acceptance,
            Environment::Production,
        ] {
            assert_eq!(env.to_string().parse::<Environment>().unwrap(), env);
        }
        assert!("staging".parse::<Environment>().is_err());
    }
}
