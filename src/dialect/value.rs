//! Runtime values for the dialect interpreter.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use super::ast::FunctionDef;

/// A host function exposed to dialect code.
///
/// The closure captures whatever runtime state it needs; errors returned
/// from it surface in dialect code as thrown evaluation failures.
pub struct NativeFunction {
    /// Name reported by diagnostics and `typeof`-style introspection.
    pub name: &'static str,
    /// The host implementation.
    pub func: Box<dyn Fn(&[Value]) -> Result<Value, String>>,
}

impl fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeFunction")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// A dialect value.
///
/// Arrays and objects are reference types shared through `Rc<RefCell<..>>`,
/// matching the aliasing semantics scripts rely on. Object keys use a
/// `BTreeMap` so snapshots of session state serialize deterministically.
#[derive(Debug, Clone)]
pub enum Value {
    /// The absence of a value; also what undeclared reads produce.
    Undefined,
    /// The explicit null literal.
    Null,
    /// Boolean.
    Bool(bool),
    /// All numbers are 64-bit floats.
    Number(f64),
    /// Immutable string.
    Str(Rc<String>),
    /// Shared mutable array.
    Array(Rc<RefCell<Vec<Value>>>),
    /// Shared mutable object.
    Object(Rc<RefCell<BTreeMap<String, Value>>>),
    /// A script-defined function.
    Function(Rc<FunctionDef>),
    /// A host-provided function.
    Native(Rc<NativeFunction>),
    /// A platform capability that exists by name but must not be used.
    /// Any member access or call through it throws.
    Forbidden(&'static str),
}

impl Value {
    /// Builds a string value.
    pub fn str(s: impl Into<String>) -> Self {
        Value::Str(Rc::new(s.into()))
    }

    /// Builds an empty object value.
    pub fn object() -> Self {
        Value::Object(Rc::new(RefCell::new(BTreeMap::new())))
    }

    /// Builds a native-function value.
    pub fn native(
        name: &'static str,
        func: impl Fn(&[Value]) -> Result<Value, String> + 'static,
    ) -> Self {
        Value::Native(Rc::new(NativeFunction {
            name,
            func: Box::new(func),
        }))
    }

    /// The dialect's truthiness rule.
    #[must_use]
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Undefined | Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::Str(s) => !s.is_empty(),
            Value::Array(_) | Value::Object(_) | Value::Function(_) | Value::Native(_) => true,
            Value::Forbidden(_) => true,
        }
    }

    /// The `typeof` tag for this value.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null => "object",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::Str(_) => "string",
            Value::Array(_) | Value::Object(_) => "object",
            Value::Function(_) | Value::Native(_) => "function",
            Value::Forbidden(_) => "undefined",
        }
    }

    /// Coerces to a number the way the dialect's arithmetic does.
    #[must_use]
    pub fn to_number(&self) -> f64 {
        match self {
            Value::Undefined => f64::NAN,
            Value::Null => 0.0,
            Value::Bool(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            Value::Number(n) => *n,
            Value::Str(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    0.0
                } else {
                    trimmed.parse::<f64>().unwrap_or(f64::NAN)
                }
            }
            _ => f64::NAN,
        }
    }

    /// String rendering used by concatenation and log formatting.
    #[must_use]
    pub fn to_display(&self) -> String {
        match self {
            Value::Undefined => "undefined".to_string(),
            Value::Null => "null".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => format_number(*n),
            Value::Str(s) => s.as_ref().clone(),
            Value::Array(items) => {
                let rendered: Vec<String> =
                    items.borrow().iter().map(Value::to_display).collect();
                rendered.join(",")
            }
            Value::Object(_) => "[object Object]".to_string(),
            Value::Function(func) => match &func.name {
                Some(name) => format!("function {name}"),
                None => "function".to_string(),
            },
            Value::Native(native) => format!("function {}", native.name),
            Value::Forbidden(_) => "undefined".to_string(),
        }
    }

    /// Strict equality (`===`): no coercion, reference identity for
    /// arrays, objects and functions.
    #[must_use]
    pub fn strict_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => Rc::ptr_eq(a, b),
            (Value::Object(a), Value::Object(b)) => Rc::ptr_eq(a, b),
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            (Value::Native(a), Value::Native(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Loose equality (`==`): `null == undefined`, and number/string/bool
    /// operands compare through numeric coercion. Reference types still
    /// compare by identity.
    #[must_use]
    pub fn loose_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Undefined | Value::Null, Value::Undefined | Value::Null) => true,
            (Value::Str(a), Value::Str(b)) => a == b,
            (
                Value::Number(_) | Value::Str(_) | Value::Bool(_),
                Value::Number(_) | Value::Str(_) | Value::Bool(_),
            ) => {
                let (a, b) = (self.to_number(), other.to_number());
                a == b
            }
            _ => self.strict_eq(other),
        }
    }

    /// Converts to a JSON value. Functions and undefined members are
    /// dropped from objects and become `null` in arrays, mirroring the
    /// platform's serializer. Fails on cycles past the depth limit.
    pub fn to_json(&self) -> Result<serde_json::Value, String> {
        self.to_json_bounded(0)
    }

    fn to_json_bounded(&self, depth: usize) -> Result<serde_json::Value, String> {
        const MAX_DEPTH: usize = 32;
        if depth > MAX_DEPTH {
            return Err("structure too deep to serialize (possible cycle)".to_string());
        }
        Ok(match self {
            Value::Undefined | Value::Function(_) | Value::Native(_) | Value::Forbidden(_) => {
                serde_json::Value::Null
            }
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Number(n) => serde_json::Number::from_f64(*n)
                .map_or(serde_json::Value::Null, serde_json::Value::Number),
            Value::Str(s) => serde_json::Value::String(s.as_ref().clone()),
            Value::Array(items) => {
                let mut out = Vec::with_capacity(items.borrow().len());
                for item in items.borrow().iter() {
                    out.push(item.to_json_bounded(depth + 1)?);
                }
                serde_json::Value::Array(out)
            }
            Value::Object(entries) => {
                let mut map = serde_json::Map::new();
                for (key, value) in entries.borrow().iter() {
                    match value {
                        Value::Undefined | Value::Function(_) | Value::Native(_) => {}
                        other => {
                            map.insert(key.clone(), other.to_json_bounded(depth + 1)?);
                        }
                    }
                }
                serde_json::Value::Object(map)
            }
        })
    }

    /// Converts from a JSON value.
    #[must_use]
    pub fn from_json(json: &serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(*b),
            serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::String(s) => Value::str(s.clone()),
            serde_json::Value::Array(items) => {
                let converted: Vec<Value> = items.iter().map(Value::from_json).collect();
                Value::Array(Rc::new(RefCell::new(converted)))
            }
            serde_json::Value::Object(entries) => {
                let converted: BTreeMap<String, Value> = entries
                    .iter()
                    .map(|(k, v)| (k.clone(), Value::from_json(v)))
                    .collect();
                Value::Object(Rc::new(RefCell::new(converted)))
            }
        }
    }
}

/// Renders a number without a trailing `.0` when it is integral.
#[must_use]
pub(crate) fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
    } else if n == n.trunc() && n.abs() < 1e21 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}
