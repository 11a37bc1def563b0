//! Tree-walking evaluator.
//!
//! Scope model matches the target platform: one shared global scope across
//! all fragments, one local frame per function call, no block scoping and
//! no closure capture of another function's locals. Assigning to a name
//! that was never declared creates a global, as the legacy engine does.
//!
//! Deadline enforcement is cooperative: the wall-clock deadline is checked
//! before each statement and at the top of every loop iteration, so runaway
//! scripts are cut off within one statement's worth of work.

use std::collections::HashMap;
use std::rc::Rc;
use std::time::Instant;

use super::ast::{AssignOp, BinaryOp, Expr, FunctionDef, Program, Stmt, UnaryOp};
use super::value::Value;

/// Why evaluation stopped early.
#[derive(Debug)]
pub enum EvalAbort {
    /// A runtime error was thrown by script or host code.
    Thrown {
        /// Human-readable description.
        message: String,
        /// 1-based source line, when attributable.
        line: Option<u32>,
    },
    /// The wall-clock execution deadline passed.
    Deadline,
}

impl EvalAbort {
    fn thrown(message: impl Into<String>, line: u32) -> Self {
        EvalAbort::Thrown {
            message: message.into(),
            line: Some(line),
        }
    }
}

/// Statement-level control flow.
enum Flow {
    Normal,
    Return(Value),
    Break(u32),
    Continue(u32),
}

// Each dialect frame costs a chain of nested interpreter frames on the
// native stack; 64 keeps the guard reachable within a 2 MiB thread stack.
const MAX_CALL_DEPTH: usize = 64;

/// Evaluates programs against a shared global scope.
///
/// The interpreter borrows the globals map so successive fragments observe
/// each other's declarations; the caller owns the map across fragments.
pub struct Interpreter<'a> {
    globals: &'a mut HashMap<String, Value>,
    frames: Vec<HashMap<String, Value>>,
    deadline: Instant,
}

impl<'a> Interpreter<'a> {
    /// Creates an interpreter over an existing global scope.
    pub fn new(globals: &'a mut HashMap<String, Value>, deadline: Instant) -> Self {
        Self {
            globals,
            frames: Vec::new(),
            deadline,
        }
    }

    /// Runs a parsed fragment to completion.
    ///
    /// Function declarations are hoisted before any statement runs. A
    /// top-level `return` ends the fragment without error.
    pub fn run_program(&mut self, program: &Program) -> Result<(), EvalAbort> {
        self.hoist(&program.body);
        match self.run_block(&program.body)? {
            Flow::Break(line) => Err(EvalAbort::thrown("'break' outside of a loop", line)),
            Flow::Continue(line) => Err(EvalAbort::thrown("'continue' outside of a loop", line)),
            Flow::Normal | Flow::Return(_) => Ok(()),
        }
    }

    /// Hoists function declarations in `body` into the current scope.
    fn hoist(&mut self, body: &[Stmt]) {
        for stmt in body {
            if let Stmt::Function { name, func } = stmt {
                self.declare(name.clone(), Value::Function(Rc::clone(func)));
            }
        }
    }

    fn check_deadline(&self) -> Result<(), EvalAbort> {
        if Instant::now() >= self.deadline {
            Err(EvalAbort::Deadline)
        } else {
            Ok(())
        }
    }

    // ---- scope ----

    /// Declares a name in the innermost scope (the global scope at top
    /// level, the current call frame inside a function).
    fn declare(&mut self, name: String, value: Value) {
        match self.frames.last_mut() {
            Some(frame) => {
                frame.insert(name, value);
            }
            None => {
                self.globals.insert(name, value);
            }
        }
    }

    fn lookup(&self, name: &str) -> Option<Value> {
        if let Some(frame) = self.frames.last() {
            if let Some(value) = frame.get(name) {
                return Some(value.clone());
            }
        }
        self.globals.get(name).cloned()
    }

    /// Writes a name: the current frame if it declares it, else the global
    /// scope. An unseen name becomes a new global (implicit-global rule).
    fn assign_name(&mut self, name: &str, value: Value) {
        if let Some(frame) = self.frames.last_mut() {
            if frame.contains_key(name) {
                frame.insert(name.to_string(), value);
                return;
            }
        }
        self.globals.insert(name.to_string(), value);
    }

    // ---- statements ----

    fn run_block(&mut self, body: &[Stmt]) -> Result<Flow, EvalAbort> {
        for stmt in body {
            match self.run_stmt(stmt)? {
                Flow::Normal => {}
                other => return Ok(other),
            }
        }
        Ok(Flow::Normal)
    }

    fn run_stmt(&mut self, stmt: &Stmt) -> Result<Flow, EvalAbort> {
        self.check_deadline()?;
        match stmt {
            Stmt::Var { decls, .. } => {
                for (name, init) in decls {
                    let value = match init {
                        Some(expr) => self.eval(expr)?,
                        None => Value::Undefined,
                    };
                    self.declare(name.clone(), value);
                }
                Ok(Flow::Normal)
            }
            // Hoisted; nothing left to do in statement position.
            Stmt::Function { .. } => Ok(Flow::Normal),
            Stmt::If {
                cond,
                then,
                otherwise,
            } => {
                if self.eval(cond)?.is_truthy() {
                    self.run_block(then)
                } else if let Some(body) = otherwise {
                    self.run_block(body)
                } else {
                    Ok(Flow::Normal)
                }
            }
            Stmt::While { cond, body } => {
                loop {
                    self.check_deadline()?;
                    if !self.eval(cond)?.is_truthy() {
                        break;
                    }
                    match self.run_block(body)? {
                        Flow::Normal | Flow::Continue(_) => {}
                        Flow::Break(_) => break,
                        flow @ Flow::Return(_) => return Ok(flow),
                    }
                }
                Ok(Flow::Normal)
            }
            Stmt::For {
                init,
                cond,
                update,
                body,
            } => {
                if let Some(init) = init {
                    self.run_stmt(init)?;
                }
                loop {
                    self.check_deadline()?;
                    if let Some(cond) = cond {
                        if !self.eval(cond)?.is_truthy() {
                            break;
                        }
                    }
                    match self.run_block(body)? {
                        Flow::Normal | Flow::Continue(_) => {}
                        Flow::Break(_) => break,
                        flow @ Flow::Return(_) => return Ok(flow),
                    }
                    if let Some(update) = update {
                        self.eval(update)?;
                    }
                }
                Ok(Flow::Normal)
            }
            Stmt::Return { value, .. } => {
                let value = match value {
                    Some(expr) => self.eval(expr)?,
                    None => Value::Undefined,
                };
                Ok(Flow::Return(value))
            }
            Stmt::Break { line } => Ok(Flow::Break(*line)),
            Stmt::Continue { line } => Ok(Flow::Continue(*line)),
            Stmt::Expr { expr } => {
                self.eval(expr)?;
                Ok(Flow::Normal)
            }
        }
    }

    // ---- expressions ----

    fn eval(&mut self, expr: &Expr) -> Result<Value, EvalAbort> {
        match expr {
            Expr::Number(n) => Ok(Value::Number(*n)),
            Expr::Str(s) => Ok(Value::str(s.clone())),
            Expr::Bool(b) => Ok(Value::Bool(*b)),
            Expr::Null => Ok(Value::Null),
            Expr::Undefined => Ok(Value::Undefined),
            Expr::Ident { name, line } => self.lookup(name).ok_or_else(|| {
                EvalAbort::thrown(format!("'{name}' is not defined"), *line)
            }),
            Expr::Array(items) => {
                let mut values = Vec::with_capacity(items.len());
                for item in items {
                    values.push(self.eval(item)?);
                }
                Ok(Value::Array(Rc::new(std::cell::RefCell::new(values))))
            }
            Expr::Object(entries) => {
                let object = Value::object();
                if let Value::Object(map) = &object {
                    for (key, value_expr) in entries {
                        let value = self.eval(value_expr)?;
                        map.borrow_mut().insert(key.clone(), value);
                    }
                }
                Ok(object)
            }
            Expr::Function(def) => Ok(Value::Function(Rc::clone(def))),
            Expr::Member {
                object,
                property,
                line,
            } => {
                let object = self.eval(object)?;
                self.get_member(&object, property, *line)
            }
            Expr::Index {
                object,
                index,
                line,
            } => {
                let object = self.eval(object)?;
                let index = self.eval(index)?;
                self.get_index(&object, &index, *line)
            }
            Expr::Call { callee, args, line } => self.eval_call(callee, args, *line),
            Expr::Unary { op, operand, .. } => {
                let value = match (op, operand.as_ref()) {
                    // `typeof missing` must not throw on an unknown name.
                    (UnaryOp::Typeof, Expr::Ident { name, .. }) => {
                        self.lookup(name).unwrap_or(Value::Undefined)
                    }
                    _ => self.eval(operand)?,
                };
                match op {
                    UnaryOp::Not => Ok(Value::Bool(!value.is_truthy())),
                    UnaryOp::Neg => Ok(Value::Number(-value.to_number())),
                    UnaryOp::Typeof => Ok(Value::str(value.type_name())),
                }
            }
            Expr::Binary {
                op, left, right, ..
            } => {
                let left = self.eval(left)?;
                let right = self.eval(right)?;
                Ok(self.eval_binary(*op, &left, &right))
            }
            Expr::Logical { and, left, right } => {
                let left = self.eval(left)?;
                if *and {
                    if left.is_truthy() {
                        self.eval(right)
                    } else {
                        Ok(left)
                    }
                } else if left.is_truthy() {
                    Ok(left)
                } else {
                    self.eval(right)
                }
            }
            Expr::Conditional {
                cond,
                then,
                otherwise,
            } => {
                if self.eval(cond)?.is_truthy() {
                    self.eval(then)
                } else {
                    self.eval(otherwise)
                }
            }
            Expr::Assign {
                target,
                op,
                value,
                line,
            } => {
                let rhs = self.eval(value)?;
                let new_value = match op {
                    AssignOp::Assign => rhs,
                    AssignOp::AddAssign => {
                        let current = self.eval(target)?;
                        self.eval_binary(BinaryOp::Add, &current, &rhs)
                    }
                    AssignOp::SubAssign => {
                        let current = self.eval(target)?;
                        self.eval_binary(BinaryOp::Sub, &current, &rhs)
                    }
                };
                self.store(target, new_value.clone(), *line)?;
                Ok(new_value)
            }
            Expr::Postfix {
                target,
                increment,
                line,
            } => {
                let current = self.eval(target)?.to_number();
                let next = if *increment { current + 1.0 } else { current - 1.0 };
                self.store(target, Value::Number(next), *line)?;
                Ok(Value::Number(current))
            }
        }
    }

    fn eval_binary(&mut self, op: BinaryOp, left: &Value, right: &Value) -> Value {
        match op {
            BinaryOp::Add => {
                // String concatenation wins when either side is a string.
                if matches!(left, Value::Str(_)) || matches!(right, Value::Str(_)) {
                    Value::str(format!("{}{}", left.to_display(), right.to_display()))
                } else {
                    Value::Number(left.to_number() + right.to_number())
                }
            }
            BinaryOp::Sub => Value::Number(left.to_number() - right.to_number()),
            BinaryOp::Mul => Value::Number(left.to_number() * right.to_number()),
            BinaryOp::Div => Value::Number(left.to_number() / right.to_number()),
            BinaryOp::Mod => Value::Number(left.to_number() % right.to_number()),
            BinaryOp::Eq => Value::Bool(left.loose_eq(right)),
            BinaryOp::Ne => Value::Bool(!left.loose_eq(right)),
            BinaryOp::StrictEq => Value::Bool(left.strict_eq(right)),
            BinaryOp::StrictNe => Value::Bool(!left.strict_eq(right)),
            BinaryOp::Lt | BinaryOp::Gt | BinaryOp::Le | BinaryOp::Ge => {
                let result = if let (Value::Str(a), Value::Str(b)) = (left, right) {
                    match op {
                        BinaryOp::Lt => a < b,
                        BinaryOp::Gt => a > b,
                        BinaryOp::Le => a <= b,
                        _ => a >= b,
                    }
                } else {
                    let (a, b) = (left.to_number(), right.to_number());
                    match op {
                        BinaryOp::Lt => a < b,
                        BinaryOp::Gt => a > b,
                        BinaryOp::Le => a <= b,
                        _ => a >= b,
                    }
                };
                Value::Bool(result)
            }
        }
    }

    // ---- member and index access ----

    fn get_member(
        &mut self,
        object: &Value,
        property: &str,
        line: u32,
    ) -> Result<Value, EvalAbort> {
        match object {
            Value::Forbidden(name) => Err(EvalAbort::thrown(
                format!("'{name}' is not available in the call-flow runtime"),
                line,
            )),
            Value::Object(entries) => Ok(entries
                .borrow()
                .get(property)
                .cloned()
                .unwrap_or(Value::Undefined)),
            Value::Array(items) => match property {
                "length" => Ok(Value::Number(items.borrow().len() as f64)),
                _ => Ok(Value::Undefined),
            },
            Value::Str(s) => match property {
                "length" => Ok(Value::Number(s.chars().count() as f64)),
                _ => Ok(Value::Undefined),
            },
            Value::Undefined | Value::Null => Err(EvalAbort::thrown(
                format!(
                    "cannot read property '{property}' of {}",
                    object.to_display()
                ),
                line,
            )),
            _ => Ok(Value::Undefined),
        }
    }

    fn get_index(
        &mut self,
        object: &Value,
        index: &Value,
        line: u32,
    ) -> Result<Value, EvalAbort> {
        match object {
            Value::Array(items) => {
                let i = index.to_number();
                if i.fract() == 0.0 && i >= 0.0 && (i as usize) < items.borrow().len() {
                    Ok(items.borrow()[i as usize].clone())
                } else {
                    Ok(Value::Undefined)
                }
            }
            Value::Str(s) => {
                let i = index.to_number();
                if i.fract() == 0.0 && i >= 0.0 {
                    Ok(s.chars()
                        .nth(i as usize)
                        .map_or(Value::Undefined, |c| Value::str(c.to_string())))
                } else {
                    Ok(Value::Undefined)
                }
            }
            _ => self.get_member(object, &index.to_display(), line),
        }
    }

    fn store(&mut self, target: &Expr, value: Value, line: u32) -> Result<(), EvalAbort> {
        match target {
            Expr::Ident { name, .. } => {
                self.assign_name(name, value);
                Ok(())
            }
            Expr::Member {
                object, property, ..
            } => {
                let object = self.eval(object)?;
                self.set_property(&object, property, value, line)
            }
            Expr::Index { object, index, .. } => {
                let object = self.eval(object)?;
                let index = self.eval(index)?;
                match &object {
                    Value::Array(items) => {
                        let i = index.to_number();
                        if i.fract() == 0.0 && i >= 0.0 {
                            let i = i as usize;
                            let mut items = items.borrow_mut();
                            if i >= items.len() {
                                items.resize(i + 1, Value::Undefined);
                            }
                            items[i] = value;
                            Ok(())
                        } else {
                            Err(EvalAbort::thrown(
                                format!("invalid array index {}", index.to_display()),
                                line,
                            ))
                        }
                    }
                    _ => self.set_property(&object, &index.to_display(), value, line),
                }
            }
            _ => Err(EvalAbort::thrown("invalid assignment target", line)),
        }
    }

    fn set_property(
        &mut self,
        object: &Value,
        property: &str,
        value: Value,
        line: u32,
    ) -> Result<(), EvalAbort> {
        match object {
            Value::Object(entries) => {
                entries.borrow_mut().insert(property.to_string(), value);
                Ok(())
            }
            Value::Forbidden(name) => Err(EvalAbort::thrown(
                format!("'{name}' is not available in the call-flow runtime"),
                line,
            )),
            other => Err(EvalAbort::thrown(
                format!("cannot set property '{property}' on a {}", other.type_name()),
                line,
            )),
        }
    }

    // ---- calls ----

    fn eval_call(
        &mut self,
        callee: &Expr,
        args: &[Expr],
        line: u32,
    ) -> Result<Value, EvalAbort> {
        // Method calls dispatch on the receiver for the string/array
        // builtins; everything else resolves the callee to a value first.
        if let Expr::Member {
            object, property, ..
        } = callee
        {
            let receiver = self.eval(object)?;
            match &receiver {
                Value::Str(_) | Value::Array(_) => {
                    let mut arg_values = Vec::with_capacity(args.len());
                    for arg in args {
                        arg_values.push(self.eval(arg)?);
                    }
                    return self.call_builtin_method(&receiver, property, &arg_values, line);
                }
                _ => {
                    let callee_value = self.get_member(&receiver, property, line)?;
                    let mut arg_values = Vec::with_capacity(args.len());
                    for arg in args {
                        arg_values.push(self.eval(arg)?);
                    }
                    return self.call_value(&callee_value, &arg_values, property, line);
                }
            }
        }

        let callee_value = self.eval(callee)?;
        let mut arg_values = Vec::with_capacity(args.len());
        for arg in args {
            arg_values.push(self.eval(arg)?);
        }
        let name = match callee {
            Expr::Ident { name, .. } => name.as_str(),
            _ => "expression",
        };
        self.call_value(&callee_value, &arg_values, name, line)
    }

    fn call_value(
        &mut self,
        callee: &Value,
        args: &[Value],
        name: &str,
        line: u32,
    ) -> Result<Value, EvalAbort> {
        match callee {
            Value::Function(def) => self.call_function(def, args, line),
            Value::Native(native) => {
                (native.func)(args).map_err(|message| EvalAbort::thrown(message, line))
            }
            Value::Forbidden(blocked) => Err(EvalAbort::thrown(
                format!("'{blocked}' is not available in the call-flow runtime"),
                line,
            )),
            other => Err(EvalAbort::thrown(
                format!("'{name}' is not a function (it is {})", other.type_name()),
                line,
            )),
        }
    }

    fn call_function(
        &mut self,
        def: &Rc<FunctionDef>,
        args: &[Value],
        line: u32,
    ) -> Result<Value, EvalAbort> {
        if self.frames.len() >= MAX_CALL_DEPTH {
            return Err(EvalAbort::thrown("call stack overflow", line));
        }
        self.check_deadline()?;

        let mut frame = HashMap::new();
        for (i, param) in def.params.iter().enumerate() {
            frame.insert(
                param.clone(),
                args.get(i).cloned().unwrap_or(Value::Undefined),
            );
        }
        self.frames.push(frame);
        self.hoist(&def.body);
        let result = self.run_block(&def.body);
        self.frames.pop();

        match result? {
            Flow::Return(value) => Ok(value),
            Flow::Break(line) => Err(EvalAbort::thrown("'break' outside of a loop", line)),
            Flow::Continue(line) => Err(EvalAbort::thrown("'continue' outside of a loop", line)),
            Flow::Normal => Ok(Value::Undefined),
        }
    }

    /// String and array builtins the legacy engine guarantees.
    fn call_builtin_method(
        &mut self,
        receiver: &Value,
        method: &str,
        args: &[Value],
        line: u32,
    ) -> Result<Value, EvalAbort> {
        match receiver {
            Value::Str(s) => self.call_string_method(s, method, args, line),
            Value::Array(items) => self.call_array_method(items, method, args, line),
            _ => unreachable!("dispatched only for strings and arrays"),
        }
    }

    fn call_string_method(
        &mut self,
        s: &Rc<String>,
        method: &str,
        args: &[Value],
        line: u32,
    ) -> Result<Value, EvalAbort> {
        let arg = |i: usize| args.get(i).cloned().unwrap_or(Value::Undefined);
        Ok(match method {
            "toUpperCase" => Value::str(s.to_uppercase()),
            "toLowerCase" => Value::str(s.to_lowercase()),
            "trim" => Value::str(s.trim().to_string()),
            "indexOf" => {
                let needle = arg(0).to_display();
                match s.find(&needle) {
                    Some(byte_pos) => Value::Number(s[..byte_pos].chars().count() as f64),
                    None => Value::Number(-1.0),
                }
            }
            "charAt" => {
                let i = arg(0).to_number();
                if i.fract() == 0.0 && i >= 0.0 {
                    s.chars()
                        .nth(i as usize)
                        .map_or(Value::str(""), |c| Value::str(c.to_string()))
                } else {
                    Value::str("")
                }
            }
            "substring" => {
                let chars: Vec<char> = s.chars().collect();
                let clamp = |v: f64| -> usize {
                    if v.is_nan() || v < 0.0 {
                        0
                    } else {
                        (v as usize).min(chars.len())
                    }
                };
                let mut start = clamp(arg(0).to_number());
                let mut end = match args.get(1) {
                    Some(Value::Undefined) | None => chars.len(),
                    Some(v) => clamp(v.to_number()),
                };
                if start > end {
                    std::mem::swap(&mut start, &mut end);
                }
                Value::str(chars[start..end].iter().collect::<String>())
            }
            "split" => {
                let sep = arg(0).to_display();
                let parts: Vec<Value> = if sep.is_empty() {
                    s.chars().map(|c| Value::str(c.to_string())).collect()
                } else {
                    s.split(&sep as &str).map(Value::str).collect()
                };
                Value::Array(Rc::new(std::cell::RefCell::new(parts)))
            }
            "replace" => {
                let from = arg(0).to_display();
                let to = arg(1).to_display();
                // First occurrence only, like the legacy engine.
                Value::str(s.replacen(&from as &str, &to, 1))
            }
            _ => {
                return Err(EvalAbort::thrown(
                    format!("string has no method '{method}'"),
                    line,
                ))
            }
        })
    }

    fn call_array_method(
        &mut self,
        items: &Rc<std::cell::RefCell<Vec<Value>>>,
        method: &str,
        args: &[Value],
        line: u32,
    ) -> Result<Value, EvalAbort> {
        Ok(match method {
            "push" => {
                let mut items = items.borrow_mut();
                for arg in args {
                    items.push(arg.clone());
                }
                Value::Number(items.len() as f64)
            }
            "pop" => items.borrow_mut().pop().unwrap_or(Value::Undefined),
            "shift" => {
                let mut items = items.borrow_mut();
                if items.is_empty() {
                    Value::Undefined
                } else {
                    items.remove(0)
                }
            }
            "join" => {
                let sep = match args.first() {
                    Some(Value::Undefined) | None => ",".to_string(),
                    Some(v) => v.to_display(),
                };
                let rendered: Vec<String> =
                    items.borrow().iter().map(Value::to_display).collect();
                Value::str(rendered.join(&sep))
            }
            "indexOf" => {
                let needle = args.first().cloned().unwrap_or(Value::Undefined);
                let pos = items
                    .borrow()
                    .iter()
                    .position(|item| item.strict_eq(&needle));
                Value::Number(pos.map_or(-1.0, |p| p as f64))
            }
            "slice" => {
                let items_ref = items.borrow();
                let len = items_ref.len() as f64;
                let resolve = |v: f64| -> usize {
                    let v = if v < 0.0 { (len + v).max(0.0) } else { v.min(len) };
                    v as usize
                };
                let start = resolve(args.first().map_or(0.0, Value::to_number));
                let end = match args.get(1) {
                    Some(Value::Undefined) | None => items_ref.len(),
                    Some(v) => resolve(v.to_number()),
                };
                let copied: Vec<Value> = if start < end {
                    items_ref[start..end].to_vec()
                } else {
                    Vec::new()
                };
                Value::Array(Rc::new(std::cell::RefCell::new(copied)))
            }
            "concat" => {
                let mut merged = items.borrow().clone();
                for arg in args {
                    match arg {
                        Value::Array(other) => merged.extend(other.borrow().iter().cloned()),
                        other => merged.push(other.clone()),
                    }
                }
                Value::Array(Rc::new(std::cell::RefCell::new(merged)))
            }
            _ => {
                return Err(EvalAbort::thrown(
                    format!("array has no method '{method}'"),
                    line,
                ))
            }
        })
    }
}
