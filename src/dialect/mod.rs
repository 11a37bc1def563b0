//! Lexer, parser and evaluator for the target dialect.
//!
//! The deployment platform executes a constrained legacy scripting dialect:
//! `var` declarations, named functions, a single shared global scope and a
//! fixed set of host-provided globals. This module implements just that
//! subset as a small tree-walking interpreter, in the spirit of a classic
//! lexer/parser/VM split. It knows nothing about the platform mock; host
//! capabilities reach dialect code as [`Value::Native`] bindings supplied by
//! the runtime layer.

mod ast;
mod eval;
mod lexer;
mod parser;
mod value;

pub use ast::{FunctionDef, Program};
pub use eval::{EvalAbort, Interpreter};
pub use parser::{parse, ParseError};
pub use value::{NativeFunction, Value};
