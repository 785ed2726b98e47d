//! Asteval - a sandboxed tree-walking evaluator for a safe Python-like
//! expression/statement language.
//!
//! Asteval provides a safe execution environment for running untrusted,
//! Python-flavored code. It is not a Python implementation: it supports a
//! deliberately restricted subset, tuned for embedding a small scripting
//! surface into a host Rust application rather than running arbitrary
//! programs.
//!
//! # Quick Start
//!
//! ```
//! use asteval::{Config, Interpreter, PyValue};
//!
//! let mut interp = Interpreter::new(Config::default());
//! interp.register_fn("fetch_data", |args| {
//!     let id = args[0].as_int().unwrap_or(0);
//!     Ok(PyValue::Dict(vec![
//!         (PyValue::Str("id".to_string()), PyValue::Int(id)),
//!     ]))
//! });
//!
//! let result = interp.eval("data = fetch_data(42)\ndata", true, true).unwrap();
//! assert!(result.is_some());
//! ```
//!
//! # Supported Language Features
//!
//! ## Types
//! - `None`, `bool`, `int` (`i64`), `float`, `str`, `bytes`
//! - `list`, `tuple`, `set`, `dict`
//!
//! ## Operators
//! - Arithmetic: `+`, `-`, `*`, `/`, `//`, `%`, `**`
//! - Comparison: `==`, `!=`, `<`, `<=`, `>`, `>=`, `in`, `not in`, `is`, `is not`
//! - Boolean: `and`, `or`, `not`
//! - Bitwise: `|`, `^`, `&`, `<<`, `>>`
//!
//! ## Control Flow
//! - `if`/`elif`/`else`, conditional expressions
//! - `for`/`while` with `break`/`continue` and loop `else`
//! - `try`/`except`/`else`/`finally`, `raise`, `assert`
//! - `with`, including the enter/exit protocol (host objects opt in via
//!   `HostObject::enter`/`exit`); exit runs in reverse entry order even if
//!   the body raised
//!
//! ## Functions
//! - `def` with positional parameters, default values, `*args`, `**kwargs`
//! - Recursion, bounded by a configurable depth limit
//!
//! ## Comprehensions and f-strings
//! - List/set/dict comprehensions with nested `for`/`if` clauses
//! - f-strings (`JoinedStr`/`FormattedValue`)
//!
//! ## Imports
//! - `import module` / `import module as alias`
//! - `from module import name` / `from module import name as alias`
//! - Built-in modules: `math`
//!
//! ## Resource Limits
//! - Wall-clock budget and cycle count, enforced per `eval` call
//! - Maximum recursion depth
//! - Maximum source length
//!
//! # Not Supported
//!
//! - Class definitions, decorators, async/await, generators/yield
//! - Network, process, or unrestricted file access (`open` is read-only
//!   and bounded)
//! - `eval`, `exec`, `getattr`, `__import__`

mod builtins;
mod config;
mod diagnostic;
mod error;
mod exception;
mod format_spec;
mod interpreter;
mod modules;
mod operators;
mod procedure;
mod safety;
#[cfg(feature = "serde")]
mod serde_support;
mod slice;
mod symtable;
mod tool;
mod value;

pub use config::{Config, NodeConfig};
pub use diagnostic::{Diagnostic, FunctionCallDiagnostic, Label, Span};
pub use error::{Error, Result};
pub use exception::ExceptionHolder;
pub use interpreter::Interpreter;
pub use tool::{ArgInfo, Tool, ToolCallError, ToolInfo};
pub use value::{FromPyValue, HostObject, PyValue, TypeError};

#[cfg(feature = "macros")]
pub use asteval_macros::tool;
