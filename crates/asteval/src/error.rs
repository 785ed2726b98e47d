//! The interpreter's error taxonomy.
//!
//! Every variant mirrors one exception kind from the host Python taxonomy
//! (see the evaluator's error handling design). `ExceptionHolder` (in
//! `crate::exception`) wraps one of these together with source position
//! and snippet metadata before it is appended to the interpreter's error
//! list.

use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum Error {
    #[error("SyntaxError: {0}")]
    Syntax(String),

    #[error("NameError: name '{0}' is not defined")]
    Name(String),

    #[error("TypeError: {0}")]
    Type(String),

    #[error("TypeError: expected {expected}, got {got}")]
    TypeMismatch { expected: String, got: String },

    #[error("AttributeError: {0}")]
    Attribute(String),

    #[error("ValueError: {0}")]
    Value(String),

    #[error("KeyError: {0}")]
    Key(String),

    #[error("IndexError: {0}")]
    Index(String),

    #[error("ZeroDivisionError: {0}")]
    ZeroDivision(String),

    #[error("AssertionError: {0}")]
    Assertion(String),

    #[error("ImportError: {0}")]
    Import(String),

    #[error("NotImplementedError: {0}")]
    NotImplemented(String),

    #[error("RuntimeError: {0}")]
    Runtime(String),

    #[error("RecursionError: {0}")]
    Recursion(String),

    #[error("OverflowError: {0}")]
    Overflow(String),

    #[error("MemoryError: {0}")]
    Memory(String),

    #[error("FileNotFoundError: {0}")]
    FileNotFound(String),
}

impl Error {
    /// The bare exception-kind name, e.g. `"TypeError"`, as surfaced on
    /// `ExceptionHolder::exc` and matched against `except Kind:` clauses.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Syntax(_) => "SyntaxError",
            Error::Name(_) => "NameError",
            Error::Type(_) | Error::TypeMismatch { .. } => "TypeError",
            Error::Attribute(_) => "AttributeError",
            Error::Value(_) => "ValueError",
            Error::Key(_) => "KeyError",
            Error::Index(_) => "IndexError",
            Error::ZeroDivision(_) => "ZeroDivisionError",
            Error::Assertion(_) => "AssertionError",
            Error::Import(_) => "ImportError",
            Error::NotImplemented(_) => "NotImplementedError",
            Error::Runtime(_) => "RuntimeError",
            Error::Recursion(_) => "RecursionError",
            Error::Overflow(_) => "OverflowError",
            Error::Memory(_) => "MemoryError",
            Error::FileNotFound(_) => "FileNotFoundError",
        }
    }

    /// The message portion only, without the `Kind: ` prefix — what
    /// `str(exc)` would produce in the host language.
    pub fn message(&self) -> String {
        match self {
            Error::Syntax(m)
            | Error::Name(m)
            | Error::Type(m)
            | Error::Attribute(m)
            | Error::Value(m)
            | Error::Key(m)
            | Error::Index(m)
            | Error::ZeroDivision(m)
            | Error::Assertion(m)
            | Error::Import(m)
            | Error::NotImplemented(m)
            | Error::Runtime(m)
            | Error::Recursion(m)
            | Error::Overflow(m)
            | Error::Memory(m)
            | Error::FileNotFound(m) => m.clone(),
            Error::TypeMismatch { expected, got } => format!("expected {expected}, got {got}"),
        }
    }

    /// Does a bare-name `except Kind:` clause catch this error? `Exception`
    /// and `BaseException` catch everything, matching Python's hierarchy.
    pub fn matches(&self, kind: &str) -> bool {
        kind == self.kind() || kind == "Exception" || kind == "BaseException"
    }
}

pub type Result<T> = std::result::Result<T, Error>;
