//! `ExceptionHolder`: the captured-error record kept on the interpreter.

use crate::diagnostic::{Diagnostic, Span};
use crate::error::Error;

/// One captured error: its kind/message (via `Error`), the source snippet
/// it happened in, and a line/column span for diagnostic rendering.
#[derive(Debug, Clone)]
pub struct ExceptionHolder {
    pub error: Error,
    /// The expression or statement text that raised, if available.
    pub expr: Option<String>,
    pub lineno: Option<usize>,
    pub end_lineno: Option<usize>,
    pub col_offset: usize,
    pub span: Option<Span>,
}

impl ExceptionHolder {
    pub fn new(error: Error) -> Self {
        Self {
            error,
            expr: None,
            lineno: None,
            end_lineno: None,
            col_offset: 0,
            span: None,
        }
    }

    pub fn with_position(mut self, lineno: usize, end_lineno: usize, col_offset: usize) -> Self {
        self.lineno = Some(lineno);
        self.end_lineno = Some(end_lineno);
        self.col_offset = col_offset;
        self
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }

    pub fn with_expr(mut self, expr: impl Into<String>) -> Self {
        self.expr = Some(expr.into());
        self
    }

    pub fn kind(&self) -> &'static str {
        self.error.kind()
    }

    pub fn message(&self) -> String {
        self.error.message()
    }

    /// One-line `"Kind: message"` rendering, used when the embedder does
    /// not ask for a full source-snippet diagnostic.
    pub fn short(&self) -> String {
        format!("{}: {}", self.kind(), self.message())
    }

    /// Rust-compiler-style rendering with the offending source line and
    /// an underline, when source text is available.
    pub fn rendered(&self, source: &str) -> String {
        match self.span {
            Some(span) => {
                let diag = Diagnostic::new(self.short())
                    .with_source(source.to_string())
                    .with_label(span, self.kind());
                diag.to_string()
            }
            None => self.short(),
        }
    }

    /// Whether two holders are duplicates for the collapsing rule in the
    /// error-handling policy: same kind, same message, same source
    /// expression.
    pub fn duplicates(&self, other: &ExceptionHolder) -> bool {
        self.kind() == other.kind() && self.message() == other.message() && self.expr == other.expr
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_renders_kind_and_message() {
        let h = ExceptionHolder::new(Error::Name("x".to_string()));
        assert_eq!(h.short(), "NameError: name 'x' is not defined");
    }

    #[test]
    fn duplicates_detects_same_kind_message_expr() {
        let a = ExceptionHolder::new(Error::Runtime("boom".into())).with_expr("f()");
        let b = ExceptionHolder::new(Error::Runtime("boom".into())).with_expr("f()");
        assert!(a.duplicates(&b));
        let c = ExceptionHolder::new(Error::Runtime("other".into())).with_expr("f()");
        assert!(!a.duplicates(&c));
    }
}
