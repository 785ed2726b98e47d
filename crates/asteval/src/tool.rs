//! Tool metadata and registration types.
//!
//! This module provides types for describing host-provided functions ("tools")
//! that can be called from script code: their signature, docstring, and the
//! error shape a failed call produces.

use std::fmt;

use crate::value::TypeError;

/// Error that occurs when calling a tool.
#[derive(Debug, Clone)]
pub enum ToolCallError {
    /// A required argument was not provided.
    MissingArgument { name: String },
    /// An argument had the wrong type.
    TypeError { arg: String, error: TypeError },
    /// Tool execution failed.
    ExecutionError { message: String },
}

impl ToolCallError {
    pub fn missing_argument(name: impl Into<String>) -> Self {
        Self::MissingArgument { name: name.into() }
    }

    pub fn type_error(arg: impl Into<String>, error: TypeError) -> Self {
        Self::TypeError {
            arg: arg.into(),
            error,
        }
    }

    pub fn execution_error(message: impl Into<String>) -> Self {
        Self::ExecutionError {
            message: message.into(),
        }
    }
}

impl fmt::Display for ToolCallError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingArgument { name } => write!(f, "missing required argument: {name}"),
            Self::TypeError { arg, error } => write!(f, "argument '{arg}': {error}"),
            Self::ExecutionError { message } => write!(f, "execution error: {message}"),
        }
    }
}

impl std::error::Error for ToolCallError {}

impl From<ToolCallError> for crate::error::Error {
    fn from(e: ToolCallError) -> Self {
        crate::error::Error::Runtime(e.to_string())
    }
}

/// Trait for host functions registered onto the evaluator's symbol table.
///
/// Automatically implemented by the `#[tool]` attribute macro, which derives
/// `info()` and `call()` from a plain Rust function's signature and doc
/// comments.
pub trait Tool {
    /// The tool's metadata, used for documentation and argument binding.
    fn info() -> &'static ToolInfo;

    /// Call the tool with positional arguments already evaluated. Errors are
    /// reported as a `{"error": message}` dict rather than propagated,
    /// matching the `#[tool]` macro's generated wrapper.
    fn call(args: Vec<crate::value::PyValue>) -> crate::value::PyValue;
}

/// Information about a tool's argument.
#[derive(Debug, Clone)]
pub struct ArgInfo {
    pub name: String,
    /// The Python-style type annotation, e.g. `"str"`, `"list[int]"`.
    pub python_type: String,
    pub description: String,
    pub required: bool,
}

impl ArgInfo {
    pub fn required(
        name: impl Into<String>,
        python_type: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            python_type: python_type.into(),
            description: description.into(),
            required: true,
        }
    }

    pub fn optional(
        name: impl Into<String>,
        python_type: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            python_type: python_type.into(),
            description: description.into(),
            required: false,
        }
    }
}

/// Metadata about a tool, sufficient to render a Python-style call signature
/// and docstring — useful for presenting the available host callables to an
/// LLM planner alongside the sandboxed script surface.
#[derive(Debug, Clone)]
pub struct ToolInfo {
    pub name: String,
    pub description: String,
    pub args: Vec<ArgInfo>,
    pub returns: String,
}

impl ToolInfo {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            args: Vec::new(),
            returns: "None".to_string(),
        }
    }

    pub fn arg(
        mut self,
        name: impl Into<String>,
        python_type: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        self.args.push(ArgInfo::required(name, python_type, description));
        self
    }

    pub fn arg_opt(
        mut self,
        name: impl Into<String>,
        python_type: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        self.args.push(ArgInfo::optional(name, python_type, description));
        self
    }

    pub fn returns(mut self, python_type: impl Into<String>) -> Self {
        self.returns = python_type.into();
        self
    }

    /// `name(arg: type, opt: type | None = None) -> returns`.
    pub fn signature(&self) -> String {
        let args: Vec<String> = self
            .args
            .iter()
            .map(|arg| {
                if arg.required {
                    format!("{}: {}", arg.name, arg.python_type)
                } else {
                    format!("{}: {} | None = None", arg.name, arg.python_type)
                }
            })
            .collect();
        format!("{}({}) -> {}", self.name, args.join(", "), self.returns)
    }

    /// Full `def ...: """docstring"""` rendering.
    pub fn doc(&self) -> String {
        let mut doc = format!("def {}:\n", self.signature());
        doc.push_str(&format!("    \"\"\"{}\n", self.description));
        if !self.args.is_empty() {
            doc.push_str("\n    Args:\n");
            for arg in &self.args {
                doc.push_str(&format!("        {}: {}\n", arg.name, arg.description));
            }
        }
        doc.push_str("    \"\"\"");
        doc
    }
}

impl fmt::Display for ToolInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.doc())
    }
}

/// Render Python-style documentation for multiple tools, suitable for
/// embedding in a system prompt.
pub fn describe_tools(tools: &[ToolInfo]) -> String {
    tools.iter().map(|t| t.doc()).collect::<Vec<_>>().join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signature_with_required_and_optional_args() {
        let tool = ToolInfo::new("search", "Search for items")
            .arg("query", "str", "Search query")
            .arg_opt("limit", "int", "Max results")
            .returns("list[str]");
        assert_eq!(
            tool.signature(),
            "search(query: str, limit: int | None = None) -> list[str]"
        );
    }

    #[test]
    fn doc_contains_args_section() {
        let tool = ToolInfo::new("fetch_weather", "Get current weather for a city.")
            .arg("city", "str", "The city name")
            .returns("dict");
        let doc = tool.doc();
        assert!(doc.contains("def fetch_weather(city: str) -> dict:"));
        assert!(doc.contains("Args:"));
        assert!(doc.contains("city: The city name"));
    }

    #[test]
    fn describe_tools_joins_multiple_docs() {
        let tools = vec![
            ToolInfo::new("a", "Does A").returns("str"),
            ToolInfo::new("b", "Does B").returns("int"),
        ];
        let doc = describe_tools(&tools);
        assert!(doc.contains("def a() -> str:"));
        assert!(doc.contains("def b() -> int:"));
    }
}
