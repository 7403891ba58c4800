//! Sandboxed tools exposed to the LLM via tool_use.
//!
//! Four tools — `list`, `read`, `write`, `execute` — operate on a local
//! project tree, each built on the same [`PathBoundary`] check. The runtime
//! invokes them through the [`registry::ToolRegistry`], which owns name
//! lookup, argument validation, and result normalization.

pub mod list_files;
pub mod read_file;
pub mod registry;
pub mod run_script;
pub mod write_file;

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Map, Value};
use thiserror::Error;

use crate::sandbox::{BoundaryViolation, PathBoundary};

pub use registry::ToolRegistry;

/// Runtime context shared by all tool invocations in a session.
///
/// Immutable once constructed; concurrent dispatches within one round
/// share it by reference.
pub struct ToolContext {
    /// The sandbox boundary every path argument is resolved against.
    pub boundary: PathBoundary,
    /// Maximum number of characters `read` returns before truncating.
    pub read_limit: usize,
    /// Wall-clock ceiling for one `execute` subprocess.
    pub exec_timeout: Duration,
}

/// A tool the LLM can invoke via tool_use.
///
/// The runtime calls `invoke()` when the LLM requests a tool_use; the
/// registry converts the outcome into a [`CallResult`] before it reaches
/// the conversation.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Unique identifier used in the API `tools[]` array.
    /// Must be lowercase alphanumeric + underscores.
    fn name(&self) -> &str;

    /// Human-readable description shown to the LLM so it knows when to
    /// invoke this tool.
    fn description(&self) -> &str;

    /// JSON Schema describing the parameters this tool accepts.
    /// Used as the `input_schema` field of the tool definition.
    fn parameters_schema(&self) -> Value;

    /// Executes the tool with the given arguments.
    ///
    /// Returns the raw result value; the registry normalizes it (objects
    /// pass through, anything else is wrapped as `{"result": ...}`).
    async fn invoke(&self, args: Value, ctx: &ToolContext) -> Result<Value, ToolError>;
}

/// Everything that can go wrong inside a tool invocation.
///
/// Every variant is recovered at the dispatcher boundary and turned into a
/// structured [`CallResult`]; none of them ever aborts the agent loop.
#[derive(Debug, Error)]
pub enum ToolError {
    /// Path escapes the sandbox root. No I/O was performed.
    #[error(transparent)]
    Boundary(#[from] BoundaryViolation),

    /// Target does not exist (or is not the expected kind of file).
    #[error("{0}")]
    NotFound(String),

    /// Target exists but is not a directory.
    #[error("{0}")]
    NotADirectory(String),

    /// File does not carry the allow-listed script extension.
    #[error("{0}")]
    UnsupportedFileType(String),

    /// Subprocess exceeded the wall-clock ceiling and was killed.
    #[error("execution timed out after {0} seconds")]
    Timeout(u64),

    /// Mechanism-level failure: I/O error, cannot spawn, bad arguments.
    #[error("{0}")]
    Execution(String),

    /// Dispatch requested a name no tool is registered under.
    #[error("unknown tool: {0}")]
    UnknownTool(String),
}

impl ToolError {
    /// Stable machine-readable kind, serialized into error results.
    pub fn kind(&self) -> &'static str {
        match self {
            ToolError::Boundary(_) => "boundary_violation",
            ToolError::NotFound(_) => "not_found",
            ToolError::NotADirectory(_) => "not_a_directory",
            ToolError::UnsupportedFileType(_) => "unsupported_file_type",
            ToolError::Timeout(_) => "timeout",
            ToolError::Execution(_) => "execution_failure",
            ToolError::UnknownTool(_) => "unknown_tool",
        }
    }
}

impl From<std::io::Error> for ToolError {
    fn from(e: std::io::Error) -> Self {
        ToolError::Execution(e.to_string())
    }
}

/// Discriminated outcome of one dispatched call.
///
/// Always a well-formed structured record — never a raw panic payload or
/// an untyped string — regardless of what failed inside the tool.
#[derive(Debug, Clone, PartialEq)]
pub enum CallResult {
    /// Successful invocation: a mapping of result fields.
    Success(Map<String, Value>),
    /// Failed invocation: error kind plus human-readable message.
    Error {
        kind: &'static str,
        message: String,
    },
}

impl CallResult {
    /// Normalizes a raw tool return value.
    ///
    /// A JSON object passes through unchanged; any other value is wrapped
    /// as `{"result": <stringified value>}` so the runtime only ever deals
    /// with structured results.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(map) => CallResult::Success(map),
            Value::String(s) => {
                let mut map = Map::new();
                map.insert("result".to_string(), Value::String(s));
                CallResult::Success(map)
            }
            other => {
                let mut map = Map::new();
                map.insert("result".to_string(), Value::String(other.to_string()));
                CallResult::Success(map)
            }
        }
    }

    /// Converts a tool error into a structured error result.
    pub fn from_error(error: &ToolError) -> Self {
        CallResult::Error {
            kind: error.kind(),
            message: error.to_string(),
        }
    }

    /// Whether this is an error result.
    pub fn is_error(&self) -> bool {
        matches!(self, CallResult::Error { .. })
    }

    /// The JSON payload fed back to the LLM as tool_result content.
    pub fn to_json(&self) -> Value {
        match self {
            CallResult::Success(map) => Value::Object(map.clone()),
            CallResult::Error { kind, message } => json!({
                "error": { "kind": kind, "message": message }
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalization_object_passes_through() {
        let result = CallResult::from_value(json!({"entries": [], "directory": "."}));
        match &result {
            CallResult::Success(map) => {
                assert!(map.contains_key("entries"));
                assert!(map.contains_key("directory"));
            }
            _ => panic!("expected success"),
        }
    }

    #[test]
    fn test_normalization_string_wrapped() {
        let result = CallResult::from_value(Value::String("file contents".to_string()));
        assert_eq!(result.to_json(), json!({"result": "file contents"}));
    }

    #[test]
    fn test_normalization_number_stringified() {
        let result = CallResult::from_value(json!(42));
        assert_eq!(result.to_json(), json!({"result": "42"}));
    }

    #[test]
    fn test_error_result_shape() {
        let err = ToolError::NotFound("no such file: \"a.txt\"".to_string());
        let result = CallResult::from_error(&err);
        assert!(result.is_error());
        let json = result.to_json();
        assert_eq!(json["error"]["kind"], "not_found");
        assert_eq!(json["error"]["message"], "no such file: \"a.txt\"");
    }

    #[test]
    fn test_error_kinds_are_stable() {
        let violation = BoundaryViolation {
            candidate: "../x".to_string(),
        };
        assert_eq!(ToolError::Boundary(violation).kind(), "boundary_violation");
        assert_eq!(ToolError::NotFound(String::new()).kind(), "not_found");
        assert_eq!(ToolError::NotADirectory(String::new()).kind(), "not_a_directory");
        assert_eq!(
            ToolError::UnsupportedFileType(String::new()).kind(),
            "unsupported_file_type"
        );
        assert_eq!(ToolError::Timeout(30).kind(), "timeout");
        assert_eq!(ToolError::Execution(String::new()).kind(), "execution_failure");
        assert_eq!(ToolError::UnknownTool(String::new()).kind(), "unknown_tool");
    }
}
