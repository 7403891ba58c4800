//! Builtin tool: read the contents of a file.
//!
//! Content longer than the configured limit is cut at the limit and a
//! truncation marker naming the file and the limit is appended. Truncation
//! is a success outcome — the LLM recognizes it by the marker text, not by
//! an error.

use async_trait::async_trait;
use serde_json::{json, Value};

use super::{Tool, ToolContext, ToolError};

/// Builtin tool that reads a file inside the sandbox.
pub struct ReadFileTool;

#[async_trait]
impl Tool for ReadFileTool {
    fn name(&self) -> &str {
        "read"
    }

    fn description(&self) -> &str {
        "Read the contents of a file at a path relative to the working \
         directory. Long files are truncated and end with a \
         '[...File ... truncated ...]' marker."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "file_path": {
                    "type": "string",
                    "description": "Path to the file, relative to the working directory"
                }
            },
            "required": ["file_path"]
        })
    }

    async fn invoke(&self, args: Value, ctx: &ToolContext) -> Result<Value, ToolError> {
        let file_path = args
            .get("file_path")
            .and_then(Value::as_str)
            .ok_or_else(|| ToolError::Execution("missing required parameter: file_path".into()))?;

        let resolved = ctx.boundary.resolve(file_path)?;

        let not_found = || {
            ToolError::NotFound(format!(
                "file not found or not a regular file: {file_path:?}"
            ))
        };
        let metadata = tokio::fs::metadata(&resolved).await.map_err(|_| not_found())?;
        if !metadata.is_file() {
            return Err(not_found());
        }

        let content = tokio::fs::read_to_string(&resolved)
            .await
            .map_err(|e| ToolError::Execution(format!("cannot read {file_path:?}: {e}")))?;

        // Limit and marker length are counted in characters, matching the
        // limit itself.
        let limit = ctx.read_limit;
        if content.chars().count() > limit {
            let mut truncated: String = content.chars().take(limit).collect();
            truncated.push_str(&format!(
                "[...File {file_path:?} truncated at {limit} characters]"
            ));
            return Ok(Value::String(truncated));
        }

        Ok(Value::String(content))
    }
}
