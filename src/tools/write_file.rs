//! Builtin tool: write or overwrite a file.
//!
//! Missing intermediate directories are created under the boundary; the
//! target is overwritten unconditionally, no merge semantics.

use async_trait::async_trait;
use serde_json::{json, Value};

use super::{Tool, ToolContext, ToolError};

/// Builtin tool that writes a file inside the sandbox.
pub struct WriteFileTool;

#[async_trait]
impl Tool for WriteFileTool {
    fn name(&self) -> &str {
        "write"
    }

    fn description(&self) -> &str {
        "Write content to a file at a path relative to the working \
         directory, overwriting it if it exists. Missing parent \
         directories are created."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "file_path": {
                    "type": "string",
                    "description": "Path to the file, relative to the working directory"
                },
                "content": {
                    "type": "string",
                    "description": "Content to write into the file"
                }
            },
            "required": ["file_path", "content"]
        })
    }

    async fn invoke(&self, args: Value, ctx: &ToolContext) -> Result<Value, ToolError> {
        let file_path = args
            .get("file_path")
            .and_then(Value::as_str)
            .ok_or_else(|| ToolError::Execution("missing required parameter: file_path".into()))?;
        let content = args
            .get("content")
            .and_then(Value::as_str)
            .ok_or_else(|| ToolError::Execution("missing required parameter: content".into()))?;

        let resolved = ctx.boundary.resolve(file_path)?;

        // The parent of a contained path is itself contained, so directory
        // creation cannot step outside the boundary.
        if let Some(parent) = resolved.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| ToolError::Execution(format!("cannot create {file_path:?}: {e}")))?;
        }

        tokio::fs::write(&resolved, content)
            .await
            .map_err(|e| ToolError::Execution(format!("cannot write {file_path:?}: {e}")))?;

        Ok(json!({
            "file_path": file_path,
            "characters_written": content.chars().count(),
        }))
    }
}
