//! Builtin tool: execute a Python script inside the sandbox.
//!
//! Only `.py` files are allow-listed. The interpreter runs with its working
//! directory at the boundary's parent (so scripts can reference
//! project-relative resources) under a hard wall-clock timeout; on expiry
//! the process is killed and `Timeout` is returned.
//!
//! A non-zero exit code is NOT a tool failure — the LLM needs to see script
//! failures to react to them. `ExecutionFailure` is reserved for the
//! mechanism itself (cannot spawn, interpreter missing).

use std::process::Stdio;

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;

use super::{Tool, ToolContext, ToolError};

/// The single allow-listed script extension.
const SCRIPT_EXTENSION: &str = "py";

/// Interpreter binary used to run scripts.
const INTERPRETER: &str = "python3";

/// Builtin tool that runs a Python file with optional arguments.
pub struct RunScriptTool;

#[async_trait]
impl Tool for RunScriptTool {
    fn name(&self) -> &str {
        "execute"
    }

    fn description(&self) -> &str {
        "Execute a Python file at a path relative to the working directory, \
         with optional arguments. Returns the exit code and captured stdout \
         and stderr; a non-zero exit code means the script failed, not the \
         tool."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "file_path": {
                    "type": "string",
                    "description": "Path to the Python file, relative to the working directory"
                },
                "arguments": {
                    "type": "array",
                    "items": { "type": "string" },
                    "description": "Optional arguments passed to the script"
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
        let arguments: Vec<String> = args
            .get("arguments")
            .and_then(Value::as_array)
            .map(|a| {
                a.iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        let resolved = ctx.boundary.resolve(file_path)?;

        if tokio::fs::metadata(&resolved).await.is_err() {
            return Err(ToolError::NotFound(format!("file {file_path:?} not found")));
        }
        if resolved.extension().and_then(|e| e.to_str()) != Some(SCRIPT_EXTENSION) {
            return Err(ToolError::UnsupportedFileType(format!(
                "{file_path:?} is not a Python file"
            )));
        }

        // Scripts run from the boundary's parent so they can import and
        // open project-relative resources.
        let root = ctx.boundary.root();
        let workdir = root.parent().unwrap_or(root);

        debug!("Running {INTERPRETER} {} (args: {arguments:?})", resolved.display());

        let child = tokio::process::Command::new(INTERPRETER)
            .arg(&resolved)
            .args(&arguments)
            .current_dir(workdir)
            .env("PYTHONPATH", workdir)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| ToolError::Execution(format!("cannot spawn {INTERPRETER}: {e}")))?;

        // On timeout the output future is dropped, which kills the child
        // (kill_on_drop above).
        let output = match tokio::time::timeout(ctx.exec_timeout, child.wait_with_output()).await
        {
            Ok(result) => {
                result.map_err(|e| ToolError::Execution(format!("cannot collect output: {e}")))?
            }
            Err(_) => return Err(ToolError::Timeout(ctx.exec_timeout.as_secs())),
        };

        Ok(json!({
            "exit_code": output.status.code(),
            "stdout": String::from_utf8_lossy(&output.stdout).trim_end().to_string(),
            "stderr": String::from_utf8_lossy(&output.stderr).trim_end().to_string(),
        }))
    }
}
