//! Tool registry and dispatcher.
//!
//! The registry maps tool names to implementations and parameter schemas.
//! `dispatch` is the recovery boundary of the capability layer: whatever
//! goes wrong inside a tool — a typed error, an I/O failure, even a panic —
//! comes back as a structured [`CallResult`], never as something that could
//! abort the agent loop.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use anyhow::{bail, Result};
use futures::future::join_all;
use futures::FutureExt;
use serde_json::Value;
use tracing::{debug, warn};

use crate::llm::{ToolCall, ToolDefinition};

use super::{CallResult, Tool, ToolContext, ToolError};

/// Registry of the tools exposed to the LLM.
///
/// Constructed once at startup and passed to the runtime by reference;
/// registration order is preserved so the `tools[]` array sent to the API
/// is deterministic.
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self { tools: Vec::new() }
    }

    /// Registers a tool.
    ///
    /// Rejects names that are not lowercase alphanumeric + underscores,
    /// and duplicate registrations. Both are startup-time programming
    /// errors, so they fail the session rather than being converted into
    /// call results.
    pub fn register(&mut self, tool: Arc<dyn Tool>) -> Result<()> {
        let name = tool.name();
        if name.is_empty()
            || !name
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
        {
            bail!("invalid tool name {name:?}: must be lowercase alphanumeric + underscores");
        }
        if self.tools.iter().any(|t| t.name() == name) {
            bail!("tool {name:?} is already registered");
        }
        self.tools.push(tool);
        Ok(())
    }

    /// Number of registered tools.
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Tool definitions for the API request, in registration order.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools
            .iter()
            .map(|t| ToolDefinition {
                name: t.name().to_string(),
                description: t.description().to_string(),
                input_schema: t.parameters_schema(),
            })
            .collect()
    }

    /// Dispatches one call request and returns its structured result.
    pub async fn dispatch(&self, ctx: &ToolContext, call: &ToolCall) -> CallResult {
        let tool = match self.tools.iter().find(|t| t.name() == call.name) {
            Some(t) => t,
            None => {
                warn!("Dispatch requested unknown tool {:?}", call.name);
                return CallResult::from_error(&ToolError::UnknownTool(call.name.clone()));
            }
        };

        if let Err(reason) = validate_args(&tool.parameters_schema(), &call.input) {
            warn!("Rejecting {} call: {reason}", call.name);
            return CallResult::from_error(&ToolError::Execution(format!(
                "invalid arguments for {}: {reason}",
                call.name
            )));
        }

        debug!("Invoking tool {} (call {})", call.name, call.id);

        // AssertUnwindSafe: the tool only borrows the immutable context, so
        // observing state after a panic cannot see broken invariants.
        let invoked = AssertUnwindSafe(tool.invoke(call.input.clone(), ctx))
            .catch_unwind()
            .await;

        match invoked {
            Ok(Ok(value)) => CallResult::from_value(value),
            Ok(Err(error)) => {
                debug!("Tool {} returned error: {error}", call.name);
                CallResult::from_error(&error)
            }
            Err(panic) => {
                let message = panic
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "tool panicked".to_string());
                warn!("Tool {} panicked: {message}", call.name);
                CallResult::from_error(&ToolError::Execution(format!(
                    "tool {} panicked: {message}",
                    call.name
                )))
            }
        }
    }

    /// Dispatches every call of one round.
    ///
    /// Calls run concurrently — they are independent and share only the
    /// immutable context — but the returned pairs are in request order, so
    /// result attachment stays deterministic for the LLM.
    pub async fn dispatch_all(
        &self,
        ctx: &ToolContext,
        calls: &[ToolCall],
    ) -> Vec<(String, CallResult)> {
        let futures = calls.iter().map(|call| async move {
            let result = self.dispatch(ctx, call).await;
            (call.id.clone(), result)
        });
        join_all(futures).await
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Validates call arguments against a tool's declared parameter schema.
///
/// Checks that the arguments form an object (absent arguments count as an
/// empty one), that every required key is present, that no undeclared key
/// is passed, and that declared primitive types match. Anything deeper is
/// the tool's own business.
fn validate_args(schema: &Value, args: &Value) -> Result<(), String> {
    let empty = serde_json::Map::new();
    let args = match args {
        Value::Null => &empty,
        Value::Object(map) => map,
        other => return Err(format!("arguments must be an object, got {other}")),
    };

    let properties = schema
        .get("properties")
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default();

    if let Some(required) = schema.get("required").and_then(Value::as_array) {
        for key in required.iter().filter_map(Value::as_str) {
            if !args.contains_key(key) {
                return Err(format!("missing required parameter: {key}"));
            }
        }
    }

    for (key, value) in args {
        let declared = match properties.get(key) {
            Some(d) => d,
            None => return Err(format!("unexpected parameter: {key}")),
        };
        let expected = declared.get("type").and_then(Value::as_str).unwrap_or("");
        let ok = match expected {
            "string" => value.is_string(),
            "integer" => value.is_i64() || value.is_u64(),
            "number" => value.is_number(),
            "boolean" => value.is_boolean(),
            "array" => {
                value.is_array()
                    && match declared
                        .get("items")
                        .and_then(|i| i.get("type"))
                        .and_then(Value::as_str)
                    {
                        Some("string") => value
                            .as_array()
                            .map(|a| a.iter().all(Value::is_string))
                            .unwrap_or(false),
                        _ => true,
                    }
            }
            "object" => value.is_object(),
            _ => true,
        };
        if !ok {
            return Err(format!("parameter {key} must be of type {expected}"));
        }
    }

    Ok(())
}
