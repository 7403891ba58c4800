//! `LlmClient` trait — abstraction over the reasoning service.
//!
//! The runtime only ever talks to this trait, so the loop logic can be
//! exercised against a scripted mock and another provider can be slotted
//! in without touching the orchestration.

use anyhow::Result;
use async_trait::async_trait;

use super::{LlmResponse, Message, ToolDefinition};

/// Abstraction over the reasoning-service backend.
///
/// The provider translates the shared message/tool types into its own wire
/// format and normalizes responses back into [`LlmResponse`].
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Sends a conversation to the service and returns the response.
    ///
    /// When `tools` is `Some`, tool definitions are included and the
    /// response may contain tool_use calls. When `None`, the `tools`
    /// field is omitted.
    async fn complete(
        &self,
        system_prompt: &str,
        messages: &[Message],
        tools: Option<&[ToolDefinition]>,
    ) -> Result<LlmResponse>;

    /// Human-readable description of the provider and model.
    fn description(&self) -> String;
}
