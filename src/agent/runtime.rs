//! The agentic runtime — core of forge-agent.
//!
//! Drives the bounded multi-round exchange with the reasoning service:
//! send conversation + tool definitions, execute requested tool calls,
//! feed the results back, repeat until the model answers with plain text
//! or the iteration budget runs out.

use anyhow::{Context, Result};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::llm::{LlmClient, ToolDefinition};
use crate::tools::{ToolContext, ToolRegistry};

use super::Conversation;

/// System prompt sent with every request.
const SYSTEM_PROMPT: &str = "\
You are a helpful and autonomous AI coding agent working on a local project tree.

You have four tools: list (directories), read (files), write (files) and \
execute (Python files). All paths are relative to the working directory. \
When you need information about files, directories or code, use the tools \
instead of asking the user, and keep using them until you can answer the \
request. When you are done, reply with the final answer as plain text and \
no tool calls.";

/// Fatal orchestration failures surfaced to the caller.
#[derive(Debug, Error)]
pub enum AgentError {
    /// The round ceiling was reached and no round ever produced text to
    /// fall back on.
    #[error("no usable response after {0} rounds")]
    Exhausted(u32),
}

/// One agent session: a sequential round-trip loop over an append-only
/// conversation, with the round counter as separate, explicit state.
pub struct AgentRuntime {
    llm: Box<dyn LlmClient>,
    registry: ToolRegistry,
    context: ToolContext,
    max_rounds: u32,
}

impl AgentRuntime {
    pub fn new(
        llm: Box<dyn LlmClient>,
        registry: ToolRegistry,
        context: ToolContext,
        max_rounds: u32,
    ) -> Self {
        Self {
            llm,
            registry,
            context,
            max_rounds,
        }
    }

    /// Runs one session to completion and returns the final text.
    ///
    /// A reasoning-service failure on the very first round is fatal; on a
    /// later round the loop halts and falls back to the most recent text,
    /// like budget exhaustion does.
    pub async fn run(&self, prompt: &str) -> Result<String> {
        info!("Starting session with {}", self.llm.description());
        debug!("User prompt: {prompt}");

        let mut conversation = Conversation::new(prompt);
        let tools: Vec<ToolDefinition> = self.registry.definitions();
        let mut last_text: Option<String> = None;

        for round in 0..self.max_rounds {
            debug!("Round {} of {}", round + 1, self.max_rounds);

            let response = match self
                .llm
                .complete(SYSTEM_PROMPT, conversation.messages(), Some(&tools))
                .await
            {
                Ok(response) => response,
                Err(e) if round == 0 => {
                    return Err(e).context("reasoning service failed on the first round");
                }
                Err(e) => {
                    warn!("Reasoning service failed on round {}: {e}", round + 1);
                    break;
                }
            };

            // Append the assistant turn unconditionally so history stays
            // complete for later rounds. A fully empty turn is skipped:
            // the API rejects empty content on re-submission.
            if !response.content_blocks.is_empty() {
                conversation.push_assistant(response.content_blocks.clone());
            }

            let text = response.text.trim();
            if !text.is_empty() {
                last_text = Some(text.to_string());
            }

            if response.tool_calls.is_empty() {
                if !text.is_empty() {
                    debug!("Final response after {} round(s)", round + 1);
                    return Ok(text.to_string());
                }
                // Empty turn with no calls: the round still counts.
                continue;
            }

            for call in &response.tool_calls {
                info!("Calling tool: {} ({})", call.name, call.id);
            }
            let results = self
                .registry
                .dispatch_all(&self.context, &response.tool_calls)
                .await;
            let payloads = results
                .into_iter()
                .map(|(id, result)| {
                    debug!("Result for {id}: {}", result.to_json());
                    (id, result.to_json().to_string())
                })
                .collect();
            conversation.push_tool_results(payloads);
        }

        // Exhausted: best-effort fallback to the most recent text.
        match last_text {
            Some(text) => {
                warn!(
                    "Iteration budget of {} rounds exhausted, returning the most recent text",
                    self.max_rounds
                );
                Ok(text)
            }
            None => Err(AgentError::Exhausted(self.max_rounds).into()),
        }
    }
}
