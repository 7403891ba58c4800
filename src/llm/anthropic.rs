//! Anthropic Messages API provider.
//!
//! Speaks `POST /v1/messages` with `tools[]` definitions. Tool-use blocks
//! in the response are surfaced as [`ToolCall`]s; the full content-block
//! list is preserved so the runtime can append the assistant turn to the
//! conversation verbatim before replying with tool_result blocks.

use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::config::LlmConfig;

use super::client::LlmClient;

/// Messages API endpoint.
const API_URL: &str = "https://api.anthropic.com/v1/messages";

/// API version header value.
const API_VERSION: &str = "2023-06-01";

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: &'a [Message],
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<&'a [ToolDefinition]>,
}

/// One conversation turn.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Message {
    pub role: String,
    pub content: MessageContent,
}

impl Message {
    /// A plain-text user turn.
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: MessageContent::Text(text.into()),
        }
    }

    /// An assistant turn carrying the response content blocks unchanged.
    pub fn assistant(blocks: Vec<ContentBlock>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: MessageContent::Blocks(blocks),
        }
    }

    /// A user turn carrying one tool_result block per dispatched call,
    /// in request order.
    pub fn tool_results(results: Vec<(String, String)>) -> Self {
        Self {
            role: "user".to_string(),
            content: MessageContent::Blocks(
                results
                    .into_iter()
                    .map(|(tool_use_id, content)| ContentBlock::ToolResult {
                        tool_use_id,
                        content,
                    })
                    .collect(),
            ),
        }
    }
}

/// Message content: free text or structured content blocks.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Blocks(Vec<ContentBlock>),
}

/// A content block, in requests and responses alike.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        input: Value,
    },
    ToolResult {
        tool_use_id: String,
        content: String,
    },
}

/// A tool definition in the API `tools[]` array.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

/// A tool invocation requested by the model.
///
/// `id` is opaque and must be echoed back unchanged in the matching
/// tool_result so the model can correlate parallel requests.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub input: Value,
}

/// Why the model stopped generating.
#[derive(Debug, Clone, PartialEq)]
pub enum StopReason {
    EndTurn,
    ToolUse,
    MaxTokens,
    Other(String),
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
    #[serde(default)]
    stop_reason: Option<String>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    input_tokens: u32,
    output_tokens: u32,
}

/// Normalized LLM response.
#[derive(Debug, Clone)]
pub struct LlmResponse {
    /// Concatenated text blocks (may be empty on a pure tool_use turn).
    pub text: String,
    /// Tool invocations requested this turn, in response order.
    pub tool_calls: Vec<ToolCall>,
    pub stop_reason: StopReason,
    pub input_tokens: u32,
    pub output_tokens: u32,
    /// The raw content blocks, for appending the assistant turn verbatim.
    pub content_blocks: Vec<ContentBlock>,
}

/// Client for the Anthropic Messages API.
pub struct AnthropicClient {
    client: Client,
    config: LlmConfig,
}

impl AnthropicClient {
    pub fn new(config: LlmConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }
}

#[async_trait]
impl LlmClient for AnthropicClient {
    async fn complete(
        &self,
        system_prompt: &str,
        messages: &[Message],
        tools: Option<&[ToolDefinition]>,
    ) -> Result<LlmResponse> {
        let request = MessagesRequest {
            model: &self.config.model,
            max_tokens: self.config.max_tokens_per_request,
            system: system_prompt,
            messages,
            tools,
        };

        debug!(
            "Calling Messages API ({}) with {} messages{}",
            self.config.model,
            messages.len(),
            if tools.is_some() { " + tools" } else { "" }
        );

        let response = self
            .client
            .post(API_URL)
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", API_VERSION)
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Messages API error ({status}): {body}");
        }

        let resp: MessagesResponse = response.json().await?;
        Ok(normalize_response(resp))
    }

    fn description(&self) -> String {
        format!("{} ({})", self.config.provider, self.config.model)
    }
}

/// Folds a wire response into the shared [`LlmResponse`] shape.
fn normalize_response(resp: MessagesResponse) -> LlmResponse {
    let mut text_parts = Vec::new();
    let mut tool_calls = Vec::new();

    for block in &resp.content {
        match block {
            ContentBlock::Text { text } => text_parts.push(text.clone()),
            ContentBlock::ToolUse { id, name, input } => tool_calls.push(ToolCall {
                id: id.clone(),
                name: name.clone(),
                input: input.clone(),
            }),
            // tool_result never appears in a model response.
            ContentBlock::ToolResult { .. } => {}
        }
    }

    let stop_reason = if !tool_calls.is_empty() {
        StopReason::ToolUse
    } else {
        match resp.stop_reason.as_deref() {
            Some("end_turn") | None => StopReason::EndTurn,
            Some("max_tokens") => StopReason::MaxTokens,
            Some("tool_use") => StopReason::ToolUse,
            Some(other) => StopReason::Other(other.to_string()),
        }
    };

    let (input_tokens, output_tokens) = resp
        .usage
        .map(|u| (u.input_tokens, u.output_tokens))
        .unwrap_or((0, 0));

    info!("LLM response: {input_tokens} in / {output_tokens} out tokens");

    LlmResponse {
        text: text_parts.join("\n"),
        tool_calls,
        stop_reason,
        input_tokens,
        output_tokens,
        content_blocks: resp.content,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    // ── Request serialization ────────────────────────────

    #[test]
    fn test_request_serialization_with_tools() {
        let messages = vec![Message::user("List the files.")];
        let tools = vec![ToolDefinition {
            name: "list".to_string(),
            description: "List files".to_string(),
            input_schema: json!({"type": "object", "properties": {}}),
        }];
        let request = MessagesRequest {
            model: "claude-sonnet-4-5-20250929",
            max_tokens: 4096,
            system: "You are a coding agent.",
            messages: &messages,
            tools: Some(&tools),
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "claude-sonnet-4-5-20250929");
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["messages"][0]["content"], "List the files.");
        assert_eq!(json["tools"][0]["name"], "list");
        assert_eq!(json["tools"][0]["input_schema"]["type"], "object");
    }

    #[test]
    fn test_request_serialization_without_tools_omits_field() {
        let messages = vec![Message::user("Hi")];
        let request = MessagesRequest {
            model: "m",
            max_tokens: 16,
            system: "",
            messages: &messages,
            tools: None,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert!(json.get("tools").is_none());
    }

    #[test]
    fn test_tool_result_block_wire_shape() {
        let msg = Message::tool_results(vec![(
            "toolu_01".to_string(),
            "{\"result\":\"ok\"}".to_string(),
        )]);
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["role"], "user");
        assert_eq!(json["content"][0]["type"], "tool_result");
        assert_eq!(json["content"][0]["tool_use_id"], "toolu_01");
        assert_eq!(json["content"][0]["content"], "{\"result\":\"ok\"}");
    }

    #[test]
    fn test_assistant_blocks_round_trip() {
        let msg = Message::assistant(vec![
            ContentBlock::Text {
                text: "Let me look.".to_string(),
            },
            ContentBlock::ToolUse {
                id: "toolu_02".to_string(),
                name: "read".to_string(),
                input: json!({"file_path": "main.py"}),
            },
        ]);
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["content"][1]["type"], "tool_use");
        assert_eq!(json["content"][1]["name"], "read");

        let back: Message = serde_json::from_value(json).unwrap();
        assert_eq!(back, msg);
    }

    // ── Response parsing ─────────────────────────────────

    #[test]
    fn test_response_with_tool_use() {
        let json = r#"{
            "content": [
                {"type": "text", "text": "Checking the directory."},
                {"type": "tool_use", "id": "toolu_03", "name": "list", "input": {"directory": "."}}
            ],
            "stop_reason": "tool_use",
            "usage": {"input_tokens": 120, "output_tokens": 40}
        }"#;
        let resp: MessagesResponse = serde_json::from_str(json).unwrap();
        let normalized = normalize_response(resp);

        assert_eq!(normalized.text, "Checking the directory.");
        assert_eq!(normalized.tool_calls.len(), 1);
        assert_eq!(normalized.tool_calls[0].id, "toolu_03");
        assert_eq!(normalized.tool_calls[0].name, "list");
        assert_eq!(normalized.tool_calls[0].input["directory"], ".");
        assert_eq!(normalized.stop_reason, StopReason::ToolUse);
        assert_eq!(normalized.input_tokens, 120);
        assert_eq!(normalized.content_blocks.len(), 2);
    }

    #[test]
    fn test_response_text_only() {
        let json = r#"{
            "content": [{"type": "text", "text": "All done."}],
            "stop_reason": "end_turn"
        }"#;
        let resp: MessagesResponse = serde_json::from_str(json).unwrap();
        let normalized = normalize_response(resp);

        assert_eq!(normalized.text, "All done.");
        assert!(normalized.tool_calls.is_empty());
        assert_eq!(normalized.stop_reason, StopReason::EndTurn);
        assert_eq!(normalized.input_tokens, 0);
    }

    #[test]
    fn test_response_multiple_text_blocks_joined() {
        let json = r#"{
            "content": [
                {"type": "text", "text": "First."},
                {"type": "text", "text": "Second."}
            ],
            "stop_reason": "end_turn"
        }"#;
        let resp: MessagesResponse = serde_json::from_str(json).unwrap();
        assert_eq!(normalize_response(resp).text, "First.\nSecond.");
    }

    #[test]
    fn test_stop_reason_mapping() {
        for (wire, expected) in [
            (Some("end_turn"), StopReason::EndTurn),
            (None, StopReason::EndTurn),
            (Some("max_tokens"), StopReason::MaxTokens),
            (Some("refusal"), StopReason::Other("refusal".to_string())),
        ] {
            let resp = MessagesResponse {
                content: vec![],
                stop_reason: wire.map(String::from),
                usage: None,
            };
            assert_eq!(normalize_response(resp).stop_reason, expected);
        }
    }

    #[test]
    fn test_tool_calls_force_tool_use_stop_reason() {
        let resp = MessagesResponse {
            content: vec![ContentBlock::ToolUse {
                id: "t".to_string(),
                name: "list".to_string(),
                input: json!({}),
            }],
            stop_reason: Some("end_turn".to_string()),
            usage: None,
        };
        assert_eq!(normalize_response(resp).stop_reason, StopReason::ToolUse);
    }
}
