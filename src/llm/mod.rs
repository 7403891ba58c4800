pub mod anthropic;
pub mod client;

pub use anthropic::{
    AnthropicClient, ContentBlock, LlmResponse, Message, MessageContent, StopReason, ToolCall,
    ToolDefinition,
};
pub use client::LlmClient;
