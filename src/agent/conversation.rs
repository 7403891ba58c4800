//! Append-only conversation state for one session.
//!
//! The runtime owns exactly one [`Conversation`] per session and threads
//! it through the round-trip loop; nothing is ever removed or rewritten.
//! The round counter is deliberately separate state in the runtime, not
//! inferred from the turn count.

use crate::llm::{ContentBlock, Message};

/// Ordered sequence of conversation turns, append-only.
#[derive(Debug, Clone)]
pub struct Conversation {
    messages: Vec<Message>,
}

impl Conversation {
    /// Starts a conversation with the user's prompt as the sole turn.
    pub fn new(prompt: &str) -> Self {
        Self {
            messages: vec![Message::user(prompt)],
        }
    }

    /// Appends an assistant turn with its content blocks unchanged, so
    /// the history stays complete across tool rounds.
    pub fn push_assistant(&mut self, blocks: Vec<ContentBlock>) {
        self.messages.push(Message::assistant(blocks));
    }

    /// Appends one user turn carrying a tool_result block per dispatched
    /// call, in the given (request) order.
    pub fn push_tool_results(&mut self, results: Vec<(String, String)>) {
        self.messages.push(Message::tool_results(results));
    }

    /// All turns, oldest first.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Number of turns so far.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::llm::MessageContent;

    use super::*;

    #[test]
    fn test_starts_with_the_prompt_as_sole_turn() {
        let conversation = Conversation::new("fix the tests");
        assert_eq!(conversation.len(), 1);
        assert_eq!(conversation.messages()[0].role, "user");
        assert_eq!(
            conversation.messages()[0].content,
            MessageContent::Text("fix the tests".to_string())
        );
    }

    #[test]
    fn test_turns_accumulate_in_order() {
        let mut conversation = Conversation::new("prompt");
        conversation.push_assistant(vec![ContentBlock::ToolUse {
            id: "t1".to_string(),
            name: "list".to_string(),
            input: json!({}),
        }]);
        conversation.push_tool_results(vec![("t1".to_string(), "{}".to_string())]);

        assert_eq!(conversation.len(), 3);
        assert_eq!(conversation.messages()[1].role, "assistant");
        assert_eq!(conversation.messages()[2].role, "user");
    }

    #[test]
    fn test_tool_results_keep_request_order() {
        let mut conversation = Conversation::new("prompt");
        conversation.push_tool_results(vec![
            ("t1".to_string(), "first".to_string()),
            ("t2".to_string(), "second".to_string()),
        ]);

        match &conversation.messages()[1].content {
            MessageContent::Blocks(blocks) => {
                assert_eq!(blocks.len(), 2);
                match &blocks[0] {
                    ContentBlock::ToolResult { tool_use_id, .. } => {
                        assert_eq!(tool_use_id, "t1")
                    }
                    other => panic!("expected tool_result, got {other:?}"),
                }
            }
            other => panic!("expected blocks, got {other:?}"),
        }
    }
}
