pub mod conversation;
pub mod runtime;

pub use conversation::Conversation;
pub use runtime::{AgentError, AgentRuntime};
