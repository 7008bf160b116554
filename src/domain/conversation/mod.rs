//! Chat history and prompt assembly

mod prompt;
mod turn;

pub use prompt::{build_request, with_context, PromptSettings, DEFAULT_SYSTEM_PROMPT};
pub use turn::{Conversation, ConversationTurn, TurnRole};
