//! Turns a conversation plus document context into a provider request

use serde::{Deserialize, Serialize};

use super::turn::{Conversation, ConversationTurn, TurnRole};
use crate::domain::{DomainError, LlmRequest, Message};

pub const DEFAULT_SYSTEM_PROMPT: &str =
    "You are a helpful assistant that answers questions about documents.";

/// Generation knobs applied to every request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptSettings {
    pub system_prompt: String,
    pub temperature: f32,
    pub max_tokens: u32,
    /// Earlier messages replayed to the model, rounded down to whole
    /// question/answer exchanges
    pub history_turns: usize,
}

impl Default for PromptSettings {
    fn default() -> Self {
        Self {
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            temperature: 0.7,
            max_tokens: 2000,
            history_turns: 6,
        }
    }
}

/// Wrap a question with the document context
pub fn with_context(question: &str, context: &str) -> String {
    format!(
        "Document context:\n{context}\n\n---\n\nUser question: {question}\n\nPlease answer based on the context provided above."
    )
}

/// Build the request for the pending user turn.
///
/// Only answered exchanges are replayed: a user turn that failed or never
/// got an answer is left out together with anything unpaired around it.
pub fn build_request(
    conversation: &Conversation,
    context: Option<&str>,
    settings: &PromptSettings,
) -> Result<LlmRequest, DomainError> {
    let (question, earlier) = match conversation.turns().split_last() {
        Some((last, earlier)) if last.role == TurnRole::User => (last, earlier),
        _ => {
            return Err(DomainError::validation(
                "Conversation must end with a user question",
            ));
        }
    };

    let exchanges: Vec<[&ConversationTurn; 2]> = earlier
        .windows(2)
        .filter(|pair| {
            pair[0].role == TurnRole::User
                && !pair[0].is_failed()
                && pair[1].role == TurnRole::Assistant
        })
        .map(|pair| [&pair[0], &pair[1]])
        .collect();
    let skip = exchanges
        .len()
        .saturating_sub(settings.history_turns / 2);
    let history: Vec<Message> = exchanges[skip..]
        .iter()
        .flatten()
        .map(|t| t.to_message())
        .collect();

    let prompt = match context.filter(|c| !c.trim().is_empty()) {
        Some(ctx) => with_context(&question.content, ctx),
        None => question.content.clone(),
    };

    Ok(LlmRequest::builder()
        .system(settings.system_prompt.clone())
        .extend(history.into_iter().skip(skip))
        .user(prompt)
        .temperature(settings.temperature)
        .max_tokens(settings.max_tokens)
        .build())
}
