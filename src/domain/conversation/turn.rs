use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::ingestion::DocumentMetadata;
use crate::domain::{Message, MessageRole};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Assistant,
}

/// One entry of the session's chat history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: TurnRole,
    pub content: String,
    /// Document the turn refers to, when one was loaded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// Why generation failed for this user turn
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl ConversationTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(TurnRole::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(TurnRole::Assistant, content)
    }

    fn new(role: TurnRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            source: None,
            failure: None,
            timestamp: Utc::now(),
        }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn is_failed(&self) -> bool {
        self.failure.is_some()
    }

    pub fn to_message(&self) -> Message {
        let role = match self.role {
            TurnRole::User => MessageRole::User,
            TurnRole::Assistant => MessageRole::Assistant,
        };
        Message::new(role, self.content.clone())
    }
}

/// Append-only chat history for one session
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Conversation {
    turns: Vec<ConversationTurn>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, turn: ConversationTurn) {
        self.turns.push(turn);
    }

    pub fn turns(&self) -> &[ConversationTurn] {
        &self.turns
    }

    pub fn last(&self) -> Option<&ConversationTurn> {
        self.turns.last()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// True when the newest turn is a user question still waiting for an answer
    pub fn awaiting_answer(&self) -> bool {
        self.last()
            .is_some_and(|t| t.role == TurnRole::User && !t.is_failed())
    }

    /// Mark the pending user turn as failed instead of inventing an answer
    pub fn record_failure(&mut self, reason: impl Into<String>) -> bool {
        match self.turns.last_mut() {
            Some(turn) if turn.role == TurnRole::User && turn.failure.is_none() => {
                turn.failure = Some(reason.into());
                true
            }
            _ => false,
        }
    }

    pub fn clear(&mut self) {
        self.turns.clear();
    }

    pub fn summary(&self, document: Option<&DocumentMetadata>) -> String {
        if self.turns.is_empty() {
            return "No messages yet.".to_string();
        }

        let questions = self.turns.iter().filter(|t| t.role == TurnRole::User).count();
        let answers = self
            .turns
            .iter()
            .filter(|t| t.role == TurnRole::Assistant)
            .count();

        let mut summary =
            format!("Conversation with {questions} question(s) and {answers} answer(s)");

        if let Some(meta) = document {
            let name = meta.filename.as_deref().unwrap_or("document");
            summary.push_str(&format!(
                "\nDocument: {} ({})",
                name,
                meta.format.extension().to_uppercase()
            ));
        }

        summary
    }
}
