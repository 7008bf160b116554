use serde::{Deserialize, Serialize};

/// Reason why the generation finished
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    Stop,
    Length,
    ContentFilter,
    Other(String),
}

impl FinishReason {
    /// Map a backend finish/stop reason string onto the shared set
    pub fn parse(reason: &str) -> Self {
        match reason.to_ascii_lowercase().as_str() {
            "stop" | "end_turn" => Self::Stop,
            "length" | "max_tokens" => Self::Length,
            "content_filter" | "safety" | "recitation" | "blocklist" => Self::ContentFilter,
            other => Self::Other(other.to_string()),
        }
    }
}

/// Streaming chunk from an LLM provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamChunk {
    pub model: String,
    pub delta: Option<String>,
    /// Present on the chunk that ends the stream
    pub finish_reason: Option<FinishReason>,
}

impl StreamChunk {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            delta: None,
            finish_reason: None,
        }
    }

    pub fn with_delta(mut self, delta: impl Into<String>) -> Self {
        self.delta = Some(delta.into());
        self
    }

    pub fn with_finish_reason(mut self, reason: FinishReason) -> Self {
        self.finish_reason = Some(reason);
        self
    }

    pub fn is_final(&self) -> bool {
        self.finish_reason.is_some()
    }
}
