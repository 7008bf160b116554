use async_trait::async_trait;
use futures::Stream;
use std::fmt::Debug;
use std::pin::Pin;

use super::response::StreamChunk;
use super::{LlmRequest, ProviderKind};
use crate::domain::DomainError;

/// Stream type for LLM responses
pub type LlmStream = Pin<Box<dyn Stream<Item = Result<StreamChunk, DomainError>> + Send>>;

/// Trait for LLM providers (Gemini, Groq, Ollama)
#[async_trait]
pub trait LlmProvider: Send + Sync + Debug {
    /// Which backend this provider talks to
    fn kind(&self) -> ProviderKind;

    /// Ask the backend which text-generation models it currently offers
    async fn list_models(&self) -> Result<Vec<String>, DomainError>;

    /// Cheap reachability check, distinct from listing models
    async fn ping(&self) -> Result<(), DomainError>;

    /// Send a streaming chat completion request
    async fn chat_stream(&self, model: &str, request: LlmRequest)
        -> Result<LlmStream, DomainError>;

    /// Get the provider name
    fn provider_name(&self) -> &'static str {
        self.kind().name()
    }
}
