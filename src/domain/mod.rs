//! Domain layer - Core business logic and entities

pub mod conversation;
pub mod error;
pub mod ingestion;
pub mod llm;

pub use conversation::{
    build_request, Conversation, ConversationTurn, PromptSettings, TurnRole,
    DEFAULT_SYSTEM_PROMPT,
};
pub use error::{DomainError, ErrorKind};
pub use ingestion::{
    Chunk, ChunkMetadata, ChunkingConfig, ChunkingStrategy, DocumentFormat, DocumentLimits,
    DocumentMetadata, DocumentParser, ParsedDocument, UploadedFile,
};
pub use llm::{
    DiscoveryOutcome, FinishReason, HealthEvent, LlmProvider, LlmRequest, LlmRequestBuilder,
    LlmStream, Message, MessageRole, ModelCatalog, ProviderConfig, ProviderKind, ProviderState,
    StreamChunk,
};

#[cfg(test)]
pub use llm::MockLlmProvider;
