//! LLM provider domain models and traits

mod catalog;
mod health;
mod message;
mod provider;
mod provider_kind;
mod request;
mod response;

pub use catalog::{DiscoveryOutcome, ModelCatalog};
pub use health::{HealthEvent, ProviderState};
pub use message::{Message, MessageRole};
pub use provider::{LlmProvider, LlmStream};
pub use provider_kind::{ProviderConfig, ProviderKind};
pub use request::{LlmRequest, LlmRequestBuilder};
pub use response::{FinishReason, StreamChunk};

#[cfg(test)]
pub use provider::mock::MockLlmProvider;
