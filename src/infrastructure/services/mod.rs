//! Session services: provider management, generation streams and the chat session

mod chat_session;
mod generation;
mod provider_manager;

pub use chat_session::ChatSession;
pub use generation::{GenerationEvent, GenerationStream};
pub use provider_manager::ProviderManager;
