//! doc-chat
//!
//! Question answering over uploaded documents with interchangeable language
//! model backends:
//! - TXT and PDF extraction with size limits
//! - Overlapping, boundary-aware chunking
//! - Live model discovery and health tracking for Gemini, Groq and Ollama
//! - Streaming answers grounded in the document's leading chunks

pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;

use std::sync::Arc;

use domain::DomainError;
use infrastructure::ingestion::DocumentProcessor;
use infrastructure::llm::LlmProviderFactory;
use infrastructure::platform::Platform;
use infrastructure::services::{ChatSession, ProviderManager};

/// Build a provider manager for the detected platform
pub fn create_provider_manager(config: &AppConfig) -> Result<ProviderManager, DomainError> {
    let factory = LlmProviderFactory::with_timeout(config.request_timeout(), config.endpoints())?;
    let platform = Platform::detect();
    let offered = platform.offered_providers(config.platform.local_daemon);

    tracing::debug!(platform = %platform, offered = ?offered, "Detected platform");

    Ok(ProviderManager::new(
        Arc::new(factory),
        offered,
        config.prompt_settings(),
    ))
}

/// Create a fresh session from configuration
pub fn create_session(config: &AppConfig) -> Result<ChatSession, DomainError> {
    let processor = DocumentProcessor::new(config.processor_settings());
    let providers = create_provider_manager(config)?;

    Ok(ChatSession::new(processor, providers))
}
