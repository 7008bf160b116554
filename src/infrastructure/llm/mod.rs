//! LLM provider implementations

mod factory;
mod gemini;
mod groq;
mod http_client;
mod ollama;

pub use factory::{LlmProviderFactory, LlmProviderFactoryTrait, ProviderEndpoints};
pub use gemini::GeminiProvider;
pub use groq::GroqProvider;
pub use http_client::{into_lines, HttpClient, HttpClientTrait, HttpError};
pub use ollama::OllamaProvider;

#[cfg(test)]
pub use factory::MockLlmProviderFactoryTrait;
