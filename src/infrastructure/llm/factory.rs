use std::sync::Arc;
use std::time::Duration;

#[cfg(test)]
use mockall::automock;

use super::gemini::{GeminiProvider, DEFAULT_GEMINI_BASE_URL};
use super::groq::{GroqProvider, DEFAULT_GROQ_BASE_URL};
use super::http_client::HttpClient;
use super::ollama::{OllamaProvider, DEFAULT_OLLAMA_BASE_URL};
use crate::domain::{DomainError, LlmProvider, ProviderKind};

/// Base URLs used when a configuration does not override them
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderEndpoints {
    pub gemini: String,
    pub groq: String,
    pub ollama: String,
}

impl Default for ProviderEndpoints {
    fn default() -> Self {
        Self {
            gemini: DEFAULT_GEMINI_BASE_URL.to_string(),
            groq: DEFAULT_GROQ_BASE_URL.to_string(),
            ollama: DEFAULT_OLLAMA_BASE_URL.to_string(),
        }
    }
}

impl ProviderEndpoints {
    pub fn for_kind(&self, kind: ProviderKind) -> &str {
        match kind {
            ProviderKind::Gemini => &self.gemini,
            ProviderKind::Groq => &self.groq,
            ProviderKind::Ollama => &self.ollama,
        }
    }
}

/// Seam between the provider manager and concrete backends
#[cfg_attr(test, automock)]
pub trait LlmProviderFactoryTrait: Send + Sync + std::fmt::Debug {
    /// Build a client for `kind`. `endpoint` overrides the configured base URL.
    fn create(
        &self,
        kind: ProviderKind,
        credential: Option<String>,
        endpoint: Option<String>,
    ) -> Result<Arc<dyn LlmProvider>, DomainError>;
}

/// Factory for creating LLM providers
#[derive(Debug, Clone)]
pub struct LlmProviderFactory {
    client: HttpClient,
    endpoints: ProviderEndpoints,
}

impl Default for LlmProviderFactory {
    fn default() -> Self {
        Self::new(HttpClient::new(), ProviderEndpoints::default())
    }
}

impl LlmProviderFactory {
    pub fn new(client: HttpClient, endpoints: ProviderEndpoints) -> Self {
        Self { client, endpoints }
    }

    pub fn with_timeout(timeout: Duration, endpoints: ProviderEndpoints) -> Result<Self, DomainError> {
        Ok(Self::new(HttpClient::with_timeout(timeout)?, endpoints))
    }

    pub fn endpoints(&self) -> &ProviderEndpoints {
        &self.endpoints
    }

    fn require_credential(
        kind: ProviderKind,
        credential: Option<String>,
    ) -> Result<String, DomainError> {
        credential
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| DomainError::not_configured(format!("{kind} requires an API key")))
    }
}

impl LlmProviderFactoryTrait for LlmProviderFactory {
    fn create(
        &self,
        kind: ProviderKind,
        credential: Option<String>,
        endpoint: Option<String>,
    ) -> Result<Arc<dyn LlmProvider>, DomainError> {
        let base_url = endpoint.unwrap_or_else(|| self.endpoints.for_kind(kind).to_string());
        let client = self.client.clone();

        match kind {
            ProviderKind::Gemini => {
                let key = Self::require_credential(kind, credential)?;
                Ok(Arc::new(GeminiProvider::with_base_url(client, key, base_url)))
            }

            ProviderKind::Groq => {
                let key = Self::require_credential(kind, credential)?;
                Ok(Arc::new(GroqProvider::with_base_url(client, key, base_url)))
            }

            ProviderKind::Ollama => Ok(Arc::new(OllamaProvider::with_base_url(client, base_url))),
        }
    }
}
