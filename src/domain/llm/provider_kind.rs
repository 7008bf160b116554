//! Supported backends and their session configuration

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

/// Closed set of text-generation backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Google Gemini (hosted, API key)
    Gemini,
    /// Groq (hosted, API key, OpenAI-compatible)
    Groq,
    /// Ollama daemon on the local machine
    Ollama,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 3] = [Self::Gemini, Self::Groq, Self::Ollama];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Gemini => "gemini",
            Self::Groq => "groq",
            Self::Ollama => "ollama",
        }
    }

    pub fn requires_credential(&self) -> bool {
        !self.is_local_daemon()
    }

    pub fn is_local_daemon(&self) -> bool {
        matches!(self, Self::Ollama)
    }

    /// Environment variable conventionally holding the credential
    pub fn credential_env_var(&self) -> Option<&'static str> {
        match self {
            Self::Gemini => Some("GEMINI_API_KEY"),
            Self::Groq => Some("GROQ_API_KEY"),
            Self::Ollama => None,
        }
    }

    /// Static model list a front-end may show, marked as offline data,
    /// when live discovery fails
    pub fn fallback_models(&self) -> &'static [&'static str] {
        match self {
            Self::Gemini => &[
                "gemini-2.5-flash-lite",
                "gemini-2.5-flash",
                "gemini-2.5-pro",
                "gemini-2.0-flash-exp",
            ],
            Self::Groq => &[
                "llama-3.3-70b-versatile",
                "llama-3.1-8b-instant",
                "mixtral-8x7b-32768",
                "gemma2-9b-it",
            ],
            Self::Ollama => &["llama3.2", "llama3.1", "mistral", "phi3", "qwen2.5"],
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

impl FromStr for ProviderKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "gemini" => Ok(Self::Gemini),
            "groq" => Ok(Self::Groq),
            "ollama" => Ok(Self::Ollama),
            other => Err(DomainError::validation(format!(
                "Unknown provider '{}', expected one of gemini, groq, ollama",
                other
            ))),
        }
    }
}

/// Backend selection made by the user. Replaced wholesale on reconfiguration.
#[derive(Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    kind: ProviderKind,
    model: String,
    credential: Option<String>,
    endpoint: Option<String>,
}

impl ProviderConfig {
    pub fn new(kind: ProviderKind, model: impl Into<String>) -> Self {
        Self {
            kind,
            model: model.into(),
            credential: None,
            endpoint: None,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_credential(mut self, credential: impl Into<String>) -> Self {
        self.credential = Some(credential.into());
        self
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn kind(&self) -> ProviderKind {
        self.kind
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn credential(&self) -> Option<&str> {
        self.credential.as_deref()
    }

    pub fn endpoint(&self) -> Option<&str> {
        self.endpoint.as_deref()
    }

    /// First characters of the credential, safe for display and logs
    pub fn masked_credential(&self) -> Option<String> {
        self.credential
            .as_deref()
            .map(|c| format!("{}...", c.chars().take(6).collect::<String>()))
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if self.model.trim().is_empty() {
            return Err(DomainError::validation("Model name cannot be empty"));
        }

        if self.kind.requires_credential()
            && self.credential.as_deref().is_none_or(|c| c.trim().is_empty())
        {
            return Err(DomainError::not_configured(format!(
                "{} requires an API key",
                self.kind
            )));
        }

        Ok(())
    }
}

impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("kind", &self.kind)
            .field("model", &self.model)
            .field("credential", &self.masked_credential())
            .field("endpoint", &self.endpoint)
            .finish()
    }
}
