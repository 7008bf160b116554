use serde::Deserialize;
use std::time::Duration;

use crate::domain::ingestion::{ChunkingConfig, DocumentLimits};
use crate::domain::{PromptSettings, ProviderKind, DEFAULT_SYSTEM_PROMPT};
use crate::infrastructure::ingestion::ProcessorSettings;
use crate::infrastructure::llm::ProviderEndpoints;

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub document: DocumentConfig,
    pub generation: GenerationConfig,
    pub providers: ProvidersConfig,
    pub platform: PlatformConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DocumentConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub max_chunks_for_query: usize,
    pub summary_length: usize,
    pub max_text_file_bytes: u64,
    pub max_pdf_file_bytes: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    pub temperature: f32,
    pub max_tokens: u32,
    pub system_prompt: String,
    pub history_turns: usize,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProvidersConfig {
    pub gemini: CloudProviderConfig,
    pub groq: CloudProviderConfig,
    pub ollama: LocalProviderConfig,
    pub request_timeout_secs: u64,
}

#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct CloudProviderConfig {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LocalProviderConfig {
    pub base_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PlatformConfig {
    pub local_daemon: LocalDaemonMode,
}

/// Whether the local daemon provider is offered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LocalDaemonMode {
    /// Offered unless running in a hosted environment
    #[default]
    Auto,
    On,
    Off,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl Default for DocumentConfig {
    fn default() -> Self {
        let limits = DocumentLimits::default();
        let chunking = ChunkingConfig::default();
        let settings = ProcessorSettings::default();

        Self {
            chunk_size: chunking.chunk_size,
            chunk_overlap: chunking.chunk_overlap,
            max_chunks_for_query: settings.max_chunks_for_query,
            summary_length: settings.summary_length,
            max_text_file_bytes: limits.max_text_bytes,
            max_pdf_file_bytes: limits.max_pdf_bytes,
        }
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        let prompt = PromptSettings::default();

        Self {
            temperature: prompt.temperature,
            max_tokens: prompt.max_tokens,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            history_turns: prompt.history_turns,
        }
    }
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            gemini: CloudProviderConfig::default(),
            groq: CloudProviderConfig::default(),
            ollama: LocalProviderConfig::default(),
            request_timeout_secs: 120,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

impl std::fmt::Debug for CloudProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudProviderConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl AppConfig {
    /// Load from `config/default`, `config/local` and `DOCCHAT__*` variables,
    /// then fill unset provider access from the conventional variables
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("DOCCHAT")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Self = config.try_deserialize()?;
        Ok(config.with_env_fallbacks(|name| std::env::var(name).ok()))
    }

    /// Take credentials and the daemon host from `GEMINI_API_KEY`,
    /// `GROQ_API_KEY` and `OLLAMA_HOST` when the configuration leaves them unset
    pub fn with_env_fallbacks(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let lookup = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if self.providers.gemini.api_key.is_none() {
            self.providers.gemini.api_key = ProviderKind::Gemini
                .credential_env_var()
                .and_then(lookup);
        }
        if self.providers.groq.api_key.is_none() {
            self.providers.groq.api_key = ProviderKind::Groq
                .credential_env_var()
                .and_then(lookup);
        }
        if self.providers.ollama.base_url.is_none() {
            self.providers.ollama.base_url = lookup("OLLAMA_HOST").map(|host| {
                if host.starts_with("http://") || host.starts_with("https://") {
                    host
                } else {
                    format!("http://{host}")
                }
            });
        }

        self
    }

    pub fn processor_settings(&self) -> ProcessorSettings {
        let doc = &self.document;

        ProcessorSettings {
            limits: DocumentLimits::new(doc.max_text_file_bytes, doc.max_pdf_file_bytes),
            chunking: ChunkingConfig::new(doc.chunk_size, doc.chunk_overlap),
            max_chunks_for_query: doc.max_chunks_for_query,
            summary_length: doc.summary_length,
        }
    }

    pub fn prompt_settings(&self) -> PromptSettings {
        let generation = &self.generation;

        PromptSettings {
            system_prompt: generation.system_prompt.clone(),
            temperature: generation.temperature,
            max_tokens: generation.max_tokens,
            history_turns: generation.history_turns,
        }
    }

    pub fn endpoints(&self) -> ProviderEndpoints {
        let defaults = ProviderEndpoints::default();
        let providers = &self.providers;

        ProviderEndpoints {
            gemini: providers.gemini.base_url.clone().unwrap_or(defaults.gemini),
            groq: providers.groq.base_url.clone().unwrap_or(defaults.groq),
            ollama: providers.ollama.base_url.clone().unwrap_or(defaults.ollama),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.providers.request_timeout_secs)
    }

    /// Configured credential for a cloud provider
    pub fn credential(&self, kind: ProviderKind) -> Option<&str> {
        match kind {
            ProviderKind::Gemini => self.providers.gemini.api_key.as_deref(),
            ProviderKind::Groq => self.providers.groq.api_key.as_deref(),
            ProviderKind::Ollama => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();

        assert_eq!(config.document.chunk_size, 1000);
        assert_eq!(config.document.chunk_overlap, 200);
        assert_eq!(config.document.max_pdf_file_bytes, 50 * 1024 * 1024);
        assert_eq!(config.generation.max_tokens, 2000);
        assert_eq!(config.providers.request_timeout_secs, 120);
        assert_eq!(config.platform.local_daemon, LocalDaemonMode::Auto);
        assert_eq!(config.endpoints(), ProviderEndpoints::default());
    }

    #[test]
    fn test_env_fallbacks_fill_unset_values() {
        let config = AppConfig::default().with_env_fallbacks(|name| match name {
            "GEMINI_API_KEY" => Some("AIza-env".to_string()),
            "GROQ_API_KEY" => Some("  ".to_string()),
            "OLLAMA_HOST" => Some("10.0.0.5:11434".to_string()),
            _ => None,
        });

        assert_eq!(config.credential(ProviderKind::Gemini), Some("AIza-env"));
        assert_eq!(config.credential(ProviderKind::Groq), None);
        assert_eq!(config.endpoints().ollama, "http://10.0.0.5:11434");
    }

    #[test]
    fn test_configured_values_win_over_env() {
        let mut config = AppConfig::default();
        config.providers.groq.api_key = Some("gsk_file".to_string());

        let config = config.with_env_fallbacks(|_| Some("gsk_env".to_string()));
        assert_eq!(config.credential(ProviderKind::Groq), Some("gsk_file"));
    }

    #[test]
    fn test_deserialize_partial_sections() {
        let config: AppConfig = config::Config::builder()
            .set_override("document.chunk_size", 800)
            .unwrap()
            .set_override("platform.local_daemon", "off")
            .unwrap()
            .set_override("logging.format", "json")
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.document.chunk_size, 800);
        assert_eq!(config.document.chunk_overlap, 200);
        assert_eq!(config.platform.local_daemon, LocalDaemonMode::Off);
        assert!(matches!(config.logging.format, LogFormat::Json));

        let settings = config.processor_settings();
        assert_eq!(settings.chunking.chunk_size, 800);
        assert_eq!(settings.max_chunks_for_query, 3);
    }

    #[test]
    fn test_debug_redacts_api_keys() {
        let mut config = AppConfig::default();
        config.providers.gemini.api_key = Some("AIzaSecret".to_string());

        assert!(!format!("{config:?}").contains("AIzaSecret"));
    }
}
