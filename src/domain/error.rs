use thiserror::Error;

/// Coarse classification of a [`DomainError`].
///
/// Catalog outcomes and the provider health state machine work on this
/// copyable kind instead of the full error value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    FileTooLarge,
    UnsupportedFormat,
    Decode,
    CorruptDocument,
    Auth,
    DaemonUnreachable,
    NoModelsInstalled,
    ProviderUnavailable,
    Provider,
    NotConfigured,
    Validation,
    Configuration,
    Internal,
}

/// Core domain errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    #[error("{format} file too large: {actual} bytes exceeds the {limit} byte limit")]
    FileTooLarge {
        format: String,
        limit: u64,
        actual: u64,
    },

    #[error("Unsupported file format: {extension}")]
    UnsupportedFormat { extension: String },

    #[error("Could not decode text: {message}")]
    Decode { message: String },

    #[error("Corrupt document: {message}")]
    CorruptDocument { message: String },

    #[error("Authentication rejected by {provider}: {message}")]
    Auth { provider: String, message: String },

    #[error("Local daemon unreachable at {endpoint}: {message}")]
    DaemonUnreachable { endpoint: String, message: String },

    #[error("No models installed in the local daemon")]
    NoModelsInstalled,

    #[error("Provider unavailable: {provider} - {message}")]
    ProviderUnavailable { provider: String, message: String },

    #[error("Provider error: {provider} - {message}")]
    Provider { provider: String, message: String },

    #[error("Provider not configured: {message}")]
    NotConfigured { message: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl DomainError {
    pub fn file_too_large(format: impl Into<String>, limit: u64, actual: u64) -> Self {
        Self::FileTooLarge {
            format: format.into(),
            limit,
            actual,
        }
    }

    pub fn unsupported_format(extension: impl Into<String>) -> Self {
        Self::UnsupportedFormat {
            extension: extension.into(),
        }
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    pub fn corrupt_document(message: impl Into<String>) -> Self {
        Self::CorruptDocument {
            message: message.into(),
        }
    }

    pub fn auth(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Auth {
            provider: provider.into(),
            message: message.into(),
        }
    }

    pub fn daemon_unreachable(endpoint: impl Into<String>, message: impl Into<String>) -> Self {
        Self::DaemonUnreachable {
            endpoint: endpoint.into(),
            message: message.into(),
        }
    }

    pub fn provider_unavailable(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ProviderUnavailable {
            provider: provider.into(),
            message: message.into(),
        }
    }

    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }

    pub fn not_configured(message: impl Into<String>) -> Self {
        Self::NotConfigured {
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::FileTooLarge { .. } => ErrorKind::FileTooLarge,
            Self::UnsupportedFormat { .. } => ErrorKind::UnsupportedFormat,
            Self::Decode { .. } => ErrorKind::Decode,
            Self::CorruptDocument { .. } => ErrorKind::CorruptDocument,
            Self::Auth { .. } => ErrorKind::Auth,
            Self::DaemonUnreachable { .. } => ErrorKind::DaemonUnreachable,
            Self::NoModelsInstalled => ErrorKind::NoModelsInstalled,
            Self::ProviderUnavailable { .. } => ErrorKind::ProviderUnavailable,
            Self::Provider { .. } => ErrorKind::Provider,
            Self::NotConfigured { .. } => ErrorKind::NotConfigured,
            Self::Validation { .. } => ErrorKind::Validation,
            Self::Configuration { .. } => ErrorKind::Configuration,
            Self::Internal { .. } => ErrorKind::Internal,
        }
    }

    /// Errors caused by the uploaded file; the user recovers by supplying another file.
    pub fn is_document_error(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::FileTooLarge
                | ErrorKind::UnsupportedFormat
                | ErrorKind::Decode
                | ErrorKind::CorruptDocument
        )
    }

    /// Errors caused by backend configuration or reachability.
    pub fn is_provider_error(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::Auth
                | ErrorKind::DaemonUnreachable
                | ErrorKind::NoModelsInstalled
                | ErrorKind::ProviderUnavailable
                | ErrorKind::Provider
        )
    }

    /// Message suitable for showing to the end user of a chat front-end.
    pub fn user_message(&self) -> String {
        match self {
            Self::FileTooLarge { format, limit, .. } => format!(
                "{} file too large. Maximum size: {}MB",
                format.to_uppercase(),
                limit / (1024 * 1024)
            ),
            Self::UnsupportedFormat { extension } => {
                format!("Unsupported file format: {extension}. Upload a .txt or .pdf file.")
            }
            Self::DaemonUnreachable { .. } => {
                "Ollama is not running. Start it with `ollama serve`.".to_string()
            }
            Self::NoModelsInstalled => {
                "No models installed. Pull one with `ollama pull llama3.2`.".to_string()
            }
            Self::Auth { provider, .. } => {
                format!("The {provider} API key was rejected. Check the configured key.")
            }
            other => other.to_string(),
        }
    }
}
