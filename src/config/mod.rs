//! Application configuration

mod app_config;

pub use app_config::{
    AppConfig, CloudProviderConfig, DocumentConfig, GenerationConfig, LocalDaemonMode,
    LocalProviderConfig, LogFormat, LoggingConfig, PlatformConfig, ProvidersConfig,
};
