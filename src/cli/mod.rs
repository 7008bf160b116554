//! CLI module for doc-chat
//!
//! Drives the document processor and provider manager from a terminal:
//! - `ingest`: extract and chunk a document, print what the model would see
//! - `models`: discover the models a provider offers
//! - `status`: platform and provider availability
//! - `chat`: ask questions about a document, one-shot or interactively

pub mod chat;
pub mod ingest;
pub mod models;
pub mod status;

use clap::{Parser, Subcommand};

use crate::config::AppConfig;
use crate::infrastructure::logging;

/// doc-chat - Ask questions about TXT and PDF documents with Gemini, Groq or Ollama
#[derive(Parser)]
#[command(name = "doc-chat")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Extract and chunk a document
    Ingest(ingest::IngestArgs),

    /// List the models a provider offers
    Models(models::ModelsArgs),

    /// Show platform and provider availability
    Status,

    /// Chat about a document
    Chat(chat::ChatArgs),
}

/// Load `.env` and configuration, then install logging
pub(crate) fn bootstrap() -> AppConfig {
    dotenvy::dotenv().ok();

    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Ignoring invalid configuration: {e}");
            AppConfig::default().with_env_fallbacks(|name| std::env::var(name).ok())
        }
    };
    logging::init_logging(&config.logging);

    config
}
