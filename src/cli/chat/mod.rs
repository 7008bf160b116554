//! Chat command - ask questions about a document

use std::io::Write;
use std::path::PathBuf;

use clap::Args;
use futures::StreamExt;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;

use crate::domain::{FinishReason, ProviderConfig, ProviderKind};
use crate::infrastructure::services::{ChatSession, GenerationEvent};

/// Arguments for the chat command
#[derive(Args, Clone)]
pub struct ChatArgs {
    /// gemini, groq or ollama
    #[arg(long)]
    pub provider: ProviderKind,

    /// Model identifier as reported by `doc-chat models`
    #[arg(long)]
    pub model: String,

    /// API key (defaults to the configured or environment key)
    #[arg(long)]
    pub api_key: Option<String>,

    /// Document to ask about
    #[arg(long)]
    pub file: Option<PathBuf>,

    /// Ask a single question and exit
    #[arg(long)]
    pub question: Option<String>,
}

pub async fn run(args: ChatArgs) -> anyhow::Result<()> {
    let config = super::bootstrap();
    let mut session = crate::create_session(&config)?;

    if let Some(path) = &args.file {
        let upload = super::ingest::read_upload(path).await?;
        match session.load_document(upload).await {
            Ok(document) => eprintln!(
                "Loaded {} ({} chunks)",
                document.filename().unwrap_or("document"),
                document.chunks.len()
            ),
            Err(e) => anyhow::bail!(e.user_message()),
        }
    }

    let mut provider = ProviderConfig::new(args.provider, &args.model);
    if let Some(key) = args.api_key.as_deref().or(config.credential(args.provider)) {
        provider = provider.with_credential(key);
    }
    if let Err(e) = session.providers_mut().configure(provider).await {
        anyhow::bail!(e.user_message());
    }

    match args.question {
        Some(question) => answer(&mut session, &question).await,
        None => interactive(&mut session).await,
    }
}

async fn interactive(session: &mut ChatSession) -> anyhow::Result<()> {
    eprintln!("Ask a question. Commands: /reset, /summary, /quit");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    prompt()?;

    while let Some(line) = lines.next_line().await? {
        match line.trim() {
            "" => {}
            "/quit" | "/exit" => break,
            "/reset" => {
                session.reset();
                eprintln!("Conversation cleared.");
            }
            "/summary" => println!("{}", session.summary()),
            question => answer(session, question).await?,
        }
        prompt()?;
    }

    Ok(())
}

fn prompt() -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    write!(stderr, "> ")?;
    stderr.flush()
}

/// Stream one answer to stdout and record the outcome in the session
async fn answer(session: &mut ChatSession, question: &str) -> anyhow::Result<()> {
    let mut stream = match session.ask(question).await {
        Ok(stream) => stream,
        Err(e) => {
            eprintln!("Error: {}", e.user_message());
            return Ok(());
        }
    };

    let mut stdout = std::io::stdout();
    let mut text = String::new();

    while let Some(event) = stream.next().await {
        match event {
            GenerationEvent::Token(token) => {
                write!(stdout, "{token}")?;
                stdout.flush()?;
                text.push_str(&token);
            }
            GenerationEvent::End(reason) => {
                writeln!(stdout)?;
                if reason == FinishReason::Length {
                    eprintln!("(answer cut off at the token limit)");
                }
                debug!(reason = ?reason, chars = text.len(), "Answer complete");
                session.record_answer(text);
                return Ok(());
            }
            GenerationEvent::Error(e) => {
                writeln!(stdout)?;
                eprintln!("Error: {}", e.user_message());
                session.record_failure(&e);
                return Ok(());
            }
        }
    }

    Ok(())
}
