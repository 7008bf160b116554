use clap::Parser;
use doc_chat::cli::{self, Cli, Command};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Ingest(args) => cli::ingest::run(args).await,
        Command::Models(args) => cli::models::run(args).await,
        Command::Status => cli::status::run().await,
        Command::Chat(args) => cli::chat::run(args).await,
    }
}
