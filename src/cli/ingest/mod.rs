//! Ingest command - extract and chunk a document without asking anything

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Args;

use crate::domain::UploadedFile;
use crate::infrastructure::ingestion::{DocumentProcessor, ProcessedDocument};

/// Arguments for the ingest command
#[derive(Args, Clone)]
pub struct IngestArgs {
    /// Path to a .txt or .pdf file
    pub file: PathBuf,

    /// Print every chunk instead of a one-line listing
    #[arg(long)]
    pub full: bool,
}

pub async fn run(args: IngestArgs) -> anyhow::Result<()> {
    let config = super::bootstrap();
    let processor = DocumentProcessor::new(config.processor_settings());

    let upload = read_upload(&args.file).await?;
    let document = match processor.process_upload(upload).await {
        Ok(document) => document,
        Err(e) => anyhow::bail!(e.user_message()),
    };

    print_metadata(&document);
    println!("\nPreview:\n{}\n", processor.summarize(&document.text));
    print_chunks(&document, args.full);

    Ok(())
}

/// Read a file from disk into an upload named after its file name
pub(crate) async fn read_upload(path: &Path) -> anyhow::Result<UploadedFile> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    Ok(UploadedFile::new(name, bytes))
}

fn print_metadata(document: &ProcessedDocument) {
    let meta = &document.metadata;

    println!("File:    {}", meta.filename.as_deref().unwrap_or("-"));
    println!("Format:  {}", meta.format.extension().to_uppercase());
    println!("Size:    {} bytes", meta.size);
    println!("Chars:   {}", meta.chars);
    println!("Words:   {}", meta.words);

    if let Some(lines) = meta.lines {
        println!("Lines:   {lines}");
    }
    if let Some(pages) = meta.pages {
        println!("Pages:   {pages}");
    }
    if !meta.empty_pages.is_empty() {
        println!("Empty:   pages {:?} yielded no text", meta.empty_pages);
    }
    if let Some(title) = &meta.title {
        println!("Title:   {title}");
    }
    if let Some(author) = &meta.author {
        println!("Author:  {author}");
    }
}

fn print_chunks(document: &ProcessedDocument, full: bool) {
    println!("Chunks:  {}", document.chunks.len());

    for chunk in &document.chunks {
        let meta = &chunk.metadata;

        if full {
            println!(
                "\n--- chunk {} [{}..{}) ---\n{}",
                meta.chunk_index, meta.char_start, meta.char_end, chunk.content
            );
        } else {
            let head: String = chunk.content.chars().take(60).collect();
            println!(
                "  #{:<3} [{:>6}..{:>6})  overlap {:>4}  {}",
                meta.chunk_index,
                meta.char_start,
                meta.char_end,
                meta.overlap,
                head.replace('\n', " ")
            );
        }
    }
}
