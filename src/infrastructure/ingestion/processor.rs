//! Document processor: validation, extraction and chunking of uploads

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::domain::ingestion::{
    build_context, summarize, validate_upload, Chunk, ChunkingConfig, ChunkingStrategy,
    DocumentFormat, DocumentLimits, DocumentMetadata, ParsedDocument, UploadedFile,
};
use crate::domain::DomainError;

use super::chunkers::RecursiveChunker;
use super::factory::ParserFactory;

/// Tunables for the document processor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessorSettings {
    pub limits: DocumentLimits,
    pub chunking: ChunkingConfig,
    pub max_chunks_for_query: usize,
    pub summary_length: usize,
}

impl Default for ProcessorSettings {
    fn default() -> Self {
        Self {
            limits: DocumentLimits::default(),
            chunking: ChunkingConfig::default(),
            max_chunks_for_query: 3,
            summary_length: 500,
        }
    }
}

/// A validated, extracted and chunked upload
#[derive(Debug, Clone)]
pub struct ProcessedDocument {
    pub metadata: DocumentMetadata,
    pub text: String,
    pub chunks: Vec<Chunk>,
}

impl ProcessedDocument {
    pub fn filename(&self) -> Option<&str> {
        self.metadata.filename.as_deref()
    }

    pub fn format(&self) -> DocumentFormat {
        self.metadata.format
    }
}

/// Turns raw uploads into prompt-ready text fragments
#[derive(Debug, Clone)]
pub struct DocumentProcessor {
    settings: ProcessorSettings,
    chunker: Arc<dyn ChunkingStrategy>,
}

impl Default for DocumentProcessor {
    fn default() -> Self {
        Self::new(ProcessorSettings::default())
    }
}

impl DocumentProcessor {
    pub fn new(settings: ProcessorSettings) -> Self {
        Self {
            settings,
            chunker: Arc::new(RecursiveChunker::new()),
        }
    }

    pub fn with_chunker(mut self, chunker: Arc<dyn ChunkingStrategy>) -> Self {
        self.chunker = chunker;
        self
    }

    pub fn settings(&self) -> &ProcessorSettings {
        &self.settings
    }

    /// Check format and size without reading the content
    pub fn validate(&self, file: &UploadedFile) -> Result<DocumentFormat, DomainError> {
        validate_upload(file, &self.settings.limits)
    }

    /// Extract the full text of an upload
    pub async fn extract(&self, file: &UploadedFile) -> Result<ParsedDocument, DomainError> {
        let parser = ParserFactory::for_filename(file.name())?;

        let mut parsed = parser.parse(file.bytes()).await?;
        parsed.metadata = parsed
            .metadata
            .with_filename(file.name())
            .with_size(file.size());

        if parsed.metadata.is_partial() {
            warn!(
                filename = %file.name(),
                empty_pages = ?parsed.metadata.empty_pages,
                "Some pages yielded no text"
            );
        }

        debug!(
            filename = %file.name(),
            chars = parsed.metadata.chars,
            words = parsed.metadata.words,
            "Extracted document text"
        );

        Ok(parsed)
    }

    /// Chunk with the configured size and overlap
    pub fn chunk(&self, text: &str) -> Result<Vec<Chunk>, DomainError> {
        self.chunk_with(text, &self.settings.chunking)
    }

    pub fn chunk_with(&self, text: &str, config: &ChunkingConfig) -> Result<Vec<Chunk>, DomainError> {
        self.chunker.chunk(text, config)
    }

    /// Validate, extract and chunk in one call
    pub async fn process_upload(&self, file: UploadedFile) -> Result<ProcessedDocument, DomainError> {
        let format = self.validate(&file)?;
        let parsed = self.extract(&file).await?;
        let chunks = self.chunk(&parsed.content)?;

        info!(
            filename = %file.name(),
            format = %format,
            chunks = chunks.len(),
            strategy = self.chunker.name(),
            "Processed document"
        );

        Ok(ProcessedDocument {
            metadata: parsed.metadata,
            text: parsed.content,
            chunks,
        })
    }

    /// Prompt context for a question: the leading chunks in document order
    pub fn context(&self, document: &ProcessedDocument) -> Option<String> {
        build_context(&document.chunks, self.settings.max_chunks_for_query)
    }

    /// Preview of the document text
    pub fn summarize(&self, text: &str) -> String {
        summarize(text, self.settings.summary_length)
    }
}
