//! Document parser trait and types

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

use super::file::DocumentFormat;
use crate::domain::DomainError;

/// Metadata extracted from a document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub format: DocumentFormat,
    /// Original filename, when known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    /// Upload size in bytes
    pub size: u64,
    /// Number of characters in the extracted text
    pub chars: usize,
    /// Number of whitespace-separated words
    pub words: usize,
    /// Number of lines (text files only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lines: Option<usize>,
    /// Number of pages (PDF only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pages: Option<usize>,
    /// 1-based numbers of pages that yielded no text
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub empty_pages: Vec<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
}

impl DocumentMetadata {
    /// Create metadata with counts computed from the extracted text
    pub fn from_text(format: DocumentFormat, text: &str) -> Self {
        Self {
            format,
            filename: None,
            size: 0,
            chars: text.chars().count(),
            words: text.split_whitespace().count(),
            lines: None,
            pages: None,
            empty_pages: Vec::new(),
            title: None,
            author: None,
        }
    }

    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    pub fn with_size(mut self, size: u64) -> Self {
        self.size = size;
        self
    }

    pub fn with_lines(mut self, lines: usize) -> Self {
        self.lines = Some(lines);
        self
    }

    pub fn with_pages(mut self, pages: usize, empty_pages: Vec<u32>) -> Self {
        self.pages = Some(pages);
        self.empty_pages = empty_pages;
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    /// True when some pages contributed no text
    pub fn is_partial(&self) -> bool {
        !self.empty_pages.is_empty()
    }
}

/// Result of parsing a document
#[derive(Debug, Clone)]
pub struct ParsedDocument {
    /// Extracted text content
    pub content: String,
    /// Extracted metadata
    pub metadata: DocumentMetadata,
}

impl ParsedDocument {
    pub fn new(content: impl Into<String>, metadata: DocumentMetadata) -> Self {
        Self {
            content: content.into(),
            metadata,
        }
    }
}

/// Trait for document parsers
#[async_trait]
pub trait DocumentParser: Send + Sync + Debug {
    /// Format handled by this parser
    fn format(&self) -> DocumentFormat;

    /// Get supported file extensions (e.g., ["txt"])
    fn supported_extensions(&self) -> &[&str];

    /// Extract text content and metadata from raw bytes
    async fn parse(&self, bytes: &[u8]) -> Result<ParsedDocument, DomainError>;

    /// Check if this parser supports a given filename
    fn supports_file(&self, filename: &str) -> bool {
        let ext = filename
            .rsplit('.')
            .next()
            .map(|s| s.to_lowercase())
            .unwrap_or_default();

        self.supported_extensions()
            .iter()
            .any(|e| e.eq_ignore_ascii_case(&ext))
    }
}
