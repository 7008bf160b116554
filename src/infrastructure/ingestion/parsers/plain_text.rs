//! Plain text document parser

use async_trait::async_trait;

use crate::domain::ingestion::{DocumentFormat, DocumentMetadata, DocumentParser, ParsedDocument};
use crate::domain::DomainError;

/// Parser for UTF-8 plain text files
#[derive(Debug, Clone, Default)]
pub struct PlainTextParser;

impl PlainTextParser {
    /// Create a new plain text parser
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl DocumentParser for PlainTextParser {
    fn format(&self) -> DocumentFormat {
        DocumentFormat::Text
    }

    fn supported_extensions(&self) -> &[&str] {
        &["txt"]
    }

    async fn parse(&self, bytes: &[u8]) -> Result<ParsedDocument, DomainError> {
        let content = std::str::from_utf8(bytes)
            .map_err(|e| DomainError::decode(format!("file is not valid UTF-8: {e}")))?;

        let lines = content.matches('\n').count() + 1;
        let metadata = DocumentMetadata::from_text(DocumentFormat::Text, content)
            .with_size(bytes.len() as u64)
            .with_lines(lines);

        Ok(ParsedDocument::new(content, metadata))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_parse_text_content() {
        let parser = PlainTextParser::new();

        let result = parser.parse("Hello, World!\nSecond line".as_bytes()).await.unwrap();

        assert_eq!(result.content, "Hello, World!\nSecond line");
        assert_eq!(result.metadata.format, DocumentFormat::Text);
        assert_eq!(result.metadata.words, 4);
        assert_eq!(result.metadata.lines, Some(2));
        assert_eq!(result.metadata.size, 25);
    }

    #[tokio::test]
    async fn test_parse_empty_file() {
        let parser = PlainTextParser::new();

        let result = parser.parse(b"").await.unwrap();

        assert!(result.content.is_empty());
        assert_eq!(result.metadata.chars, 0);
        assert_eq!(result.metadata.lines, Some(1));
    }

    #[tokio::test]
    async fn test_parse_invalid_utf8() {
        let parser = PlainTextParser::new();

        let err = parser.parse(&[0x48, 0x69, 0xff, 0xfe]).await.unwrap_err();
        assert!(matches!(err, DomainError::Decode { .. }));
    }

    #[tokio::test]
    async fn test_parse_counts_characters_not_bytes() {
        let parser = PlainTextParser::new();

        let result = parser.parse("naïve café".as_bytes()).await.unwrap();
        assert_eq!(result.metadata.chars, 10);
    }

    #[test]
    fn test_supported_extensions() {
        let parser = PlainTextParser::new();
        assert_eq!(parser.supported_extensions(), &["txt"]);
        assert!(parser.supports_file("NOTES.TXT"));
        assert!(!parser.supports_file("notes.md"));
    }
}
