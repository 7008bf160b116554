//! Factory for document parsers

use std::sync::Arc;

use crate::domain::ingestion::{DocumentFormat, DocumentParser};
use crate::domain::DomainError;

use super::parsers::{PdfParser, PlainTextParser};

/// Factory for creating document parsers
#[derive(Debug, Default)]
pub struct ParserFactory;

impl ParserFactory {
    /// Create a parser for the given format
    pub fn create(format: DocumentFormat) -> Arc<dyn DocumentParser> {
        match format {
            DocumentFormat::Text => Arc::new(PlainTextParser::new()),
            DocumentFormat::Pdf => Arc::new(PdfParser::new()),
        }
    }

    /// Pick a parser from the filename extension
    pub fn for_filename(filename: &str) -> Result<Arc<dyn DocumentParser>, DomainError> {
        DocumentFormat::from_filename(filename).map(Self::create)
    }

    /// Get a list of all supported file extensions
    pub fn supported_extensions() -> Vec<&'static str> {
        vec!["txt", "pdf"]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parser_factory_plain_text() {
        let parser = ParserFactory::create(DocumentFormat::Text);
        assert!(parser.supports_file("test.txt"));
        assert_eq!(parser.format(), DocumentFormat::Text);
    }

    #[test]
    fn test_parser_factory_pdf() {
        let parser = ParserFactory::create(DocumentFormat::Pdf);
        assert!(parser.supports_file("report.PDF"));
    }

    #[test]
    fn test_for_filename() {
        assert_eq!(
            ParserFactory::for_filename("notes.txt").unwrap().format(),
            DocumentFormat::Text
        );

        let err = ParserFactory::for_filename("slides.pptx").unwrap_err();
        assert!(matches!(err, DomainError::UnsupportedFormat { .. }));
    }

    #[test]
    fn test_supported_extensions() {
        let extensions = ParserFactory::supported_extensions();
        assert_eq!(extensions, vec!["txt", "pdf"]);
    }
}
