//! Document ingestion infrastructure
//!
//! Parsers for text and PDF uploads, the overlap chunker, and the
//! `DocumentProcessor` that ties validation, extraction and chunking together.

pub mod chunkers;
pub mod factory;
pub mod parsers;
pub mod processor;

pub use chunkers::RecursiveChunker;
pub use factory::ParserFactory;
pub use parsers::{PdfParser, PlainTextParser};
pub use processor::{DocumentProcessor, ProcessedDocument, ProcessorSettings};
