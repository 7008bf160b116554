//! Document ingestion domain types and traits
//!
//! This module provides:
//! - `UploadedFile`, `DocumentFormat` and the per-format size limits
//! - `DocumentParser` trait for extracting text from uploads
//! - `ChunkingStrategy` trait for splitting text into overlapping chunks
//! - Context selection and preview helpers used when building prompts

pub mod chunker;
pub mod context;
pub mod file;
pub mod parser;

pub use chunker::{reassemble, Chunk, ChunkMetadata, ChunkingConfig, ChunkingStrategy};
pub use context::{build_context, select_chunks, summarize, CONTEXT_SEPARATOR};
pub use file::{validate_upload, DocumentFormat, DocumentLimits, UploadedFile};
pub use parser::{DocumentMetadata, DocumentParser, ParsedDocument};
