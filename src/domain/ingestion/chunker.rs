//! Chunking strategy trait and types

use serde::{Deserialize, Serialize};
use std::fmt::Debug;

use crate::domain::DomainError;

/// Configuration for chunking. Sizes are measured in characters, not bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Maximum chunk size in characters
    pub chunk_size: usize,
    /// Characters shared between consecutive chunks
    pub chunk_overlap: usize,
}

impl ChunkingConfig {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self {
            chunk_size,
            chunk_overlap,
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.chunk_size == 0 {
            return Err(DomainError::validation("chunk_size must be greater than 0"));
        }

        if self.chunk_overlap >= self.chunk_size {
            return Err(DomainError::validation(
                "chunk_overlap must be less than chunk_size",
            ));
        }

        Ok(())
    }
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
        }
    }
}

/// Position of a chunk inside its source text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    /// Index of this chunk (0-based)
    pub chunk_index: usize,
    /// Character offset where this chunk starts
    pub char_start: usize,
    /// Character offset where this chunk ends (exclusive)
    pub char_end: usize,
    /// Leading characters shared with the previous chunk
    pub overlap: usize,
}

impl ChunkMetadata {
    pub fn new(chunk_index: usize, char_start: usize, char_end: usize, overlap: usize) -> Self {
        Self {
            chunk_index,
            char_start,
            char_end,
            overlap,
        }
    }
}

/// A chunk of text extracted from a document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub content: String,
    pub metadata: ChunkMetadata,
}

impl Chunk {
    pub fn new(content: impl Into<String>, metadata: ChunkMetadata) -> Self {
        Self {
            content: content.into(),
            metadata,
        }
    }

    pub fn index(&self) -> usize {
        self.metadata.chunk_index
    }

    /// Length in characters
    pub fn char_len(&self) -> usize {
        self.metadata.char_end - self.metadata.char_start
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// Text shared with the previous chunk, if any
    pub fn overlap_text(&self) -> Option<&str> {
        if self.metadata.overlap == 0 {
            return None;
        }
        Some(&self.content[..self.overlap_byte_len()])
    }

    /// The part of this chunk not already covered by the previous one
    pub fn fresh_text(&self) -> &str {
        &self.content[self.overlap_byte_len()..]
    }

    fn overlap_byte_len(&self) -> usize {
        self.content
            .char_indices()
            .nth(self.metadata.overlap)
            .map(|(i, _)| i)
            .unwrap_or(self.content.len())
    }
}

/// Trait for chunking strategies
pub trait ChunkingStrategy: Send + Sync + Debug {
    /// Split content into ordered, overlapping chunks
    fn chunk(&self, content: &str, config: &ChunkingConfig) -> Result<Vec<Chunk>, DomainError>;

    /// Get the strategy name
    fn name(&self) -> &'static str;
}

/// Rebuild the source text from an ordered chunk sequence
pub fn reassemble(chunks: &[Chunk]) -> String {
    chunks.iter().map(Chunk::fresh_text).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_validation() {
        assert!(ChunkingConfig::default().validate().is_ok());
        assert!(ChunkingConfig::new(0, 0).validate().is_err());
        assert!(ChunkingConfig::new(100, 100).validate().is_err());
        assert!(ChunkingConfig::new(100, 0).validate().is_ok());
    }

    #[test]
    fn test_overlap_accessors_respect_char_boundaries() {
        let chunk = Chunk::new("ééabc", ChunkMetadata::new(1, 3, 8, 2));

        assert_eq!(chunk.overlap_text(), Some("éé"));
        assert_eq!(chunk.fresh_text(), "abc");
        assert_eq!(chunk.char_len(), 5);
    }

    #[test]
    fn test_reassemble() {
        let chunks = vec![
            Chunk::new("hello wor", ChunkMetadata::new(0, 0, 9, 0)),
            Chunk::new("world", ChunkMetadata::new(1, 6, 11, 3)),
        ];

        assert_eq!(reassemble(&chunks), "hello world");
        assert_eq!(chunks[0].overlap_text(), None);
    }
}
