//! Recursive chunking strategy

use unicode_segmentation::UnicodeSegmentation;

use crate::domain::ingestion::{Chunk, ChunkMetadata, ChunkingConfig, ChunkingStrategy};
use crate::domain::DomainError;

/// Boundary kinds, in order of preference
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Boundary {
    Paragraph,
    Line,
    Sentence,
    Whitespace,
}

const BOUNDARIES: [Boundary; 4] = [
    Boundary::Paragraph,
    Boundary::Line,
    Boundary::Sentence,
    Boundary::Whitespace,
];

/// Splits text into overlapping windows, cutting at the most natural
/// boundary available.
///
/// Preference order: paragraph break, line break, sentence end, whitespace.
/// When a window contains none of these the text is cut at exactly
/// `chunk_size` characters, so a token longer than a window is split.
///
/// Every chunk after the first starts `chunk_overlap` characters before the
/// previous chunk's end.
#[derive(Debug, Clone, Default)]
pub struct RecursiveChunker;

impl RecursiveChunker {
    /// Create a new recursive chunker
    pub fn new() -> Self {
        Self
    }

    /// Latest end position in `min_end..=max_end` that sits on a boundary of
    /// the given kind. Positions are char indices into `chars`.
    fn find_boundary(
        text: &Text<'_>,
        kind: Boundary,
        start: usize,
        min_end: usize,
        max_end: usize,
    ) -> Option<usize> {
        let chars = &text.chars;

        match kind {
            Boundary::Paragraph => (min_end..=max_end)
                .rev()
                .find(|&e| e >= 2 && chars[e - 1] == '\n' && chars[e - 2] == '\n'),
            Boundary::Line => (min_end..=max_end).rev().find(|&e| chars[e - 1] == '\n'),
            Boundary::Sentence => {
                let window = text.slice(start, max_end);
                window
                    .split_sentence_bound_indices()
                    .map(|(byte_idx, _)| start + window[..byte_idx].chars().count())
                    .filter(|&e| e >= min_end && e <= max_end)
                    .last()
            }
            Boundary::Whitespace => (min_end..=max_end)
                .rev()
                .find(|&e| chars[e - 1].is_whitespace()),
        }
    }

    fn split_points(text: &Text<'_>, config: &ChunkingConfig) -> Vec<(usize, usize)> {
        let total = text.len();
        let size = config.chunk_size;
        let overlap = config.chunk_overlap;

        let mut spans = Vec::new();
        let mut start = 0;

        loop {
            if total - start <= size {
                spans.push((start, total));
                break;
            }

            let max_end = start + size;
            // Never end so early that the next window would not advance
            let min_end = start + (overlap + 1).max(size / 2);

            let end = BOUNDARIES
                .iter()
                .find_map(|&kind| Self::find_boundary(text, kind, start, min_end, max_end))
                .unwrap_or(max_end);

            spans.push((start, end));
            start = end - overlap;
        }

        spans
    }
}

/// Text with a char-index to byte-offset table
struct Text<'a> {
    source: &'a str,
    chars: Vec<char>,
    offsets: Vec<usize>,
}

impl<'a> Text<'a> {
    fn new(source: &'a str) -> Self {
        let (offsets, chars): (Vec<usize>, Vec<char>) = source.char_indices().unzip();
        let mut offsets = offsets;
        offsets.push(source.len());

        Self {
            source,
            chars,
            offsets,
        }
    }

    fn len(&self) -> usize {
        self.chars.len()
    }

    fn slice(&self, start: usize, end: usize) -> &'a str {
        &self.source[self.offsets[start]..self.offsets[end]]
    }
}

impl ChunkingStrategy for RecursiveChunker {
    fn chunk(&self, content: &str, config: &ChunkingConfig) -> Result<Vec<Chunk>, DomainError> {
        config.validate()?;

        if content.is_empty() {
            return Ok(Vec::new());
        }

        let text = Text::new(content);

        let chunks = Self::split_points(&text, config)
            .into_iter()
            .enumerate()
            .map(|(index, (start, end))| {
                let overlap = if index == 0 { 0 } else { config.chunk_overlap };
                Chunk::new(
                    text.slice(start, end),
                    ChunkMetadata::new(index, start, end, overlap),
                )
            })
            .collect();

        Ok(chunks)
    }

    fn name(&self) -> &'static str {
        "recursive"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ingestion::reassemble;

    fn chunk(text: &str, size: usize, overlap: usize) -> Vec<Chunk> {
        RecursiveChunker::new()
            .chunk(text, &ChunkingConfig::new(size, overlap))
            .unwrap()
    }

    #[test]
    fn test_empty_content() {
        assert!(chunk("", 1000, 200).is_empty());
    }

    #[test]
    fn test_small_content() {
        let chunks = chunk("Just a short note.", 1000, 200);

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].content, "Just a short note.");
        assert_eq!(chunks[0].metadata.overlap, 0);
    }

    #[test]
    fn test_unbroken_text_uses_hard_cuts() {
        let text = "x".repeat(2500);
        let chunks = chunk(&text, 1000, 200);

        let spans: Vec<(usize, usize)> = chunks
            .iter()
            .map(|c| (c.metadata.char_start, c.metadata.char_end))
            .collect();
        assert_eq!(spans, vec![(0, 1000), (800, 1800), (1600, 2500)]);
        assert_eq!(chunks[1].metadata.char_start, chunks[0].metadata.char_end - 200);
    }

    #[test]
    fn test_prefers_paragraph_break() {
        let text = format!("{}\n\n{}", "a ".repeat(40), "b ".repeat(40));
        let chunks = chunk(&text, 100, 10);

        assert!(chunks[0].content.ends_with("\n\n"));
        assert_eq!(chunks[0].char_len(), 82);
    }

    #[test]
    fn test_prefers_sentence_over_whitespace() {
        let text = "The first sentence is here. The second one keeps going on and on without end";
        let chunks = chunk(text, 50, 5);

        assert_eq!(chunks[0].content, "The first sentence is here. ");
    }

    #[test]
    fn test_falls_back_to_whitespace() {
        let text = "alpha beta gamma delta epsilon zeta eta theta iota kappa";
        let chunks = chunk(text, 20, 4);

        for c in &chunks[..chunks.len() - 1] {
            assert!(c.content.ends_with(' '), "{:?}", c.content);
        }
    }

    #[test]
    fn test_overlap_is_exact() {
        let text = "Lorem ipsum dolor sit amet. ".repeat(100);
        let chunks = chunk(&text, 300, 50);

        for pair in chunks.windows(2) {
            let prev: Vec<char> = pair[0].content.chars().collect();
            let tail: String = prev[prev.len() - 50..].iter().collect();
            assert_eq!(pair[1].overlap_text(), Some(tail.as_str()));
        }
    }

    #[test]
    fn test_no_chunk_exceeds_size() {
        let text = format!("{} {}", "word ".repeat(300), "z".repeat(700));
        for c in chunk(&text, 250, 40) {
            assert!(c.content.chars().count() <= 250);
        }
    }

    #[test]
    fn test_coverage_reconstructs_text() {
        let text = "Première ligne.\n\nDeuxième paragraphe, avec des accents é à ü.\nEt encore. "
            .repeat(40);
        let chunks = chunk(&text, 120, 30);

        assert_eq!(reassemble(&chunks), text);
    }

    #[test]
    fn test_deterministic() {
        let text = "Sentence one. Sentence two!\nLine three\n\nParagraph four? ".repeat(50);

        assert_eq!(chunk(&text, 200, 40), chunk(&text, 200, 40));
    }

    #[test]
    fn test_chunk_metadata() {
        let text = "x".repeat(250);
        let chunks = chunk(&text, 100, 20);

        for (i, c) in chunks.iter().enumerate() {
            assert_eq!(c.index(), i);
            assert_eq!(c.metadata.overlap, if i == 0 { 0 } else { 20 });
        }
    }

    #[test]
    fn test_invalid_config() {
        let result = RecursiveChunker::new().chunk("text", &ChunkingConfig::new(10, 10));
        assert!(result.is_err());
    }

    #[test]
    fn test_name() {
        assert_eq!(RecursiveChunker::new().name(), "recursive");
    }
}
