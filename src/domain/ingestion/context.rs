//! Prompt context selection and document previews

use super::chunker::Chunk;

/// Separator placed between chunks in a prompt context
pub const CONTEXT_SEPARATOR: &str = "\n\n";

/// Chunks used as prompt context for a question.
///
/// Always the leading `max_chunks` chunks in document order. The question
/// is not consulted.
pub fn select_chunks(chunks: &[Chunk], max_chunks: usize) -> &[Chunk] {
    &chunks[..chunks.len().min(max_chunks)]
}

/// Join the selected chunks into a single context string
pub fn build_context(chunks: &[Chunk], max_chunks: usize) -> Option<String> {
    let selected = select_chunks(chunks, max_chunks);

    if selected.is_empty() {
        return None;
    }

    Some(
        selected
            .iter()
            .map(|c| c.content.as_str())
            .collect::<Vec<_>>()
            .join(CONTEXT_SEPARATOR),
    )
}

/// Short preview of a document.
///
/// Texts up to `max_len` characters are returned whole. Longer texts are
/// cut at the last period if it falls within the final 20% of the window,
/// otherwise truncated with a trailing ellipsis.
pub fn summarize(text: &str, max_len: usize) -> String {
    if text.chars().count() <= max_len {
        return text.to_string();
    }

    let truncated: String = text.chars().take(max_len).collect();

    if let Some(byte_pos) = truncated.rfind('.') {
        let char_pos = truncated[..byte_pos].chars().count();
        if char_pos * 5 > max_len * 4 {
            return truncated[..=byte_pos].to_string();
        }
    }

    format!("{truncated}...")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ingestion::ChunkMetadata;

    fn chunks(n: usize) -> Vec<Chunk> {
        (0..n)
            .map(|i| Chunk::new(format!("chunk {i}"), ChunkMetadata::new(i, i * 10, i * 10 + 7, 0)))
            .collect()
    }

    #[test]
    fn test_selects_leading_chunks_in_order() {
        let all = chunks(5);
        let selected = select_chunks(&all, 3);

        let indices: Vec<usize> = selected.iter().map(Chunk::index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
    }

    #[test]
    fn test_selection_with_fewer_chunks_than_limit() {
        let all = chunks(2);
        assert_eq!(select_chunks(&all, 3).len(), 2);
        assert!(select_chunks(&all, 0).is_empty());
    }

    #[test]
    fn test_build_context() {
        let all = chunks(5);
        assert_eq!(
            build_context(&all, 3).unwrap(),
            "chunk 0\n\nchunk 1\n\nchunk 2"
        );
        assert!(build_context(&[], 3).is_none());
    }

    #[test]
    fn test_summarize_short_text() {
        assert_eq!(summarize("Short.", 500), "Short.");
    }

    #[test]
    fn test_summarize_cuts_at_late_period() {
        let text = format!("{}. tail continues beyond the limit", "a".repeat(90));
        assert_eq!(summarize(&text, 100), format!("{}.", "a".repeat(90)));
    }

    #[test]
    fn test_summarize_truncates_without_late_period() {
        let text = format!("Early. {}", "b".repeat(200));
        let summary = summarize(&text, 50);

        assert!(summary.ends_with("..."));
        assert_eq!(summary.chars().count(), 53);
    }
}
