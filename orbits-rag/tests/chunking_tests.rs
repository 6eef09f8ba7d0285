//! Property tests for the recursive splitter.

use orbits_rag::chunking::ChunkSplitter;
use proptest::prelude::*;

fn default_separators() -> Vec<String> {
    ["\n\n", "\n", ".", "!", "?", ",", " ", ""].iter().map(|s| s.to_string()).collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// For any document text and splitter configuration, concatenating all
    /// chunks with each non-first chunk's overlap prefix removed exactly
    /// reconstructs the input.
    #[test]
    fn overlap_trimmed_concatenation_reconstructs_input(
        text in "[a-zA-Zäöü .,!?\n]{0,600}",
        chunk_size in 8usize..64,
        overlap_eighths in 0usize..4,
    ) {
        let overlap = chunk_size * overlap_eighths / 8;
        let splitter = ChunkSplitter::new(chunk_size, overlap, default_separators());
        let chunks = splitter.split(&text);

        let rebuilt: String = chunks.iter().map(|c| &c.content[c.overlap_len..]).collect();
        prop_assert_eq!(rebuilt, text);
    }

    /// Every emitted chunk stays within the configured character budget.
    #[test]
    fn chunks_respect_size_budget(
        text in "[a-z .,\n]{0,600}",
        chunk_size in 8usize..64,
        overlap_eighths in 0usize..4,
    ) {
        let overlap = chunk_size * overlap_eighths / 8;
        let splitter = ChunkSplitter::new(chunk_size, overlap, default_separators());
        for chunk in splitter.split(&text) {
            prop_assert!(
                chunk.content.len() <= chunk_size,
                "chunk of {} bytes exceeds budget {}",
                chunk.content.len(),
                chunk_size,
            );
        }
    }

    /// Only the first chunk has no overlap prefix; every later chunk carries
    /// exactly the configured overlap unless its predecessor starts closer
    /// than that to the text start.
    #[test]
    fn overlap_prefix_is_bounded_by_configuration(
        text in "[a-z ]{0,400}",
        chunk_size in 8usize..48,
    ) {
        let overlap = chunk_size / 4;
        let splitter = ChunkSplitter::new(chunk_size, overlap, default_separators());
        let chunks = splitter.split(&text);

        if let Some(first) = chunks.first() {
            prop_assert_eq!(first.overlap_len, 0);
        }
        for chunk in chunks.iter().skip(1) {
            prop_assert!(chunk.overlap_len <= overlap);
        }
    }
}
