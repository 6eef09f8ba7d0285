//! Context assembly with ephemeral, per-query chunk identifiers.

use std::collections::HashMap;

use crate::document::Chunk;

/// A context block plus the id→title mapping needed to resolve citations.
///
/// Ids are `doc{i}` in output order and are assigned fresh for every query —
/// they are never stable across requests and must not be persisted. The
/// mapping is the only channel by which model-cited ids can be resolved back
/// to real sources.
#[derive(Debug, Clone, PartialEq)]
pub struct ContextBlock {
    /// The concatenated, source-tagged context text.
    pub text: String,
    /// Ephemeral id → document title.
    pub id_to_title: HashMap<String, String>,
}

/// Build a numbered, source-tagged context block from the final chunk set.
pub fn assemble(chunks: &[&Chunk]) -> ContextBlock {
    let mut text = String::new();
    let mut id_to_title = HashMap::with_capacity(chunks.len());

    for (i, chunk) in chunks.iter().enumerate() {
        let doc_id = format!("doc{i}");
        text.push_str(&format!("[id: {doc_id} | title: {}]\n{}\n\n", chunk.source, chunk.content));
        id_to_title.insert(doc_id, chunk.source.clone());
    }

    ContextBlock { text, id_to_title }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(source: &str, content: &str) -> Chunk {
        Chunk {
            content: content.to_string(),
            source: source.to_string(),
            chunk_index: 0,
            total_chunks: 1,
            total_pages: 1,
        }
    }

    #[test]
    fn assigns_ids_in_output_order() {
        let a = chunk("Paper A", "alpha content");
        let b = chunk("Paper B", "beta content");
        let block = assemble(&[&a, &b]);

        assert_eq!(block.id_to_title["doc0"], "Paper A");
        assert_eq!(block.id_to_title["doc1"], "Paper B");
        assert!(block.text.starts_with("[id: doc0 | title: Paper A]\nalpha content\n\n"));
        assert!(block.text.contains("[id: doc1 | title: Paper B]\nbeta content\n\n"));
    }

    #[test]
    fn empty_chunk_set_yields_empty_block() {
        let block = assemble(&[]);
        assert!(block.text.is_empty());
        assert!(block.id_to_title.is_empty());
    }
}
