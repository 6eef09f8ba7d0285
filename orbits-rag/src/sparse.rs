//! Lexical (BM25) index over chunk text.

use bm25::{Document, Language, SearchEngine, SearchEngineBuilder};
use tracing::debug;

use crate::document::{Candidate, Chunk};

/// A BM25 index over the corpus chunk collection.
///
/// Built whole from a corpus snapshot; there is no incremental update — a
/// changed chunk set means a rebuild, which is linear in total chunk tokens.
/// Chunks are keyed by their position in the shared collection.
pub struct SparseIndex {
    engine: SearchEngine<u64>,
    len: usize,
}

impl SparseIndex {
    /// Build an index from the full chunk collection.
    pub fn build(chunks: &[Chunk]) -> Self {
        let documents: Vec<Document<u64>> = chunks
            .iter()
            .enumerate()
            .map(|(i, chunk)| Document { id: i as u64, contents: chunk.content.clone() })
            .collect();
        let engine = SearchEngineBuilder::<u64>::with_documents(Language::English, documents).build();
        debug!(chunk_count = chunks.len(), "built sparse index");
        Self { engine, len: chunks.len() }
    }

    /// Return the top `k` chunks for `query`, ranked by BM25 score with ties
    /// broken by original chunk order. Empty query or corpus yields an empty
    /// result.
    pub fn search(&self, query: &str, k: usize) -> Vec<Candidate> {
        if self.len == 0 || query.trim().is_empty() {
            return Vec::new();
        }

        let mut results: Vec<Candidate> = self
            .engine
            .search(query, k)
            .into_iter()
            .map(|result| Candidate { chunk_idx: result.document.id as usize, score: result.score })
            .collect();
        results.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.chunk_idx.cmp(&b.chunk_idx))
        });
        results
    }

    /// Number of indexed chunks.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the index holds no chunks.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}
