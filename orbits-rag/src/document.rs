//! Data types for source documents, chunks, and scored candidates.

use serde::{Deserialize, Serialize};

/// A source document as produced by text extraction.
///
/// Immutable after ingestion: the pipeline reads pages once, normalizes and
/// chunks them, and never writes back.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SourceDocument {
    /// Document title (the source file stem).
    pub title: String,
    /// Raw page texts in page order.
    pub pages: Vec<String>,
}

impl SourceDocument {
    /// Number of pages in the source file.
    pub fn total_pages(&self) -> usize {
        self.pages.len()
    }
}

/// A contiguous span of a document's normalized text.
///
/// Created once at ingestion and read-only thereafter. Both the sparse and
/// dense indexes reference the same shared chunk collection by position.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Chunk {
    /// The chunk text, including its overlap prefix.
    pub content: String,
    /// Title of the document this chunk came from.
    pub source: String,
    /// Position of this chunk within its document, 0-based and monotonically
    /// increasing in document order.
    pub chunk_index: usize,
    /// Total chunks produced from the same document.
    pub total_chunks: usize,
    /// Page count of the source file.
    pub total_pages: usize,
}

impl Chunk {
    /// The chunk's identity key: unique across the corpus.
    pub fn key(&self) -> ChunkKey {
        ChunkKey { source: self.source.clone(), chunk_index: self.chunk_index }
    }
}

/// Identity key for a chunk: `(source document, chunk_index)`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct ChunkKey {
    /// Title of the owning document.
    pub source: String,
    /// Chunk position within that document.
    pub chunk_index: usize,
}

/// A scored retrieval result, referencing a chunk by its position in the
/// shared corpus collection.
///
/// Score semantics differ per stage (distance-derived similarity from dense
/// search, rank-derived score from sparse search, fused weighted score,
/// rerank relevance) and must never be compared across stages without
/// re-normalization.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    /// Index into the shared chunk collection.
    pub chunk_idx: usize,
    /// Stage-local relevance score (higher is better).
    pub score: f32,
}
