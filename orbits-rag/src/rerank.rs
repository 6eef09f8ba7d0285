//! Reranking of fused candidates against the original question.

use std::sync::Arc;

use async_trait::async_trait;

use crate::document::{Candidate, Chunk};
use crate::error::Result;
use orbits_model::EmbeddingProvider;

/// A reranker that re-scores fused candidates and truncates to the answer
/// budget.
///
/// Scoring is always against the literal user question — never the HyDE
/// passage — so the final ordering reflects user intent rather than the
/// synthetic query. Cross-encoder relevance models implement this same trait;
/// [`EmbeddingReranker`] is the embedding-similarity fallback.
#[async_trait]
pub trait Reranker: Send + Sync {
    /// Re-score `candidates` against `query`, sort descending, and return
    /// the top `top_k`, each annotated with its rerank score.
    ///
    /// An empty candidate list returns empty output, not an error.
    async fn rerank(
        &self,
        query: &str,
        candidates: &[Candidate],
        chunks: &[Chunk],
        top_k: usize,
    ) -> Result<Vec<Candidate>>;
}

/// Reranks by cosine similarity between fresh embeddings of the query and
/// each candidate's chunk text.
pub struct EmbeddingReranker {
    provider: Arc<dyn EmbeddingProvider>,
}

impl EmbeddingReranker {
    /// Create a reranker backed by the given embedding provider.
    pub fn new(provider: Arc<dyn EmbeddingProvider>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl Reranker for EmbeddingReranker {
    async fn rerank(
        &self,
        query: &str,
        candidates: &[Candidate],
        chunks: &[Chunk],
        top_k: usize,
    ) -> Result<Vec<Candidate>> {
        if candidates.is_empty() {
            return Ok(Vec::new());
        }

        let query_vector = self.provider.embed(query).await?;
        let texts: Vec<&str> =
            candidates.iter().map(|c| chunks[c.chunk_idx].content.as_str()).collect();
        let vectors = self.provider.embed_batch(&texts).await?;

        let mut scored: Vec<Candidate> = candidates
            .iter()
            .zip(&vectors)
            .map(|(candidate, vector)| Candidate {
                chunk_idx: candidate.chunk_idx,
                score: guarded_cosine(&query_vector, vector),
            })
            .collect();
        // Stable sort: candidates tied on score keep their incoming order,
        // so reranking an already-sorted list is idempotent.
        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(top_k);
        Ok(scored)
    }
}

/// Cosine similarity with a guarded denominator so zero vectors score zero
/// instead of dividing by zero.
fn guarded_cosine(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    dot / (norm_a * norm_b + 1e-10)
}

/// A no-op reranker that keeps the fused order and only truncates.
///
/// Useful in tests and when no rerank backend is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpReranker;

#[async_trait]
impl Reranker for NoOpReranker {
    async fn rerank(
        &self,
        _query: &str,
        candidates: &[Candidate],
        _chunks: &[Chunk],
        top_k: usize,
    ) -> Result<Vec<Candidate>> {
        let mut kept = candidates.to_vec();
        kept.truncate(top_k);
        Ok(kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guarded_cosine_handles_zero_vectors() {
        assert_eq!(guarded_cosine(&[0.0, 0.0], &[0.0, 0.0]), 0.0);
    }

    #[test]
    fn guarded_cosine_matches_expectation() {
        let sim = guarded_cosine(&[1.0, 0.0], &[1.0, 0.0]);
        assert!((sim - 1.0).abs() < 1e-6);
    }
}
