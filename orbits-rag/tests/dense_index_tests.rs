//! Snapshot persistence tests for the dense index.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use orbits_model::{EmbeddingProvider, ModelError};
use orbits_rag::dense::DenseIndex;
use orbits_rag::document::Chunk;

const DIM: usize = 32;

/// Deterministic bag-of-words embedder: each lowercase token bumps one
/// dimension, so texts sharing vocabulary land near each other.
struct MockEmbedder {
    calls: AtomicUsize,
}

impl MockEmbedder {
    fn new() -> Self {
        Self { calls: AtomicUsize::new(0) }
    }

    fn embed_text(text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; DIM];
        for token in text.to_lowercase().split_whitespace() {
            let hash = token
                .bytes()
                .fold(0u64, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u64));
            vector[(hash % DIM as u64) as usize] += 1.0;
        }
        let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            vector.iter_mut().for_each(|x| *x /= norm);
        }
        vector
    }
}

#[async_trait]
impl EmbeddingProvider for MockEmbedder {
    async fn embed(&self, text: &str) -> orbits_model::Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Self::embed_text(text))
    }

    fn dimensions(&self) -> usize {
        DIM
    }
}

/// An embedder that always fails; proves the snapshot path never re-embeds.
struct UnreachableEmbedder;

#[async_trait]
impl EmbeddingProvider for UnreachableEmbedder {
    async fn embed(&self, _text: &str) -> orbits_model::Result<Vec<f32>> {
        Err(ModelError::Embedding {
            provider: "unreachable".to_string(),
            message: "backend should not be called".to_string(),
        })
    }

    fn dimensions(&self) -> usize {
        DIM
    }
}

fn corpus() -> Arc<Vec<Chunk>> {
    let contents = [
        "quantum computing error correction",
        "quantum error correction codes",
        "bird migration patterns",
        "transformer attention mechanisms",
        "protein folding prediction",
    ];
    Arc::new(
        contents
            .iter()
            .enumerate()
            .map(|(i, content)| Chunk {
                content: content.to_string(),
                source: format!("paper-{i}"),
                chunk_index: 0,
                total_chunks: 1,
                total_pages: 1,
            })
            .collect(),
    )
}

#[tokio::test]
async fn reloaded_index_returns_identical_search_results() {
    let chunks = corpus();
    let embedder = MockEmbedder::new();
    let built = DenseIndex::build(chunks.clone(), &embedder).await.unwrap();

    let dir = tempfile::tempdir().unwrap();
    built.save(dir.path()).unwrap();
    let reloaded = DenseIndex::load(dir.path(), chunks).unwrap();

    let query = MockEmbedder::embed_text("quantum error correction");
    let fresh = built.search(&query, 4);
    let roundtrip = reloaded.search(&query, 4);

    assert_eq!(fresh.len(), roundtrip.len());
    for (a, b) in fresh.iter().zip(&roundtrip) {
        assert_eq!(a.0, b.0, "chunk order diverged after reload");
        assert!((a.1 - b.1).abs() < 1e-6, "distance diverged after reload");
    }
}

#[tokio::test]
async fn existing_snapshot_is_loaded_without_embedding_calls() {
    let chunks = corpus();
    let dir = tempfile::tempdir().unwrap();

    let built = DenseIndex::build(chunks.clone(), &MockEmbedder::new()).await.unwrap();
    built.save(dir.path()).unwrap();

    // The backend is down, but the snapshot exists — load must succeed.
    let index = DenseIndex::load_or_build(dir.path(), chunks, &UnreachableEmbedder).await.unwrap();
    assert_eq!(index.len(), 5);
}

#[tokio::test]
async fn missing_snapshot_triggers_build_and_resave() {
    let chunks = corpus();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fresh");

    let embedder = MockEmbedder::new();
    let index = DenseIndex::load_or_build(&path, chunks.clone(), &embedder).await.unwrap();
    assert_eq!(index.len(), 5);
    assert!(embedder.calls.load(Ordering::SeqCst) > 0);

    // The rebuild persisted a snapshot; a second startup must not re-embed.
    let again = DenseIndex::load_or_build(&path, chunks, &UnreachableEmbedder).await.unwrap();
    assert_eq!(again.len(), 5);
}

#[tokio::test]
async fn snapshot_for_a_different_chunk_set_is_rejected() {
    let chunks = corpus();
    let dir = tempfile::tempdir().unwrap();

    let built = DenseIndex::build(chunks.clone(), &MockEmbedder::new()).await.unwrap();
    built.save(dir.path()).unwrap();

    let mut altered: Vec<Chunk> = chunks.as_ref().clone();
    altered.push(Chunk {
        content: "newly added abstract".to_string(),
        source: "paper-new".to_string(),
        chunk_index: 0,
        total_chunks: 1,
        total_pages: 1,
    });

    assert!(DenseIndex::load(dir.path(), Arc::new(altered)).is_err());
}

#[tokio::test]
async fn corrupt_snapshot_falls_back_to_rebuild() {
    let chunks = corpus();
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("dense_index.json"), "not json at all").unwrap();

    let embedder = MockEmbedder::new();
    let index = DenseIndex::load_or_build(dir.path(), chunks, &embedder).await.unwrap();
    assert_eq!(index.len(), 5);
    assert!(embedder.calls.load(Ordering::SeqCst) > 0);
}

#[tokio::test]
async fn search_orders_by_ascending_distance() {
    let chunks = corpus();
    let index = DenseIndex::build(chunks, &MockEmbedder::new()).await.unwrap();

    let query = MockEmbedder::embed_text("quantum computing error correction");
    let results = index.search(&query, 5);

    assert_eq!(results.len(), 5);
    for pair in results.windows(2) {
        assert!(pair[0].1 <= pair[1].1);
    }
    // The verbatim match is nearest.
    assert_eq!(results[0].0, 0);
}
