//! Dense (semantic) vector index with an on-disk snapshot.
//!
//! The index pairs the shared chunk collection with an aligned vector list.
//! Because the embedding backend is network-bound, the vectors are persisted
//! to a snapshot directory and reloaded on startup; a rebuild happens only
//! when no usable snapshot exists.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::document::{Chunk, ChunkKey};
use crate::error::{RagError, Result};
use orbits_model::EmbeddingProvider;

/// Snapshot file name inside the index directory.
const SNAPSHOT_FILE: &str = "dense_index.json";

/// Batch width for embedding calls while building.
const EMBED_BATCH: usize = 32;

/// A dense vector index over the corpus chunk collection.
///
/// `vectors[i]` is the embedding of `chunks[i]`; both indexes of the pipeline
/// reference the same `Arc`'d chunk collection, never copies.
pub struct DenseIndex {
    chunks: Arc<Vec<Chunk>>,
    vectors: Vec<Vec<f32>>,
    dimensions: usize,
}

/// On-disk snapshot: `(chunk key, vector)` pairs plus dimensionality.
///
/// Keyed by [`ChunkKey`] rather than position so a reload can prove the
/// snapshot still matches the current chunk set.
#[derive(Serialize, Deserialize)]
struct Snapshot {
    dimensions: usize,
    entries: Vec<SnapshotEntry>,
}

#[derive(Serialize, Deserialize)]
struct SnapshotEntry {
    key: ChunkKey,
    vector: Vec<f32>,
}

impl DenseIndex {
    /// Build the index by embedding every chunk, in batches.
    pub async fn build(
        chunks: Arc<Vec<Chunk>>,
        provider: &dyn EmbeddingProvider,
    ) -> Result<Self> {
        let mut index = Self {
            chunks: chunks.clone(),
            vectors: Vec::with_capacity(chunks.len()),
            dimensions: provider.dimensions(),
        };

        let contents: Vec<&str> = chunks.iter().map(|c| c.content.as_str()).collect();
        for batch in contents.chunks(EMBED_BATCH) {
            let embedded = provider.embed_batch(batch).await?;
            index.append(embedded)?;
        }

        info!(chunk_count = index.vectors.len(), dimensions = index.dimensions, "built dense index");
        Ok(index)
    }

    /// Load the index from a snapshot directory, else build and persist it.
    ///
    /// An existing snapshot is always preferred over a rebuild — re-embedding
    /// the corpus is the expensive path. A snapshot that fails to load (or no
    /// longer matches the chunk set) is logged and rebuilt from scratch; a
    /// failure to persist the rebuilt snapshot is logged, not fatal.
    pub async fn load_or_build(
        path: &Path,
        chunks: Arc<Vec<Chunk>>,
        provider: &dyn EmbeddingProvider,
    ) -> Result<Self> {
        if path.join(SNAPSHOT_FILE).exists() {
            match Self::load(path, chunks.clone()) {
                Ok(index) => {
                    info!(path = %path.display(), chunk_count = index.len(), "loaded dense index snapshot");
                    return Ok(index);
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "dense index snapshot unusable; rebuilding");
                }
            }
        }

        let index = Self::build(chunks, provider).await?;
        if let Err(e) = index.save(path) {
            warn!(path = %path.display(), error = %e, "failed to persist dense index snapshot");
        }
        Ok(index)
    }

    /// Reconstruct an index from a snapshot for the given chunk collection.
    ///
    /// Fails if any current chunk key is missing from the snapshot or the
    /// dimensionality is inconsistent; the caller then falls back to a full
    /// rebuild.
    pub fn load(path: &Path, chunks: Arc<Vec<Chunk>>) -> Result<Self> {
        let file = path.join(SNAPSHOT_FILE);
        let data = std::fs::read_to_string(&file)
            .map_err(|e| RagError::Index(format!("cannot read {}: {e}", file.display())))?;
        let snapshot: Snapshot = serde_json::from_str(&data)
            .map_err(|e| RagError::Index(format!("cannot parse {}: {e}", file.display())))?;

        let mut by_key: HashMap<ChunkKey, Vec<f32>> =
            snapshot.entries.into_iter().map(|entry| (entry.key, entry.vector)).collect();

        let mut vectors = Vec::with_capacity(chunks.len());
        for chunk in chunks.iter() {
            let vector = by_key.remove(&chunk.key()).ok_or_else(|| {
                RagError::Index(format!(
                    "snapshot is missing chunk {}#{}",
                    chunk.source, chunk.chunk_index
                ))
            })?;
            if vector.len() != snapshot.dimensions {
                return Err(RagError::Index(format!(
                    "snapshot vector for {}#{} has {} dimensions, expected {}",
                    chunk.source,
                    chunk.chunk_index,
                    vector.len(),
                    snapshot.dimensions
                )));
            }
            vectors.push(vector);
        }

        Ok(Self { chunks, vectors, dimensions: snapshot.dimensions })
    }

    /// Persist the index and chunk-key payload to `path`.
    pub fn save(&self, path: &Path) -> Result<()> {
        std::fs::create_dir_all(path)
            .map_err(|e| RagError::Index(format!("cannot create {}: {e}", path.display())))?;
        let snapshot = Snapshot {
            dimensions: self.dimensions,
            entries: self
                .chunks
                .iter()
                .zip(&self.vectors)
                .map(|(chunk, vector)| SnapshotEntry { key: chunk.key(), vector: vector.clone() })
                .collect(),
        };
        let file = path.join(SNAPSHOT_FILE);
        let data = serde_json::to_string(&snapshot)
            .map_err(|e| RagError::Index(format!("cannot serialize snapshot: {e}")))?;
        std::fs::write(&file, data)
            .map_err(|e| RagError::Index(format!("cannot write {}: {e}", file.display())))?;
        Ok(())
    }

    /// Return the `k` nearest chunks to `query` as `(chunk position, cosine
    /// distance)` pairs, ascending by distance. Ties break on chunk order.
    pub fn search(&self, query: &[f32], k: usize) -> Vec<(usize, f32)> {
        let mut scored: Vec<(usize, f32)> = self
            .vectors
            .iter()
            .enumerate()
            .map(|(i, vector)| (i, 1.0 - cosine_similarity(query, vector)))
            .collect();
        scored.sort_by(|a, b| {
            a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal).then(a.0.cmp(&b.0))
        });
        scored.truncate(k);
        scored
    }

    /// The shared chunk collection this index was built over.
    pub fn chunks(&self) -> &Arc<Vec<Chunk>> {
        &self.chunks
    }

    /// Embedding dimensionality.
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// Number of indexed chunks.
    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    /// Whether the index holds no vectors.
    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    fn append(&mut self, vectors: Vec<Vec<f32>>) -> Result<()> {
        for vector in &vectors {
            if vector.len() != self.dimensions {
                return Err(RagError::Index(format!(
                    "embedding has {} dimensions, expected {}",
                    vector.len(),
                    self.dimensions
                )));
            }
        }
        self.vectors.extend(vectors);
        Ok(())
    }
}

/// Compute cosine similarity between two vectors.
///
/// Returns 0.0 if either vector has zero magnitude.
pub(crate) fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}
