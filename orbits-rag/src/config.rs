//! Configuration for the retrieval pipeline.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{RagError, Result};
use orbits_model::GenerationOptions;

/// Relative weights applied when fusing sparse and dense retrieval results.
///
/// The weights need not sum to one; they only need a positive total.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct FusionWeights {
    /// Weight applied to the rank-derived sparse (BM25) score.
    pub sparse: f32,
    /// Weight applied to the distance-derived dense score.
    pub dense: f32,
}

impl Default for FusionWeights {
    fn default() -> Self {
        Self { sparse: 0.3, dense: 0.7 }
    }
}

/// Configuration parameters for the retrieval pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RagConfig {
    /// Maximum chunk size in characters.
    pub chunk_size: usize,
    /// Number of overlapping characters between consecutive chunks.
    pub chunk_overlap: usize,
    /// Separator ladder for the recursive splitter, coarsest first.
    /// The empty string means "hard-slice by characters".
    pub separators: Vec<String>,
    /// Fusion weights for merging sparse and dense candidates.
    pub ensemble_weights: FusionWeights,
    /// Depth of each retrieval leg and cap on the fused candidate list.
    pub retrieval_k: usize,
    /// Number of chunks the reranker keeps for the answer context.
    pub top_k: usize,
    /// Sampling options for the hypothetical-passage (HyDE) call.
    pub hyde_options: GenerationOptions,
    /// Sampling options for the structured answer call.
    pub answer_options: GenerationOptions,
    /// Directory holding the dense index snapshot.
    pub index_path: PathBuf,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1200,
            chunk_overlap: 200,
            separators: ["\n\n", "\n", ".", "!", "?", ",", " ", ""]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            ensemble_weights: FusionWeights::default(),
            retrieval_k: 20,
            top_k: 7,
            hyde_options: GenerationOptions {
                temperature: 0.3,
                top_k: 40,
                top_p: 0.9,
                max_tokens: 100,
            },
            answer_options: GenerationOptions {
                temperature: 0.1,
                top_k: 20,
                top_p: 0.9,
                max_tokens: 1024,
            },
            index_path: PathBuf::from("dense_index"),
        }
    }
}

impl RagConfig {
    /// Create a new builder for constructing a [`RagConfig`].
    pub fn builder() -> RagConfigBuilder {
        RagConfigBuilder::default()
    }
}

/// Builder for constructing a validated [`RagConfig`].
#[derive(Debug, Clone, Default)]
pub struct RagConfigBuilder {
    config: RagConfig,
}

impl RagConfigBuilder {
    /// Set the maximum chunk size in characters.
    pub fn chunk_size(mut self, size: usize) -> Self {
        self.config.chunk_size = size;
        self
    }

    /// Set the overlap between consecutive chunks in characters.
    pub fn chunk_overlap(mut self, overlap: usize) -> Self {
        self.config.chunk_overlap = overlap;
        self
    }

    /// Set the separator ladder for the recursive splitter.
    pub fn separators(mut self, separators: Vec<String>) -> Self {
        self.config.separators = separators;
        self
    }

    /// Set the sparse/dense fusion weights.
    pub fn ensemble_weights(mut self, weights: FusionWeights) -> Self {
        self.config.ensemble_weights = weights;
        self
    }

    /// Set the retrieval depth and fused-candidate cap.
    pub fn retrieval_k(mut self, k: usize) -> Self {
        self.config.retrieval_k = k;
        self
    }

    /// Set the number of chunks kept after reranking.
    pub fn top_k(mut self, k: usize) -> Self {
        self.config.top_k = k;
        self
    }

    /// Set the HyDE sampling options.
    pub fn hyde_options(mut self, options: GenerationOptions) -> Self {
        self.config.hyde_options = options;
        self
    }

    /// Set the answer sampling options.
    pub fn answer_options(mut self, options: GenerationOptions) -> Self {
        self.config.answer_options = options;
        self
    }

    /// Set the dense index snapshot directory.
    pub fn index_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.index_path = path.into();
        self
    }

    /// Build the [`RagConfig`], validating that parameters are consistent.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Config`] if:
    /// - `chunk_overlap >= chunk_size`
    /// - `retrieval_k == 0` or `top_k == 0`
    /// - a fusion weight is negative or both are zero
    pub fn build(self) -> Result<RagConfig> {
        let config = self.config;
        if config.chunk_overlap >= config.chunk_size {
            return Err(RagError::Config(format!(
                "chunk_overlap ({}) must be less than chunk_size ({})",
                config.chunk_overlap, config.chunk_size
            )));
        }
        if config.retrieval_k == 0 {
            return Err(RagError::Config("retrieval_k must be greater than zero".to_string()));
        }
        if config.top_k == 0 {
            return Err(RagError::Config("top_k must be greater than zero".to_string()));
        }
        let weights = config.ensemble_weights;
        if weights.sparse < 0.0 || weights.dense < 0.0 || weights.sparse + weights.dense <= 0.0 {
            return Err(RagError::Config(format!(
                "ensemble weights must be non-negative with a positive sum (got sparse={}, dense={})",
                weights.sparse, weights.dense
            )));
        }
        Ok(config)
    }
}
