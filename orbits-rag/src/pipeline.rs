//! Retrieval pipeline orchestrator.
//!
//! [`RagPipeline`] coordinates the full query workflow: HyDE expansion,
//! dual-index retrieval, weighted fusion, reranking, context assembly, and
//! structured answer generation with citation resolution. One explicitly
//! constructed instance is owned by the hosting process and passed where
//! needed — no implicit global.

use std::sync::Arc;

use tracing::{error, info};

use crate::answer::AnswerGenerator;
use crate::config::RagConfig;
use crate::context::assemble;
use crate::dense::DenseIndex;
use crate::document::Chunk;
use crate::error::{RagError, Result};
use crate::fusion::fuse;
use crate::hyde::HydeExpander;
use crate::metadata::{Publication, PublicationCatalog};
use crate::rerank::{EmbeddingReranker, Reranker};
use crate::sparse::SparseIndex;
use orbits_model::{EmbeddingProvider, GenerationProvider};

/// A grounded answer plus per-citation publication metadata.
///
/// `sources` is aligned with the model's citations: `None` marks a citation
/// whose resolved title had no row in the metadata table.
#[derive(Debug, Clone, PartialEq)]
pub struct AnswerResponse {
    /// The answer text.
    pub answer: String,
    /// Resolved source titles, in citation order.
    pub source_titles: Vec<String>,
    /// Publication metadata per resolved title (`None` when unmatched).
    pub sources: Vec<Option<Publication>>,
}

/// The retrieval pipeline.
///
/// Construct one via [`RagPipeline::builder()`]; building embeds the corpus
/// (or reloads the dense snapshot) and indexes it for lexical search.
pub struct RagPipeline {
    config: RagConfig,
    chunks: Arc<Vec<Chunk>>,
    sparse: SparseIndex,
    dense: DenseIndex,
    embedder: Arc<dyn EmbeddingProvider>,
    reranker: Arc<dyn Reranker>,
    hyde: HydeExpander,
    answerer: AnswerGenerator,
    catalog: PublicationCatalog,
}

impl RagPipeline {
    /// Create a new [`RagPipelineBuilder`].
    pub fn builder() -> RagPipelineBuilder {
        RagPipelineBuilder::default()
    }

    /// Return a reference to the pipeline configuration.
    pub fn config(&self) -> &RagConfig {
        &self.config
    }

    /// The shared chunk collection.
    pub fn chunks(&self) -> &Arc<Vec<Chunk>> {
        &self.chunks
    }

    /// Answer a question from the indexed corpus.
    ///
    /// Stages: HyDE passage → dense search (on the passage) + sparse search
    /// (on the literal question) → weighted fusion → rerank against the
    /// question → context assembly → structured generation → citation
    /// resolution → metadata enrichment.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Pipeline`] when a backend call fails; malformed
    /// generation output and unmatched citations are recovered locally and
    /// never fail the request.
    pub async fn answer(&self, question: &str) -> Result<AnswerResponse> {
        let hyde_passage = self.hyde.expand(question).await.map_err(|e| {
            error!(error = %e, "query expansion failed");
            RagError::Pipeline(format!("query expansion failed: {e}"))
        })?;

        let hyde_vector = self.embedder.embed(&hyde_passage).await.map_err(|e| {
            error!(error = %e, "query embedding failed");
            RagError::Pipeline(format!("query embedding failed: {e}"))
        })?;

        let k = self.config.retrieval_k;
        let dense_hits = self.dense.search(&hyde_vector, k);
        let sparse_hits = self.sparse.search(question, k);
        let fused = fuse(&dense_hits, &sparse_hits, &self.config.ensemble_weights, k);

        let reranked = self
            .reranker
            .rerank(question, &fused, &self.chunks, self.config.top_k)
            .await
            .map_err(|e| {
                error!(error = %e, "reranking failed");
                RagError::Pipeline(format!("reranking failed: {e}"))
            })?;

        let selected: Vec<&Chunk> = reranked.iter().map(|c| &self.chunks[c.chunk_idx]).collect();
        let context = assemble(&selected);

        let outcome = self.answerer.generate(question, &context).await.map_err(|e| {
            error!(error = %e, "answer generation failed");
            RagError::Pipeline(format!("answer generation failed: {e}"))
        })?;

        let sources =
            outcome.source_titles.iter().map(|title| self.catalog.lookup(title)).collect();

        info!(
            dense_hits = dense_hits.len(),
            sparse_hits = sparse_hits.len(),
            context_chunks = selected.len(),
            cited = outcome.source_titles.len(),
            "query completed"
        );

        Ok(AnswerResponse {
            answer: outcome.answer,
            source_titles: outcome.source_titles,
            sources,
        })
    }
}

/// Builder for constructing a [`RagPipeline`].
///
/// `config`, `chunks`, `embedder`, and `generator` are required; the reranker
/// defaults to [`EmbeddingReranker`] over the same embedding provider and the
/// catalog defaults to empty. [`build()`](RagPipelineBuilder::build) embeds
/// the corpus (or reloads the snapshot at `config.index_path`).
#[derive(Default)]
pub struct RagPipelineBuilder {
    config: Option<RagConfig>,
    chunks: Option<Vec<Chunk>>,
    embedder: Option<Arc<dyn EmbeddingProvider>>,
    generator: Option<Arc<dyn GenerationProvider>>,
    hyde_generator: Option<Arc<dyn GenerationProvider>>,
    reranker: Option<Arc<dyn Reranker>>,
    catalog: Option<PublicationCatalog>,
}

impl RagPipelineBuilder {
    /// Set the pipeline configuration.
    pub fn config(mut self, config: RagConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the ingested chunk collection.
    pub fn chunks(mut self, chunks: Vec<Chunk>) -> Self {
        self.chunks = Some(chunks);
        self
    }

    /// Set the embedding provider.
    pub fn embedder(mut self, provider: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedder = Some(provider);
        self
    }

    /// Set the generation provider used for answers (and for HyDE unless a
    /// separate provider is given).
    pub fn generator(mut self, provider: Arc<dyn GenerationProvider>) -> Self {
        self.generator = Some(provider);
        self
    }

    /// Set a separate generation provider for HyDE expansion. Query
    /// expansion tolerates a much smaller model than answering does.
    pub fn hyde_generator(mut self, provider: Arc<dyn GenerationProvider>) -> Self {
        self.hyde_generator = Some(provider);
        self
    }

    /// Set a reranker; defaults to embedding-similarity reranking.
    pub fn reranker(mut self, reranker: Arc<dyn Reranker>) -> Self {
        self.reranker = Some(reranker);
        self
    }

    /// Set the publication metadata catalog; defaults to empty.
    pub fn catalog(mut self, catalog: PublicationCatalog) -> Self {
        self.catalog = Some(catalog);
        self
    }

    /// Build the pipeline: validate inputs, index the corpus lexically, and
    /// load or build the dense index snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Config`] if a required field is missing, or an
    /// index/backend error if embedding the corpus fails.
    pub async fn build(self) -> Result<RagPipeline> {
        let config =
            self.config.ok_or_else(|| RagError::Config("config is required".to_string()))?;
        let chunks =
            self.chunks.ok_or_else(|| RagError::Config("chunks are required".to_string()))?;
        let embedder =
            self.embedder.ok_or_else(|| RagError::Config("embedder is required".to_string()))?;
        let generator =
            self.generator.ok_or_else(|| RagError::Config("generator is required".to_string()))?;

        let chunks = Arc::new(chunks);
        let sparse = SparseIndex::build(&chunks);
        let dense =
            DenseIndex::load_or_build(&config.index_path, chunks.clone(), embedder.as_ref())
                .await?;

        let reranker = self
            .reranker
            .unwrap_or_else(|| Arc::new(EmbeddingReranker::new(embedder.clone())));
        let catalog = self.catalog.unwrap_or_default();

        let hyde_provider = self.hyde_generator.unwrap_or_else(|| generator.clone());
        let hyde = HydeExpander::new(hyde_provider, config.hyde_options.clone());
        let answerer = AnswerGenerator::new(generator, config.answer_options.clone());

        info!(chunk_count = chunks.len(), "retrieval pipeline ready");

        Ok(RagPipeline {
            config,
            chunks,
            sparse,
            dense,
            embedder,
            reranker,
            hyde,
            answerer,
            catalog,
        })
    }
}
