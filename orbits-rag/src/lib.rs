//! # orbits-rag
//!
//! Hybrid retrieval and evidence-grounded answering over a corpus of
//! scientific papers.
//!
//! The query path: a user question is expanded into a hypothetical answer
//! passage (HyDE), which drives dense (semantic) retrieval while the literal
//! question drives sparse (BM25) retrieval; the two candidate lists are fused
//! under configurable weights, reranked against the original question, and
//! assembled into a source-tagged context from which a structured answer is
//! generated with per-chunk citations resolved back to publication metadata.
//!
//! Model backends are injected via the `orbits-model` traits; PDF text
//! extraction is injected via [`ingest::TextExtractor`].

pub mod answer;
pub mod chunking;
pub mod config;
pub mod context;
pub mod dense;
pub mod document;
pub mod error;
pub mod fusion;
pub mod hyde;
pub mod ingest;
pub mod metadata;
pub mod normalize;
pub mod pipeline;
pub mod rerank;
pub mod sparse;

pub use answer::{AnswerGenerator, AnswerOutcome};
pub use chunking::{ChunkSplitter, TextChunk};
pub use config::{FusionWeights, RagConfig, RagConfigBuilder};
pub use context::{ContextBlock, assemble};
pub use dense::DenseIndex;
pub use document::{Candidate, Chunk, ChunkKey, SourceDocument};
pub use error::{RagError, Result};
pub use fusion::fuse;
pub use hyde::HydeExpander;
pub use ingest::{TextExtractor, chunk_document, load_corpus};
pub use metadata::{MISSING_FIELD, Publication, PublicationCatalog};
pub use normalize::normalize;
pub use pipeline::{AnswerResponse, RagPipeline, RagPipelineBuilder};
pub use rerank::{EmbeddingReranker, NoOpReranker, Reranker};
pub use sparse::SparseIndex;
