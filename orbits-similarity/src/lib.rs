//! # orbits-similarity
//!
//! Corpus-level article similarity analytics: top-k nearest neighbors,
//! pairwise similarity matrices, PCA projection, k-means clustering, and
//! density-based discovery of semantic gaps and under-explored clusters.
//!
//! The engine keeps its own corpus of article embeddings, rebuilt lazily on
//! a dirty flag: upserts and clears only mark state stale, and the next read
//! recomputes the full index. It is independent of the retrieval pipeline
//! and driven purely through the `orbits-model` embedding trait.

pub mod article;
pub mod cluster;
pub mod engine;
pub mod error;
pub mod gaps;
pub mod math;

pub use article::{Article, ArticleUpsert};
pub use engine::{
    ArticleSimilarityEngine, ClusterAssignment, ClusterLabel, ClusterSummary, ProjectedPoint,
    Projection, SampleArticle, SimilarityHit, SimilarityMatrix, UnderexploredCluster,
};
pub use error::{Result, SimilarityError};
pub use gaps::{NearbyArticle, SemanticGap};
