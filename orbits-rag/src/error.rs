//! Error types for the `orbits-rag` crate.

use thiserror::Error;

/// Errors that can occur in retrieval and answering operations.
#[derive(Debug, Error)]
pub enum RagError {
    /// A configuration validation error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// An error occurred while loading or chunking source documents.
    #[error("Ingestion error: {0}")]
    Ingestion(String),

    /// An error occurred building, persisting, or loading an index.
    #[error("Index error: {0}")]
    Index(String),

    /// An error in the retrieval pipeline orchestration.
    #[error("Pipeline error: {0}")]
    Pipeline(String),

    /// An error propagated from a model backend.
    #[error(transparent)]
    Model(#[from] orbits_model::ModelError),
}

/// A convenience result type for retrieval operations.
pub type Result<T> = std::result::Result<T, RagError>;
