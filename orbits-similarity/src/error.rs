//! Error types for the `orbits-similarity` crate.

use thiserror::Error;

/// Errors that can occur in similarity engine operations.
///
/// Analytic operations on empty or too-small corpora return empty results
/// rather than errors; the only failure mode is the embedding backend.
#[derive(Debug, Error)]
pub enum SimilarityError {
    /// An error propagated from the embedding backend.
    #[error(transparent)]
    Model(#[from] orbits_model::ModelError),
}

/// A convenience result type for similarity operations.
pub type Result<T> = std::result::Result<T, SimilarityError>;
