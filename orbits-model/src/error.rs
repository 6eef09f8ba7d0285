//! Error types for the `orbits-model` crate.

use thiserror::Error;

/// Errors that can occur when talking to a model backend.
#[derive(Debug, Error)]
pub enum ModelError {
    /// An error occurred during embedding generation.
    #[error("Embedding error ({provider}): {message}")]
    Embedding {
        /// The embedding backend that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// An error occurred during text generation.
    #[error("Generation error ({provider}): {message}")]
    Generation {
        /// The generation backend that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },
}

/// A convenience result type for model backend operations.
pub type Result<T> = std::result::Result<T, ModelError>;
