//! # orbits-model
//!
//! Model backend contracts for Research Orbits: the [`EmbeddingProvider`]
//! and [`GenerationProvider`] traits, plus the [`OllamaClient`] that
//! implements both over the Ollama HTTP API.
//!
//! Retrieval and analytics code depends only on the traits; the concrete
//! backend is chosen at process bootstrap and injected.

pub mod embedding;
pub mod error;
pub mod generation;
pub mod ollama;

pub use embedding::EmbeddingProvider;
pub use error::{ModelError, Result};
pub use generation::{GenerationOptions, GenerationProvider};
pub use ollama::OllamaClient;
