//! Generation provider trait for language-model completions.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;

/// Sampling options for a generation call.
///
/// Maps one-to-one onto the knobs the Ollama generate API accepts
/// (`temperature`, `top_k`, `top_p`, `num_predict`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GenerationOptions {
    /// Sampling temperature; lower values favor determinism.
    pub temperature: f32,
    /// Top-k sampling cutoff.
    pub top_k: u32,
    /// Nucleus sampling cutoff.
    pub top_p: f32,
    /// Maximum number of tokens to generate.
    pub max_tokens: u32,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self { temperature: 0.3, top_k: 40, top_p: 0.9, max_tokens: 256 }
    }
}

/// A provider that generates text completions from a prompt.
///
/// The optional `schema` is a JSON Schema the backend *may* use to constrain
/// its output. Backends are free to ignore it, so callers must not assume
/// the returned text parses.
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    /// Generate a completion for `prompt` and return the raw output text.
    async fn generate(
        &self,
        prompt: &str,
        options: &GenerationOptions,
        schema: Option<&Value>,
    ) -> Result<String>;
}
