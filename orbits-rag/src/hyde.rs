//! Hypothetical-document query expansion.
//!
//! A raw question and the passage that answers it rarely share vocabulary.
//! [`HydeExpander`] asks the generation backend for a short hypothetical
//! answer passage and uses *that* as the semantic query, while the sparse
//! (lexical) leg keeps searching with the literal question.

use std::sync::Arc;

use tracing::debug;

use crate::error::Result;
use orbits_model::{GenerationOptions, GenerationProvider};

/// Fixed instruction for the hypothetical passage.
const HYDE_INSTRUCTION: &str = "Generate a short, concise paragraph that reads like part of a \
                                factual article or encyclopedia entry. It should be 2-3 sentences \
                                maximum.";

/// Expands a question into a hypothetical encyclopedia-style passage.
pub struct HydeExpander {
    provider: Arc<dyn GenerationProvider>,
    options: GenerationOptions,
}

impl HydeExpander {
    /// Create an expander. `options` should favor determinism (low
    /// temperature) and a small output-token cap.
    pub fn new(provider: Arc<dyn GenerationProvider>, options: GenerationOptions) -> Self {
        Self { provider, options }
    }

    /// Generate the hypothetical passage for `question`.
    ///
    /// The result is used only as the dense-search query — never as the
    /// sparse query and never for reranking. A backend failure is fatal for
    /// the current request.
    pub async fn expand(&self, question: &str) -> Result<String> {
        let prompt = format!("{HYDE_INSTRUCTION}\n\nQuestion: {question}\n\nAnswer:");
        let passage = self.provider.generate(&prompt, &self.options, None).await?;
        debug!(question_len = question.len(), passage_len = passage.len(), "expanded query");
        Ok(passage)
    }
}
