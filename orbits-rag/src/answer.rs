//! Structured answer generation and citation resolution.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::context::ContextBlock;
use crate::error::Result;
use orbits_model::{GenerationOptions, GenerationProvider};

/// A generated answer plus the resolved titles of every source it cited.
#[derive(Debug, Clone, PartialEq)]
pub struct AnswerOutcome {
    /// The answer text.
    pub answer: String,
    /// Resolved source titles, one per cited id, in citation order. Unmatched
    /// ids resolve to `"Unknown document ({id})"` rather than being dropped,
    /// so citation mismatches stay observable.
    pub source_titles: Vec<String>,
}

/// The shape the model is asked to return.
///
/// Both fields default so a JSON object missing one still parses; anything
/// that is not an object at all falls back in [`parse_structured`].
#[derive(Debug, Deserialize, PartialEq)]
struct StructuredAnswer {
    #[serde(default)]
    answer: String,
    #[serde(default)]
    source_ids: Vec<String>,
}

/// Generates evidence-grounded answers constrained to the supplied context.
pub struct AnswerGenerator {
    provider: Arc<dyn GenerationProvider>,
    options: GenerationOptions,
}

impl AnswerGenerator {
    /// Create a generator. `options` should favor determinism.
    pub fn new(provider: Arc<dyn GenerationProvider>, options: GenerationOptions) -> Self {
        Self { provider, options }
    }

    /// Issue one structured generation call and resolve its citations.
    ///
    /// The JSON schema is passed as a hint; backends may ignore it, so any
    /// output shape must parse or fall back. A backend *transport* failure is
    /// fatal for the request, but malformed output is recovered locally.
    pub async fn generate(&self, question: &str, context: &ContextBlock) -> Result<AnswerOutcome> {
        let prompt = format!(
            "Using ONLY the following context, answer the user's question.\n\
             You MUST include the document IDs you used in the 'source_ids' field of your JSON response.\n\
             \n\
             Context: \n\
             {}\n\
             \n\
             Question: {}\n\
             \n\
             Provide your answer in JSON format with 'answer' and 'source_ids' fields.",
            context.text, question
        );

        let schema = answer_schema();
        let raw = self.provider.generate(&prompt, &self.options, Some(&schema)).await?;
        let parsed = parse_structured(&raw);
        let source_titles = resolve_source_ids(&parsed.source_ids, &context.id_to_title);

        debug!(
            answer_len = parsed.answer.len(),
            cited = parsed.source_ids.len(),
            "generated answer"
        );

        Ok(AnswerOutcome { answer: parsed.answer, source_titles })
    }
}

/// The JSON schema hint for the structured answer.
fn answer_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "answer": {
                "type": "string",
                "description": "The answer to the user's question based on the provided context"
            },
            "source_ids": {
                "type": "array",
                "items": {"type": "string"},
                "description": "List of document IDs used to generate the answer (e.g., ['doc0', 'doc4'])"
            }
        },
        "required": ["answer", "source_ids"]
    })
}

/// Parse the model's raw output.
///
/// Malformed JSON from a generation backend is expected, not exceptional:
/// the raw text becomes the answer and the citation list stays empty.
fn parse_structured(raw: &str) -> StructuredAnswer {
    let trimmed = raw.trim();
    match serde_json::from_str::<StructuredAnswer>(trimmed) {
        Ok(parsed) => parsed,
        Err(e) => {
            warn!(error = %e, "generation output was not valid JSON; using raw text as answer");
            StructuredAnswer { answer: trimmed.to_string(), source_ids: Vec::new() }
        }
    }
}

/// Resolve cited ids through the per-query id→title map.
fn resolve_source_ids(ids: &[String], id_to_title: &HashMap<String, String>) -> Vec<String> {
    ids.iter()
        .map(|id| {
            let cleaned = id.trim();
            id_to_title
                .get(cleaned)
                .cloned()
                .unwrap_or_else(|| format!("Unknown document ({cleaned})"))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(entries: &[(&str, &str)]) -> HashMap<String, String> {
        entries.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn parses_well_formed_output() {
        let parsed = parse_structured(r#"{"answer": "42", "source_ids": ["doc0", "doc1"]}"#);
        assert_eq!(parsed.answer, "42");
        assert_eq!(parsed.source_ids, vec!["doc0", "doc1"]);
    }

    #[test]
    fn missing_fields_default() {
        let parsed = parse_structured(r#"{"answer": "only an answer"}"#);
        assert_eq!(parsed.answer, "only an answer");
        assert!(parsed.source_ids.is_empty());
    }

    #[test]
    fn malformed_output_falls_back_to_raw_text() {
        let parsed = parse_structured("The answer is plainly 42.");
        assert_eq!(parsed.answer, "The answer is plainly 42.");
        assert!(parsed.source_ids.is_empty());
    }

    #[test]
    fn non_object_json_falls_back_to_raw_text() {
        let parsed = parse_structured(r#""just a string""#);
        assert_eq!(parsed.answer, r#""just a string""#);
        assert!(parsed.source_ids.is_empty());
    }

    #[test]
    fn resolves_known_and_unknown_ids() {
        let titles = map(&[("doc0", "A"), ("doc1", "B")]);
        let resolved =
            resolve_source_ids(&["doc0".to_string(), "doc2".to_string()], &titles);
        assert_eq!(resolved, vec!["A", "Unknown document (doc2)"]);
    }

    #[test]
    fn trims_whitespace_before_lookup() {
        let titles = map(&[("doc0", "A")]);
        let resolved = resolve_source_ids(&[" doc0 ".to_string()], &titles);
        assert_eq!(resolved, vec!["A"]);
    }
}
