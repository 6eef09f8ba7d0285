//! Ollama-backed embedding and generation provider.
//!
//! Talks to a local Ollama server over its HTTP API (`/api/embed` and
//! `/api/generate`). One [`OllamaClient`] can serve several roles — pass the
//! model name per constructor and hold one client per role, or clone the
//! client with a different model via [`with_model`](OllamaClient::with_model).

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error};

use crate::embedding::EmbeddingProvider;
use crate::error::{ModelError, Result};
use crate::generation::{GenerationOptions, GenerationProvider};

/// The default Ollama base URL.
const DEFAULT_BASE_URL: &str = "http://localhost:11434";

/// Request timeout. Generous because embedding large batches on CPU is slow,
/// but bounded so a hung backend fails the request instead of stalling it
/// forever.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(600);

/// An [`EmbeddingProvider`] and [`GenerationProvider`] backed by Ollama.
///
/// # Example
///
/// ```rust,ignore
/// use orbits_model::OllamaClient;
///
/// let embedder = OllamaClient::new("http://localhost:11434", "all-minilm", 384)?;
/// let vector = embedder.embed("hello world").await?;
/// ```
pub struct OllamaClient {
    client: reqwest::Client,
    base_url: String,
    model: String,
    dimensions: usize,
}

impl OllamaClient {
    /// Create a new client for the given base URL and model.
    ///
    /// `dimensions` must match the embedding width of `model`; it is reported
    /// verbatim by [`dimensions()`](EmbeddingProvider::dimensions).
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        dimensions: usize,
    ) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build().map_err(|e| {
            ModelError::Embedding {
                provider: "Ollama".into(),
                message: format!("failed to build HTTP client: {e}"),
            }
        })?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            dimensions,
        })
    }

    /// Create a client from the `OLLAMA_URL` environment variable, defaulting
    /// to `http://localhost:11434`.
    pub fn from_env(model: impl Into<String>, dimensions: usize) -> Result<Self> {
        let base_url =
            std::env::var("OLLAMA_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        Self::new(base_url, model, dimensions)
    }

    /// Return a client sharing the same connection pool but targeting a
    /// different model.
    pub fn with_model(&self, model: impl Into<String>) -> Self {
        Self {
            client: self.client.clone(),
            base_url: self.base_url.clone(),
            model: model.into(),
            dimensions: self.dimensions,
        }
    }

    /// The model this client targets.
    pub fn model(&self) -> &str {
        &self.model
    }

    async fn check_status(response: reqwest::Response, role: &str) -> Result<reqwest::Response> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let detail = serde_json::from_str::<OllamaErrorResponse>(&body)
            .map(|e| e.error)
            .unwrap_or(body);
        error!(provider = "Ollama", %status, role, "API error");
        Err(match role {
            "generate" => ModelError::Generation {
                provider: "Ollama".into(),
                message: format!("API returned {status}: {detail}"),
            },
            _ => ModelError::Embedding {
                provider: "Ollama".into(),
                message: format!("API returned {status}: {detail}"),
            },
        })
    }
}

// ── Ollama API request/response types ──────────────────────────────

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: Vec<&'a str>,
}

#[derive(Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptionsBody,
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<Value>,
}

#[derive(Serialize)]
struct GenerateOptionsBody {
    temperature: f32,
    top_k: u32,
    top_p: f32,
    num_predict: u32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

#[derive(Deserialize)]
struct OllamaErrorResponse {
    error: String,
}

// ── Provider implementations ───────────────────────────────────────

#[async_trait]
impl EmbeddingProvider for OllamaClient {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let results = self.embed_batch(&[text]).await?;
        results.into_iter().next().ok_or_else(|| ModelError::Embedding {
            provider: "Ollama".into(),
            message: "API returned empty response".into(),
        })
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!(
            provider = "Ollama",
            batch_size = texts.len(),
            model = %self.model,
            "embedding batch"
        );

        let request_body = EmbedRequest { model: &self.model, input: texts.to_vec() };
        let response = self
            .client
            .post(format!("{}/api/embed", self.base_url))
            .json(&request_body)
            .send()
            .await
            .map_err(|e| {
                error!(provider = "Ollama", error = %e, "embed request failed");
                ModelError::Embedding {
                    provider: "Ollama".into(),
                    message: format!("request failed: {e}"),
                }
            })?;

        let response = Self::check_status(response, "embed").await?;
        let parsed: EmbedResponse = response.json().await.map_err(|e| {
            error!(provider = "Ollama", error = %e, "failed to parse embed response");
            ModelError::Embedding {
                provider: "Ollama".into(),
                message: format!("failed to parse response: {e}"),
            }
        })?;

        if parsed.embeddings.len() != texts.len() {
            return Err(ModelError::Embedding {
                provider: "Ollama".into(),
                message: format!(
                    "expected {} embeddings, got {}",
                    texts.len(),
                    parsed.embeddings.len()
                ),
            });
        }

        Ok(parsed.embeddings)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

#[async_trait]
impl GenerationProvider for OllamaClient {
    async fn generate(
        &self,
        prompt: &str,
        options: &GenerationOptions,
        schema: Option<&Value>,
    ) -> Result<String> {
        debug!(
            provider = "Ollama",
            model = %self.model,
            prompt_len = prompt.len(),
            constrained = schema.is_some(),
            "generating"
        );

        let request_body = GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
            options: GenerateOptionsBody {
                temperature: options.temperature,
                top_k: options.top_k,
                top_p: options.top_p,
                num_predict: options.max_tokens,
            },
            format: schema.cloned(),
        };

        let response = self
            .client
            .post(format!("{}/api/generate", self.base_url))
            .json(&request_body)
            .send()
            .await
            .map_err(|e| {
                error!(provider = "Ollama", error = %e, "generate request failed");
                ModelError::Generation {
                    provider: "Ollama".into(),
                    message: format!("request failed: {e}"),
                }
            })?;

        let response = Self::check_status(response, "generate").await?;
        let parsed: GenerateResponse = response.json().await.map_err(|e| {
            error!(provider = "Ollama", error = %e, "failed to parse generate response");
            ModelError::Generation {
                provider: "Ollama".into(),
                message: format!("failed to parse response: {e}"),
            }
        })?;

        Ok(parsed.response)
    }
}
