//! Environment-driven server settings.

use std::env;
use std::path::PathBuf;

/// Process configuration, read once at startup from the environment.
#[derive(Debug, Clone)]
pub struct ServerSettings {
    /// Bind host.
    pub host: String,
    /// Bind port.
    pub port: u16,
    /// Directory of source PDFs.
    pub documents_dir: PathBuf,
    /// Publication metadata CSV.
    pub csv_path: PathBuf,
    /// Dense index snapshot directory.
    pub index_path: PathBuf,
    /// Ollama base URL.
    pub ollama_url: String,
    /// Embedding model name.
    pub embedding_model: String,
    /// Embedding dimensionality.
    pub embedding_dimensions: usize,
    /// Model used for HyDE query expansion.
    pub hyde_model: String,
    /// Model used for structured answers.
    pub answer_model: String,
}

fn var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

impl ServerSettings {
    /// Read settings from the environment, with development defaults.
    pub fn from_env() -> Self {
        Self {
            host: var_or("HOST", "0.0.0.0"),
            port: var_or("PORT", "5000").parse().unwrap_or(5000),
            documents_dir: PathBuf::from(var_or("DOCUMENTS_DIR", "./data")),
            csv_path: PathBuf::from(var_or("CSV_PATH", "./papers.csv")),
            index_path: PathBuf::from(var_or("INDEX_PATH", "./dense_index")),
            ollama_url: var_or("OLLAMA_URL", "http://localhost:11434"),
            embedding_model: var_or("EMBEDDING_MODEL", "all-minilm"),
            embedding_dimensions: var_or("EMBEDDING_DIMENSIONS", "384").parse().unwrap_or(384),
            hyde_model: var_or("HYDE_MODEL", "llama3.2:1b"),
            answer_model: var_or("ANSWER_MODEL", "llama3.2:3b"),
        }
    }
}
