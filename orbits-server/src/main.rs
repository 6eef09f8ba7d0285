use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::info;

use orbits_model::OllamaClient;
use orbits_rag::{ChunkSplitter, PublicationCatalog, RagConfig, RagPipeline, load_corpus};
use orbits_server::{AppState, LopdfExtractor, ServerSettings, run_server};
use orbits_similarity::ArticleSimilarityEngine;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().init();

    let settings = ServerSettings::from_env();
    info!(?settings, "starting orbits-server");

    let embedder = Arc::new(OllamaClient::new(
        &settings.ollama_url,
        &settings.embedding_model,
        settings.embedding_dimensions,
    )?);
    let hyde_generator = Arc::new(embedder.with_model(&settings.hyde_model));
    let answer_generator = Arc::new(embedder.with_model(&settings.answer_model));

    let config = RagConfig::builder().index_path(&settings.index_path).build()?;
    let splitter = ChunkSplitter::from_config(&config);
    let chunks = load_corpus(&settings.documents_dir, &LopdfExtractor, &splitter)?;
    let catalog = PublicationCatalog::load(&settings.csv_path);

    let pipeline = RagPipeline::builder()
        .config(config)
        .chunks(chunks)
        .embedder(embedder.clone())
        .generator(answer_generator)
        .hyde_generator(hyde_generator)
        .catalog(catalog)
        .build()
        .await?;

    let similarity = ArticleSimilarityEngine::new(embedder);

    let state = AppState {
        rag: Arc::new(pipeline),
        similarity: Arc::new(Mutex::new(similarity)),
    };

    run_server(&settings.host, settings.port, state).await
}
