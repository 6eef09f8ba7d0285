//! # orbits-server
//!
//! HTTP surface for Research Orbits: the RAG query endpoint plus the article
//! similarity CRUD and analytics endpoints, served with axum.

pub mod extract;
pub mod settings;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
};
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};

use orbits_rag::{Publication, RagPipeline};
use orbits_similarity::{
    Article, ArticleSimilarityEngine, ArticleUpsert, ClusterAssignment, Projection, SemanticGap,
    SimilarityHit, SimilarityMatrix, UnderexploredCluster,
};

pub use extract::LopdfExtractor;
pub use settings::ServerSettings;

/// Shared application state.
///
/// Both services are explicitly constructed at bootstrap and injected — no
/// globals. The similarity engine sits behind one mutex because even read
/// operations may trigger a lazy index rebuild; the mutex serializes those
/// rebuilds along with writers.
#[derive(Clone)]
pub struct AppState {
    /// The retrieval pipeline.
    pub rag: Arc<RagPipeline>,
    /// The article similarity engine.
    pub similarity: Arc<Mutex<ArticleSimilarityEngine>>,
}

type ApiError = (StatusCode, Json<Value>);

fn internal_error(e: impl std::fmt::Display) -> ApiError {
    error!(error = %e, "request failed");
    (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "ok": false, "detail": e.to_string() })))
}

/// Build the application router.
pub fn app_router(state: AppState) -> Router {
    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);

    Router::new()
        .route("/", get(root))
        .route("/api/query", post(query))
        .route("/articles", get(list_articles).post(upsert_article))
        .route("/articles/bulk", post(upsert_articles))
        .route("/articles/{id}", get(get_article))
        .route("/clear", post(clear))
        .route("/similarity/by-text", post(similarity_by_text))
        .route("/similarity/matrix", post(similarity_matrix))
        .route("/similarity/{id}", get(similarity_by_id))
        .route("/viz/projection", post(projection))
        .route("/viz/clusters", post(clusters))
        .route("/analysis/gaps", post(semantic_gaps))
        .route("/analysis/underexplored", post(underexplored))
        .with_state(state)
        .layer(cors)
}

/// Bind and serve until shutdown.
pub async fn run_server(host: &str, port: u16, state: AppState) -> anyhow::Result<()> {
    let app = app_router(state);
    let addr: SocketAddr =
        format!("{host}:{port}").parse().with_context(|| "invalid host/port for orbits-server")?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("orbits-server listening on http://{}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}

// ── Health ─────────────────────────────────────────────────────────

async fn root() -> Json<Value> {
    Json(json!({ "message": "Research Orbits API is running..." }))
}

// ── RAG query ──────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct QueryRequest {
    question: String,
}

#[derive(Debug, serde::Serialize)]
struct QueryResponse {
    ok: bool,
    answer: String,
    source: Vec<Option<Publication>>,
}

async fn query(
    State(state): State<AppState>,
    Json(request): Json<QueryRequest>,
) -> Result<Json<QueryResponse>, ApiError> {
    let response = state.rag.answer(&request.question).await.map_err(internal_error)?;
    Ok(Json(QueryResponse { ok: true, answer: response.answer, source: response.sources }))
}

// ── Article CRUD ───────────────────────────────────────────────────

async fn list_articles(State(state): State<AppState>) -> Json<Vec<Article>> {
    let engine = state.similarity.lock().await;
    Json(engine.all_articles())
}

async fn get_article(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<Article>, ApiError> {
    let engine = state.similarity.lock().await;
    engine.get_article(&id).cloned().map(Json).ok_or((
        StatusCode::NOT_FOUND,
        Json(json!({ "ok": false, "detail": format!("article '{id}' not found") })),
    ))
}

async fn upsert_article(
    State(state): State<AppState>,
    Json(item): Json<ArticleUpsert>,
) -> Json<Value> {
    let mut engine = state.similarity.lock().await;
    engine.upsert_one(item);
    Json(json!({ "ok": true, "count": engine.len() }))
}

async fn upsert_articles(
    State(state): State<AppState>,
    Json(items): Json<Vec<ArticleUpsert>>,
) -> Json<Value> {
    let mut engine = state.similarity.lock().await;
    engine.upsert_many(items);
    Json(json!({ "ok": true, "count": engine.len() }))
}

async fn clear(State(state): State<AppState>) -> Json<Value> {
    let mut engine = state.similarity.lock().await;
    engine.clear();
    Json(json!({ "ok": true }))
}

// ── Similarity ─────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct ByTextRequest {
    text: String,
    #[serde(default)]
    k: Option<usize>,
}

async fn similarity_by_text(
    State(state): State<AppState>,
    Json(request): Json<ByTextRequest>,
) -> Result<Json<Vec<SimilarityHit>>, ApiError> {
    let mut engine = state.similarity.lock().await;
    let hits = engine.topk_by_text(&request.text, request.k).await.map_err(internal_error)?;
    Ok(Json(hits))
}

#[derive(Debug, Deserialize)]
struct NeighborQuery {
    #[serde(default)]
    k: Option<usize>,
}

async fn similarity_by_id(
    Path(id): Path<String>,
    Query(params): Query<NeighborQuery>,
    State(state): State<AppState>,
) -> Result<Json<Vec<SimilarityHit>>, ApiError> {
    let mut engine = state.similarity.lock().await;
    let hits = engine.topk_by_id(&id, params.k).await.map_err(internal_error)?;
    Ok(Json(hits))
}

#[derive(Debug, Deserialize, Default)]
struct MatrixRequest {
    #[serde(default)]
    ids: Option<Vec<String>>,
}

async fn similarity_matrix(
    State(state): State<AppState>,
    Json(request): Json<MatrixRequest>,
) -> Result<Json<SimilarityMatrix>, ApiError> {
    let mut engine = state.similarity.lock().await;
    let matrix =
        engine.similarity_matrix(request.ids.as_deref()).await.map_err(internal_error)?;
    Ok(Json(matrix))
}

// ── Visualization ──────────────────────────────────────────────────

fn default_components() -> usize {
    2
}

#[derive(Debug, Deserialize)]
struct ProjectionRequest {
    #[serde(default = "default_components")]
    n_components: usize,
    #[serde(default)]
    ids: Option<Vec<String>>,
}

async fn projection(
    State(state): State<AppState>,
    Json(request): Json<ProjectionRequest>,
) -> Result<Json<Projection>, ApiError> {
    let mut engine = state.similarity.lock().await;
    let projection = engine
        .projection(request.n_components, request.ids.as_deref())
        .await
        .map_err(internal_error)?;
    Ok(Json(projection))
}

fn default_cluster_k() -> usize {
    5
}

#[derive(Debug, Deserialize)]
struct ClustersRequest {
    #[serde(default = "default_cluster_k")]
    k: usize,
    #[serde(default)]
    ids: Option<Vec<String>>,
}

async fn clusters(
    State(state): State<AppState>,
    Json(request): Json<ClustersRequest>,
) -> Result<Json<ClusterAssignment>, ApiError> {
    let mut engine = state.similarity.lock().await;
    let assignment =
        engine.clusters(request.k, request.ids.as_deref()).await.map_err(internal_error)?;
    Ok(Json(assignment))
}

// ── Analysis ───────────────────────────────────────────────────────

fn default_grid_size() -> usize {
    20
}

fn default_gap_threshold() -> f32 {
    0.05
}

#[derive(Debug, Deserialize)]
struct GapsRequest {
    #[serde(default = "default_grid_size")]
    grid_size: usize,
    #[serde(default = "default_gap_threshold")]
    threshold: f32,
}

async fn semantic_gaps(
    State(state): State<AppState>,
    Json(request): Json<GapsRequest>,
) -> Result<Json<Vec<SemanticGap>>, ApiError> {
    let mut engine = state.similarity.lock().await;
    let gaps = engine
        .find_semantic_gaps(request.grid_size, request.threshold)
        .await
        .map_err(internal_error)?;
    Ok(Json(gaps))
}

fn default_analysis_clusters() -> usize {
    15
}

fn default_min_size_threshold() -> f32 {
    0.05
}

#[derive(Debug, Deserialize)]
struct UnderexploredRequest {
    #[serde(default = "default_analysis_clusters")]
    n_clusters: usize,
    #[serde(default = "default_min_size_threshold")]
    min_size_threshold: f32,
}

async fn underexplored(
    State(state): State<AppState>,
    Json(request): Json<UnderexploredRequest>,
) -> Result<Json<Vec<UnderexploredCluster>>, ApiError> {
    let mut engine = state.similarity.lock().await;
    let flagged = engine
        .underexplored_clusters(request.n_clusters, request.min_size_threshold)
        .await
        .map_err(internal_error)?;
    Ok(Json(flagged))
}
