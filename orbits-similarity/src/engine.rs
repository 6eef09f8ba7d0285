//! The article similarity engine.
//!
//! State machine with two states: **clean** (the index reflects the current
//! article set) and **dirty** (an upsert or clear happened since the last
//! rebuild). Every read operation first transitions dirty→clean by
//! recomputing the full embedding index — a full recompute, not incremental;
//! embedding is cheap at this corpus scale and incremental index maintenance
//! is not worth the complexity.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::article::{Article, ArticleUpsert};
use crate::cluster::{kmeans, rows_to_matrix};
use crate::error::Result;
use crate::gaps::{MIN_POINTS, SemanticGap, grid_gaps};
use crate::math::{cosine_matrix, dot, normalize, pca};
use orbits_model::EmbeddingProvider;

const DEFAULT_NEIGHBORS: usize = 3;
const DEFAULT_SEED: u64 = 42;

/// A nearest-neighbor result row.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SimilarityHit {
    /// Article id.
    pub id: String,
    /// Article title.
    pub title: String,
    /// Publication year, when known.
    pub year: Option<i32>,
    /// Cosine similarity to the query.
    pub score: f32,
}

/// A pairwise similarity matrix over a (sub)set of articles.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SimilarityMatrix {
    /// Row/column order.
    pub ids: Vec<String>,
    /// Cosine similarities, `matrix[i][j]` for `ids[i]` vs `ids[j]`.
    pub matrix: Vec<Vec<f32>>,
}

/// One article placed in projection space.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProjectedPoint {
    /// Article id.
    pub id: String,
    /// First principal component.
    pub x: f32,
    /// Second principal component (zero when only one was requested).
    pub y: f32,
    /// Article title.
    pub title: String,
    /// Publication year.
    pub year: Option<i32>,
    /// Author names.
    pub authors: Vec<String>,
    /// Keywords.
    pub keywords: Vec<String>,
}

/// A PCA projection plus per-component explained variance.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Projection {
    /// Projected articles.
    pub points: Vec<ProjectedPoint>,
    /// Explained variance ratio per component.
    pub explained_variance: Vec<f32>,
}

/// Per-article cluster assignment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClusterLabel {
    /// Article id.
    pub id: String,
    /// Assigned cluster.
    pub cluster: usize,
}

/// Per-cluster member count.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClusterSummary {
    /// Cluster id.
    pub cluster: usize,
    /// Member count.
    pub size: usize,
}

/// A k-means clustering result.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClusterAssignment {
    /// Label per article, in selection order.
    pub labels: Vec<ClusterLabel>,
    /// Cluster sizes, largest first.
    pub clusters: Vec<ClusterSummary>,
}

/// A member sample shown for an under-explored cluster.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SampleArticle {
    /// Article id.
    pub id: String,
    /// Article title.
    pub title: String,
}

/// A cluster whose member fraction fell at or below the size threshold.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UnderexploredCluster {
    /// Cluster id.
    pub cluster: usize,
    /// Member count.
    pub size: usize,
    /// Member share of the corpus, in percent.
    pub percentage: f32,
    /// Min and max publication year among members with a year.
    pub year_range: Option<(i32, i32)>,
    /// Up to five most frequent member keywords.
    pub top_keywords: Vec<String>,
    /// Up to three member articles.
    pub sample_articles: Vec<SampleArticle>,
    /// `1 / (size + 1)`; higher means less explored.
    pub exploration_score: f32,
}

/// One index record: an article id paired directly with its normalized
/// embedding. Keeping id and vector in one record (rather than two parallel
/// arrays) means they cannot drift apart across rebuilds.
#[derive(Debug, Clone)]
struct IndexedArticle {
    id: String,
    vector: Vec<f32>,
}

/// Corpus-level article similarity and clustering engine.
///
/// Explicitly constructed and owned by the hosting process; the host
/// serializes access (reads mutate via the lazy rebuild), which also keeps
/// at most one rebuild in flight.
pub struct ArticleSimilarityEngine {
    provider: Arc<dyn EmbeddingProvider>,
    articles: HashMap<String, Article>,
    /// Insertion order of ids; upserts of existing ids keep their slot.
    order: Vec<String>,
    /// Valid only when `dirty` is false.
    index: Vec<IndexedArticle>,
    dirty: bool,
    default_neighbors: usize,
    seed: u64,
}

impl ArticleSimilarityEngine {
    /// Create an empty engine over the given embedding provider.
    pub fn new(provider: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            provider,
            articles: HashMap::new(),
            order: Vec::new(),
            index: Vec::new(),
            dirty: false,
            default_neighbors: DEFAULT_NEIGHBORS,
            seed: DEFAULT_SEED,
        }
    }

    /// Set the neighbor count used when a query omits `k`.
    pub fn with_default_neighbors(mut self, k: usize) -> Self {
        self.default_neighbors = k;
        self
    }

    /// Set the clustering seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    // ── CRUD ───────────────────────────────────────────────────────

    /// Insert or replace articles by id, marking the index dirty.
    pub fn upsert_many(&mut self, items: Vec<ArticleUpsert>) {
        for item in items {
            let article = Article::from(item);
            if !self.articles.contains_key(&article.id) {
                self.order.push(article.id.clone());
            }
            self.articles.insert(article.id.clone(), article);
        }
        self.dirty = true;
    }

    /// Insert or replace a single article.
    pub fn upsert_one(&mut self, item: ArticleUpsert) {
        self.upsert_many(vec![item]);
    }

    /// All articles in insertion order.
    pub fn all_articles(&self) -> Vec<Article> {
        self.order.iter().map(|id| self.articles[id].clone()).collect()
    }

    /// Look up one article by id.
    pub fn get_article(&self, id: &str) -> Option<&Article> {
        self.articles.get(id)
    }

    /// Remove every article and drop the index. An empty engine is clean.
    pub fn clear(&mut self) {
        self.articles.clear();
        self.order.clear();
        self.index.clear();
        self.dirty = false;
    }

    /// Number of articles.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether the corpus is empty.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    // ── Index maintenance ──────────────────────────────────────────

    /// Transition dirty→clean: recompute the full embedding index from the
    /// current article set.
    async fn ensure_index(&mut self) -> Result<()> {
        if !self.dirty {
            return Ok(());
        }
        if self.order.is_empty() {
            self.index.clear();
            self.dirty = false;
            return Ok(());
        }

        let abstracts: Vec<&str> =
            self.order.iter().map(|id| self.articles[id].abstract_text.as_str()).collect();
        let mut vectors = self.provider.embed_batch(&abstracts).await?;
        for vector in &mut vectors {
            normalize(vector);
        }

        self.index = self
            .order
            .iter()
            .cloned()
            .zip(vectors)
            .map(|(id, vector)| IndexedArticle { id, vector })
            .collect();
        self.dirty = false;
        debug!(article_count = self.index.len(), "rebuilt similarity index");
        Ok(())
    }

    /// Select index records, either all of them (in index order) or those
    /// matching `ids` (in the requested order, unknown ids skipped).
    fn select(&self, ids: Option<&[String]>) -> Vec<&IndexedArticle> {
        match ids {
            None => self.index.iter().collect(),
            Some(ids) => {
                let by_id: HashMap<&str, &IndexedArticle> =
                    self.index.iter().map(|record| (record.id.as_str(), record)).collect();
                ids.iter().filter_map(|id| by_id.get(id.as_str()).copied()).collect()
            }
        }
    }

    fn hit(&self, id: &str, score: f32) -> SimilarityHit {
        let article = &self.articles[id];
        SimilarityHit { id: id.to_string(), title: article.title.clone(), year: article.year, score }
    }

    // ── Similarity ─────────────────────────────────────────────────

    /// The `k` nearest articles to a free-text query, by cosine similarity.
    pub async fn topk_by_text(&mut self, text: &str, k: Option<usize>) -> Result<Vec<SimilarityHit>> {
        self.ensure_index().await?;
        if self.index.is_empty() {
            return Ok(Vec::new());
        }

        let k = k.unwrap_or(self.default_neighbors).min(self.index.len());
        let mut query = self.provider.embed(text).await?;
        normalize(&mut query);

        let mut scored: Vec<(f32, &IndexedArticle)> =
            self.index.iter().map(|record| (dot(&query, &record.vector), record)).collect();
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));

        Ok(scored.into_iter().take(k).map(|(score, record)| self.hit(&record.id, score)).collect())
    }

    /// Up to `k` articles nearest to an existing article's own embedding,
    /// the article itself excluded. Unknown ids yield an empty result.
    pub async fn topk_by_id(&mut self, id: &str, k: Option<usize>) -> Result<Vec<SimilarityHit>> {
        self.ensure_index().await?;
        if self.index.is_empty() || !self.articles.contains_key(id) {
            return Ok(Vec::new());
        }

        let k = k.unwrap_or(self.default_neighbors);
        let Some(reference) = self.index.iter().find(|record| record.id == id) else {
            return Ok(Vec::new());
        };
        let query = reference.vector.clone();

        let mut scored: Vec<(f32, &IndexedArticle)> =
            self.index.iter().map(|record| (dot(&query, &record.vector), record)).collect();
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));

        Ok(scored
            .into_iter()
            .filter(|(_, record)| record.id != id)
            .take(k)
            .map(|(score, record)| self.hit(&record.id, score))
            .collect())
    }

    /// Full pairwise cosine similarity over the (sub)set.
    pub async fn similarity_matrix(&mut self, ids: Option<&[String]>) -> Result<SimilarityMatrix> {
        self.ensure_index().await?;
        let selected = self.select(ids);
        if selected.is_empty() {
            return Ok(SimilarityMatrix { ids: Vec::new(), matrix: Vec::new() });
        }

        let rows: Vec<Vec<f32>> = selected.iter().map(|record| record.vector.clone()).collect();
        let matrix = cosine_matrix(rows_to_matrix(&rows).view());

        Ok(SimilarityMatrix {
            ids: selected.iter().map(|record| record.id.clone()).collect(),
            matrix: matrix.outer_iter().map(|row| row.to_vec()).collect(),
        })
    }

    // ── Projection and clustering ──────────────────────────────────

    /// PCA projection of the (sub)set to `n_components` dimensions.
    pub async fn projection(
        &mut self,
        n_components: usize,
        ids: Option<&[String]>,
    ) -> Result<Projection> {
        self.ensure_index().await?;
        let selected = self.select(ids);
        if selected.is_empty() {
            return Ok(Projection { points: Vec::new(), explained_variance: Vec::new() });
        }

        let rows: Vec<Vec<f32>> = selected.iter().map(|record| record.vector.clone()).collect();
        let result = pca(rows_to_matrix(&rows).view(), n_components);

        let points = selected
            .iter()
            .enumerate()
            .map(|(i, record)| {
                let article = &self.articles[record.id.as_str()];
                ProjectedPoint {
                    id: record.id.clone(),
                    x: result.projected.get((i, 0)).copied().unwrap_or(0.0),
                    y: result.projected.get((i, 1)).copied().unwrap_or(0.0),
                    title: article.title.clone(),
                    year: article.year,
                    authors: article.authors.clone(),
                    keywords: article.keywords.clone(),
                }
            })
            .collect();

        Ok(Projection { points, explained_variance: result.explained_variance })
    }

    /// k-means over the (sub)set's embeddings: a label per article plus
    /// cluster sizes sorted largest first.
    pub async fn clusters(&mut self, k: usize, ids: Option<&[String]>) -> Result<ClusterAssignment> {
        self.ensure_index().await?;
        let selected = self.select(ids);
        if selected.is_empty() {
            return Ok(ClusterAssignment { labels: Vec::new(), clusters: Vec::new() });
        }

        let rows: Vec<Vec<f32>> = selected.iter().map(|record| record.vector.clone()).collect();
        let labels = kmeans(rows_to_matrix(&rows).view(), k, self.seed);

        let mut counts: HashMap<usize, usize> = HashMap::new();
        for &label in &labels {
            *counts.entry(label).or_insert(0) += 1;
        }
        let mut clusters: Vec<ClusterSummary> =
            counts.into_iter().map(|(cluster, size)| ClusterSummary { cluster, size }).collect();
        clusters.sort_by(|a, b| b.size.cmp(&a.size).then(a.cluster.cmp(&b.cluster)));

        let labels = selected
            .iter()
            .zip(&labels)
            .map(|(record, &cluster)| ClusterLabel { id: record.id.clone(), cluster })
            .collect();

        Ok(ClusterAssignment { labels, clusters })
    }

    // ── Gap analysis ───────────────────────────────────────────────

    /// Find low-density regions of the 2D projection.
    ///
    /// Returns an empty result for corpora under ten articles.
    pub async fn find_semantic_gaps(
        &mut self,
        grid_size: usize,
        threshold: f32,
    ) -> Result<Vec<SemanticGap>> {
        self.ensure_index().await?;
        if self.index.len() < MIN_POINTS {
            return Ok(Vec::new());
        }
        let projection = self.projection(2, None).await?;
        Ok(grid_gaps(&projection.points, grid_size, threshold))
    }

    /// Report clusters whose member fraction is at most `min_size_threshold`,
    /// annotated with year range, top keywords, and member samples, sorted by
    /// exploration score descending.
    pub async fn underexplored_clusters(
        &mut self,
        n_clusters: usize,
        min_size_threshold: f32,
    ) -> Result<Vec<UnderexploredCluster>> {
        self.ensure_index().await?;
        if self.index.is_empty() {
            return Ok(Vec::new());
        }

        let assignment = self.clusters(n_clusters, None).await?;
        let total = self.index.len() as f32;

        let mut result = Vec::new();
        for summary in &assignment.clusters {
            let fraction = summary.size as f32 / total;
            if fraction > min_size_threshold {
                continue;
            }

            let members: Vec<&Article> = assignment
                .labels
                .iter()
                .filter(|label| label.cluster == summary.cluster)
                .map(|label| &self.articles[label.id.as_str()])
                .collect();

            let years: Vec<i32> = members.iter().filter_map(|article| article.year).collect();
            let year_range = years
                .iter()
                .min()
                .copied()
                .zip(years.iter().max().copied());

            // Keyword frequencies; stable sort keeps first-seen order on ties.
            let mut keyword_counts: Vec<(String, usize)> = Vec::new();
            for keyword in members.iter().flat_map(|article| article.keywords.iter()) {
                match keyword_counts.iter_mut().find(|(k, _)| k == keyword) {
                    Some((_, count)) => *count += 1,
                    None => keyword_counts.push((keyword.clone(), 1)),
                }
            }
            keyword_counts.sort_by(|a, b| b.1.cmp(&a.1));

            result.push(UnderexploredCluster {
                cluster: summary.cluster,
                size: summary.size,
                percentage: fraction * 100.0,
                year_range,
                top_keywords: keyword_counts.into_iter().take(5).map(|(k, _)| k).collect(),
                sample_articles: members
                    .iter()
                    .take(3)
                    .map(|article| SampleArticle {
                        id: article.id.clone(),
                        title: article.title.clone(),
                    })
                    .collect(),
                exploration_score: 1.0 / (summary.size as f32 + 1.0),
            });
        }

        result.sort_by(|a, b| {
            b.exploration_score
                .partial_cmp(&a.exploration_score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        Ok(result)
    }
}
