//! Behavior tests for the similarity engine with a deterministic embedder.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use orbits_model::EmbeddingProvider;
use orbits_similarity::{ArticleSimilarityEngine, ArticleUpsert};

const DIM: usize = 64;

/// Deterministic bag-of-words embedder: texts sharing vocabulary get nearby
/// vectors, so topical closeness survives the mock.
struct MockEmbedder {
    batch_calls: AtomicUsize,
}

impl MockEmbedder {
    fn new() -> Arc<Self> {
        Arc::new(Self { batch_calls: AtomicUsize::new(0) })
    }

    fn embed_text(text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; DIM];
        for token in text.to_lowercase().split_whitespace() {
            let hash = token
                .bytes()
                .fold(0u64, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u64));
            vector[(hash % DIM as u64) as usize] += 1.0;
        }
        vector
    }
}

#[async_trait]
impl EmbeddingProvider for MockEmbedder {
    async fn embed(&self, text: &str) -> orbits_model::Result<Vec<f32>> {
        Ok(Self::embed_text(text))
    }

    async fn embed_batch(&self, texts: &[&str]) -> orbits_model::Result<Vec<Vec<f32>>> {
        self.batch_calls.fetch_add(1, Ordering::SeqCst);
        Ok(texts.iter().map(|t| Self::embed_text(t)).collect())
    }

    fn dimensions(&self) -> usize {
        DIM
    }
}

fn upsert(id: &str, abstract_text: &str) -> ArticleUpsert {
    ArticleUpsert {
        id: id.to_string(),
        title: Some(format!("Paper {id}")),
        abstract_text: abstract_text.to_string(),
        year: None,
        authors: vec![],
        keywords: vec![],
    }
}

fn three_article_corpus() -> Vec<ArticleUpsert> {
    vec![
        upsert("1", "quantum computing error correction"),
        upsert("2", "quantum error correction codes"),
        upsert("3", "bird migration patterns"),
    ]
}

#[tokio::test]
async fn topk_by_id_ranks_the_closer_topic_first() {
    let mut engine = ArticleSimilarityEngine::new(MockEmbedder::new());
    engine.upsert_many(three_article_corpus());

    let hits = engine.topk_by_id("1", Some(1)).await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].id, "2");

    let all = engine.topk_by_id("1", Some(2)).await.unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].id, "2");
    assert_eq!(all[1].id, "3");
    assert!(all[0].score > all[1].score);
}

#[tokio::test]
async fn topk_by_id_excludes_the_reference_article() {
    let mut engine = ArticleSimilarityEngine::new(MockEmbedder::new());
    engine.upsert_many(three_article_corpus());

    let hits = engine.topk_by_id("1", Some(10)).await.unwrap();
    assert!(hits.iter().all(|hit| hit.id != "1"));
    assert_eq!(hits.len(), 2);
}

#[tokio::test]
async fn topk_by_unknown_id_is_empty() {
    let mut engine = ArticleSimilarityEngine::new(MockEmbedder::new());
    engine.upsert_many(three_article_corpus());
    assert!(engine.topk_by_id("nope", None).await.unwrap().is_empty());
}

#[tokio::test]
async fn topk_by_text_finds_matching_topic() {
    let mut engine = ArticleSimilarityEngine::new(MockEmbedder::new());
    engine.upsert_many(three_article_corpus());

    let hits = engine.topk_by_text("bird migration", Some(1)).await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].id, "3");
}

#[tokio::test]
async fn reads_on_an_empty_engine_are_empty_not_errors() {
    let mut engine = ArticleSimilarityEngine::new(MockEmbedder::new());

    assert!(engine.topk_by_text("anything", None).await.unwrap().is_empty());
    assert!(engine.topk_by_id("1", None).await.unwrap().is_empty());
    assert!(engine.similarity_matrix(None).await.unwrap().ids.is_empty());
    assert!(engine.projection(2, None).await.unwrap().points.is_empty());
    assert!(engine.clusters(3, None).await.unwrap().labels.is_empty());
    assert!(engine.find_semantic_gaps(10, 0.05).await.unwrap().is_empty());
    assert!(engine.underexplored_clusters(5, 0.2).await.unwrap().is_empty());
}

#[tokio::test]
async fn upsert_marks_dirty_and_reads_see_the_new_state() {
    let embedder = MockEmbedder::new();
    let mut engine = ArticleSimilarityEngine::new(embedder.clone());
    engine.upsert_many(three_article_corpus());

    let before = engine.topk_by_text("quantum", Some(3)).await.unwrap();
    assert_eq!(before.len(), 3);
    assert_eq!(embedder.batch_calls.load(Ordering::SeqCst), 1);

    // A clean engine serves reads without rebuilding.
    let _ = engine.similarity_matrix(None).await.unwrap();
    assert_eq!(embedder.batch_calls.load(Ordering::SeqCst), 1);

    // An upsert invalidates the cached index; the next read rebuilds and
    // reflects exactly the current article set.
    engine.upsert_one(upsert("4", "deep learning for protein folding"));
    let after = engine.topk_by_text("protein folding", Some(4)).await.unwrap();
    assert_eq!(embedder.batch_calls.load(Ordering::SeqCst), 2);
    assert_eq!(after.len(), 4);
    assert_eq!(after[0].id, "4");
}

#[tokio::test]
async fn replacing_an_abstract_changes_its_neighbors() {
    let mut engine = ArticleSimilarityEngine::new(MockEmbedder::new());
    engine.upsert_many(three_article_corpus());

    // Rewrite article 2 to be about birds; article 1 loses its twin.
    engine.upsert_one(upsert("2", "bird migration navigation"));
    let hits = engine.topk_by_id("3", Some(1)).await.unwrap();
    assert_eq!(hits[0].id, "2");
}

#[tokio::test]
async fn clear_empties_every_read() {
    let mut engine = ArticleSimilarityEngine::new(MockEmbedder::new());
    engine.upsert_many(three_article_corpus());
    let _ = engine.topk_by_text("quantum", None).await.unwrap();

    engine.clear();
    assert!(engine.is_empty());
    assert!(engine.all_articles().is_empty());
    assert!(engine.topk_by_text("quantum", None).await.unwrap().is_empty());
    assert!(engine.similarity_matrix(None).await.unwrap().matrix.is_empty());
}

#[tokio::test]
async fn similarity_matrix_is_symmetric_with_unit_diagonal() {
    let mut engine = ArticleSimilarityEngine::new(MockEmbedder::new());
    engine.upsert_many(three_article_corpus());

    let result = engine.similarity_matrix(None).await.unwrap();
    assert_eq!(result.ids.len(), 3);
    let m = &result.matrix;
    for i in 0..3 {
        assert!((m[i][i] - 1.0).abs() < 1e-5);
        for j in 0..3 {
            assert!((m[i][j] - m[j][i]).abs() < 1e-5);
        }
    }
    // The two quantum abstracts are more alike than quantum vs birds.
    assert!(m[0][1] > m[0][2]);
}

#[tokio::test]
async fn similarity_matrix_honors_id_subset_and_skips_unknowns() {
    let mut engine = ArticleSimilarityEngine::new(MockEmbedder::new());
    engine.upsert_many(three_article_corpus());

    let ids = vec!["3".to_string(), "1".to_string(), "ghost".to_string()];
    let result = engine.similarity_matrix(Some(&ids)).await.unwrap();
    assert_eq!(result.ids, vec!["3", "1"]);
    assert_eq!(result.matrix.len(), 2);
}

#[tokio::test]
async fn projection_returns_points_and_variance_ratios() {
    let mut engine = ArticleSimilarityEngine::new(MockEmbedder::new());
    engine.upsert_many(three_article_corpus());

    let projection = engine.projection(2, None).await.unwrap();
    assert_eq!(projection.points.len(), 3);
    assert_eq!(projection.explained_variance.len(), 2);
    assert!(projection.explained_variance[0] >= projection.explained_variance[1]);
    assert_eq!(projection.points[0].title, "Paper 1");
}

#[tokio::test]
async fn clusters_cover_every_article_and_sizes_sum() {
    let mut engine = ArticleSimilarityEngine::new(MockEmbedder::new());
    let mut corpus = three_article_corpus();
    corpus.push(upsert("4", "quantum annealing hardware"));
    corpus.push(upsert("5", "songbird migration timing"));
    engine.upsert_many(corpus);

    let assignment = engine.clusters(2, None).await.unwrap();
    assert_eq!(assignment.labels.len(), 5);
    let total: usize = assignment.clusters.iter().map(|c| c.size).sum();
    assert_eq!(total, 5);
    // Sizes are sorted descending.
    for pair in assignment.clusters.windows(2) {
        assert!(pair[0].size >= pair[1].size);
    }
}

#[tokio::test]
async fn underexplored_clusters_flags_small_clusters_only() {
    let mut engine = ArticleSimilarityEngine::new(MockEmbedder::new());
    // Nine near-duplicates plus one outlier.
    let mut corpus: Vec<ArticleUpsert> = (0..9)
        .map(|i| {
            let mut item = upsert(&i.to_string(), "quantum error correction surface codes");
            item.keywords = vec!["quantum".to_string(), "codes".to_string()];
            item.year = Some(2018 + (i % 3) as i32);
            item
        })
        .collect();
    let mut outlier = upsert("outlier", "mycology field guide to forest fungi");
    outlier.keywords = vec!["fungi".to_string()];
    outlier.year = Some(1999);
    corpus.push(outlier);
    engine.upsert_many(corpus);

    let flagged = engine.underexplored_clusters(2, 0.2).await.unwrap();
    assert_eq!(flagged.len(), 1);
    let cluster = &flagged[0];
    assert_eq!(cluster.size, 1);
    assert_eq!(cluster.year_range, Some((1999, 1999)));
    assert_eq!(cluster.top_keywords, vec!["fungi"]);
    assert_eq!(cluster.sample_articles[0].id, "outlier");
    assert!((cluster.exploration_score - 0.5).abs() < 1e-6);
}

#[tokio::test]
async fn gap_analysis_needs_at_least_ten_articles() {
    let mut engine = ArticleSimilarityEngine::new(MockEmbedder::new());
    engine.upsert_many(three_article_corpus());
    assert!(engine.find_semantic_gaps(10, 0.5).await.unwrap().is_empty());
}
