//! Weighted fusion of sparse and dense candidate lists.

use std::collections::HashMap;

use crate::config::FusionWeights;
use crate::document::Candidate;

/// Merge a dense result list (`(chunk position, distance)` pairs, ascending)
/// and a sparse result list (rank order) into one scored candidate set.
///
/// Each dense distance `d` contributes a similarity `1/(1+|d|)`; each sparse
/// result contributes a reciprocal rank score `1/(rank+1)` (0-based rank).
/// A chunk found by both signals accumulates both weighted terms — redundant
/// discovery is rewarded — while a chunk found by only one contributes just
/// that term. The two score scales are never jointly normalized; downstream
/// stages treat the combined score as opaque.
///
/// The output is sorted descending by combined score (ties on chunk order)
/// and capped at `k` — the fused result cap, not the final answer budget,
/// which is the reranker's job to enforce.
pub fn fuse(
    dense: &[(usize, f32)],
    sparse: &[Candidate],
    weights: &FusionWeights,
    k: usize,
) -> Vec<Candidate> {
    let mut merged: HashMap<usize, (f32, f32)> = HashMap::new();

    for &(chunk_idx, distance) in dense {
        merged.entry(chunk_idx).or_insert((0.0, 0.0)).0 = 1.0 / (1.0 + distance.abs());
    }
    for (rank, candidate) in sparse.iter().enumerate() {
        merged.entry(candidate.chunk_idx).or_insert((0.0, 0.0)).1 = 1.0 / (rank as f32 + 1.0);
    }

    let mut combined: Vec<Candidate> = merged
        .into_iter()
        .map(|(chunk_idx, (dense_sim, sparse_score))| Candidate {
            chunk_idx,
            score: weights.dense * dense_sim + weights.sparse * sparse_score,
        })
        .collect();
    combined.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.chunk_idx.cmp(&b.chunk_idx))
    });
    combined.truncate(k);
    combined
}

#[cfg(test)]
mod tests {
    use super::*;

    const WEIGHTS: FusionWeights = FusionWeights { sparse: 0.3, dense: 0.7 };

    fn sparse(indices: &[usize]) -> Vec<Candidate> {
        indices.iter().map(|&chunk_idx| Candidate { chunk_idx, score: 1.0 }).collect()
    }

    #[test]
    fn chunk_in_both_lists_sums_weighted_contributions() {
        let dense = vec![(7, 0.5)];
        let fused = fuse(&dense, &sparse(&[7]), &WEIGHTS, 10);

        assert_eq!(fused.len(), 1);
        let expected = 0.7 * (1.0 / 1.5) + 0.3 * 1.0;
        assert!((fused[0].score - expected).abs() < 1e-6);
    }

    #[test]
    fn chunk_in_one_list_contributes_single_term() {
        let dense = vec![(1, 0.25)];
        let fused = fuse(&dense, &sparse(&[2, 3]), &WEIGHTS, 10);

        let by_idx = |idx: usize| fused.iter().find(|c| c.chunk_idx == idx).unwrap().score;
        assert!((by_idx(1) - 0.7 * (1.0 / 1.25)).abs() < 1e-6);
        assert!((by_idx(2) - 0.3 * 1.0).abs() < 1e-6);
        assert!((by_idx(3) - 0.3 * 0.5).abs() < 1e-6);
    }

    #[test]
    fn negative_distances_use_absolute_value() {
        let dense = vec![(0, -1.0)];
        let fused = fuse(&dense, &[], &WEIGHTS, 10);
        assert!((fused[0].score - 0.7 * 0.5).abs() < 1e-6);
    }

    #[test]
    fn output_sorted_descending_and_capped() {
        let dense: Vec<(usize, f32)> = (0..8).map(|i| (i, i as f32 * 0.1)).collect();
        let fused = fuse(&dense, &sparse(&[8, 9]), &WEIGHTS, 5);

        assert_eq!(fused.len(), 5);
        for pair in fused.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
    }

    #[test]
    fn both_lists_empty_fuses_to_nothing() {
        assert!(fuse(&[], &[], &WEIGHTS, 10).is_empty());
    }
}
