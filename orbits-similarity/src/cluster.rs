//! Seeded k-means clustering over embedding rows.

use ndarray::{Array1, Array2, ArrayView2, Axis};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const MAX_ITERATIONS: usize = 100;

/// Assign each row of `data` to one of `k` clusters.
///
/// k-means++ seeding from a fixed-seed [`StdRng`] followed by Lloyd
/// iterations, so the same input always produces the same labels. `k` is
/// clamped to `[1, n_rows]`; empty input yields no labels.
pub fn kmeans(data: ArrayView2<'_, f32>, k: usize, seed: u64) -> Vec<usize> {
    let n = data.nrows();
    if n == 0 {
        return Vec::new();
    }
    let k = k.clamp(1, n);
    let mut rng = StdRng::seed_from_u64(seed);

    let mut centroids = seed_centroids(data, k, &mut rng);
    let mut labels = vec![0usize; n];

    for _ in 0..MAX_ITERATIONS {
        // Assignment step.
        let mut changed = false;
        for (i, row) in data.axis_iter(Axis(0)).enumerate() {
            let mut best = 0;
            let mut best_distance = f32::INFINITY;
            for (c, centroid) in centroids.iter().enumerate() {
                let distance = squared_distance(row.as_slice().unwrap_or(&[]), centroid);
                if distance < best_distance {
                    best_distance = distance;
                    best = c;
                }
            }
            if labels[i] != best {
                labels[i] = best;
                changed = true;
            }
        }
        if !changed {
            break;
        }

        // Update step; empty clusters keep their previous centroid.
        let d = data.ncols();
        let mut sums = Array2::<f32>::zeros((k, d));
        let mut counts = vec![0usize; k];
        for (i, row) in data.axis_iter(Axis(0)).enumerate() {
            let c = labels[i];
            let mut sum_row = sums.row_mut(c);
            sum_row += &row;
            counts[c] += 1;
        }
        for (c, centroid) in centroids.iter_mut().enumerate() {
            if counts[c] > 0 {
                let mean = sums.row(c).mapv(|x| x / counts[c] as f32);
                centroid.clear();
                centroid.extend(mean.iter());
            }
        }
    }

    labels
}

/// k-means++ initialization: the first centroid is uniform-random, each
/// subsequent one is sampled proportionally to squared distance from the
/// nearest chosen centroid.
fn seed_centroids(data: ArrayView2<'_, f32>, k: usize, rng: &mut StdRng) -> Vec<Vec<f32>> {
    let n = data.nrows();
    let mut centroids: Vec<Vec<f32>> = Vec::with_capacity(k);
    let first = rng.gen_range(0..n);
    centroids.push(data.row(first).to_vec());

    while centroids.len() < k {
        let distances: Vec<f32> = data
            .axis_iter(Axis(0))
            .map(|row| {
                centroids
                    .iter()
                    .map(|c| squared_distance(row.as_slice().unwrap_or(&[]), c))
                    .fold(f32::INFINITY, f32::min)
            })
            .collect();
        let total: f32 = distances.iter().sum();

        let next = if total <= 0.0 {
            // All remaining points coincide with a centroid; pick uniformly.
            rng.gen_range(0..n)
        } else {
            let mut threshold = rng.r#gen::<f32>() * total;
            let mut chosen = n - 1;
            for (i, &d) in distances.iter().enumerate() {
                threshold -= d;
                if threshold <= 0.0 {
                    chosen = i;
                    break;
                }
            }
            chosen
        };
        centroids.push(data.row(next).to_vec());
    }

    centroids
}

fn squared_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y) * (x - y)).sum()
}

/// Row-major helper for building the data matrix from vector records.
pub fn rows_to_matrix(rows: &[Vec<f32>]) -> Array2<f32> {
    if rows.is_empty() {
        return Array2::zeros((0, 0));
    }
    let d = rows[0].len();
    let mut matrix = Array2::zeros((rows.len(), d));
    for (i, row) in rows.iter().enumerate() {
        matrix.row_mut(i).assign(&Array1::from_vec(row.clone()));
    }
    matrix
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn separates_two_obvious_groups() {
        let data = array![
            [0.0f32, 0.0],
            [0.1, 0.0],
            [0.0, 0.1],
            [5.0, 5.0],
            [5.1, 5.0],
            [5.0, 5.1],
        ];
        let labels = kmeans(data.view(), 2, 42);

        assert_eq!(labels.len(), 6);
        assert_eq!(labels[0], labels[1]);
        assert_eq!(labels[1], labels[2]);
        assert_eq!(labels[3], labels[4]);
        assert_eq!(labels[4], labels[5]);
        assert_ne!(labels[0], labels[3]);
    }

    #[test]
    fn same_seed_means_same_labels() {
        let data = array![[1.0f32, 2.0], [2.0, 1.0], [8.0, 9.0], [9.0, 8.0], [4.0, 4.0]];
        let a = kmeans(data.view(), 3, 42);
        let b = kmeans(data.view(), 3, 42);
        assert_eq!(a, b);
    }

    #[test]
    fn k_is_clamped_to_row_count() {
        let data = array![[1.0f32, 0.0], [0.0, 1.0]];
        let labels = kmeans(data.view(), 10, 42);
        assert_eq!(labels.len(), 2);
        assert!(labels.iter().all(|&l| l < 2));
    }

    #[test]
    fn empty_input_yields_no_labels() {
        let data = Array2::<f32>::zeros((0, 3));
        assert!(kmeans(data.view(), 3, 42).is_empty());
    }
}
