//! Matrix kernels: normalization, cosine similarity, PCA.

use ndarray::{Array1, Array2, ArrayView2, Axis};

/// L2-normalize a vector in place. Zero vectors stay zero.
pub fn normalize(vector: &mut [f32]) {
    let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        vector.iter_mut().for_each(|x| *x /= norm);
    }
}

/// Dot product of two equal-length vectors. For L2-normalized inputs this
/// is their cosine similarity.
pub fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

/// Pairwise cosine similarity over row vectors.
///
/// Rows are assumed L2-normalized, so the similarity matrix is just the Gram
/// matrix.
pub fn cosine_matrix(rows: ArrayView2<'_, f32>) -> Array2<f32> {
    rows.dot(&rows.t())
}

/// PCA result: projected coordinates and explained variance ratios.
#[derive(Debug, Clone)]
pub struct Pca {
    /// Row-per-sample projection onto the principal components.
    pub projected: Array2<f32>,
    /// Fraction of total variance captured per component.
    pub explained_variance: Vec<f32>,
}

const POWER_ITERATIONS: usize = 200;
const CONVERGENCE_EPS: f32 = 1e-7;

/// Principal component analysis via power iteration with deflation.
///
/// Deterministic: iteration starts from a fixed vector and each component's
/// sign is chosen so its largest-magnitude entry is positive. `n_components`
/// is clamped to the feature dimension; degenerate inputs (no rows, zero
/// variance) produce zero projections and zero ratios.
pub fn pca(data: ArrayView2<'_, f32>, n_components: usize) -> Pca {
    let n_samples = data.nrows();
    let n_features = data.ncols();
    if n_samples == 0 || n_features == 0 || n_components == 0 {
        return Pca { projected: Array2::zeros((n_samples, n_components)), explained_variance: vec![0.0; n_components] };
    }

    let n_components = n_components.min(n_features);
    let mean = data.mean_axis(Axis(0)).expect("non-empty data");
    let centered = &data - &mean.view().insert_axis(Axis(0));

    // Unnormalized covariance; the ratio of eigenvalues to its trace is
    // unaffected by the missing 1/(n-1) factor.
    let mut covariance = centered.t().dot(&centered);
    let total_variance: f32 = covariance.diag().sum();

    let mut components: Vec<Array1<f32>> = Vec::with_capacity(n_components);
    let mut eigenvalues: Vec<f32> = Vec::with_capacity(n_components);

    for _ in 0..n_components {
        let (component, eigenvalue) = dominant_eigenvector(&covariance);
        // Deflate so the next iteration finds the next component.
        let outer = outer_product(&component);
        covariance = covariance - &outer * eigenvalue;
        components.push(component);
        eigenvalues.push(eigenvalue.max(0.0));
    }

    let mut projected = Array2::zeros((n_samples, n_components));
    for (j, component) in components.iter().enumerate() {
        let coords = centered.dot(component);
        projected.column_mut(j).assign(&coords);
    }

    let explained_variance = eigenvalues
        .iter()
        .map(|&ev| if total_variance > 0.0 { ev / total_variance } else { 0.0 })
        .collect();

    Pca { projected, explained_variance }
}

/// Power iteration for the dominant eigenpair of a symmetric matrix.
fn dominant_eigenvector(matrix: &Array2<f32>) -> (Array1<f32>, f32) {
    let d = matrix.nrows();
    let mut v = Array1::from_elem(d, 1.0 / (d as f32).sqrt());

    for _ in 0..POWER_ITERATIONS {
        let next = matrix.dot(&v);
        let norm = next.dot(&next).sqrt();
        if norm <= f32::EPSILON {
            // Matrix annihilated the iterate; no variance left.
            return (Array1::zeros(d), 0.0);
        }
        let next = next / norm;
        let delta: f32 = (&next - &v).iter().map(|x| x.abs()).sum();
        v = next;
        if delta < CONVERGENCE_EPS {
            break;
        }
    }

    // Sign convention: largest-magnitude entry positive.
    let flip = v
        .iter()
        .cloned()
        .fold((0.0f32, 1.0f32), |(best, sign), x| {
            if x.abs() > best { (x.abs(), x.signum()) } else { (best, sign) }
        })
        .1;
    if flip < 0.0 {
        v.mapv_inplace(|x| -x);
    }

    let eigenvalue = v.dot(&matrix.dot(&v));
    (v, eigenvalue)
}

fn outer_product(v: &Array1<f32>) -> Array2<f32> {
    let column = v.view().insert_axis(Axis(1));
    let row = v.view().insert_axis(Axis(0));
    column.dot(&row)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn normalize_makes_unit_length() {
        let mut v = vec![3.0, 4.0];
        normalize(&mut v);
        assert!((v[0] - 0.6).abs() < 1e-6);
        assert!((v[1] - 0.8).abs() < 1e-6);
    }

    #[test]
    fn normalize_leaves_zero_vector_alone() {
        let mut v = vec![0.0, 0.0];
        normalize(&mut v);
        assert_eq!(v, vec![0.0, 0.0]);
    }

    #[test]
    fn cosine_matrix_has_unit_diagonal_for_normalized_rows() {
        let mut a = vec![1.0, 2.0, 2.0];
        let mut b = vec![2.0, 0.0, 1.0];
        normalize(&mut a);
        normalize(&mut b);
        let rows = array![[a[0], a[1], a[2]], [b[0], b[1], b[2]]];
        let m = cosine_matrix(rows.view());
        assert!((m[[0, 0]] - 1.0).abs() < 1e-5);
        assert!((m[[1, 1]] - 1.0).abs() < 1e-5);
        assert!((m[[0, 1]] - m[[1, 0]]).abs() < 1e-6);
    }

    #[test]
    fn pca_recovers_the_dominant_axis() {
        // Points spread along x, with slight y noise.
        let data = array![
            [0.0f32, 0.1],
            [1.0, -0.1],
            [2.0, 0.05],
            [3.0, -0.05],
            [4.0, 0.0],
        ];
        let result = pca(data.view(), 2);

        assert_eq!(result.projected.nrows(), 5);
        assert_eq!(result.explained_variance.len(), 2);
        // Almost all variance lives on the first component.
        assert!(result.explained_variance[0] > 0.9);
        assert!(result.explained_variance[0] >= result.explained_variance[1]);
        // Projections onto the first component preserve the x ordering.
        let first: Vec<f32> = result.projected.column(0).to_vec();
        for pair in first.windows(2) {
            assert!(pair[0] < pair[1]);
        }
    }

    #[test]
    fn pca_on_identical_points_is_all_zero() {
        let data = array![[1.0f32, 1.0], [1.0, 1.0], [1.0, 1.0]];
        let result = pca(data.view(), 2);
        assert!(result.projected.iter().all(|x| x.abs() < 1e-6));
        assert!(result.explained_variance.iter().all(|&r| r == 0.0));
    }

    #[test]
    fn pca_on_empty_input_is_empty() {
        let data = Array2::<f32>::zeros((0, 3));
        let result = pca(data.view(), 2);
        assert_eq!(result.projected.nrows(), 0);
    }
}
