//! Semantic-gap detection over a 2D projection.

use serde::{Deserialize, Serialize};

use crate::engine::ProjectedPoint;

/// Number of gaps reported per analysis.
const MAX_GAPS: usize = 10;

/// Neighbors annotated onto each gap.
const NEAREST_COUNT: usize = 5;

/// Gap analysis needs at least this many points to be meaningful.
pub const MIN_POINTS: usize = 10;

/// An existing article near a gap, with its planar distance to the gap
/// center.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NearbyArticle {
    /// Article id.
    pub id: String,
    /// Article title.
    pub title: String,
    /// Euclidean distance in projection space.
    pub distance: f32,
}

/// A low-density cell of the projection grid.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SemanticGap {
    /// Cell center, x.
    pub x: f32,
    /// Cell center, y.
    pub y: f32,
    /// Normalized point density of the cell.
    pub density: f32,
    /// `1 - density`; higher means emptier.
    pub gap_score: f32,
    /// The five nearest existing points by planar distance.
    pub nearest_articles: Vec<NearbyArticle>,
}

/// Find low-density cells in a `grid_size x grid_size` grid over the point
/// bounding box.
///
/// Cell counts are normalized by the total point count; cells with density
/// below `threshold` are reported, ranked by gap score descending, capped at
/// ten. Fewer than [`MIN_POINTS`] points yields an empty result.
pub fn grid_gaps(points: &[ProjectedPoint], grid_size: usize, threshold: f32) -> Vec<SemanticGap> {
    if points.len() < MIN_POINTS || grid_size < 2 {
        return Vec::new();
    }

    let xs: Vec<f32> = points.iter().map(|p| p.x).collect();
    let ys: Vec<f32> = points.iter().map(|p| p.y).collect();
    let (x_min, x_max) = bounds(&xs);
    let (y_min, y_max) = bounds(&ys);

    let x_bins = linspace(x_min, x_max, grid_size);
    let y_bins = linspace(y_min, y_max, grid_size);
    let cells = grid_size - 1;

    // Count points per cell. A point sitting exactly on the top edge falls
    // outside the last cell and is not counted.
    let mut grid = vec![vec![0usize; cells]; cells];
    for point in points {
        let xi = digitize(point.x, &x_bins);
        let yi = digitize(point.y, &y_bins);
        if xi < cells && yi < cells {
            grid[xi][yi] += 1;
        }
    }

    let total = points.len() as f32;
    let mut gaps = Vec::new();
    for i in 0..cells {
        for j in 0..cells {
            let density = grid[i][j] as f32 / total;
            if density >= threshold {
                continue;
            }
            let cx = (x_bins[i] + x_bins[i + 1]) / 2.0;
            let cy = (y_bins[j] + y_bins[j + 1]) / 2.0;

            let mut by_distance: Vec<(f32, &ProjectedPoint)> = points
                .iter()
                .map(|p| (((p.x - cx).powi(2) + (p.y - cy).powi(2)).sqrt(), p))
                .collect();
            by_distance.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));

            gaps.push(SemanticGap {
                x: cx,
                y: cy,
                density,
                gap_score: 1.0 - density,
                nearest_articles: by_distance
                    .iter()
                    .take(NEAREST_COUNT)
                    .map(|(distance, p)| NearbyArticle {
                        id: p.id.clone(),
                        title: p.title.clone(),
                        distance: *distance,
                    })
                    .collect(),
            });
        }
    }

    gaps.sort_by(|a, b| b.gap_score.partial_cmp(&a.gap_score).unwrap_or(std::cmp::Ordering::Equal));
    gaps.truncate(MAX_GAPS);
    gaps
}

/// `count` evenly spaced values from `start` to `stop`, inclusive.
fn linspace(start: f32, stop: f32, count: usize) -> Vec<f32> {
    if count == 1 {
        return vec![start];
    }
    let step = (stop - start) / (count - 1) as f32;
    (0..count).map(|i| start + step * i as f32).collect()
}

/// Index of the cell whose left edge is the last bin edge at or below `x`.
fn digitize(x: f32, bins: &[f32]) -> usize {
    let below = bins.iter().filter(|&&edge| edge <= x).count();
    below.saturating_sub(1)
}

fn bounds(values: &[f32]) -> (f32, f32) {
    let min = values.iter().cloned().fold(f32::INFINITY, f32::min);
    let max = values.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
    (min, max)
}
