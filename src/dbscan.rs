use ndarray::ArrayView2;
use num_traits::float::FloatCore;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::Fit;
use crate::ClusterError;

/// Label given to instances that belong to no cluster.
pub const NOISE: i64 = -1;

/// Neighbor-search strategy selector.
///
/// Kept for parity with coordinate-based DBSCAN configurations. A
/// precomputed distance matrix carries no coordinates to index, so every
/// variant resolves to a brute scan of the matrix rows.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Algorithm {
    Auto,
    BallTree,
    KdTree,
    Brute,
}

impl Default for Algorithm {
    fn default() -> Self {
        Algorithm::Auto
    }
}

/// DBSCAN over a precomputed pairwise distance matrix.
///
/// `fit` takes a square distance matrix rather than raw feature vectors;
/// the neighborhood of an instance is every column of its row within
/// `eps`, the instance itself included. The output is a pair of the
/// per-instance cluster labels (noise is [`NOISE`]) and the sorted indices
/// of the core samples.
///
/// # Examples
///
/// ```
/// use ndarray::array;
/// use panel_clustering::{Dbscan, Fit, NOISE};
///
/// let matrix = array![
///     [0.0, 1.0, 9.0],
///     [1.0, 0.0, 9.0],
///     [9.0, 9.0, 0.0],
/// ];
/// let mut dbscan = Dbscan {
///     eps: 1.5,
///     min_samples: 2,
///     ..Dbscan::default()
/// };
/// let (labels, core_sample_indices) = dbscan.fit(matrix.view()).unwrap();
/// assert_eq!(labels, vec![0, 0, NOISE]);
/// assert_eq!(core_sample_indices, vec![0, 1]);
/// ```
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Dbscan<A> {
    /// The radius of a neighborhood.
    pub eps: A,

    /// The minimum number of instances, the instance itself included,
    /// a neighborhood needs for its center to be a core point.
    pub min_samples: usize,

    pub algorithm: Algorithm,

    /// Tree leaf size; has no effect without a tree-based search.
    pub leaf_size: usize,

    /// Parallelism degree: `1` scans serially, any other value uses the
    /// shared rayon pool, `0` meaning all available cores.
    pub n_jobs: usize,
}

impl<A> Default for Dbscan<A>
where
    A: FloatCore,
{
    fn default() -> Self {
        Self {
            eps: A::from(0.5).expect("0.5 is representable"),
            min_samples: 5,
            algorithm: Algorithm::Auto,
            leaf_size: 30,
            n_jobs: 1,
        }
    }
}

impl<'a, A> Fit<ArrayView2<'a, A>, Result<(Vec<i64>, Vec<usize>), ClusterError>> for Dbscan<A>
where
    A: FloatCore + Sync + Send,
{
    fn fit(&mut self, matrix: ArrayView2<'a, A>) -> Result<(Vec<i64>, Vec<usize>), ClusterError> {
        if self.eps < A::zero() || !self.eps.is_finite() {
            return Err(ClusterError::InvalidEps);
        }
        if self.min_samples == 0 {
            return Err(ClusterError::InvalidMinSamples);
        }
        if matrix.nrows() != matrix.ncols() {
            return Err(ClusterError::NotSquare {
                rows: matrix.nrows(),
                cols: matrix.ncols(),
            });
        }

        let n = matrix.nrows();
        let neighborhoods = build_neighborhoods(&matrix, self.eps, self.n_jobs != 1);

        let mut labels = vec![NOISE; n];
        let mut visited = vec![false; n];
        let mut cluster_id = 0;
        for idx in 0..n {
            if visited[idx] || neighborhoods[idx].len() < self.min_samples {
                continue;
            }
            visited[idx] = true;
            let mut to_visit = vec![idx];
            while let Some(cur) = to_visit.pop() {
                labels[cur] = cluster_id;
                if neighborhoods[cur].len() < self.min_samples {
                    // Border point; it joins the cluster but expands nothing.
                    continue;
                }
                for &neighbor in &neighborhoods[cur] {
                    if !visited[neighbor] {
                        visited[neighbor] = true;
                        to_visit.push(neighbor);
                    }
                }
            }
            cluster_id += 1;
        }

        let core_sample_indices = (0..n)
            .filter(|&idx| neighborhoods[idx].len() >= self.min_samples)
            .collect();
        Ok((labels, core_sample_indices))
    }
}

fn build_neighborhoods<A>(matrix: &ArrayView2<A>, eps: A, parallel: bool) -> Vec<Vec<usize>>
where
    A: FloatCore + Sync,
{
    let scan = |idx: usize| {
        matrix
            .row(idx)
            .iter()
            .enumerate()
            .filter(|(_, d)| **d <= eps)
            .map(|(j, _)| j)
            .collect::<Vec<_>>()
    };
    if parallel {
        (0..matrix.nrows()).into_par_iter().map(scan).collect()
    } else {
        (0..matrix.nrows()).map(scan).collect()
    }
}
