use std::str::FromStr;

use ndarray::Array2;
use petal_neighbors::distance::{Euclidean, Metric};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::dtw::{dtw, point_distance};
use crate::ClusterError;
use crate::Panel;

/// What kinds of panels a pairwise distance can handle.
///
/// A distance declares its capabilities once; [`validate`](Self::validate)
/// turns a mismatch between the declaration and an actual panel into the
/// corresponding [`ClusterError`] before any distance is computed.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct DistanceCapabilities {
    /// Series with more than one variable are accepted.
    pub multivariate: bool,
    /// Series of differing lengths are accepted.
    pub unequal_length: bool,
    /// NaN observations are tolerated.
    pub missing_values: bool,
    /// The distance only operates on panels that can take a uniform array
    /// shape (equal lengths, uniform variable counts).
    pub flat_input_only: bool,
}

impl DistanceCapabilities {
    pub fn validate(&self, x: &Panel) -> Result<(), ClusterError> {
        if !self.multivariate && x.n_variables() != Some(1) {
            return Err(ClusterError::Multivariate);
        }
        if !self.unequal_length && !x.is_equal_length() {
            return Err(ClusterError::UnequalLength);
        }
        // Ragged variable counts cannot take an array shape either.
        if self.flat_input_only && !x.is_empty() && x.n_variables().is_none() {
            return Err(ClusterError::UnequalLength);
        }
        if !self.missing_values && x.has_missing() {
            return Err(ClusterError::MissingValues);
        }
        Ok(())
    }
}

/// A pairwise distance over the instances of a panel.
///
/// Implementations must be deterministic for a fixed input and return a
/// square matrix whose dimension equals the panel's instance count. Matrices
/// produced through [`pairwise_matrix`] are symmetric and have a zero
/// diagonal by construction.
pub trait PanelMetric {
    /// Computes the full pairwise distance matrix for `x`.
    fn pairwise(&self, x: &Panel) -> Result<Array2<f64>, ClusterError>;

    /// The kinds of panels this distance accepts.
    fn capabilities(&self) -> DistanceCapabilities;
}

/// Builds a symmetric, zero-diagonal matrix from a distance on index pairs.
/// Only the upper triangle is computed; the pairs run on the rayon pool.
pub(crate) fn pairwise_matrix<F>(n: usize, dist: F) -> Array2<f64>
where
    F: Fn(usize, usize) -> f64 + Sync,
{
    let pairs: Vec<(usize, usize)> = (0..n)
        .flat_map(|i| (i + 1..n).map(move |j| (i, j)))
        .collect();
    let values: Vec<f64> = pairs.par_iter().map(|&(i, j)| dist(i, j)).collect();

    let mut matrix = Array2::zeros((n, n));
    for (&(i, j), v) in pairs.iter().zip(values) {
        matrix[[i, j]] = v;
        matrix[[j, i]] = v;
    }
    matrix
}

/// A built-in distance selected by its canonical name.
///
/// Named distances are conservative on purpose: they require a panel that
/// takes a uniform array shape, and declare no unequal-length support even
/// when the underlying kernel could align differing lengths. A clusterer
/// configured with a name therefore never advertises more than the name
/// guarantees.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NamedDistance {
    /// Euclidean distance between flattened instances.
    Euclidean,
    /// Dynamic time warping with Euclidean local cost.
    Dtw,
}

impl NamedDistance {
    /// Resolves a canonical distance name.
    pub fn from_name(name: &str) -> Result<Self, ClusterError> {
        match name {
            "euclidean" => Ok(NamedDistance::Euclidean),
            "dtw" => Ok(NamedDistance::Dtw),
            _ => Err(ClusterError::UnknownDistance(name.to_string())),
        }
    }
}

impl FromStr for NamedDistance {
    type Err = ClusterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NamedDistance::from_name(s)
    }
}

impl PanelMetric for NamedDistance {
    fn pairwise(&self, x: &Panel) -> Result<Array2<f64>, ClusterError> {
        self.capabilities().validate(x)?;
        match self {
            NamedDistance::Euclidean => {
                if x.is_empty() {
                    return Ok(Array2::zeros((0, 0)));
                }
                let flat = x.to_flat().ok_or(ClusterError::UnequalLength)?;
                let metric = Euclidean::default();
                Ok(pairwise_matrix(x.len(), |i, j| {
                    metric.distance(&flat.row(i), &flat.row(j))
                }))
            }
            NamedDistance::Dtw => Ok(pairwise_matrix(x.len(), |i, j| {
                dtw(
                    x.instances()[i].view(),
                    x.instances()[j].view(),
                    None,
                )
            })),
        }
    }

    fn capabilities(&self) -> DistanceCapabilities {
        DistanceCapabilities {
            multivariate: true,
            unequal_length: false,
            missing_values: false,
            flat_input_only: true,
        }
    }
}

/// How [`AggregateDistance`] folds the cross-product of time-point
/// distances into one number.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Aggregation {
    Mean,
    Max,
}

/// Aggregate of the Euclidean distances between every pair of time points
/// of two series. Alignment-free, so unequal lengths are fine.
#[derive(Clone, Copy, Debug, Deserialize, Serialize)]
pub struct AggregateDistance {
    pub aggregation: Aggregation,
}

impl AggregateDistance {
    pub fn mean() -> Self {
        AggregateDistance {
            aggregation: Aggregation::Mean,
        }
    }

    pub fn max() -> Self {
        AggregateDistance {
            aggregation: Aggregation::Max,
        }
    }
}

impl Default for AggregateDistance {
    fn default() -> Self {
        AggregateDistance::mean()
    }
}

impl PanelMetric for AggregateDistance {
    fn pairwise(&self, x: &Panel) -> Result<Array2<f64>, ClusterError> {
        self.capabilities().validate(x)?;
        let aggregation = self.aggregation;
        Ok(pairwise_matrix(x.len(), |i, j| {
            let a = &x.instances()[i];
            let b = &x.instances()[j];
            let mut sum = 0.0;
            let mut max = 0.0_f64;
            for p in a.rows() {
                for q in b.rows() {
                    let d = point_distance(&p, &q);
                    sum += d;
                    max = max.max(d);
                }
            }
            match aggregation {
                Aggregation::Mean => sum / (a.nrows() * b.nrows()) as f64,
                Aggregation::Max => max,
            }
        }))
    }

    fn capabilities(&self) -> DistanceCapabilities {
        DistanceCapabilities {
            multivariate: true,
            unequal_length: true,
            missing_values: false,
            flat_input_only: false,
        }
    }
}

/// Dynamic time warping as a capability-declaring distance, with an
/// optional Sakoe-Chiba band.
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize)]
pub struct DtwDistance {
    /// Maximum warping window; `None` leaves warping unconstrained.
    pub window: Option<usize>,
}

impl DtwDistance {
    pub fn new(window: Option<usize>) -> Self {
        DtwDistance { window }
    }
}

impl PanelMetric for DtwDistance {
    fn pairwise(&self, x: &Panel) -> Result<Array2<f64>, ClusterError> {
        self.capabilities().validate(x)?;
        let window = self.window;
        Ok(pairwise_matrix(x.len(), |i, j| {
            dtw(
                x.instances()[i].view(),
                x.instances()[j].view(),
                window,
            )
        }))
    }

    fn capabilities(&self) -> DistanceCapabilities {
        DistanceCapabilities {
            multivariate: true,
            unequal_length: true,
            missing_values: false,
            flat_input_only: false,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use ndarray::{array, aview2};

    #[test]
    fn named_distance_resolves_canonical_names() {
        assert_eq!(
            NamedDistance::from_name("euclidean"),
            Ok(NamedDistance::Euclidean)
        );
        assert_eq!("dtw".parse(), Ok(NamedDistance::Dtw));
        assert_eq!(
            NamedDistance::from_name("editdist"),
            Err(ClusterError::UnknownDistance("editdist".to_string()))
        );
    }

    #[test]
    fn euclidean_matches_flat_vector_distance() {
        let panel = Panel::from_rows(aview2(&[[0.0, 0.0], [3.0, 4.0]]));
        let matrix = NamedDistance::Euclidean.pairwise(&panel).unwrap();
        assert_eq!(matrix, array![[0.0, 5.0], [5.0, 0.0]]);
    }

    #[test]
    fn named_distances_reject_ragged_panels() {
        let ragged = Panel::from_instances(vec![
            array![[1.0], [2.0]],
            array![[1.0], [2.0], [3.0]],
        ]);
        assert_eq!(
            NamedDistance::Dtw.pairwise(&ragged),
            Err(ClusterError::UnequalLength)
        );
    }

    #[test]
    fn named_distances_reject_missing_values() {
        let panel = Panel::from_rows(aview2(&[[1.0, f64::NAN], [1.0, 2.0]]));
        assert_eq!(
            NamedDistance::Euclidean.pairwise(&panel),
            Err(ClusterError::MissingValues)
        );
    }

    #[test]
    fn aggregate_distance_handles_unequal_lengths() {
        let panel = Panel::from_instances(vec![
            array![[0.0], [0.0]],
            array![[1.0], [1.0], [1.0]],
        ]);
        let matrix = AggregateDistance::mean().pairwise(&panel).unwrap();
        assert_eq!(matrix[[0, 1]], 1.0);
        assert_eq!(matrix[[1, 0]], 1.0);
        assert_eq!(matrix[[0, 0]], 0.0);
    }

    #[test]
    fn aggregate_max_takes_the_largest_point_distance() {
        let panel = Panel::from_rows(aview2(&[[0.0, 1.0], [2.0, 3.0]]));
        let matrix = AggregateDistance::max().pairwise(&panel).unwrap();
        assert_eq!(matrix[[0, 1]], 3.0);
    }

    #[test]
    fn pairwise_matrices_are_symmetric_with_zero_diagonal() {
        let panel = Panel::from_instances(vec![
            array![[1.0], [2.0]],
            array![[2.0], [4.0], [6.0]],
            array![[9.0]],
        ]);
        let matrix = DtwDistance::default().pairwise(&panel).unwrap();
        for i in 0..3 {
            assert_eq!(matrix[[i, i]], 0.0);
            for j in 0..3 {
                assert_eq!(matrix[[i, j]], matrix[[j, i]]);
            }
        }
    }
}
