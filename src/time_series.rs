use std::sync::Arc;

use ndarray::Array2;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::dbscan::{Algorithm, Dbscan};
use crate::distance::{DistanceCapabilities, PanelMetric};
use crate::{ClusterError, Fit, NamedDistance, Panel, Predict};

/// Capability flags a clusterer advertises to callers.
///
/// The panel-related flags are derived from the configured distance, so a
/// clusterer never advertises more than its distance supports. The
/// prediction flags are fixed: density clustering with a precomputed
/// distance has no out-of-sample rule and no probabilistic output.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct ClustererCapabilities {
    pub multivariate: bool,
    pub unequal_length: bool,
    pub missing_values: bool,
    pub flat_input_only: bool,
    pub out_of_sample: bool,
    pub predict: bool,
    pub predict_proba: bool,
}

fn derive_capabilities(distance: &DistanceCapabilities) -> ClustererCapabilities {
    ClustererCapabilities {
        multivariate: distance.multivariate,
        unequal_length: distance.unequal_length,
        missing_values: distance.missing_values,
        flat_input_only: distance.flat_input_only,
        out_of_sample: false,
        predict: true,
        predict_proba: false,
    }
}

/// What a fit produced. Each artifact is independently optional and copied
/// from the delegate by an explicit mapping; an artifact the delegate did
/// not produce is simply left absent.
#[derive(Clone, Debug)]
struct FittedModel {
    data: Arc<Panel>,
    labels: Option<Vec<i64>>,
    core_sample_indices: Option<Vec<usize>>,
    components: Option<Vec<Array2<f64>>>,
}

/// DBSCAN for panels of time series under a pluggable pairwise distance.
///
/// `fit` computes the full pairwise distance matrix of the panel with the
/// configured [`PanelMetric`] and hands it to [`Dbscan`], the
/// precomputed-distance delegate; `eps`, `min_samples`, `algorithm`,
/// `leaf_size` and `n_jobs` pass through to the delegate verbatim.
///
/// `predict` is exact only for the very panel handle that was fitted:
/// density clustering has no rule for labeling unseen points from a fixed
/// distance matrix. Passing any other handle, even one holding equal
/// values, triggers the documented fallback: the new instances are
/// appended to the fit data, a transient configuration clone is fitted on
/// the merged panel and its labels are returned, while this clusterer's
/// own fitted state stays untouched. The fallback recomputes the full
/// matrix, so it costs O(n²) every time it runs.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use ndarray::array;
/// use panel_clustering::{AggregateDistance, Fit, Panel, Predict, TimeSeriesDbscan, NOISE};
///
/// let panel = Arc::new(Panel::from_instances(vec![
///     array![[1.0], [2.0], [3.0]],
///     array![[1.1], [2.1], [3.1]],
///     array![[50.0], [60.0], [70.0]],
/// ]));
/// let mut model = TimeSeriesDbscan::new(AggregateDistance::mean());
/// model.eps = 2.0;
/// model.min_samples = 2;
/// model.fit(&panel).unwrap();
///
/// assert_eq!(model.labels(), Some(&[0, 0, NOISE][..]));
/// assert_eq!(model.core_sample_indices(), Some(&[0, 1][..]));
/// assert_eq!(model.predict(&panel).unwrap(), vec![0, 0, NOISE]);
/// ```
#[derive(Debug)]
pub struct TimeSeriesDbscan<D> {
    /// The pairwise distance between panel instances.
    pub distance: D,

    /// The radius of a neighborhood.
    pub eps: f64,

    /// The minimum neighborhood size for a core point, the point itself
    /// included.
    pub min_samples: usize,

    pub algorithm: Algorithm,
    pub leaf_size: usize,
    pub n_jobs: usize,

    capabilities: ClustererCapabilities,
    fitted: Option<FittedModel>,
}

impl<D> TimeSeriesDbscan<D>
where
    D: PanelMetric,
{
    /// Creates an unfitted clusterer around `distance` with the default
    /// DBSCAN configuration.
    pub fn new(distance: D) -> Self {
        let capabilities = derive_capabilities(&distance.capabilities());
        Self {
            distance,
            eps: 0.5,
            min_samples: 5,
            algorithm: Algorithm::Auto,
            leaf_size: 30,
            n_jobs: 1,
            capabilities,
            fitted: None,
        }
    }

    /// The capability flags derived from the configured distance at
    /// construction time.
    pub fn capabilities(&self) -> ClustererCapabilities {
        self.capabilities
    }

    /// Cluster labels of the fit data; noise is [`NOISE`](crate::NOISE).
    pub fn labels(&self) -> Option<&[i64]> {
        self.fitted.as_ref().and_then(|f| f.labels.as_deref())
    }

    /// Indices of the core samples, in ascending order.
    pub fn core_sample_indices(&self) -> Option<&[usize]> {
        self.fitted
            .as_ref()
            .and_then(|f| f.core_sample_indices.as_deref())
    }

    /// The raw data of the core samples.
    pub fn components(&self) -> Option<&[Array2<f64>]> {
        self.fitted.as_ref().and_then(|f| f.components.as_deref())
    }

    fn delegate(&self) -> Dbscan<f64> {
        Dbscan {
            eps: self.eps,
            min_samples: self.min_samples,
            algorithm: self.algorithm,
            leaf_size: self.leaf_size,
            n_jobs: self.n_jobs,
        }
    }
}

impl<D> TimeSeriesDbscan<D>
where
    D: PanelMetric + Clone,
{
    /// An unfitted clusterer with this clusterer's configuration.
    fn config_clone(&self) -> Self {
        let mut clone = Self::new(self.distance.clone());
        clone.eps = self.eps;
        clone.min_samples = self.min_samples;
        clone.algorithm = self.algorithm;
        clone.leaf_size = self.leaf_size;
        clone.n_jobs = self.n_jobs;
        clone
    }
}

impl TimeSeriesDbscan<NamedDistance> {
    /// Creates a clusterer from a canonical distance name such as
    /// `"euclidean"` or `"dtw"`.
    pub fn from_name(name: &str) -> Result<Self, ClusterError> {
        Ok(Self::new(NamedDistance::from_name(name)?))
    }
}

impl<'a, D> Fit<&'a Arc<Panel>, Result<(), ClusterError>> for TimeSeriesDbscan<D>
where
    D: PanelMetric,
{
    /// Fits the clusterer to `x`, replacing any previous fitted state.
    ///
    /// Distance capability mismatches surface unchanged from the
    /// configured distance; configuration errors surface from the
    /// delegate. Degenerate clusterings such as all-noise are not errors.
    fn fit(&mut self, x: &'a Arc<Panel>) -> Result<(), ClusterError> {
        if x.is_empty() {
            return Err(ClusterError::EmptyPanel);
        }

        let matrix = self.distance.pairwise(x)?;
        let (labels, core_sample_indices) = self.delegate().fit(matrix.view())?;
        let components = core_sample_indices
            .iter()
            .map(|&idx| x.instances()[idx].clone())
            .collect();

        self.fitted = Some(FittedModel {
            data: Arc::clone(x),
            labels: Some(labels),
            core_sample_indices: Some(core_sample_indices),
            components: Some(components),
        });
        Ok(())
    }
}

impl<'a, D> Predict<&'a Arc<Panel>, Result<Vec<i64>, ClusterError>> for TimeSeriesDbscan<D>
where
    D: PanelMetric + Clone,
{
    /// Labels for `x`.
    ///
    /// If `x` is the same handle that was passed to `fit`, the stored
    /// labels are returned as-is. The check is pointer identity, not value
    /// equality: an equal-valued but distinct panel takes the fallback
    /// path, which fits a transient clone on the fit data plus the new
    /// instances and returns the merged labels (fit data first).
    fn predict(&self, x: &'a Arc<Panel>) -> Result<Vec<i64>, ClusterError> {
        let fitted = self.fitted.as_ref().ok_or(ClusterError::NotFitted)?;
        if Arc::ptr_eq(x, &fitted.data) {
            return fitted.labels.clone().ok_or(ClusterError::NotFitted);
        }

        warn!(
            "predict received data that is not the panel passed to fit; density \
             clustering over a precomputed distance cannot label unseen points. \
             Fitting a transient clone on the fit data plus the new instances and \
             returning its labels; this clusterer's fitted state is unchanged."
        );
        let merged = Arc::new(fitted.data.merged(x));
        let mut refit = self.config_clone();
        refit.fit(&merged)?;
        refit
            .fitted
            .and_then(|f| f.labels)
            .ok_or(ClusterError::NotFitted)
    }
}
