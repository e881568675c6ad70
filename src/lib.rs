//! Density-based clustering of time-series panels.
//!
//! The clustering itself is plain DBSCAN run in precomputed-distance mode:
//! [`TimeSeriesDbscan`] computes the full pairwise distance matrix of a
//! [`Panel`] with a pluggable [`PanelMetric`] and delegates neighborhood
//! search and cluster expansion to [`Dbscan`]. Distances declare what kinds
//! of panels they accept, and the clusterer derives its own capability
//! flags from that declaration at construction time.
//!
//! ```
//! use std::sync::Arc;
//! use ndarray::array;
//! use panel_clustering::{DtwDistance, Fit, Panel, TimeSeriesDbscan, NOISE};
//!
//! let panel = Arc::new(Panel::from_instances(vec![
//!     array![[0.0], [1.0], [2.0], [3.0]],
//!     array![[0.0], [0.0], [1.0], [2.0]],
//!     array![[40.0], [40.0], [40.0]],
//! ]));
//! let mut model = TimeSeriesDbscan::new(DtwDistance::default());
//! model.eps = 1.5;
//! model.min_samples = 2;
//! model.fit(&panel).unwrap();
//!
//! assert_eq!(model.labels(), Some(&[0, 0, NOISE][..]));
//! ```

mod dbscan;
mod distance;
mod dtw;
mod error;
mod panel;
mod time_series;

pub use dbscan::{Algorithm, Dbscan, NOISE};
pub use distance::{
    AggregateDistance, Aggregation, DistanceCapabilities, DtwDistance, NamedDistance, PanelMetric,
};
pub use error::ClusterError;
pub use panel::Panel;
pub use time_series::{ClustererCapabilities, TimeSeriesDbscan};

pub trait Fit<I, O> {
    fn fit(&mut self, input: I) -> O;
}

pub trait Predict<I, O> {
    fn predict(&self, input: I) -> O;
}
