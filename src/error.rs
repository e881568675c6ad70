use thiserror::Error;

/// Errors raised while configuring or running a clusterer.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum ClusterError {
    /// The panel passed to `fit` contains no time series.
    #[error("the panel contains no time series")]
    EmptyPanel,

    /// `predict` was called before a successful `fit`.
    #[error("`predict` called before `fit`")]
    NotFitted,

    /// The distance selector does not name a built-in distance.
    #[error("unknown distance name `{0}`")]
    UnknownDistance(String),

    /// `eps` must be a non-negative finite number.
    #[error("`eps` must be non-negative and finite")]
    InvalidEps,

    /// `min_samples` must be at least one.
    #[error("`min_samples` must be at least 1")]
    InvalidMinSamples,

    /// A precomputed distance matrix must be square.
    #[error("distance matrix must be square, got {rows} rows and {cols} columns")]
    NotSquare { rows: usize, cols: usize },

    /// The configured distance requires all series to have the same length.
    #[error("the configured distance does not support unequal-length series")]
    UnequalLength,

    /// The configured distance cannot handle missing values.
    #[error("the configured distance does not tolerate missing values")]
    MissingValues,

    /// The configured distance handles univariate series only.
    #[error("the configured distance does not support multivariate series")]
    Multivariate,
}
