use ndarray::{Array2, ArrayView1, ArrayView2};

/// Dynamic time warping distance between two (possibly multivariate,
/// possibly unequal-length) series, with an optional Sakoe-Chiba band.
///
/// The local cost between two time points is the Euclidean distance over
/// the variables. An empty series is infinitely far from everything.
pub(crate) fn dtw(a: ArrayView2<f64>, b: ArrayView2<f64>, window: Option<usize>) -> f64 {
    if a.is_empty() || b.is_empty() {
        return f64::INFINITY;
    }

    let n = a.nrows();
    let m = b.nrows();
    // The band must be wide enough to reach the opposite corner.
    let band = window
        .map(|w| w.max(if n > m { n - m } else { m - n }))
        .unwrap_or(usize::MAX);

    let mut acc = Array2::from_elem((n + 1, m + 1), f64::INFINITY);
    acc[[0, 0]] = 0.0;

    for i in 1..=n {
        let lo = if i > band { i - band } else { 1 };
        let hi = m.min(i.saturating_add(band));
        for j in lo..=hi {
            let cost = point_distance(&a.row(i - 1), &b.row(j - 1));
            let best = acc[[i - 1, j]].min(acc[[i, j - 1]]).min(acc[[i - 1, j - 1]]);
            acc[[i, j]] = cost + best;
        }
    }

    acc[[n, m]]
}

pub(crate) fn point_distance(a: &ArrayView1<f64>, b: &ArrayView1<f64>) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f64>()
        .sqrt()
}

#[cfg(test)]
mod test {
    use super::*;
    use ndarray::array;

    #[test]
    fn identical_series_have_zero_distance() {
        let a = array![[1.0], [2.0], [3.0]];
        assert_eq!(dtw(a.view(), a.view(), None), 0.0);
    }

    #[test]
    fn warping_aligns_shifted_series() {
        // The same ramp delayed by one step; warping absorbs the shift
        // except at the boundaries.
        let a = array![[0.0], [1.0], [2.0], [3.0]];
        let b = array![[0.0], [0.0], [1.0], [2.0]];
        assert_eq!(dtw(a.view(), b.view(), None), 1.0);
    }

    #[test]
    fn unequal_lengths_are_aligned() {
        let a = array![[1.0], [2.0], [3.0]];
        let b = array![[1.0], [1.5], [2.0], [2.5], [3.0]];
        let d = dtw(a.view(), b.view(), None);
        assert!(d > 0.0 && d <= 1.0);
    }

    #[test]
    fn multivariate_cost_uses_all_variables() {
        let a = array![[0.0, 0.0]];
        let b = array![[3.0, 4.0]];
        assert_eq!(dtw(a.view(), b.view(), None), 5.0);
    }

    #[test]
    fn band_never_blocks_the_diagonal() {
        let a = array![[1.0], [2.0], [3.0], [4.0]];
        let b = array![[1.0], [2.0]];
        let d = dtw(a.view(), b.view(), Some(0));
        assert!(d.is_finite());
    }

    #[test]
    fn empty_series_is_infinitely_far() {
        let a = array![[1.0]];
        let empty = Array2::<f64>::zeros((0, 1));
        assert_eq!(dtw(a.view(), empty.view(), None), f64::INFINITY);
    }
}
