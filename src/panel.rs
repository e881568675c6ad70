use ndarray::{Array2, ArrayView2};

/// An ordered collection of time-series instances treated as one dataset.
///
/// Each instance is a two-dimensional array with one row per time point and one
/// column per variable. Instances may differ in length and in number of
/// variables, and may contain NaN for missing observations. Whether a given
/// distance can handle such panels is declared by the distance itself; see
/// [`DistanceCapabilities`](crate::DistanceCapabilities).
#[derive(Clone, Debug, PartialEq)]
pub struct Panel {
    instances: Vec<Array2<f64>>,
}

impl Panel {
    /// Builds a panel from a list of instances.
    pub fn from_instances(instances: Vec<Array2<f64>>) -> Self {
        Panel { instances }
    }

    /// Builds a univariate, equal-length panel where each row of `data` is one
    /// series.
    pub fn from_rows(data: ArrayView2<f64>) -> Self {
        let instances = data
            .rows()
            .into_iter()
            .map(|row| {
                let n = row.len();
                row.to_owned()
                    .into_shape((n, 1))
                    .expect("row reshapes to a single column")
            })
            .collect();
        Panel { instances }
    }

    /// The number of instances in the panel.
    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    /// The instance at `idx`, if any.
    pub fn instance(&self, idx: usize) -> Option<&Array2<f64>> {
        self.instances.get(idx)
    }

    pub fn instances(&self) -> &[Array2<f64>] {
        &self.instances
    }

    /// Whether every instance has the same number of time points.
    pub fn is_equal_length(&self) -> bool {
        let mut lengths = self.instances.iter().map(|s| s.nrows());
        match lengths.next() {
            Some(first) => lengths.all(|l| l == first),
            None => true,
        }
    }

    /// The number of variables, if it is the same across all instances.
    pub fn n_variables(&self) -> Option<usize> {
        let mut widths = self.instances.iter().map(|s| s.ncols());
        let first = widths.next()?;
        if widths.all(|w| w == first) {
            Some(first)
        } else {
            None
        }
    }

    /// Whether any instance contains a NaN observation.
    pub fn has_missing(&self) -> bool {
        self.instances
            .iter()
            .any(|s| s.iter().any(|v| v.is_nan()))
    }

    /// Flattens an equal-length, uniform-variable panel into a tabular array
    /// with one row per instance. Returns `None` when the panel is ragged.
    pub fn to_flat(&self) -> Option<Array2<f64>> {
        let n_vars = self.n_variables()?;
        if !self.is_equal_length() {
            return None;
        }
        let n_rows = self.instances.len();
        let len = self.instances.first().map_or(0, |s| s.nrows());
        let mut flat = Array2::zeros((n_rows, len * n_vars));
        for (i, instance) in self.instances.iter().enumerate() {
            for (j, v) in instance.iter().enumerate() {
                flat[[i, j]] = *v;
            }
        }
        Some(flat)
    }

    /// Appends the instances of `new` that are not already present, keeping
    /// existing instances first and unchanged. Presence is value equality;
    /// overlapping instances are never overwritten.
    pub fn merged(&self, new: &Panel) -> Panel {
        let mut instances = self.instances.clone();
        for candidate in &new.instances {
            if !self.instances.iter().any(|s| s == candidate) {
                instances.push(candidate.clone());
            }
        }
        Panel { instances }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use ndarray::{array, aview2};

    #[test]
    fn from_rows_builds_univariate_instances() {
        let panel = Panel::from_rows(aview2(&[[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]]));
        assert_eq!(panel.len(), 2);
        assert_eq!(panel.instance(0), Some(&array![[1.0], [2.0], [3.0]]));
        assert_eq!(panel.n_variables(), Some(1));
        assert!(panel.is_equal_length());
    }

    #[test]
    fn ragged_panels_are_detected() {
        let panel = Panel::from_instances(vec![
            array![[1.0], [2.0]],
            array![[1.0], [2.0], [3.0]],
        ]);
        assert!(!panel.is_equal_length());
        assert_eq!(panel.to_flat(), None);

        let mixed = Panel::from_instances(vec![array![[1.0, 2.0]], array![[1.0]]]);
        assert_eq!(mixed.n_variables(), None);
    }

    #[test]
    fn missing_values_are_detected() {
        let panel = Panel::from_instances(vec![array![[1.0], [f64::NAN]]]);
        assert!(panel.has_missing());
        assert!(!Panel::from_rows(aview2(&[[1.0, 2.0]])).has_missing());
    }

    #[test]
    fn to_flat_concatenates_variables_in_time_order() {
        let panel = Panel::from_instances(vec![
            array![[1.0, 10.0], [2.0, 20.0]],
            array![[3.0, 30.0], [4.0, 40.0]],
        ]);
        let flat = panel.to_flat().unwrap();
        assert_eq!(flat, array![[1.0, 10.0, 2.0, 20.0], [3.0, 30.0, 4.0, 40.0]]);
    }

    #[test]
    fn merged_appends_only_unseen_instances() {
        let fitted = Panel::from_rows(aview2(&[[1.0, 2.0], [3.0, 4.0]]));
        let new = Panel::from_rows(aview2(&[[3.0, 4.0], [5.0, 6.0]]));

        let merged = fitted.merged(&new);
        assert_eq!(merged.len(), 3);
        // Fit data first and untouched, then the genuinely new instance.
        assert_eq!(merged.instance(0), fitted.instance(0));
        assert_eq!(merged.instance(1), fitted.instance(1));
        assert_eq!(merged.instance(2), new.instance(1));
    }

    #[test]
    fn merged_with_disjoint_panel_concatenates() {
        let fitted = Panel::from_rows(aview2(&[[1.0, 2.0]]));
        let new = Panel::from_rows(aview2(&[[7.0, 8.0], [9.0, 10.0]]));
        assert_eq!(fitted.merged(&new).len(), 3);
    }
}
