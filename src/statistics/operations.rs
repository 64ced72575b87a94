//! Core statistical operations and traits
//!
//! Reductions skip NaN, which stands for "missing" throughout the crate, so a
//! position that is missing in every input stays missing in the result.

use crate::errors::{Result, RomsMonthlyError};
use ndarray::{ArrayD, Axis, Zip};

/// Supported statistical operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatOperation {
    /// Arithmetic mean over the time axis of one snapshot slice
    TimeMean,
    /// Unweighted mean of a stored bucket value and a new contribution
    MeanMerge,
}

impl StatOperation {
    /// Get the string representation of the operation
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TimeMean => "time mean",
            Self::MeanMerge => "mean merge",
        }
    }
}

/// Trait for types that can perform statistical reductions along an axis
pub trait StatisticalReduction<T> {
    /// Mean along `axis`, skipping missing values
    ///
    /// # Errors
    ///
    /// Returns an error if the axis is out of bounds for the array.
    fn mean_along_axis(&self, axis: usize) -> Result<ArrayD<T>>;

    /// Elementwise mean with an equally shaped array, skipping missing values
    ///
    /// # Errors
    ///
    /// Returns an error if the shapes differ.
    fn mean_with(&self, other: &ArrayD<T>, var_name: &str) -> Result<ArrayD<T>>;
}

impl StatisticalReduction<f64> for ArrayD<f64> {
    fn mean_along_axis(&self, axis: usize) -> Result<ArrayD<f64>> {
        nanmean_axis(self, axis)
    }

    fn mean_with(&self, other: &ArrayD<f64>, var_name: &str) -> Result<ArrayD<f64>> {
        nanmean_pair(self, other, var_name)
    }
}

/// Computes the mean along an axis, ignoring NaN.
///
/// Positions where every value along the axis is NaN (or the axis is empty)
/// become NaN.
pub fn nanmean_axis(data: &ArrayD<f64>, axis: usize) -> Result<ArrayD<f64>> {
    if axis >= data.ndim() {
        return Err(RomsMonthlyError::Generic(format!(
            "Axis {axis} is out of bounds for array with {} dimensions",
            data.ndim()
        )));
    }

    let axis = Axis(axis);
    let sums = data.fold_axis(axis, 0.0f64, |&acc, &x| if x.is_nan() { acc } else { acc + x });
    let counts = data.fold_axis(axis, 0usize, |&acc, &x| if x.is_nan() { acc } else { acc + 1 });

    let mut result = sums;
    Zip::from(&mut result).and(&counts).for_each(|sum, &count| {
        *sum = if count > 0 { *sum / count as f64 } else { f64::NAN };
    });
    Ok(result)
}

/// Mean of two arrays of identical shape, ignoring NaN on either side.
pub fn nanmean_pair(stored: &ArrayD<f64>, incoming: &ArrayD<f64>, var_name: &str) -> Result<ArrayD<f64>> {
    if stored.shape() != incoming.shape() {
        return Err(RomsMonthlyError::ShapeMismatch {
            var: var_name.to_string(),
            expected: stored.shape().to_vec(),
            found: incoming.shape().to_vec(),
        });
    }

    Ok(Zip::from(stored).and(incoming).map_collect(|&a, &b| match (a.is_nan(), b.is_nan()) {
        (false, false) => (a + b) / 2.0,
        (false, true) => a,
        (true, false) => b,
        (true, true) => f64::NAN,
    }))
}
