//! In-memory model of snapshot data
//!
//! A [`TimeIndexedField`] holds every time-dependent numeric variable of one
//! snapshot file together with its decoded time axis. Reducing it over time
//! yields a [`ReducedField`], the unit the monthly buckets work with.

use crate::errors::{Result, RomsMonthlyError};
use crate::statistics::{StatOperation, StatisticalReduction};
use crate::time_axis::mean_time;
use chrono::NaiveDateTime;
use ndarray::{ArrayD, Axis};

/// Bookkeeping variable that does not average meaningfully
pub const AUXILIARY_VARIABLE: &str = "dstart";

/// Files with more raw variables than this get [`AUXILIARY_VARIABLE`] dropped
pub const AUXILIARY_DROP_THRESHOLD: usize = 200;

/// Whether a file with `raw_variable_count` variables loses [`AUXILIARY_VARIABLE`].
#[must_use]
pub const fn should_drop_auxiliary(raw_variable_count: usize) -> bool {
    raw_variable_count > AUXILIARY_DROP_THRESHOLD
}

/// One time-dependent variable of a snapshot
#[derive(Debug, Clone)]
pub struct FieldVariable {
    pub name: String,
    /// Dimension names, time included
    pub dims: Vec<String>,
    pub data: ArrayD<f64>,
    /// Position of the time dimension in `dims`
    pub time_axis: usize,
}

impl FieldVariable {
    /// Create a variable, checking that `data` matches `dims` and `time_axis`.
    pub fn new(name: &str, dims: Vec<String>, data: ArrayD<f64>, time_axis: usize) -> Result<Self> {
        if dims.len() != data.ndim() {
            return Err(RomsMonthlyError::Generic(format!(
                "Variable '{}' has {} dimension names for {} array axes",
                name,
                dims.len(),
                data.ndim()
            )));
        }
        if time_axis >= dims.len() {
            return Err(RomsMonthlyError::DimensionNotFound {
                var: name.to_string(),
                dim: "time".to_string(),
            });
        }
        Ok(Self {
            name: name.to_string(),
            dims,
            data,
            time_axis,
        })
    }

    /// Dimension names with the time dimension removed
    #[must_use]
    pub fn spatial_dims(&self) -> Vec<String> {
        self.dims
            .iter()
            .enumerate()
            .filter_map(|(i, d)| if i == self.time_axis { None } else { Some(d.clone()) })
            .collect()
    }
}

/// Time-indexed numeric fields of one snapshot file
#[derive(Debug, Clone)]
pub struct TimeIndexedField {
    /// File name the data came from, for log and error messages
    pub source: String,
    pub times: Vec<NaiveDateTime>,
    pub variables: Vec<FieldVariable>,
    /// Number of variables the file declared, time coordinate excluded
    pub raw_variable_count: usize,
}

impl TimeIndexedField {
    /// Create a field, checking every variable against the time axis length.
    pub fn new(
        source: &str,
        times: Vec<NaiveDateTime>,
        variables: Vec<FieldVariable>,
        raw_variable_count: usize,
    ) -> Result<Self> {
        for var in &variables {
            let len = var.data.len_of(Axis(var.time_axis));
            if len != times.len() {
                return Err(RomsMonthlyError::ShapeMismatch {
                    var: var.name.clone(),
                    expected: vec![times.len()],
                    found: vec![len],
                });
            }
        }
        Ok(Self {
            source: source.to_string(),
            times,
            variables,
            raw_variable_count,
        })
    }

    /// Number of time samples
    #[must_use]
    pub fn len(&self) -> usize {
        self.times.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Keeps the samples with `start <= t < end`.
    #[must_use]
    pub fn select_window(&self, start: NaiveDateTime, end: NaiveDateTime) -> Self {
        let indices: Vec<usize> = self
            .times
            .iter()
            .enumerate()
            .filter_map(|(i, t)| if *t >= start && *t < end { Some(i) } else { None })
            .collect();

        let variables = self
            .variables
            .iter()
            .map(|var| FieldVariable {
                name: var.name.clone(),
                dims: var.dims.clone(),
                data: var.data.select(Axis(var.time_axis), &indices),
                time_axis: var.time_axis,
            })
            .collect();

        Self {
            source: self.source.clone(),
            times: indices.iter().map(|&i| self.times[i]).collect(),
            variables,
            raw_variable_count: self.raw_variable_count,
        }
    }

    /// Collapses the time axis: data to its NaN-skipping mean, time to its mean.
    ///
    /// An empty field reduces to all-missing data with no timestamp.
    pub fn time_mean(&self) -> Result<ReducedField> {
        log::debug!(
            "Computing {} of {} samples from {}",
            StatOperation::TimeMean.as_str(),
            self.len(),
            self.source
        );

        let variables = self
            .variables
            .iter()
            .map(|var| -> Result<ReducedVariable> {
                Ok(ReducedVariable {
                    name: var.name.clone(),
                    dims: var.spatial_dims(),
                    data: var.data.mean_along_axis(var.time_axis)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(ReducedField {
            time: mean_time(&self.times),
            variables,
        })
    }
}

/// A variable with its time axis collapsed
#[derive(Debug, Clone)]
pub struct ReducedVariable {
    pub name: String,
    /// Dimension names, time excluded
    pub dims: Vec<String>,
    pub data: ArrayD<f64>,
}

/// Time-collapsed snapshot data stamped with a single timestamp
#[derive(Debug, Clone)]
pub struct ReducedField {
    /// `None` stands for the missing timestamp
    pub time: Option<NaiveDateTime>,
    pub variables: Vec<ReducedVariable>,
}

impl ReducedField {
    /// Looks a variable up by name.
    #[must_use]
    pub fn variable(&self, name: &str) -> Option<&ReducedVariable> {
        self.variables.iter().find(|v| v.name == name)
    }

    /// Removes [`AUXILIARY_VARIABLE`] when the source file is above the
    /// threshold. Returns whether anything was removed.
    pub fn drop_auxiliary(&mut self, raw_variable_count: usize) -> bool {
        if !should_drop_auxiliary(raw_variable_count) {
            return false;
        }
        let before = self.variables.len();
        self.variables.retain(|v| v.name != AUXILIARY_VARIABLE);
        before != self.variables.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use ndarray::{arr1, arr2};

    fn day(d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2006, 5, d)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn sample_field() -> TimeIndexedField {
        // zeta(ocean_time, xi) with three samples
        let zeta = FieldVariable::new(
            "zeta",
            vec!["ocean_time".to_string(), "xi_rho".to_string()],
            arr2(&[[1.0, 10.0], [2.0, 20.0], [6.0, f64::NAN]]).into_dyn(),
            0,
        )
        .unwrap();
        // time on the trailing axis
        let tracer = FieldVariable::new(
            "tracer",
            vec!["s_rho".to_string(), "ocean_time".to_string()],
            arr2(&[[3.0, 5.0, 7.0]]).into_dyn(),
            1,
        )
        .unwrap();
        TimeIndexedField::new("ocean_his_0001.nc", vec![day(1), day(2), day(3)], vec![zeta, tracer], 2)
            .unwrap()
    }

    #[test]
    fn test_time_mean_collapses_time_axis() {
        let reduced = sample_field().time_mean().unwrap();
        assert_eq!(reduced.time, Some(day(2)));

        let zeta = reduced.variable("zeta").unwrap();
        assert_eq!(zeta.dims, vec!["xi_rho"]);
        assert_eq!(zeta.data.shape(), &[2]);
        assert_eq!(zeta.data[[0]], 3.0);
        assert_eq!(zeta.data[[1]], 15.0);

        let tracer = reduced.variable("tracer").unwrap();
        assert_eq!(tracer.dims, vec!["s_rho"]);
        assert_eq!(tracer.data[[0]], 5.0);
    }

    #[test]
    fn test_select_window_is_half_open() {
        let field = sample_field();
        let window = field.select_window(day(2), day(3));
        assert_eq!(window.times, vec![day(2)]);
        assert_eq!(window.variables[0].data.shape(), &[1, 2]);
        assert_eq!(window.variables[1].data.shape(), &[1, 1]);
        assert_eq!(window.variables[1].data[[0, 0]], 5.0);
    }

    #[test]
    fn test_empty_window_reduces_to_missing() {
        let field = sample_field();
        let reduced = field.select_window(day(10), day(20)).time_mean().unwrap();
        assert_eq!(reduced.time, None);
        assert!(reduced.variables.iter().all(|v| v.data.iter().all(|x| x.is_nan())));
    }

    #[test]
    fn test_time_axis_length_is_checked() {
        let var = FieldVariable::new(
            "zeta",
            vec!["ocean_time".to_string()],
            arr1(&[1.0, 2.0]).into_dyn(),
            0,
        )
        .unwrap();
        let result = TimeIndexedField::new("bad.nc", vec![day(1)], vec![var], 1);
        assert!(matches!(result, Err(RomsMonthlyError::ShapeMismatch { .. })));
    }

    #[test]
    fn test_drop_auxiliary_threshold() {
        let mut reduced = ReducedField {
            time: None,
            variables: vec![
                ReducedVariable {
                    name: AUXILIARY_VARIABLE.to_string(),
                    dims: vec![],
                    data: ArrayD::zeros(ndarray::IxDyn(&[])),
                },
                ReducedVariable {
                    name: "temp".to_string(),
                    dims: vec![],
                    data: ArrayD::zeros(ndarray::IxDyn(&[])),
                },
            ],
        };
        assert!(!reduced.drop_auxiliary(AUXILIARY_DROP_THRESHOLD));
        assert_eq!(reduced.variables.len(), 2);

        assert!(reduced.drop_auxiliary(AUXILIARY_DROP_THRESHOLD + 1));
        assert!(reduced.variable(AUXILIARY_VARIABLE).is_none());
        assert!(reduced.variable("temp").is_some());
    }
}
