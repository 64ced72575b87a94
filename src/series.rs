//! The assembled 12-step annual series

use crate::accumulator::MonthBucket;
use crate::calendar::canonical_year_axis;
use crate::errors::{Result, RomsMonthlyError};
use crate::metadata::{DimensionInfo, FieldLayout, StaticVariable};
use chrono::NaiveDateTime;
use netcdf::AttributeValue;
use ndarray::{stack, ArrayD, ArrayViewD, Axis};

/// Name of the output time dimension and coordinate
pub const OUTPUT_TIME_DIMENSION: &str = "time";

/// A monthly variable with a leading 12-entry time axis
#[derive(Debug, Clone)]
pub struct SeriesVariable {
    pub name: String,
    /// Dimension names, [`OUTPUT_TIME_DIMENSION`] first
    pub dims: Vec<String>,
    pub data: ArrayD<f64>,
    pub attributes: Vec<(String, AttributeValue)>,
}

/// Monthly means of one year, January first
#[derive(Debug, Clone)]
pub struct AnnualSeries {
    pub year: i32,
    /// Canonical mid-month timestamps, always 12
    pub times: Vec<NaiveDateTime>,
    pub variables: Vec<SeriesVariable>,
    pub static_variables: Vec<StaticVariable>,
    /// Spatial dimensions, time excluded
    pub dimensions: Vec<DimensionInfo>,
    pub global_attributes: Vec<(String, AttributeValue)>,
    /// Merges per month, including merges of empty windows
    pub contributions: Vec<usize>,
    /// Snapshot files opened by the month loop, template excluded
    pub files_processed: usize,
}

impl AnnualSeries {
    /// Concatenates the buckets in calendar order and stamps canonical times.
    ///
    /// Each bucket's own time mean is discarded; slot `i` always gets day 15
    /// of month `i + 1`.
    pub fn from_buckets(
        year: i32,
        buckets: &[MonthBucket],
        layout: &FieldLayout,
        files_processed: usize,
    ) -> Result<Self> {
        if buckets.len() != 12 {
            return Err(RomsMonthlyError::Generic(format!(
                "Expected 12 monthly buckets, got {}",
                buckets.len()
            )));
        }

        let variables = layout
            .monthly_variables()
            .map(|var_layout| -> Result<SeriesVariable> {
                let views = buckets
                    .iter()
                    .map(|bucket| {
                        bucket.value(&var_layout.name).map(|v| v.data.view()).ok_or_else(|| {
                            RomsMonthlyError::VariableMismatch {
                                var: var_layout.name.clone(),
                                message: format!("missing from bucket for month {}", bucket.month()),
                            }
                        })
                    })
                    .collect::<Result<Vec<ArrayViewD<f64>>>>()?;

                let mut dims = Vec::with_capacity(var_layout.dims.len() + 1);
                dims.push(OUTPUT_TIME_DIMENSION.to_string());
                dims.extend(var_layout.dims.iter().cloned());

                Ok(SeriesVariable {
                    name: var_layout.name.clone(),
                    dims,
                    data: stack(Axis(0), &views[..])?,
                    attributes: var_layout.attributes.clone(),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            year,
            times: canonical_year_axis(year)?,
            variables,
            static_variables: layout.kept_static_variables().cloned().collect(),
            dimensions: layout.dimensions.clone(),
            global_attributes: layout.global_attributes.clone(),
            contributions: buckets.iter().map(MonthBucket::contributions).collect(),
            files_processed,
        })
    }

    /// Looks a monthly variable up by name.
    #[must_use]
    pub fn variable(&self, name: &str) -> Option<&SeriesVariable> {
        self.variables.iter().find(|v| v.name == name)
    }

    /// Values of `name` for `month` (1..=12).
    #[must_use]
    pub fn month_values(&self, name: &str, month: u32) -> Option<ArrayViewD<'_, f64>> {
        if !(1..=12).contains(&month) {
            return None;
        }
        self.variable(name)
            .map(|v| v.data.index_axis(Axis(0), month as usize - 1))
    }

    /// Whether `month` holds no finite value in any variable.
    ///
    /// A month fed only empty windows has merges but no data, so it counts as
    /// missing.
    #[must_use]
    pub fn is_month_missing(&self, month: u32) -> bool {
        if !(1..=12).contains(&month) {
            return true;
        }
        let index = month as usize - 1;
        !self.variables.iter().any(|v| {
            v.data
                .index_axis(Axis(0), index)
                .iter()
                .any(|value| value.is_finite())
        })
    }

    /// Months with at least one finite value
    #[must_use]
    pub fn populated_months(&self) -> Vec<u32> {
        (1..=12).filter(|&m| !self.is_month_missing(m)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accumulator::MonthlyAccumulator;
    use crate::field::{FieldVariable, TimeIndexedField};
    use chrono::NaiveDate;
    use ndarray::arr2;

    fn field() -> TimeIndexedField {
        let day = |d| NaiveDate::from_ymd_opt(2006, 7, d).unwrap().and_hms_opt(0, 0, 0).unwrap();
        let zeta = FieldVariable::new(
            "zeta",
            vec!["ocean_time".to_string(), "xi_rho".to_string()],
            arr2(&[[1.0, 2.0], [3.0, 4.0]]).into_dyn(),
            0,
        )
        .unwrap();
        TimeIndexedField::new("ocean_his_0001.nc", vec![day(1), day(3)], vec![zeta], 1).unwrap()
    }

    #[test]
    fn test_from_buckets_stacks_months() {
        let field = field();
        let layout = FieldLayout::from_field(&field, "ocean_time");
        let mut acc = MonthlyAccumulator::new(2006, &layout.placeholder());
        acc.merge_slice(7, &field).unwrap();

        let series = AnnualSeries::from_buckets(2006, acc.buckets(), &layout, 1).unwrap();
        let zeta = series.variable("zeta").unwrap();
        assert_eq!(zeta.dims[0], OUTPUT_TIME_DIMENSION);
        assert_eq!(zeta.data.shape(), &[12, 2]);

        let july = series.month_values("zeta", 7).unwrap();
        assert_eq!(july[[0]], 2.0);
        assert_eq!(july[[1]], 3.0);
        assert!(series.month_values("zeta", 6).unwrap().iter().all(|v| v.is_nan()));
        assert!(series.month_values("zeta", 13).is_none());

        assert_eq!(series.populated_months(), vec![7]);
        assert!(series.is_month_missing(0));
        assert_eq!(
            series.times[6],
            NaiveDate::from_ymd_opt(2006, 7, 15).unwrap().and_hms_opt(12, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_from_buckets_requires_twelve() {
        let field = field();
        let layout = FieldLayout::from_field(&field, "ocean_time");
        let acc = MonthlyAccumulator::new(2006, &layout.placeholder());
        assert!(AnnualSeries::from_buckets(2006, &acc.buckets()[..11], &layout, 0).is_err());
    }

    #[test]
    fn test_empty_window_merge_is_still_missing() {
        let field = field();
        let layout = FieldLayout::from_field(&field, "ocean_time");
        let mut acc = MonthlyAccumulator::new(2006, &layout.placeholder());
        let day = |m, d| NaiveDate::from_ymd_opt(2006, m, d).unwrap().and_hms_opt(0, 0, 0).unwrap();
        let empty = field.select_window(day(8, 1), day(8, 31));
        assert!(empty.is_empty());
        acc.merge_slice(8, &empty).unwrap();

        let series = AnnualSeries::from_buckets(2006, acc.buckets(), &layout, 1).unwrap();
        assert_eq!(series.contributions[7], 1);
        assert!(series.is_month_missing(8));
        assert!(series.populated_months().is_empty());
    }
}
