//! Monthly running-mean accumulator
//!
//! Twelve buckets, January at index 0. Each merge replaces a bucket's value
//! with the unweighted mean of its stored value and the new contribution, so
//! the final value is a mean of per-segment means rather than a mean over all
//! samples. Sample counts are not tracked.

use crate::errors::{Result, RomsMonthlyError};
use crate::field::{ReducedField, ReducedVariable, TimeIndexedField};
use crate::statistics::{StatOperation, StatisticalReduction};
use crate::time_axis::merge_time_means;
use chrono::{Datelike, NaiveDateTime};

/// Reduces a month-filtered slice to the value merged into a bucket.
///
/// The auxiliary variable is dropped when the source file is above the
/// variable threshold. A slice whose mean timestamp lies outside
/// `target_year` keeps its values but loses its timestamp.
pub fn prepare_contribution(slice: &TimeIndexedField, target_year: i32) -> Result<ReducedField> {
    let mut reduced = slice.time_mean()?;
    if reduced.drop_auxiliary(slice.raw_variable_count) {
        log::debug!("Dropped auxiliary variable from {}", slice.source);
    }
    if reduced.time.is_some_and(|t| t.year() != target_year) {
        reduced.time = None;
    }
    Ok(reduced)
}

/// One calendar month's accumulator state
#[derive(Debug, Clone)]
pub struct MonthBucket {
    month: u32,
    values: Vec<ReducedVariable>,
    time_mean: Option<NaiveDateTime>,
    contributions: usize,
}

impl MonthBucket {
    /// Starts a bucket from the fully missing placeholder.
    #[must_use]
    pub fn new(month: u32, placeholder: &ReducedField) -> Self {
        Self {
            month,
            values: placeholder.variables.clone(),
            time_mean: None,
            contributions: 0,
        }
    }

    /// Calendar month, 1 for January
    #[must_use]
    pub const fn month(&self) -> u32 {
        self.month
    }

    /// Current mean values
    #[must_use]
    pub fn values(&self) -> &[ReducedVariable] {
        &self.values
    }

    /// Current value of one variable
    #[must_use]
    pub fn value(&self, name: &str) -> Option<&ReducedVariable> {
        self.values.iter().find(|v| v.name == name)
    }

    /// Current mean of contributing timestamps
    #[must_use]
    pub const fn time_mean(&self) -> Option<NaiveDateTime> {
        self.time_mean
    }

    /// Number of merges so far; informational only, never used as a weight
    #[must_use]
    pub const fn contributions(&self) -> usize {
        self.contributions
    }

    /// Whether nothing has been merged yet
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.contributions == 0
    }

    /// Mean-merges a reduced contribution into the bucket.
    ///
    /// The contribution must carry exactly the bucket's variables with the
    /// same shapes. On error the bucket is left unchanged.
    pub fn merge(&mut self, contribution: &ReducedField) -> Result<()> {
        if contribution.variables.len() != self.values.len() {
            let extra = contribution
                .variables
                .iter()
                .find(|v| !self.values.iter().any(|b| b.name == v.name))
                .or_else(|| contribution.variables.first());
            return Err(RomsMonthlyError::VariableMismatch {
                var: extra.map_or_else(String::new, |v| v.name.clone()),
                message: format!(
                    "bucket for month {} holds {} variables, contribution has {}",
                    self.month,
                    self.values.len(),
                    contribution.variables.len()
                ),
            });
        }

        let merged = self
            .values
            .iter()
            .map(|stored| -> Result<ReducedVariable> {
                let incoming = contribution.variable(&stored.name).ok_or_else(|| {
                    RomsMonthlyError::VariableMismatch {
                        var: stored.name.clone(),
                        message: format!("missing from contribution to month {}", self.month),
                    }
                })?;
                Ok(ReducedVariable {
                    name: stored.name.clone(),
                    dims: stored.dims.clone(),
                    data: stored.data.mean_with(&incoming.data, &stored.name)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        log::debug!(
            "{} into month {} ({} previous contributions)",
            StatOperation::MeanMerge.as_str(),
            self.month,
            self.contributions
        );

        self.values = merged;
        self.time_mean = merge_time_means(self.time_mean, contribution.time);
        self.contributions += 1;
        Ok(())
    }
}

/// The twelve monthly buckets of one target year
#[derive(Debug, Clone)]
pub struct MonthlyAccumulator {
    target_year: i32,
    buckets: Vec<MonthBucket>,
}

impl MonthlyAccumulator {
    /// Twelve buckets, each starting from `placeholder`.
    #[must_use]
    pub fn new(target_year: i32, placeholder: &ReducedField) -> Self {
        Self {
            target_year,
            buckets: (1..=12).map(|month| MonthBucket::new(month, placeholder)).collect(),
        }
    }

    #[must_use]
    pub const fn target_year(&self) -> i32 {
        self.target_year
    }

    /// Bucket of `month` (1..=12)
    pub fn bucket(&self, month: u32) -> Result<&MonthBucket> {
        Self::index(month).map(|i| &self.buckets[i])
    }

    /// All buckets, January first
    #[must_use]
    pub fn buckets(&self) -> &[MonthBucket] {
        &self.buckets
    }

    /// Reduces `slice` and merges it into the bucket of `month`.
    pub fn merge_slice(&mut self, month: u32, slice: &TimeIndexedField) -> Result<()> {
        let contribution = prepare_contribution(slice, self.target_year)?;
        self.merge(month, &contribution)
    }

    /// Merges an already reduced contribution into the bucket of `month`.
    pub fn merge(&mut self, month: u32, contribution: &ReducedField) -> Result<()> {
        let index = Self::index(month)?;
        self.buckets[index].merge(contribution)
    }

    /// Hands the buckets over for assembly.
    #[must_use]
    pub fn into_buckets(self) -> Vec<MonthBucket> {
        self.buckets
    }

    fn index(month: u32) -> Result<usize> {
        if (1..=12).contains(&month) {
            Ok(month as usize - 1)
        } else {
            Err(RomsMonthlyError::InvalidMonth(month))
        }
    }
}
