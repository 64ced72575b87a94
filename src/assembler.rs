//! Annual assembly: file classification and the month loop
//!
//! Each snapshot file lands in zero, one or two calendar months:
//!
//! - a file whose samples all share one month is merged whole, without any
//!   day-of-month trimming, provided its mean timestamp lies in the target year;
//! - a file spanning two months is split at month boundaries, each part
//!   trimmed to `[first day 00:00, last day 23:59)`, provided its latest sample
//!   lies in the target year;
//! - anything else contributes nothing.
//!
//! Only the first and last month of a spanning file are considered; files are
//! expected to cover at most two months.

use crate::accumulator::MonthlyAccumulator;
use crate::calendar::{is_allowlisted_leap_year, month_window, resolve_leap_year, LeapYearOption, LeapYearResolution};
use crate::data_source::{SnapshotNaming, SnapshotSource, DEFAULT_TIME_VARIABLE};
use crate::errors::{Result, RomsMonthlyError};
use crate::field::TimeIndexedField;
use crate::netcdf_io::NetCDFSnapshotSource;
use crate::series::AnnualSeries;
use crate::time_axis::{mean_year, time_extent};
use chrono::{Datelike, NaiveDateTime};
use std::path::{Path, PathBuf};

/// A calendar month of a specific year
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthSegment {
    pub year: i32,
    pub month: u32,
}

impl MonthSegment {
    fn of(time: &NaiveDateTime) -> Self {
        Self {
            year: time.year(),
            month: time.month(),
        }
    }
}

/// Where a snapshot file's samples go
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileClass {
    /// All samples share one month of the target year
    SingleMonth(MonthSegment),
    /// Samples span two months; the latest lies in the target year
    CrossMonth {
        first: MonthSegment,
        second: MonthSegment,
    },
    /// Nothing to merge for the target year
    OutsideYear,
}

/// Classifies a file's time axis against `target_year`.
///
/// # Errors
///
/// Returns [`RomsMonthlyError::EmptyTimeAxis`] when there are no samples.
pub fn classify(times: &[NaiveDateTime], target_year: i32, source: &str) -> Result<FileClass> {
    let (min, max) = time_extent(times).ok_or_else(|| RomsMonthlyError::EmptyTimeAxis {
        file: source.to_string(),
    })?;

    if min.month() == max.month() {
        return Ok(match mean_year(times) {
            Some(year) if year == target_year => FileClass::SingleMonth(MonthSegment {
                year,
                month: min.month(),
            }),
            _ => FileClass::OutsideYear,
        });
    }

    if max.year() == target_year {
        Ok(FileClass::CrossMonth {
            first: MonthSegment::of(&min),
            second: MonthSegment::of(&max),
        })
    } else {
        Ok(FileClass::OutsideYear)
    }
}

/// Parameters of one annual run
#[derive(Debug, Clone)]
pub struct AnnualConfig {
    pub year: i32,
    pub directory: PathBuf,
    /// First snapshot number, inclusive
    pub file_start: u32,
    /// Last snapshot number, exclusive
    pub file_end: u32,
    pub leap_year: LeapYearOption,
    pub naming: SnapshotNaming,
    pub time_variable: String,
}

impl AnnualConfig {
    /// Configuration with ROMS defaults (`ocean_his_####.nc`, `ocean_time`).
    pub fn new(year: i32, directory: impl Into<PathBuf>, file_start: u32, file_end: u32) -> Self {
        Self {
            year,
            directory: directory.into(),
            file_start,
            file_end,
            leap_year: LeapYearOption::Unset,
            naming: SnapshotNaming::default(),
            time_variable: DEFAULT_TIME_VARIABLE.to_string(),
        }
    }

    #[must_use]
    pub fn with_leap_year(mut self, leap_year: impl Into<LeapYearOption>) -> Self {
        self.leap_year = leap_year.into();
        self
    }

    #[must_use]
    pub fn with_prefix(mut self, prefix: &str) -> Self {
        self.naming.prefix = prefix.to_string();
        self
    }

    #[must_use]
    pub fn with_suffix(mut self, suffix: &str) -> Self {
        self.naming.suffix = suffix.to_string();
        self
    }

    #[must_use]
    pub fn with_time_variable(mut self, name: &str) -> Self {
        self.time_variable = name.to_string();
        self
    }

    /// Runs the assembly against NetCDF files in `directory`.
    pub fn run(&self) -> Result<AnnualSeries> {
        let source = NetCDFSnapshotSource::new(&self.directory, self.naming.clone(), &self.time_variable);
        let assembler = AnnualAssembler::new(source, self.year, &self.leap_year);
        assembler.run(self.file_start, self.file_end)
    }
}

/// Monthly means of `year` from `ocean_his_####.nc` files in `path`.
///
/// Files `filestart..fileend` are read; `fileend` itself is not.
///
/// ```rust,no_run
/// use roms_monthly::{create_annual, LeapYearOption};
///
/// let series = create_annual(2006, "/data/roms/apr2024_2005/", 74, 100, LeapYearOption::Unset).unwrap();
/// assert_eq!(series.times.len(), 12);
/// ```
pub fn create_annual(
    year: i32,
    path: impl AsRef<Path>,
    filestart: u32,
    fileend: u32,
    is_leap_year: impl Into<LeapYearOption>,
) -> Result<AnnualSeries> {
    AnnualConfig::new(year, path.as_ref(), filestart, fileend)
        .with_leap_year(is_leap_year)
        .run()
}

/// Drives the month loop over any [`SnapshotSource`]
pub struct AnnualAssembler<S: SnapshotSource> {
    source: S,
    year: i32,
    leap: LeapYearResolution,
}

impl<S: SnapshotSource> AnnualAssembler<S> {
    /// Resolves the leap-year flag once for the whole run.
    pub fn new(source: S, year: i32, leap_year: &LeapYearOption) -> Self {
        Self {
            source,
            year,
            leap: resolve_leap_year(year, leap_year),
        }
    }

    #[must_use]
    pub const fn leap_year(&self) -> LeapYearResolution {
        self.leap
    }

    /// Processes snapshots `file_start..file_end` and assembles the series.
    pub fn run(&self, file_start: u32, file_end: u32) -> Result<AnnualSeries> {
        if file_end <= file_start {
            return Err(RomsMonthlyError::InvalidFileRange {
                start: file_start,
                end: file_end,
            });
        }

        log::info!("📂 Reading field layout from {}", self.source.file_name(file_start));
        let layout = self.source.layout(file_start)?;
        log::debug!(
            "Template has {} monthly and {} static variables",
            layout.monthly_variables().count(),
            layout.kept_static_variables().count()
        );

        let mut accumulator = MonthlyAccumulator::new(self.year, &layout.placeholder());
        let mut files_processed = 0;

        for number in file_start..file_end {
            // Scoped so the snapshot is dropped before the next one is read.
            {
                let field = self.source.load(number)?;
                self.process_file(&mut accumulator, &field)?;
            }
            files_processed += 1;
        }

        let buckets = accumulator.into_buckets();
        let series = AnnualSeries::from_buckets(self.year, &buckets, &layout, files_processed)?;

        let missing: Vec<u32> = (1..=12).filter(|&m| series.is_month_missing(m)).collect();
        if missing.is_empty() {
            log::info!("✅ All 12 months of {} have data", self.year);
        } else {
            log::info!("✅ Assembled {} with no data for months {:?}", self.year, missing);
        }
        Ok(series)
    }

    fn process_file(&self, accumulator: &mut MonthlyAccumulator, field: &TimeIndexedField) -> Result<()> {
        let class = classify(&field.times, self.year, &field.source)?;
        if let Some((_, max)) = time_extent(&field.times) {
            log::info!("Working on month #{} in {}...", max.month(), field.source);
        }

        match class {
            FileClass::SingleMonth(segment) => {
                log::debug!("{} lies within month {}", field.source, segment.month);
                accumulator.merge_slice(segment.month, field)?;
            }
            FileClass::CrossMonth { first, second } => {
                log::debug!(
                    "{} spans {:04}-{:02} to {:04}-{:02}",
                    field.source,
                    first.year,
                    first.month,
                    second.year,
                    second.month
                );
                self.merge_segment(accumulator, field, first)?;
                self.merge_segment(accumulator, field, second)?;
            }
            FileClass::OutsideYear => {
                log::info!("{} has no samples for {}, skipping", field.source, self.year);
            }
        }
        Ok(())
    }

    fn merge_segment(
        &self,
        accumulator: &mut MonthlyAccumulator,
        field: &TimeIndexedField,
        segment: MonthSegment,
    ) -> Result<()> {
        let is_leap = if segment.year == self.year {
            self.leap.is_leap
        } else {
            is_allowlisted_leap_year(segment.year)
        };
        let (start, end) = month_window(segment.year, segment.month, is_leap)?;
        let slice = field.select_window(start, end);

        if segment.year != self.year {
            log::debug!(
                "Segment {:04}-{:02} of {} is outside {}",
                segment.year,
                segment.month,
                field.source,
                self.year
            );
            return Ok(());
        }

        log::debug!(
            "{} samples of {} fall in {:04}-{:02}",
            slice.len(),
            field.source,
            segment.year,
            segment.month
        );
        accumulator.merge_slice(segment.month, &slice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_classify_single_month() {
        let times = [at(2006, 3, 2), at(2006, 3, 4), at(2006, 3, 6)];
        assert_eq!(
            classify(&times, 2006, "f").unwrap(),
            FileClass::SingleMonth(MonthSegment { year: 2006, month: 3 })
        );
        assert_eq!(classify(&times, 2007, "f").unwrap(), FileClass::OutsideYear);
    }

    #[test]
    fn test_classify_cross_month() {
        let times = [at(2006, 3, 30), at(2006, 4, 1), at(2006, 4, 3)];
        assert_eq!(
            classify(&times, 2006, "f").unwrap(),
            FileClass::CrossMonth {
                first: MonthSegment { year: 2006, month: 3 },
                second: MonthSegment { year: 2006, month: 4 },
            }
        );
    }

    #[test]
    fn test_classify_year_boundary() {
        // Dec 2005 -> Jan 2006: latest sample in the target year
        let times = [at(2005, 12, 30), at(2006, 1, 2)];
        assert_eq!(
            classify(&times, 2006, "f").unwrap(),
            FileClass::CrossMonth {
                first: MonthSegment { year: 2005, month: 12 },
                second: MonthSegment { year: 2006, month: 1 },
            }
        );
        // Dec 2006 -> Jan 2007: latest sample outside the target year
        let times = [at(2006, 12, 30), at(2007, 1, 2)];
        assert_eq!(classify(&times, 2006, "f").unwrap(), FileClass::OutsideYear);
    }

    #[test]
    fn test_classify_far_future_year() {
        let times = [at(2300, 5, 1), at(2300, 5, 3)];
        assert_eq!(
            classify(&times, 2300, "f").unwrap(),
            FileClass::SingleMonth(MonthSegment { year: 2300, month: 5 })
        );
    }

    #[test]
    fn test_classify_empty_axis() {
        assert!(matches!(
            classify(&[], 2006, "ocean_his_0001.nc"),
            Err(RomsMonthlyError::EmptyTimeAxis { .. })
        ));
    }

    #[test]
    fn test_config_builder() {
        let config = AnnualConfig::new(2006, "/data", 74, 100)
            .with_leap_year(false)
            .with_prefix("ocean_avg_")
            .with_time_variable("time");
        assert_eq!(config.leap_year, LeapYearOption::Explicit(false));
        assert_eq!(config.naming.file_name(74), "ocean_avg_0074.nc");
        assert_eq!(config.time_variable, "time");
        assert_eq!(config.directory, PathBuf::from("/data"));
    }
}
