//! Calendar helpers: month lengths, leap-year policy and canonical timestamps
//!
//! Leap years are resolved from a fixed allowlist of model years rather than
//! the Gregorian rule. Callers that need a different answer pass it explicitly.

use crate::errors::{Result, RomsMonthlyError};
use chrono::{NaiveDate, NaiveDateTime};

/// Years treated as leap years when no explicit flag is supplied
pub const LEAP_YEAR_ALLOWLIST: [i32; 5] = [2008, 2012, 2016, 2020, 2024];

/// Day of month used for the synthesized output timestamps
pub const CANONICAL_DAY: u32 = 15;

/// Hour of day used for the synthesized output timestamps
pub const CANONICAL_HOUR: u32 = 12;

/// Returns the inclusive `(first_day, last_day)` range of a month.
///
/// # Errors
///
/// Returns [`RomsMonthlyError::InvalidMonth`] when `month` is outside 1..=12.
pub fn month_day_range(month: u32, is_leap: bool) -> Result<(u32, u32)> {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => Ok((1, 31)),
        4 | 6 | 9 | 11 => Ok((1, 30)),
        2 if is_leap => Ok((1, 29)),
        2 => Ok((1, 28)),
        _ => Err(RomsMonthlyError::InvalidMonth(month)),
    }
}

/// Leap-year flag as supplied by the caller
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LeapYearOption {
    /// No value given
    #[default]
    Unset,
    /// Boolean given, used verbatim
    Explicit(bool),
    /// Something other than a boolean was given
    Invalid(String),
}

impl LeapYearOption {
    /// Interprets a raw textual value, e.g. from the command line.
    ///
    /// `true` and `false` (any case) are booleans; everything else is kept
    /// as [`LeapYearOption::Invalid`] so the fallback can warn about it.
    #[must_use]
    pub fn from_raw(raw: Option<&str>) -> Self {
        match raw {
            None => Self::Unset,
            Some(value) => match value.trim().to_ascii_lowercase().as_str() {
                "true" => Self::Explicit(true),
                "false" => Self::Explicit(false),
                _ => Self::Invalid(value.to_string()),
            },
        }
    }
}

impl From<bool> for LeapYearOption {
    fn from(value: bool) -> Self {
        Self::Explicit(value)
    }
}

impl From<Option<bool>> for LeapYearOption {
    fn from(value: Option<bool>) -> Self {
        value.map_or(Self::Unset, Self::Explicit)
    }
}

/// Which rule decided the leap-year flag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeapYearSource {
    Explicit,
    Allowlist,
    Default,
}

/// Outcome of leap-year resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeapYearResolution {
    pub is_leap: bool,
    pub source: LeapYearSource,
    /// Set when an invalid explicit value was discarded
    pub fell_back: bool,
}

/// Allowlist rule alone, without logging.
#[must_use]
pub fn is_allowlisted_leap_year(year: i32) -> bool {
    LEAP_YEAR_ALLOWLIST.contains(&year)
}

/// Resolves the leap-year flag for `year`.
///
/// An explicit boolean wins. An invalid value is discarded with a warning and
/// the allowlist rule applies as if nothing had been supplied.
pub fn resolve_leap_year(year: i32, option: &LeapYearOption) -> LeapYearResolution {
    let fell_back = match option {
        LeapYearOption::Explicit(is_leap) => {
            return LeapYearResolution {
                is_leap: *is_leap,
                source: LeapYearSource::Explicit,
                fell_back: false,
            };
        }
        LeapYearOption::Invalid(raw) => {
            log::warn!(
                "isLeapYear should be a boolean, got '{}'; falling back to the leap-year allowlist",
                raw
            );
            true
        }
        LeapYearOption::Unset => false,
    };

    if is_allowlisted_leap_year(year) {
        log::info!(
            "No bool value set for isLeapYear. {} identified as leap year from limited set of leap years {:?}",
            year,
            LEAP_YEAR_ALLOWLIST
        );
        LeapYearResolution {
            is_leap: true,
            source: LeapYearSource::Allowlist,
            fell_back,
        }
    } else {
        log::warn!("isLeapYear set to default value (false) for {}", year);
        LeapYearResolution {
            is_leap: false,
            source: LeapYearSource::Default,
            fell_back,
        }
    }
}

/// Builds a date, turning out-of-calendar combinations into an error.
pub fn checked_date(year: i32, month: u32, day: u32) -> Result<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, day)
        .ok_or(RomsMonthlyError::InvalidDate { year, month, day })
}

/// Half-open `[first_day 00:00, last_day 23:59)` window of a month.
///
/// Samples in the final minute of a month fall outside the window.
pub fn month_window(year: i32, month: u32, is_leap: bool) -> Result<(NaiveDateTime, NaiveDateTime)> {
    let (first_day, last_day) = month_day_range(month, is_leap)?;
    let start = checked_date(year, month, first_day)?.and_hms_opt(0, 0, 0);
    let end = checked_date(year, month, last_day)?.and_hms_opt(23, 59, 0);
    match (start, end) {
        (Some(start), Some(end)) => Ok((start, end)),
        _ => Err(RomsMonthlyError::InvalidDate {
            year,
            month,
            day: last_day,
        }),
    }
}

/// Mid-month timestamp stamped onto output slot `month` of `year`.
pub fn canonical_timestamp(year: i32, month: u32) -> Result<NaiveDateTime> {
    checked_date(year, month, CANONICAL_DAY)?
        .and_hms_opt(CANONICAL_HOUR, 0, 0)
        .ok_or(RomsMonthlyError::InvalidDate {
            year,
            month,
            day: CANONICAL_DAY,
        })
}

/// The twelve canonical timestamps of `year`, January first.
pub fn canonical_year_axis(year: i32) -> Result<Vec<NaiveDateTime>> {
    (1..=12).map(|month| canonical_timestamp(year, month)).collect()
}
