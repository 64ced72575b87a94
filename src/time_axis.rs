//! Decoding and averaging of the `ocean_time` coordinate
//!
//! ROMS writes time as `"<unit> since <epoch>"` offsets. They are decoded to
//! [`NaiveDateTime`] and averaged as integer nanoseconds relative to the first
//! timestamp of the set, so epochs such as `0001-01-01` stay in range.

use crate::errors::{Result, RomsMonthlyError};
use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime};

/// Calendars whose dates coincide with chrono's proleptic Gregorian calendar
/// for the years ROMS runs cover.
const SUPPORTED_CALENDARS: [&str; 4] = ["standard", "gregorian", "proleptic_gregorian", "none"];

/// Parsed CF time units
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeUnits {
    /// Length of one unit in seconds
    pub unit_seconds: i64,
    /// Reference instant the offsets count from
    pub epoch: NaiveDateTime,
}

impl TimeUnits {
    /// Parses a units string such as `"seconds since 2000-01-01 00:00:00"`.
    pub fn parse(var: &str, units: &str) -> Result<Self> {
        let invalid = || RomsMonthlyError::InvalidTimeUnits {
            var: var.to_string(),
            units: units.to_string(),
        };

        let lower = units.trim().to_ascii_lowercase();
        let (unit, reference) = lower.split_once(" since ").ok_or_else(invalid)?;

        let unit_seconds = match unit.trim() {
            "second" | "seconds" | "sec" | "secs" | "s" => 1,
            "minute" | "minutes" | "min" | "mins" => 60,
            "hour" | "hours" | "hr" | "hrs" | "h" => 3_600,
            "day" | "days" | "d" => 86_400,
            _ => return Err(invalid()),
        };

        let epoch = parse_reference(reference).ok_or_else(invalid)?;
        Ok(Self { unit_seconds, epoch })
    }

    /// Converts a raw offset to a timestamp.
    ///
    /// Whole seconds and the sub-second remainder are added separately, so
    /// offsets spanning millennia (`seconds since 0001-01-01`) decode.
    pub fn decode(&self, value: f64) -> Option<NaiveDateTime> {
        let total = value * self.unit_seconds as f64;
        if !total.is_finite() || total.abs() >= i64::MAX as f64 {
            return None;
        }
        let whole = total.trunc();
        let nanos = ((total - whole) * 1e9).round() as i64;
        self.epoch
            .checked_add_signed(Duration::try_seconds(whole as i64)?)?
            .checked_add_signed(Duration::nanoseconds(nanos))
    }
}

fn parse_reference(reference: &str) -> Option<NaiveDateTime> {
    let cleaned = reference
        .trim()
        .trim_end_matches("utc")
        .trim_end_matches('z')
        .trim()
        .replace('t', " ");

    // Offsets like "+00:00" are dropped; ROMS epochs are always UTC.
    let cleaned = match cleaned.rfind('+') {
        Some(pos) if pos > 10 => cleaned[..pos].trim().to_string(),
        _ => cleaned,
    };

    for format in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(&cleaned, format) {
            return Some(parsed);
        }
    }
    NaiveDate::parse_from_str(&cleaned, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}

/// Checks the `calendar` attribute of a time variable.
pub fn check_calendar(var: &str, calendar: Option<&str>) -> Result<()> {
    match calendar {
        None => Ok(()),
        Some(name) if SUPPORTED_CALENDARS.contains(&name.trim().to_ascii_lowercase().as_str()) => {
            Ok(())
        }
        Some(name) => Err(RomsMonthlyError::UnsupportedCalendar {
            var: var.to_string(),
            calendar: name.to_string(),
        }),
    }
}

/// Decodes every raw offset, failing on the first undecodable value.
pub fn decode_all(var: &str, units: &TimeUnits, raw: &[f64]) -> Result<Vec<NaiveDateTime>> {
    raw.iter()
        .map(|&value| {
            units.decode(value).ok_or_else(|| {
                RomsMonthlyError::Generic(format!(
                    "Time value {} of '{}' cannot be represented as a date",
                    value, var
                ))
            })
        })
        .collect()
}

/// Seconds since 1970-01-01T00:00:00, with the sub-second part as a fraction.
pub fn seconds_since_unix_epoch(time: &NaiveDateTime) -> f64 {
    let utc = time.and_utc();
    utc.timestamp() as f64 + f64::from(utc.timestamp_subsec_nanos()) / 1e9
}

fn offset_nanos(from: &NaiveDateTime, to: &NaiveDateTime) -> i128 {
    let delta = to.signed_duration_since(*from);
    i128::from(delta.num_seconds()) * NANOS_PER_SECOND + i128::from(delta.subsec_nanos())
}

const NANOS_PER_SECOND: i128 = 1_000_000_000;

/// Arithmetic mean of a set of timestamps; `None` when the set is empty.
pub fn mean_time<'a, I>(times: I) -> Option<NaiveDateTime>
where
    I: IntoIterator<Item = &'a NaiveDateTime>,
{
    let mut times = times.into_iter();
    let first = *times.next()?;
    let mut sum: i128 = 0;
    let mut count: i128 = 1;
    for time in times {
        sum += offset_nanos(&first, time);
        count += 1;
    }
    let mean = sum.div_euclid(count);
    let seconds = i64::try_from(mean.div_euclid(NANOS_PER_SECOND)).ok()?;
    let nanos = i64::try_from(mean.rem_euclid(NANOS_PER_SECOND)).ok()?;
    first
        .checked_add_signed(Duration::try_seconds(seconds)?)?
        .checked_add_signed(Duration::nanoseconds(nanos))
}

/// Mean of two optional timestamps, ignoring missing ones.
pub fn merge_time_means(
    stored: Option<NaiveDateTime>,
    incoming: Option<NaiveDateTime>,
) -> Option<NaiveDateTime> {
    match (stored, incoming) {
        (Some(a), Some(b)) => mean_time([&a, &b]),
        (Some(a), None) => Some(a),
        (None, Some(b)) => Some(b),
        (None, None) => None,
    }
}

/// Smallest and largest timestamp of a non-empty axis.
pub fn time_extent(times: &[NaiveDateTime]) -> Option<(NaiveDateTime, NaiveDateTime)> {
    let min = times.iter().min()?;
    let max = times.iter().max()?;
    Some((*min, *max))
}

/// Year of the mean timestamp of an axis.
pub fn mean_year(times: &[NaiveDateTime]) -> Option<i32> {
    mean_time(times).map(|t| t.year())
}
