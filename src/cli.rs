//! Defines command-line interface options using `clap` for roms-monthly.

use clap::Parser;
use roms_monthly::calendar::LeapYearOption;
use roms_monthly::data_source::{DEFAULT_PREFIX, DEFAULT_SUFFIX, DEFAULT_TIME_VARIABLE};
use roms_monthly::AnnualConfig;
use std::path::PathBuf;

/// Calendar-month means of ROMS history files for one year
#[derive(Parser, Debug)]
#[command(
    version,
    name = "roms-monthly",
    about = "Assemble calendar-month means of ROMS snapshot files into a 12-step annual series"
)]
pub struct Args {
    /// Target year
    #[arg(short, long)]
    pub year: i32,

    /// Directory holding the snapshot files
    #[arg(short, long)]
    pub dir: PathBuf,

    /// First snapshot number (inclusive)
    #[arg(short, long)]
    pub start: u32,

    /// Last snapshot number (exclusive)
    #[arg(short, long)]
    pub end: u32,

    /// Whether the year is a leap year (true/false). Any other value is ignored with a warning.
    #[arg(long)]
    pub leap_year: Option<String>,

    /// File name prefix before the 4-digit snapshot number
    #[arg(long, default_value = DEFAULT_PREFIX)]
    pub prefix: String,

    /// File name suffix after the 4-digit snapshot number
    #[arg(long, default_value = DEFAULT_SUFFIX)]
    pub suffix: String,

    /// Name of the time coordinate
    #[arg(long, default_value = DEFAULT_TIME_VARIABLE)]
    pub time_variable: String,

    /// Path to save the annual series as NetCDF. If not set, prints a summary.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// List the template file's layout before processing
    #[arg(long)]
    pub list_vars: bool,

    /// Enable verbose output.
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

impl Args {
    /// Library configuration for these arguments
    pub fn to_config(&self) -> AnnualConfig {
        AnnualConfig::new(self.year, &self.dir, self.start, self.end)
            .with_leap_year(LeapYearOption::from_raw(self.leap_year.as_deref()))
            .with_prefix(&self.prefix)
            .with_suffix(&self.suffix)
            .with_time_variable(&self.time_variable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_args() {
        let args = Args::try_parse_from([
            "roms-monthly",
            "--year",
            "2006",
            "--dir",
            "/data/run",
            "--start",
            "74",
            "--end",
            "100",
        ])
        .unwrap();
        let config = args.to_config();
        assert_eq!(config.year, 2006);
        assert_eq!(config.file_start, 74);
        assert_eq!(config.file_end, 100);
        assert_eq!(config.leap_year, LeapYearOption::Unset);
        assert_eq!(config.naming.file_name(74), "ocean_his_0074.nc");
        assert_eq!(config.time_variable, "ocean_time");
    }

    #[test]
    fn test_leap_year_values() {
        let base = ["roms-monthly", "-y", "2008", "-d", ".", "-s", "1", "-e", "2", "--leap-year"];

        let args = Args::try_parse_from(base.iter().copied().chain(["false"])).unwrap();
        assert_eq!(args.to_config().leap_year, LeapYearOption::Explicit(false));

        let args = Args::try_parse_from(base.iter().copied().chain(["maybe"])).unwrap();
        assert_eq!(
            args.to_config().leap_year,
            LeapYearOption::Invalid("maybe".to_string())
        );
    }
}
