//! roms_monthly: calendar-month means of ROMS snapshot output
//!
//! ROMS writes history files (`ocean_his_####.nc`) whose time coverage rarely
//! lines up with calendar months. This library assigns every time sample to
//! its calendar month of a target year, keeps a running mean per month and
//! assembles the twelve months into one annual series stamped on the 15th of
//! each month.
//!
//! ## Module Organization
//!
//! - [`calendar`]: month lengths, leap-year policy, canonical timestamps
//! - [`time_axis`]: decoding and averaging of the `ocean_time` coordinate
//! - [`field`]: time-indexed snapshot data and its time reduction
//! - [`statistics`]: NaN-skipping means
//! - [`accumulator`]: the twelve monthly running-mean buckets
//! - [`assembler`]: file classification and the month loop
//! - [`series`]: the assembled 12-step result
//! - [`metadata`]: field layout of the template file
//! - [`data_source`]: the snapshot source abstraction
//! - [`netcdf_io`]: NetCDF reading and writing
//! - [`errors`]: centralized error handling
//!
//! ## Usage
//!
//! ```rust,no_run
//! use roms_monthly::prelude::*;
//!
//! // Snapshots 74..=99 of a 2006 run; no leap-year flag given
//! let series = create_annual(2006, "/data/roms/apr2024_2005/", 74, 100, LeapYearOption::Unset).unwrap();
//!
//! for month in series.populated_months() {
//!     println!("month {month} has data");
//! }
//!
//! NetCDFWriter::new(std::path::Path::new("roms_2006_monthly.nc"))
//!     .write_series(&series)
//!     .unwrap();
//! ```

// Core modules
pub mod accumulator;
pub mod assembler;
pub mod calendar;
pub mod data_source;
pub mod errors;
pub mod field;
pub mod metadata;
pub mod netcdf_io;
pub mod series;
pub mod statistics;
pub mod time_axis;

// Direct re-exports for the public API
pub use accumulator::{MonthBucket, MonthlyAccumulator};
pub use assembler::{classify, create_annual, AnnualAssembler, AnnualConfig, FileClass, MonthSegment};
pub use calendar::{month_day_range, resolve_leap_year, LeapYearOption, LeapYearResolution, LeapYearSource};
pub use data_source::{SnapshotNaming, SnapshotSource};
pub use errors::{Result, RomsMonthlyError};
pub use field::{FieldVariable, ReducedField, ReducedVariable, TimeIndexedField};
pub use metadata::FieldLayout;
pub use netcdf_io::{NetCDFSnapshotSource, NetCDFWriter};
pub use series::{AnnualSeries, SeriesVariable};

// High-level convenience API
pub mod prelude {
    //! Commonly used imports for convenience
    pub use crate::assembler::{create_annual, AnnualAssembler, AnnualConfig};
    pub use crate::calendar::LeapYearOption;
    pub use crate::data_source::SnapshotSource;
    pub use crate::errors::{Result, RomsMonthlyError};
    pub use crate::netcdf_io::NetCDFWriter;
    pub use crate::series::AnnualSeries;
}
