//! NetCDF I/O: reading ROMS snapshots and writing the annual series
//!
//! Snapshots are opened, read in full and closed again within a single call,
//! so at most one file's data is held at any time.

use crate::data_source::{SnapshotNaming, SnapshotSource};
use crate::errors::{Result, RomsMonthlyError};
use crate::field::{FieldVariable, TimeIndexedField};
use crate::metadata::{
    attribute_as_str, dimension_names, is_numeric_type, read_attributes, read_layout, variable_data_type,
    FieldLayout, ValueDecoding, DECODING_ATTRIBUTES,
};
use crate::series::{AnnualSeries, OUTPUT_TIME_DIMENSION};
use crate::time_axis::{check_calendar, decode_all, seconds_since_unix_epoch, TimeUnits};
use chrono::{NaiveDateTime, Utc};
use ndarray::{ArrayD, IxDyn};
use netcdf::{AttributeValue, File, FileMut, VariableMut};
use std::fs;
use std::path::{Path, PathBuf};

/// Units of the time coordinate written to output files
pub const OUTPUT_TIME_UNITS: &str = "seconds since 1970-01-01 00:00:00";

/// Snapshot files in one directory
#[derive(Debug, Clone)]
pub struct NetCDFSnapshotSource {
    directory: PathBuf,
    naming: SnapshotNaming,
    time_variable: String,
}

impl NetCDFSnapshotSource {
    pub fn new(directory: &Path, naming: SnapshotNaming, time_variable: &str) -> Self {
        Self {
            directory: directory.to_path_buf(),
            naming,
            time_variable: time_variable.to_string(),
        }
    }

    /// Full path of snapshot `number`
    #[must_use]
    pub fn path(&self, number: u32) -> PathBuf {
        self.directory.join(self.naming.file_name(number))
    }
}

impl SnapshotSource for NetCDFSnapshotSource {
    fn file_name(&self, number: u32) -> String {
        self.naming.file_name(number)
    }

    fn layout(&self, number: u32) -> Result<FieldLayout> {
        let path = self.path(number);
        let file = netcdf::open(&path)?;
        read_layout(&file, &self.naming.file_name(number), &self.time_variable)
    }

    fn load(&self, number: u32) -> Result<TimeIndexedField> {
        read_snapshot(&self.path(number), &self.file_name(number), &self.time_variable)
    }
}

/// Decodes the time coordinate of an open file.
pub fn read_time_axis(file: &File, time_variable: &str) -> Result<Vec<NaiveDateTime>> {
    let var = file
        .variable(time_variable)
        .ok_or_else(|| RomsMonthlyError::VariableNotFound {
            var: time_variable.to_string(),
        })?;

    let attributes = read_attributes(&var);
    let units = attribute_as_str(&attributes, "units").ok_or_else(|| RomsMonthlyError::InvalidTimeUnits {
        var: time_variable.to_string(),
        units: String::new(),
    })?;
    check_calendar(time_variable, attribute_as_str(&attributes, "calendar").as_deref())?;

    let units = TimeUnits::parse(time_variable, &units)?;
    let raw = var.get_values::<f64, _>(..)?;
    decode_all(time_variable, &units, &raw)
}

/// Reads every numeric variable on the time dimension of one snapshot.
pub fn read_snapshot(path: &Path, source: &str, time_variable: &str) -> Result<TimeIndexedField> {
    let file = netcdf::open(path)?;
    let times = read_time_axis(&file, time_variable)?;

    let time_dimension = file
        .variable(time_variable)
        .and_then(|v| dimension_names(&v).into_iter().next())
        .ok_or_else(|| RomsMonthlyError::DimensionNotFound {
            var: time_variable.to_string(),
            dim: time_variable.to_string(),
        })?;

    let mut variables = Vec::new();
    let mut raw_variable_count = 0;

    for var in file.variables() {
        if var.name() == time_variable {
            continue;
        }
        raw_variable_count += 1;

        let dims = dimension_names(&var);
        let Some(time_axis) = dims.iter().position(|d| *d == time_dimension) else {
            continue;
        };
        if !is_numeric_type(&variable_data_type(&var)) {
            continue;
        }

        let shape: Vec<usize> = var.dimensions().iter().map(|d| d.len()).collect();
        let mut values = var.get_values::<f64, _>(..)?;
        ValueDecoding::from_attributes(&read_attributes(&var)).apply(&mut values);
        let data = ArrayD::from_shape_vec(IxDyn(&shape), values)?;

        variables.push(FieldVariable::new(&var.name(), dims, data, time_axis)?);
    }

    log::debug!(
        "🚀 Loaded {} time-dependent variables and {} samples from {}",
        variables.len(),
        times.len(),
        path.display()
    );
    TimeIndexedField::new(source, times, variables, raw_variable_count)
}

/// Writes an [`AnnualSeries`] to a new NetCDF file
pub struct NetCDFWriter<'a> {
    output_path: &'a Path,
}

impl<'a> NetCDFWriter<'a> {
    /// Create a new NetCDF writer
    pub fn new(output_path: &'a Path) -> Self {
        Self { output_path }
    }

    /// Write the series, replacing any existing file at the output path
    pub fn write_series(&self, series: &AnnualSeries) -> Result<()> {
        if self.output_path.exists() {
            fs::remove_file(self.output_path)?;
        }

        let mut file = netcdf::create(self.output_path)?;

        file.add_dimension(OUTPUT_TIME_DIMENSION, series.times.len())?;
        for dim in &series.dimensions {
            file.add_dimension(&dim.name, dim.length)?;
        }

        write_time_coordinate(&mut file, &series.times)?;

        for var in &series.variables {
            let dim_refs: Vec<&str> = var.dims.iter().map(String::as_str).collect();
            let mut new_var = file.add_variable::<f64>(&var.name, &dim_refs)?;
            copy_attributes(&mut new_var, &var.attributes)?;
            let values: Vec<f64> = var.data.iter().copied().collect();
            new_var.put_values(&values, ..)?;
        }

        for var in &series.static_variables {
            let dim_refs: Vec<&str> = var.layout.dims.iter().map(String::as_str).collect();
            let mut new_var = file.add_variable::<f64>(&var.layout.name, &dim_refs)?;
            copy_attributes(&mut new_var, &var.layout.attributes)?;
            let values: Vec<f64> = var.data.iter().copied().collect();
            new_var.put_values(&values, ..)?;
        }

        write_global_attributes(&mut file, series)?;
        log::info!("💾 Wrote {} monthly variables to {}", series.variables.len(), self.output_path.display());
        Ok(())
    }
}

fn write_time_coordinate(file: &mut FileMut, times: &[NaiveDateTime]) -> Result<()> {
    let seconds: Vec<f64> = times.iter().map(seconds_since_unix_epoch).collect();

    let mut time_var = file.add_variable::<f64>(OUTPUT_TIME_DIMENSION, &[OUTPUT_TIME_DIMENSION])?;
    time_var.put_attribute("units", OUTPUT_TIME_UNITS)?;
    time_var.put_attribute("calendar", "proleptic_gregorian")?;
    time_var.put_attribute("long_name", "monthly mean time, mid-month")?;
    time_var.put_values(&seconds, ..)?;
    Ok(())
}

/// Marks NaN as missing and copies attributes that still apply to decoded data.
fn copy_attributes(var: &mut VariableMut, attributes: &[(String, AttributeValue)]) -> Result<()> {
    var.set_fill_value(f64::NAN)?;
    for (name, value) in attributes {
        if DECODING_ATTRIBUTES.contains(&name.as_str()) {
            continue;
        }
        var.put_attribute(name, value.clone())?;
    }
    Ok(())
}

fn write_global_attributes(file: &mut FileMut, series: &AnnualSeries) -> Result<()> {
    let mut history = None;
    for (name, value) in &series.global_attributes {
        if name == "history" {
            if let AttributeValue::Str(previous) = value {
                history = Some(previous.clone());
            }
            continue;
        }
        file.add_attribute(name, value.clone())?;
    }

    let entry = format!(
        "{}: monthly means for {} by roms_monthly from {} snapshot files",
        Utc::now().to_rfc3339(),
        series.year,
        series.files_processed
    );
    let history = match history {
        Some(previous) if !previous.is_empty() => format!("{entry}\n{previous}"),
        _ => entry,
    };
    file.add_attribute("history", history)?;
    Ok(())
}
