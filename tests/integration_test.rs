use chrono::{NaiveDate, NaiveDateTime};
use netcdf::{create, open, AttributeValue};
use roms_monthly::prelude::*;
use roms_monthly::SnapshotNaming;
use std::path::Path;
use tempfile::tempdir;

const FILL: f64 = 1.0e37;

fn at(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(h, 0, 0)
        .unwrap()
}

fn seconds_since(base: NaiveDateTime, t: NaiveDateTime) -> f64 {
    (t - base).num_seconds() as f64
}

/// Writes a small ROMS-like history file: `zeta(ocean_time, xi_rho)` plus a
/// static bathymetry `h(xi_rho)`.
fn write_snapshot(dir: &Path, number: u32, times: &[NaiveDateTime], zeta: &[[f64; 3]]) {
    let path = dir.join(SnapshotNaming::default().file_name(number));
    let base = at(2000, 1, 1, 0);

    let mut file = create(&path).expect("Failed to create NetCDF file");
    file.add_dimension("ocean_time", times.len())
        .expect("Failed to add dimension ocean_time");
    file.add_dimension("xi_rho", 3)
        .expect("Failed to add dimension xi_rho");
    file.add_attribute("title", "synthetic ROMS history")
        .expect("Failed to add global attribute");

    let raw_times: Vec<f64> = times.iter().map(|t| seconds_since(base, *t)).collect();
    let mut time_var = file
        .add_variable::<f64>("ocean_time", &["ocean_time"])
        .expect("Failed to add ocean_time");
    time_var
        .put_attribute("units", "seconds since 2000-01-01 00:00:00")
        .unwrap();
    time_var.put_attribute("calendar", "gregorian").unwrap();
    time_var.put_values(&raw_times, ..).expect("Failed to write times");

    let flat: Vec<f64> = zeta.iter().flat_map(|row| row.iter().copied()).collect();
    let mut zeta_var = file
        .add_variable::<f64>("zeta", &["ocean_time", "xi_rho"])
        .expect("Failed to add zeta");
    zeta_var.set_fill_value(FILL).unwrap();
    zeta_var.put_attribute("units", "meter").unwrap();
    zeta_var.put_values(&flat, ..).expect("Failed to write zeta");

    let mut h_var = file
        .add_variable::<f64>("h", &["xi_rho"])
        .expect("Failed to add h");
    h_var.put_attribute("units", "meter").unwrap();
    h_var.put_values(&[5.0_f64, 6.0, 7.0][..], ..).expect("Failed to write h");
}

/// Three files for 2006:
/// 1. Mar 2, 4, 6 (single month), one filled value
/// 2. Mar 30 12:00 .. Apr 3 (spans March and April)
/// 3. Dec 30 2006 .. Jan 2 2007 (latest sample outside 2006)
fn write_run(dir: &Path) {
    write_snapshot(
        dir,
        1,
        &[at(2006, 3, 2, 0), at(2006, 3, 4, 0), at(2006, 3, 6, 0)],
        &[[1.0, 1.0, FILL], [2.0, 2.0, 2.0], [3.0, 3.0, 3.0]],
    );
    write_snapshot(
        dir,
        2,
        &[at(2006, 3, 30, 12), at(2006, 4, 1, 0), at(2006, 4, 3, 0)],
        &[[10.0, 10.0, 10.0], [20.0, 20.0, 20.0], [40.0, 40.0, 40.0]],
    );
    write_snapshot(
        dir,
        3,
        &[at(2006, 12, 30, 0), at(2007, 1, 2, 0)],
        &[[100.0, 100.0, 100.0], [200.0, 200.0, 200.0]],
    );
}

#[test]
fn test_create_annual_end_to_end() -> Result<()> {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    write_run(temp_dir.path());

    let series = create_annual(2006, temp_dir.path(), 1, 4, LeapYearOption::Unset)?;

    assert_eq!(series.year, 2006);
    assert_eq!(series.files_processed, 3);
    assert_eq!(series.times.len(), 12);
    for (i, t) in series.times.iter().enumerate() {
        assert_eq!(*t, at(2006, i as u32 + 1, 15, 12));
    }

    let zeta = series.variable("zeta").expect("zeta missing");
    assert_eq!(zeta.dims, vec!["time".to_string(), "xi_rho".to_string()]);
    assert_eq!(zeta.data.shape(), &[12, 3]);

    // March: file 1 mean (2, 2, 2.5) merged with file 2's Mar 30 sample (10)
    let march = series.month_values("zeta", 3).unwrap();
    assert_eq!(march[[0]], 6.0);
    assert_eq!(march[[1]], 6.0);
    assert_eq!(march[[2]], 6.25);

    // April: Apr 1 and Apr 3 of file 2
    let april = series.month_values("zeta", 4).unwrap();
    assert!(april.iter().all(|&v| v == 30.0));

    // File 3 ends in 2007 and contributes nothing
    assert!(series.is_month_missing(12));
    assert!(series.month_values("zeta", 12).unwrap().iter().all(|v| v.is_nan()));
    assert!(series.month_values("zeta", 1).unwrap().iter().all(|v| v.is_nan()));
    assert_eq!(series.populated_months(), vec![3, 4]);
    assert_eq!(series.contributions[2], 2);

    // Static bathymetry is carried once, without a time axis
    assert_eq!(series.static_variables.len(), 1);
    assert_eq!(series.static_variables[0].layout.name, "h");
    assert_eq!(series.static_variables[0].data.shape(), &[3]);

    Ok(())
}

#[test]
fn test_written_series_roundtrips_through_netcdf() -> Result<()> {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    write_run(temp_dir.path());
    let series = create_annual(2006, temp_dir.path(), 1, 4, false)?;

    let output_path = temp_dir.path().join("roms_2006_monthly.nc");
    NetCDFWriter::new(&output_path).write_series(&series)?;
    // A second write replaces the first
    NetCDFWriter::new(&output_path).write_series(&series)?;

    let file = open(&output_path)?;

    let time = file.variable("time").expect("time missing");
    let seconds = time.get_values::<f64, _>(..)?;
    assert_eq!(seconds.len(), 12);
    let epoch = at(1970, 1, 1, 0);
    assert_eq!(seconds[0], seconds_since(epoch, at(2006, 1, 15, 12)));
    assert_eq!(seconds[11], seconds_since(epoch, at(2006, 12, 15, 12)));

    let zeta = file.variable("zeta").expect("zeta missing");
    let dims: Vec<String> = zeta.dimensions().iter().map(|d| d.name()).collect();
    assert_eq!(dims, vec!["time".to_string(), "xi_rho".to_string()]);
    let values = zeta.get_values::<f64, _>(..)?;
    assert_eq!(values.len(), 36);
    assert_eq!(values[3 * 3], 30.0);
    assert!(matches!(
        zeta.attribute("units").map(|a| a.value()),
        Some(Ok(AttributeValue::Str(ref s))) if s == "meter"
    ));

    let h = file.variable("h").expect("h missing");
    assert_eq!(h.get_values::<f64, _>(..)?, vec![5.0, 6.0, 7.0]);

    let title = file.attribute("title").expect("title missing").value()?;
    assert!(matches!(title, AttributeValue::Str(ref s) if s == "synthetic ROMS history"));
    let history = file.attribute("history").expect("history missing").value()?;
    assert!(matches!(history, AttributeValue::Str(ref s) if s.contains("monthly means for 2006")));

    Ok(())
}

#[test]
fn test_missing_file_is_fatal() {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    write_run(temp_dir.path());

    let result = create_annual(2006, temp_dir.path(), 1, 6, LeapYearOption::Unset);
    assert!(matches!(result, Err(RomsMonthlyError::NetCDFError(_))));
}

#[test]
fn test_empty_file_range_is_rejected() {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    write_run(temp_dir.path());

    let result = create_annual(2006, temp_dir.path(), 3, 3, LeapYearOption::Unset);
    assert!(matches!(
        result,
        Err(RomsMonthlyError::InvalidFileRange { start: 3, end: 3 })
    ));
}

#[test]
fn test_config_with_custom_naming() -> Result<()> {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    write_run(temp_dir.path());
    for n in 1..4 {
        let from = temp_dir.path().join(SnapshotNaming::default().file_name(n));
        let to = temp_dir.path().join(format!("ocean_avg_{n:04}.nc"));
        std::fs::rename(from, to)?;
    }

    let series = AnnualConfig::new(2006, temp_dir.path(), 1, 4)
        .with_prefix("ocean_avg_")
        .run()?;
    assert_eq!(series.populated_months(), vec![3, 4]);
    Ok(())
}
