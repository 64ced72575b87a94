//! Centralized error handling for roms_monthly
//!
//! Every failure in the pipeline is fatal to the run, so the library returns
//! these errors to the caller instead of skipping files.

use std::fmt;

/// Main error type for monthly averaging operations
#[derive(Debug)]
pub enum RomsMonthlyError {
    /// NetCDF file operation errors
    NetCDFError(netcdf::Error),

    /// I/O operation errors
    IoError(std::io::Error),

    /// Variable not found in NetCDF file
    VariableNotFound { var: String },

    /// Dimension not found in variable
    DimensionNotFound { var: String, dim: String },

    /// Time coordinate carries units that cannot be decoded
    InvalidTimeUnits { var: String, units: String },

    /// Time coordinate uses a calendar other than the standard one
    UnsupportedCalendar { var: String, calendar: String },

    /// Snapshot has no time samples
    EmptyTimeAxis { file: String },

    /// A calendar date could not be constructed (e.g. Feb 29 in a common year)
    InvalidDate { year: i32, month: u32, day: u32 },

    /// Month number outside 1..=12
    InvalidMonth(u32),

    /// File number range is empty
    InvalidFileRange { start: u32, end: u32 },

    /// A contribution's shape differs from the bucket it is merged into
    ShapeMismatch {
        var: String,
        expected: Vec<usize>,
        found: Vec<usize>,
    },

    /// A contribution's variable set differs from the bucket it is merged into
    VariableMismatch { var: String, message: String },

    /// Array shape or dimension error
    ArrayError(ndarray::ShapeError),

    /// Generic error
    Generic(String),
}

impl fmt::Display for RomsMonthlyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RomsMonthlyError::NetCDFError(e) => write!(f, "NetCDF error: {}", e),
            RomsMonthlyError::IoError(e) => write!(f, "I/O error: {}", e),
            RomsMonthlyError::VariableNotFound { var } => {
                write!(f, "Variable '{}' not found in file", var)
            }
            RomsMonthlyError::DimensionNotFound { var, dim } => {
                write!(f, "Dimension '{}' not found in variable '{}'", dim, var)
            }
            RomsMonthlyError::InvalidTimeUnits { var, units } => {
                write!(f, "Cannot decode time units '{}' of variable '{}'", units, var)
            }
            RomsMonthlyError::UnsupportedCalendar { var, calendar } => {
                write!(f, "Unsupported calendar '{}' on variable '{}'", calendar, var)
            }
            RomsMonthlyError::EmptyTimeAxis { file } => {
                write!(f, "Time axis of '{}' has no samples", file)
            }
            RomsMonthlyError::InvalidDate { year, month, day } => {
                write!(f, "Invalid calendar date {:04}-{:02}-{:02}", year, month, day)
            }
            RomsMonthlyError::InvalidMonth(month) => {
                write!(f, "Month {} is outside 1..=12", month)
            }
            RomsMonthlyError::InvalidFileRange { start, end } => {
                write!(f, "Empty file range: start {} must be below end {}", start, end)
            }
            RomsMonthlyError::ShapeMismatch {
                var,
                expected,
                found,
            } => write!(
                f,
                "Shape mismatch for '{}': bucket holds {:?}, contribution has {:?}",
                var, expected, found
            ),
            RomsMonthlyError::VariableMismatch { var, message } => {
                write!(f, "Variable mismatch for '{}': {}", var, message)
            }
            RomsMonthlyError::ArrayError(e) => write!(f, "Array error: {}", e),
            RomsMonthlyError::Generic(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for RomsMonthlyError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RomsMonthlyError::NetCDFError(e) => Some(e),
            RomsMonthlyError::IoError(e) => Some(e),
            RomsMonthlyError::ArrayError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<netcdf::Error> for RomsMonthlyError {
    fn from(error: netcdf::Error) -> Self {
        RomsMonthlyError::NetCDFError(error)
    }
}

impl From<std::io::Error> for RomsMonthlyError {
    fn from(error: std::io::Error) -> Self {
        RomsMonthlyError::IoError(error)
    }
}

impl From<ndarray::ShapeError> for RomsMonthlyError {
    fn from(error: ndarray::ShapeError) -> Self {
        RomsMonthlyError::ArrayError(error)
    }
}

impl From<String> for RomsMonthlyError {
    fn from(error: String) -> Self {
        RomsMonthlyError::Generic(error)
    }
}

/// Result type alias for roms_monthly operations
pub type Result<T> = std::result::Result<T, RomsMonthlyError>;
