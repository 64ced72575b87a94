//! Snapshot source abstraction
//!
//! The assembler reads snapshot files only through [`SnapshotSource`], so the
//! bucketing logic runs the same against NetCDF files on disk and against
//! in-memory fields.

use crate::errors::Result;
use crate::field::TimeIndexedField;
use crate::metadata::FieldLayout;

/// Default file name prefix of ROMS history output
pub const DEFAULT_PREFIX: &str = "ocean_his_";

/// Default file name suffix of ROMS history output
pub const DEFAULT_SUFFIX: &str = ".nc";

/// Default name of the ROMS time coordinate
pub const DEFAULT_TIME_VARIABLE: &str = "ocean_time";

/// How snapshot numbers map to file names: `<prefix><number:04><suffix>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotNaming {
    pub prefix: String,
    pub suffix: String,
}

impl Default for SnapshotNaming {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_PREFIX.to_string(),
            suffix: DEFAULT_SUFFIX.to_string(),
        }
    }
}

impl SnapshotNaming {
    /// File name of snapshot `number`, zero-padded to four digits.
    #[must_use]
    pub fn file_name(&self, number: u32) -> String {
        format!("{}{:04}{}", self.prefix, number, self.suffix)
    }
}

/// Read access to numbered snapshot files
pub trait SnapshotSource {
    /// Human-readable name of snapshot `number`
    fn file_name(&self, number: u32) -> String;

    /// Variable names, shapes and static data of snapshot `number`
    fn layout(&self, number: u32) -> Result<FieldLayout>;

    /// Full time-dependent contents of snapshot `number`
    fn load(&self, number: u32) -> Result<TimeIndexedField>;
}
