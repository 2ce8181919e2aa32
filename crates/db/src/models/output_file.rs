//! Row model for the script's `r__file_names` table.

use lgr_core::manifest::OutputFileRecord;
use sqlx::FromRow;

/// A row of `r__file_names`: logical name and on-disk file name.
#[derive(Debug, Clone, FromRow)]
pub struct OutputFileRow {
    pub name: String,
    pub value: String,
}

impl From<OutputFileRow> for OutputFileRecord {
    fn from(row: OutputFileRow) -> Self {
        Self {
            name: row.name,
            value: row.value,
        }
    }
}
