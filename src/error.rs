// 🚨 Error Taxonomy - Hard failures of the ingest pipeline
//
// Soft parsing ambiguity (unknown categories, unparseable flags) never lands
// here: normalizers degrade those to "" / None. Only contract violations do.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum IngestError {
    // ===== Data contract =====
    /// A normalizer received a value outside its accepted domain
    #[error("Value must be {expected}, got {found}")]
    InvalidInputType {
        expected: &'static str,
        found: String,
    },

    #[error("Required column missing from source: {0}")]
    MissingColumn(String),

    // ===== Source file =====
    #[error("{} file not found", .0.display())]
    MissingSourceFile(PathBuf),

    #[error("CSV parse failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("File read failed: {0}")]
    Io(#[from] std::io::Error),

    // ===== Store =====
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
}

impl IngestError {
    /// True for failures the binary reports with a dedicated exit status
    pub fn is_missing_source(&self) -> bool {
        matches!(self, IngestError::MissingSourceFile(_))
    }
}

pub type IngestResult<T> = Result<T, IngestError>;
