// 📂 Tabular Source - CSV export → raw cells
//
// No typing, no cleaning: every field becomes a CellValue and the header row
// is kept as-is. Column-name trimming belongs to the preprocessor.

use crate::cell::CellValue;
use crate::error::{IngestError, IngestResult};
use csv::ReaderBuilder;
use std::io::Read;
use std::path::Path;
use tracing::debug;

/// A header row plus rows of raw cells, all rows as wide as the header
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
}

impl RawTable {
    /// Rows are padded with Null (or cut) to the header's width
    pub fn new(headers: Vec<String>, mut rows: Vec<Vec<CellValue>>) -> Self {
        let width = headers.len();
        for row in rows.iter_mut() {
            row.resize(width, CellValue::Null);
        }
        RawTable { headers, rows }
    }

    /// Cell at `column`, or Null when the row is narrower than that
    pub fn cell(row: &[CellValue], column: usize) -> &CellValue {
        const MISSING: &CellValue = &CellValue::Null;
        row.get(column).unwrap_or(MISSING)
    }

    /// Position of a column by exact name
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Load a CSV file. A missing file is reported as `MissingSourceFile` so the
/// caller can tell it apart from a malformed one.
pub fn load_table(csv_path: &Path) -> IngestResult<RawTable> {
    if !csv_path.exists() {
        return Err(IngestError::MissingSourceFile(csv_path.to_path_buf()));
    }

    let file = std::fs::File::open(csv_path)?;
    let table = read_table(file)?;

    debug!(
        path = %csv_path.display(),
        columns = table.headers.len(),
        rows = table.len(),
        "Loaded source table"
    );

    Ok(table)
}

/// Read CSV from any reader (first line is the header row)
pub fn read_table<R: Read>(reader: R) -> IngestResult<RawTable> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true) // RawTable::new pads or cuts to the header width
        .from_reader(reader);

    let headers: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();

    let mut rows = Vec::new();
    for result in rdr.records() {
        let record = result?;
        rows.push(record.iter().map(CellValue::from_csv).collect());
    }

    Ok(RawTable::new(headers, rows))
}
