// 🧽 Row Preprocessor - Raw table → cleaned application records
//
// Pipeline (in order):
//   1. Trim column names
//   2. Drop exact-duplicate rows (fingerprint of every raw cell)
//   3. Drop rows with a missing / blank student number
//   4. Normalize ceeb_code, application_result, application_type, attending

use crate::cell::CellValue;
use crate::error::{IngestError, IngestResult};
use crate::normalizers::{
    clean_application_result, convert_attending_to_boolean, expand_application_type,
    is_valid_ceeb_code,
};
use crate::source::RawTable;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use tracing::{error, info, warn};

pub const STUDENT_NUMBER: &str = "student_number";
pub const CEEB_CODE: &str = "ceeb_code";
pub const COLLEGE_NAME: &str = "college_name";
pub const APPLICATION_RESULT: &str = "application_result";
pub const APPLICATION_TYPE: &str = "application_type";
pub const ATTENDING: &str = "attending";

pub const REQUIRED_COLUMNS: [&str; 6] = [
    STUDENT_NUMBER,
    CEEB_CODE,
    COLLEGE_NAME,
    APPLICATION_RESULT,
    APPLICATION_TYPE,
    ATTENDING,
];

// ============================================================================
// OUTPUT TYPES
// ============================================================================

/// One cleaned source row, ready for reconciliation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicationRecord {
    /// 1-based position among the source's data rows
    pub row_number: usize,
    pub student_number: String,
    /// Exactly 4 digits, or "" when the source code was unusable
    pub ceeb_code: String,
    pub college_name: String,
    pub application_result: String,
    pub application_type: String,
    pub attending: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PreprocessSummary {
    pub rows_read: usize,
    pub duplicates_dropped: usize,
    pub blank_student_dropped: usize,
    pub rows_kept: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Preprocessed {
    pub records: Vec<ApplicationRecord>,
    pub summary: PreprocessSummary,
}

// ============================================================================
// COLUMN RESOLUTION
// ============================================================================

struct Columns {
    student_number: usize,
    ceeb_code: usize,
    college_name: usize,
    application_result: usize,
    application_type: usize,
    attending: usize,
}

impl Columns {
    fn resolve(table: &RawTable) -> IngestResult<Self> {
        let find = |name: &str| {
            table
                .column_index(name)
                .ok_or_else(|| IngestError::MissingColumn(name.to_string()))
        };

        Ok(Columns {
            student_number: find(STUDENT_NUMBER)?,
            ceeb_code: find(CEEB_CODE)?,
            college_name: find(COLLEGE_NAME)?,
            application_result: find(APPLICATION_RESULT)?,
            application_type: find(APPLICATION_TYPE)?,
            attending: find(ATTENDING)?,
        })
    }
}

// ============================================================================
// STEPS
// ============================================================================

/// Strip incidental whitespace around column names
pub fn trim_headers(table: &mut RawTable) {
    for header in table.headers.iter_mut() {
        let trimmed = header.trim();
        if trimmed.len() != header.len() {
            *header = trimmed.to_string();
        }
    }
}

/// SHA-256 over every cell, tagged with its shape so "1" and 1 differ
pub fn row_fingerprint(row: &[CellValue]) -> String {
    let mut hasher = Sha256::new();
    for cell in row {
        hasher.update(cell.type_name().as_bytes());
        hasher.update([0x1e]);
        hasher.update(cell.render().as_bytes());
        hasher.update([0x1f]);
    }
    format!("{:x}", hasher.finalize())
}

/// Keep the first occurrence of each exact row, preserving order.
/// Returns the number of rows dropped.
pub fn drop_duplicate_rows(rows: &mut Vec<(usize, Vec<CellValue>)>) -> usize {
    let before = rows.len();
    let mut seen = HashSet::new();
    rows.retain(|(_, row)| seen.insert(row_fingerprint(row)));
    before - rows.len()
}

/// Run the whole preprocessor over a freshly loaded table
pub fn preprocess(mut table: RawTable) -> IngestResult<Preprocessed> {
    trim_headers(&mut table);
    let columns = Columns::resolve(&table)?;

    let rows_read = table.rows.len();
    let mut rows: Vec<(usize, Vec<CellValue>)> = table
        .rows
        .into_iter()
        .enumerate()
        .map(|(idx, row)| (idx + 1, row))
        .collect();

    let duplicates_dropped = drop_duplicate_rows(&mut rows);

    let before_filter = rows.len();
    rows.retain(|(_, row)| !RawTable::cell(row, columns.student_number).is_blank());
    let blank_student_dropped = before_filter - rows.len();

    let records = rows
        .iter()
        .map(|(row_number, row)| normalize_row(*row_number, row, &columns))
        .collect::<IngestResult<Vec<_>>>()?;

    if duplicates_dropped > 0 || blank_student_dropped > 0 {
        warn!(
            duplicates_dropped,
            blank_student_dropped, "Dropped rows during preprocessing"
        );
    }

    let summary = PreprocessSummary {
        rows_read,
        duplicates_dropped,
        blank_student_dropped,
        rows_kept: records.len(),
    };
    info!(rows_read, rows_kept = summary.rows_kept, "Preprocessing complete");

    Ok(Preprocessed { records, summary })
}

fn normalize_row(
    row_number: usize,
    row: &[CellValue],
    columns: &Columns,
) -> IngestResult<ApplicationRecord> {
    let with_row = |column: &'static str| {
        move |e: IngestError| {
            error!(row = row_number, column, error = %e, "Normalization failed");
            e
        }
    };

    let cell = |column: usize| RawTable::cell(row, column);

    let ceeb_code = is_valid_ceeb_code(&cell(columns.ceeb_code).or_empty_text())
        .map_err(with_row(CEEB_CODE))?;
    let application_result =
        clean_application_result(&cell(columns.application_result).or_empty_text())
            .map_err(with_row(APPLICATION_RESULT))?;
    let application_type = expand_application_type(&cell(columns.application_type).or_empty_text())
        .map_err(with_row(APPLICATION_TYPE))?;

    Ok(ApplicationRecord {
        row_number,
        student_number: cell(columns.student_number).render().trim().to_string(),
        ceeb_code,
        college_name: cell(columns.college_name).render().trim().to_string(),
        application_result,
        application_type,
        attending: convert_attending_to_boolean(cell(columns.attending)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::read_table;

    fn table(csv: &str) -> RawTable {
        read_table(csv.as_bytes()).unwrap()
    }

    const HEADER: &str =
        "student_number , ceeb_code,college_name ,application_result,application_type, attending\n";

    #[test]
    fn test_trim_headers() {
        let mut t = table(HEADER);
        trim_headers(&mut t);
        assert_eq!(t.headers, REQUIRED_COLUMNS.to_vec());
    }

    #[test]
    fn test_preprocess_normalizes_columns() {
        let csv = format!(
            "{}S100,1234a,Reed College,ACCEPTED,ea2,yes\nS101,123,Pomona, unknown ,Rolling,\n",
            HEADER
        );
        let out = preprocess(table(&csv)).unwrap();

        assert_eq!(out.records.len(), 2);
        let first = &out.records[0];
        assert_eq!(first.row_number, 1);
        assert_eq!(first.student_number, "S100");
        assert_eq!(first.ceeb_code, "1234");
        assert_eq!(first.college_name, "Reed College");
        assert_eq!(first.application_result, "accepted");
        assert_eq!(first.application_type, "Early Action II");
        assert_eq!(first.attending, Some(true));

        let second = &out.records[1];
        assert_eq!(second.ceeb_code, "");
        assert_eq!(second.application_result, "");
        assert_eq!(second.application_type, "Rolling Decision");
        assert_eq!(second.attending, None);
    }

    #[test]
    fn test_preprocess_fills_missing_text_cells() {
        let csv = format!("{}S1,,,,,\n", HEADER);
        let out = preprocess(table(&csv)).unwrap();

        let record = &out.records[0];
        assert_eq!(record.ceeb_code, "");
        assert_eq!(record.college_name, "");
        assert_eq!(record.application_result, "");
        assert_eq!(record.application_type, "");
        assert_eq!(record.attending, None);
    }

    #[test]
    fn test_preprocess_drops_duplicates_and_blank_students() {
        let csv = format!(
            "{}S1,1234,Reed,accepted,ED,no\nS1,1234,Reed,accepted,ED,no\n,1234,Reed,denied,RD,no\n   ,5555,Reed,denied,RD,no\nS2,5555,Bard,denied,RD,0\n",
            HEADER
        );
        let out = preprocess(table(&csv)).unwrap();

        assert_eq!(out.summary.rows_read, 5);
        assert_eq!(out.summary.duplicates_dropped, 1);
        assert_eq!(out.summary.blank_student_dropped, 2);
        assert_eq!(out.summary.rows_kept, 2);
        let numbers: Vec<&str> = out.records.iter().map(|r| r.student_number.as_str()).collect();
        assert_eq!(numbers, vec!["S1", "S2"]);
        // Row numbers refer back to the source
        assert_eq!(out.records[1].row_number, 5);
    }

    #[test]
    fn test_near_duplicates_are_kept() {
        let csv = format!(
            "{}S1,1234,Reed,accepted,ED,no\nS1,1234,Reed,accepted,ED,yes\n",
            HEADER
        );
        let out = preprocess(table(&csv)).unwrap();
        assert_eq!(out.summary.duplicates_dropped, 0);
        assert_eq!(out.records.len(), 2);
    }

    #[test]
    fn test_preprocess_missing_column() {
        let csv = "student_number,ceeb_code\nS1,1234\n";
        let err = preprocess(table(csv)).unwrap_err();
        assert!(matches!(err, IngestError::MissingColumn(ref c) if c == "college_name"));
    }

    #[test]
    fn test_preprocess_rejects_non_text_cells() {
        let mut t = table(HEADER);
        t.rows.push(vec![
            CellValue::from("S1"),
            CellValue::Bool(true),
            CellValue::from("Reed"),
            CellValue::from("accepted"),
            CellValue::from("ED"),
            CellValue::from("yes"),
        ]);
        let err = preprocess(t).unwrap_err();
        assert!(matches!(err, IngestError::InvalidInputType { .. }));
    }

    #[test]
    fn test_missing_value_tokens_read_as_blank() {
        let csv = format!(
            "{}NA,1234,Reed,N/A,N/A,yes\nS2,5678,NaN,null,NULL,None\n",
            HEADER
        );
        let out = preprocess(table(&csv)).unwrap();

        // "NA" is not a student number
        assert_eq!(out.summary.blank_student_dropped, 1);
        assert_eq!(out.records.len(), 1);

        let record = &out.records[0];
        assert_eq!(record.student_number, "S2");
        assert_eq!(record.college_name, "");
        assert_eq!(record.application_result, "");
        assert_eq!(record.application_type, "");
        assert_eq!(record.attending, None);
    }

    #[test]
    fn test_preprocess_ragged_rows() {
        let headers: Vec<String> = REQUIRED_COLUMNS.iter().map(|c| c.to_string()).collect();

        // Padded on construction
        let out = preprocess(RawTable::new(headers, vec![vec![CellValue::from("S1")]])).unwrap();
        assert_eq!(out.records[0].student_number, "S1");
        assert_eq!(out.records[0].college_name, "");
        assert_eq!(out.records[0].application_type, "");

        // Narrow rows pushed after construction read as Null
        let mut t = table(HEADER);
        t.rows.push(vec![CellValue::from("S2"), CellValue::from("1234")]);
        t.rows.push(vec![]);
        let out = preprocess(t).unwrap();
        assert_eq!(out.summary.blank_student_dropped, 1);
        assert_eq!(out.records.len(), 1);
        assert_eq!(out.records[0].ceeb_code, "1234");
        assert_eq!(out.records[0].attending, None);
    }

    #[test]
    fn test_row_fingerprint_distinguishes_shapes() {
        let text = vec![CellValue::from("1")];
        let int = vec![CellValue::Integer(1)];
        assert_ne!(row_fingerprint(&text), row_fingerprint(&int));
        assert_eq!(row_fingerprint(&text), row_fingerprint(&[CellValue::from("1")]));
        assert_eq!(row_fingerprint(&text).len(), 64);
    }
}
