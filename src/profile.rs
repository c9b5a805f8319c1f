// 📊 Column Profile - Quick look at a raw export before syncing it
//
// Per column: how many cells are filled, how many are missing, how many
// distinct values, and the value counts (most frequent first).

use crate::cell::CellValue;
use crate::preprocess::{row_fingerprint, trim_headers};
use crate::source::RawTable;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueCount {
    pub value: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnProfile {
    pub name: String,
    pub non_null: usize,
    pub nulls: usize,
    pub distinct: usize,
    /// Sorted by count (descending), then value
    pub value_counts: Vec<ValueCount>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableProfile {
    pub rows: usize,
    pub duplicate_rows: usize,
    pub columns: Vec<ColumnProfile>,
}

impl TableProfile {
    pub fn column(&self, name: &str) -> Option<&ColumnProfile> {
        self.columns.iter().find(|c| c.name == name)
    }
}

pub fn profile_table(table: &RawTable) -> TableProfile {
    let mut table = table.clone();
    trim_headers(&mut table);

    let columns = table
        .headers
        .iter()
        .enumerate()
        .map(|(idx, name)| {
            profile_column(name, table.rows.iter().map(|row| RawTable::cell(row, idx)))
        })
        .collect();

    let mut seen = HashSet::new();
    let duplicate_rows = table
        .rows
        .iter()
        .filter(|row| !seen.insert(row_fingerprint(row)))
        .count();

    TableProfile {
        rows: table.rows.len(),
        duplicate_rows,
        columns,
    }
}

fn profile_column<'a>(name: &str, cells: impl Iterator<Item = &'a CellValue>) -> ColumnProfile {
    let mut nulls = 0;
    let mut counts: HashMap<String, usize> = HashMap::new();

    for cell in cells {
        match cell {
            CellValue::Null => nulls += 1,
            other => *counts.entry(other.render()).or_insert(0) += 1,
        }
    }

    let mut value_counts: Vec<ValueCount> = counts
        .into_iter()
        .map(|(value, count)| ValueCount { value, count })
        .collect();
    value_counts.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.value.cmp(&b.value)));

    ColumnProfile {
        name: name.to_string(),
        non_null: value_counts.iter().map(|v| v.count).sum(),
        nulls,
        distinct: value_counts.len(),
        value_counts,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::read_table;

    #[test]
    fn test_profile_table() {
        let csv = " student_number ,attending\nS1,yes\nS2,\nS2,no\nS1,yes\nS3,yes\n";
        let table = read_table(csv.as_bytes()).unwrap();
        let profile = profile_table(&table);

        assert_eq!(profile.rows, 5);
        assert_eq!(profile.duplicate_rows, 1);

        let students = profile.column("student_number").unwrap();
        assert_eq!(students.non_null, 5);
        assert_eq!(students.nulls, 0);
        assert_eq!(students.distinct, 3);

        let attending = profile.column("attending").unwrap();
        assert_eq!(attending.nulls, 1);
        assert_eq!(attending.distinct, 2);
        assert_eq!(
            attending.value_counts,
            vec![
                ValueCount { value: "yes".to_string(), count: 3 },
                ValueCount { value: "no".to_string(), count: 1 },
            ]
        );
    }

    #[test]
    fn test_profile_ragged_rows() {
        let mut table = read_table("student_number,attending\nS1,yes\n".as_bytes()).unwrap();
        table.rows.push(vec![CellValue::from("S2")]);

        let profile = profile_table(&table);
        assert_eq!(profile.rows, 2);
        assert_eq!(profile.column("attending").unwrap().nulls, 1);
    }

    #[test]
    fn test_profile_counts_missing_value_tokens_as_nulls() {
        let csv = "application_result\naccepted\nN/A\nNaN\n";
        let profile = profile_table(&read_table(csv.as_bytes()).unwrap());
        assert_eq!(profile.columns[0].nulls, 2);
        assert_eq!(profile.columns[0].distinct, 1);
    }

    #[test]
    fn test_value_count_ties_sorted_by_value() {
        let csv = "college_name\nReed\nBard\nPomona\n";
        let profile = profile_table(&read_table(csv.as_bytes()).unwrap());
        let names: Vec<&str> = profile.columns[0]
            .value_counts
            .iter()
            .map(|v| v.value.as_str())
            .collect();
        assert_eq!(names, vec!["Bard", "Pomona", "Reed"]);
    }
}
