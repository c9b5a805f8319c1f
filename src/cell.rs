// 🧱 Cell Values - Raw tabular cells as a closed tagged union
//
// A tabular reader hands us whatever shape a cell happened to have.
// Normalizers never inspect that shape themselves: they go through
// AcceptedInput, which admits text and integers and rejects everything else
// (booleans included) before any normalization logic runs.

use crate::error::{IngestError, IngestResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// ============================================================================
// RAW CELL VALUE
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CellValue {
    /// Missing / empty cell
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
    List(Vec<CellValue>),
    Tuple(Vec<CellValue>),
    Mapping(BTreeMap<String, CellValue>),
}

/// Fields that spreadsheet and dataframe exports write for "no value".
/// Matched exactly, case included.
pub const MISSING_VALUE_TOKENS: [&str; 18] = [
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

impl CellValue {
    /// Build a cell from a raw CSV field. Empty fields and missing-value
    /// tokens are Null; everything else stays text so identifiers with
    /// leading zeros survive.
    pub fn from_csv(raw: &str) -> Self {
        if raw.is_empty() || MISSING_VALUE_TOKENS.contains(&raw) {
            CellValue::Null
        } else {
            CellValue::Text(raw.to_string())
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            CellValue::Null => "null",
            CellValue::Bool(_) => "boolean",
            CellValue::Integer(_) => "integer",
            CellValue::Float(_) => "float",
            CellValue::Text(_) => "string",
            CellValue::List(_) => "list",
            CellValue::Tuple(_) => "tuple",
            CellValue::Mapping(_) => "mapping",
        }
    }

    /// Null, or text that is empty after trimming
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Null => true,
            CellValue::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Treat a missing cell as the empty string (pandas-style `fillna('')`)
    pub fn or_empty_text(&self) -> CellValue {
        match self {
            CellValue::Null => CellValue::Text(String::new()),
            other => other.clone(),
        }
    }

    /// Text rendering used when a value is coerced to a string.
    ///
    /// Floats always keep their fractional part (`1.0`), so a float never
    /// renders like an integer flag.
    pub fn render(&self) -> String {
        match self {
            CellValue::Null => String::new(),
            CellValue::Bool(b) => b.to_string(),
            CellValue::Integer(i) => i.to_string(),
            CellValue::Float(f) => format!("{:?}", f),
            CellValue::Text(s) => s.clone(),
            CellValue::List(items) => format!("[{}]", render_items(items)),
            CellValue::Tuple(items) => format!("({})", render_items(items)),
            CellValue::Mapping(map) => {
                let inner: Vec<String> = map
                    .iter()
                    .map(|(k, v)| format!("{}: {}", k, v.render()))
                    .collect();
                format!("{{{}}}", inner.join(", "))
            }
        }
    }

    fn describe(&self) -> String {
        format!("{} ({})", self.type_name(), self.render())
    }
}

fn render_items(items: &[CellValue]) -> String {
    items
        .iter()
        .map(CellValue::render)
        .collect::<Vec<_>>()
        .join(", ")
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        CellValue::Integer(value)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Float(value)
    }
}

impl From<bool> for CellValue {
    fn from(value: bool) -> Self {
        CellValue::Bool(value)
    }
}

impl<T: Into<CellValue>> From<Option<T>> for CellValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(CellValue::Null)
    }
}

// ============================================================================
// ACCEPTED INPUT (normalizer boundary)
// ============================================================================

/// The only shapes a text-or-integer normalizer will look at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcceptedInput<'a> {
    Text(&'a str),
    Integer(i64),
}

impl<'a> AcceptedInput<'a> {
    /// Admit text or integer cells. Booleans are rejected even though some
    /// sources encode them as 0/1.
    pub fn text_or_integer(value: &'a CellValue) -> IngestResult<Self> {
        match value {
            CellValue::Text(s) => Ok(AcceptedInput::Text(s)),
            CellValue::Integer(i) => Ok(AcceptedInput::Integer(*i)),
            other => Err(IngestError::InvalidInputType {
                expected: "a string or integer",
                found: other.describe(),
            }),
        }
    }

    /// Admit text cells only
    pub fn text(value: &'a CellValue) -> IngestResult<&'a str> {
        match value {
            CellValue::Text(s) => Ok(s),
            other => Err(IngestError::InvalidInputType {
                expected: "a string",
                found: other.describe(),
            }),
        }
    }

    pub fn to_text(self) -> String {
        match self {
            AcceptedInput::Text(s) => s.to_string(),
            AcceptedInput::Integer(i) => i.to_string(),
        }
    }
}
