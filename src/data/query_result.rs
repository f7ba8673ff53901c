use anyhow::{anyhow, bail, Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::borrow::Cow;
use std::fmt;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

use crate::data::cell_compare::parse_number;

/// Display value used for null cells in profiles and Excel-style filters
pub const EMPTY_LABEL: &str = "(empty)";

/// A single scalar cell of an executed result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged, from = "JsonValue")]
pub enum CellValue {
    Null,
    Integer(i64),
    Float(f64),
    Text(String),
}

static NULL_CELL: CellValue = CellValue::Null;

impl CellValue {
    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    /// Numeric value of the cell, if it is a number or its text parses as
    /// a finite number
    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Integer(i) => Some(*i as f64),
            CellValue::Float(f) if f.is_finite() => Some(*f),
            CellValue::Float(_) => None,
            CellValue::Text(s) => parse_number(s),
            CellValue::Null => None,
        }
    }

    /// String form used for substring matching; null is ""
    pub fn search_text(&self) -> Cow<'_, str> {
        match self {
            CellValue::Text(s) => Cow::Borrowed(s.as_str()),
            CellValue::Null => Cow::Borrowed(""),
            other => Cow::Owned(other.to_string()),
        }
    }

    /// String form used for distinct values and exact matching; null is
    /// `empty_label`
    pub fn display_text<'a>(&'a self, empty_label: &'a str) -> Cow<'a, str> {
        match self {
            CellValue::Null => Cow::Borrowed(empty_label),
            other => other.search_text(),
        }
    }

    /// True for null cells and empty text. Whitespace-only text is a
    /// value.
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Null => true,
            CellValue::Text(s) => s.is_empty(),
            _ => false,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Null => write!(f, ""),
            CellValue::Integer(i) => write!(f, "{}", i),
            CellValue::Float(fl) => write!(f, "{}", fl),
            CellValue::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<JsonValue> for CellValue {
    fn from(json: JsonValue) -> Self {
        match json {
            JsonValue::Null => CellValue::Null,
            JsonValue::Bool(b) => CellValue::Text(b.to_string()),
            JsonValue::Number(n) => {
                if let Some(i) = n.as_i64() {
                    CellValue::Integer(i)
                } else if let Some(f) = n.as_f64() {
                    CellValue::Float(f)
                } else {
                    CellValue::Text(n.to_string())
                }
            }
            JsonValue::String(s) => CellValue::Text(s),
            // Nested values are kept as their JSON text
            complex @ (JsonValue::Array(_) | JsonValue::Object(_)) => {
                CellValue::Text(complex.to_string())
            }
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::Text(s)
    }
}

impl From<i64> for CellValue {
    fn from(i: i64) -> Self {
        CellValue::Integer(i)
    }
}

impl From<f64> for CellValue {
    fn from(f: f64) -> Self {
        CellValue::Float(f)
    }
}

impl<T: Into<CellValue>> From<Option<T>> for CellValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(CellValue::Null)
    }
}

/// A row of cells positionally aligned to the result headers
pub type Row = Vec<CellValue>;

/// An executed tabular result. Immutable once produced; a new execution
/// replaces it wholesale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResult {
    pub headers: Vec<String>,
    pub rows: Vec<Row>,
    /// Milliseconds spent executing the query
    pub execution_time: f64,
    pub row_count: usize,
    pub executed_at: DateTime<Utc>,
}

impl QueryResult {
    pub fn new(headers: Vec<String>, rows: Vec<Row>) -> Self {
        let row_count = rows.len();
        Self {
            headers,
            rows,
            execution_time: 0.0,
            row_count,
            executed_at: Utc::now(),
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new(), Vec::new())
    }

    pub fn with_execution_time(mut self, millis: f64) -> Self {
        self.execution_time = millis;
        self
    }

    pub fn with_executed_at(mut self, executed_at: DateTime<Utc>) -> Self {
        self.executed_at = executed_at;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_count(&self) -> usize {
        self.headers.len()
    }

    /// Index of the first column with this header
    pub fn column_index(&self, header: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == header)
    }

    /// Cell lookup that treats a missing column or short row as null
    pub fn cell<'a>(row: &'a Row, column: Option<usize>) -> &'a CellValue {
        column.and_then(|idx| row.get(idx)).unwrap_or(&NULL_CELL)
    }

    /// Normalize a backend response into the canonical positional shape.
    ///
    /// Accepted shapes:
    /// - `{"headers": [...], "rows": [[...], ...]}`
    /// - `{"rows": [{...}, ...]}` or `{"data": [{...}, ...]}`
    /// - `[{...}, ...]` (row objects keyed by column name)
    /// - `[scalar, ...]` (a single `value` column)
    pub fn from_json(json: &JsonValue) -> Result<Self> {
        let result = match json {
            JsonValue::Array(items) => Self::from_json_items(items)?,
            JsonValue::Object(obj) => {
                let rows = obj
                    .get("rows")
                    .or_else(|| obj.get("data"))
                    .ok_or_else(|| anyhow!("Result object has neither 'rows' nor 'data'"))?
                    .as_array()
                    .ok_or_else(|| anyhow!("Result rows must be an array"))?;

                let mut result = match obj.get("headers").or_else(|| obj.get("columns")) {
                    Some(headers) => Self::from_positional(headers, rows)?,
                    None => Self::from_json_items(rows)?,
                };

                if let Some(ms) = obj
                    .get("executionTime")
                    .or_else(|| obj.get("execution_time"))
                    .and_then(JsonValue::as_f64)
                {
                    result.execution_time = ms;
                }
                if let Some(count) = obj
                    .get("rowCount")
                    .or_else(|| obj.get("row_count"))
                    .and_then(JsonValue::as_u64)
                {
                    result.row_count = count as usize;
                }
                if let Some(executed_at) = obj
                    .get("executedAt")
                    .or_else(|| obj.get("executed_at"))
                    .and_then(JsonValue::as_str)
                {
                    match DateTime::parse_from_rfc3339(executed_at) {
                        Ok(ts) => result.executed_at = ts.with_timezone(&Utc),
                        Err(e) => {
                            warn!(target: "query_result", "Ignoring invalid executedAt '{}': {}", executed_at, e)
                        }
                    }
                }
                result
            }
            _ => bail!("Result must be a JSON array or object"),
        };

        debug!(target: "query_result",
            "Normalized result with {} columns and {} rows",
            result.column_count(),
            result.rows.len()
        );
        Ok(result)
    }

    pub fn from_json_str(contents: &str) -> Result<Self> {
        let json: JsonValue = serde_json::from_str(contents).context("Result is not valid JSON")?;
        Self::from_json(&json)
    }

    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read result file {}", path.display()))?;
        Self::from_json_str(&contents)
    }

    fn from_positional(headers: &JsonValue, rows: &[JsonValue]) -> Result<Self> {
        let headers: Vec<String> = headers
            .as_array()
            .ok_or_else(|| anyhow!("Result headers must be an array"))?
            .iter()
            .map(|h| match h {
                JsonValue::String(s) => s.clone(),
                // {"name": "..."} column descriptors
                JsonValue::Object(o) => o
                    .get("name")
                    .and_then(JsonValue::as_str)
                    .map(str::to_string)
                    .unwrap_or_else(|| h.to_string()),
                other => other.to_string(),
            })
            .collect();

        let mut table_rows = Vec::with_capacity(rows.len());
        for (row_idx, row) in rows.iter().enumerate() {
            let cells = row
                .as_array()
                .ok_or_else(|| anyhow!("Row {} is not an array", row_idx))?;
            if cells.len() != headers.len() {
                warn!(target: "query_result",
                    "Row {} has {} cells for {} headers; aligning",
                    row_idx,
                    cells.len(),
                    headers.len()
                );
            }
            let mut values: Row = cells
                .iter()
                .take(headers.len())
                .cloned()
                .map(CellValue::from)
                .collect();
            values.resize(headers.len(), CellValue::Null);
            table_rows.push(values);
        }

        Ok(Self::new(headers, table_rows))
    }

    fn from_json_items(items: &[JsonValue]) -> Result<Self> {
        if items.is_empty() {
            return Ok(Self::empty());
        }

        if !items.iter().all(JsonValue::is_object) {
            if items.iter().any(JsonValue::is_object) {
                bail!("Result mixes row objects with scalar values");
            }
            let rows = items
                .iter()
                .cloned()
                .map(|v| vec![CellValue::from(v)])
                .collect();
            return Ok(Self::new(vec!["value".to_string()], rows));
        }

        // Union of keys in first-seen order
        let mut headers: Vec<String> = Vec::new();
        for item in items {
            if let Some(obj) = item.as_object() {
                for key in obj.keys() {
                    if !headers.contains(key) {
                        headers.push(key.clone());
                    }
                }
            }
        }

        let rows = items
            .iter()
            .filter_map(JsonValue::as_object)
            .map(|obj| {
                headers
                    .iter()
                    .map(|h| obj.get(h).cloned().map(CellValue::from).unwrap_or(CellValue::Null))
                    .collect()
            })
            .collect();

        Ok(Self::new(headers, rows))
    }
}
