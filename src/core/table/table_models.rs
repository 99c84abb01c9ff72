// Domain models for the tabular store.
// A "table" is a named range of the spreadsheet: row 0 is the header and
// every other row is data. Cells are plain strings; nothing here knows about
// HTTP or the Sheets API.

use super::aggregator::format_number;
use serde_json::{Map, Value};
use std::collections::HashMap;
use thiserror::Error;

/// One row of cells, positionally aligned to the header.
/// Rows can be shorter than the header; missing trailing cells read as "".
pub type Row = Vec<String>;

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Error)]
pub enum TableError {
    #[error("Row with id '{0}' not found")]
    RowNotFound(String),

    #[error("Column '{0}' not found")]
    ColumnNotFound(String),

    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("Remote store error: {0}")]
    Transport(String),
}

/// Coarse classification used by the HTTP layer to pick a status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Key or column absent. Expected and client-correctable.
    NotFound,
    /// Missing or malformed input.
    ValidationGap,
    /// The remote call itself failed (connectivity, permissions, quota).
    TransportFailure,
}

impl TableError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            TableError::RowNotFound(_) | TableError::ColumnNotFound(_) => ErrorKind::NotFound,
            TableError::Validation(_) => ErrorKind::ValidationGap,
            TableError::Transport(_) => ErrorKind::TransportFailure,
        }
    }
}

// ============================================================================
// HEADER INDEX
// ============================================================================

/// Maps column names to their position in the header row.
#[derive(Debug, Clone, Default)]
pub struct HeaderIndex {
    columns: Vec<String>,
    positions: HashMap<String, usize>,
}

impl HeaderIndex {
    pub fn new(columns: Vec<String>) -> Self {
        let mut positions = HashMap::with_capacity(columns.len());
        for (position, name) in columns.iter().enumerate() {
            // First occurrence wins for duplicated names.
            positions.entry(name.clone()).or_insert(position);
        }
        Self { columns, positions }
    }

    pub fn index_of(&self, column: &str) -> Option<usize> {
        self.positions.get(column).copied()
    }

    /// Like `index_of`, but a missing column is an error.
    pub fn require(&self, column: &str) -> Result<usize, TableError> {
        self.index_of(column)
            .ok_or_else(|| TableError::ColumnNotFound(column.to_string()))
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

// ============================================================================
// TABLE SNAPSHOT
// ============================================================================

/// A snapshot of one named range. Fetched fresh for every operation.
#[derive(Debug, Clone, Default)]
pub struct Table {
    pub header: HeaderIndex,
    pub rows: Vec<Row>,
}

impl Table {
    /// Builds a table from raw values as returned by the remote store
    /// (header first). An empty value list yields an empty table.
    pub fn from_values(mut values: Vec<Row>) -> Self {
        if values.is_empty() {
            return Self::default();
        }
        let header = values.remove(0);
        Self {
            header: HeaderIndex::new(header),
            rows: values,
        }
    }

    /// 1-based sheet row number of the data row at `data_index`.
    /// The header occupies sheet row 1.
    pub fn sheet_row_of(data_index: usize) -> usize {
        data_index + 2
    }

    /// Reshapes the data rows into JSON objects keyed by header names.
    /// Columns with a blank header name are skipped.
    pub fn to_records(&self) -> Vec<Map<String, Value>> {
        self.rows
            .iter()
            .map(|row| {
                let mut record = Map::new();
                for (position, column) in self.header.columns().iter().enumerate() {
                    if column.trim().is_empty() {
                        continue;
                    }
                    let cell = row.get(position).cloned().unwrap_or_default();
                    record
                        .entry(column.clone())
                        .or_insert(Value::String(cell));
                }
                record
            })
            .collect()
    }
}

/// Converts a JSON value coming from a client into a cell string.
pub fn cell_from_json(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

/// Converts a client-supplied key into the form column 0 holds.
/// Whole-number floats (`2.0`) are written as integers so they match `"2"`.
pub fn key_from_json(value: &Value) -> String {
    match value {
        Value::Number(n) if n.is_f64() => n
            .as_f64()
            .filter(|f| f.fract() == 0.0)
            .map(format_number)
            .unwrap_or_else(|| n.to_string()),
        other => cell_from_json(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn header(names: &[&str]) -> HeaderIndex {
        HeaderIndex::new(names.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn header_index_finds_every_column() {
        let h = header(&["id", "nombre", "2024", "meta_trienio"]);
        assert_eq!(h.index_of("id"), Some(0));
        assert_eq!(h.index_of("2024"), Some(2));
        assert_eq!(h.index_of("meta_trienio"), Some(3));
        assert_eq!(h.index_of("total_ejec"), None);
    }

    #[test]
    fn header_index_first_duplicate_wins() {
        let h = header(&["id", "nombre", "nombre"]);
        assert_eq!(h.index_of("nombre"), Some(1));
    }

    #[test]
    fn require_reports_missing_column() {
        let h = header(&["id"]);
        let err = h.require("2025").unwrap_err();
        assert!(matches!(err, TableError::ColumnNotFound(ref c) if c == "2025"));
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn from_values_splits_header() {
        let table = Table::from_values(vec![
            vec!["id".into(), "nombre".into()],
            vec!["1".into(), "Uno".into()],
        ]);
        assert_eq!(table.header.len(), 2);
        assert_eq!(table.rows.len(), 1);

        let empty = Table::from_values(Vec::new());
        assert!(empty.header.is_empty());
        assert!(empty.rows.is_empty());
    }

    #[test]
    fn records_fill_missing_cells_with_empty_strings() {
        let table = Table::from_values(vec![
            vec!["id".into(), "nombre".into(), "".into(), "2024".into()],
            vec!["1".into()],
        ]);
        let records = table.to_records();
        assert_eq!(records.len(), 1);
        assert_eq!(
            Value::Object(records[0].clone()),
            json!({"id": "1", "nombre": "", "2024": ""})
        );
    }

    #[test]
    fn sheet_rows_skip_the_header() {
        assert_eq!(Table::sheet_row_of(0), 2);
        assert_eq!(Table::sheet_row_of(9), 11);
    }

    #[test]
    fn json_values_become_cells() {
        assert_eq!(cell_from_json(&json!("abc")), "abc");
        assert_eq!(cell_from_json(&json!(12)), "12");
        assert_eq!(cell_from_json(&json!(1.5)), "1.5");
        assert_eq!(cell_from_json(&json!(null)), "");
        assert_eq!(cell_from_json(&json!(true)), "true");
    }

    #[test]
    fn error_kinds_cover_every_variant() {
        assert_eq!(TableError::RowNotFound("7".into()).kind(), ErrorKind::NotFound);
        assert_eq!(
            TableError::Validation("x".into()).kind(),
            ErrorKind::ValidationGap
        );
        assert_eq!(
            TableError::Transport("timeout".into()).kind(),
            ErrorKind::TransportFailure
        );
        assert!(TableError::Transport("timeout".into())
            .to_string()
            .contains("timeout"));
    }

    #[test]
    fn keys_normalise_whole_floats() {
        assert_eq!(key_from_json(&json!(2.0)), "2");
        assert_eq!(key_from_json(&json!(2)), "2");
        assert_eq!(key_from_json(&json!(2.5)), "2.5");
        assert_eq!(key_from_json(&json!("7")), "7");
    }
}
