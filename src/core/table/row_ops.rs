// Row-level operations: locating a row by key and updating named fields.
// These are pure functions over a table snapshot; the service decides when
// to fetch and when to write.

use super::table_models::{HeaderIndex, Row, Table, TableError};

/// A data row found by key, together with where it lives in the sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocatedRow {
    /// 1-based sheet row number (header is row 1).
    pub position: usize,
    pub row: Row,
}

/// Finds the first data row whose column 0 equals `key`.
///
/// Returns `None` when no row matches. Callers turn that into
/// `TableError::RowNotFound`; a stale id from a client is not a fault.
pub fn locate_row(table: &Table, key: &str) -> Option<LocatedRow> {
    table
        .rows
        .iter()
        .enumerate()
        .find(|(_, row)| row.first().map(String::as_str) == Some(key))
        .map(|(index, row)| LocatedRow {
            position: Table::sheet_row_of(index),
            row: row.clone(),
        })
}

/// Reads a named cell. Cells past the end of a short row read as "".
pub fn read_field<'a>(
    header: &HeaderIndex,
    row: &'a Row,
    column: &str,
) -> Result<&'a str, TableError> {
    let position = header.require(column)?;
    Ok(row.get(position).map(String::as_str).unwrap_or(""))
}

/// Returns a copy of `row` with `column` set to `value`.
/// Short rows are padded with empty cells up to the target position.
pub fn set_field(
    header: &HeaderIndex,
    row: &Row,
    column: &str,
    value: impl Into<String>,
) -> Result<Row, TableError> {
    let position = header.require(column)?;
    let mut updated = row.clone();
    if updated.len() <= position {
        updated.resize(position + 1, String::new());
    }
    updated[position] = value.into();
    Ok(updated)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_table() -> Table {
        Table::from_values(vec![
            vec!["id".into(), "nombre".into(), "2024".into()],
            vec!["1".into(), "Uno".into(), "10".into()],
            vec!["2".into(), "Dos".into()],
            vec!["3".into(), "Tres".into(), "30".into()],
        ])
    }

    #[test]
    fn locates_row_by_key() {
        let table = sample_table();
        let found = locate_row(&table, "2").unwrap();
        assert_eq!(found.position, 3);
        assert_eq!(found.row, vec!["2".to_string(), "Dos".to_string()]);
    }

    #[test]
    fn missing_key_is_none_not_a_panic() {
        let table = sample_table();
        assert!(locate_row(&table, "99").is_none());
        assert!(locate_row(&Table::default(), "1").is_none());
    }

    #[test]
    fn header_row_is_never_matched() {
        let table = sample_table();
        assert!(locate_row(&table, "id").is_none());
    }

    #[test]
    fn first_match_wins_for_duplicate_keys() {
        let mut table = sample_table();
        table.rows.push(vec!["1".into(), "Otro".into()]);
        let found = locate_row(&table, "1").unwrap();
        assert_eq!(found.position, 2);
        assert_eq!(found.row[1], "Uno");
    }

    #[test]
    fn set_field_only_touches_the_target_column() {
        let table = sample_table();
        let row = &table.rows[0];
        let updated = set_field(&table.header, row, "2024", "15").unwrap();

        assert_eq!(read_field(&table.header, &updated, "2024").unwrap(), "15");
        assert_eq!(updated[0], row[0]);
        assert_eq!(updated[1], row[1]);
        assert_eq!(updated.len(), row.len());
    }

    #[test]
    fn set_field_pads_short_rows() {
        let table = sample_table();
        let short = &table.rows[1];
        let updated = set_field(&table.header, short, "2024", "20").unwrap();
        assert_eq!(updated, vec!["2", "Dos", "20"]);
    }

    #[test]
    fn unknown_column_is_an_error() {
        let table = sample_table();
        let err = set_field(&table.header, &table.rows[0], "2030", "1").unwrap_err();
        assert!(matches!(err, TableError::ColumnNotFound(ref c) if c == "2030"));
    }

    #[test]
    fn read_field_defaults_missing_cells() {
        let table = sample_table();
        assert_eq!(read_field(&table.header, &table.rows[1], "2024").unwrap(), "");
    }
}
