// Sequential identifier allocation.
//
// Policy:
// - Column 0 of every table is a global key: `max(column 0) + 1`.
// - Per-parent numbers (e.g. the indicator number inside an office or
//   school) are scoped: only rows sharing the scope value are considered.
// Cells that do not parse as integers are ignored, so a blank or corrupt
// cell can never drag the maximum down and cause an id to be reused.

use super::row_ops::read_field;
use super::table_models::{HeaderIndex, Row, TableError};

fn parse_id(cell: &str) -> Option<i64> {
    cell.trim().parse::<i64>().ok()
}

fn next_after(ids: impl Iterator<Item = i64>) -> i64 {
    ids.max().map_or(1, |max| max + 1)
}

/// Next free key for column 0 of `rows` (data rows only, no header).
pub fn next_global_id(rows: &[Row]) -> i64 {
    next_after(
        rows.iter()
            .filter_map(|row| row.first())
            .filter_map(|cell| parse_id(cell)),
    )
}

/// Next free id in `id_column` among rows whose `scope_column` equals
/// `scope_value`. Returns 1 when nothing is in scope yet.
pub fn next_scoped_id(
    header: &HeaderIndex,
    rows: &[Row],
    scope_column: &str,
    scope_value: &str,
    id_column: &str,
) -> Result<i64, TableError> {
    // Resolve both columns up front so a bad header fails even on an empty table.
    header.require(scope_column)?;
    header.require(id_column)?;

    let mut ids = Vec::new();
    for row in rows {
        if read_field(header, row, scope_column)? != scope_value {
            continue;
        }
        if let Some(id) = parse_id(read_field(header, row, id_column)?) {
            ids.push(id);
        }
    }
    Ok(next_after(ids.into_iter()))
}
