// Derived totals.
// Some columns are sums of other columns (the triennium goal and the
// triennium execution). They are recomputed on every single-field update,
// after the field is changed and before the row is written back.

use super::row_ops::{read_field, set_field};
use super::table_models::{HeaderIndex, Row, TableError};

/// One derived column and the columns it sums.
#[derive(Debug, Clone, Copy)]
pub struct AggregationRule {
    pub sources: &'static [&'static str],
    pub target: &'static str,
}

/// The two totals every indicator sheet carries.
pub const TRIENNIUM_RULES: &[AggregationRule] = &[
    AggregationRule {
        sources: &["2024", "2025", "2026"],
        target: "meta_trienio",
    },
    AggregationRule {
        sources: &["ejec_2024", "ejec_2025", "ejec_2026"],
        target: "total_ejec",
    },
];

/// Longest prefix of `text` that reads as a decimal number:
/// optional sign, digits with an optional fraction, optional exponent.
fn numeric_prefix(text: &str) -> &str {
    let bytes = text.as_bytes();
    let digits_from = |mut at: usize| {
        while bytes.get(at).is_some_and(u8::is_ascii_digit) {
            at += 1;
        }
        at
    };

    let mut end = usize::from(matches!(bytes.first(), Some(b'+' | b'-')));
    let int_end = digits_from(end);
    let mut digits = int_end - end;
    end = int_end;
    if bytes.get(end) == Some(&b'.') {
        let frac_end = digits_from(end + 1);
        digits += frac_end - (end + 1);
        end = frac_end;
    }
    if digits == 0 {
        return "";
    }

    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp_start = end + 1;
        if matches!(bytes.get(exp_start), Some(b'+' | b'-')) {
            exp_start += 1;
        }
        let exp_end = digits_from(exp_start);
        if exp_end > exp_start {
            end = exp_end;
        }
    }
    &text[..end]
}

/// Reads the leading number of a cell, so formatted values like `"50%"` or
/// `"12 personas"` keep their amount. Cells with no leading number count
/// as zero.
pub fn lenient_number(cell: &str) -> f64 {
    numeric_prefix(cell.trim())
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
        .unwrap_or(0.0)
}

/// Renders a number the way a spreadsheet shows it: no trailing ".0".
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

/// Sums the given cells of `row` with the lenient parse policy.
pub fn sum_columns(header: &HeaderIndex, row: &Row, columns: &[&str]) -> Result<f64, TableError> {
    columns.iter().try_fold(0.0, |acc, column| {
        Ok(acc + lenient_number(read_field(header, row, column)?))
    })
}

/// Applies every rule to `row` and returns the updated row.
///
/// Column names must exist in the header (a missing one is
/// `ColumnNotFound`); cell contents never fail.
pub fn recompute_totals(
    header: &HeaderIndex,
    row: &Row,
    rules: &[AggregationRule],
) -> Result<Row, TableError> {
    let mut updated = row.clone();
    for rule in rules {
        let total = sum_columns(header, &updated, rule.sources)?;
        updated = set_field(header, &updated, rule.target, format_number(total))?;
    }
    Ok(updated)
}
