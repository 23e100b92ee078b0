use crate::error::{ReportError, Result};
use crate::types::{Entry, RawTable};
use crate::util::{parse_amount, parse_year_month};
use tracing::debug;

pub const DATE_COLUMN: &str = "Date";
pub const REVENUE_COLUMN: &str = "Revenue";
pub const EXPENSES_COLUMN: &str = "Expenses";

pub const REQUIRED_COLUMNS: [&str; 3] = [DATE_COLUMN, REVENUE_COLUMN, EXPENSES_COLUMN];

/// Report which required columns are absent, in canonical order.
pub fn missing_columns(table: &RawTable) -> Vec<String> {
    REQUIRED_COLUMNS
        .iter()
        .filter(|name| !table.has_column(name))
        .map(|name| name.to_string())
        .collect()
}

/// Check the required columns and parse every row into an [`Entry`].
///
/// All or nothing: the first bad date or amount fails the whole table.
/// Row numbers in errors are 1-based data rows (the header is not counted).
pub fn validate(table: &RawTable) -> Result<Vec<Entry>> {
    let missing = missing_columns(table);
    if !missing.is_empty() {
        return Err(ReportError::Schema { missing });
    }
    let column = |name: &str| table.column(name).unwrap_or_default();
    let (dates, revenues, expenses) = (
        column(DATE_COLUMN),
        column(REVENUE_COLUMN),
        column(EXPENSES_COLUMN),
    );

    let parsed_dates = dates
        .iter()
        .enumerate()
        .map(|(idx, raw)| {
            parse_year_month(raw).ok_or_else(|| ReportError::DateFormat {
                row: idx + 1,
                value: raw.clone(),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let mut entries = Vec::with_capacity(parsed_dates.len());
    for (idx, date) in parsed_dates.into_iter().enumerate() {
        entries.push(Entry {
            date,
            revenue: amount(REVENUE_COLUMN, idx, &revenues[idx])?,
            expenses: amount(EXPENSES_COLUMN, idx, &expenses[idx])?,
        });
    }
    debug!("validated {} rows", entries.len());
    Ok(entries)
}

fn amount(column: &str, idx: usize, raw: &str) -> Result<f64> {
    parse_amount(raw).ok_or_else(|| ReportError::NumericParse {
        column: column.to_string(),
        row: idx + 1,
        value: raw.to_string(),
    })
}
