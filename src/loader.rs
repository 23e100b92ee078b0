use crate::error::{ReportError, Result};
use crate::types::RawTable;
use crate::util::format_year_month;
use calamine::{open_workbook_auto_from_rs, Data, Reader};
use chrono::NaiveDate;
use csv::ReaderBuilder;
use std::io::Cursor;
use std::path::Path;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFormat {
    Csv,
    Xlsx,
}

impl TableFormat {
    /// Pick the decoder from a file name's extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        match ext.as_str() {
            "csv" => Ok(TableFormat::Csv),
            "xlsx" | "xls" => Ok(TableFormat::Xlsx),
            _ => Err(ReportError::UnsupportedFormat(if ext.is_empty() {
                path.display().to_string()
            } else {
                format!(".{}", ext)
            })),
        }
    }
}

pub fn load_table(bytes: &[u8], format: TableFormat) -> Result<RawTable> {
    let table = match format {
        TableFormat::Csv => load_csv(bytes)?,
        TableFormat::Xlsx => load_xlsx(bytes)?,
    };
    debug!(
        "decoded {:?} table: {} columns, {} rows",
        format,
        table.headers().len(),
        table.row_count()
    );
    Ok(table)
}

pub fn load_path(path: &Path) -> Result<RawTable> {
    let format = TableFormat::from_path(path)?;
    let bytes = std::fs::read(path)?;
    load_table(&bytes, format)
}

fn load_csv(bytes: &[u8]) -> Result<RawTable> {
    let mut rdr = ReaderBuilder::new().flexible(true).from_reader(bytes);
    let headers: Vec<String> = rdr.headers()?.iter().map(|h| h.trim().to_string()).collect();
    let mut rows = Vec::new();
    for result in rdr.records() {
        let record = result?;
        rows.push(record.iter().map(str::to_string).collect());
    }
    Ok(RawTable::new(headers, rows))
}

fn load_xlsx(bytes: &[u8]) -> Result<RawTable> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))?;
    let range = match workbook.worksheet_range_at(0) {
        Some(range) => range?,
        None => return Ok(RawTable::default()),
    };
    let mut rows = range.rows();
    let headers: Vec<String> = match rows.next() {
        Some(header) => header.iter().map(|c| cell_text(c).trim().to_string()).collect(),
        None => return Ok(RawTable::default()),
    };
    let rows = rows
        .map(|row| row.iter().map(cell_text).collect())
        .collect();
    Ok(RawTable::new(headers, rows))
}

/// Stringify a cell the way a CSV export of the sheet would read.
fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => f.to_string(),
        // Date-typed cells carry a full timestamp; only the month matters here.
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(ts) => format_year_month(ts.date()),
            None => cell.to_string(),
        },
        Data::DateTimeIso(s) => s
            .get(..10)
            .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
            .map(format_year_month)
            .unwrap_or_else(|| s.clone()),
        other => other.to_string(),
    }
}
