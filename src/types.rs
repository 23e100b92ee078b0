use chrono::NaiveDate;
use serde::Serialize;
use std::collections::HashMap;
use tabled::Tabled;

use crate::util::{format_currency, format_year_month};

/// A decoded table before any validation: header order plus every column as
/// raw text cells. Duplicate headers keep their first column.
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    headers: Vec<String>,
    columns: HashMap<String, Vec<String>>,
    row_count: usize,
}

impl RawTable {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let mut columns: HashMap<String, Vec<String>> = HashMap::new();
        let mut kept = Vec::with_capacity(headers.len());
        for (idx, name) in headers.iter().enumerate() {
            if columns.contains_key(name) {
                continue;
            }
            let cells = rows
                .iter()
                .map(|row| row.get(idx).cloned().unwrap_or_default())
                .collect();
            columns.insert(name.clone(), cells);
            kept.push(name.clone());
        }
        RawTable {
            headers: kept,
            columns,
            row_count: rows.len(),
        }
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn column(&self, name: &str) -> Option<&[String]> {
        self.columns.get(name).map(Vec::as_slice)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }
}

/// One validated row: month plus the two source amounts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Entry {
    pub date: NaiveDate,
    pub revenue: f64,
    pub expenses: f64,
}

/// A row with its derived profit. Fields are read-only so profit can only be
/// produced through [`Record::from_entry`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Record {
    date: NaiveDate,
    revenue: f64,
    expenses: f64,
    profit: f64,
}

impl Record {
    pub fn from_entry(entry: Entry) -> Self {
        Record {
            date: entry.date,
            revenue: entry.revenue,
            expenses: entry.expenses,
            profit: entry.revenue - entry.expenses,
        }
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn revenue(&self) -> f64 {
        self.revenue
    }

    pub fn expenses(&self) -> f64 {
        self.expenses
    }

    pub fn profit(&self) -> f64 {
        self.profit
    }

    /// The source values without the derived column.
    pub fn entry(&self) -> Entry {
        Entry {
            date: self.date,
            revenue: self.revenue,
            expenses: self.expenses,
        }
    }

    /// `YYYY-MM: $X,XXX.XX`, the line used in the ranked list.
    pub fn profit_line(&self) -> String {
        format!("{}: {}", format_year_month(self.date), format_currency(self.profit))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Totals {
    pub revenue: f64,
    pub expenses: f64,
    pub profit: f64,
}

/// The three formatted total strings shown by the shell and printed in the
/// document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub total_revenue: String,
    pub total_expenses: String,
    pub net_profit: String,
}

impl Summary {
    pub fn from_totals(totals: &Totals) -> Self {
        Summary {
            total_revenue: format_currency(totals.revenue),
            total_expenses: format_currency(totals.expenses),
            net_profit: format_currency(totals.profit),
        }
    }

    pub fn lines(&self) -> [String; 3] {
        [
            format!("Total Revenue: {}", self.total_revenue),
            format!("Total Expenses: {}", self.total_expenses),
            format!("Net Profit: {}", self.net_profit),
        ]
    }
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct RankedMonthRow {
    #[serde(rename = "Rank")]
    #[tabled(rename = "Rank")]
    pub rank: usize,
    #[serde(rename = "Month")]
    #[tabled(rename = "Month")]
    pub month: String,
    #[serde(rename = "Revenue")]
    #[tabled(rename = "Revenue")]
    pub revenue: String,
    #[serde(rename = "Expenses")]
    #[tabled(rename = "Expenses")]
    pub expenses: String,
    #[serde(rename = "Profit")]
    #[tabled(rename = "Profit")]
    pub profit: String,
}

/// Export shape of an augmented record.
#[derive(Debug, Serialize, Clone)]
pub struct RecordRow {
    #[serde(rename = "Date")]
    pub date: String,
    #[serde(rename = "Revenue")]
    pub revenue: f64,
    #[serde(rename = "Expenses")]
    pub expenses: f64,
    #[serde(rename = "Profit")]
    pub profit: f64,
}

impl From<&Record> for RecordRow {
    fn from(r: &Record) -> Self {
        RecordRow {
            date: format_year_month(r.date()),
            revenue: r.revenue(),
            expenses: r.expenses(),
            profit: r.profit(),
        }
    }
}
