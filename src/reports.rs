use crate::types::{Entry, RankedMonthRow, Record, Totals};
use crate::util::{format_currency, format_year_month};
use std::cmp::Ordering;

/// Number of months listed in the "Top 5 Profitable Months" section.
pub const TOP_N: usize = 5;

/// Attach `profit = revenue - expenses` to every row, keeping source order.
///
/// Re-running on `records.iter().map(Record::entry)` gives the same records.
pub fn augment(entries: &[Entry]) -> Vec<Record> {
    entries.iter().copied().map(Record::from_entry).collect()
}

pub fn totals(records: &[Record]) -> Totals {
    records.iter().fold(Totals::default(), |acc, r| Totals {
        revenue: acc.revenue + r.revenue(),
        expenses: acc.expenses + r.expenses(),
        profit: acc.profit + r.profit(),
    })
}

/// The `n` most profitable records, highest first.
///
/// `sort_by` is stable, so equal profits keep their source order.
pub fn top_by_profit(records: &[Record], n: usize) -> Vec<&Record> {
    let mut ranked: Vec<&Record> = records.iter().collect();
    ranked.sort_by(|a, b| b.profit().partial_cmp(&a.profit()).unwrap_or(Ordering::Equal));
    ranked.truncate(n);
    ranked
}

/// `YYYY-MM: $X` lines for the document's ranked section.
pub fn ranked_lines(ranked: &[&Record]) -> Vec<String> {
    ranked.iter().map(|r| r.profit_line()).collect()
}

pub fn ranked_rows(ranked: &[&Record]) -> Vec<RankedMonthRow> {
    ranked
        .iter()
        .enumerate()
        .map(|(idx, r)| RankedMonthRow {
            rank: idx + 1,
            month: format_year_month(r.date()),
            revenue: format_currency(r.revenue()),
            expenses: format_currency(r.expenses()),
            profit: format_currency(r.profit()),
        })
        .collect()
}
