// Utility helpers for parsing and formatting.
//
// Cells arrive as text from both CSV and XLSX sources; everything past the
// schema check works on typed values produced here.
use chrono::NaiveDate;
use num_format::{Locale, ToFormattedString};

/// Parse an amount cell into a finite `f64`.
///
/// - Trims whitespace.
/// - Accepts one leading `$` and thousands separators like `","`.
/// - Accepts scientific notation (`1e3`, `2.5E-1`).
/// - Returns `None` for empty, unparseable or non-finite input (`NaN`, `inf`).
pub fn parse_amount(s: &str) -> Option<f64> {
    let s = s.trim();
    let (neg, s) = match s.strip_prefix('-') {
        Some(rest) => (true, rest.trim_start()),
        None => (false, s),
    };
    let s = s.strip_prefix('$').unwrap_or(s);
    if s.is_empty() || (neg && s.starts_with(['-', '+'])) {
        return None;
    }
    let v = s.replace(',', "").parse::<f64>().ok()?;
    if !v.is_finite() {
        return None;
    }
    Some(if neg { -v } else { v })
}

/// Parse a `YYYY-MM` month into the first day of that month.
///
/// Anything with a day component, a different separator, or trailing text
/// is rejected.
pub fn parse_year_month(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    let (year, month) = s.split_once('-')?;
    if year.len() != 4 || month.is_empty() || month.len() > 2 {
        return None;
    }
    if !year.chars().chain(month.chars()).all(|c| c.is_ascii_digit()) {
        return None;
    }
    NaiveDate::from_ymd_opt(year.parse().ok()?, month.parse().ok()?, 1)
}

pub fn format_year_month(date: NaiveDate) -> String {
    date.format("%Y-%m").to_string()
}

pub fn format_number(n: f64, decimals: usize) -> String {
    // Fixed decimals plus en-locale thousands separators (`1,234,567.89`).
    let s = format!("{:.*}", decimals, n.abs());
    let (int_part, frac_part) = match s.split_once('.') {
        Some((int_part, frac)) => (int_part, Some(frac)),
        None => (s.as_str(), None),
    };
    let mut res = group_thousands(int_part);
    if let Some(frac) = frac_part {
        res.push('.');
        res.push_str(frac);
    }
    // A value that rounds to zero prints without a sign.
    let is_zero = s.bytes().all(|b| b == b'0' || b == b'.');
    if n.is_sign_negative() && !is_zero {
        format!("-{}", res)
    } else {
        res
    }
}

// Works on the digit string so amounts beyond any integer type keep every digit.
fn group_thousands(digits: &str) -> String {
    let separator = Locale::en.separator();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push_str(separator);
        }
        out.push(c);
    }
    out
}

/// `$` prefix, thousands separators, two decimals; negatives as `-$1,234.50`.
pub fn format_currency(n: f64) -> String {
    let body = format_number(n, 2);
    match body.strip_prefix('-') {
        Some(abs) => format!("-${}", abs),
        None => format!("${}", body),
    }
}

pub fn format_int<T>(n: T) -> String
where
    T: ToFormattedString,
{
    // Counts in console messages (e.g., `1,204 rows loaded`).
    n.to_formatted_string(&Locale::en)
}
