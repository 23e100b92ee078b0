use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("File must contain columns: {}", .missing.join(", "))]
    Schema { missing: Vec<String> },

    #[error("Invalid date '{value}' in row {row}: expected YYYY-MM")]
    DateFormat { row: usize, value: String },

    #[error("Dataset contains no records")]
    EmptyDataset,

    #[error("Non-numeric {column} value '{value}' in row {row}")]
    NumericParse {
        column: String,
        row: usize,
        value: String,
    },

    /// Raised when a transient chart file has gone missing. The composer
    /// treats this as "no image", it never reaches the caller from there.
    #[error("Chart image unavailable at {}: {source}", .path.display())]
    ResourceUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unsupported file type: {0} (expected .csv or .xlsx)")]
    UnsupportedFormat(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Spreadsheet error: {0}")]
    Spreadsheet(#[from] calamine::Error),

    #[error("Chart rendering failed: {0}")]
    Chart(String),

    #[error("Image encoding error: {0}")]
    Image(#[from] image::ImageError),

    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ReportError>;
