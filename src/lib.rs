//! Turn a table of monthly revenue and expenses into a PDF summary.
//!
//! The pipeline validates the `Date`/`Revenue`/`Expenses` columns, derives
//! profit, ranks the most profitable months, renders a line chart and lays
//! everything out in a one-shot PDF. Each run owns all of its data.
pub mod chart;
pub mod document;
pub mod error;
pub mod loader;
pub mod output;
pub mod pipeline;
pub mod reports;
pub mod schema;
pub mod types;
pub mod util;

pub use chart::{render_chart, ChartConfig, ChartImage, TransientChart};
pub use document::{compose, compose_with_transient, ReportDocument};
pub use error::{ReportError, Result};
pub use loader::{load_path, load_table, TableFormat};
pub use pipeline::{run_bytes, run_file, run_pipeline, ChartHandoff, PipelineOutput, ReportConfig};
pub use reports::{augment, top_by_profit, totals, TOP_N};
pub use schema::{validate, REQUIRED_COLUMNS};
pub use types::{Entry, RawTable, Record, Summary, Totals};
