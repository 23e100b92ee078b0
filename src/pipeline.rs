use crate::chart::{render_chart, ChartConfig, ChartImage, TransientChart};
use crate::document::{compose, compose_with_transient, ReportDocument};
use crate::error::Result;
use crate::loader::{load_path, load_table, TableFormat};
use crate::reports::{augment, top_by_profit, totals, TOP_N};
use crate::schema::validate;
use crate::types::{RawTable, Record, Summary, Totals};
use std::path::Path;
use tracing::info;

/// How the rendered chart reaches the composer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ChartHandoff {
    /// Pass the raster directly.
    #[default]
    InMemory,
    /// Write a PNG to a per-run temp file and read it back when composing.
    TransientFile,
}

#[derive(Debug, Clone, Default)]
pub struct ReportConfig {
    pub chart: ChartConfig,
    pub handoff: ChartHandoff,
}

/// Everything one run produces. Nothing here outlives the caller's use of it.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub records: Vec<Record>,
    pub totals: Totals,
    pub summary: Summary,
    pub ranked: Vec<Record>,
    pub chart: ChartImage,
    pub document: ReportDocument,
}

/// Validate → augment → {chart, rank} → compose. Any failure aborts the run.
pub fn run_pipeline(table: &RawTable, config: &ReportConfig) -> Result<PipelineOutput> {
    let entries = validate(table)?;
    let records = augment(&entries);
    let totals = totals(&records);
    info!("{} records, net profit {:.2}", records.len(), totals.profit);

    let chart = render_chart(&records, &config.chart)?;
    let ranked = top_by_profit(&records, TOP_N);
    let document = match config.handoff {
        ChartHandoff::InMemory => compose(&totals, &ranked, Some(&chart))?,
        ChartHandoff::TransientFile => {
            let transient = TransientChart::persist(&chart)?;
            compose_with_transient(&totals, &ranked, &transient)?
        }
    };
    info!(
        "report composed: {} page(s), {} bytes",
        document.page_count(),
        document.bytes().len()
    );

    let ranked = ranked.into_iter().copied().collect();
    Ok(PipelineOutput {
        summary: Summary::from_totals(&totals),
        records,
        totals,
        ranked,
        chart,
        document,
    })
}

pub fn run_bytes(bytes: &[u8], format: TableFormat, config: &ReportConfig) -> Result<PipelineOutput> {
    run_pipeline(&load_table(bytes, format)?, config)
}

pub fn run_file(path: &Path, config: &ReportConfig) -> Result<PipelineOutput> {
    run_pipeline(&load_path(path)?, config)
}
