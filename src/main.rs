// Command-line shell around the report pipeline.
//
// - Reads a .csv or .xlsx file and runs the whole pipeline once.
// - Prints the three totals and a preview of the top months.
// - Writes the PDF report and the chart PNG, plus optional CSV/JSON exports.
use anyhow::{Context, Result};
use clap::Parser;
use financial_report::output::{preview_table_rows, write_csv, write_json};
use financial_report::reports::ranked_rows;
use financial_report::types::RecordRow;
use financial_report::util::format_int;
use financial_report::{run_file, ChartConfig, ChartHandoff, ReportConfig};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "financial-report")]
#[command(about = "Analyze monthly revenue and expenses and build a PDF summary")]
struct Args {
    /// Input table (.csv or .xlsx) with Date, Revenue and Expenses columns
    input: PathBuf,

    /// Where to write the PDF report
    #[arg(short, long, default_value = "financial_report_summary.pdf")]
    output: PathBuf,

    /// Where to write the chart preview PNG
    #[arg(short, long, default_value = "financial_chart.png")]
    chart: PathBuf,

    /// Chart width in pixels
    #[arg(long, default_value_t = 1000, value_parser = clap::value_parser!(u32).range(1..))]
    width: u32,

    /// Chart height in pixels
    #[arg(long, default_value_t = 500, value_parser = clap::value_parser!(u32).range(1..))]
    height: u32,

    /// Hand the chart to the composer through a temp file instead of memory
    #[arg(long)]
    transient_chart: bool,

    /// Also write the formatted totals as JSON
    #[arg(long)]
    summary_json: Option<PathBuf>,

    /// Also write the records with their profit column as CSV
    #[arg(long)]
    export_csv: Option<PathBuf>,

    /// Rows shown in the console preview table
    #[arg(long, default_value_t = 5)]
    preview_rows: usize,
}

fn run(args: &Args) -> Result<()> {
    let config = ReportConfig {
        chart: ChartConfig {
            width: args.width,
            height: args.height,
            ..ChartConfig::default()
        },
        handoff: if args.transient_chart {
            ChartHandoff::TransientFile
        } else {
            ChartHandoff::InMemory
        },
    };

    info!("processing {}", args.input.display());
    let out = run_file(&args.input, &config)?;

    println!("Report successfully analyzed! ({} rows)\n", format_int(out.records.len()));
    println!("Summary");
    for line in out.summary.lines() {
        println!("  {}", line);
    }
    println!();

    println!("Top Profitable Months\n");
    let ranked: Vec<_> = out.ranked.iter().collect();
    preview_table_rows(&ranked_rows(&ranked), args.preview_rows);

    std::fs::write(&args.chart, out.chart.to_png()?)
        .with_context(|| format!("writing chart to {}", args.chart.display()))?;
    println!("Chart saved to {}", args.chart.display());

    out.document
        .write_to(&args.output)
        .with_context(|| format!("writing report to {}", args.output.display()))?;
    println!("PDF report saved to {}", args.output.display());

    if let Some(path) = &args.summary_json {
        write_json(path, &out.summary)
            .with_context(|| format!("writing summary to {}", path.display()))?;
        println!("Summary saved to {}", path.display());
    }
    if let Some(path) = &args.export_csv {
        let rows: Vec<RecordRow> = out.records.iter().map(RecordRow::from).collect();
        write_csv(path, &rows).with_context(|| format!("writing records to {}", path.display()))?;
        println!("Records exported to {}", path.display());
    }
    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    if let Err(e) = run(&args) {
        eprintln!("Error processing file: {:#}", e);
        std::process::exit(1);
    }
}
