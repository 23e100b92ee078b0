use crate::error::{ReportError, Result};
use crate::types::Record;
use crate::util::{format_number, format_year_month};
use chrono::{Datelike, Months, NaiveDate};
use image::codecs::png::PngEncoder;
use image::{ColorType, ImageEncoder, ImageFormat};
use plotters::coord::Shift;
use plotters::drawing::DrawingAreaErrorKind;
use plotters::prelude::*;
use std::ops::Range;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::debug;
use uuid::Uuid;

const REVENUE_COLOR: RGBColor = RGBColor(31, 119, 180);
const EXPENSES_COLOR: RGBColor = RGBColor(255, 127, 14);
const PROFIT_COLOR: RGBColor = RGBColor(44, 160, 44);

/// Fixed chart settings. Identical records and config give identical pixels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartConfig {
    pub width: u32,
    pub height: u32,
    pub title: String,
}

impl Default for ChartConfig {
    fn default() -> Self {
        ChartConfig {
            width: 1000,
            height: 500,
            title: "Monthly Financial Overview".to_string(),
        }
    }
}

/// An RGB raster, 3 bytes per pixel, rows top to bottom.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartImage {
    width: u32,
    height: u32,
    rgb: Vec<u8>,
}

impl ChartImage {
    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn rgb(&self) -> &[u8] {
        &self.rgb
    }

    pub fn to_png(&self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        PngEncoder::new(&mut out).write_image(&self.rgb, self.width, self.height, ColorType::Rgb8)?;
        Ok(out)
    }

    pub fn from_png(bytes: &[u8]) -> Result<Self> {
        let img = image::load_from_memory_with_format(bytes, ImageFormat::Png)?.to_rgb8();
        let (width, height) = img.dimensions();
        Ok(ChartImage {
            width,
            height,
            rgb: img.into_raw(),
        })
    }
}

/// Draw revenue, expenses and profit as three labelled lines over the months.
///
/// Points sit on a monthly time axis, so gaps between months stay visible.
/// The caller's slice is not reordered. An empty slice is an error rather
/// than a blank chart.
pub fn render_chart(records: &[Record], config: &ChartConfig) -> Result<ChartImage> {
    if records.is_empty() {
        return Err(ReportError::EmptyDataset);
    }
    if config.width == 0 || config.height == 0 {
        return Err(ReportError::Chart(format!(
            "chart size must be non-zero, got {}x{}",
            config.width, config.height
        )));
    }
    let mut points: Vec<&Record> = records.iter().collect();
    points.sort_by_key(|r| r.date());

    let mut rgb = vec![0u8; config.width as usize * config.height as usize * 3];
    {
        let root = BitMapBackend::with_buffer(&mut rgb, (config.width, config.height))
            .into_drawing_area();
        draw(&root, &points, config).map_err(|e| ReportError::Chart(e.to_string()))?;
        root.present().map_err(|e| ReportError::Chart(e.to_string()))?;
    }
    debug!(
        "rendered {}x{} chart for {} months",
        config.width,
        config.height,
        points.len()
    );
    Ok(ChartImage {
        width: config.width,
        height: config.height,
        rgb,
    })
}

fn draw<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    points: &[&Record],
    config: &ChartConfig,
) -> std::result::Result<(), DrawingAreaErrorKind<DB::ErrorType>> {
    root.fill(&WHITE)?;

    let (y_min, y_max) = value_range(points);

    let mut chart = ChartBuilder::on(root)
        .caption(&config.title, ("sans-serif", 24))
        .margin(15)
        .x_label_area_size(40)
        .y_label_area_size(80)
        .build_cartesian_2d(month_axis(points).monthly(), y_min..y_max)?;

    chart
        .configure_mesh()
        .x_labels(12)
        .x_label_formatter(&|d: &NaiveDate| format_year_month(*d))
        .y_label_formatter(&|v: &f64| format_number(*v, 0))
        .x_desc("Date")
        .y_desc("Amount ($)")
        .draw()?;

    let series: [(&str, RGBColor, fn(&Record) -> f64); 3] = [
        ("Revenue", REVENUE_COLOR, Record::revenue),
        ("Expenses", EXPENSES_COLOR, Record::expenses),
        ("Profit", PROFIT_COLOR, Record::profit),
    ];
    for (label, color, value) in series {
        let line = points.iter().copied().map(|r| (r.date(), value(r)));
        chart
            .draw_series(LineSeries::new(line, color.stroke_width(2)).point_size(3))?
            .label(label)
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2)));
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperRight)
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;
    Ok(())
}

/// Month-aligned x bounds with one spare month on each side of the data.
fn month_axis(points: &[&Record]) -> Range<NaiveDate> {
    let first = points.first().map(|r| r.date()).unwrap_or_default();
    let last = points.last().map(|r| r.date()).unwrap_or(first);
    let start = first.with_day(1).unwrap_or(first);
    let start = start.checked_sub_months(Months::new(1)).unwrap_or(start);
    let end = last.with_day(1).unwrap_or(last);
    let end = end.checked_add_months(Months::new(1)).unwrap_or(end);
    start..end
}

/// Y bounds covering all three series with a 10% margin.
fn value_range(points: &[&Record]) -> (f64, f64) {
    let values = points
        .iter()
        .flat_map(|r| [r.revenue(), r.expenses(), r.profit()]);
    let (min, max) = values.fold((f64::MAX, f64::MIN), |(lo, hi), v| (lo.min(v), hi.max(v)));
    let pad = if (max - min).abs() < f64::EPSILON {
        (max.abs() * 0.1).max(1.0)
    } else {
        (max - min) * 0.1
    };
    (min - pad, max + pad)
}

/// A chart written to a temp file for consumers that need a path.
///
/// Each handle owns a fresh temp directory and a uuid-named PNG inside it, so
/// concurrent runs never share a file. Dropping the handle removes both.
#[derive(Debug)]
pub struct TransientChart {
    _dir: TempDir,
    path: PathBuf,
}

impl TransientChart {
    pub fn persist(image: &ChartImage) -> Result<Self> {
        let dir = tempfile::Builder::new().prefix("financial-report-").tempdir()?;
        let path = dir.path().join(format!("chart-{}.png", Uuid::new_v4()));
        std::fs::write(&path, image.to_png()?)?;
        debug!("chart written to {}", path.display());
        Ok(TransientChart { _dir: dir, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<ChartImage> {
        let bytes = std::fs::read(&self.path).map_err(|source| ReportError::ResourceUnavailable {
            path: self.path.clone(),
            source,
        })?;
        ChartImage::from_png(&bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reports::augment;
    use crate::types::Entry;
    use chrono::NaiveDate;

    fn records() -> Vec<Record> {
        let entries = [(3, 500.0, 100.0), (1, 1000.0, 400.0), (2, 1200.0, 900.0)]
            .iter()
            .map(|&(m, revenue, expenses)| Entry {
                date: NaiveDate::from_ymd_opt(2024, m, 1).unwrap(),
                revenue,
                expenses,
            })
            .collect::<Vec<_>>();
        augment(&entries)
    }

    fn small() -> ChartConfig {
        ChartConfig {
            width: 320,
            height: 200,
            ..ChartConfig::default()
        }
    }

    #[test]
    fn empty_dataset_is_rejected() {
        let err = render_chart(&[], &ChartConfig::default()).unwrap_err();
        assert!(matches!(err, ReportError::EmptyDataset));
    }

    #[test]
    fn renders_configured_size() {
        let img = render_chart(&records(), &small()).unwrap();
        assert_eq!((img.width(), img.height()), (320, 200));
        assert_eq!(img.rgb().len(), 320 * 200 * 3);
        // something other than the white background was drawn
        assert!(img.rgb().iter().any(|&b| b != 255));
    }

    #[test]
    fn rendering_is_deterministic() {
        let a = render_chart(&records(), &small()).unwrap();
        let b = render_chart(&records(), &small()).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.to_png().unwrap(), b.to_png().unwrap());
    }

    #[test]
    fn single_record_still_renders() {
        let recs = records();
        assert!(render_chart(&recs[..1], &small()).is_ok());
    }

    #[test]
    fn zero_sized_chart_is_rejected() {
        for (width, height) in [(0, 200), (320, 0)] {
            let config = ChartConfig {
                width,
                height,
                ..ChartConfig::default()
            };
            assert!(matches!(
                render_chart(&records(), &config),
                Err(ReportError::Chart(_))
            ));
        }
    }

    #[test]
    fn month_axis_pads_one_month_each_side() {
        let recs = records();
        let mut refs: Vec<&Record> = recs.iter().collect();
        refs.sort_by_key(|r| r.date());
        let axis = month_axis(&refs);
        assert_eq!(axis.start, NaiveDate::from_ymd_opt(2023, 12, 1).unwrap());
        assert_eq!(axis.end, NaiveDate::from_ymd_opt(2024, 4, 1).unwrap());
    }

    #[test]
    fn gapped_months_are_spaced_by_time() {
        let entries: Vec<Entry> = [1, 2, 6]
            .iter()
            .map(|&m| Entry {
                date: NaiveDate::from_ymd_opt(2024, m, 1).unwrap(),
                revenue: 100.0,
                expenses: 50.0,
            })
            .collect();
        let recs = augment(&entries);
        let refs: Vec<&Record> = recs.iter().collect();
        let axis = month_axis(&refs).monthly();
        let x = |r: &Record| axis.map(&r.date(), (0, 1000));
        let (jan, feb, jun) = (x(&recs[0]), x(&recs[1]), x(&recs[2]));
        assert!(jun - feb > 3 * (feb - jan));
        assert!(render_chart(&recs, &small()).is_ok());
    }

    #[test]
    fn png_round_trip_preserves_pixels() {
        let img = render_chart(&records(), &small()).unwrap();
        let back = ChartImage::from_png(&img.to_png().unwrap()).unwrap();
        assert_eq!(back, img);
    }

    #[test]
    fn value_range_pads_flat_series() {
        let entries = [Entry {
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            revenue: 0.0,
            expenses: 0.0,
        }];
        let recs = augment(&entries);
        let refs: Vec<&Record> = recs.iter().collect();
        assert_eq!(value_range(&refs), (-1.0, 1.0));
    }

    #[test]
    fn transient_chart_lifecycle() {
        let img = render_chart(&records(), &small()).unwrap();
        let transient = TransientChart::persist(&img).unwrap();
        let path = transient.path().to_path_buf();
        assert!(path.exists());
        assert!(path.file_name().unwrap().to_string_lossy().starts_with("chart-"));
        assert_eq!(transient.load().unwrap(), img);

        let other = TransientChart::persist(&img).unwrap();
        assert_ne!(other.path(), transient.path());

        drop(transient);
        assert!(!path.exists());
    }

    #[test]
    fn missing_transient_file_is_resource_unavailable() {
        let img = render_chart(&records(), &small()).unwrap();
        let transient = TransientChart::persist(&img).unwrap();
        std::fs::remove_file(transient.path()).unwrap();
        assert!(matches!(
            transient.load(),
            Err(ReportError::ResourceUnavailable { .. })
        ));
    }
}
