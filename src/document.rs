//! PDF composition.
//!
//! Lays out the title, the three totals, the ranked months and the chart on
//! A4 pages using the built-in Helvetica fonts. The document carries no
//! timestamps or ids, so equal inputs give byte-equal output.
use crate::chart::{ChartImage, TransientChart};
use crate::error::{ReportError, Result};
use crate::reports::ranked_lines;
use crate::types::{Record, Summary, Totals};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, Stream};
use std::path::Path;
use tracing::{debug, warn};

pub const TITLE: &str = "Financial Report Summary";
pub const RANKED_HEADING: &str = "Top 5 Profitable Months";

const PT_PER_MM: f32 = 72.0 / 25.4;
const PAGE_WIDTH_MM: f32 = 210.0;
const PAGE_HEIGHT_MM: f32 = 297.0;
const MARGIN_MM: f32 = 10.0;
const BOTTOM_MARGIN_MM: f32 = 20.0;
const CELL_WIDTH_MM: f32 = 190.0;
const IMAGE_WIDTH_MM: f32 = 180.0;

const REGULAR: &str = "F1";
const BOLD: &str = "F2";
const CHART_XOBJECT: &str = "Im1";

/// A finished report. Nothing about it can change after composition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportDocument {
    bytes: Vec<u8>,
    lines: Vec<String>,
    page_count: usize,
    has_image: bool,
}

impl ReportDocument {
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Text lines in reading order, as printed on the page.
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn page_count(&self) -> usize {
        self.page_count
    }

    pub fn has_image(&self) -> bool {
        self.has_image
    }

    pub fn write_to(&self, path: &Path) -> Result<()> {
        std::fs::write(path, &self.bytes)?;
        Ok(())
    }
}

pub fn compose(totals: &Totals, ranked: &[&Record], chart: Option<&ChartImage>) -> Result<ReportDocument> {
    let summary = Summary::from_totals(totals);
    let mut layout = PageLayout::new();

    layout.text(TITLE, BOLD, 16.0, 10.0, Align::Center);
    layout.space(10.0);
    for line in summary.lines() {
        layout.text(&line, REGULAR, 12.0, 10.0, Align::Left);
    }
    layout.space(10.0);
    layout.text(RANKED_HEADING, BOLD, 12.0, 10.0, Align::Left);
    for line in ranked_lines(ranked) {
        layout.text(&line, REGULAR, 11.0, 8.0, Align::Left);
    }
    layout.space(5.0);
    if let Some(image) = chart {
        layout.image(image);
    }

    let has_image = chart.is_some();
    let (bytes, page_count, lines) = layout.finish(chart)?;
    debug!(
        "composed report: {} pages, {} bytes, image: {}",
        page_count,
        bytes.len(),
        has_image
    );
    Ok(ReportDocument {
        bytes,
        lines,
        page_count,
        has_image,
    })
}

/// Compose with the chart read back from its transient file. A file that has
/// already disappeared only drops the image section.
pub fn compose_with_transient(
    totals: &Totals,
    ranked: &[&Record],
    chart: &TransientChart,
) -> Result<ReportDocument> {
    match chart.load() {
        Ok(image) => compose(totals, ranked, Some(&image)),
        Err(err @ ReportError::ResourceUnavailable { .. }) => {
            warn!("{}; omitting chart from report", err);
            compose(totals, ranked, None)
        }
        Err(err) => Err(err),
    }
}

#[derive(Debug, Clone, Copy)]
enum Align {
    Left,
    Center,
}

/// Top-down cursor over A4 pages, in millimetres.
struct PageLayout {
    pages: Vec<Vec<Operation>>,
    current: Vec<Operation>,
    y: f32,
    lines: Vec<String>,
}

impl PageLayout {
    fn new() -> Self {
        PageLayout {
            pages: Vec::new(),
            current: Vec::new(),
            y: MARGIN_MM,
            lines: Vec::new(),
        }
    }

    fn ensure_room(&mut self, height: f32) {
        if self.y + height > PAGE_HEIGHT_MM - BOTTOM_MARGIN_MM && !self.current.is_empty() {
            self.pages.push(std::mem::take(&mut self.current));
            self.y = MARGIN_MM;
        }
    }

    fn space(&mut self, height: f32) {
        self.y += height;
    }

    fn text(&mut self, text: &str, font: &str, size: f32, height: f32, align: Align) {
        self.ensure_room(height);
        let x = match align {
            Align::Left => MARGIN_MM + 1.0,
            Align::Center => MARGIN_MM + (CELL_WIDTH_MM - estimate_width_mm(text, size)) / 2.0,
        };
        // baseline sits roughly in the middle of the cell
        let baseline = self.y + height / 2.0 + size * 0.3 / PT_PER_MM;
        self.current.extend([
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec![font.into(), size.into()]),
            Operation::new("Td", vec![pt(x).into(), pt(PAGE_HEIGHT_MM - baseline).into()]),
            Operation::new("Tj", vec![Object::string_literal(text)]),
            Operation::new("ET", vec![]),
        ]);
        self.lines.push(text.to_string());
        self.y += height;
    }

    fn image(&mut self, image: &ChartImage) {
        let height = IMAGE_WIDTH_MM * image.height() as f32 / image.width().max(1) as f32;
        self.ensure_room(height);
        let bottom = PAGE_HEIGHT_MM - self.y - height;
        self.current.extend([
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![
                    pt(IMAGE_WIDTH_MM).into(),
                    0i64.into(),
                    0i64.into(),
                    pt(height).into(),
                    pt(MARGIN_MM).into(),
                    pt(bottom).into(),
                ],
            ),
            Operation::new("Do", vec![CHART_XOBJECT.into()]),
            Operation::new("Q", vec![]),
        ]);
        self.y += height;
    }

    fn finish(mut self, chart: Option<&ChartImage>) -> Result<(Vec<u8>, usize, Vec<String>)> {
        if !self.current.is_empty() || self.pages.is_empty() {
            self.pages.push(std::mem::take(&mut self.current));
        }

        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let regular_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
            "Encoding" => "WinAnsiEncoding",
        });
        let bold_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica-Bold",
            "Encoding" => "WinAnsiEncoding",
        });
        let mut resources = dictionary! {
            "Font" => dictionary! {
                REGULAR => regular_id,
                BOLD => bold_id,
            },
        };
        if let Some(image) = chart {
            let image_id = doc.add_object(image_xobject(image));
            resources.set("XObject", dictionary! { CHART_XOBJECT => image_id });
        }
        let resources_id = doc.add_object(resources);

        let page_count = self.pages.len();
        let mut kids: Vec<Object> = Vec::with_capacity(page_count);
        for operations in self.pages {
            let content = Content { operations };
            let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));
            let page_id: ObjectId = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
                "Resources" => resources_id,
            });
            kids.push(page_id.into());
        }
        let media_box: Vec<Object> = vec![
            0i64.into(),
            0i64.into(),
            pt(PAGE_WIDTH_MM).into(),
            pt(PAGE_HEIGHT_MM).into(),
        ];
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => page_count as i64,
                "MediaBox" => media_box,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        doc.compress();

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes)?;
        Ok((bytes, page_count, self.lines))
    }
}

fn image_xobject(image: &ChartImage) -> Stream {
    Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => image.width() as i64,
            "Height" => image.height() as i64,
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8i64,
        },
        image.rgb().to_vec(),
    )
}

fn pt(mm: f32) -> f32 {
    mm * PT_PER_MM
}

/// Rough Helvetica advance width; only used to centre the title.
fn estimate_width_mm(text: &str, size: f32) -> f32 {
    text.chars().count() as f32 * size * 0.55 / PT_PER_MM
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::{render_chart, ChartConfig};
    use crate::reports::{augment, top_by_profit, totals, TOP_N};
    use crate::types::Entry;
    use chrono::NaiveDate;

    fn records() -> Vec<Record> {
        let entries: Vec<Entry> = [(1, 1000.0, 400.0), (2, 1200.0, 900.0), (3, 500.0, 100.0)]
            .iter()
            .map(|&(m, revenue, expenses)| Entry {
                date: NaiveDate::from_ymd_opt(2024, m, 1).unwrap(),
                revenue,
                expenses,
            })
            .collect();
        augment(&entries)
    }

    fn page_text(bytes: &[u8]) -> String {
        let doc = Document::load_mem(bytes).unwrap();
        let mut text = String::new();
        for page_id in doc.get_pages().values() {
            let content = doc.get_page_content(*page_id).unwrap();
            text.push_str(&String::from_utf8_lossy(&content));
        }
        text
    }

    fn small_chart(recs: &[Record]) -> ChartImage {
        let config = ChartConfig {
            width: 400,
            height: 240,
            ..ChartConfig::default()
        };
        render_chart(recs, &config).unwrap()
    }

    #[test]
    fn text_sections_in_order() {
        let recs = records();
        let ranked = top_by_profit(&recs, TOP_N);
        let doc = compose(&totals(&recs), &ranked, None).unwrap();
        assert_eq!(
            doc.lines(),
            [
                "Financial Report Summary",
                "Total Revenue: $2,700.00",
                "Total Expenses: $1,400.00",
                "Net Profit: $1,300.00",
                "Top 5 Profitable Months",
                "2024-01: $600.00",
                "2024-03: $400.00",
                "2024-02: $300.00",
            ]
        );
        assert_eq!(doc.page_count(), 1);
        assert!(!doc.has_image());
    }

    #[test]
    fn output_is_a_parseable_pdf_with_the_text() {
        let recs = records();
        let ranked = top_by_profit(&recs, TOP_N);
        let doc = compose(&totals(&recs), &ranked, None).unwrap();
        assert!(doc.bytes().starts_with(b"%PDF-1.5"));
        let text = page_text(doc.bytes());
        assert!(text.contains("(Net Profit: $1,300.00) Tj"));
        assert!(text.contains("(2024-03: $400.00) Tj"));
        assert!(!text.contains("/Im1 Do"));
    }

    #[test]
    fn chart_is_embedded_as_image_xobject() {
        let recs = records();
        let ranked = top_by_profit(&recs, TOP_N);
        let chart = small_chart(&recs);
        let doc = compose(&totals(&recs), &ranked, Some(&chart)).unwrap();
        assert!(doc.has_image());
        assert!(page_text(doc.bytes()).contains("/Im1 Do"));

        let parsed = Document::load_mem(doc.bytes()).unwrap();
        let image = parsed
            .objects
            .values()
            .filter_map(|o| o.as_stream().ok())
            .find(|s| s.dict.get(b"Subtype").and_then(Object::as_name).ok() == Some(&b"Image"[..]))
            .expect("image stream");
        assert_eq!(image.dict.get(b"Width").and_then(Object::as_i64).unwrap(), 400);
        assert_eq!(image.dict.get(b"Height").and_then(Object::as_i64).unwrap(), 240);
    }

    #[test]
    fn composition_is_byte_deterministic() {
        let recs = records();
        let ranked = top_by_profit(&recs, TOP_N);
        let chart = small_chart(&recs);
        let a = compose(&totals(&recs), &ranked, Some(&chart)).unwrap();
        let b = compose(&totals(&recs), &ranked, Some(&chart)).unwrap();
        assert_eq!(a.bytes(), b.bytes());
    }

    #[test]
    fn tall_image_moves_to_next_page() {
        let recs = records();
        let ranked = top_by_profit(&recs, TOP_N);
        let config = ChartConfig {
            width: 300,
            height: 450,
            ..ChartConfig::default()
        };
        let chart = render_chart(&recs, &config).unwrap();
        let doc = compose(&totals(&recs), &ranked, Some(&chart)).unwrap();
        assert_eq!(doc.page_count(), 2);
        assert_eq!(Document::load_mem(doc.bytes()).unwrap().get_pages().len(), 2);
    }

    #[test]
    fn deleted_transient_chart_only_drops_the_image() {
        let recs = records();
        let ranked = top_by_profit(&recs, TOP_N);
        let transient = TransientChart::persist(&small_chart(&recs)).unwrap();
        std::fs::remove_file(transient.path()).unwrap();

        let doc = compose_with_transient(&totals(&recs), &ranked, &transient).unwrap();
        assert!(!doc.has_image());
        assert!(doc.lines().contains(&"Net Profit: $1,300.00".to_string()));
        assert!(doc.lines().contains(&"2024-01: $600.00".to_string()));
    }

    #[test]
    fn present_transient_chart_is_embedded() {
        let recs = records();
        let ranked = top_by_profit(&recs, TOP_N);
        let transient = TransientChart::persist(&small_chart(&recs)).unwrap();
        let doc = compose_with_transient(&totals(&recs), &ranked, &transient).unwrap();
        assert!(doc.has_image());
    }

    #[test]
    fn empty_ranking_still_has_heading() {
        let doc = compose(&Totals::default(), &[], None).unwrap();
        assert_eq!(doc.lines().len(), 5);
        assert_eq!(doc.lines()[3], "Net Profit: $0.00");
    }
}
