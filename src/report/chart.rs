use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDateTime};
use image::{ImageFormat, RgbaImage};
use xmlwriter::{Indent, Options, XmlWriter};

use crate::config::ReportConfig;
use crate::data::model::Dataset;
use crate::error::ReportError;

// ---------------------------------------------------------------------------
// Layout
// ---------------------------------------------------------------------------

const MARGIN_LEFT: f64 = 90.0;
const MARGIN_RIGHT: f64 = 30.0;
const MARGIN_TOP: f64 = 50.0;
const MARGIN_BOTTOM: f64 = 130.0;

const X_TICKS: usize = 8;
const Y_TICKS: usize = 6;

const FONT: &str = "DejaVu Sans, Liberation Sans, Arial, Helvetica, sans-serif";
const SERIES_COLOR: &str = "blue";
const GRID_COLOR: &str = "#d9d9d9";
const LEGEND_BORDER: &str = "#cccccc";

/// Legend label for the single series.
pub fn series_label(window: usize) -> String {
    format!("Smoothed values (window={window})")
}

/// Chart title naming the source file.
pub fn chart_title(source_name: &str) -> String {
    format!("Smoothed Total Dizbalance from {source_name}")
}

/// Seconds since the epoch, used as the x coordinate.
fn seconds(t: NaiveDateTime) -> f64 {
    t.and_utc().timestamp() as f64
}

/// Horizontal data range: the time span of every remaining record.
pub fn x_domain(dataset: &Dataset) -> Option<(f64, f64)> {
    let (min, max) = dataset.time_span()?;
    let (lo, hi) = (seconds(min), seconds(max));
    if hi > lo {
        Some((lo, hi))
    } else {
        // Single timestamp: show half an hour either side.
        Some((lo - 1800.0, hi + 1800.0))
    }
}

/// Vertical data range over the smoothed values, padded by 5%.
pub fn y_domain(dataset: &Dataset) -> Option<(f64, f64)> {
    let (min, max) = dataset
        .smoothed_points()
        .map(|(_, v)| v)
        .fold(None, |acc: Option<(f64, f64)>, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })?;
    let span = max - min;
    if span.abs() < 1e-12 {
        return Some((min - 1.0, max + 1.0));
    }
    Some((min - span * 0.05, max + span * 0.05))
}

/// Evenly spaced values from `start` to `end` inclusive.
fn linspace(start: f64, end: f64, steps: usize) -> Vec<f64> {
    if steps < 2 {
        return vec![start, end];
    }
    let step = (end - start) / (steps as f64 - 1.0);
    (0..steps).map(|i| start + step * i as f64).collect()
}

/// Round-number ticks (1/2/5 × 10^k) covering `[min, max]`.
pub fn nice_ticks(min: f64, max: f64, target: usize) -> Vec<f64> {
    let span = max - min;
    if !(span > 0.0) || target == 0 {
        return vec![min];
    }
    let raw = span / target as f64;
    let magnitude = 10f64.powf(raw.log10().floor());
    let step = match raw / magnitude {
        n if n <= 1.0 => 1.0,
        n if n <= 2.0 => 2.0,
        n if n <= 5.0 => 5.0,
        _ => 10.0,
    } * magnitude;

    let mut ticks = Vec::new();
    let mut v = (min / step).ceil() * step;
    while v <= max + step * 1e-9 {
        // Avoid printing "-0".
        ticks.push(if v.abs() < step * 1e-9 { 0.0 } else { v });
        v += step;
    }
    ticks
}

fn format_value(v: f64) -> String {
    let s = format!("{v:.4}");
    let s = s.trim_end_matches('0').trim_end_matches('.');
    s.to_string()
}

pub(crate) fn format_time(secs: f64) -> String {
    DateTime::from_timestamp(secs.round() as i64, 0)
        .map(|t| t.naive_utc().format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_default()
}

// ---------------------------------------------------------------------------
// SVG document
// ---------------------------------------------------------------------------

/// Maps data coordinates into the plot rectangle.
struct Frame {
    left: f64,
    right: f64,
    top: f64,
    bottom: f64,
    x: (f64, f64),
    y: (f64, f64),
}

impl Frame {
    fn px(&self, x: f64) -> f64 {
        let span = (self.x.1 - self.x.0).max(1e-12);
        self.left + (x - self.x.0) / span * (self.right - self.left)
    }

    fn py(&self, y: f64) -> f64 {
        let span = (self.y.1 - self.y.0).max(1e-12);
        self.bottom - (y - self.y.0) / span * (self.bottom - self.top)
    }
}

/// Coordinate attribute value with one decimal.
fn fixed(v: f64) -> String {
    format!("{v:.1}")
}

/// `<text>` element; the body is escaped by the writer.
fn text_element(svg: &mut XmlWriter, attrs: &[(&str, String)], body: &str) {
    svg.start_element("text");
    for (name, value) in attrs {
        svg.write_attribute(name, value);
    }
    svg.write_text(body);
    svg.end_element();
}

/// `<line>` element from `(x1, y1)` to `(x2, y2)`.
fn line_element(svg: &mut XmlWriter, from: (f64, f64), to: (f64, f64), stroke: &str, width: f64) {
    svg.start_element("line");
    svg.write_attribute("x1", &fixed(from.0));
    svg.write_attribute("y1", &fixed(from.1));
    svg.write_attribute("x2", &fixed(to.0));
    svg.write_attribute("y2", &fixed(to.1));
    svg.write_attribute("stroke", stroke);
    svg.write_attribute("stroke-width", &width);
    svg.end_element();
}

/// Path data for the smoothed series; a new subpath starts after every gap.
fn series_path(dataset: &Dataset, frame: &Frame) -> String {
    let mut commands = Vec::new();
    let mut pen_down = false;
    for record in &dataset.records {
        match record.smoothed {
            Some(v) => {
                let cmd = if pen_down { 'L' } else { 'M' };
                commands.push(format!(
                    "{cmd}{:.2},{:.2}",
                    frame.px(seconds(record.time)),
                    frame.py(v)
                ));
                pen_down = true;
            }
            None => pen_down = false,
        }
    }
    commands.join(" ")
}

/// Build the chart as an SVG document.
pub fn chart_svg(dataset: &Dataset, window: usize, source_name: &str, config: &ReportConfig) -> String {
    let (w, h) = (config.chart_width as f64, config.chart_height as f64);
    let x_dom = x_domain(dataset);
    let y_dom = y_domain(dataset);
    let frame = Frame {
        left: MARGIN_LEFT,
        right: w - MARGIN_RIGHT,
        top: MARGIN_TOP,
        bottom: h - MARGIN_BOTTOM,
        x: x_dom.unwrap_or((0.0, 1.0)),
        y: y_dom.unwrap_or((0.0, 1.0)),
    };

    let mut svg = XmlWriter::new(Options {
        indent: Indent::None,
        ..Options::default()
    });
    svg.start_element("svg");
    svg.write_attribute("xmlns", "http://www.w3.org/2000/svg");
    svg.write_attribute("width", &w);
    svg.write_attribute("height", &h);
    svg.write_attribute("viewBox", &format!("0 0 {w} {h}"));
    svg.write_attribute("font-family", FONT);

    svg.start_element("rect");
    svg.write_attribute("width", &w);
    svg.write_attribute("height", &h);
    svg.write_attribute("fill", "white");
    svg.end_element();

    // Grid and tick labels.
    if x_dom.is_some() {
        for x in linspace(frame.x.0, frame.x.1, X_TICKS) {
            let px = frame.px(x);
            line_element(&mut svg, (px, frame.top), (px, frame.bottom), GRID_COLOR, 1.0);
            text_element(
                &mut svg,
                &[
                    (
                        "transform",
                        format!("translate({px:.1},{:.1}) rotate(-45)", frame.bottom + 16.0),
                    ),
                    ("text-anchor", "end".into()),
                    ("font-size", "12".into()),
                ],
                &format_time(x),
            );
        }
    }
    for y in nice_ticks(frame.y.0, frame.y.1, Y_TICKS) {
        let py = frame.py(y);
        line_element(&mut svg, (frame.left, py), (frame.right, py), GRID_COLOR, 1.0);
        text_element(
            &mut svg,
            &[
                ("x", fixed(frame.left - 8.0)),
                ("y", fixed(py + 4.0)),
                ("text-anchor", "end".into()),
                ("font-size", "12".into()),
            ],
            &format_value(y),
        );
    }

    // Plot frame.
    svg.start_element("rect");
    svg.write_attribute("x", &fixed(frame.left));
    svg.write_attribute("y", &fixed(frame.top));
    svg.write_attribute("width", &fixed(frame.right - frame.left));
    svg.write_attribute("height", &fixed(frame.bottom - frame.top));
    svg.write_attribute("fill", "none");
    svg.write_attribute("stroke", "black");
    svg.write_attribute("stroke-width", "1");
    svg.end_element();

    let path = series_path(dataset, &frame);
    if path.is_empty() {
        text_element(
            &mut svg,
            &[
                ("x", fixed((frame.left + frame.right) / 2.0)),
                ("y", fixed((frame.top + frame.bottom) / 2.0)),
                ("text-anchor", "middle".into()),
                ("font-size", "16".into()),
                ("fill", "gray".into()),
            ],
            "No data",
        );
    } else {
        svg.start_element("path");
        svg.write_attribute("d", &path);
        svg.write_attribute("fill", "none");
        svg.write_attribute("stroke", SERIES_COLOR);
        svg.write_attribute("stroke-width", "1.5");
        svg.write_attribute("stroke-linejoin", "round");
        svg.end_element();
    }

    // Legend (top right, inside the frame).
    let label = series_label(window);
    let legend_w = 60.0 + label.chars().count() as f64 * 7.0;
    let (lx, ly) = (frame.right - legend_w - 10.0, frame.top + 10.0);
    svg.start_element("rect");
    svg.write_attribute("x", &fixed(lx));
    svg.write_attribute("y", &fixed(ly));
    svg.write_attribute("width", &fixed(legend_w));
    svg.write_attribute("height", "28");
    svg.write_attribute("fill", "white");
    svg.write_attribute("fill-opacity", "0.8");
    svg.write_attribute("stroke", LEGEND_BORDER);
    svg.end_element();
    line_element(&mut svg, (lx + 10.0, ly + 14.0), (lx + 40.0, ly + 14.0), SERIES_COLOR, 1.5);
    text_element(
        &mut svg,
        &[
            ("x", fixed(lx + 48.0)),
            ("y", fixed(ly + 19.0)),
            ("font-size", "13".into()),
        ],
        &label,
    );

    // Title and axis labels.
    text_element(
        &mut svg,
        &[
            ("x", fixed(w / 2.0)),
            ("y", "30".into()),
            ("text-anchor", "middle".into()),
            ("font-size", "18".into()),
        ],
        &chart_title(source_name),
    );
    text_element(
        &mut svg,
        &[
            ("x", fixed((frame.left + frame.right) / 2.0)),
            ("y", fixed(h - 12.0)),
            ("text-anchor", "middle".into()),
            ("font-size", "14".into()),
        ],
        "Time",
    );
    text_element(
        &mut svg,
        &[
            (
                "transform",
                format!("translate(24,{:.1}) rotate(-90)", (frame.top + frame.bottom) / 2.0),
            ),
            ("text-anchor", "middle".into()),
            ("font-size", "14".into()),
        ],
        "Value",
    );

    svg.end_document()
}

// ---------------------------------------------------------------------------
// Rasterization
// ---------------------------------------------------------------------------

/// Rasterize an SVG document using system fonts.
pub fn rasterize(svg: &str) -> Result<RgbaImage> {
    let mut opt = usvg::Options::default();
    opt.fontdb_mut().load_system_fonts();
    let tree = usvg::Tree::from_str(svg, &opt).context("parsing chart SVG")?;

    let size = tree.size().to_int_size();
    let mut pixmap =
        tiny_skia::Pixmap::new(size.width(), size.height()).context("allocating chart pixmap")?;
    let mut canvas = pixmap.as_mut();
    resvg::render(&tree, tiny_skia::Transform::default(), &mut canvas);

    // Opaque background, so premultiplied and straight alpha agree.
    RgbaImage::from_raw(size.width(), size.height(), pixmap.take())
        .context("pixmap does not match chart size")
}

/// Render the chart and write it to `out_path` as PNG, replacing any existing file.
pub fn render_png(
    dataset: &Dataset,
    window: usize,
    source_name: &str,
    out_path: &Path,
    config: &ReportConfig,
) -> Result<(), ReportError> {
    let svg = chart_svg(dataset, window, source_name, config);
    let written = rasterize(&svg).and_then(|img| {
        img.save_with_format(out_path, ImageFormat::Png)
            .with_context(|| format!("writing {}", out_path.display()))
    });
    written.map_err(|e| {
        log::error!("Chart rendering failed: {e:#}");
        ReportError::Render(e)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::Record;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    fn at(m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, m, 0)
            .unwrap()
    }

    fn dataset(points: &[(u32, Option<f64>)]) -> Dataset {
        Dataset {
            records: points
                .iter()
                .map(|&(m, s)| Record {
                    time: at(m),
                    total: s,
                    smoothed: s,
                })
                .collect(),
            dropped: 0,
        }
    }

    fn test_frame(ds: &Dataset) -> Frame {
        Frame {
            left: 0.0,
            right: 100.0,
            top: 0.0,
            bottom: 100.0,
            x: x_domain(ds).unwrap(),
            y: y_domain(ds).unwrap(),
        }
    }

    #[test]
    fn nice_ticks_use_round_steps() {
        assert_eq!(nice_ticks(0.0, 10.0, 5), vec![0.0, 2.0, 4.0, 6.0, 8.0, 10.0]);
        assert_eq!(nice_ticks(-1.0, 1.0, 4), vec![-1.0, -0.5, 0.0, 0.5, 1.0]);
        assert_eq!(nice_ticks(5.0, 5.0, 6), vec![5.0]);
    }

    #[test]
    fn domains_cover_data() {
        let ds = dataset(&[(0, None), (5, Some(10.0)), (10, Some(30.0))]);
        let (x0, x1) = x_domain(&ds).unwrap();
        assert_relative_eq!(x1 - x0, 600.0);
        let (y0, y1) = y_domain(&ds).unwrap();
        assert_relative_eq!(y0, 9.0);
        assert_relative_eq!(y1, 31.0);
    }

    #[test]
    fn flat_series_gets_unit_padding() {
        let ds = dataset(&[(0, Some(4.0))]);
        assert_eq!(y_domain(&ds), Some((3.0, 5.0)));
        let (x0, x1) = x_domain(&ds).unwrap();
        assert_relative_eq!(x1 - x0, 3600.0);
    }

    #[test]
    fn svg_has_labels_legend_and_breaks_at_gaps() {
        let ds = dataset(&[(0, Some(1.0)), (5, None), (10, Some(2.0)), (15, Some(3.0))]);
        let svg = chart_svg(&ds, 7, "a&b.xlsx", &ReportConfig::default());

        assert!(svg.contains("Smoothed values (window=7)"));
        assert!(svg.contains("Smoothed Total Dizbalance from a&amp;b.xlsx"));
        assert!(svg.contains("rotate(-45)"));
        assert!(svg.contains("2024-01-01 00:00"));
        assert!(svg.contains(">Time<") && svg.contains(">Value<"));

        let path = series_path(&ds, &test_frame(&ds));
        assert_eq!(path.matches('M').count(), 2);
        assert_eq!(path.matches('L').count(), 1);
        assert!(svg.contains(&format!(r#"d="{path}""#)));
    }

    #[test]
    fn markup_in_names_is_escaped_and_document_parses() {
        let ds = dataset(&[(0, Some(1.0)), (5, Some(2.0))]);
        let svg = chart_svg(&ds, 3, "<q>&\"r\".csv", &ReportConfig::default());

        assert!(svg.contains("from &lt;q&gt;&amp;"));
        assert!(!svg.contains("<q>"));
        // Tick labels go through the same writer as the title.
        assert!(svg.contains(">2024-01-01 00:00</text>"));
        usvg::Tree::from_str(&svg, &usvg::Options::default()).unwrap();
    }

    #[test]
    fn empty_dataset_renders_placeholder() {
        let svg = chart_svg(&Dataset::default(), 20, "x.csv", &ReportConfig::default());
        assert!(svg.contains("No data"));
        assert!(!svg.contains("<path"));
    }

    #[test]
    fn png_is_written_at_configured_size() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("chart.png");
        let config = ReportConfig {
            chart_width: 400,
            chart_height: 300,
            ..ReportConfig::default()
        };
        render_png(&dataset(&[(0, Some(1.0)), (5, Some(2.0))]), 1, "x.csv", &out, &config).unwrap();

        let img = image::open(&out).unwrap();
        assert_eq!((img.width(), img.height()), (400, 300));
    }

    #[test]
    fn unwritable_output_is_a_render_error() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("missing-dir").join("chart.png");
        let err = render_png(&Dataset::default(), 1, "x", &out, &ReportConfig::default()).unwrap_err();
        assert!(matches!(err, ReportError::Render(_)));
    }
}
