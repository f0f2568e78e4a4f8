//! One pipeline run: load → normalize → smooth → render.

pub mod chart;

use std::path::{Path, PathBuf};

use crate::config::ReportConfig;
use crate::data::model::Dataset;
use crate::data::{loader, normalize, smooth};
use crate::error::Result;

/// Outcome of a successful run, kept by the UI for display.
#[derive(Debug, Clone)]
pub struct Report {
    pub source: PathBuf,
    pub output: PathBuf,
    pub window: usize,
    pub dataset: Dataset,
}

/// Where the chart for `source` is written: next to it, under a fixed name.
pub fn output_path(source: &Path, config: &ReportConfig) -> PathBuf {
    source
        .parent()
        .unwrap_or_else(|| Path::new(""))
        .join(&config.output_file_name)
}

/// Run the whole pipeline for `source` with an already validated `window`.
pub fn run_report(source: &Path, window: usize, config: &ReportConfig) -> Result<Report> {
    log::info!("Processing {} with window {window}", source.display());

    let rows = loader::load_file(source, config)?;
    let cleaned = normalize::normalize(rows, &config.time_format)?;
    if cleaned.is_empty() {
        log::warn!("No rows with a valid time in {}", source.display());
    }
    let dataset = smooth::smooth(&cleaned, window)?;

    let output = output_path(source, config);
    let source_name = source
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    chart::render_png(&dataset, window, &source_name, &output, config)?;
    log::info!("Chart saved to {}", output.display());

    Ok(Report {
        source: source.to_path_buf(),
        output,
        window,
        dataset,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ReportError;
    use chrono::NaiveDate;

    fn write_csv(dir: &Path, body: &str) -> PathBuf {
        let path = dir.join("market_report.csv");
        std::fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn output_sits_next_to_source() {
        let config = ReportConfig::default();
        assert_eq!(
            output_path(Path::new("/data/in/market_report.xlsx"), &config),
            PathBuf::from("/data/in/market_report.png")
        );
        assert_eq!(
            output_path(Path::new("report.xlsx"), &config),
            PathBuf::from("market_report.png")
        );
    }

    #[test]
    fn window_one_reproduces_values_and_writes_chart() {
        let dir = tempfile::tempdir().unwrap();
        let source = write_csv(
            dir.path(),
            "Time,Total Dizbalance\n2024.01.01 00:00,10\n2024.01.01 00:05,20\n2024.01.01 00:10,30\n",
        );

        let report = run_report(&source, 1, &ReportConfig::default()).unwrap();

        let smoothed: Vec<_> = report.dataset.records.iter().map(|r| r.smoothed).collect();
        assert_eq!(smoothed, vec![Some(10.0), Some(20.0), Some(30.0)]);
        assert_eq!(report.output, dir.path().join("market_report.png"));
        assert!(report.output.is_file());
    }

    #[test]
    fn unparsable_time_is_excluded_from_chart_domain() {
        let dir = tempfile::tempdir().unwrap();
        let source = write_csv(
            dir.path(),
            "Time,Total Dizbalance\nnot-a-date,1000\n2024.01.01 00:00,10\n2024.01.01 00:05,20\n",
        );

        let report = run_report(&source, 1, &ReportConfig::default()).unwrap();

        assert_eq!(report.dataset.dropped, 1);
        assert_eq!(report.dataset.len(), 2);
        assert!(report.dataset.records.iter().all(|r| r.total != Some(1000.0)));

        let start = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let (x0, x1) = chart::x_domain(&report.dataset).unwrap();
        assert_eq!(x0, start.and_utc().timestamp() as f64);
        assert_eq!(x1 - x0, 300.0);
        let (_, y1) = chart::y_domain(&report.dataset).unwrap();
        assert!(y1 < 1000.0);
    }

    #[test]
    fn footer_row_with_text_value_is_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let source = write_csv(
            dir.path(),
            "Time,Total Dizbalance\n2024.01.01 00:00,10\n2024.01.01 00:05,20\nИтого,n/a\n",
        );

        let report = run_report(&source, 1, &ReportConfig::default()).unwrap();

        assert_eq!(report.dataset.len(), 2);
        assert_eq!(report.dataset.dropped, 1);
        assert!(report.output.is_file());
    }

    #[test]
    fn text_value_in_dated_row_fails_without_chart() {
        let dir = tempfile::tempdir().unwrap();
        let source = write_csv(
            dir.path(),
            "Time,Total Dizbalance\n2024.01.01 00:00,10\n2024.01.01 00:05,abc\n",
        );

        let err = run_report(&source, 1, &ReportConfig::default()).unwrap_err();

        assert!(matches!(err, ReportError::Load(_)));
        assert!(err.to_string().contains("'abc' is not a number"));
        assert!(!dir.path().join("market_report.png").exists());
    }

    #[test]
    fn existing_chart_is_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let source = write_csv(dir.path(), "Time,Total Dizbalance\n2024.01.01 00:00,1\n");
        let stale = dir.path().join("market_report.png");
        std::fs::write(&stale, b"stale").unwrap();

        run_report(&source, 3, &ReportConfig::default()).unwrap();

        assert!(image::open(&stale).is_ok());
    }

    #[test]
    fn load_failure_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let source = write_csv(dir.path(), "When,Total Dizbalance\nx,1\n");

        let err = run_report(&source, 3, &ReportConfig::default()).unwrap_err();

        assert!(matches!(err, ReportError::Load(_)));
        assert!(!dir.path().join("market_report.png").exists());
    }
}
