use std::path::PathBuf;

use crate::config::ReportConfig;
use crate::control::WindowControl;
use crate::error::{NoticeLevel, ReportError};
use crate::report::{Report, run_report};

// ---------------------------------------------------------------------------
// Notices shown as modal dialogs
// ---------------------------------------------------------------------------

/// A message for the user, shown once and then dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub title: String,
    pub message: String,
}

impl Notice {
    fn from_error(err: &ReportError) -> Self {
        let (title, message) = match err {
            ReportError::NoFileSelected => ("Warning", "No file selected.".to_string()),
            ReportError::InvalidWindowInput { .. } | ReportError::InvalidWindowAtRun { .. } => {
                ("Error", format!("{err}."))
            }
            _ => (
                "Error",
                format!("An error occurred while processing the file:\n{err}"),
            ),
        };
        Self {
            level: err.level(),
            title: title.to_string(),
            message,
        }
    }

    fn saved(report: &Report) -> Self {
        Self {
            level: NoticeLevel::Info,
            title: "Success".to_string(),
            message: format!("Chart saved to: {}", report.output.display()),
        }
    }
}

/// Which rendering of the last report fills the central panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChartView {
    #[default]
    Image,
    Interactive,
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
#[derive(Default)]
pub struct AppState {
    pub config: ReportConfig,

    /// Smoothing window shared by the entry and the slider.
    pub window: WindowControl,

    /// Last successful run (None until the first chart is saved).
    pub report: Option<Report>,

    /// Set after each successful run so the image view drops its cached copy.
    pub chart_changed: bool,

    pub view: ChartView,

    /// Notices waiting to be shown, oldest first.
    pub notices: Vec<Notice>,
}

impl AppState {
    fn fail(&mut self, err: ReportError) {
        match err.level() {
            NoticeLevel::Warning => log::warn!("{err}"),
            _ => log::error!("{err}"),
        }
        self.notices.push(Notice::from_error(&err));
    }

    /// Slider moved.
    pub fn set_window_from_slider(&mut self, value: u32) {
        self.window.set_from_slider(value);
    }

    /// Enter pressed in the window entry.
    pub fn commit_window_entry(&mut self) {
        if let Err(err) = self.window.commit_entry() {
            self.fail(err);
        }
    }

    /// Validate the window, ask `pick_file` for a source, and run the pipeline.
    ///
    /// `pick_file` is not called when the window is invalid.
    pub fn start_run<F>(&mut self, pick_file: F)
    where
        F: FnOnce() -> Option<PathBuf>,
    {
        let window = match self.window.window_for_run() {
            Ok(w) => w,
            Err(err) => return self.fail(err),
        };
        let Some(source) = pick_file() else {
            return self.fail(ReportError::NoFileSelected);
        };

        match run_report(&source, window, &self.config) {
            Ok(report) => {
                self.notices.push(Notice::saved(&report));
                self.report = Some(report);
                self.chart_changed = true;
            }
            Err(err) => self.fail(err),
        }
    }

    /// Take all pending notices.
    pub fn drain_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn state_with_entry(text: &str) -> AppState {
        let mut state = AppState::default();
        *state.window.entry_mut() = text.to_string();
        state
    }

    #[test]
    fn invalid_run_window_never_opens_picker() {
        for bad in ["0", "abc"] {
            let mut state = state_with_entry(bad);
            let picked = Cell::new(false);

            state.start_run(|| {
                picked.set(true);
                Some(PathBuf::from("/nonexistent/market_report.xlsx"))
            });

            assert!(!picked.get(), "{bad}");
            let notices = state.drain_notices();
            assert_eq!(notices.len(), 1);
            assert_eq!(notices[0].level, NoticeLevel::Error);
            assert!(state.report.is_none());
        }
    }

    #[test]
    fn dismissed_picker_is_a_warning() {
        let mut state = AppState::default();
        state.start_run(|| None);
        let notices = state.drain_notices();
        assert_eq!(notices[0].level, NoticeLevel::Warning);
        assert_eq!(notices[0].message, "No file selected.");
    }

    #[test]
    fn load_failure_reports_cause_and_stays_idle() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = AppState::default();
        state.start_run(|| Some(dir.path().join("missing.csv")));

        let notices = state.drain_notices();
        assert_eq!(notices[0].level, NoticeLevel::Error);
        assert!(notices[0].message.contains("opening CSV"));
        assert!(state.report.is_none());
        assert!(!state.chart_changed);
    }

    #[test]
    fn successful_run_keeps_report_and_announces_path() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("market_report.csv");
        std::fs::write(&source, "Time,Total Dizbalance\n2024.01.01 00:00,5\n").unwrap();

        let mut state = state_with_entry("1");
        state.start_run(|| Some(source.clone()));

        let notices = state.drain_notices();
        assert_eq!(notices[0].level, NoticeLevel::Info);
        assert!(notices[0].message.contains("market_report.png"));
        let report = state.report.as_ref().unwrap();
        assert_eq!(report.window, 1);
        assert!(state.chart_changed);
    }

    #[test]
    fn bad_entry_commit_becomes_error_notice() {
        let mut state = state_with_entry("150");
        state.commit_window_entry();
        assert_eq!(state.window.entry(), "20");
        assert_eq!(state.drain_notices()[0].level, NoticeLevel::Error);
        assert!(state.notices.is_empty());
    }
}
