//! Error taxonomy for the imbalance chart tool.

use thiserror::Error;

/// Result alias used across the pipeline.
pub type Result<T> = std::result::Result<T, ReportError>;

/// Everything that can go wrong between a user action and a saved chart.
#[derive(Error, Debug)]
pub enum ReportError {
    /// The file picker was dismissed without a choice.
    #[error("no file selected")]
    NoFileSelected,

    /// The window entry was committed with a non-integer or out-of-range value.
    #[error("invalid window size '{input}': enter a whole number from {min} to {max}")]
    InvalidWindowInput { input: String, min: u32, max: u32 },

    /// The window entry held a non-positive or non-numeric value when a run started.
    #[error("invalid window size '{input}': enter a positive whole number")]
    InvalidWindowAtRun { input: String },

    /// The smoother was asked for a zero-width window.
    #[error("window size must be positive, got {0}")]
    InvalidWindow(usize),

    /// The input file could not be read or lacks the expected columns.
    #[error("failed to load data: {0:#}")]
    Load(#[source] anyhow::Error),

    /// The chart could not be rasterized or written.
    #[error("failed to render chart: {0:#}")]
    Render(#[source] anyhow::Error),
}

/// How prominently an outcome is reported to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

impl ReportError {
    /// Dismissing the picker is a warning; every other failure is an error.
    pub fn level(&self) -> NoticeLevel {
        match self {
            ReportError::NoFileSelected => NoticeLevel::Warning,
            _ => NoticeLevel::Error,
        }
    }
}
