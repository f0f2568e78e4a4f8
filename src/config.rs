// ---------------------------------------------------------------------------
// Report configuration
// ---------------------------------------------------------------------------

/// Knobs for one pipeline run. Passed explicitly; nothing is read from disk
/// or the environment.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportConfig {
    /// Column holding the raw timestamp text.
    pub time_column: String,
    /// Column holding the imbalance values to smooth.
    pub value_column: String,
    /// `chrono` format used to parse text timestamps.
    pub time_format: String,
    /// File name of the chart written next to the source file.
    pub output_file_name: String,
    /// Chart size in pixels.
    pub chart_width: u32,
    pub chart_height: u32,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            time_column: "Time".to_string(),
            value_column: "Total Dizbalance".to_string(),
            time_format: "%Y.%m.%d %H:%M".to_string(),
            output_file_name: "market_report.png".to_string(),
            chart_width: 1200,
            chart_height: 600,
        }
    }
}

/// Slider bounds and default for the smoothing window.
pub const WINDOW_MIN: u32 = 1;
pub const WINDOW_MAX: u32 = 100;
pub const WINDOW_DEFAULT: u32 = 20;
