use std::ops::RangeInclusive;

use eframe::egui::{self, Color32, Ui};
use egui_plot::{GridMark, Legend, Line, Plot, PlotPoints};

use crate::report::Report;
use crate::report::chart::{format_time, series_label};
use crate::state::{AppState, ChartView};

// ---------------------------------------------------------------------------
// Chart view (central panel)
// ---------------------------------------------------------------------------

/// Show the last saved chart, either as the PNG itself or as a live plot.
pub fn chart_view(ui: &mut Ui, state: &mut AppState) {
    let Some(report) = &state.report else {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Select a file to build a chart  (File → Open…)");
        });
        return;
    };

    let uri = format!("file://{}", report.output.display());
    // The PNG is overwritten in place; drop the cached texture after each run.
    if state.chart_changed {
        ui.ctx().forget_image(&uri);
        state.chart_changed = false;
    }

    match state.view {
        ChartView::Image => {
            ui.centered_and_justified(|ui: &mut Ui| {
                ui.add(egui::Image::new(uri).shrink_to_fit());
            });
        }
        ChartView::Interactive => smoothed_plot(ui, report),
    }
}

/// Contiguous runs of smoothed points; absent values split the line.
fn segments(report: &Report) -> Vec<Vec<[f64; 2]>> {
    let mut out: Vec<Vec<[f64; 2]>> = Vec::new();
    let mut current = Vec::new();
    for record in &report.dataset.records {
        match record.smoothed {
            Some(v) => current.push([record.time.and_utc().timestamp() as f64, v]),
            None if !current.is_empty() => out.push(std::mem::take(&mut current)),
            None => {}
        }
    }
    if !current.is_empty() {
        out.push(current);
    }
    out
}

fn smoothed_plot(ui: &mut Ui, report: &Report) {
    let name = series_label(report.window);
    let runs = segments(report);

    Plot::new("smoothed_plot")
        .legend(Legend::default())
        .x_axis_label("Time")
        .y_axis_label("Value")
        .x_axis_formatter(|mark: GridMark, _range: &RangeInclusive<f64>| format_time(mark.value))
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true)
        .show(ui, |plot_ui| {
            for run in runs {
                let line = Line::new(PlotPoints::from(run))
                    .name(&name)
                    .color(Color32::BLUE)
                    .width(1.5);
                plot_ui.line(line);
            }
        });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::{Dataset, Record};
    use chrono::NaiveDate;

    #[test]
    fn gaps_split_segments() {
        let t = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let smoothed = [None, Some(1.0), Some(2.0), None, Some(3.0), None];
        let report = Report {
            source: "in.csv".into(),
            output: "market_report.png".into(),
            window: 3,
            dataset: Dataset {
                records: smoothed
                    .iter()
                    .map(|&s| Record {
                        time: t,
                        total: Some(0.0),
                        smoothed: s,
                    })
                    .collect(),
                dropped: 0,
            },
        };

        let runs = segments(&report);
        let lens: Vec<usize> = runs.iter().map(Vec::len).collect();
        assert_eq!(lens, vec![2, 1]);
    }
}
