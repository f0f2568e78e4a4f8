use std::path::PathBuf;

use eframe::egui::{self, RichText, Ui};

use crate::config::{WINDOW_MAX, WINDOW_MIN};
use crate::state::{AppState, ChartView};

// ---------------------------------------------------------------------------
// Left side panel – run controls
// ---------------------------------------------------------------------------

/// Render the file button and the window entry/slider pair.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.add_space(8.0);
    ui.label(RichText::new("Select a file and set the smoothing window:").size(15.0));
    ui.add_space(10.0);

    ui.vertical_centered(|ui: &mut Ui| {
        if ui.button(RichText::new("Select file…").size(15.0)).clicked() {
            state.start_run(pick_source_file);
        }
    });

    ui.add_space(14.0);
    ui.separator();
    ui.strong("Smoothing window");

    let entry = ui.add(
        egui::TextEdit::singleline(state.window.entry_mut())
            .desired_width(ui.available_width()),
    );
    // Commit only on Enter, not on every focus loss.
    if entry.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
        state.commit_window_entry();
    }

    ui.add_space(6.0);
    let mut value = state.window.value();
    if ui
        .add(egui::Slider::new(&mut value, WINDOW_MIN..=WINDOW_MAX))
        .changed()
    {
        state.set_window_from_slider(value);
    }
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                ui.close_menu();
                state.start_run(pick_source_file);
            }
        });

        ui.separator();

        ui.selectable_value(&mut state.view, ChartView::Image, "Image");
        ui.selectable_value(&mut state.view, ChartView::Interactive, "Interactive");

        ui.separator();

        if let Some(report) = &state.report {
            let source = report
                .source
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            ui.label(format!(
                "{source}: {} rows charted, {} dropped, window {} → {}",
                report.dataset.len(),
                report.dataset.dropped,
                report.window,
                report.output.display()
            ));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

/// Ask the user for a measurement table. `None` when the dialog is dismissed.
pub fn pick_source_file() -> Option<PathBuf> {
    rfd::FileDialog::new()
        .set_title("Select market_report.xlsx")
        .add_filter("Excel files", &["xlsx", "xlsm", "xlsb", "xls", "ods"])
        .add_filter("CSV / JSON / Parquet", &["csv", "json", "parquet", "pq"])
        .add_filter("All files", &["*"])
        .pick_file()
}
