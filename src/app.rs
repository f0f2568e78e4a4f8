use eframe::egui;
use rfd::{MessageButtons, MessageDialog, MessageLevel};

use crate::error::NoticeLevel;
use crate::state::{AppState, Notice};
use crate::ui::{panels, plot};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct ImbalanceChartApp {
    pub state: AppState,
}

impl eframe::App for ImbalanceChartApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panel: run controls ----
        egui::SidePanel::left("control_panel")
            .default_width(260.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        // ---- Central panel: chart ----
        egui::CentralPanel::default().show(ctx, |ui| {
            plot::chart_view(ui, &mut self.state);
        });

        // Modal dialogs block until dismissed, one at a time.
        for notice in self.state.drain_notices() {
            show_notice(&notice);
        }
    }
}

fn show_notice(notice: &Notice) {
    let level = match notice.level {
        NoticeLevel::Info => MessageLevel::Info,
        NoticeLevel::Warning => MessageLevel::Warning,
        NoticeLevel::Error => MessageLevel::Error,
    };
    MessageDialog::new()
        .set_level(level)
        .set_title(&notice.title)
        .set_description(&notice.message)
        .set_buttons(MessageButtons::Ok)
        .show();
}
