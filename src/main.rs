mod app;
mod config;
mod control;
mod data;
mod error;
mod report;
mod state;
mod ui;

use app::ImbalanceChartApp;
use eframe::egui;

fn main() -> eframe::Result {
    env_logger::init();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1100.0, 700.0])
            .with_min_inner_size([500.0, 400.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Imbalance Chart",
        options,
        Box::new(|cc| {
            // Install image loaders so the saved PNG can be shown via file:// URIs.
            egui_extras::install_image_loaders(&cc.egui_ctx);
            Ok(Box::new(ImbalanceChartApp::default()))
        }),
    )
}
