mod app;
mod ui;

use std::path::PathBuf;

use app::TrendMetricApp;
use eframe::egui;

fn main() -> eframe::Result {
    env_logger::init();

    let fixture = std::env::args_os().nth(1).map(PathBuf::from);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([900.0, 420.0])
            .with_min_inner_size([480.0, 240.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Trend Metric",
        options,
        Box::new(move |_cc| Ok(Box::new(TrendMetricApp::new(fixture.as_deref())))),
    )
}
