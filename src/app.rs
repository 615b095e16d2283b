use std::path::Path;
use std::time::Duration;

use eframe::egui;
use trend_metric::state::AppState;

use crate::ui::{panels, plot};

/// How often to wake up and poll the fetcher while requests are in flight.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct TrendMetricApp {
    pub state: AppState,
}

impl TrendMetricApp {
    pub fn new(fixture: Option<&Path>) -> Self {
        let mut state = AppState::default();
        if let Some(path) = fixture {
            if let Err(e) = state.open_fixture(path) {
                log::error!("Failed to open {}: {e:#}", path.display());
                state.status_message = Some(format!("Error: {e:#}"));
            }
        }
        Self { state }
    }
}

impl eframe::App for TrendMetricApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.state.poll();
        if self.state.is_fetching() {
            ctx.request_repaint_after(POLL_INTERVAL);
        }

        // ---- Top panel: title and selectors ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Central panel: trend chart ----
        egui::CentralPanel::default().show(ctx, |ui| {
            plot::trend_plot(ui, &self.state);
        });
    }
}
