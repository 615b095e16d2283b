use eframe::egui::{self, Color32, RichText, Ui};
use trend_metric::state::AppState;

// ---------------------------------------------------------------------------
// Top bar – widget title, relation and range selectors
// ---------------------------------------------------------------------------

/// Render the top menu / selector row.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        let Some(pipeline) = state.pipeline() else {
            ui.label("No widget loaded.");
            return;
        };

        // Clone what we need so selection can mutate state below.
        let name = pipeline.config().name.clone();
        let ranges = pipeline.config().ranges.clone();
        let current_range = pipeline.selected_range().to_string();
        let has_relation = pipeline.config().relation.is_some();
        let relations = pipeline.relations().to_vec();
        let current_relation = pipeline.selected_relation().map(str::to_string);

        ui.strong(&name);

        if has_relation && !relations.is_empty() {
            let selected_text = relations
                .iter()
                .find(|r| Some(&r.id) == current_relation.as_ref())
                .map(|r| r.to_string())
                .unwrap_or_default();
            egui::ComboBox::from_id_salt("relation")
                .selected_text(selected_text)
                .show_ui(ui, |ui: &mut Ui| {
                    for rel in &relations {
                        let is_current = current_relation.as_deref() == Some(rel.id.as_str());
                        if ui.selectable_label(is_current, &rel.display).clicked() {
                            state.select_relation(&rel.id);
                        }
                    }
                });
        }

        let range_text = ranges
            .iter()
            .find(|r| r.key == current_range)
            .map(|r| r.name.clone())
            .unwrap_or_default();
        egui::ComboBox::from_id_salt("range")
            .selected_text(range_text)
            .show_ui(ui, |ui: &mut Ui| {
                for range in &ranges {
                    if ui
                        .selectable_label(range.key == current_range, &range.name)
                        .clicked()
                    {
                        state.select_range(&range.key);
                    }
                }
            });

        if let Some(result) = state.result() {
            ui.separator();
            ui.label(format!("{} points", result.series.len()));
        }

        if let Some(msg) = &state.status_message {
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open trend fixture")
        .add_filter("Fixture", &["json"])
        .pick_file();

    if let Some(path) = file {
        if let Err(e) = state.open_fixture(&path) {
            log::error!("Failed to load fixture: {e:#}");
            state.status_message = Some(format!("Error: {e:#}"));
        }
    }
}
