use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use crate::state::{AppState, View};

// ---------------------------------------------------------------------------
// Left side panel – filter widgets
// ---------------------------------------------------------------------------

/// Render the left filter panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Filters");
    ui.separator();

    if !state.store.is_loaded() {
        ui.label("No dataset loaded.");
        return;
    }

    // Clone what we need so we can mutate state inside the loop.
    let search_columns = state.search_columns.clone();
    let single_columns = state.single_columns.clone();
    let multi_columns = state.multi_columns.clone();
    let options = state.options.clone();

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            // ---- Free-text search ----
            for col in &search_columns {
                ui.strong(format!("Search {col}"));
                let mut text = state.selections.search.get(col).cloned().unwrap_or_default();
                if ui.text_edit_singleline(&mut text).changed() {
                    state.set_search(col, text);
                }
            }
            if !search_columns.is_empty() {
                ui.separator();
            }

            // ---- Single-choice combo boxes ----
            for col in &single_columns {
                let Some(values) = options.get(col) else {
                    continue;
                };
                let current = state.selections.single.get(col).cloned().flatten();
                let mut choice = current.clone();
                ui.strong(col);
                egui::ComboBox::from_id_salt(col)
                    .selected_text(current.as_ref().map_or("All".to_string(), |v| v.to_string()))
                    .show_ui(ui, |ui: &mut Ui| {
                        ui.selectable_value(&mut choice, None, "All");
                        for val in values {
                            ui.selectable_value(&mut choice, Some(val.clone()), val.to_string());
                        }
                    });
                if choice != current {
                    state.set_single(col, choice);
                }
            }

            // ---- Multi-choice lists (collapsible) ----
            for col in &multi_columns {
                let Some(values) = options.get(col) else {
                    continue;
                };
                let ticked = state.selections.multi.get(col).cloned().unwrap_or_default();

                // Show count of ticked / total in the header
                let header_text = format!("{col}  ({}/{})", ticked.len(), values.len());

                egui::CollapsingHeader::new(RichText::new(header_text).strong())
                    .id_salt(col)
                    .default_open(false)
                    .show(ui, |ui: &mut Ui| {
                        ui.horizontal(|ui: &mut Ui| {
                            if ui.small_button("All").clicked() {
                                state.select_all(col);
                            }
                            if ui.small_button("Clear").clicked() {
                                state.clear_selection(col);
                            }
                        });

                        for val in values {
                            let mut checked = ticked.contains(val);
                            if ui.checkbox(&mut checked, val.to_string()).changed() {
                                state.toggle_filter_value(col, val);
                            }
                        }
                    });
            }
            ui.separator();

            chart_settings(ui, state);
        });
}

/// Group-by / sum-of selectors feeding the bar chart.
fn chart_settings(ui: &mut Ui, state: &mut AppState) {
    let columns: Vec<String> = state
        .store
        .columns()
        .map(|c| c.to_vec())
        .unwrap_or_default();
    let numeric = state.numeric_columns();

    ui.strong("Group by");
    let mut group = state.group_column.clone();
    egui::ComboBox::from_id_salt("group_by")
        .selected_text(group.clone().unwrap_or_else(|| "None".to_string()))
        .show_ui(ui, |ui: &mut Ui| {
            ui.selectable_value(&mut group, None, "None");
            for col in &columns {
                ui.selectable_value(&mut group, Some(col.clone()), col);
            }
        });
    if group != state.group_column {
        state.set_group_column(group);
    }

    ui.strong("Sum of");
    let mut measure = state.measure_column.clone();
    egui::ComboBox::from_id_salt("sum_of")
        .selected_text(measure.clone().unwrap_or_else(|| "None".to_string()))
        .show_ui(ui, |ui: &mut Ui| {
            ui.selectable_value(&mut measure, None, "None");
            for col in &numeric {
                ui.selectable_value(&mut measure, Some(col.clone()), col);
            }
        });
    if measure != state.measure_column {
        state.set_measure_column(measure);
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
                open_file_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        ui.selectable_value(&mut state.view, View::Table, "Table");
        ui.selectable_value(&mut state.view, View::Chart, "Chart");
        ui.selectable_value(&mut state.view, View::Map, "Map");

        ui.separator();

        if state.store.is_loaded() {
            ui.label(format!(
                "{} records loaded, {} visible",
                state.store.len(),
                state.visible_indices.len()
            ));
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
        .set_title("Open producer data")
        .add_filter("Supported files", &["xlsx", "xlsm", "xls", "ods", "csv", "json", "parquet", "pq"])
        .add_filter("Spreadsheets", &["xlsx", "xlsm", "xls", "ods"])
        .add_filter("CSV", &["csv"])
        .add_filter("JSON", &["json"])
        .add_filter("Parquet", &["parquet", "pq"])
        .pick_file();

    if let Some(path) = file {
        state.open_path(&path);
    }
}
