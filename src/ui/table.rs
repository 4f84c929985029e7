use eframe::egui::{ScrollArea, Ui};
use egui_extras::{Column, TableBuilder};

use sda_dashboard::data::{RecordStore, Value};

use crate::state::AppState;

// ---------------------------------------------------------------------------
// Filtered records table (central panel)
// ---------------------------------------------------------------------------

fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

pub fn records_table(ui: &mut Ui, state: &AppState) {
    let (Ok(columns), Ok(rows)) = (
        state.store.columns(),
        state.store.rows(&state.visible_indices),
    ) else {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Open a file to view records  (File → Open…)");
        });
        return;
    };

    ui.strong(format!("Filtered records: {}", RecordStore::count(&rows)));
    ui.separator();

    ScrollArea::horizontal().show(ui, |ui: &mut Ui| {
        TableBuilder::new(ui)
            .striped(true)
            .resizable(true)
            .columns(Column::auto().at_least(60.0).clip(true), columns.len())
            .header(22.0, |mut header| {
                for col in columns {
                    header.col(|ui: &mut Ui| {
                        ui.strong(col);
                    });
                }
            })
            .body(|body| {
                body.rows(20.0, rows.len(), |mut row| {
                    let record = rows[row.index()];
                    for col in columns {
                        row.col(|ui: &mut Ui| {
                            ui.label(cell_text(record.get(col)));
                        });
                    }
                });
            });
    });
}
