use eframe::egui;

use sda_dashboard::config::DashboardConfig;

use crate::state::{AppState, View};
use crate::ui::{chart, map, panels, table};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct DashboardApp {
    pub state: AppState,
}

impl DashboardApp {
    pub fn new(config: DashboardConfig) -> Self {
        Self {
            state: AppState::from_config(config),
        }
    }
}

impl eframe::App for DashboardApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panel: filters ----
        egui::SidePanel::left("filter_panel")
            .default_width(240.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        // ---- Central panel: table / chart / map ----
        egui::CentralPanel::default().show(ctx, |ui| match self.state.view {
            View::Table => table::records_table(ui, &self.state),
            View::Chart => chart::ranked_bars(ui, &self.state),
            View::Map => map::marker_map(ui, &self.state),
        });
    }
}
