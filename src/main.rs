mod app;
mod color;
mod state;
mod ui;

use app::DashboardApp;
use eframe::egui;
use sda_dashboard::config::DashboardConfig;

fn main() -> eframe::Result {
    env_logger::init();

    let config = match DashboardConfig::resolve() {
        Ok(config) => config,
        Err(e) => {
            log::error!("Invalid configuration, using defaults: {e:#}");
            DashboardConfig::default()
        }
    };
    let title = config.title.clone();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 800.0])
            .with_min_inner_size([640.0, 400.0]),
        ..Default::default()
    };

    eframe::run_native(
        &title,
        options,
        Box::new(|_cc| Ok(Box::new(DashboardApp::new(config)))),
    )
}
