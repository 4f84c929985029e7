use eframe::egui::{Color32, Stroke, Ui};
use egui_plot::{Legend, Plot, PlotPoints, Points, Polygon};

use crate::state::AppState;

/// Half-width, in degrees, of the initial view around the map centre.
const VIEW_SPAN: f64 = 0.15;

// ---------------------------------------------------------------------------
// Marker map (central panel)
// ---------------------------------------------------------------------------

/// Producers as points over the boundary overlays. Longitude is x,
/// latitude is y.
pub fn marker_map(ui: &mut Ui, state: &AppState) {
    if !state.store.is_loaded() && state.layers.is_empty() {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Open a file to view producers on the map  (File → Open…)");
        });
        return;
    }

    ui.strong(format!("{} producers placed", state.markers.len()));

    let (lat, lon) = state.map_center();
    let labels: Vec<([f64; 2], String)> = state
        .markers
        .iter()
        .map(|m| ([m.lon, m.lat], m.label.clone()))
        .collect();

    Plot::new("marker_map")
        .legend(Legend::default())
        .data_aspect(1.0)
        .include_x(lon - VIEW_SPAN)
        .include_x(lon + VIEW_SPAN)
        .include_y(lat - VIEW_SPAN)
        .include_y(lat + VIEW_SPAN)
        .x_axis_label("Longitude")
        .y_axis_label("Latitude")
        .label_formatter(move |_name, point| {
            // Tooltip: the nearest producer, if the cursor is on one.
            let nearest = labels.iter().min_by(|a, b| {
                let da = (a.0[0] - point.x).powi(2) + (a.0[1] - point.y).powi(2);
                let db = (b.0[0] - point.x).powi(2) + (b.0[1] - point.y).powi(2);
                da.total_cmp(&db)
            });
            match nearest {
                Some(([x, y], label))
                    if (x - point.x).abs() < 0.002 && (y - point.y).abs() < 0.002 =>
                {
                    format!("{label}\n{y:.5}, {x:.5}")
                }
                _ => format!("{:.5}, {:.5}", point.y, point.x),
            }
        })
        .show(ui, |plot_ui| {
            for layer in &state.layers {
                for feature in &layer.features {
                    for ring in &feature.rings {
                        plot_ui.polygon(
                            Polygon::new(PlotPoints::from(ring.clone()))
                                .name(&layer.name)
                                .stroke(Stroke::new(1.0, Color32::BLACK))
                                .fill_color(Color32::from_rgba_unmultiplied(159, 226, 252, 50)),
                        );
                    }
                    if !feature.points.is_empty() {
                        plot_ui.points(
                            Points::new(PlotPoints::from(feature.points.clone()))
                                .name(&layer.name)
                                .radius(3.0)
                                .color(Color32::DARK_GREEN),
                        );
                    }
                }
            }

            let positions: Vec<[f64; 2]> = state.markers.iter().map(|m| [m.lon, m.lat]).collect();
            plot_ui.points(
                Points::new(PlotPoints::from(positions))
                    .name("Producers")
                    .radius(4.0)
                    .color(Color32::BLUE),
            );
        });
}
