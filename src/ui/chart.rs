use eframe::egui::{Color32, Ui};
use egui_plot::{Bar, BarChart, Legend, Plot};

use crate::state::AppState;

// ---------------------------------------------------------------------------
// Ranked bar chart (central panel)
// ---------------------------------------------------------------------------

/// One bar per group, tallest first.
pub fn ranked_bars(ui: &mut Ui, state: &AppState) {
    let Some(agg) = &state.aggregation else {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Pick a group column and a numeric column to sum in the sidebar");
        });
        return;
    };

    ui.strong(format!(
        "Sum of {} by {}  (total {:.2})",
        agg.measure_column,
        agg.group_column,
        agg.total()
    ));

    let ranked = agg.ranked();
    let labels: Vec<String> = ranked.iter().map(|(group, _)| group.to_string()).collect();

    let bars: Vec<Bar> = ranked
        .iter()
        .enumerate()
        .map(|(i, (group, sum))| {
            let color = state
                .color_map
                .as_ref()
                .filter(|cm| cm.column == agg.group_column)
                .map_or(Color32::LIGHT_BLUE, |cm| cm.color_for(group));
            Bar::new(i as f64, *sum)
                .name(group.to_string())
                .fill(color)
                .width(0.7)
        })
        .collect();

    Plot::new("ranked_bars")
        .legend(Legend::default())
        .y_axis_label(agg.measure_column.clone())
        .allow_drag(false)
        .allow_scroll(false)
        .x_axis_formatter(move |mark, _range| {
            let idx = mark.value.round();
            if (mark.value - idx).abs() > 1e-6 || idx < 0.0 {
                return String::new();
            }
            labels.get(idx as usize).cloned().unwrap_or_default()
        })
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(BarChart::new(bars).name(agg.group_column.clone()));
        });
}
