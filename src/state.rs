use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use sda_dashboard::config::DashboardConfig;
use sda_dashboard::data::boundary::{self, BoundaryLayer};
use sda_dashboard::data::geo::{self, Marker};
use sda_dashboard::data::{loader, Aggregation, Criterion, FilterCriteria, RecordStore, StoreError, Value};

use crate::color::ColorMap;

// ---------------------------------------------------------------------------
// Widget selections
// ---------------------------------------------------------------------------

/// Raw sidebar state, turned into a fresh [`FilterCriteria`] on every change.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selections {
    /// Ticked values per multi-choice column.
    pub multi: BTreeMap<String, BTreeSet<Value>>,
    /// Chosen value per single-choice column; `None` is the "All" entry.
    pub single: BTreeMap<String, Option<Value>>,
    /// Search text per free-text column.
    pub search: BTreeMap<String, String>,
}

impl Selections {
    /// A multi-choice list with nothing ticked has not been chosen yet and
    /// places no constraint, so it is left out.
    pub fn criteria(&self) -> FilterCriteria {
        let mut criteria = FilterCriteria::new();
        for (col, ticked) in &self.multi {
            if !ticked.is_empty() {
                criteria.set(col.clone(), Criterion::OneOf(ticked.clone()));
            }
        }
        for (col, choice) in &self.single {
            let criterion = match choice {
                Some(v) => Criterion::Equals(v.clone()),
                None => Criterion::Any,
            };
            criteria.set(col.clone(), criterion);
        }
        for (col, text) in &self.search {
            let text = text.trim();
            if !text.is_empty() {
                criteria.set(col.clone(), Criterion::contains(text));
            }
        }
        criteria
    }
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Table,
    Chart,
    Map,
}

/// The full UI state, independent of rendering.
pub struct AppState {
    pub config: DashboardConfig,

    /// Loaded dataset (unloaded until a file is opened).
    pub store: RecordStore,

    /// Widget columns from the config that exist in the loaded data.
    pub multi_columns: Vec<String>,
    pub single_columns: Vec<String>,
    pub search_columns: Vec<String>,

    /// Selectable values per widget column.
    pub options: BTreeMap<String, Vec<Value>>,

    pub selections: Selections,

    /// Indices of records passing the current filters (cached).
    pub visible_indices: Vec<usize>,

    pub group_column: Option<String>,
    pub measure_column: Option<String>,

    /// Sum of the measure per group over the visible records.
    pub aggregation: Option<Aggregation>,

    /// Bar colours, keyed by group value.
    pub color_map: Option<ColorMap>,

    pub markers: Vec<Marker>,
    pub layers: Vec<BoundaryLayer>,

    pub view: View,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,

}

impl AppState {
    /// State with no data and no overlays loaded yet.
    pub fn with_config(config: DashboardConfig) -> Self {
        Self {
            group_column: config.group_column.clone(),
            measure_column: config.measure_column.clone(),
            config,
            store: RecordStore::new(),
            multi_columns: Vec::new(),
            single_columns: Vec::new(),
            search_columns: Vec::new(),
            options: BTreeMap::new(),
            selections: Selections::default(),
            visible_indices: Vec::new(),
            aggregation: None,
            color_map: None,
            markers: Vec::new(),
            layers: Vec::new(),
            view: View::Table,
            status_message: None,
        }
    }

    /// Build the startup state: overlays first, then the configured data file.
    pub fn from_config(config: DashboardConfig) -> Self {
        let mut state = Self::with_config(config);
        state.load_layers();
        if let Some(path) = state.config.data_path.clone() {
            if path.is_file() {
                state.open_path(&path);
            } else {
                log::warn!("Data file {} not found; use File → Open", path.display());
            }
        }
        state
    }

    /// Overlays that fail to load are skipped; they never block the table.
    pub fn load_layers(&mut self) {
        self.layers = self
            .config
            .layers
            .iter()
            .filter_map(|layer| {
                boundary::load_layer(&layer.name, &layer.path, layer.name_property.as_deref())
                    .map_err(|e| log::warn!("Skipping layer '{}': {e:#}", layer.name))
                    .ok()
            })
            .collect();
    }

    /// Load a data file and make it the session's dataset.
    pub fn open_path(&mut self, path: &Path) {
        match loader::load_file(path) {
            Ok(store) => self.set_store(store),
            Err(e) => {
                log::error!("Failed to load file: {e:#}");
                self.status_message = Some(format!("Error: {e:#}"));
            }
        }
    }

    /// Ingest a newly loaded dataset, reset selections and recompute.
    pub fn set_store(&mut self, store: RecordStore) {
        self.store = store;
        self.selections = Selections::default();
        self.options.clear();

        self.multi_columns = self.present_columns(&self.config.multi_select);
        self.single_columns = self.present_columns(&self.config.single_select);
        self.search_columns = self.present_columns(&self.config.search);

        for col in self.multi_columns.iter().chain(&self.single_columns) {
            if let Ok(values) = self.store.distinct_values(col) {
                self.options.insert(col.clone(), values);
            }
        }
        for col in &self.single_columns {
            self.selections.single.insert(col.clone(), None);
        }

        self.group_column = self.group_column.take().or_else(|| self.config.group_column.clone());
        self.measure_column = self
            .measure_column
            .take()
            .or_else(|| self.config.measure_column.clone());
        if !self.keeps_column(self.group_column.as_deref()) {
            self.group_column = None;
        }
        if !self.keeps_column(self.measure_column.as_deref()) {
            self.measure_column = None;
        }
        self.rebuild_color_map();

        self.status_message = None;
        self.refilter();
    }

    fn keeps_column(&self, column: Option<&str>) -> bool {
        column.is_some_and(|c| self.store.has_column(c))
    }

    /// Configured columns present in the store; the rest are logged.
    fn present_columns(&self, wanted: &[String]) -> Vec<String> {
        wanted
            .iter()
            .filter(|col| {
                let present = self.store.has_column(col);
                if !present {
                    log::warn!("Configured column {col} is not in the data; skipping");
                }
                present
            })
            .cloned()
            .collect()
    }

    /// Columns holding at least one number, offered as measures.
    pub fn numeric_columns(&self) -> Vec<String> {
        let columns = self.store.columns().unwrap_or_default();
        columns
            .iter()
            .filter(|col| {
                self.store
                    .distinct_values(col)
                    .map(|vals| vals.iter().any(|v| v.as_f64().is_some()))
                    .unwrap_or(false)
            })
            .cloned()
            .collect()
    }

    pub fn rebuild_color_map(&mut self) {
        self.color_map = self.group_column.as_ref().and_then(|col| {
            self.store
                .distinct_values(col)
                .ok()
                .map(|vals| ColorMap::new(col, &vals))
        });
    }

    /// Recompute visible rows, the aggregation and the markers after any
    /// selection change.
    pub fn refilter(&mut self) {
        if !self.store.is_loaded() {
            return;
        }
        let criteria = self.selections.criteria();
        if let Err(e) = self.recompute(&criteria) {
            log::error!("Filter failed: {e}");
            self.status_message = Some(format!("Error: {e}"));
        }
    }

    fn recompute(&mut self, criteria: &FilterCriteria) -> Result<(), StoreError> {
        self.visible_indices = self.store.filter_indices(criteria)?;
        let rows = self.store.rows(&self.visible_indices)?;
        log::debug!(
            "{} constraints → {} of {} records",
            criteria.len(),
            RecordStore::count(&rows),
            self.store.len()
        );

        self.aggregation = match (&self.group_column, &self.measure_column) {
            (Some(group), Some(measure)) => {
                Some(self.store.aggregate_sum(&rows, group, measure)?)
            }
            _ => None,
        };

        let coord = &self.config.coordinate_column;
        let label = &self.config.label_column;
        self.markers = if self.store.has_column(coord) && self.store.has_column(label) {
            geo::markers(&self.store, &rows, coord, label)?
        } else {
            Vec::new()
        };
        Ok(())
    }

    /// Toggle a single value in a multi-choice column.
    pub fn toggle_filter_value(&mut self, column: &str, value: &Value) {
        let ticked = self.selections.multi.entry(column.to_string()).or_default();
        if !ticked.remove(value) {
            ticked.insert(value.clone());
        }
        self.refilter();
    }

    /// Tick every value in a column.
    pub fn select_all(&mut self, column: &str) {
        if let Some(values) = self.options.get(column) {
            let all: BTreeSet<Value> = values.iter().cloned().collect();
            self.selections.multi.insert(column.to_string(), all);
            self.refilter();
        }
    }

    /// Clear a column's ticks, which lifts its constraint.
    pub fn clear_selection(&mut self, column: &str) {
        self.selections.multi.remove(column);
        self.refilter();
    }

    pub fn set_single(&mut self, column: &str, choice: Option<Value>) {
        self.selections.single.insert(column.to_string(), choice);
        self.refilter();
    }

    pub fn set_search(&mut self, column: &str, text: String) {
        self.selections.search.insert(column.to_string(), text);
        self.refilter();
    }

    pub fn set_group_column(&mut self, column: Option<String>) {
        self.group_column = column;
        self.rebuild_color_map();
        self.refilter();
    }

    pub fn set_measure_column(&mut self, column: Option<String>) {
        self.measure_column = column;
        self.refilter();
    }

    /// Centre of the visible markers, or the configured centre.
    pub fn map_center(&self) -> (f64, f64) {
        geo::centroid(&self.markers)
            .unwrap_or((self.config.map_center[0], self.config.map_center[1]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sda_dashboard::data::Record;

    fn producers() -> RecordStore {
        let columns = ["PRODUTOR", "TECNICO", "DISTRITO", "COORDENADAS", "AREA"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let rows = vec![
            Record::new()
                .with("PRODUTOR", "Sítio Boa Vista")
                .with("TECNICO", "Ana")
                .with("DISTRITO", "Centro")
                .with("COORDENADAS", "-5.19,-39.28")
                .with("AREA", 3i64),
            Record::new()
                .with("PRODUTOR", "Fazenda Lagoa")
                .with("TECNICO", "Bia")
                .with("DISTRITO", "Norte")
                .with("COORDENADAS", "-5.10,-39.20")
                .with("AREA", 5i64),
            Record::new()
                .with("PRODUTOR", "Sitio Novo")
                .with("TECNICO", "Ana")
                .with("DISTRITO", "Norte")
                .with("COORDENADAS", Value::Null)
                .with("AREA", 2i64),
        ];
        RecordStore::from_records(columns, rows).unwrap()
    }

    fn state() -> AppState {
        let config = DashboardConfig {
            measure_column: Some("AREA".into()),
            layers: Vec::new(),
            ..DashboardConfig::default()
        };
        let mut state = AppState::with_config(config);
        state.set_store(producers());
        state
    }

    #[test]
    fn missing_configured_columns_are_dropped() {
        let state = state();
        assert_eq!(state.multi_columns, ["TECNICO", "DISTRITO"]);
        assert_eq!(state.search_columns, ["PRODUTOR"]);
        assert_eq!(state.options["TECNICO"], vec![Value::from("Ana"), Value::from("Bia")]);
    }

    #[test]
    fn fresh_load_shows_everything() {
        let state = state();
        assert_eq!(state.visible_indices, vec![0, 1, 2]);
        assert_eq!(state.markers.len(), 2);
        let agg = state.aggregation.as_ref().unwrap();
        assert_eq!(agg.get(&"Norte".into()), Some(7.0));
        assert_eq!(agg.get(&"Centro".into()), Some(3.0));
    }

    #[test]
    fn toggling_values_filters_and_reaggregates() {
        let mut state = state();
        state.toggle_filter_value("TECNICO", &Value::from("Ana"));
        assert_eq!(state.visible_indices, vec![0, 2]);
        let agg = state.aggregation.as_ref().unwrap();
        assert_eq!(agg.get(&"Norte".into()), Some(2.0));
        assert_eq!(state.markers.len(), 1);

        state.toggle_filter_value("TECNICO", &Value::from("Ana"));
        assert_eq!(state.visible_indices, vec![0, 1, 2]);
    }

    #[test]
    fn clearing_a_selection_lifts_the_constraint() {
        let mut state = state();
        state.select_all("DISTRITO");
        state.toggle_filter_value("DISTRITO", &Value::from("Centro"));
        assert_eq!(state.visible_indices, vec![1, 2]);
        state.clear_selection("DISTRITO");
        assert_eq!(state.visible_indices, vec![0, 1, 2]);
    }

    #[test]
    fn search_is_case_insensitive_and_trimmed() {
        let mut state = state();
        state.set_search("PRODUTOR", "  SÍTIO ".into());
        assert_eq!(state.visible_indices, vec![0]);
        state.set_search("PRODUTOR", "   ".into());
        assert_eq!(state.visible_indices, vec![0, 1, 2]);
    }

    #[test]
    fn empty_multi_select_is_left_out_of_criteria() {
        let mut selections = Selections::default();
        selections.multi.insert("TECNICO".into(), BTreeSet::new());
        selections.single.insert("ANO".into(), None);
        let criteria = selections.criteria();
        assert!(criteria.get("TECNICO").is_none());
        assert_eq!(criteria.get("ANO"), Some(&Criterion::Any));
    }

    #[test]
    fn no_measure_means_no_chart() {
        let mut state = state();
        state.set_measure_column(None);
        assert!(state.aggregation.is_none());
        assert_eq!(state.numeric_columns(), ["AREA"]);
    }

    #[test]
    fn unloaded_state_does_nothing() {
        let mut state = AppState::with_config(DashboardConfig::default());
        state.refilter();
        assert!(state.visible_indices.is_empty());
        assert!(state.status_message.is_none());
        assert_eq!(state.map_center(), (-5.1971, -39.2886));
    }

    #[test]
    fn failed_open_keeps_current_dataset() {
        let mut state = state();
        let missing = std::env::temp_dir().join("sda-dashboard-missing.csv");
        state.open_path(&missing);
        assert!(state.status_message.as_deref().is_some_and(|m| m.starts_with("Error:")));
        assert_eq!(state.store.len(), 3);
        assert_eq!(state.visible_indices, vec![0, 1, 2]);
    }
}
