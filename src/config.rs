use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Env var naming a JSON config file.
pub const CONFIG_ENV: &str = "DASHBOARD_CONFIG";
/// Env var overriding `data_path`.
pub const DATA_ENV: &str = "DASHBOARD_DATA";
/// Config file picked up from the working directory when present.
pub const DEFAULT_CONFIG_FILE: &str = "dashboard.json";

/// An overlay drawn on the map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerConfig {
    pub name: String,
    pub path: PathBuf,
    /// Feature property used as the tooltip label.
    #[serde(default)]
    pub name_property: Option<String>,
}

/// What the dashboard loads and which columns drive each widget.
/// Column names are matched after normalisation (trimmed, uppercase).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub title: String,
    /// Spreadsheet opened at startup, if any.
    pub data_path: Option<PathBuf>,
    /// Checkbox lists; nothing ticked means no constraint.
    pub multi_select: Vec<String>,
    /// Combo boxes with an "All" entry.
    pub single_select: Vec<String>,
    /// Case-insensitive substring search boxes.
    pub search: Vec<String>,
    pub group_column: Option<String>,
    pub measure_column: Option<String>,
    /// Text column holding `"lat,lon"`.
    pub coordinate_column: String,
    /// Marker tooltip column.
    pub label_column: String,
    pub layers: Vec<LayerConfig>,
    /// `[lat, lon]` used when no marker is visible.
    pub map_center: [f64; 2],
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            title: "Dashboard de Produtores SDA".to_string(),
            data_path: Some(PathBuf::from("Produtores_SDA.xlsx")),
            multi_select: vec![
                "TECNICO".to_string(),
                "DISTRITO".to_string(),
                "COMPRADOR".to_string(),
            ],
            single_select: Vec::new(),
            search: vec!["PRODUTOR".to_string()],
            group_column: Some("DISTRITO".to_string()),
            measure_column: None,
            coordinate_column: "COORDENADAS".to_string(),
            label_column: "PRODUTOR".to_string(),
            layers: vec![LayerConfig {
                name: "Distritos".to_string(),
                path: PathBuf::from("distrito.geojson"),
                name_property: None,
            }],
            map_center: [-5.1971, -39.2886],
        }
    }
}

impl DashboardConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::from_json(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let mut config: Self = serde_json::from_str(text)?;
        config.normalize();
        Ok(config)
    }

    /// Resolve the config for this process: `$DASHBOARD_CONFIG`, then
    /// `./dashboard.json`, then defaults. `$DASHBOARD_DATA` overrides the
    /// data path in every case.
    pub fn resolve() -> Result<Self> {
        let explicit = std::env::var_os(CONFIG_ENV).map(PathBuf::from);
        let data_override = std::env::var_os(DATA_ENV).map(PathBuf::from);
        Self::resolve_from(explicit.as_deref(), Path::new(DEFAULT_CONFIG_FILE), data_override)
    }

    fn resolve_from(
        explicit: Option<&Path>,
        fallback: &Path,
        data_override: Option<PathBuf>,
    ) -> Result<Self> {
        let mut config = match explicit {
            Some(path) => Self::from_file(path)?,
            None if fallback.is_file() => Self::from_file(fallback)?,
            None => {
                log::debug!("no config file, using defaults");
                Self::default()
            }
        };
        if let Some(data) = data_override {
            config.data_path = Some(data);
        }
        Ok(config)
    }

    /// Apply the same header normalisation the loader applies.
    fn normalize(&mut self) {
        use crate::data::loader::normalize_column_name as norm;
        for list in [&mut self.multi_select, &mut self.single_select, &mut self.search] {
            for col in list.iter_mut() {
                *col = norm(col);
            }
        }
        for col in [&mut self.group_column, &mut self.measure_column]
            .into_iter()
            .flatten()
        {
            *col = norm(col);
        }
        self.coordinate_column = norm(&self.coordinate_column);
        self.label_column = norm(&self.label_column);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_match_the_producer_sheet() {
        let config = DashboardConfig::default();
        assert_eq!(config.multi_select, ["TECNICO", "DISTRITO", "COMPRADOR"]);
        assert_eq!(config.coordinate_column, "COORDENADAS");
        assert_eq!(config.layers.len(), 1);
    }

    #[test]
    fn partial_json_keeps_defaults_and_normalises() {
        let config = DashboardConfig::from_json(
            r#"{"multi_select": [" tecnico "], "measure_column": "area_ha", "layers": []}"#,
        )
        .unwrap();
        assert_eq!(config.multi_select, ["TECNICO"]);
        assert_eq!(config.measure_column.as_deref(), Some("AREA_HA"));
        assert_eq!(config.search, ["PRODUTOR"]);
        assert!(config.layers.is_empty());
    }

    #[test]
    fn layer_entries_parse() {
        let config = DashboardConfig::from_json(
            r#"{"layers": [{"name": "Açudes", "path": "acudes.geojson", "name_property": "NOME"}]}"#,
        )
        .unwrap();
        assert_eq!(config.layers[0].path, PathBuf::from("acudes.geojson"));
        assert_eq!(config.layers[0].name_property.as_deref(), Some("NOME"));
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(DashboardConfig::from_json("{\"multi_select\": 3}").is_err());
    }

    #[test]
    fn resolution_order() {
        let missing = Path::new("/nonexistent/dashboard.json");
        let config = DashboardConfig::resolve_from(None, missing, None).unwrap();
        assert_eq!(config, DashboardConfig::default());

        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        file.write_all(br#"{"title": "Compras"}"#).unwrap();
        let config = DashboardConfig::resolve_from(
            None,
            file.path(),
            Some(PathBuf::from("compras.csv")),
        )
        .unwrap();
        assert_eq!(config.title, "Compras");
        assert_eq!(config.data_path, Some(PathBuf::from("compras.csv")));

        assert!(DashboardConfig::resolve_from(Some(missing), file.path(), None).is_err());
    }
}
