use std::path::Path;

use anyhow::{Context, Result};
use geojson::{Feature, GeoJson, Geometry, Value as GeoValue};

/// Property keys tried, in order, when a layer has no configured label key.
const NAME_KEYS: &[&str] = &["name", "NAME", "nome", "NOME", "DISTRITO", "distrito"];

/// One feature of an overlay: exterior rings and/or points, in
/// `[lon, lat]` order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayerFeature {
    pub name: Option<String>,
    pub rings: Vec<Vec<[f64; 2]>>,
    pub points: Vec<[f64; 2]>,
}

/// A named overlay read from a GeoJSON file (district limits, water
/// sources, ...). Only drawn, never queried by the record store.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundaryLayer {
    pub name: String,
    pub features: Vec<LayerFeature>,
}

impl BoundaryLayer {
    pub fn ring_count(&self) -> usize {
        self.features.iter().map(|f| f.rings.len()).sum()
    }

    pub fn point_count(&self) -> usize {
        self.features.iter().map(|f| f.points.len()).sum()
    }
}

pub fn load_layer(name: &str, path: &Path, name_property: Option<&str>) -> Result<BoundaryLayer> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    let layer = parse_layer(name, &text, name_property)
        .with_context(|| format!("parsing {}", path.display()))?;
    log::info!(
        "Loaded layer '{}': {} features, {} rings, {} points",
        layer.name,
        layer.features.len(),
        layer.ring_count(),
        layer.point_count()
    );
    Ok(layer)
}

pub fn parse_layer(name: &str, text: &str, name_property: Option<&str>) -> Result<BoundaryLayer> {
    let geojson: GeoJson = text.parse().context("invalid GeoJSON")?;
    let features = match geojson {
        GeoJson::FeatureCollection(fc) => fc
            .features
            .iter()
            .map(|f| convert_feature(f, name_property))
            .collect(),
        GeoJson::Feature(f) => vec![convert_feature(&f, name_property)],
        GeoJson::Geometry(g) => {
            let mut feature = LayerFeature::default();
            collect_geometry(&g, &mut feature);
            vec![feature]
        }
    };
    Ok(BoundaryLayer {
        name: name.to_string(),
        features,
    })
}

fn convert_feature(feature: &Feature, name_property: Option<&str>) -> LayerFeature {
    let mut out = LayerFeature {
        name: feature_name(feature, name_property),
        ..Default::default()
    };
    if let Some(geometry) = &feature.geometry {
        collect_geometry(geometry, &mut out);
    }
    out
}

fn feature_name(feature: &Feature, name_property: Option<&str>) -> Option<String> {
    let keys: Vec<&str> = match name_property {
        Some(key) => vec![key],
        None => NAME_KEYS.to_vec(),
    };
    keys.into_iter().find_map(|key| match feature.property(key)? {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Null => None,
        other => Some(other.to_string()),
    })
}

fn to_point(position: &[f64]) -> Option<[f64; 2]> {
    match position {
        [lon, lat, ..] => Some([*lon, *lat]),
        _ => None,
    }
}

fn to_ring(positions: &[Vec<f64>]) -> Vec<[f64; 2]> {
    positions.iter().filter_map(|p| to_point(p)).collect()
}

/// Keep exterior rings only; holes do not matter for an outline overlay.
fn collect_geometry(geometry: &Geometry, out: &mut LayerFeature) {
    match &geometry.value {
        GeoValue::Point(p) => out.points.extend(to_point(p)),
        GeoValue::MultiPoint(ps) => out.points.extend(ps.iter().filter_map(|p| to_point(p))),
        GeoValue::LineString(line) => out.rings.push(to_ring(line)),
        GeoValue::MultiLineString(lines) => out.rings.extend(lines.iter().map(|l| to_ring(l))),
        GeoValue::Polygon(rings) => out.rings.extend(rings.first().map(|r| to_ring(r))),
        GeoValue::MultiPolygon(polys) => out
            .rings
            .extend(polys.iter().filter_map(|p| p.first()).map(|r| to_ring(r))),
        GeoValue::GeometryCollection(items) => {
            for item in items {
                collect_geometry(item, out);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const DISTRICTS: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "properties": {"nome": "Centro"},
                "geometry": {
                    "type": "Polygon",
                    "coordinates": [
                        [[-39.3, -5.2], [-39.2, -5.2], [-39.2, -5.1], [-39.3, -5.2]],
                        [[-39.25, -5.18], [-39.24, -5.18], [-39.24, -5.17], [-39.25, -5.18]]
                    ]
                }
            },
            {
                "type": "Feature",
                "properties": {"CODIGO": 7},
                "geometry": {
                    "type": "MultiPolygon",
                    "coordinates": [
                        [[[-39.5, -5.4], [-39.4, -5.4], [-39.4, -5.3], [-39.5, -5.4]]],
                        [[[-39.6, -5.5], [-39.55, -5.5], [-39.55, -5.45], [-39.6, -5.5]]]
                    ]
                }
            },
            {
                "type": "Feature",
                "properties": {"nome": "Açude"},
                "geometry": {"type": "Point", "coordinates": [-39.28, -5.19]}
            }
        ]
    }"#;

    #[test]
    fn extracts_exterior_rings_and_names() {
        let layer = parse_layer("Distritos", DISTRICTS, None).unwrap();
        assert_eq!(layer.features.len(), 3);
        assert_eq!(layer.features[0].name.as_deref(), Some("Centro"));
        assert_eq!(layer.features[0].rings.len(), 1);
        assert_eq!(layer.features[0].rings[0][0], [-39.3, -5.2]);
        assert_eq!(layer.features[1].name, None);
        assert_eq!(layer.features[1].rings.len(), 2);
        assert_eq!(layer.features[2].points, vec![[-39.28, -5.19]]);
        assert_eq!(layer.ring_count(), 3);
        assert_eq!(layer.point_count(), 1);
    }

    #[test]
    fn configured_name_property_wins() {
        let layer = parse_layer("Distritos", DISTRICTS, Some("CODIGO")).unwrap();
        assert_eq!(layer.features[0].name, None);
        assert_eq!(layer.features[1].name.as_deref(), Some("7"));
    }

    #[test]
    fn invalid_geojson_is_an_error() {
        assert!(parse_layer("x", "{\"type\": \"Nope\"}", None).is_err());
        assert!(parse_layer("x", "not json", None).is_err());
    }

    #[test]
    fn load_layer_from_file() {
        let mut file = tempfile::Builder::new().suffix(".geojson").tempfile().unwrap();
        file.write_all(DISTRICTS.as_bytes()).unwrap();
        let layer = load_layer("Distritos", file.path(), None).unwrap();
        assert_eq!(layer.name, "Distritos");
        assert!(load_layer("Distritos", Path::new("/nonexistent/distrito.geojson"), None).is_err());
    }
}
