use super::model::{Record, Value};
use super::store::{RecordStore, StoreResult};

/// A point to place on the map, one per record with usable coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub lat: f64,
    pub lon: f64,
    pub label: String,
}

/// Parse a `"lat,lon"` cell. Whitespace around either half is ignored;
/// anything that does not give two finite numbers in range is `None`.
pub fn parse_coordinates(text: &str) -> Option<(f64, f64)> {
    let (lat, lon) = text.split_once(',')?;
    let lat: f64 = lat.trim().parse().ok()?;
    let lon: f64 = lon.trim().parse().ok()?;
    let in_range = (-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lon);
    in_range.then_some((lat, lon))
}

fn coordinates_of(value: &Value) -> Option<(f64, f64)> {
    match value {
        Value::String(s) => parse_coordinates(s),
        _ => None,
    }
}

/// Build markers for `records`. Records without valid coordinates are not
/// placed; the label falls back to an empty string when its cell is null.
pub fn markers(
    store: &RecordStore,
    records: &[&Record],
    coord_column: &str,
    label_column: &str,
) -> StoreResult<Vec<Marker>> {
    store.check_column(coord_column)?;
    store.check_column(label_column)?;

    let out: Vec<Marker> = records
        .iter()
        .filter_map(|rec| {
            let (lat, lon) = coordinates_of(rec.get(coord_column))?;
            let label = rec.get(label_column).as_text().unwrap_or_default();
            Some(Marker { lat, lon, label })
        })
        .collect();

    if out.len() < records.len() {
        log::debug!(
            "{} of {} records have no usable {coord_column}",
            records.len() - out.len(),
            records.len()
        );
    }
    Ok(out)
}

/// Mean position of the markers, used to centre the map view.
pub fn centroid(markers: &[Marker]) -> Option<(f64, f64)> {
    if markers.is_empty() {
        return None;
    }
    let n = markers.len() as f64;
    let lat = markers.iter().map(|m| m.lat).sum::<f64>() / n;
    let lon = markers.iter().map(|m| m.lon).sum::<f64>() / n;
    Some((lat, lon))
}
