use std::io::Write;

use serde_json::{json, Value};

use crate::error::ExportError;
use crate::report::ReportRow;

/// Round to a fixed number of decimals for compact output.
fn round_to(value: f64, precision: i32) -> f64 {
    let factor = 10f64.powi(precision);
    (value * factor).round() / factor
}

fn feature(row: &ReportRow, precision: i32) -> Value {
    json!({
        "type": "Feature",
        "geometry": {
            "type": "Point",
            "coordinates": [row.survey.x, row.survey.y, row.survey.z],
        },
        "properties": {
            "id": row.survey.id,
            "cloud_z": row.matched.map(|m| m.z),
            "distance": row.distance.map(|d| round_to(d, precision)),
            "dz": row.dz.map(|d| round_to(d, precision)),
            "class": row.class.as_str(),
            "marker-color": row.class.hex_color(),
        },
    })
}

/// Point layer colored by difference class, in the coordinate system of the inputs.
pub fn to_feature_collection(rows: &[ReportRow], precision: i32) -> Value {
    let features: Vec<Value> = rows.iter().map(|row| feature(row, precision)).collect();
    json!({
        "type": "FeatureCollection",
        "features": features,
    })
}

pub fn write_geojson<W: Write>(
    writer: W,
    rows: &[ReportRow],
    precision: i32,
) -> Result<(), ExportError> {
    serde_json::to_writer(writer, &to_feature_collection(rows, precision))?;
    Ok(())
}
