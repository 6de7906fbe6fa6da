// Export adapters for merged record sets.

use std::path::{Path, PathBuf};

use serde_json::{json, Map, Value};

use chorojoin_engine::model::{JoinReport, MergedRecordSet};
use chorojoin_engine::JoinError;

/// Write the merged set as a GeoJSON FeatureCollection (geometry plus all
/// attributes, source CRS declared when known).
pub fn export_geojson(merged: &MergedRecordSet, path: &Path) -> Result<(), JoinError> {
    let features: Vec<Value> = merged
        .features
        .iter()
        .map(|f| {
            json!({
                "type": "Feature",
                "geometry": f.geometry.clone().unwrap_or(Value::Null),
                "properties": Value::Object(f.properties.clone()),
            })
        })
        .collect();

    let mut doc = Map::new();
    doc.insert("type".into(), json!("FeatureCollection"));
    if let Some(ref crs) = merged.crs {
        doc.insert(
            "crs".into(),
            json!({"type": "name", "properties": {"name": crs}}),
        );
    }
    doc.insert("features".into(), Value::Array(features));

    let text = serde_json::to_string_pretty(&Value::Object(doc))
        .map_err(|e| JoinError::Io(e.to_string()))?;
    std::fs::write(path, text).map_err(|e| JoinError::Io(e.to_string()))
}

/// Write attributes only, geometry dropped. One row per merged feature, in
/// the merged column order.
pub fn export_csv(merged: &MergedRecordSet, path: &Path) -> Result<(), JoinError> {
    let mut writer = csv::Writer::from_path(path).map_err(|e| JoinError::Io(e.to_string()))?;
    writer
        .write_record(&merged.columns)
        .map_err(|e| JoinError::Io(e.to_string()))?;

    for feature in &merged.features {
        let record: Vec<String> = merged
            .columns
            .iter()
            .map(|c| property_as_text(feature.properties.get(c)))
            .collect();
        writer
            .write_record(&record)
            .map_err(|e| JoinError::Io(e.to_string()))?;
    }

    writer.flush().map_err(|e| JoinError::Io(e.to_string()))
}

/// Write the quality report as a JSON side-channel next to the output.
pub fn write_report(report: &JoinReport, output: &Path) -> Result<PathBuf, JoinError> {
    let path = report_path(output);
    let text =
        serde_json::to_string_pretty(report).map_err(|e| JoinError::Io(e.to_string()))?;
    std::fs::write(&path, text).map_err(|e| JoinError::Io(e.to_string()))?;
    Ok(path)
}

pub fn report_path(output: &Path) -> PathBuf {
    output.with_extension("stats.json")
}

fn property_as_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}
