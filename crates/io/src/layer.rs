// GeoJSON layer reader.

use std::path::Path;

use serde_json::Value;

use chorojoin_engine::model::{Feature, LayerData};
use chorojoin_engine::JoinError;

pub fn load_layer(path: &Path) -> Result<LayerData, JoinError> {
    let content = crate::tabular::read_file_as_utf8(path)?;
    parse_geojson(&content)
}

/// Parse a FeatureCollection. Geometries are carried as opaque JSON — no
/// validation, no reprojection. Attribute columns are the union of property
/// keys in first-seen order.
pub fn parse_geojson(content: &str) -> Result<LayerData, JoinError> {
    let doc: Value = serde_json::from_str(content).map_err(|e| JoinError::Io(e.to_string()))?;

    let feature_array = doc
        .get("features")
        .and_then(Value::as_array)
        .ok_or_else(|| JoinError::Io("not a GeoJSON FeatureCollection".into()))?;

    let crs = doc
        .pointer("/crs/properties/name")
        .and_then(Value::as_str)
        .map(str::to_string);

    let mut columns: Vec<String> = Vec::new();
    let mut features = Vec::with_capacity(feature_array.len());

    for item in feature_array {
        let properties = item
            .get("properties")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();
        for key in properties.keys() {
            if !columns.iter().any(|c| c == key) {
                columns.push(key.clone());
            }
        }
        let geometry = item.get("geometry").filter(|g| !g.is_null()).cloned();
        features.push(Feature { geometry, properties });
    }

    Ok(LayerData { columns, crs, features })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const COUNTIES: &str = r#"{
        "type": "FeatureCollection",
        "crs": {"type": "name", "properties": {"name": "EPSG:4326"}},
        "features": [
            {"type": "Feature",
             "geometry": {"type": "Polygon", "coordinates": [[[0,0],[1,0],[1,1],[0,0]]]},
             "properties": {"GEOID": "12086", "NAME": "Miami-Dade County"}},
            {"type": "Feature",
             "geometry": null,
             "properties": {"GEOID": "12011", "NAME": "Broward County", "ALAND": 3351852}}
        ]
    }"#;

    #[test]
    fn parses_features_and_columns() {
        let layer = parse_geojson(COUNTIES).unwrap();
        assert_eq!(layer.crs.as_deref(), Some("EPSG:4326"));
        assert_eq!(layer.features.len(), 2);
        // Union of property keys, first-seen order.
        assert_eq!(layer.columns, vec!["GEOID", "NAME", "ALAND"]);
        assert!(layer.features[0].geometry.is_some());
        assert!(layer.features[1].geometry.is_none());
        assert_eq!(layer.features[1].properties["ALAND"], json!(3351852));
    }

    #[test]
    fn missing_crs_is_none() {
        let layer = parse_geojson(r#"{"type":"FeatureCollection","features":[]}"#).unwrap();
        assert!(layer.crs.is_none());
        assert!(layer.features.is_empty());
    }

    #[test]
    fn non_collection_rejected() {
        let err = parse_geojson(r#"{"type":"Feature"}"#).unwrap_err();
        assert!(matches!(err, JoinError::Io(_)));
    }
}
