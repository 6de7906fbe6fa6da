use std::collections::BTreeMap;
use std::path::Path;

use rusqlite::Connection;
use serde::Deserialize;
use serde_json::Value;

use chorojoin_engine::model::{GeographyLevel, LayerDescriptor};

use crate::error::CatalogError;

/// Layer-side columns worth advertising as join keys when scanning raw
/// GeoJSON (the inventory database carries these precomputed).
const KNOWN_JOIN_FIELDS: &[&str] = &[
    "GEOID", "GEOID10", "GEOID20", "STATEFP", "COUNTYFP", "NAME", "ZCTA5CE10",
];

/// The set of available boundary layers. Immutable after load; a reload
/// builds a new `Catalog` and swaps it in.
#[derive(Debug, Default)]
pub struct Catalog {
    layers: BTreeMap<String, LayerDescriptor>,
    /// Inventory rows dropped because their metadata would not validate.
    pub skipped: usize,
}

impl Catalog {
    /// Load from the inventory database written by the external scanner.
    ///
    /// `join_fields` is stored as text; it must parse as a JSON array
    /// (either `["GEOID", ...]` or `[["GEOID", "fips"], ...]`). Rows that
    /// fail to parse or validate are counted and skipped, never trusted.
    pub fn from_sqlite(path: &Path) -> Result<Self, CatalogError> {
        let conn = Connection::open(path).map_err(|e| CatalogError::Database(e.to_string()))?;
        Self::from_connection(&conn)
    }

    pub fn from_connection(conn: &Connection) -> Result<Self, CatalogError> {
        let mut stmt = conn
            .prepare(
                "SELECT filename, path, geography_level, record_count, crs, join_fields, coverage_area \
                 FROM gis_inventory",
            )
            .map_err(|e| CatalogError::Database(e.to_string()))?;

        let mut layers = BTreeMap::new();
        let mut skipped = 0usize;

        let mut rows = stmt
            .query([])
            .map_err(|e| CatalogError::Database(e.to_string()))?;
        while let Some(row) = rows
            .next()
            .map_err(|e| CatalogError::Database(e.to_string()))?
        {
            match descriptor_from_row(row) {
                Ok(descriptor) => {
                    layers.insert(descriptor.id.clone(), descriptor);
                }
                Err(_) => skipped += 1,
            }
        }

        Ok(Self { layers, skipped })
    }

    /// Load from a static TOML manifest (`[[layers]]` entries).
    pub fn from_manifest(input: &str) -> Result<Self, CatalogError> {
        #[derive(Deserialize)]
        struct Manifest {
            layers: Vec<LayerDescriptor>,
        }

        let manifest: Manifest =
            toml::from_str(input).map_err(|e| CatalogError::ManifestParse(e.to_string()))?;

        let mut layers = BTreeMap::new();
        for descriptor in manifest.layers {
            validate(&descriptor)?;
            if layers.contains_key(&descriptor.id) {
                return Err(CatalogError::Validation(format!(
                    "duplicate layer id '{}'",
                    descriptor.id
                )));
            }
            layers.insert(descriptor.id.clone(), descriptor);
        }

        Ok(Self { layers, skipped: 0 })
    }

    /// Fallback when no inventory exists: scan a directory for GeoJSON
    /// files and derive descriptors from filenames and content. Files that
    /// don't parse are skipped.
    pub fn scan_dir(dir: &Path) -> Result<Self, CatalogError> {
        let mut layers = BTreeMap::new();
        let mut skipped = 0usize;

        let entries = std::fs::read_dir(dir).map_err(|e| CatalogError::Io(e.to_string()))?;
        for entry in entries {
            let entry = entry.map_err(|e| CatalogError::Io(e.to_string()))?;
            let path = entry.path();
            let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
            if ext != "json" && ext != "geojson" {
                continue;
            }

            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            match scan_file(&path, name) {
                Ok(descriptor) => {
                    layers.insert(descriptor.id.clone(), descriptor);
                }
                Err(_) => skipped += 1,
            }
        }

        Ok(Self { layers, skipped })
    }

    /// Descriptors sorted by layer id.
    pub fn list(&self) -> Vec<&LayerDescriptor> {
        self.layers.values().collect()
    }

    pub fn get(&self, id: &str) -> Result<&LayerDescriptor, CatalogError> {
        self.layers
            .get(id)
            .ok_or_else(|| CatalogError::UnknownLayer(id.to_string()))
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}

fn descriptor_from_row(row: &rusqlite::Row<'_>) -> Result<LayerDescriptor, CatalogError> {
    let id: String = row
        .get("filename")
        .map_err(|e| CatalogError::Database(e.to_string()))?;
    let path: String = row
        .get("path")
        .map_err(|e| CatalogError::Database(e.to_string()))?;
    let geography_text: String = row.get("geography_level").unwrap_or_default();
    let record_count: i64 = row.get("record_count").unwrap_or(0);
    let crs: String = row.get("crs").unwrap_or_default();
    let join_fields_text: String = row.get("join_fields").unwrap_or_default();
    let coverage: String = row.get("coverage_area").unwrap_or_default();

    let descriptor = LayerDescriptor {
        id,
        path,
        geography: parse_geography_level(&geography_text),
        record_count: record_count.max(0) as usize,
        crs,
        join_fields: parse_join_fields(&join_fields_text)?,
        coverage,
    };
    validate(&descriptor)?;
    Ok(descriptor)
}

fn validate(descriptor: &LayerDescriptor) -> Result<(), CatalogError> {
    if descriptor.id.trim().is_empty() {
        return Err(CatalogError::Validation("layer id is empty".into()));
    }
    if descriptor.path.trim().is_empty() {
        return Err(CatalogError::Validation(format!(
            "layer '{}' has no path",
            descriptor.id
        )));
    }
    Ok(())
}

/// Typed replacement for the legacy stored field lists: only a JSON array of
/// strings, or of `[name, kind]` pairs, is accepted.
fn parse_join_fields(text: &str) -> Result<Vec<String>, CatalogError> {
    let text = text.trim();
    if text.is_empty() || text == "nan" || text == "[]" {
        return Ok(Vec::new());
    }

    let parsed: Value = serde_json::from_str(text)
        .map_err(|e| CatalogError::Validation(format!("join_fields is not JSON: {e}")))?;
    let Value::Array(items) = parsed else {
        return Err(CatalogError::Validation(
            "join_fields is not an array".into(),
        ));
    };

    let mut fields = Vec::with_capacity(items.len());
    for item in items {
        match item {
            Value::String(name) => fields.push(name),
            Value::Array(pair) => match pair.first() {
                Some(Value::String(name)) => fields.push(name.clone()),
                _ => {
                    return Err(CatalogError::Validation(
                        "join_fields pair has no column name".into(),
                    ))
                }
            },
            _ => {
                return Err(CatalogError::Validation(
                    "join_fields entry is neither a name nor a pair".into(),
                ))
            }
        }
    }
    Ok(fields)
}

fn scan_file(path: &Path, name: &str) -> Result<LayerDescriptor, CatalogError> {
    let content = std::fs::read_to_string(path).map_err(|e| CatalogError::Io(e.to_string()))?;
    let doc: Value =
        serde_json::from_str(&content).map_err(|e| CatalogError::Io(e.to_string()))?;

    let features = doc
        .get("features")
        .and_then(Value::as_array)
        .ok_or_else(|| CatalogError::Io(format!("{name}: not a FeatureCollection")))?;

    let crs = doc
        .pointer("/crs/properties/name")
        .and_then(Value::as_str)
        .unwrap_or("")
        .to_string();

    let join_fields = features
        .first()
        .and_then(|f| f.get("properties"))
        .and_then(Value::as_object)
        .map(|props| {
            KNOWN_JOIN_FIELDS
                .iter()
                .filter(|k| props.contains_key(**k))
                .map(|k| k.to_string())
                .collect()
        })
        .unwrap_or_default();

    Ok(LayerDescriptor {
        id: name.to_string(),
        path: path.to_string_lossy().into_owned(),
        geography: detect_geography_level(name),
        record_count: features.len(),
        crs,
        join_fields,
        coverage: String::new(),
    })
}

/// Geography level from filename keywords, most specific first.
pub fn detect_geography_level(filename: &str) -> GeographyLevel {
    let name = filename.to_lowercase();
    if name.contains("county") || name.contains("counties") {
        GeographyLevel::County
    } else if name.contains("zip") || name.contains("zcta") {
        GeographyLevel::ZipCode
    } else if name.contains("state") {
        GeographyLevel::State
    } else if name.contains("tract") {
        GeographyLevel::CensusTract
    } else if name.contains("place") || name.contains("city") {
        GeographyLevel::Place
    } else {
        GeographyLevel::Unknown
    }
}

/// Geography level from the inventory database's display strings.
fn parse_geography_level(text: &str) -> GeographyLevel {
    match text.trim() {
        "County" => GeographyLevel::County,
        "ZIP Code" => GeographyLevel::ZipCode,
        "State" => GeographyLevel::State,
        "Census Tract" => GeographyLevel::CensusTract,
        "Place" => GeographyLevel::Place,
        _ => GeographyLevel::Unknown,
    }
}
