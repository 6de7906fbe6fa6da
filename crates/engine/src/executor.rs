//! Join executor: left-outer joins between a tabular dataset and a boundary
//! layer, keyed exactly or through the fuzzy name matcher.

use std::collections::{HashMap, HashSet};

use serde_json::Value;

use crate::error::{Dataset, JoinError};
use crate::matcher;
use crate::model::{
    Feature, JoinMeta, JoinOptions, JoinReport, JoinResult, LayerData, MergedRecordSet, Table,
};

/// Join `table` onto `layer`, retaining every layer feature.
///
/// Both key columns are compared as trimmed text; administrative codes are
/// zero-padded inconsistently across sources, so no numeric coercion ever
/// happens. Duplicate source keys fan out (one merged feature per matching
/// record) and the quality report counts the fanned-out rows.
///
/// Fuzzy matching applies only when the layer key is a name column; a code
/// key joins exactly even when `options.fuzzy` is set, since near-miss
/// codes would otherwise clear the threshold.
pub fn execute(
    table: &Table,
    layer: &LayerData,
    csv_key: &str,
    layer_key: &str,
    options: &JoinOptions,
) -> Result<JoinResult, JoinError> {
    let csv_idx = table
        .column_index(csv_key)
        .ok_or_else(|| JoinError::MissingColumn {
            dataset: Dataset::Tabular,
            column: csv_key.to_string(),
        })?;
    if !layer.columns.iter().any(|c| c == layer_key) {
        return Err(JoinError::MissingColumn {
            dataset: Dataset::Layer,
            column: layer_key.to_string(),
        });
    }

    // Normalized source key per row. Empty keys never participate.
    let source_keys: Vec<String> = table
        .rows
        .iter()
        .map(|row| row.get(csv_idx).map(|v| v.trim().to_string()).unwrap_or_default())
        .collect();

    let by_key = if options.fuzzy && name_like(layer_key) {
        fuzzy_key_map(&source_keys, layer, layer_key, options.threshold)
    } else {
        exact_key_map(&source_keys)
    };

    // Output column order: layer columns, then tabular columns. A tabular
    // column that collides with a layer column lands under `<name>_csv`.
    let csv_out: Vec<String> = table
        .columns
        .iter()
        .map(|c| {
            if layer.columns.contains(c) {
                format!("{c}_csv")
            } else {
                c.clone()
            }
        })
        .collect();
    let mut columns = layer.columns.clone();
    columns.extend(csv_out.iter().cloned());

    let mut features = Vec::with_capacity(layer.features.len());
    let mut successful = 0usize;

    for feature in &layer.features {
        let feature_key = property_text(feature, layer_key);
        match by_key.get(feature_key.as_str()) {
            Some(rows) => {
                for &ri in rows {
                    successful += 1;
                    features.push(merge_one(feature, &csv_out, Some(&table.rows[ri])));
                }
            }
            None => features.push(merge_one(feature, &csv_out, None)),
        }
    }

    let total_features = layer.features.len();
    let total_records = table.rows.len();
    let join_rate = if total_features == 0 {
        0.0
    } else {
        successful as f64 / total_features as f64
    };

    Ok(JoinResult {
        meta: JoinMeta {
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            run_at: chrono::Utc::now().to_rfc3339(),
            fuzzy: options.fuzzy,
            threshold: options.threshold,
        },
        report: JoinReport {
            total_features,
            total_records,
            successful_joins: successful,
            join_rate,
            unmatched_features: total_features as i64 - successful as i64,
            unmatched_records: total_records as i64 - successful as i64,
        },
        merged: MergedRecordSet {
            columns,
            crs: layer.crs.clone(),
            features,
        },
    })
}

/// Fuzzy targets must be name columns (NAME, NAMELSAD, COUNTY, ...); code
/// columns always join exactly.
fn name_like(column: &str) -> bool {
    let lower = column.to_lowercase();
    lower.contains("name") || lower.contains("county")
}

/// key value → indices of rows carrying it.
fn exact_key_map(source_keys: &[String]) -> HashMap<String, Vec<usize>> {
    let mut by_key: HashMap<String, Vec<usize>> = HashMap::new();
    for (i, key) in source_keys.iter().enumerate() {
        if !key.is_empty() {
            by_key.entry(key.clone()).or_default().push(i);
        }
    }
    by_key
}

/// Map each distinct source value to its best-scoring layer value, then key
/// the rows by that mapped value. Values below the threshold stay unmapped,
/// so their rows never join.
fn fuzzy_key_map(
    source_keys: &[String],
    layer: &LayerData,
    layer_key: &str,
    threshold: u32,
) -> HashMap<String, Vec<usize>> {
    let targets: Vec<String> = layer
        .features
        .iter()
        .map(|f| property_text(f, layer_key))
        .collect();

    // Distinct source values in first-appearance order, for deterministic
    // tie resolution downstream.
    let mut seen = HashSet::new();
    let mut distinct: Vec<&String> = Vec::new();
    for key in source_keys {
        if !key.is_empty() && seen.insert(key.as_str()) {
            distinct.push(key);
        }
    }

    let mut mapped: HashMap<&str, String> = HashMap::new();
    for value in distinct {
        if let Some((ti, score)) = matcher::best_match(value, &targets) {
            if score >= threshold {
                mapped.insert(value.as_str(), targets[ti].clone());
            }
        }
    }

    let mut by_key: HashMap<String, Vec<usize>> = HashMap::new();
    for (i, key) in source_keys.iter().enumerate() {
        if let Some(target) = mapped.get(key.as_str()) {
            by_key.entry(target.clone()).or_default().push(i);
        }
    }
    by_key
}

fn merge_one(feature: &Feature, csv_columns: &[String], row: Option<&Vec<String>>) -> Feature {
    let mut properties = feature.properties.clone();
    for (ci, name) in csv_columns.iter().enumerate() {
        let value = match row {
            Some(row) => Value::String(row.get(ci).cloned().unwrap_or_default()),
            None => Value::Null,
        };
        properties.insert(name.clone(), value);
    }
    Feature {
        geometry: feature.geometry.clone(),
        properties,
    }
}

/// A feature's property as trimmed text; missing and null read as empty.
fn property_text(feature: &Feature, key: &str) -> String {
    match feature.properties.get(key) {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}
