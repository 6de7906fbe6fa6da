// Integration tests for the chorojoin binary: the analyze/suggest/join
// workflow end to end, plus the exit-code contract.
// Run with: cargo test -p chorojoin-cli --test cli_tests -- --nocapture

use std::path::{Path, PathBuf};
use std::process::Command;

use tempfile::TempDir;

fn chorojoin(dir: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_chorojoin"));
    cmd.current_dir(dir);
    cmd
}

struct Fixture {
    dir: TempDir,
    manifest: PathBuf,
    csv: PathBuf,
}

impl Fixture {
    fn path(&self) -> &Path {
        self.dir.path()
    }
}

/// Four Florida county features, three CSV rows that match on GEOID.
fn fixture() -> Fixture {
    let dir = tempfile::tempdir().unwrap();

    let layer_path = dir.path().join("fl_counties.json");
    std::fs::write(
        &layer_path,
        r#"{
            "type": "FeatureCollection",
            "crs": {"type": "name", "properties": {"name": "EPSG:4326"}},
            "features": [
                {"type": "Feature",
                 "geometry": {"type": "Point", "coordinates": [-80.2, 25.8]},
                 "properties": {"GEOID": "12086", "NAME": "Miami-Dade"}},
                {"type": "Feature",
                 "geometry": {"type": "Point", "coordinates": [-80.1, 26.1]},
                 "properties": {"GEOID": "12011", "NAME": "Broward"}},
                {"type": "Feature",
                 "geometry": {"type": "Point", "coordinates": [-80.0, 26.7]},
                 "properties": {"GEOID": "12099", "NAME": "Palm Beach"}},
                {"type": "Feature",
                 "geometry": {"type": "Point", "coordinates": [-82.4, 27.9]},
                 "properties": {"GEOID": "12057", "NAME": "Hillsborough"}}
            ]
        }"#,
    )
    .unwrap();

    let manifest = dir.path().join("layers.toml");
    std::fs::write(
        &manifest,
        format!(
            r#"
[[layers]]
id = "fl_counties"
path = "{}"
geography = "county"
record_count = 4
crs = "EPSG:4326"
join_fields = ["GEOID", "NAME"]
coverage = "Florida"
"#,
            layer_path.display()
        ),
    )
    .unwrap();

    let csv = dir.path().join("health.csv");
    std::fs::write(
        &csv,
        "COUNTY_FIPS,County Name,uninsured_rate\n\
         12086,Miami-Dade,17.4\n\
         12011,Broward,15.2\n\
         12099,Palm Beach,14.8\n",
    )
    .unwrap();

    Fixture { dir, manifest, csv }
}

// ---------------------------------------------------------------------------
// layers
// ---------------------------------------------------------------------------

#[test]
fn layers_lists_manifest_entries() {
    let fx = fixture();
    let output = chorojoin(fx.path())
        .args(["layers", "--manifest", fx.manifest.to_str().unwrap()])
        .output()
        .expect("chorojoin layers");

    assert!(output.status.success(), "stderr: {}",
        String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("fl_counties"), "stdout: {stdout}");
    assert!(stdout.contains("County"), "should show geography level");
    assert!(stdout.contains("4 features"), "stdout: {stdout}");
}

#[test]
fn layers_json_is_machine_readable() {
    let fx = fixture();
    let output = chorojoin(fx.path())
        .args(["layers", "--json", "--manifest", fx.manifest.to_str().unwrap()])
        .output()
        .expect("chorojoin layers --json");

    assert!(output.status.success());
    let parsed: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("stdout is JSON");
    assert_eq!(parsed[0]["id"], "fl_counties");
    assert_eq!(parsed[0]["geography"], "county");
}

#[test]
fn missing_manifest_exits_with_catalog_code() {
    let fx = fixture();
    let output = chorojoin(fx.path())
        .args(["layers", "--manifest", "nope.toml"])
        .output()
        .expect("chorojoin layers");

    assert_eq!(output.status.code(), Some(3));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("error:"), "stderr: {stderr}");
}

// ---------------------------------------------------------------------------
// analyze
// ---------------------------------------------------------------------------

#[test]
fn analyze_tags_the_fips_column() {
    let fx = fixture();
    let output = chorojoin(fx.path())
        .args(["analyze", fx.csv.to_str().unwrap(), "--json"])
        .output()
        .expect("chorojoin analyze");

    assert!(output.status.success(), "stderr: {}",
        String::from_utf8_lossy(&output.stderr));
    let tags: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("stdout is JSON");
    let roles: Vec<_> = tags
        .as_array()
        .unwrap()
        .iter()
        .map(|t| (t["column"].as_str().unwrap(), t["role"].as_str().unwrap()))
        .collect();
    assert!(roles.contains(&("COUNTY_FIPS", "admin_code")), "tags: {tags}");
    assert!(roles.contains(&("County Name", "place_name")), "tags: {tags}");
}

#[test]
fn analyze_reports_the_full_row_count() {
    let fx = fixture();
    let output = chorojoin(fx.path())
        .args(["analyze", fx.csv.to_str().unwrap()])
        .output()
        .expect("chorojoin analyze");

    assert!(output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("3 row(s)"), "stderr: {stderr}");
}

#[test]
fn analyze_unreadable_csv_exits_with_analyze_code() {
    let fx = fixture();
    let output = chorojoin(fx.path())
        .args(["analyze", "nope.csv"])
        .output()
        .expect("chorojoin analyze");

    assert_eq!(output.status.code(), Some(4));
}

// ---------------------------------------------------------------------------
// suggest
// ---------------------------------------------------------------------------

#[test]
fn suggest_ranks_the_county_layer() {
    let fx = fixture();
    let output = chorojoin(fx.path())
        .args([
            "suggest",
            fx.csv.to_str().unwrap(),
            "--manifest",
            fx.manifest.to_str().unwrap(),
        ])
        .output()
        .expect("chorojoin suggest");

    assert!(output.status.success(), "stderr: {}",
        String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("1. fl_counties"), "stdout: {stdout}");
    assert!(stdout.contains("GEOID"), "should offer the code join");
    assert!(stdout.contains("High confidence"), "stdout: {stdout}");
}

#[test]
fn suggest_with_no_candidates_still_succeeds() {
    let fx = fixture();
    let csv = fx.path().join("opaque.csv");
    std::fs::write(&csv, "a,b\n1,2\n").unwrap();

    let output = chorojoin(fx.path())
        .args([
            "suggest",
            csv.to_str().unwrap(),
            "--manifest",
            fx.manifest.to_str().unwrap(),
        ])
        .output()
        .expect("chorojoin suggest");

    // An empty suggestion list is a valid answer, not a failure.
    assert_eq!(output.status.code(), Some(0));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("no viable"), "stderr: {stderr}");
}

// ---------------------------------------------------------------------------
// join
// ---------------------------------------------------------------------------

#[test]
fn join_writes_geojson_and_report() {
    let fx = fixture();
    let out = fx.path().join("out.geojson");
    let output = chorojoin(fx.path())
        .args([
            "join",
            fx.csv.to_str().unwrap(),
            "fl_counties",
            "COUNTY_FIPS",
            "GEOID",
            out.to_str().unwrap(),
            "--manifest",
            fx.manifest.to_str().unwrap(),
        ])
        .output()
        .expect("chorojoin join");

    assert!(output.status.success(), "stderr: {}",
        String::from_utf8_lossy(&output.stderr));

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("3/4 feature(s) matched (75.0%)"), "stderr: {stderr}");

    let doc: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(doc["type"], "FeatureCollection");
    assert_eq!(doc["features"].as_array().unwrap().len(), 4);
    // Matched feature carries the CSV attribute; unmatched carries null.
    let rate_for = |geoid: &str| {
        doc["features"]
            .as_array()
            .unwrap()
            .iter()
            .find(|f| f["properties"]["GEOID"] == geoid)
            .map(|f| f["properties"]["uninsured_rate"].clone())
            .unwrap()
    };
    assert_eq!(rate_for("12086"), serde_json::json!("17.4"));
    assert_eq!(rate_for("12057"), serde_json::Value::Null);

    let report: serde_json::Value = serde_json::from_str(
        &std::fs::read_to_string(fx.path().join("out.stats.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(report["successful_joins"], 3);
    assert_eq!(report["unmatched_features"], 1);
}

#[test]
fn join_json_prints_report_to_stdout() {
    let fx = fixture();
    let out = fx.path().join("out.geojson");
    let output = chorojoin(fx.path())
        .args([
            "join",
            fx.csv.to_str().unwrap(),
            "fl_counties",
            "COUNTY_FIPS",
            "GEOID",
            out.to_str().unwrap(),
            "--json",
            "--manifest",
            fx.manifest.to_str().unwrap(),
        ])
        .output()
        .expect("chorojoin join --json");

    assert!(output.status.success());
    let report: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("stdout is the report JSON");
    assert_eq!(report["total_features"], 4);
    assert_eq!(report["total_records"], 3);
}

#[test]
fn join_csv_format_drops_geometry() {
    let fx = fixture();
    let out = fx.path().join("out.csv");
    let output = chorojoin(fx.path())
        .args([
            "join",
            fx.csv.to_str().unwrap(),
            "fl_counties",
            "COUNTY_FIPS",
            "GEOID",
            out.to_str().unwrap(),
            "--format",
            "csv",
            "--manifest",
            fx.manifest.to_str().unwrap(),
        ])
        .output()
        .expect("chorojoin join --format csv");

    assert!(output.status.success(), "stderr: {}",
        String::from_utf8_lossy(&output.stderr));
    let content = std::fs::read_to_string(&out).unwrap();
    assert!(content.contains("uninsured_rate"));
    assert!(!content.contains("coordinates"), "geometry leaked into CSV");
}

#[test]
fn join_fuzzy_name_match() {
    let fx = fixture();
    let out = fx.path().join("out.geojson");
    let output = chorojoin(fx.path())
        .args([
            "join",
            fx.csv.to_str().unwrap(),
            "fl_counties",
            "County Name",
            "NAME",
            out.to_str().unwrap(),
            "--fuzzy",
            "--manifest",
            fx.manifest.to_str().unwrap(),
        ])
        .output()
        .expect("chorojoin join --fuzzy");

    assert!(output.status.success(), "stderr: {}",
        String::from_utf8_lossy(&output.stderr));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("3/4 feature(s) matched"), "stderr: {stderr}");
}

#[test]
fn join_unknown_layer_exits_with_catalog_code() {
    let fx = fixture();
    let output = chorojoin(fx.path())
        .args([
            "join",
            fx.csv.to_str().unwrap(),
            "nonexistent",
            "COUNTY_FIPS",
            "GEOID",
            "out.geojson",
            "--manifest",
            fx.manifest.to_str().unwrap(),
        ])
        .output()
        .expect("chorojoin join");

    assert_eq!(output.status.code(), Some(3));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("chorojoin layers"), "hint missing: {stderr}");
}

#[test]
fn join_missing_key_column_names_the_alternatives() {
    let fx = fixture();
    let output = chorojoin(fx.path())
        .args([
            "join",
            fx.csv.to_str().unwrap(),
            "fl_counties",
            "no_such_column",
            "GEOID",
            "out.geojson",
            "--manifest",
            fx.manifest.to_str().unwrap(),
        ])
        .output()
        .expect("chorojoin join");

    assert_eq!(output.status.code(), Some(5));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("no_such_column"), "stderr: {stderr}");
    assert!(stderr.contains("available columns: COUNTY_FIPS"), "stderr: {stderr}");
}

#[test]
fn join_rejects_threshold_above_hundred() {
    let fx = fixture();
    let output = chorojoin(fx.path())
        .args([
            "join",
            fx.csv.to_str().unwrap(),
            "fl_counties",
            "COUNTY_FIPS",
            "GEOID",
            "out.geojson",
            "--threshold",
            "101",
            "--manifest",
            fx.manifest.to_str().unwrap(),
        ])
        .output()
        .expect("chorojoin join");

    assert_eq!(output.status.code(), Some(2));
}
