// chorojoin CLI - join CSV data to boundary layers, headless.

mod exit_codes;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};

use chorojoin_catalog::{Catalog, CatalogError};
use chorojoin_engine::model::{JoinOptions, JoinResult};
use chorojoin_engine::{classify_columns, execute, suggest_joins, JoinError};
use chorojoin_io::{export, layer, tabular};

use exit_codes::{EXIT_ANALYZE, EXIT_CATALOG, EXIT_ERROR, EXIT_JOIN, EXIT_SUCCESS, EXIT_USAGE};

/// Rows read when ranking suggestions; classification samples within them.
const SUGGEST_SAMPLE_ROWS: usize = 10;

#[derive(Parser)]
#[command(name = "chorojoin")]
#[command(about = "Join CSV data to boundary layers for choropleth mapping")]
#[command(version)]
struct Cli {
    /// Inventory database (SQLite) holding layer metadata
    #[arg(long, global = true, default_value = "gis_metadata.db")]
    catalog: PathBuf,

    /// Static TOML layer manifest (takes precedence over --catalog)
    #[arg(long, global = true)]
    manifest: Option<PathBuf>,

    /// Directory scanned for GeoJSON layers when no inventory exists
    #[arg(long, global = true, default_value = "data")]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List available boundary layers
    #[command(after_help = "\
Examples:
  chorojoin layers
  chorojoin layers --json
  chorojoin layers --manifest layers.toml")]
    Layers {
        /// Output JSON instead of the human listing
        #[arg(long)]
        json: bool,
    },

    /// Detect potential join columns in a CSV file
    #[command(after_help = "\
Examples:
  chorojoin analyze health_by_county.csv
  chorojoin analyze health_by_county.csv --json")]
    Analyze {
        /// CSV file to inspect
        csv: PathBuf,

        #[arg(long)]
        json: bool,
    },

    /// Rank layers by join fitness for a CSV file
    #[command(after_help = "\
Examples:
  chorojoin suggest health_by_county.csv
  chorojoin suggest health_by_county.csv --json")]
    Suggest {
        /// CSV file to match against the catalog
        csv: PathBuf,

        #[arg(long)]
        json: bool,
    },

    /// Join a CSV file to a layer and export the merged result
    #[command(after_help = "\
Examples:
  chorojoin join data.csv fl_counties.json COUNTY_FIPS GEOID out.geojson
  chorojoin join data.csv fl_counties.json county NAME out.geojson --fuzzy
  chorojoin join data.csv fl_counties.json COUNTY_FIPS GEOID out.csv --format csv")]
    Join {
        /// CSV file (right side of the join)
        csv: PathBuf,
        /// Layer id from the catalog (left side, fully retained)
        layer: String,
        /// Join key column in the CSV
        csv_field: String,
        /// Join key column on the layer
        geo_field: String,
        /// Output path
        output: PathBuf,

        /// Fuzzy-match name fields instead of exact key equality
        /// (code keys always join exactly)
        #[arg(long)]
        fuzzy: bool,

        /// Minimum similarity (0-100) for a fuzzy match
        #[arg(long, default_value_t = chorojoin_engine::matcher::DEFAULT_THRESHOLD)]
        threshold: u32,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Geojson)]
        format: OutputFormat,

        /// Print the quality report as JSON to stdout
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Geojson,
    Csv,
}

struct CliError {
    code: u8,
    message: String,
    hint: Option<String>,
}

fn err(code: u8, message: impl Into<String>) -> CliError {
    CliError { code, message: message.into(), hint: None }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let catalog_sources = CatalogSources {
        manifest: cli.manifest,
        database: cli.catalog,
        data_dir: cli.data_dir,
    };

    let result = match cli.command {
        Commands::Layers { json } => cmd_layers(&catalog_sources, json),
        Commands::Analyze { csv, json } => cmd_analyze(&csv, json),
        Commands::Suggest { csv, json } => cmd_suggest(&catalog_sources, &csv, json),
        Commands::Join { csv, layer, csv_field, geo_field, output, fuzzy, threshold, format, json } => {
            cmd_join(&catalog_sources, JoinArgs {
                csv, layer, csv_field, geo_field, output, fuzzy, threshold, format, json,
            })
        }
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(e) => {
            eprintln!("error: {}", e.message);
            if let Some(hint) = e.hint {
                eprintln!("hint: {hint}");
            }
            ExitCode::from(if e.code == 0 { EXIT_ERROR } else { e.code })
        }
    }
}

// ---------------------------------------------------------------------------
// Catalog resolution
// ---------------------------------------------------------------------------

struct CatalogSources {
    manifest: Option<PathBuf>,
    database: PathBuf,
    data_dir: PathBuf,
}

/// Manifest wins if given; otherwise the inventory database; otherwise a
/// directory scan (matching the legacy tool's fallback).
fn load_catalog(sources: &CatalogSources) -> Result<Catalog, CliError> {
    if let Some(ref manifest) = sources.manifest {
        let text = std::fs::read_to_string(manifest)
            .map_err(|e| err(EXIT_CATALOG, format!("cannot read {}: {e}", manifest.display())))?;
        return Catalog::from_manifest(&text).map_err(catalog_err);
    }

    if sources.database.is_file() {
        let catalog = Catalog::from_sqlite(&sources.database).map_err(catalog_err)?;
        if catalog.skipped > 0 {
            eprintln!("warning: skipped {} invalid inventory row(s)", catalog.skipped);
        }
        return Ok(catalog);
    }

    eprintln!(
        "warning: no inventory at {}, scanning {}",
        sources.database.display(),
        sources.data_dir.display()
    );
    Catalog::scan_dir(&sources.data_dir).map_err(catalog_err)
}

fn catalog_err(e: CatalogError) -> CliError {
    err(EXIT_CATALOG, e.to_string())
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

fn cmd_layers(sources: &CatalogSources, json: bool) -> Result<(), CliError> {
    let catalog = load_catalog(sources)?;
    let layers = catalog.list();

    if json {
        let text = serde_json::to_string_pretty(&layers)
            .map_err(|e| err(EXIT_ERROR, e.to_string()))?;
        println!("{text}");
        return Ok(());
    }

    if layers.is_empty() {
        eprintln!("no layers available");
        return Ok(());
    }

    for layer in layers {
        println!(
            "{}  [{}]  {} features  crs={}  coverage={}",
            layer.id,
            layer.geography,
            layer.record_count,
            if layer.crs.is_empty() { "?" } else { layer.crs.as_str() },
            if layer.coverage.is_empty() { "?" } else { layer.coverage.as_str() },
        );
    }
    Ok(())
}

fn cmd_analyze(csv: &Path, json: bool) -> Result<(), CliError> {
    let table = tabular::load_all(csv).map_err(|e| err(EXIT_ANALYZE, e.to_string()))?;
    let tags = classify_columns(&table);

    if json {
        let text = serde_json::to_string_pretty(&tags)
            .map_err(|e| err(EXIT_ERROR, e.to_string()))?;
        println!("{text}");
        return Ok(());
    }

    eprintln!(
        "{} row(s), {} column(s), {} tagged",
        table.rows.len(),
        table.columns.len(),
        tags.len()
    );
    for tag in &tags {
        let level = tag
            .code_level
            .map(|l| format!(" ({l:?})").to_lowercase())
            .unwrap_or_default();
        println!(
            "{}  {}{}  samples: {}",
            tag.column,
            tag.role,
            level,
            tag.samples.join(", "),
        );
    }
    Ok(())
}

fn cmd_suggest(sources: &CatalogSources, csv: &Path, json: bool) -> Result<(), CliError> {
    let catalog = load_catalog(sources)?;
    let sample = tabular::load_sample(csv, SUGGEST_SAMPLE_ROWS)
        .map_err(|e| err(EXIT_ANALYZE, e.to_string()))?;
    let tags = classify_columns(&sample);
    let layers: Vec<_> = catalog.list().into_iter().cloned().collect();
    let suggestions = suggest_joins(&tags, &layers);

    if json {
        let text = serde_json::to_string_pretty(&suggestions)
            .map_err(|e| err(EXIT_ERROR, e.to_string()))?;
        println!("{text}");
        return Ok(());
    }

    // An empty list is a valid outcome: the caller maps columns manually.
    if suggestions.is_empty() {
        eprintln!("no viable join suggestions; pick a layer and key columns manually");
        return Ok(());
    }

    for (i, s) in suggestions.iter().enumerate() {
        println!("{}. {} ({})  score={}", i + 1, s.layer_id, s.geography, s.score);
        if !s.coverage.is_empty() {
            println!("   coverage: {}", s.coverage);
        }
        for option in &s.options {
            println!(
                "   join: {} -> {} ({} confidence)",
                option.csv_column, option.layer_column, option.confidence,
            );
        }
    }
    Ok(())
}

struct JoinArgs {
    csv: PathBuf,
    layer: String,
    csv_field: String,
    geo_field: String,
    output: PathBuf,
    fuzzy: bool,
    threshold: u32,
    format: OutputFormat,
    json: bool,
}

fn cmd_join(sources: &CatalogSources, args: JoinArgs) -> Result<(), CliError> {
    if args.threshold > 100 {
        return Err(err(EXIT_USAGE, "--threshold must be between 0 and 100"));
    }

    let catalog = load_catalog(sources)?;
    let descriptor = catalog.get(&args.layer).map_err(|e| CliError {
        code: EXIT_CATALOG,
        message: e.to_string(),
        hint: Some("run `chorojoin layers` to list available layer ids".into()),
    })?;

    let table = tabular::load_all(&args.csv).map_err(|e| err(EXIT_JOIN, e.to_string()))?;
    eprintln!("loaded {} tabular record(s)", table.rows.len());

    let layer_data =
        layer::load_layer(Path::new(&descriptor.path)).map_err(|e| err(EXIT_JOIN, e.to_string()))?;
    eprintln!("loaded {} layer feature(s)", layer_data.features.len());

    let options = JoinOptions { fuzzy: args.fuzzy, threshold: args.threshold };
    let result = execute(&table, &layer_data, &args.csv_field, &args.geo_field, &options)
        .map_err(|e| join_err(e, &table, &layer_data))?;

    match args.format {
        OutputFormat::Geojson => export::export_geojson(&result.merged, &args.output),
        OutputFormat::Csv => export::export_csv(&result.merged, &args.output),
    }
    .map_err(|e| err(EXIT_JOIN, e.to_string()))?;

    let report_file =
        export::write_report(&result.report, &args.output).map_err(|e| err(EXIT_JOIN, e.to_string()))?;

    print_summary(&result, &args.output, &report_file);

    if args.json {
        let text = serde_json::to_string_pretty(&result.report)
            .map_err(|e| err(EXIT_ERROR, e.to_string()))?;
        println!("{text}");
    }
    Ok(())
}

fn join_err(
    e: JoinError,
    table: &chorojoin_engine::Table,
    layer_data: &chorojoin_engine::LayerData,
) -> CliError {
    let hint = match &e {
        JoinError::MissingColumn { dataset, .. } => {
            let columns = match dataset {
                chorojoin_engine::Dataset::Tabular => &table.columns,
                chorojoin_engine::Dataset::Layer => &layer_data.columns,
            };
            Some(format!("available columns: {}", columns.join(", ")))
        }
        JoinError::Io(_) => None,
    };
    CliError { code: EXIT_JOIN, message: e.to_string(), hint }
}

fn print_summary(result: &JoinResult, output: &Path, report_file: &Path) {
    let r = &result.report;
    eprintln!(
        "join completed: {}/{} feature(s) matched ({:.1}%), {} unmatched record(s)",
        r.successful_joins,
        r.total_features,
        r.join_rate * 100.0,
        r.unmatched_records.max(0),
    );
    eprintln!("wrote {}", output.display());
    eprintln!("wrote {}", report_file.display());
}
