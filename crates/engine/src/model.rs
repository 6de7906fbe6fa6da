use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ---------------------------------------------------------------------------
// Layers
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeographyLevel {
    State,
    County,
    ZipCode,
    CensusTract,
    Place,
    Unknown,
}

impl std::fmt::Display for GeographyLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::State => write!(f, "State"),
            Self::County => write!(f, "County"),
            Self::ZipCode => write!(f, "ZIP Code"),
            Self::CensusTract => write!(f, "Census Tract"),
            Self::Place => write!(f, "Place"),
            Self::Unknown => write!(f, "Unknown"),
        }
    }
}

/// Metadata for one boundary dataset. Immutable once loaded; owned by the
/// catalog for the lifetime of the process (or until a catalog reload, which
/// swaps the whole catalog).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayerDescriptor {
    pub id: String,
    pub path: String,
    pub geography: GeographyLevel,
    #[serde(default)]
    pub record_count: usize,
    #[serde(default)]
    pub crs: String,
    /// Recognized join-key columns on the layer side.
    #[serde(default)]
    pub join_fields: Vec<String>,
    #[serde(default)]
    pub coverage: String,
}

// ---------------------------------------------------------------------------
// Column classification
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnRole {
    AdminCode,
    PostalCode,
    PlaceName,
    StateRef,
}

impl std::fmt::Display for ColumnRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AdminCode => write!(f, "admin_code"),
            Self::PostalCode => write!(f, "postal_code"),
            Self::PlaceName => write!(f, "place_name"),
            Self::StateRef => write!(f, "state_ref"),
        }
    }
}

/// Narrows an admin-code tag to the geography it identifies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AdminCodeLevel {
    /// 5-character all-digit code (county FIPS).
    County,
    /// 2-character all-digit code (state FIPS).
    State,
}

/// One semantic role detected on a column, with the sample values that
/// justified it. Created fresh per analysis call; never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct ColumnTag {
    pub column: String,
    pub role: ColumnRole,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code_level: Option<AdminCodeLevel>,
    pub samples: Vec<String>,
}

// ---------------------------------------------------------------------------
// Join suggestions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    AdminCode,
    PostalCode,
    Name,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

impl std::fmt::Display for Confidence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::High => write!(f, "High"),
            Self::Medium => write!(f, "Medium"),
            Self::Low => write!(f, "Low"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct JoinOption {
    pub csv_column: String,
    pub layer_column: String,
    pub kind: MatchKind,
    pub confidence: Confidence,
}

/// One ranked join plan for a layer. A suggestion carries every option that
/// contributed to its score (a layer can offer both a code-based and a
/// name-based join).
#[derive(Debug, Clone, Serialize)]
pub struct JoinSuggestion {
    pub layer_id: String,
    pub geography: GeographyLevel,
    pub coverage: String,
    pub score: u32,
    pub options: Vec<JoinOption>,
}

// ---------------------------------------------------------------------------
// Tabular input
// ---------------------------------------------------------------------------

/// An in-memory tabular dataset. All values are text; typing is the
/// consumer's problem. Missing values are empty strings.
#[derive(Debug, Clone)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Up to `n` non-missing values from a column, trimmed.
    pub fn sample_values(&self, col: usize, n: usize) -> Vec<String> {
        self.rows
            .iter()
            .filter_map(|row| row.get(col))
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .take(n)
            .map(str::to_string)
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Layer input
// ---------------------------------------------------------------------------

/// A single boundary feature. Geometry is opaque — it is carried through
/// to export untouched, never validated or reprojected.
#[derive(Debug, Clone)]
pub struct Feature {
    pub geometry: Option<Value>,
    pub properties: Map<String, Value>,
}

#[derive(Debug, Clone)]
pub struct LayerData {
    pub columns: Vec<String>,
    pub crs: Option<String>,
    pub features: Vec<Feature>,
}

// ---------------------------------------------------------------------------
// Join output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
pub struct JoinOptions {
    pub fuzzy: bool,
    /// Minimum similarity (0-100) for a fuzzy match to be accepted.
    pub threshold: u32,
}

impl Default for JoinOptions {
    fn default() -> Self {
        Self {
            fuzzy: false,
            threshold: crate::matcher::DEFAULT_THRESHOLD,
        }
    }
}

/// Layer features augmented with the columns of matching tabular records.
/// Left-outer semantics: every layer feature is retained; duplicate source
/// keys fan out into one merged feature per matching record.
#[derive(Debug, Clone)]
pub struct MergedRecordSet {
    /// Attribute column order: layer columns first, then tabular columns
    /// (renamed with a `_csv` suffix on collision). Feature properties are
    /// keyed by name, so duplicate tabular headers collapse to the last
    /// column, and a renamed `<name>_csv` that matches an existing layer
    /// column overwrites it.
    pub columns: Vec<String>,
    /// Source layer CRS, passed through untouched.
    pub crs: Option<String>,
    pub features: Vec<Feature>,
}

/// Join-quality accounting, attached to the result as metadata.
///
/// `successful_joins` counts merged rows with a non-missing source key, so
/// under fan-out it can exceed `total_records` and drive the unmatched
/// counts negative. That is the defined arithmetic, not a bug.
#[derive(Debug, Clone, Serialize)]
pub struct JoinReport {
    pub total_features: usize,
    pub total_records: usize,
    pub successful_joins: usize,
    /// successful / total_features, 0 when the layer is empty.
    pub join_rate: f64,
    pub unmatched_features: i64,
    pub unmatched_records: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct JoinMeta {
    pub engine_version: String,
    pub run_at: String,
    pub fuzzy: bool,
    pub threshold: u32,
}

#[derive(Debug, Clone)]
pub struct JoinResult {
    pub meta: JoinMeta,
    pub report: JoinReport,
    pub merged: MergedRecordSet,
}
