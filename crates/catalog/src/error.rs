use std::fmt;

#[derive(Debug)]
pub enum CatalogError {
    /// SQLite open/query error.
    Database(String),
    /// TOML manifest parse error.
    ManifestParse(String),
    /// Descriptor failed validation (empty id, missing path, ...).
    Validation(String),
    /// IO error during a directory scan.
    Io(String),
    /// Lookup of a layer id that is not in the catalog.
    UnknownLayer(String),
}

impl fmt::Display for CatalogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Database(msg) => write!(f, "inventory database error: {msg}"),
            Self::ManifestParse(msg) => write!(f, "manifest parse error: {msg}"),
            Self::Validation(msg) => write!(f, "descriptor validation error: {msg}"),
            Self::Io(msg) => write!(f, "IO error: {msg}"),
            Self::UnknownLayer(id) => write!(f, "unknown layer: {id}"),
        }
    }
}

impl std::error::Error for CatalogError {}
