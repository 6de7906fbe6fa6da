//! `chorojoin-catalog` — boundary-layer inventory.
//!
//! Read-only to the join core. Populated from a SQLite inventory database, a
//! static TOML manifest, or a fallback directory scan. Reload is
//! copy-and-swap: build a fresh `Catalog`, then replace the old one.

pub mod error;
pub mod inventory;

pub use error::CatalogError;
pub use inventory::Catalog;
