//! `chorojoin-engine` — CSV-to-boundary-layer join engine.
//!
//! Pure engine crate: receives pre-loaded tables and layers, returns merged
//! features plus a join-quality report. No CLI or IO dependencies.

pub mod classify;
pub mod error;
pub mod executor;
pub mod matcher;
pub mod model;
pub mod suggest;

pub use classify::classify_columns;
pub use error::{Dataset, JoinError};
pub use executor::execute;
pub use model::{JoinOptions, JoinResult, LayerData, LayerDescriptor, Table};
pub use suggest::suggest_joins;
