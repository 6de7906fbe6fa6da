//! `chorojoin-io` — file adapters around the join engine.
//!
//! CSV tabular provider, GeoJSON layer reader, and the export adapter
//! (GeoJSON, attribute-only CSV, quality-report side-channel).

pub mod export;
pub mod layer;
pub mod tabular;
