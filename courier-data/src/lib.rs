//! Data sources for the Courier engine.
//!
//! Responsibilities:
//! - Build road networks from OpenStreetMap PBF extracts and JSON documents.
//! - Parse JSON seed documents for geofences, workers and jobs.
//! - Check input paths before loading.
//!
//! Boundaries:
//! - Do not encode dispatch rules (they live in `courier-core`).
//! - Files are opened through `cap-std` with ambient authority.
//!
//! Invariants:
//! - Loaders are deterministic for a given input file.
//! - No global mutable state.

#![forbid(unsafe_code)]

mod fs;
mod json;
mod osm;
mod seed;

pub use fs::file_is_file;
pub use json::{JsonNetworkError, JsonNetworkSource, parse_network};
pub use osm::{
    BoundingBox, BoundingBoxParseError, OsmNetworkError, OsmNetworkSource, load_osm_network,
};
pub use seed::{
    SeedError, load_geofences, load_jobs, load_workers, parse_geofences, parse_jobs,
    parse_workers,
};
