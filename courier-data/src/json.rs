//! Road networks from JSON documents.
//!
//! The document lists nodes and directed edges:
//!
//! ```json
//! {
//!   "nodes": [{ "id": 1, "lat": 14.5547, "lon": 121.0244 }],
//!   "edges": [{ "from": 1, "to": 2, "length_m": 800.0, "two_way": false }]
//! }
//! ```
//!
//! `two_way` defaults to `false`.

use camino::{Utf8Path, Utf8PathBuf};
use courier_core::{NetworkBuildError, NetworkSource, RoadNetwork, SourceError, lat_lon};
use serde::Deserialize;
use thiserror::Error;

use crate::fs::read_to_string;

/// Errors returned when loading a JSON network document.
#[derive(Debug, Error)]
pub enum JsonNetworkError {
    /// The file could not be read.
    #[error("failed to read network document at {path}")]
    Read {
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
        /// File that was requested.
        path: Utf8PathBuf,
    },
    /// The document is not valid JSON of the expected shape.
    #[error("failed to parse network document")]
    Parse(#[from] serde_json::Error),
    /// The document describes an invalid network.
    #[error("network document is invalid")]
    Build(#[from] NetworkBuildError),
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct NetworkDocument {
    nodes: Vec<NodeRecord>,
    #[serde(default)]
    edges: Vec<EdgeRecord>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct NodeRecord {
    id: u64,
    lat: f64,
    lon: f64,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct EdgeRecord {
    from: u64,
    to: u64,
    length_m: f64,
    #[serde(default)]
    two_way: bool,
}

/// Parse a network document held in memory.
///
/// # Errors
/// Returns [`JsonNetworkError::Parse`] for malformed JSON and
/// [`JsonNetworkError::Build`] when the nodes and edges fail validation.
///
/// # Examples
/// ```
/// use courier_data::parse_network;
///
/// let network = parse_network(
///     r#"{"nodes": [{"id": 1, "lat": 14.5547, "lon": 121.0244},
///                  {"id": 2, "lat": 14.5600, "lon": 121.0200}],
///         "edges": [{"from": 1, "to": 2, "length_m": 800.0}]}"#,
/// )?;
/// assert_eq!(network.edge_count(), 1);
/// # Ok::<(), courier_data::JsonNetworkError>(())
/// ```
pub fn parse_network(contents: &str) -> Result<RoadNetwork, JsonNetworkError> {
    let document: NetworkDocument = serde_json::from_str(contents)?;
    let mut builder = RoadNetwork::builder();
    for node in document.nodes {
        builder.add_node(node.id, lat_lon(node.lat, node.lon));
    }
    for edge in document.edges {
        if edge.two_way {
            builder.add_road(edge.from, edge.to, edge.length_m);
        } else {
            builder.add_edge(edge.from, edge.to, edge.length_m);
        }
    }
    Ok(builder.build()?)
}

/// A network document on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonNetworkSource {
    path: Utf8PathBuf,
}

impl JsonNetworkSource {
    /// Read the document at `path` when loaded.
    #[must_use]
    pub fn new(path: impl Into<Utf8PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Load the document.
    ///
    /// # Errors
    /// Returns [`JsonNetworkError`] when the file cannot be read, parsed or
    /// validated.
    pub fn load_network(&self) -> Result<RoadNetwork, JsonNetworkError> {
        load_from(&self.path)
    }
}

fn load_from(path: &Utf8Path) -> Result<RoadNetwork, JsonNetworkError> {
    let contents = read_to_string(path).map_err(|source| JsonNetworkError::Read {
        source,
        path: path.to_path_buf(),
    })?;
    parse_network(&contents)
}

impl NetworkSource for JsonNetworkSource {
    fn describe(&self) -> String {
        format!("network document {}", self.path)
    }

    fn load(&self) -> Result<RoadNetwork, SourceError> {
        Ok(self.load_network()?)
    }
}
