//! Road networks from OpenStreetMap PBF extracts.
//!
//! Only drivable ways are kept, following the `highway` classes of a drive
//! network. `oneway` and roundabout tags decide edge direction, and edge
//! lengths are great-circle distances between consecutive way nodes.
//!
//! Ingestion runs in two passes: a parallel pass collects drivable ways and
//! the node references they need, then a sequential pass resolves those
//! references to coordinates.

use camino::{Utf8Path, Utf8PathBuf};
use courier_core::{NetworkBuildError, NetworkSource, RoadNetwork, SourceError};
use log::{info, warn};
use osmpbf::{Element, ElementReader};
use thiserror::Error;

mod accumulator;
mod bounds;
mod tags;

pub use bounds::{BoundingBox, BoundingBoxParseError};

use accumulator::RoadAccumulator;

/// Errors returned when building a network from an OSM PBF file.
#[derive(Debug, Error)]
pub enum OsmNetworkError {
    /// The file could not be opened.
    #[error("failed to open OSM PBF file at {path}")]
    Open {
        /// Underlying reader failure.
        #[source]
        source: osmpbf::Error,
        /// File that was requested.
        path: Utf8PathBuf,
    },
    /// The file is not valid PBF data.
    #[error("failed to decode OSM PBF data at {path}")]
    Decode {
        /// Underlying decoder failure.
        #[source]
        source: osmpbf::Error,
        /// File being decoded.
        path: Utf8PathBuf,
    },
    /// The extracted elements did not form a valid network.
    #[error("OSM data at {path} produced an invalid road network")]
    Build {
        /// Validation failure.
        #[source]
        source: NetworkBuildError,
        /// File being decoded.
        path: Utf8PathBuf,
    },
    /// No drivable road survived filtering.
    #[error("OSM data at {path} contains no drivable roads{}", bounds_suffix(.bounds.as_ref()))]
    Empty {
        /// File being decoded.
        path: Utf8PathBuf,
        /// Bounding box applied, if any.
        bounds: Option<BoundingBox>,
    },
}

fn bounds_suffix(bounds: Option<&BoundingBox>) -> String {
    bounds.map_or_else(String::new, |b| format!(" inside {b}"))
}

/// A PBF extract, optionally clipped to a bounding box.
///
/// The unclipped extract of a named place serves as the primary source; the
/// same or a wider extract clipped to the service area's bounding box serves
/// as the fallback.
#[derive(Debug, Clone, PartialEq)]
pub struct OsmNetworkSource {
    path: Utf8PathBuf,
    bounds: Option<BoundingBox>,
}

impl OsmNetworkSource {
    /// Read every drivable road in the extract at `path`.
    #[must_use]
    pub fn new(path: impl Into<Utf8PathBuf>) -> Self {
        Self {
            path: path.into(),
            bounds: None,
        }
    }

    /// Keep only road segments whose endpoints lie inside `bounds`.
    #[must_use]
    pub const fn with_bounds(mut self, bounds: BoundingBox) -> Self {
        self.bounds = Some(bounds);
        self
    }

    /// File this source reads.
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }
}

impl NetworkSource for OsmNetworkSource {
    fn describe(&self) -> String {
        self.bounds.map_or_else(
            || format!("OSM extract {}", self.path),
            |bounds| format!("OSM extract {} clipped to {bounds}", self.path),
        )
    }

    fn load(&self) -> Result<RoadNetwork, SourceError> {
        Ok(load_osm_network(&self.path, self.bounds)?)
    }
}

/// Build a drivable road network from the PBF file at `path`.
///
/// # Errors
/// Returns [`OsmNetworkError`] when the file cannot be opened or decoded, or
/// when no drivable road remains after filtering.
///
/// # Examples
/// ```no_run
/// use camino::Utf8Path;
/// use courier_data::{BoundingBox, load_osm_network};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let makati: BoundingBox = "14.569,14.535,121.043,121.008".parse()?;
/// let network = load_osm_network(Utf8Path::new("philippines.osm.pbf"), Some(makati))?;
/// assert!(network.node_count() > 0);
/// # Ok(())
/// # }
/// ```
pub fn load_osm_network(
    path: &Utf8Path,
    bounds: Option<BoundingBox>,
) -> Result<RoadNetwork, OsmNetworkError> {
    let open_error = |source| OsmNetworkError::Open {
        source,
        path: path.to_path_buf(),
    };
    let decode_error = |source| OsmNetworkError::Decode {
        source,
        path: path.to_path_buf(),
    };

    let reader = ElementReader::from_path(path).map_err(open_error)?;
    let mut accumulator = reader
        .par_map_reduce(
            |element| {
                let mut accumulator = RoadAccumulator::default();
                accumulator.process_element(&element);
                accumulator
            },
            RoadAccumulator::default,
            RoadAccumulator::combine,
        )
        .map_err(decode_error)?;

    if accumulator.has_pending_nodes() {
        let resolver = ElementReader::from_path(path).map_err(open_error)?;
        let accumulator_ref = &mut accumulator;
        resolver
            .for_each(|element| match element {
                Element::Node(node) => {
                    accumulator_ref.resolve_node(node.id(), node.lon(), node.lat());
                }
                Element::DenseNode(node) => {
                    accumulator_ref.resolve_node(node.id(), node.lon(), node.lat());
                }
                Element::Way(_) | Element::Relation(_) => {}
            })
            .map_err(decode_error)?;
    }
    if accumulator.has_pending_nodes() {
        warn!(
            "Skipped {} way node references without coordinates in {path}",
            accumulator.pending_node_count()
        );
    }

    let stats = accumulator.stats();
    let builder = accumulator.into_builder(bounds);
    if builder.node_count() == 0 {
        return Err(OsmNetworkError::Empty {
            path: path.to_path_buf(),
            bounds,
        });
    }
    let network = builder.build().map_err(|source| OsmNetworkError::Build {
        source,
        path: path.to_path_buf(),
    })?;
    info!(
        "built road network from {path}: {} drivable ways, {} ignored ways, {} nodes, {} edges",
        stats.drivable_ways,
        stats.ignored_ways,
        network.node_count(),
        network.edge_count()
    );
    Ok(network)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::io::Write;
    use tempfile::Builder;

    #[rstest]
    fn missing_file_is_an_open_error() {
        let dir = tempfile::tempdir().unwrap_or_else(|err| panic!("temp dir: {err}"));
        let missing = Utf8PathBuf::from_path_buf(dir.path().join("missing.osm.pbf"))
            .unwrap_or_else(|path| panic!("non-UTF-8 temp path {path:?}"));
        match load_osm_network(&missing, None) {
            Err(OsmNetworkError::Open { path, .. }) => assert_eq!(path, missing),
            other => panic!("expected open error, got {other:?}"),
        }
    }

    #[rstest]
    fn garbage_bytes_are_a_decode_error() {
        let mut file = Builder::new()
            .suffix(".osm.pbf")
            .tempfile()
            .unwrap_or_else(|err| panic!("temp file: {err}"));
        file.write_all(b"\x00\x00\x00\x0dnot a pbf blob at all")
            .unwrap_or_else(|err| panic!("write temp file: {err}"));
        let path = Utf8PathBuf::from_path_buf(file.path().to_path_buf())
            .unwrap_or_else(|path| panic!("non-UTF-8 temp path {path:?}"));
        match load_osm_network(&path, None) {
            Err(OsmNetworkError::Decode { path: reported, .. }) => assert_eq!(reported, path),
            other => panic!("expected decode error, got {other:?}"),
        }
    }

    #[rstest]
    fn describe_mentions_bounds() {
        let bounds = BoundingBox::new(14.569, 14.535, 121.043, 121.008);
        let source = OsmNetworkSource::new("makati.osm.pbf").with_bounds(bounds);
        assert_eq!(
            source.describe(),
            "OSM extract makati.osm.pbf clipped to north=14.569 south=14.535 east=121.043 west=121.008"
        );
    }
}
