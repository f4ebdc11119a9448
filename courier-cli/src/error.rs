//! Error types emitted by the Courier CLI.
//!
//! Keep this error type reasonably small, as every command helper returns
//! `Result<_, CliError>` and the workspace enables `clippy::result_large_err`.

use std::sync::Arc;

use camino::Utf8PathBuf;
use courier_core::{ClusterError, DispatchError, NetworkLoadError};
use courier_data::{BoundingBoxParseError, JsonNetworkError, OsmNetworkError, SeedError};
use thiserror::Error;

/// Errors emitted by the Courier CLI.
#[derive(Debug, Error)]
pub enum CliError {
    /// Provided arguments failed Clap validation.
    #[error(transparent)]
    ArgumentParsing(#[from] clap::Error),
    /// Configuration layering failed (files, env, CLI).
    #[error("failed to load configuration: {0}")]
    Configuration(#[from] Arc<ortho_config::OrthoError>),
    /// A required option is missing after configuration merging.
    #[error("missing {field} (set --{field} or {env})")]
    MissingArgument {
        /// Flag name without dashes.
        field: &'static str,
        /// Environment variable that can supply it.
        env: &'static str,
    },
    /// Two mutually exclusive options were both supplied.
    #[error("--{first} cannot be combined with --{second}")]
    ConflictingArguments {
        /// First flag supplied.
        first: &'static str,
        /// Flag that conflicts with it.
        second: &'static str,
    },
    /// A fallback extract was named without the bounding box that clips it.
    #[error("--fallback-osm-pbf requires --bbox")]
    FallbackWithoutBounds,
    /// A `lat,lon` value could not be parsed or is outside WGS84.
    #[error("{field} value {value:?} is not a valid lat,lon coordinate")]
    InvalidCoordinate {
        /// Flag name without dashes.
        field: &'static str,
        /// Rejected input.
        value: String,
    },
    /// The bounding box could not be parsed.
    #[error("bbox value {value:?} is invalid: {source}")]
    InvalidBoundingBox {
        /// Rejected input.
        value: String,
        /// Parse failure.
        #[source]
        source: BoundingBoxParseError,
    },
    /// A referenced input path does not exist on disk.
    #[error("{field} path {path:?} does not exist")]
    MissingSourceFile {
        /// Flag name without dashes.
        field: &'static str,
        /// Missing path.
        path: Utf8PathBuf,
    },
    /// A referenced input path exists but is not a file.
    #[error("{field} path {path:?} exists but is not a file")]
    SourcePathNotFile {
        /// Flag name without dashes.
        field: &'static str,
        /// Offending path.
        path: Utf8PathBuf,
    },
    /// A referenced input path could not be inspected due to an IO error.
    #[error("failed to inspect {field} path {path:?}: {source}")]
    InspectSourcePath {
        /// Flag name without dashes.
        field: &'static str,
        /// Offending path.
        path: Utf8PathBuf,
        /// Underlying failure.
        #[source]
        source: std::io::Error,
    },
    /// Building the network from a JSON document failed.
    #[error("failed to load network document: {0}")]
    JsonNetwork(#[from] JsonNetworkError),
    /// Building the network from an OSM extract failed.
    #[error("failed to load OSM extract: {0}")]
    OsmNetwork(#[from] OsmNetworkError),
    /// Both the primary extract and its fallback failed.
    #[error(transparent)]
    LoadNetwork(#[from] NetworkLoadError),
    /// A seed document could not be loaded.
    #[error("failed to load {field} from {path:?}: {source}")]
    Seed {
        /// Flag name without dashes.
        field: &'static str,
        /// Document path.
        path: Utf8PathBuf,
        /// Underlying failure.
        #[source]
        source: SeedError,
    },
    /// Registering workers or submitting jobs failed.
    #[error("dispatch state rejected input: {0}")]
    Dispatch(#[from] DispatchError),
    /// Clustering rejected its parameters.
    #[error("clustering failed: {0}")]
    Cluster(#[from] ClusterError),
    /// Serializing command output failed.
    #[error("failed to serialize output: {0}")]
    SerializeOutput(#[source] serde_json::Error),
    /// Writing command output failed.
    #[error("failed to write output: {0}")]
    WriteOutput(#[source] std::io::Error),
}
