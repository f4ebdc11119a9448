//! Command-line interface for the Courier dispatch engine.
//!
//! Every subcommand reads its inputs from flags, `COURIER_` environment
//! variables or configuration files (layered by `ortho_config`), then prints
//! a JSON document on stdout. Logs go to stderr.
#![forbid(unsafe_code)]

use std::io::Write;

use camino::Utf8Path;
use clap::{Parser, Subcommand};
use courier_core::geodesy::validate_location;
use courier_core::lat_lon;
use geo::Coord;
use serde::Serialize;

mod cluster;
mod dispatch;
mod error;
mod geofence;
mod network;
mod route;

pub use error::CliError;

use cluster::{ClusterArgs, run_cluster};
use dispatch::{DispatchArgs, run_dispatch};
use geofence::{GeofenceArgs, run_geofence};
use route::{RouteArgs, run_route};

const ARG_NETWORK: &str = "network";
const ARG_OSM_PBF: &str = "osm-pbf";
const ARG_FALLBACK_OSM_PBF: &str = "fallback-osm-pbf";
const ARG_BBOX: &str = "bbox";
const ARG_FROM: &str = "from";
const ARG_TO: &str = "to";
const ARG_MAX_SETTLED_NODES: &str = "max-settled-nodes";
const ARG_AT: &str = "at";
const ARG_GEOFENCES: &str = "geofences";
const ARG_WORKERS: &str = "workers";
const ARG_JOBS: &str = "jobs";
const ARG_CLUSTERS: &str = "clusters";
const ARG_SEED: &str = "seed";

const ENV_ROUTE_NETWORK: &str = "COURIER_CMDS_ROUTE_NETWORK";
const ENV_ROUTE_FROM: &str = "COURIER_CMDS_ROUTE_FROM";
const ENV_ROUTE_TO: &str = "COURIER_CMDS_ROUTE_TO";
const ENV_GEOFENCE_GEOFENCES: &str = "COURIER_CMDS_GEOFENCE_GEOFENCES";
const ENV_GEOFENCE_AT: &str = "COURIER_CMDS_GEOFENCE_AT";
const ENV_CLUSTER_JOBS: &str = "COURIER_CMDS_CLUSTER_JOBS";
const ENV_CLUSTER_CLUSTERS: &str = "COURIER_CMDS_CLUSTER_CLUSTERS";
const ENV_DISPATCH_NETWORK: &str = "COURIER_CMDS_DISPATCH_NETWORK";
const ENV_DISPATCH_WORKERS: &str = "COURIER_CMDS_DISPATCH_WORKERS";
const ENV_DISPATCH_JOBS: &str = "COURIER_CMDS_DISPATCH_JOBS";

/// Run the Courier CLI with the current process arguments and environment.
///
/// # Errors
/// Returns [`CliError`] when arguments, configuration or inputs are invalid,
/// or when output cannot be written.
pub fn run() -> Result<(), CliError> {
    let cli = Cli::try_parse().map_err(CliError::ArgumentParsing)?;
    let mut stdout = std::io::stdout().lock();
    match cli.command {
        Command::Route(args) => run_route(args, &mut stdout),
        Command::Geofence(args) => run_geofence(args, &mut stdout),
        Command::Cluster(args) => run_cluster(args, &mut stdout),
        Command::Dispatch(args) => run_dispatch(args, &mut stdout),
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "courier",
    about = "Route, geofence, cluster and dispatch delivery jobs",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Compute the shortest road route and ETA between two points.
    Route(RouteArgs),
    /// Report whether a point lies inside an exclusion zone.
    Geofence(GeofenceArgs),
    /// Group jobs into spatial clusters.
    Cluster(ClusterArgs),
    /// Assign pending jobs to workers.
    Dispatch(DispatchArgs),
}

/// Fail unless `path` names an existing regular file.
fn require_existing(path: &Utf8Path, field: &'static str) -> Result<(), CliError> {
    match courier_data::file_is_file(path) {
        Ok(true) => Ok(()),
        Ok(false) => Err(CliError::SourcePathNotFile {
            field,
            path: path.to_path_buf(),
        }),
        Err(source) if source.kind() == std::io::ErrorKind::NotFound => {
            Err(CliError::MissingSourceFile {
                field,
                path: path.to_path_buf(),
            })
        }
        Err(source) => Err(CliError::InspectSourcePath {
            field,
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Parse a `lat,lon` pair.
fn parse_lat_lon(field: &'static str, value: &str) -> Result<Coord<f64>, CliError> {
    let invalid = || CliError::InvalidCoordinate {
        field,
        value: value.to_owned(),
    };
    let (lat, lon) = value.split_once(',').ok_or_else(invalid)?;
    let lat = lat.trim().parse::<f64>().map_err(|_| invalid())?;
    let lon = lon.trim().parse::<f64>().map_err(|_| invalid())?;
    validate_location(lat_lon(lat, lon)).map_err(|_| invalid())
}

fn write_json<T: Serialize>(writer: &mut dyn Write, value: &T) -> Result<(), CliError> {
    let payload = serde_json::to_string_pretty(value).map_err(CliError::SerializeOutput)?;
    writer
        .write_all(payload.as_bytes())
        .map_err(CliError::WriteOutput)?;
    writer.write_all(b"\n").map_err(CliError::WriteOutput)?;
    Ok(())
}

#[cfg(test)]
mod tests;
