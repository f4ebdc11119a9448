//! `route` command: shortest road path and ETA between two points.

use std::io::Write;
use std::sync::Arc;

use camino::Utf8PathBuf;
use clap::Parser;
use courier_core::{DijkstraRouter, RoutePlan, Router, RouterConfig};
use geo::Coord;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};

use crate::network::{NetworkConfig, NetworkInputs};
use crate::{
    ARG_BBOX, ARG_FALLBACK_OSM_PBF, ARG_FROM, ARG_MAX_SETTLED_NODES, ARG_NETWORK, ARG_OSM_PBF,
    ARG_TO, CliError, ENV_ROUTE_FROM, ENV_ROUTE_NETWORK, ENV_ROUTE_TO, parse_lat_lon, write_json,
};

/// CLI arguments for the `route` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Snap both points to their nearest intersections and run a \
                 shortest-path search over the road network. Prints the \
                 waypoints, distance and ETA as JSON; an unreachable \
                 destination yields an empty route with a zero ETA.",
    about = "Route between two points"
)]
#[ortho_config(prefix = "COURIER")]
pub(crate) struct RouteArgs {
    /// Path to a JSON network document.
    #[arg(long = ARG_NETWORK, value_name = "path")]
    #[serde(default)]
    pub(crate) network: Option<Utf8PathBuf>,
    /// Path to the primary OSM PBF extract.
    #[arg(long = ARG_OSM_PBF, value_name = "path")]
    #[serde(default)]
    pub(crate) osm_pbf: Option<Utf8PathBuf>,
    /// Extract to clip with `--bbox` when the primary fails (defaults to the primary).
    #[arg(long = ARG_FALLBACK_OSM_PBF, value_name = "path")]
    #[serde(default)]
    pub(crate) fallback_osm_pbf: Option<Utf8PathBuf>,
    /// Service area as `north,south,east,west`.
    #[arg(long = ARG_BBOX, value_name = "n,s,e,w", allow_hyphen_values = true)]
    #[serde(default)]
    pub(crate) bbox: Option<String>,
    /// Origin as `lat,lon`.
    #[arg(long = ARG_FROM, value_name = "lat,lon", allow_hyphen_values = true)]
    #[serde(default)]
    pub(crate) from: Option<String>,
    /// Destination as `lat,lon`.
    #[arg(long = ARG_TO, value_name = "lat,lon", allow_hyphen_values = true)]
    #[serde(default)]
    pub(crate) to: Option<String>,
    /// Abandon the search after settling this many intersections.
    #[arg(long = ARG_MAX_SETTLED_NODES, value_name = "count")]
    #[serde(default)]
    pub(crate) max_settled_nodes: Option<usize>,
}

impl RouteArgs {
    fn into_config(self) -> Result<RouteConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        RouteConfig::try_from(merged)
    }
}

/// Resolved `route` command configuration.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RouteConfig {
    pub(crate) network: NetworkConfig,
    pub(crate) from: Coord<f64>,
    pub(crate) to: Coord<f64>,
    pub(crate) router: RouterConfig,
}

impl TryFrom<RouteArgs> for RouteConfig {
    type Error = CliError;

    fn try_from(args: RouteArgs) -> Result<Self, Self::Error> {
        let network = NetworkConfig::resolve(
            NetworkInputs {
                network: args.network,
                osm_pbf: args.osm_pbf,
                fallback_osm_pbf: args.fallback_osm_pbf,
                bbox: args.bbox,
            },
            ENV_ROUTE_NETWORK,
        )?;
        let from = args.from.ok_or(CliError::MissingArgument {
            field: ARG_FROM,
            env: ENV_ROUTE_FROM,
        })?;
        let to = args.to.ok_or(CliError::MissingArgument {
            field: ARG_TO,
            env: ENV_ROUTE_TO,
        })?;
        let mut router = RouterConfig::default();
        if let Some(limit) = args.max_settled_nodes {
            router = router.with_max_settled_nodes(limit);
        }
        Ok(Self {
            network,
            from: parse_lat_lon(ARG_FROM, &from)?,
            to: parse_lat_lon(ARG_TO, &to)?,
            router,
        })
    }
}

pub(crate) fn run_route(args: RouteArgs, writer: &mut dyn Write) -> Result<(), CliError> {
    let config = args.into_config()?;
    config.network.validate_sources()?;
    let plan = execute_route(&config)?;
    write_json(writer, &plan)
}

pub(crate) fn execute_route(config: &RouteConfig) -> Result<RoutePlan, CliError> {
    let network = Arc::new(config.network.load()?);
    let router = DijkstraRouter::with_config(network, config.router);
    Ok(router.route(config.from, config.to))
}
