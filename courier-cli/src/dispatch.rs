//! `dispatch` command: one assignment run over seeded workers and jobs.

use std::io::Write;
use std::sync::Arc;

use camino::Utf8PathBuf;
use clap::Parser;
use courier_core::{
    Clusterer, ClustererConfig, DijkstraRouter, DispatchEngine, DispatchReport, DispatchState,
    FleetSnapshot, Geofence, GeofenceIndex, Job, RouterConfig,
};
use courier_data::load_workers;
use log::info;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};

use crate::cluster::load_job_requests;
use crate::geofence::load_geofence_index;
use crate::network::{NetworkConfig, NetworkInputs};
use crate::{
    ARG_BBOX, ARG_CLUSTERS, ARG_FALLBACK_OSM_PBF, ARG_GEOFENCES, ARG_JOBS, ARG_MAX_SETTLED_NODES,
    ARG_NETWORK, ARG_OSM_PBF, ARG_SEED, ARG_WORKERS, CliError, ENV_DISPATCH_JOBS,
    ENV_DISPATCH_NETWORK, ENV_DISPATCH_WORKERS, require_existing, write_json,
};

/// CLI arguments for the `dispatch` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Register the workers and submit the jobs from their JSON \
                 documents, then assign every pending job outside the \
                 exclusion zones to the worker with the lowest distance plus \
                 load score. Prints the run report, the resulting fleet and, \
                 with --clusters, the clusters of jobs left pending.",
    about = "Assign jobs to workers"
)]
#[ortho_config(prefix = "COURIER")]
pub(crate) struct DispatchArgs {
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
    /// Path to a JSON worker document.
    #[arg(long = ARG_WORKERS, value_name = "path")]
    #[serde(default)]
    pub(crate) workers: Option<Utf8PathBuf>,
    /// Path to a JSON job document.
    #[arg(long = ARG_JOBS, value_name = "path")]
    #[serde(default)]
    pub(crate) jobs: Option<Utf8PathBuf>,
    /// Path to a JSON geofence document; no exclusion zones when omitted.
    #[arg(long = ARG_GEOFENCES, value_name = "path")]
    #[serde(default)]
    pub(crate) geofences: Option<Utf8PathBuf>,
    /// Cluster the jobs left pending into this many groups.
    #[arg(long = ARG_CLUSTERS, value_name = "k")]
    #[serde(default)]
    pub(crate) clusters: Option<usize>,
    /// Seed for centroid initialisation.
    #[arg(long = ARG_SEED, value_name = "seed")]
    #[serde(default)]
    pub(crate) seed: Option<u64>,
    /// Abandon each route search after settling this many intersections.
    #[arg(long = ARG_MAX_SETTLED_NODES, value_name = "count")]
    #[serde(default)]
    pub(crate) max_settled_nodes: Option<usize>,
}

impl DispatchArgs {
    fn into_config(self) -> Result<DispatchConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        DispatchConfig::try_from(merged)
    }
}

/// Resolved `dispatch` command configuration.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct DispatchConfig {
    pub(crate) network: NetworkConfig,
    pub(crate) workers: Utf8PathBuf,
    pub(crate) jobs: Utf8PathBuf,
    pub(crate) geofences: Option<Utf8PathBuf>,
    pub(crate) clusters: Option<usize>,
    pub(crate) clusterer: ClustererConfig,
    pub(crate) router: RouterConfig,
}

impl DispatchConfig {
    pub(crate) fn validate_sources(&self) -> Result<(), CliError> {
        self.network.validate_sources()?;
        require_existing(&self.workers, ARG_WORKERS)?;
        require_existing(&self.jobs, ARG_JOBS)?;
        if let Some(geofences) = &self.geofences {
            require_existing(geofences, ARG_GEOFENCES)?;
        }
        Ok(())
    }
}

impl TryFrom<DispatchArgs> for DispatchConfig {
    type Error = CliError;

    fn try_from(args: DispatchArgs) -> Result<Self, Self::Error> {
        let network = NetworkConfig::resolve(
            NetworkInputs {
                network: args.network,
                osm_pbf: args.osm_pbf,
                fallback_osm_pbf: args.fallback_osm_pbf,
                bbox: args.bbox,
            },
            ENV_DISPATCH_NETWORK,
        )?;
        let workers = args.workers.ok_or(CliError::MissingArgument {
            field: ARG_WORKERS,
            env: ENV_DISPATCH_WORKERS,
        })?;
        let jobs = args.jobs.ok_or(CliError::MissingArgument {
            field: ARG_JOBS,
            env: ENV_DISPATCH_JOBS,
        })?;
        let defaults = ClustererConfig::default();
        let mut router = RouterConfig::default();
        if let Some(limit) = args.max_settled_nodes {
            router = router.with_max_settled_nodes(limit);
        }
        Ok(Self {
            network,
            workers,
            jobs,
            geofences: args.geofences,
            clusters: args.clusters,
            clusterer: defaults.with_seed(args.seed.unwrap_or(defaults.seed)),
            router,
        })
    }
}

/// Everything a map collaborator needs after a dispatch run.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct DispatchOutput {
    pub(crate) report: DispatchReport,
    #[serde(flatten)]
    pub(crate) fleet: FleetSnapshot,
    pub(crate) geofences: Vec<Geofence>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) clusters: Option<Vec<Vec<Job>>>,
}

pub(crate) fn run_dispatch(args: DispatchArgs, writer: &mut dyn Write) -> Result<(), CliError> {
    let config = args.into_config()?;
    config.validate_sources()?;
    let output = execute_dispatch(&config)?;
    write_json(writer, &output)
}

pub(crate) fn execute_dispatch(config: &DispatchConfig) -> Result<DispatchOutput, CliError> {
    let network = Arc::new(config.network.load()?);
    let geofences = match &config.geofences {
        Some(path) => load_geofence_index(path)?,
        None => GeofenceIndex::default(),
    };
    let registrations = load_workers(&config.workers).map_err(|source| CliError::Seed {
        field: ARG_WORKERS,
        path: config.workers.clone(),
        source,
    })?;

    let state = Arc::new(DispatchState::new());
    state.register_workers(registrations)?;
    state.submit_jobs(load_job_requests(&config.jobs)?)?;

    let engine = DispatchEngine::new(
        DijkstraRouter::with_config(network, config.router),
        Arc::new(geofences),
        Arc::clone(&state),
    );
    let report = engine.assign_pending();
    let clusters = config
        .clusters
        .map(|k| engine.cluster_pending(&Clusterer::with_config(config.clusterer), k))
        .transpose()?;
    if let Some(groups) = &clusters {
        info!("grouped pending jobs into {} clusters", groups.len());
    }
    Ok(DispatchOutput {
        report,
        fleet: engine.snapshot(),
        geofences: engine.geofences().geofences().to_vec(),
        clusters,
    })
}
