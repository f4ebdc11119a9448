//! `cluster` command: spatial groups of jobs for batch review.

use std::io::Write;

use camino::{Utf8Path, Utf8PathBuf};
use clap::Parser;
use courier_core::{Clusterer, ClustererConfig, DispatchState, Job, JobRequest};
use courier_data::load_jobs;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};

use crate::{
    ARG_CLUSTERS, ARG_JOBS, ARG_SEED, CliError, ENV_CLUSTER_CLUSTERS, ENV_CLUSTER_JOBS,
    require_existing, write_json,
};

/// CLI arguments for the `cluster` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Group the jobs in a job document into k spatial clusters \
                 using seeded k-means over their coordinates. Fewer than two \
                 jobs always form a single cluster.",
    about = "Cluster jobs spatially"
)]
#[ortho_config(prefix = "COURIER")]
pub(crate) struct ClusterArgs {
    /// Path to a JSON job document.
    #[arg(long = ARG_JOBS, value_name = "path")]
    #[serde(default)]
    pub(crate) jobs: Option<Utf8PathBuf>,
    /// Number of clusters to form.
    #[arg(long = ARG_CLUSTERS, value_name = "k")]
    #[serde(default)]
    pub(crate) clusters: Option<usize>,
    /// Seed for centroid initialisation.
    #[arg(long = ARG_SEED, value_name = "seed")]
    #[serde(default)]
    pub(crate) seed: Option<u64>,
}

impl ClusterArgs {
    fn into_config(self) -> Result<ClusterConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        ClusterConfig::try_from(merged)
    }
}

/// Resolved `cluster` command configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ClusterConfig {
    pub(crate) jobs: Utf8PathBuf,
    pub(crate) clusters: usize,
    pub(crate) clusterer: ClustererConfig,
}

impl TryFrom<ClusterArgs> for ClusterConfig {
    type Error = CliError;

    fn try_from(args: ClusterArgs) -> Result<Self, Self::Error> {
        let jobs = args.jobs.ok_or(CliError::MissingArgument {
            field: ARG_JOBS,
            env: ENV_CLUSTER_JOBS,
        })?;
        let clusters = args.clusters.ok_or(CliError::MissingArgument {
            field: ARG_CLUSTERS,
            env: ENV_CLUSTER_CLUSTERS,
        })?;
        let defaults = ClustererConfig::default();
        let clusterer = defaults.with_seed(args.seed.unwrap_or(defaults.seed));
        Ok(Self {
            jobs,
            clusters,
            clusterer,
        })
    }
}

pub(crate) fn run_cluster(args: ClusterArgs, writer: &mut dyn Write) -> Result<(), CliError> {
    let config = args.into_config()?;
    require_existing(&config.jobs, ARG_JOBS)?;
    let clusters = execute_cluster(&config)?;
    write_json(writer, &clusters)
}

pub(crate) fn execute_cluster(config: &ClusterConfig) -> Result<Vec<Vec<Job>>, CliError> {
    let state = DispatchState::new();
    state.submit_jobs(load_job_requests(&config.jobs)?)?;
    let clusterer = Clusterer::with_config(config.clusterer);
    Ok(clusterer.cluster(&state.pending_jobs(), config.clusters)?)
}

pub(crate) fn load_job_requests(path: &Utf8Path) -> Result<Vec<JobRequest>, CliError> {
    load_jobs(path).map_err(|source| CliError::Seed {
        field: ARG_JOBS,
        path: path.to_path_buf(),
        source,
    })
}
