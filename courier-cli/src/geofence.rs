//! `geofence` command: exclusion-zone membership for a single point.

use std::io::Write;

use camino::{Utf8Path, Utf8PathBuf};
use clap::Parser;
use courier_core::{GeofenceCheck, GeofenceIndex};
use courier_data::load_geofences;
use geo::Coord;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};

use crate::{
    ARG_AT, ARG_GEOFENCES, CliError, ENV_GEOFENCE_AT, ENV_GEOFENCE_GEOFENCES, parse_lat_lon,
    require_existing, write_json,
};

/// CLI arguments for the `geofence` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Check a point against the exclusion zones in a geofence \
                 document. Points on a polygon boundary are outside.",
    about = "Check a point against exclusion zones"
)]
#[ortho_config(prefix = "COURIER")]
pub(crate) struct GeofenceArgs {
    /// Path to a JSON geofence document.
    #[arg(long = ARG_GEOFENCES, value_name = "path")]
    #[serde(default)]
    pub(crate) geofences: Option<Utf8PathBuf>,
    /// Point to check as `lat,lon`.
    #[arg(long = ARG_AT, value_name = "lat,lon", allow_hyphen_values = true)]
    #[serde(default)]
    pub(crate) at: Option<String>,
}

impl GeofenceArgs {
    fn into_config(self) -> Result<GeofenceConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        GeofenceConfig::try_from(merged)
    }
}

/// Resolved `geofence` command configuration.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct GeofenceConfig {
    pub(crate) geofences: Utf8PathBuf,
    pub(crate) at: Coord<f64>,
}

impl TryFrom<GeofenceArgs> for GeofenceConfig {
    type Error = CliError;

    fn try_from(args: GeofenceArgs) -> Result<Self, Self::Error> {
        let geofences = args.geofences.ok_or(CliError::MissingArgument {
            field: ARG_GEOFENCES,
            env: ENV_GEOFENCE_GEOFENCES,
        })?;
        let at = args.at.ok_or(CliError::MissingArgument {
            field: ARG_AT,
            env: ENV_GEOFENCE_AT,
        })?;
        Ok(Self {
            geofences,
            at: parse_lat_lon(ARG_AT, &at)?,
        })
    }
}

pub(crate) fn run_geofence(args: GeofenceArgs, writer: &mut dyn Write) -> Result<(), CliError> {
    let config = args.into_config()?;
    require_existing(&config.geofences, ARG_GEOFENCES)?;
    let check = execute_geofence(&config)?;
    write_json(writer, &check)
}

pub(crate) fn execute_geofence(config: &GeofenceConfig) -> Result<GeofenceCheck, CliError> {
    let index = load_geofence_index(&config.geofences)?;
    Ok(index.check_report(config.at))
}

pub(crate) fn load_geofence_index(path: &Utf8Path) -> Result<GeofenceIndex, CliError> {
    load_geofences(path).map_err(|source| CliError::Seed {
        field: ARG_GEOFENCES,
        path: path.to_path_buf(),
        source,
    })
}
