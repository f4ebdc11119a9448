//! Road network selection shared by the `route` and `dispatch` commands.

use camino::Utf8PathBuf;
use courier_core::RoadNetwork;
use courier_data::{BoundingBox, JsonNetworkSource, OsmNetworkSource, load_osm_network};

use crate::{
    ARG_BBOX, ARG_FALLBACK_OSM_PBF, ARG_NETWORK, ARG_OSM_PBF, CliError, require_existing,
};

/// Road network flags as they arrive from configuration.
#[derive(Debug, Clone, Default)]
pub(crate) struct NetworkInputs {
    pub(crate) network: Option<Utf8PathBuf>,
    pub(crate) osm_pbf: Option<Utf8PathBuf>,
    pub(crate) fallback_osm_pbf: Option<Utf8PathBuf>,
    pub(crate) bbox: Option<String>,
}

/// Where the road network comes from.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum NetworkConfig {
    /// A JSON network document.
    Document(Utf8PathBuf),
    /// An OSM extract, optionally backed by a clipped fallback extract.
    Extract {
        primary: Utf8PathBuf,
        fallback: Option<(Utf8PathBuf, BoundingBox)>,
    },
}

impl NetworkConfig {
    /// Resolve the merged flags; `env` names the variable for `--network`.
    pub(crate) fn resolve(inputs: NetworkInputs, env: &'static str) -> Result<Self, CliError> {
        let NetworkInputs {
            network,
            osm_pbf,
            fallback_osm_pbf,
            bbox,
        } = inputs;
        match (network, osm_pbf) {
            (Some(_), Some(_)) => Err(CliError::ConflictingArguments {
                first: ARG_NETWORK,
                second: ARG_OSM_PBF,
            }),
            (Some(document), None) => {
                if bbox.is_some() {
                    return Err(CliError::ConflictingArguments {
                        first: ARG_NETWORK,
                        second: ARG_BBOX,
                    });
                }
                if fallback_osm_pbf.is_some() {
                    return Err(CliError::ConflictingArguments {
                        first: ARG_NETWORK,
                        second: ARG_FALLBACK_OSM_PBF,
                    });
                }
                Ok(Self::Document(document))
            }
            (None, Some(primary)) => {
                let fallback = match (bbox, fallback_osm_pbf) {
                    (None, None) => None,
                    (None, Some(_)) => return Err(CliError::FallbackWithoutBounds),
                    (Some(raw), extract) => {
                        let bounds = raw.parse::<BoundingBox>().map_err(|source| {
                            CliError::InvalidBoundingBox {
                                value: raw.clone(),
                                source,
                            }
                        })?;
                        Some((extract.unwrap_or_else(|| primary.clone()), bounds))
                    }
                };
                Ok(Self::Extract { primary, fallback })
            }
            (None, None) => Err(CliError::MissingArgument {
                field: ARG_NETWORK,
                env,
            }),
        }
    }

    /// Check the files the load depends on.
    ///
    /// With a fallback configured the primary extract may be absent; the
    /// fallback must exist.
    pub(crate) fn validate_sources(&self) -> Result<(), CliError> {
        match self {
            Self::Document(path) => require_existing(path, ARG_NETWORK),
            Self::Extract {
                primary,
                fallback: None,
            } => require_existing(primary, ARG_OSM_PBF),
            Self::Extract {
                fallback: Some((extract, _)),
                ..
            } => require_existing(extract, ARG_FALLBACK_OSM_PBF),
        }
    }

    pub(crate) fn load(&self) -> Result<RoadNetwork, CliError> {
        match self {
            Self::Document(path) => Ok(JsonNetworkSource::new(path.clone()).load_network()?),
            Self::Extract {
                primary,
                fallback: None,
            } => Ok(load_osm_network(primary, None)?),
            Self::Extract {
                primary,
                fallback: Some((extract, bounds)),
            } => Ok(RoadNetwork::load_with_fallback(
                &OsmNetworkSource::new(primary.clone()),
                &OsmNetworkSource::new(extract.clone()).with_bounds(*bounds),
            )?),
        }
    }
}
