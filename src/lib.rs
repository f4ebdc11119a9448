//! Facade crate for the Courier dispatch engine.
//!
//! This crate re-exports the core dispatch types and, behind the `data`
//! feature, the map and seed-document loaders.

#![forbid(unsafe_code)]

pub use courier_core::{
    Assignment, AssignmentSummary, ClusterError, Clusterer, ClustererConfig, DijkstraRouter,
    DispatchEngine, DispatchError, DispatchReport, DispatchState, FleetSnapshot, Geofence,
    GeofenceCheck, GeofenceIndex, InvalidGeometryError, InvalidLocation, Job, JobDispatch,
    JobRequest, NetworkBuildError, NetworkLoadError, NetworkSource, RoadNetwork,
    RoadNetworkBuilder, RoutePlan, Router, RouterConfig, SkipReason, SkippedJob, SourceError,
    UnroutableError, Worker, WorkerRegistration, haversine_km, haversine_m, lat_lon,
};

#[cfg(feature = "data")]
pub use courier_data::{
    BoundingBox, JsonNetworkSource, OsmNetworkSource, load_geofences, load_jobs,
    load_osm_network, load_workers, parse_network,
};
