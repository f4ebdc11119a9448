//! Core dispatch domain for the Courier engine.
//!
//! The crate models a drivable road network, computes shortest-path routes
//! with arrival estimates, checks positions against exclusion geofences,
//! groups pending jobs spatially, and assigns jobs to workers.
//!
//! Boundaries:
//! - No file or network I/O; map sources plug in through [`NetworkSource`].
//! - [`RoadNetwork`] and [`GeofenceIndex`] are immutable once built and may be
//!   shared freely across threads.
//! - Mutable fleet state lives in [`DispatchState`]; every assignment runs as
//!   a single locked transaction.
//!
//! Coordinates are WGS84 with `x = longitude` and `y = latitude`.

#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod cluster;
pub mod dispatch;
pub mod fleet;
pub mod geodesy;
pub mod geofence;
pub mod network;
pub mod routing;
pub mod state;
#[cfg(any(test, feature = "test-support"))]
#[cfg_attr(docsrs, doc(cfg(feature = "test-support")))]
pub mod test_support;

pub use cluster::{ClusterError, Clusterer, ClustererConfig};
pub use dispatch::{
    AssignmentSummary, DispatchEngine, DispatchReport, JobDispatch, SkipReason, SkippedJob,
};
pub use fleet::{Assignment, Job, JobRequest, Worker, WorkerRegistration};
pub use geodesy::{InvalidLocation, haversine_km, haversine_m, lat_lon};
pub use geofence::{Geofence, GeofenceCheck, GeofenceIndex, InvalidGeometryError};
pub use network::{
    Edge, NetworkBuildError, NetworkLoadError, NetworkSource, Node, RoadNetwork,
    RoadNetworkBuilder, SourceError,
};
pub use routing::{DijkstraRouter, RoutePlan, Router, RouterConfig, UnroutableError};
pub use state::{DispatchError, DispatchState, FleetSnapshot};
