//! Shortest-path routing and arrival estimates.
//!
//! The [`Router`] trait is the seam the dispatch engine depends on.
//! [`DijkstraRouter`] is the production implementation over a shared
//! [`RoadNetwork`](crate::RoadNetwork).

mod dijkstra;
mod error;

use geo::Coord;
use log::debug;

pub use dijkstra::{DEFAULT_MAX_SETTLED_NODES, DijkstraRouter, RouterConfig};
pub use error::UnroutableError;

/// Assumed average travel speed: 30 km/h expressed in metres per minute.
pub const METERS_PER_MINUTE: f64 = 500.0;

/// Convert a distance into minutes of travel, rounded to one decimal place.
///
/// # Examples
/// ```
/// use courier_core::routing::eta_minutes;
///
/// assert_eq!(eta_minutes(800.0), 1.6);
/// assert_eq!(eta_minutes(0.0), 0.0);
/// ```
#[must_use]
pub fn eta_minutes(distance_m: f64) -> f64 {
    (distance_m / METERS_PER_MINUTE * 10.0).round() / 10.0
}

/// An ordered path through the road network with its length and ETA.
///
/// An unroutable request is represented by an empty waypoint list with zero
/// distance and zero ETA.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RoutePlan {
    /// Node positions from origin to destination.
    pub waypoints: Vec<Coord<f64>>,
    /// Total length of the traversed edges in metres.
    pub distance_m: f64,
    /// Estimated travel time in minutes.
    pub eta_minutes: f64,
}

impl RoutePlan {
    /// Build a plan from waypoints and their cumulative edge length.
    #[must_use]
    pub fn new(waypoints: Vec<Coord<f64>>, distance_m: f64) -> Self {
        Self {
            waypoints,
            distance_m,
            eta_minutes: eta_minutes(distance_m),
        }
    }

    /// The empty plan returned when no route exists.
    #[must_use]
    pub const fn unroutable() -> Self {
        Self {
            waypoints: Vec::new(),
            distance_m: 0.0,
            eta_minutes: 0.0,
        }
    }

    /// Whether the plan contains a path.
    #[must_use]
    pub fn is_routable(&self) -> bool {
        !self.waypoints.is_empty()
    }
}

/// Computes routes between two coordinates.
///
/// Implementations must be free of side effects so that routes can be computed
/// concurrently and while the dispatch state lock is held.
pub trait Router: Send + Sync {
    /// Compute a route, reporting why none exists.
    ///
    /// # Errors
    /// Returns [`UnroutableError`] when either point cannot be mapped onto the
    /// network, no path connects them, or the search budget runs out.
    fn try_route(
        &self,
        origin: Coord<f64>,
        destination: Coord<f64>,
    ) -> Result<RoutePlan, UnroutableError>;

    /// Compute a route, collapsing failures into [`RoutePlan::unroutable`].
    fn route(&self, origin: Coord<f64>, destination: Coord<f64>) -> RoutePlan {
        self.try_route(origin, destination).unwrap_or_else(|err| {
            debug!("route from {origin:?} to {destination:?} unavailable: {err}");
            RoutePlan::unroutable()
        })
    }
}

impl<R: Router + ?Sized> Router for std::sync::Arc<R> {
    fn try_route(
        &self,
        origin: Coord<f64>,
        destination: Coord<f64>,
    ) -> Result<RoutePlan, UnroutableError> {
        (**self).try_route(origin, destination)
    }
}
