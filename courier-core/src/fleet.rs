//! Workers, jobs and the requests that create them.

use chrono::{DateTime, Utc};
use geo::Coord;

use crate::routing::RoutePlan;

/// Device identifier recorded when a registration omits one.
pub const DEFAULT_IMEI: &str = "000000000000000";

/// Address label recorded when a job request omits one.
pub const DEFAULT_ADDRESS: &str = "Unknown";

/// A mobile worker (driver) able to take jobs.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Worker {
    /// Sequential identifier starting at 1.
    pub id: u64,
    /// Device identifier.
    pub imei: String,
    /// Display name.
    pub name: String,
    /// Current position.
    pub location: Coord<f64>,
    /// Active assignments. Only ever increases.
    pub current_load: u32,
}

/// Request to add a worker to the fleet.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WorkerRegistration {
    /// Device identifier; [`DEFAULT_IMEI`] when absent.
    #[cfg_attr(feature = "serde", serde(default))]
    pub imei: Option<String>,
    /// Display name.
    pub name: String,
    /// Starting position.
    pub location: Coord<f64>,
    /// Load carried over from elsewhere, zero for new registrations.
    #[cfg_attr(feature = "serde", serde(default))]
    pub initial_load: u32,
}

impl WorkerRegistration {
    /// Register `name` at `location` with no load.
    #[must_use]
    pub fn new(name: impl Into<String>, location: Coord<f64>) -> Self {
        Self {
            imei: None,
            name: name.into(),
            location,
            initial_load: 0,
        }
    }

    /// Record the worker's device identifier.
    #[must_use]
    pub fn with_imei(mut self, imei: impl Into<String>) -> Self {
        self.imei = Some(imei.into());
        self
    }

    /// Start the worker with existing load, as seeded fleets do.
    #[must_use]
    pub const fn with_initial_load(mut self, load: u32) -> Self {
        self.initial_load = load;
        self
    }
}

/// Request to add a delivery job.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct JobRequest {
    /// Delivery position.
    pub location: Coord<f64>,
    /// Address label; [`DEFAULT_ADDRESS`] when absent.
    #[cfg_attr(feature = "serde", serde(default))]
    pub address: Option<String>,
}

impl JobRequest {
    /// Request a delivery at `location`.
    #[must_use]
    pub const fn new(location: Coord<f64>) -> Self {
        Self {
            location,
            address: None,
        }
    }

    /// Attach an address label.
    #[must_use]
    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }
}

/// The worker and route committed to a job.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Assignment {
    /// Assigned worker.
    pub worker_id: u64,
    /// Route from the worker's position to the job; empty when unroutable.
    pub route: RoutePlan,
}

/// A delivery job.
///
/// A job moves from unassigned to assigned exactly once and is never removed.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Job {
    /// Sequential identifier starting at 1.
    pub id: u64,
    /// Delivery position.
    pub location: Coord<f64>,
    /// Address label.
    pub address: String,
    /// When the job entered the system.
    pub requested_at: DateTime<Utc>,
    assignment: Option<Assignment>,
}

impl Job {
    pub(crate) fn new(id: u64, request: JobRequest, requested_at: DateTime<Utc>) -> Self {
        Self {
            id,
            location: request.location,
            address: request
                .address
                .unwrap_or_else(|| DEFAULT_ADDRESS.to_owned()),
            requested_at,
            assignment: None,
        }
    }

    /// Whether the job still awaits a worker.
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        self.assignment.is_none()
    }

    /// The committed assignment, if any.
    #[must_use]
    pub const fn assignment(&self) -> Option<&Assignment> {
        self.assignment.as_ref()
    }

    /// Identifier of the assigned worker, if any.
    #[must_use]
    pub fn assigned_worker(&self) -> Option<u64> {
        self.assignment.as_ref().map(|a| a.worker_id)
    }

    /// Estimated minutes to arrival once assigned.
    #[must_use]
    pub fn eta_minutes(&self) -> Option<f64> {
        self.assignment.as_ref().map(|a| a.route.eta_minutes)
    }

    /// Record the assignment. Returns `false` if the job was already assigned.
    pub(crate) fn assign(&mut self, assignment: Assignment) -> bool {
        if self.assignment.is_some() {
            return false;
        }
        self.assignment = Some(assignment);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geodesy::lat_lon;
    use rstest::rstest;

    #[rstest]
    fn job_defaults_address() {
        let job = Job::new(1, JobRequest::new(lat_lon(14.5, 121.0)), Utc::now());
        assert_eq!(job.address, DEFAULT_ADDRESS);
        assert!(job.is_pending());
        assert_eq!(job.assigned_worker(), None);
    }

    #[rstest]
    fn job_assigns_only_once() {
        let mut job = Job::new(
            1,
            JobRequest::new(lat_lon(14.5, 121.0)).with_address("Ayala Ave"),
            Utc::now(),
        );
        assert!(job.assign(Assignment {
            worker_id: 3,
            route: RoutePlan::unroutable(),
        }));
        assert!(!job.assign(Assignment {
            worker_id: 4,
            route: RoutePlan::unroutable(),
        }));
        assert_eq!(job.assigned_worker(), Some(3));
        assert_eq!(job.eta_minutes(), Some(0.0));
    }

    #[rstest]
    fn registration_builders_set_fields() {
        let registration = WorkerRegistration::new("Alice", lat_lon(14.5547, 121.0244))
            .with_imei("356938035643809")
            .with_initial_load(1);
        assert_eq!(registration.imei.as_deref(), Some("356938035643809"));
        assert_eq!(registration.initial_load, 1);
    }
}
