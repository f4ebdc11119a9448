//! Load-aware nearest-worker assignment.
//!
//! [`DispatchEngine`] walks pending jobs in creation order. Each job is
//! handled as one transaction under the [`DispatchState`] lock: the job is
//! re-checked, the geofence gate applied, the worker with the lowest
//! `haversine_km + current_load` score chosen, its load incremented, the route
//! computed and the assignment committed. Assignment is greedy and never
//! revisited. Worker load is never decremented; completing a delivery is
//! outside the engine's lifecycle.

use std::sync::Arc;

use geo::Coord;
use log::{debug, info, warn};

use crate::cluster::{ClusterError, Clusterer};
use crate::fleet::{Assignment, Job, Worker};
use crate::geodesy::haversine_km;
use crate::geofence::GeofenceIndex;
use crate::routing::{RoutePlan, Router};
use crate::state::{DispatchError, DispatchState, Fleet, FleetSnapshot};

/// Why a pending job was left unassigned.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", rename_all = "snake_case"))]
pub enum SkipReason {
    /// The job lies inside an exclusion zone.
    InsideGeofence {
        /// Name of the containing geofence.
        geofence: String,
    },
    /// The fleet has no workers.
    NoWorkersAvailable,
}

/// A job left unassigned by a dispatch run.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct SkippedJob {
    /// Job identifier.
    pub job_id: u64,
    /// Why it was skipped.
    pub reason: SkipReason,
}

/// A committed assignment as reported to callers.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct AssignmentSummary {
    /// Job identifier.
    pub job_id: u64,
    /// Assigned worker.
    pub worker_id: u64,
    /// Assigned worker's display name.
    pub worker_name: String,
    /// Estimated minutes from the worker to the job; zero when unroutable.
    pub eta_minutes: f64,
    /// Whether a road route was found.
    pub routable: bool,
}

/// Outcome of dispatching a single job.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(tag = "outcome", rename_all = "snake_case"))]
pub enum JobDispatch {
    /// The job was assigned by this call.
    Assigned(AssignmentSummary),
    /// The job already had a worker; nothing changed.
    AlreadyAssigned {
        /// Job identifier.
        job_id: u64,
    },
    /// The job stays pending.
    Skipped(SkippedJob),
}

/// Result of [`DispatchEngine::assign_pending`].
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct DispatchReport {
    /// Jobs assigned during the run, in creation order.
    pub assigned: Vec<AssignmentSummary>,
    /// Jobs left pending, in creation order.
    pub skipped: Vec<SkippedJob>,
}

/// Assigns pending jobs to workers.
///
/// # Examples
/// ```
/// use std::sync::Arc;
/// use courier_core::{
///     DijkstraRouter, DispatchEngine, DispatchState, GeofenceIndex, JobRequest, RoadNetwork,
///     WorkerRegistration, lat_lon,
/// };
///
/// let state = Arc::new(DispatchState::new());
/// state.register_worker(WorkerRegistration::new("Charlie", lat_lon(14.5600, 121.0200)))?;
/// state.submit_job(JobRequest::new(lat_lon(14.5555, 121.0240)))?;
///
/// let network = Arc::new(RoadNetwork::builder().build()?);
/// let engine = DispatchEngine::new(
///     DijkstraRouter::new(network),
///     Arc::new(GeofenceIndex::default()),
///     Arc::clone(&state),
/// );
/// let report = engine.assign_pending();
/// assert_eq!(report.assigned.len(), 1);
/// assert!(!report.assigned[0].routable);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug)]
pub struct DispatchEngine<R> {
    router: R,
    geofences: Arc<GeofenceIndex>,
    state: Arc<DispatchState>,
}

impl<R: Router> DispatchEngine<R> {
    /// Wire the engine to its collaborators.
    #[must_use]
    pub const fn new(router: R, geofences: Arc<GeofenceIndex>, state: Arc<DispatchState>) -> Self {
        Self {
            router,
            geofences,
            state,
        }
    }

    /// The state this engine mutates.
    #[must_use]
    pub fn state(&self) -> &DispatchState {
        &self.state
    }

    /// The exclusion zones gating assignment.
    #[must_use]
    pub fn geofences(&self) -> &GeofenceIndex {
        &self.geofences
    }

    /// The router used for ETAs.
    #[must_use]
    pub const fn router(&self) -> &R {
        &self.router
    }

    /// Assign every pending job, in creation order.
    ///
    /// Jobs inside a geofence, or arriving when no workers exist, stay pending
    /// and are listed in [`DispatchReport::skipped`].
    #[must_use]
    pub fn assign_pending(&self) -> DispatchReport {
        let pending: Vec<u64> = self
            .state
            .pending_jobs()
            .iter()
            .map(|job| job.id)
            .collect();
        let mut report = DispatchReport::default();
        for job_id in pending {
            match self.assign(job_id) {
                Ok(JobDispatch::Assigned(summary)) => report.assigned.push(summary),
                Ok(JobDispatch::Skipped(skipped)) => report.skipped.push(skipped),
                Ok(JobDispatch::AlreadyAssigned { .. }) => {
                    debug!("job {job_id} was assigned concurrently");
                }
                Err(err) => debug!("job {job_id} disappeared during dispatch: {err}"),
            }
        }
        info!(
            "dispatch run assigned {} jobs and skipped {}",
            report.assigned.len(),
            report.skipped.len()
        );
        report
    }

    /// Assign one job.
    ///
    /// An already-assigned job is left untouched and reported as
    /// [`JobDispatch::AlreadyAssigned`].
    ///
    /// # Errors
    /// Returns [`DispatchError::UnknownJob`] when no job has `job_id`.
    pub fn assign(&self, job_id: u64) -> Result<JobDispatch, DispatchError> {
        let mut fleet = self.state.lock();
        self.assign_locked(&mut fleet, job_id)
    }

    /// Partition the currently pending jobs into `k` spatial groups.
    ///
    /// # Errors
    /// Propagates [`ClusterError`] from the clusterer.
    pub fn cluster_pending(
        &self,
        clusterer: &Clusterer,
        k: usize,
    ) -> Result<Vec<Vec<Job>>, ClusterError> {
        clusterer.cluster(&self.state.pending_jobs(), k)
    }

    /// Consistent copy of workers and jobs.
    #[must_use]
    pub fn snapshot(&self) -> FleetSnapshot {
        self.state.snapshot()
    }

    fn assign_locked(&self, fleet: &mut Fleet, job_id: u64) -> Result<JobDispatch, DispatchError> {
        let Fleet { workers, jobs, .. } = fleet;
        let job = jobs
            .iter_mut()
            .find(|job| job.id == job_id)
            .ok_or(DispatchError::UnknownJob { id: job_id })?;
        if !job.is_pending() {
            return Ok(JobDispatch::AlreadyAssigned { job_id });
        }

        if let Some(geofence) = self.geofences.check(job.location) {
            info!("job {job_id} inside geofence {geofence}, skipping");
            return Ok(JobDispatch::Skipped(SkippedJob {
                job_id,
                reason: SkipReason::InsideGeofence {
                    geofence: geofence.to_owned(),
                },
            }));
        }

        let Some(worker) = best_worker(workers, job.location) else {
            info!("job {job_id} has no available worker, skipping");
            return Ok(JobDispatch::Skipped(SkippedJob {
                job_id,
                reason: SkipReason::NoWorkersAvailable,
            }));
        };
        worker.current_load = worker.current_load.saturating_add(1);

        let route = match self.router.try_route(worker.location, job.location) {
            Ok(route) => route,
            Err(err) => {
                warn!(
                    "job {job_id} assigned to worker {} without a route ({err}); \
                     flag for operator review",
                    worker.name
                );
                RoutePlan::unroutable()
            }
        };
        let summary = AssignmentSummary {
            job_id,
            worker_id: worker.id,
            worker_name: worker.name.clone(),
            eta_minutes: route.eta_minutes,
            routable: route.is_routable(),
        };
        job.assign(Assignment {
            worker_id: worker.id,
            route,
        });
        info!("assigned job {job_id} to worker {}", worker.name);
        Ok(JobDispatch::Assigned(summary))
    }
}

/// Worker minimising distance in kilometres plus current load. Ties go to
/// the lowest worker id.
fn best_worker(workers: &mut [Worker], location: Coord<f64>) -> Option<&mut Worker> {
    workers
        .iter_mut()
        .map(|worker| {
            let score = haversine_km(worker.location, location) + f64::from(worker.current_load);
            (score, worker)
        })
        .min_by(|(a_score, a), (b_score, b)| a_score.total_cmp(b_score).then(a.id.cmp(&b.id)))
        .map(|(_, worker)| worker)
}
