//! Shared, lock-protected fleet state.
//!
//! [`DispatchState`] owns every [`Worker`] and [`Job`]. All mutations go
//! through a single `parking_lot::Mutex`; readers receive cloned snapshots so
//! they never observe a half-applied assignment.

use chrono::Utc;
use log::info;
use parking_lot::{Mutex, MutexGuard};
use thiserror::Error;

use crate::fleet::{DEFAULT_IMEI, Job, JobRequest, Worker, WorkerRegistration};
use crate::geodesy::{InvalidLocation, validate_location};

/// Failure raised by intake or dispatch operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DispatchError {
    /// A job request carried an unusable position.
    #[error("job location is invalid")]
    InvalidJobLocation {
        /// Coordinate failure.
        #[from]
        source: InvalidLocation,
    },
    /// A worker registration carried an unusable position.
    #[error("location for worker {name} is invalid")]
    InvalidWorkerLocation {
        /// Name from the registration.
        name: String,
        /// Coordinate failure.
        source: InvalidLocation,
    },
    /// A worker registration had a blank name.
    #[error("worker name must not be empty")]
    EmptyWorkerName,
    /// No job has the requested identifier.
    #[error("job {id} does not exist")]
    UnknownJob {
        /// Requested identifier.
        id: u64,
    },
}

/// Point-in-time copy of the fleet for read-only collaborators.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct FleetSnapshot {
    /// Workers in registration order.
    pub workers: Vec<Worker>,
    /// Jobs in creation order.
    pub jobs: Vec<Job>,
}

#[derive(Debug, Default)]
pub(crate) struct Fleet {
    pub(crate) workers: Vec<Worker>,
    pub(crate) jobs: Vec<Job>,
    last_worker_id: u64,
    last_job_id: u64,
}

impl Fleet {
    fn insert_worker(&mut self, registration: WorkerRegistration) -> Worker {
        self.last_worker_id += 1;
        let worker = Worker {
            id: self.last_worker_id,
            imei: registration
                .imei
                .unwrap_or_else(|| DEFAULT_IMEI.to_owned()),
            name: registration.name,
            location: registration.location,
            current_load: registration.initial_load,
        };
        info!(
            "registered worker {} ({}) with load {}",
            worker.id, worker.name, worker.current_load
        );
        self.workers.push(worker.clone());
        worker
    }

    fn insert_job(&mut self, request: JobRequest) -> Job {
        self.last_job_id += 1;
        let job = Job::new(self.last_job_id, request, Utc::now());
        info!("accepted job {} at {}", job.id, job.address);
        self.jobs.push(job.clone());
        job
    }
}

/// Owner of all mutable dispatch data.
///
/// Share it between the engine and intake handlers with an `Arc`.
#[derive(Debug, Default)]
pub struct DispatchState {
    fleet: Mutex<Fleet>,
}

impl DispatchState {
    /// Create an empty state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one worker, assigning the next sequential identifier.
    ///
    /// # Errors
    /// Returns [`DispatchError`] when the name is blank or the location is
    /// invalid; the state is left untouched.
    pub fn register_worker(&self, registration: WorkerRegistration) -> Result<Worker, DispatchError> {
        let registration = validate_registration(registration)?;
        Ok(self.fleet.lock().insert_worker(registration))
    }

    /// Add several workers at once.
    ///
    /// Every registration is validated before any is stored, so either all
    /// are added or none are.
    ///
    /// # Errors
    /// Returns the first validation failure.
    pub fn register_workers<I>(&self, registrations: I) -> Result<Vec<Worker>, DispatchError>
    where
        I: IntoIterator<Item = WorkerRegistration>,
    {
        let validated = registrations
            .into_iter()
            .map(validate_registration)
            .collect::<Result<Vec<_>, _>>()?;
        let mut fleet = self.fleet.lock();
        Ok(validated
            .into_iter()
            .map(|registration| fleet.insert_worker(registration))
            .collect())
    }

    /// Accept one job as unassigned.
    ///
    /// # Errors
    /// Returns [`DispatchError::InvalidJobLocation`] for non-finite or
    /// out-of-range coordinates; the state is left untouched.
    pub fn submit_job(&self, request: JobRequest) -> Result<Job, DispatchError> {
        validate_location(request.location)?;
        Ok(self.fleet.lock().insert_job(request))
    }

    /// Accept several jobs at once, all or nothing.
    ///
    /// # Errors
    /// Returns the first invalid location.
    pub fn submit_jobs<I>(&self, requests: I) -> Result<Vec<Job>, DispatchError>
    where
        I: IntoIterator<Item = JobRequest>,
    {
        let validated = requests
            .into_iter()
            .map(|request| validate_location(request.location).map(|_| request))
            .collect::<Result<Vec<_>, _>>()?;
        let mut fleet = self.fleet.lock();
        Ok(validated
            .into_iter()
            .map(|request| fleet.insert_job(request))
            .collect())
    }

    /// Copy of every worker.
    #[must_use]
    pub fn workers(&self) -> Vec<Worker> {
        self.fleet.lock().workers.clone()
    }

    /// Copy of every job.
    #[must_use]
    pub fn jobs(&self) -> Vec<Job> {
        self.fleet.lock().jobs.clone()
    }

    /// Copy of the jobs still awaiting a worker, in creation order.
    #[must_use]
    pub fn pending_jobs(&self) -> Vec<Job> {
        self.fleet
            .lock()
            .jobs
            .iter()
            .filter(|job| job.is_pending())
            .cloned()
            .collect()
    }

    /// Copy of one worker.
    #[must_use]
    pub fn worker(&self, id: u64) -> Option<Worker> {
        self.fleet.lock().workers.iter().find(|w| w.id == id).cloned()
    }

    /// Copy of one job.
    #[must_use]
    pub fn job(&self, id: u64) -> Option<Job> {
        self.fleet.lock().jobs.iter().find(|j| j.id == id).cloned()
    }

    /// Consistent copy of workers and jobs taken under one lock.
    #[must_use]
    pub fn snapshot(&self) -> FleetSnapshot {
        let fleet = self.fleet.lock();
        FleetSnapshot {
            workers: fleet.workers.clone(),
            jobs: fleet.jobs.clone(),
        }
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, Fleet> {
        self.fleet.lock()
    }
}

fn validate_registration(
    registration: WorkerRegistration,
) -> Result<WorkerRegistration, DispatchError> {
    if registration.name.trim().is_empty() {
        return Err(DispatchError::EmptyWorkerName);
    }
    match validate_location(registration.location) {
        Ok(_) => Ok(registration),
        Err(source) => Err(DispatchError::InvalidWorkerLocation {
            name: registration.name,
            source,
        }),
    }
}
