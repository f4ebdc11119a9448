//! JSON seed and intake documents.
//!
//! Geofences:
//! `[{"id": 1, "name": "No-Go Zone Makati", "polygon": [[14.555, 121.023], ...]}]`
//! with vertices given as `[lat, lon]` pairs.
//!
//! Workers:
//! `[{"name": "Alice", "lat": 14.5547, "lon": 121.0244, "imei": "...", "current_load": 1}]`
//! where `imei` and `current_load` are optional.
//!
//! Jobs:
//! `[{"lat": 14.5555, "lon": 121.0240, "address": "..."}]` where `address` is
//! optional.

use camino::{Utf8Path, Utf8PathBuf};
use courier_core::{
    Geofence, GeofenceIndex, InvalidGeometryError, JobRequest, WorkerRegistration, lat_lon,
};
use log::info;
use serde::Deserialize;
use thiserror::Error;

use crate::fs::read_to_string;

/// Errors returned when loading a seed document.
#[derive(Debug, Error)]
pub enum SeedError {
    /// The file could not be read.
    #[error("failed to read seed document at {path}")]
    Read {
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
        /// File that was requested.
        path: Utf8PathBuf,
    },
    /// The document is not valid JSON of the expected shape.
    #[error("failed to parse seed document")]
    Parse(#[from] serde_json::Error),
    /// A geofence polygon was rejected.
    #[error("geofence document contains an invalid polygon")]
    Geometry(#[from] InvalidGeometryError),
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct GeofenceRecord {
    id: u64,
    name: String,
    polygon: Vec<[f64; 2]>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct WorkerRecord {
    #[serde(default)]
    imei: Option<String>,
    name: String,
    lat: f64,
    lon: f64,
    #[serde(default)]
    current_load: u32,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct JobRecord {
    lat: f64,
    lon: f64,
    #[serde(default)]
    address: Option<String>,
}

/// Parse a geofence document, preserving its order.
///
/// # Errors
/// Returns [`SeedError::Parse`] for malformed JSON and
/// [`SeedError::Geometry`] for invalid polygons.
///
/// # Examples
/// ```
/// use courier_core::lat_lon;
/// use courier_data::parse_geofences;
///
/// let index = parse_geofences(
///     r#"[{"id": 1, "name": "No-Go Zone Makati",
///          "polygon": [[14.555, 121.023], [14.556, 121.023],
///                      [14.556, 121.025], [14.555, 121.025]]}]"#,
/// )?;
/// assert_eq!(index.check(lat_lon(14.5555, 121.0240)), Some("No-Go Zone Makati"));
/// # Ok::<(), courier_data::SeedError>(())
/// ```
pub fn parse_geofences(contents: &str) -> Result<GeofenceIndex, SeedError> {
    let records: Vec<GeofenceRecord> = serde_json::from_str(contents)?;
    let geofences = records
        .into_iter()
        .map(|record| {
            let vertices = record
                .polygon
                .into_iter()
                .map(|[lat, lon]| lat_lon(lat, lon))
                .collect();
            Geofence::new(record.id, record.name, vertices)
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(GeofenceIndex::new(geofences))
}

/// Parse a worker document into registrations.
///
/// # Errors
/// Returns [`SeedError::Parse`] for malformed JSON.
pub fn parse_workers(contents: &str) -> Result<Vec<WorkerRegistration>, SeedError> {
    let records: Vec<WorkerRecord> = serde_json::from_str(contents)?;
    Ok(records
        .into_iter()
        .map(|record| {
            let registration = WorkerRegistration::new(record.name, lat_lon(record.lat, record.lon))
                .with_initial_load(record.current_load);
            match record.imei {
                Some(imei) => registration.with_imei(imei),
                None => registration,
            }
        })
        .collect())
}

/// Parse a job document into intake requests.
///
/// # Errors
/// Returns [`SeedError::Parse`] for malformed JSON.
pub fn parse_jobs(contents: &str) -> Result<Vec<JobRequest>, SeedError> {
    let records: Vec<JobRecord> = serde_json::from_str(contents)?;
    Ok(records
        .into_iter()
        .map(|record| {
            let request = JobRequest::new(lat_lon(record.lat, record.lon));
            match record.address {
                Some(address) => request.with_address(address),
                None => request,
            }
        })
        .collect())
}

fn read(path: &Utf8Path) -> Result<String, SeedError> {
    read_to_string(path).map_err(|source| SeedError::Read {
        source,
        path: path.to_path_buf(),
    })
}

/// Load a geofence document from disk.
///
/// # Errors
/// See [`parse_geofences`]; also [`SeedError::Read`] when the file is unreadable.
pub fn load_geofences(path: &Utf8Path) -> Result<GeofenceIndex, SeedError> {
    let index = parse_geofences(&read(path)?)?;
    info!("loaded {} geofences from {path}", index.len());
    Ok(index)
}

/// Load a worker document from disk.
///
/// # Errors
/// See [`parse_workers`]; also [`SeedError::Read`] when the file is unreadable.
pub fn load_workers(path: &Utf8Path) -> Result<Vec<WorkerRegistration>, SeedError> {
    let workers = parse_workers(&read(path)?)?;
    info!("loaded {} workers from {path}", workers.len());
    Ok(workers)
}

/// Load a job document from disk.
///
/// # Errors
/// See [`parse_jobs`]; also [`SeedError::Read`] when the file is unreadable.
pub fn load_jobs(path: &Utf8Path) -> Result<Vec<JobRequest>, SeedError> {
    let jobs = parse_jobs(&read(path)?)?;
    info!("loaded {} jobs from {path}", jobs.len());
    Ok(jobs)
}
