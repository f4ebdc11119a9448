//! Shared fixtures for unit, behaviour and property tests.
//!
//! The data mirrors the Makati service area the engine was first deployed in.

use std::sync::Arc;

use crate::fleet::WorkerRegistration;
use crate::geodesy::lat_lon;
use crate::geofence::Geofence;
use crate::network::RoadNetwork;

/// Build the "No-Go Zone Makati" exclusion rectangle.
///
/// # Panics
/// Never in practice; the polygon is a fixed valid rectangle.
#[must_use]
pub fn no_go_zone_makati() -> Geofence {
    match Geofence::new(
        1,
        "No-Go Zone Makati",
        vec![
            lat_lon(14.555, 121.023),
            lat_lon(14.556, 121.023),
            lat_lon(14.556, 121.025),
            lat_lon(14.555, 121.025),
        ],
    ) {
        Ok(fence) => fence,
        Err(err) => panic!("fixture geofence is valid: {err}"),
    }
}

/// The three seeded workers: Alice (load 1), Bob (load 2) and Charlie (load 0).
#[must_use]
pub fn seeded_workers() -> Vec<WorkerRegistration> {
    vec![
        WorkerRegistration::new("Alice", lat_lon(14.5547, 121.0244))
            .with_imei("356938035643809")
            .with_initial_load(1),
        WorkerRegistration::new("Bob", lat_lon(14.5550, 121.0300))
            .with_imei("356938035643810")
            .with_initial_load(2),
        WorkerRegistration::new("Charlie", lat_lon(14.5600, 121.0200))
            .with_imei("356938035643811"),
    ]
}

/// Small two-way street grid covering the seeded workers and sample jobs.
///
/// Node ids follow `row * 10 + column`; rows step 0.0025 degrees of latitude
/// from 14.5525 and columns step 0.0025 degrees of longitude from 121.0200.
///
/// # Panics
/// Never in practice; the grid is fixed and valid.
#[must_use]
pub fn makati_grid() -> Arc<RoadNetwork> {
    const ROWS: u32 = 4;
    const COLUMNS: u32 = 5;
    const STEP_DEG: f64 = 0.0025;
    // 0.0025 degrees is roughly 278 m of latitude and 269 m of longitude here.
    const NORTH_SOUTH_M: f64 = 278.0;
    const EAST_WEST_M: f64 = 269.0;

    let id = |row: u32, column: u32| u64::from(row * 10 + column);
    let mut builder = RoadNetwork::builder();
    for row in 0..ROWS {
        for column in 0..COLUMNS {
            let lat = 14.5525 + f64::from(row) * STEP_DEG;
            let lon = 121.0200 + f64::from(column) * STEP_DEG;
            builder.add_node(id(row, column), lat_lon(lat, lon));
        }
    }
    for row in 0..ROWS {
        for column in 0..COLUMNS {
            if column + 1 < COLUMNS {
                builder.add_road(id(row, column), id(row, column + 1), EAST_WEST_M);
            }
            if row + 1 < ROWS {
                builder.add_road(id(row, column), id(row + 1, column), NORTH_SOUTH_M);
            }
        }
    }
    match builder.build() {
        Ok(network) => Arc::new(network),
        Err(err) => panic!("fixture grid is valid: {err}"),
    }
}

/// Two nodes joined by a single 800 m one-way segment.
///
/// # Panics
/// Never in practice; the network is fixed and valid.
#[must_use]
pub fn single_segment() -> Arc<RoadNetwork> {
    let mut builder = RoadNetwork::builder();
    builder
        .add_node(1, lat_lon(14.5547, 121.0244))
        .add_node(2, lat_lon(14.5600, 121.0200))
        .add_edge(1, 2, 800.0);
    match builder.build() {
        Ok(network) => Arc::new(network),
        Err(err) => panic!("fixture segment is valid: {err}"),
    }
}
