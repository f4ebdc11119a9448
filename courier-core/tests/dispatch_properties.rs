//! Property tests for dispatch, geofencing, routing and clustering invariants.

use std::collections::BTreeSet;
use std::sync::Arc;

use geo::Coord;
use proptest::prelude::*;

use courier_core::routing::eta_minutes;
use courier_core::test_support::{makati_grid, no_go_zone_makati};
use courier_core::{
    Clusterer, DijkstraRouter, DispatchEngine, DispatchState, GeofenceIndex, JobRequest, Router,
    WorkerRegistration, haversine_m, lat_lon,
};

fn makati_point() -> impl Strategy<Value = Coord<f64>> {
    (14.550_f64..14.562, 121.018_f64..121.032).prop_map(|(lat, lon)| lat_lon(lat, lon))
}

fn registrations() -> impl Strategy<Value = Vec<WorkerRegistration>> {
    prop::collection::vec((makati_point(), 0_u32..4), 0..5).prop_map(|workers| {
        workers
            .into_iter()
            .enumerate()
            .map(|(index, (location, load))| {
                WorkerRegistration::new(format!("worker-{index}"), location)
                    .with_initial_load(load)
            })
            .collect()
    })
}

proptest! {
    #[test]
    fn assignments_reference_existing_workers_and_raise_loads(
        workers in registrations(),
        jobs in prop::collection::vec(makati_point(), 0..8),
    ) {
        let state = Arc::new(DispatchState::new());
        let registered = state.register_workers(workers).expect("generated workers are valid");
        state
            .submit_jobs(jobs.into_iter().map(JobRequest::new))
            .expect("generated jobs are valid");
        let engine = DispatchEngine::new(
            DijkstraRouter::new(makati_grid()),
            Arc::new(GeofenceIndex::new(vec![no_go_zone_makati()])),
            Arc::clone(&state),
        );

        let report = engine.assign_pending();
        let snapshot = state.snapshot();
        let worker_ids: BTreeSet<u64> = snapshot.workers.iter().map(|w| w.id).collect();

        for job in &snapshot.jobs {
            if let Some(worker_id) = job.assigned_worker() {
                prop_assert!(worker_ids.contains(&worker_id));
            }
        }
        for before in &registered {
            let after = snapshot
                .workers
                .iter()
                .find(|w| w.id == before.id)
                .expect("workers are never removed");
            let assigned = snapshot
                .jobs
                .iter()
                .filter(|job| job.assigned_worker() == Some(before.id))
                .count();
            prop_assert_eq!(
                u64::from(after.current_load),
                u64::from(before.current_load) + assigned as u64
            );
        }
        prop_assert_eq!(
            report.assigned.len() + report.skipped.len(),
            snapshot.jobs.len()
        );
    }

    #[test]
    fn geofence_checks_are_idempotent(point in makati_point()) {
        let index = GeofenceIndex::new(vec![no_go_zone_makati()]);
        let first = index.check(point).map(str::to_owned);
        for _ in 0..3 {
            prop_assert_eq!(index.check(point).map(str::to_owned), first.clone());
        }
        prop_assert_eq!(index.check_report(point).inside_geofence, first.is_some());
    }

    #[test]
    fn route_distance_matches_waypoints_and_eta(from in makati_point(), to in makati_point()) {
        let router = DijkstraRouter::new(makati_grid());
        let plan = router.route(from, to);
        prop_assert!(plan.is_routable());
        prop_assert!((plan.eta_minutes - eta_minutes(plan.distance_m)).abs() < 1e-9);
        let start = router.network().nearest_node(from).map(|node| node.location);
        let end = router.network().nearest_node(to).map(|node| node.location);
        prop_assert_eq!(plan.waypoints.first().copied(), start);
        prop_assert_eq!(plan.waypoints.last().copied(), end);
        let walked: f64 = plan
            .waypoints
            .windows(2)
            .filter_map(|pair| match pair {
                [a, b] => Some(haversine_m(*a, *b)),
                _ => None,
            })
            .sum();
        prop_assert!((walked - plan.distance_m).abs() <= plan.distance_m * 0.01 + 1e-6);
    }

    #[test]
    fn clustering_partitions_every_job(
        points in prop::collection::vec(makati_point(), 0..12),
        k in 1_usize..6,
    ) {
        let state = DispatchState::new();
        let jobs = state
            .submit_jobs(points.into_iter().map(JobRequest::new))
            .expect("generated jobs are valid");
        let clusters = Clusterer::new().cluster(&jobs, k).expect("k is positive");

        let expected_len = if jobs.len() < 2 { 1 } else { k };
        prop_assert_eq!(clusters.len(), expected_len);
        let mut seen: Vec<u64> = clusters.iter().flatten().map(|job| job.id).collect();
        seen.sort_unstable();
        let ids: Vec<u64> = jobs.iter().map(|job| job.id).collect();
        prop_assert_eq!(seen, ids);
        prop_assert_eq!(Clusterer::new().cluster(&jobs, k).expect("k is positive"), clusters);
    }
}
