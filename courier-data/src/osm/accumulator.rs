//! Internal accumulator for drivable-road extraction.
//!
//! Collects drivable ways and the node references they need, then turns the
//! resolved geometry into a [`RoadNetworkBuilder`].

use std::collections::{BTreeSet, HashMap, HashSet};

use courier_core::{RoadNetworkBuilder, haversine_m};
use geo::Coord;
use log::warn;
use osmpbf::Element;

use super::bounds::BoundingBox;
use super::tags::{Direction, drivable_direction};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(super) struct AccumulatorStats {
    pub(super) drivable_ways: u64,
    pub(super) ignored_ways: u64,
}

#[derive(Debug)]
struct RoadWay {
    id: i64,
    refs: Vec<u64>,
    direction: Direction,
}

#[derive(Debug, Default)]
pub(super) struct RoadAccumulator {
    stats: AccumulatorStats,
    ways: Vec<RoadWay>,
    nodes: HashMap<u64, Coord<f64>>,
    pending_nodes: HashSet<u64>,
}

impl RoadAccumulator {
    pub(super) fn process_element(&mut self, element: &Element<'_>) {
        let Element::Way(way) = element else {
            return;
        };
        let Some(direction) = drivable_direction(way.tags()) else {
            self.stats.ignored_ways += 1;
            return;
        };
        let refs: Vec<u64> = way.refs().filter_map(node_id).collect();
        if refs.len() < 2 {
            self.stats.ignored_ways += 1;
            return;
        }
        self.stats.drivable_ways += 1;
        self.pending_nodes.extend(refs.iter().copied());
        self.ways.push(RoadWay {
            id: way.id(),
            refs,
            direction,
        });
    }

    pub(super) fn combine(mut self, other: Self) -> Self {
        self.stats.drivable_ways += other.stats.drivable_ways;
        self.stats.ignored_ways += other.stats.ignored_ways;
        self.ways.extend(other.ways);
        self.pending_nodes.extend(other.pending_nodes);
        self
    }

    pub(super) fn has_pending_nodes(&self) -> bool {
        !self.pending_nodes.is_empty()
    }

    pub(super) fn pending_node_count(&self) -> usize {
        self.pending_nodes.len()
    }

    pub(super) const fn stats(&self) -> AccumulatorStats {
        self.stats
    }

    pub(super) fn resolve_node(&mut self, raw_id: i64, lon: f64, lat: f64) {
        let Ok(id) = u64::try_from(raw_id) else {
            return;
        };
        if !self.pending_nodes.remove(&id) {
            return;
        }
        if let Some(location) = validated_coord(lon, lat) {
            self.nodes.insert(id, location);
        }
    }

    /// Emit one edge per consecutive pair of resolved way nodes, honouring
    /// direction and clipping to `bounds`. Only nodes touched by an edge are
    /// added.
    pub(super) fn into_builder(mut self, bounds: Option<BoundingBox>) -> RoadNetworkBuilder {
        // Ways arrive in reduction order; sort so ids and edges are stable.
        self.ways.sort_by_key(|way| way.id);
        let inside = |location: &Coord<f64>| bounds.is_none_or(|area| area.contains(*location));

        let mut used = BTreeSet::new();
        let mut edges = Vec::new();
        for way in &self.ways {
            for pair in way.refs.windows(2) {
                let &[from, to] = pair else {
                    continue;
                };
                let (Some(a), Some(b)) = (self.nodes.get(&from), self.nodes.get(&to)) else {
                    continue;
                };
                if from == to || !inside(a) || !inside(b) {
                    continue;
                }
                let length_m = haversine_m(*a, *b);
                match way.direction {
                    Direction::Both => {
                        edges.push((from, to, length_m));
                        edges.push((to, from, length_m));
                    }
                    Direction::Forward => edges.push((from, to, length_m)),
                    Direction::Backward => edges.push((to, from, length_m)),
                }
                used.insert(from);
                used.insert(to);
            }
        }

        let mut builder = RoadNetworkBuilder::new();
        for id in used {
            if let Some(location) = self.nodes.get(&id) {
                builder.add_node(id, *location);
            }
        }
        for (from, to, length_m) in edges {
            builder.add_edge(from, to, length_m);
        }
        builder
    }
}

fn node_id(raw_id: i64) -> Option<u64> {
    u64::try_from(raw_id).map_or_else(
        |_| {
            warn!("Skipped OSM node reference {raw_id} (negative identifiers are unsupported)");
            None
        },
        Some,
    )
}

fn validated_coord(lon: f64, lat: f64) -> Option<Coord<f64>> {
    (lon.is_finite()
        && lat.is_finite()
        && (-180.0..=180.0).contains(&lon)
        && (-90.0..=90.0).contains(&lat))
    .then_some(Coord { x: lon, y: lat })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn accumulator_with(
        ways: Vec<(i64, Vec<u64>, Direction)>,
        nodes: &[(i64, f64, f64)],
    ) -> RoadAccumulator {
        let mut accumulator = RoadAccumulator::default();
        for (id, refs, direction) in ways {
            accumulator.pending_nodes.extend(refs.iter().copied());
            accumulator.ways.push(RoadWay { id, refs, direction });
        }
        for &(id, lat, lon) in nodes {
            accumulator.resolve_node(id, lon, lat);
        }
        accumulator
    }

    fn makati_nodes() -> Vec<(i64, f64, f64)> {
        vec![
            (1, 14.5547, 121.0244),
            (2, 14.5550, 121.0300),
            (3, 14.5600, 121.0200),
            (4, 14.6500, 121.1000),
        ]
    }

    #[rstest]
    fn two_way_roads_emit_both_directions() {
        let accumulator =
            accumulator_with(vec![(10, vec![1, 2, 3], Direction::Both)], &makati_nodes());
        let network = accumulator
            .into_builder(None)
            .build()
            .unwrap_or_else(|err| panic!("network builds: {err}"));
        assert_eq!(network.node_count(), 3);
        assert_eq!(network.edge_count(), 4);
    }

    #[rstest]
    #[case(Direction::Forward, (1, 2))]
    #[case(Direction::Backward, (2, 1))]
    fn one_way_roads_emit_a_single_direction(
        #[case] direction: Direction,
        #[case] expected: (u64, u64),
    ) {
        let accumulator = accumulator_with(vec![(10, vec![1, 2], direction)], &makati_nodes());
        let network = accumulator
            .into_builder(None)
            .build()
            .unwrap_or_else(|err| panic!("network builds: {err}"));
        let edges: Vec<(u64, u64)> = network.edges().map(|e| (e.from, e.to)).collect();
        assert_eq!(edges, vec![expected]);
    }

    #[rstest]
    fn bounds_drop_segments_leaving_the_area() {
        let accumulator =
            accumulator_with(vec![(10, vec![1, 3, 4], Direction::Both)], &makati_nodes());
        let makati = BoundingBox::new(14.569, 14.535, 121.043, 121.008);
        let network = accumulator
            .into_builder(Some(makati))
            .build()
            .unwrap_or_else(|err| panic!("network builds: {err}"));
        assert!(network.node(4).is_none());
        assert_eq!(network.edge_count(), 2);
    }

    #[rstest]
    fn unresolved_references_are_skipped() {
        let accumulator =
            accumulator_with(vec![(10, vec![1, 99, 2], Direction::Both)], &makati_nodes());
        assert_eq!(accumulator.pending_node_count(), 1);
        let builder = accumulator.into_builder(None);
        assert_eq!(builder.node_count(), 0);
    }

    #[rstest]
    fn edge_lengths_are_great_circle_distances() {
        let accumulator =
            accumulator_with(vec![(10, vec![1, 3], Direction::Forward)], &makati_nodes());
        let network = accumulator
            .into_builder(None)
            .build()
            .unwrap_or_else(|err| panic!("network builds: {err}"));
        let length = network.edges().map(|e| e.length_m).next().unwrap_or_default();
        assert!((length - 755.0).abs() < 15.0, "unexpected length {length}");
    }
}
