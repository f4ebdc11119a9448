//! Dijkstra search over a shared [`RoadNetwork`].

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::sync::Arc;

use geo::Coord;
use ordered_float::OrderedFloat;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;

use super::{RoutePlan, Router, UnroutableError};
use crate::network::{Node, RoadNetwork};

/// Settled-node cap applied by [`RouterConfig::default`].
pub const DEFAULT_MAX_SETTLED_NODES: usize = 2_000_000;

/// Tuning for [`DijkstraRouter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouterConfig {
    /// Maximum number of nodes the search may settle before giving up.
    ///
    /// Defaults to [`DEFAULT_MAX_SETTLED_NODES`]. `None` bounds the search
    /// only by the size of the graph.
    pub max_settled_nodes: Option<usize>,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            max_settled_nodes: Some(DEFAULT_MAX_SETTLED_NODES),
        }
    }
}

impl RouterConfig {
    /// Cap the number of settled nodes per search.
    #[must_use]
    pub const fn with_max_settled_nodes(mut self, limit: usize) -> Self {
        self.max_settled_nodes = Some(limit);
        self
    }
}

/// Shortest-path router weighting edges by physical length.
///
/// # Examples
/// ```
/// use std::sync::Arc;
/// use courier_core::{DijkstraRouter, RoadNetwork, Router, lat_lon};
///
/// let alice = lat_lon(14.5547, 121.0244);
/// let job = lat_lon(14.5600, 121.0200);
/// let mut builder = RoadNetwork::builder();
/// builder.add_node(1, alice).add_node(2, job).add_edge(1, 2, 800.0);
/// let router = DijkstraRouter::new(Arc::new(builder.build()?));
///
/// let plan = router.route(alice, job);
/// assert_eq!(plan.waypoints.len(), 2);
/// assert_eq!(plan.eta_minutes, 1.6);
/// # Ok::<(), courier_core::NetworkBuildError>(())
/// ```
#[derive(Debug, Clone)]
pub struct DijkstraRouter {
    network: Arc<RoadNetwork>,
    config: RouterConfig,
}

impl DijkstraRouter {
    /// Route over `network` with the default configuration.
    #[must_use]
    pub fn new(network: Arc<RoadNetwork>) -> Self {
        Self::with_config(network, RouterConfig::default())
    }

    /// Route over `network` with explicit tuning.
    #[must_use]
    pub const fn with_config(network: Arc<RoadNetwork>, config: RouterConfig) -> Self {
        Self { network, config }
    }

    /// The network this router searches.
    #[must_use]
    pub fn network(&self) -> &RoadNetwork {
        &self.network
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> RouterConfig {
        self.config
    }
}

impl Router for DijkstraRouter {
    fn try_route(
        &self,
        origin: Coord<f64>,
        destination: Coord<f64>,
    ) -> Result<RoutePlan, UnroutableError> {
        let start = self
            .network
            .nearest_index(origin)
            .ok_or(UnroutableError::EmptyNetwork)?;
        let goal = self
            .network
            .nearest_index(destination)
            .ok_or(UnroutableError::EmptyNetwork)?;
        let graph = self.network.graph();
        let path = shortest_path(graph, start, goal, self.config.max_settled_nodes)?;
        let waypoints = path
            .nodes
            .iter()
            .filter_map(|index| graph.node_weight(*index))
            .map(|node| node.location)
            .collect();
        Ok(RoutePlan::new(waypoints, path.length_m))
    }
}

struct ShortestPath {
    nodes: Vec<NodeIndex>,
    length_m: f64,
}

fn node_id(graph: &DiGraph<Node, f64>, index: NodeIndex) -> u64 {
    graph.node_weight(index).map_or(0, |node| node.id)
}

/// Lazy-deletion Dijkstra. Heap entries order by cost, then by node index so
/// that equal-cost frontiers expand in a stable order.
fn shortest_path(
    graph: &DiGraph<Node, f64>,
    start: NodeIndex,
    goal: NodeIndex,
    max_settled: Option<usize>,
) -> Result<ShortestPath, UnroutableError> {
    let node_count = graph.node_count();
    let mut best = vec![f64::INFINITY; node_count];
    let mut previous: Vec<Option<NodeIndex>> = vec![None; node_count];
    let mut settled = vec![false; node_count];
    let mut settled_count = 0_usize;
    let mut frontier = BinaryHeap::new();

    if let Some(slot) = best.get_mut(start.index()) {
        *slot = 0.0;
    }
    frontier.push(Reverse((OrderedFloat(0.0), start)));

    while let Some(Reverse((OrderedFloat(cost), node))) = frontier.pop() {
        match settled.get_mut(node.index()) {
            Some(done) if !*done => *done = true,
            _ => continue,
        }
        settled_count += 1;

        if node == goal {
            return Ok(ShortestPath {
                nodes: trace_back(&previous, start, goal),
                length_m: cost,
            });
        }
        if let Some(limit) = max_settled
            && settled_count >= limit
        {
            return Err(UnroutableError::SearchBudgetExhausted {
                limit,
                to: node_id(graph, goal),
            });
        }

        for edge in graph.edges(node) {
            let next = edge.target();
            let candidate = cost + *edge.weight();
            let Some(known) = best.get_mut(next.index()) else {
                continue;
            };
            if candidate < *known {
                *known = candidate;
                if let Some(parent) = previous.get_mut(next.index()) {
                    *parent = Some(node);
                }
                frontier.push(Reverse((OrderedFloat(candidate), next)));
            }
        }
    }

    Err(UnroutableError::NoPath {
        from: node_id(graph, start),
        to: node_id(graph, goal),
    })
}

fn trace_back(previous: &[Option<NodeIndex>], start: NodeIndex, goal: NodeIndex) -> Vec<NodeIndex> {
    let mut path = vec![goal];
    let mut current = goal;
    while current != start {
        match previous.get(current.index()).copied().flatten() {
            Some(parent) => {
                path.push(parent);
                current = parent;
            }
            None => break,
        }
    }
    path.reverse();
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geodesy::{haversine_m, lat_lon};
    use crate::test_support::makati_grid;
    use rstest::{fixture, rstest};

    fn build(builder: crate::RoadNetworkBuilder) -> Arc<RoadNetwork> {
        Arc::new(
            builder
                .build()
                .unwrap_or_else(|err| panic!("test network should build: {err}")),
        )
    }

    /// A square 1-2-3-4 with a long diagonal 1-3 and a one-way spur 4-5.
    #[fixture]
    fn grid() -> Arc<RoadNetwork> {
        let mut builder = RoadNetwork::builder();
        builder
            .add_node(1, lat_lon(14.5500, 121.0200))
            .add_node(2, lat_lon(14.5500, 121.0300))
            .add_node(3, lat_lon(14.5600, 121.0300))
            .add_node(4, lat_lon(14.5600, 121.0200))
            .add_node(5, lat_lon(14.5700, 121.0200))
            .add_road(1, 2, 1_000.0)
            .add_road(2, 3, 1_000.0)
            .add_road(3, 4, 1_000.0)
            .add_road(4, 1, 1_000.0)
            .add_road(1, 3, 2_500.0)
            .add_edge(4, 5, 1_100.0);
        build(builder)
    }

    #[rstest]
    fn prefers_cheaper_multi_hop_path(grid: Arc<RoadNetwork>) {
        let router = DijkstraRouter::new(grid);
        let plan = router
            .try_route(lat_lon(14.5500, 121.0200), lat_lon(14.5600, 121.0300))
            .unwrap_or_else(|err| panic!("route should exist: {err}"));
        assert_eq!(plan.waypoints.len(), 3);
        assert!((plan.distance_m - 2_000.0).abs() < 1e-9);
        assert!((plan.eta_minutes - 4.0).abs() < 1e-9);
    }

    #[rstest]
    fn equal_cost_paths_are_stable(grid: Arc<RoadNetwork>) {
        let router = DijkstraRouter::new(grid);
        let from = lat_lon(14.5500, 121.0200);
        let to = lat_lon(14.5600, 121.0300);
        let first = router.route(from, to);
        for _ in 0..10 {
            assert_eq!(router.route(from, to), first);
        }
    }

    #[rstest]
    fn honours_one_way_segments(grid: Arc<RoadNetwork>) {
        let router = DijkstraRouter::new(grid);
        let result = router.try_route(lat_lon(14.5700, 121.0200), lat_lon(14.5500, 121.0200));
        assert_eq!(result, Err(UnroutableError::NoPath { from: 5, to: 1 }));
    }

    #[rstest]
    fn same_node_yields_single_waypoint(grid: Arc<RoadNetwork>) {
        let router = DijkstraRouter::new(grid);
        let plan = router.route(lat_lon(14.55001, 121.02001), lat_lon(14.54999, 121.01999));
        assert_eq!(plan.waypoints, vec![lat_lon(14.5500, 121.0200)]);
        assert_eq!(plan.distance_m, 0.0);
        assert_eq!(plan.eta_minutes, 0.0);
        assert!(plan.is_routable());
    }

    #[rstest]
    fn empty_network_is_unroutable() {
        let router = DijkstraRouter::new(build(RoadNetwork::builder()));
        let result = router.try_route(lat_lon(14.55, 121.02), lat_lon(14.56, 121.03));
        assert_eq!(result, Err(UnroutableError::EmptyNetwork));
        assert_eq!(
            router.route(lat_lon(14.55, 121.02), lat_lon(14.56, 121.03)),
            RoutePlan::unroutable()
        );
    }

    #[rstest]
    fn settled_node_cap_stops_search(grid: Arc<RoadNetwork>) {
        let router =
            DijkstraRouter::with_config(grid, RouterConfig::default().with_max_settled_nodes(1));
        let result = router.try_route(lat_lon(14.5500, 121.0200), lat_lon(14.5700, 121.0200));
        assert_eq!(
            result,
            Err(UnroutableError::SearchBudgetExhausted { limit: 1, to: 5 })
        );
    }

    #[rstest]
    fn parallel_edges_use_the_shorter_one() {
        let router = DijkstraRouter::new(build(
            RoadNetwork::builder()
                .with_node(1, lat_lon(14.5547, 121.0244))
                .with_node(2, lat_lon(14.5600, 121.0200))
                .with_edge(1, 2, 1_200.0)
                .with_edge(1, 2, 800.0),
        ));
        let plan = router.route(lat_lon(14.5547, 121.0244), lat_lon(14.5600, 121.0200));
        assert!((plan.distance_m - 800.0).abs() < 1e-9);
    }

    #[rstest]
    fn searches_are_capped_by_default() {
        assert_eq!(
            RouterConfig::default().max_settled_nodes,
            Some(DEFAULT_MAX_SETTLED_NODES)
        );
        let router = DijkstraRouter::new(makati_grid());
        assert_eq!(router.config(), RouterConfig::default());
    }

    #[rstest]
    fn waypoint_legs_add_up_to_route_distance() {
        let router = DijkstraRouter::new(makati_grid());
        let plan = router.route(lat_lon(14.5525, 121.0200), lat_lon(14.5600, 121.0300));
        assert_eq!(plan.waypoints.first().copied(), Some(lat_lon(14.5525, 121.0200)));
        assert_eq!(plan.waypoints.last().copied(), Some(lat_lon(14.5600, 121.0300)));
        let walked: f64 = plan
            .waypoints
            .windows(2)
            .filter_map(|pair| match pair {
                [a, b] => Some(haversine_m(*a, *b)),
                _ => None,
            })
            .sum();
        assert!((plan.distance_m - 1_910.0).abs() < 1e-9);
        assert!(
            (walked - plan.distance_m).abs() <= plan.distance_m * 0.01,
            "walked {walked} m against {} m",
            plan.distance_m
        );
    }
}
