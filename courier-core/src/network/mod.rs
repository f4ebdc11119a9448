//! Immutable road network with nearest-node lookup.
//!
//! A [`RoadNetwork`] is a directed graph of intersections ([`Node`]) joined by
//! road segments whose weight is their physical length in metres. Networks are
//! assembled through [`RoadNetworkBuilder`] or loaded from a pair of
//! [`NetworkSource`]s with [`RoadNetwork::load_with_fallback`]. Once built the
//! network never changes, so it can be wrapped in an `Arc` and shared by every
//! router thread without locking.

mod builder;
mod error;
mod source;
mod spatial;

use std::collections::HashMap;

use geo::Coord;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use rstar::RTree;

pub use builder::RoadNetworkBuilder;
pub use error::{NetworkBuildError, NetworkLoadError, SourceError};
pub use source::NetworkSource;

use spatial::{IndexedNode, LocalProjection};

/// An intersection in the road graph.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Node {
    /// Stable identifier, unique within a network.
    pub id: u64,
    /// WGS84 position with `x = longitude`, `y = latitude`.
    pub location: Coord<f64>,
}

impl Node {
    /// Create a node.
    ///
    /// # Examples
    /// ```
    /// use courier_core::{Node, lat_lon};
    ///
    /// let node = Node::new(7, lat_lon(14.5547, 121.0244));
    /// assert_eq!(node.id, 7);
    /// ```
    #[must_use]
    pub const fn new(id: u64, location: Coord<f64>) -> Self {
        Self { id, location }
    }
}

/// A directed road segment between two nodes.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Edge {
    /// Identifier of the node the segment leaves.
    pub from: u64,
    /// Identifier of the node the segment enters.
    pub to: u64,
    /// Physical length of the segment in metres.
    pub length_m: f64,
}

/// Weighted directed graph of intersections and road segments.
///
/// Parallel edges between the same pair of nodes are permitted; routing picks
/// whichever is shorter.
#[derive(Debug, Clone)]
pub struct RoadNetwork {
    graph: DiGraph<Node, f64>,
    index_by_id: HashMap<u64, NodeIndex>,
    spatial: RTree<IndexedNode>,
    projection: LocalProjection,
}

impl RoadNetwork {
    /// Start assembling a network.
    #[must_use]
    pub fn builder() -> RoadNetworkBuilder {
        RoadNetworkBuilder::new()
    }

    /// Load a network from `primary`, falling back to `fallback` when the
    /// primary source fails.
    ///
    /// Initialization blocks until a source succeeds; callers run it once
    /// before serving requests.
    ///
    /// # Errors
    /// Returns [`NetworkLoadError`] carrying both failures when neither source
    /// yields a network.
    pub fn load_with_fallback<P, F>(primary: &P, fallback: &F) -> Result<Self, NetworkLoadError>
    where
        P: NetworkSource + ?Sized,
        F: NetworkSource + ?Sized,
    {
        source::load_with_fallback(primary, fallback)
    }

    /// Number of intersections.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of directed road segments.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Whether the network holds no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Look up a node by identifier.
    #[must_use]
    pub fn node(&self, id: u64) -> Option<&Node> {
        self.index_by_id
            .get(&id)
            .and_then(|index| self.graph.node_weight(*index))
    }

    /// Iterate over every node in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.graph.node_weights()
    }

    /// Iterate over every directed segment.
    pub fn edges(&self) -> impl Iterator<Item = Edge> + '_ {
        self.graph.edge_references().filter_map(|edge| {
            let from = self.graph.node_weight(edge.source())?;
            let to = self.graph.node_weight(edge.target())?;
            Some(Edge {
                from: from.id,
                to: to.id,
                length_m: *edge.weight(),
            })
        })
    }

    /// Return the node closest to `location`.
    ///
    /// Distance is measured on a local equirectangular projection, which is
    /// accurate at city scale. When several nodes are equally close the one
    /// with the lowest identifier wins. Returns `None` for an empty network or
    /// a non-finite query.
    ///
    /// # Examples
    /// ```
    /// use courier_core::{RoadNetwork, lat_lon};
    ///
    /// let network = RoadNetwork::builder()
    ///     .with_node(1, lat_lon(14.5547, 121.0244))
    ///     .with_node(2, lat_lon(14.5600, 121.0200))
    ///     .build()?;
    /// let nearest = network.nearest_node(lat_lon(14.5590, 121.0210));
    /// assert_eq!(nearest.map(|node| node.id), Some(2));
    /// # Ok::<(), courier_core::NetworkBuildError>(())
    /// ```
    #[must_use]
    pub fn nearest_node(&self, location: Coord<f64>) -> Option<&Node> {
        self.nearest_index(location)
            .and_then(|index| self.graph.node_weight(index))
    }

    pub(crate) fn nearest_index(&self, location: Coord<f64>) -> Option<NodeIndex> {
        if !(location.x.is_finite() && location.y.is_finite()) {
            return None;
        }
        let query = self.projection.project(location);
        let mut candidates = self.spatial.nearest_neighbor_iter_with_distance_2(&query);
        let (first, best) = candidates.next()?;
        let winner = candidates
            .take_while(|(_, distance)| *distance <= best)
            .map(|(candidate, _)| candidate)
            .fold(first, |current, candidate| {
                if candidate.id < current.id {
                    candidate
                } else {
                    current
                }
            });
        Some(winner.index)
    }

    pub(crate) const fn graph(&self) -> &DiGraph<Node, f64> {
        &self.graph
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geodesy::lat_lon;
    use rstest::{fixture, rstest};

    #[fixture]
    fn triangle() -> RoadNetwork {
        let mut builder = RoadNetwork::builder();
        builder
            .add_node(10, lat_lon(14.5547, 121.0244))
            .add_node(20, lat_lon(14.5600, 121.0200))
            .add_node(30, lat_lon(14.5550, 121.0300))
            .add_road(10, 20, 800.0)
            .add_edge(20, 30, 1_100.0);
        match builder.build() {
            Ok(network) => network,
            Err(err) => panic!("triangle network should build: {err}"),
        }
    }

    #[rstest]
    fn counts_nodes_and_directed_edges(triangle: RoadNetwork) {
        assert_eq!(triangle.node_count(), 3);
        assert_eq!(triangle.edge_count(), 3);
        assert!(!triangle.is_empty());
    }

    #[rstest]
    fn looks_up_nodes_by_id(triangle: RoadNetwork) {
        assert_eq!(triangle.node(20).map(|n| n.location), Some(lat_lon(14.5600, 121.0200)));
        assert!(triangle.node(99).is_none());
    }

    #[rstest]
    #[case(lat_lon(14.5548, 121.0245), 10)]
    #[case(lat_lon(14.5601, 121.0199), 20)]
    #[case(lat_lon(14.5551, 121.0290), 30)]
    fn nearest_node_picks_closest(
        triangle: RoadNetwork,
        #[case] query: Coord<f64>,
        #[case] expected: u64,
    ) {
        assert_eq!(triangle.nearest_node(query).map(|n| n.id), Some(expected));
    }

    #[rstest]
    fn nearest_node_breaks_ties_by_lowest_id() {
        let spot = lat_lon(14.5547, 121.0244);
        let network = RoadNetwork::builder()
            .with_node(9, spot)
            .with_node(4, spot)
            .with_node(6, spot)
            .build()
            .unwrap_or_else(|err| panic!("co-located nodes should build: {err}"));
        assert_eq!(network.nearest_node(lat_lon(14.5, 121.0)).map(|n| n.id), Some(4));
    }

    #[rstest]
    fn nearest_node_is_none_for_empty_network() {
        let network = RoadNetwork::builder()
            .build()
            .unwrap_or_else(|err| panic!("empty network should build: {err}"));
        assert!(network.nearest_node(lat_lon(14.5547, 121.0244)).is_none());
    }

    #[rstest]
    fn nearest_node_ignores_non_finite_queries(triangle: RoadNetwork) {
        assert!(triangle.nearest_node(lat_lon(f64::NAN, 121.0)).is_none());
    }

    #[rstest]
    fn edges_report_public_ids(triangle: RoadNetwork) {
        let mut edges: Vec<(u64, u64)> = triangle.edges().map(|e| (e.from, e.to)).collect();
        edges.sort_unstable();
        assert_eq!(edges, vec![(10, 20), (20, 10), (20, 30)]);
    }
}
