//! Incremental construction of a [`RoadNetwork`].

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use geo::Coord;
use petgraph::graph::DiGraph;
use rstar::RTree;

use super::spatial::{IndexedNode, LocalProjection};
use super::{Edge, NetworkBuildError, Node, RoadNetwork};
use crate::geodesy::validate_location;

/// Collects nodes and edges, validating them when [`build`](Self::build) is
/// called.
///
/// # Examples
/// ```
/// use courier_core::{RoadNetworkBuilder, lat_lon};
///
/// let mut builder = RoadNetworkBuilder::new();
/// builder
///     .add_node(1, lat_lon(14.5547, 121.0244))
///     .add_node(2, lat_lon(14.5600, 121.0200))
///     .add_road(1, 2, 800.0);
/// let network = builder.build()?;
/// assert_eq!(network.edge_count(), 2);
/// # Ok::<(), courier_core::NetworkBuildError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct RoadNetworkBuilder {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
}

impl RoadNetworkBuilder {
    /// Create an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an intersection.
    pub fn add_node(&mut self, id: u64, location: Coord<f64>) -> &mut Self {
        self.nodes.push(Node::new(id, location));
        self
    }

    /// Add a one-way segment from `from` to `to`.
    pub fn add_edge(&mut self, from: u64, to: u64, length_m: f64) -> &mut Self {
        self.edges.push(Edge { from, to, length_m });
        self
    }

    /// Add a two-way road as a pair of opposing segments.
    pub fn add_road(&mut self, a: u64, b: u64, length_m: f64) -> &mut Self {
        self.add_edge(a, b, length_m).add_edge(b, a, length_m)
    }

    /// Consuming variant of [`add_node`](Self::add_node).
    #[must_use]
    pub fn with_node(mut self, id: u64, location: Coord<f64>) -> Self {
        self.add_node(id, location);
        self
    }

    /// Consuming variant of [`add_edge`](Self::add_edge).
    #[must_use]
    pub fn with_edge(mut self, from: u64, to: u64, length_m: f64) -> Self {
        self.add_edge(from, to, length_m);
        self
    }

    /// Number of nodes added so far.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Validate the collected elements and freeze them into a network.
    ///
    /// # Errors
    /// Returns [`NetworkBuildError`] when a node id repeats, a node position
    /// is not a valid coordinate, an edge references an unknown node, or an
    /// edge length is negative or non-finite.
    pub fn build(self) -> Result<RoadNetwork, NetworkBuildError> {
        let Self { nodes, edges } = self;
        let mut graph = DiGraph::with_capacity(nodes.len(), edges.len());
        let mut index_by_id = HashMap::with_capacity(nodes.len());

        for node in nodes {
            validate_location(node.location)
                .map_err(|source| NetworkBuildError::InvalidNodeLocation { id: node.id, source })?;
            match index_by_id.entry(node.id) {
                Entry::Occupied(_) => return Err(NetworkBuildError::DuplicateNode { id: node.id }),
                Entry::Vacant(slot) => {
                    slot.insert(graph.add_node(node));
                }
            }
        }

        for edge in edges {
            if !(edge.length_m.is_finite() && edge.length_m >= 0.0) {
                return Err(NetworkBuildError::InvalidLength {
                    from: edge.from,
                    to: edge.to,
                    length_m: edge.length_m,
                });
            }
            let from = *index_by_id.get(&edge.from).ok_or(NetworkBuildError::UnknownNode {
                id: edge.from,
                from: edge.from,
                to: edge.to,
            })?;
            let to = *index_by_id.get(&edge.to).ok_or(NetworkBuildError::UnknownNode {
                id: edge.to,
                from: edge.from,
                to: edge.to,
            })?;
            graph.add_edge(from, to, edge.length_m);
        }

        let projection = LocalProjection::centred_on(graph.node_weights().map(|n| n.location));
        let entries = graph
            .node_indices()
            .filter_map(|index| {
                let node = graph.node_weight(index)?;
                Some(IndexedNode::new(node.id, index, projection.project(node.location)))
            })
            .collect();

        Ok(RoadNetwork {
            graph,
            index_by_id,
            spatial: RTree::bulk_load(entries),
            projection,
        })
    }
}
