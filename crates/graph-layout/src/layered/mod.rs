mod crossings;
mod layers;
mod positions;

use crate::routing::{endpoint, route_edge};
use crate::{
    Connection, Drawing, EdgeRoute, IncrementalHints, LayoutEngine, NodeSizes, Point,
    PortConstraints, Vec2,
};
use petgraph::graphmap::DiGraphMap;
use petgraph::visit::{IntoNeighborsDirected, IntoNodeIdentifiers};
use petgraph::Direction;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::hash::Hash;
use thiserror::Error;

use crossings::{initial_order, minimize_crossings};
use layers::assign_layers;
use positions::assign_coordinates;

/// Errors that can occur during layered layout computation
#[derive(Debug, Error)]
pub enum LayeredLayoutError<N>
where
    N: fmt::Debug,
{
    /// A connection refers to a node that was not laid out
    #[error("edge endpoint {0:?} is not part of the graph")]
    UnknownNode(N),
}

/// Configuration for the layered (Sugiyama-style) layout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayeredLayout {
    /// Horizontal and vertical margins between nodes
    pub margin: Vec2,

    /// Maximum iterations for crossing minimization
    pub max_crossing_iterations: usize,

    /// Maximum iterations for vertical position optimization
    pub max_position_iterations: usize,

    /// Route edges with axis-parallel segments instead of straight lines
    pub orthogonal_routing: bool,
}

impl Default for LayeredLayout {
    fn default() -> Self {
        Self {
            margin: Vec2::new(20.0, 20.0),
            max_crossing_iterations: 10,
            max_position_iterations: 50,
            orthogonal_routing: true,
        }
    }
}

impl LayeredLayout {
    /// Create a new layered layout with the given margin
    pub fn new(margin: Vec2) -> Self {
        Self {
            margin,
            ..Default::default()
        }
    }
}

/// Layer structure that can be cached and reused
#[derive(Debug, Clone)]
pub struct Layers<N>
where
    N: Copy + Ord + Hash,
{
    /// Internal graph representation for efficient edge lookups
    pub(crate) graph: DiGraphMap<N, ()>,

    /// Nodes organized into layers, first layer first
    pub nodes: Vec<Vec<N>>,

    /// Reported id of each layer in `nodes`
    pub ids: Vec<i32>,

    /// Whether the given layer ids were replaced by a dense numbering
    pub renumbered: bool,

    /// Number of edge crossings (quality metric)
    pub crossings: usize,
}

impl<N> Layers<N>
where
    N: Copy + Ord + Hash,
{
    /// Layer id of every node
    pub fn layer_ids(&self) -> HashMap<N, i32> {
        self.nodes
            .iter()
            .zip(&self.ids)
            .flat_map(|(layer, &id)| layer.iter().map(move |&node| (node, id)))
            .collect()
    }

    /// Dense index of every node's layer
    fn layer_indices(&self) -> HashMap<N, usize> {
        self.nodes
            .iter()
            .enumerate()
            .flat_map(|(index, layer)| layer.iter().map(move |&node| (node, index)))
            .collect()
    }
}

impl LayeredLayout {
    /// Compute layer structure
    ///
    /// Fixed nodes stay in their given layer and keep their relative order.
    /// Incremental nodes are layered around them, and together with the
    /// endpoints of incremental edges they are the only nodes crossing
    /// minimization may move. With empty hints this is a layout from scratch.
    pub fn compute_layers<G, E>(&self, graph: G, hints: &IncrementalHints<G::NodeId, E>) -> Layers<G::NodeId>
    where
        G: IntoNodeIdentifiers + IntoNeighborsDirected,
        G::NodeId: Copy + Ord + Hash,
        E: Eq + Hash,
    {
        let layering = assign_layers(&graph, hints);

        // Convert graph to DiGraphMap for efficient lookups during positioning
        let mut internal_graph = DiGraphMap::new();
        for node in graph.node_identifiers() {
            internal_graph.add_node(node);
        }
        for node in graph.node_identifiers() {
            for succ in graph.neighbors_directed(node, Direction::Outgoing) {
                internal_graph.add_edge(node, succ, ());
            }
        }

        let mut nodes = layering.layers;
        initial_order(&mut nodes, &hints.sequence);
        let (nodes, crossings) = minimize_crossings(
            &&internal_graph,
            nodes,
            self.max_crossing_iterations,
            |node| !hints.is_fixed(node) || !hints.sequence.contains_key(&node),
        );

        Layers {
            graph: internal_graph,
            nodes,
            ids: layering.layer_ids,
            renumbered: layering.renumbered,
            crossings,
        }
    }

    /// Compute positions from cached layers (cheap, rerun when sizes change)
    pub fn compute_positions<N, S>(&self, layers: &Layers<N>, sizes: &S) -> HashMap<N, Point>
    where
        N: Copy + Ord + Hash,
        S: NodeSizes<N>,
    {
        assign_coordinates(
            &layers.nodes,
            &layers.graph,
            sizes,
            self.margin,
            self.max_position_iterations,
        )
    }

    /// Route every connection between the placed nodes
    ///
    /// # Errors
    /// Returns an error if a connection touches a node without a position
    pub fn route_edges<N, E, S, P>(
        &self,
        layers: &Layers<N>,
        positions: &HashMap<N, Point>,
        connections: &[Connection<N, E>],
        sizes: &S,
        ports: &P,
    ) -> Result<HashMap<E, EdgeRoute>, LayeredLayoutError<N>>
    where
        N: Copy + Ord + Hash + fmt::Debug,
        E: Copy + Eq + Hash,
        S: NodeSizes<N>,
        P: PortConstraints<E>,
    {
        let layer_of = layers.layer_indices();
        let stub = self.margin.x.min(self.margin.y) / 2.0;

        connections
            .iter()
            .map(|connection| {
                let source = endpoint(connection.source, positions, &layer_of, sizes)
                    .ok_or(LayeredLayoutError::UnknownNode(connection.source))?;
                let target = endpoint(connection.target, positions, &layer_of, sizes)
                    .ok_or(LayeredLayoutError::UnknownNode(connection.target))?;
                let route = route_edge(
                    connection.id,
                    source,
                    target,
                    connection.source == connection.target,
                    ports,
                    stub,
                    self.orthogonal_routing,
                );
                Ok((connection.id, route))
            })
            .collect()
    }
}

// Implement LayoutEngine for any graph with the required capabilities
impl<G, E> LayoutEngine<G, E> for LayeredLayout
where
    G: IntoNodeIdentifiers + IntoNeighborsDirected,
    G::NodeId: Copy + Ord + Hash + fmt::Debug,
    E: Copy + Eq + Hash,
{
    type Error = LayeredLayoutError<G::NodeId>;

    fn layout<S, P>(
        &self,
        graph: G,
        connections: &[Connection<G::NodeId, E>],
        hints: &IncrementalHints<G::NodeId, E>,
        sizes: &S,
        ports: &P,
    ) -> Result<Drawing<G::NodeId, E>, Self::Error>
    where
        S: NodeSizes<G::NodeId>,
        P: PortConstraints<E>,
    {
        // Endpoints of rerouted edges may be resequenced
        let resequenced: HashSet<G::NodeId> = connections
            .iter()
            .filter(|connection| hints.incremental_edges.contains(&connection.id))
            .flat_map(|connection| [connection.source, connection.target])
            .collect();
        let resequenced_hints;
        let hints = if resequenced.is_empty() {
            hints
        } else {
            let mut owned = hints.clone();
            owned.sequence.retain(|node, _| !resequenced.contains(node));
            resequenced_hints = owned;
            &resequenced_hints
        };

        let layers = self.compute_layers(graph, hints);
        let positions = self.compute_positions(&layers, sizes);
        let routes = self.route_edges(&layers, &positions, connections, sizes, ports)?;

        Ok(Drawing {
            layers: layers.layer_ids(),
            positions,
            routes,
            renumbered: layers.renumbered,
        })
    }
}
