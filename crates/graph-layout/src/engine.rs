use crate::{Connection, EdgeRoute, IncrementalHints, NodeSizes, Point, PortConstraints};
use petgraph::visit::GraphBase;
use std::collections::HashMap;
use std::hash::Hash;

/// Result of a layout run
#[derive(Debug, Clone)]
pub struct Drawing<N, E>
where
    N: Eq + Hash,
    E: Eq + Hash,
{
    /// Layer of every node, in the id space of the given layers
    pub layers: HashMap<N, i32>,

    /// Top-left corner of every node
    pub positions: HashMap<N, Point>,

    /// Geometry of every routed edge
    pub routes: HashMap<E, EdgeRoute>,

    /// Set when the given layer ids could not be kept and every layer was
    /// renumbered densely from zero
    pub renumbered: bool,
}

impl<N, E> Default for Drawing<N, E>
where
    N: Eq + Hash,
    E: Eq + Hash,
{
    fn default() -> Self {
        Self {
            layers: HashMap::new(),
            positions: HashMap::new(),
            routes: HashMap::new(),
            renumbered: false,
        }
    }
}

/// A layout engine that can place the nodes and route the edges of a graph
///
/// This trait is generic over the graph type `G`, used for the node
/// structure, and the edge identity `E`, used to key the routes. Edges are
/// passed separately as [`Connection`]s so parallel edges keep distinct
/// routes.
pub trait LayoutEngine<G, E>
where
    G: GraphBase,
    G::NodeId: Eq + Hash,
    E: Eq + Hash,
{
    type Error;

    /// Compute a drawing, rearranging only what `hints` allows
    ///
    /// # Errors
    /// Returns an error if the inputs are inconsistent, e.g. a connection
    /// refers to a node the graph does not contain
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
        P: PortConstraints<E>;
}
