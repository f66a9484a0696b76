//! Per-run inputs consumed by the layout engines: node sizes, port sides,
//! the edge list and the incremental hints.

use crate::Vec2;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::hash::Hash;

/// Trait for providing node sizes during layout computation
pub trait NodeSizes<N> {
    /// Get the size of a node
    fn size(&self, node: N) -> Vec2;
}

impl<N, F> NodeSizes<N> for F
where
    F: Fn(N) -> Vec2,
{
    fn size(&self, node: N) -> Vec2 {
        self(node)
    }
}

// Missing nodes are treated as points
impl<N: Eq + Hash + Copy> NodeSizes<N> for HashMap<N, Vec2> {
    fn size(&self, node: N) -> Vec2 {
        self.get(&node).copied().unwrap_or(Vec2::zero())
    }
}

/// Side of a node an edge end is pinned to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PortSide {
    North,
    South,
    East,
    West,
}

impl PortSide {
    /// Unit direction pointing away from the node through this side
    pub fn direction(self) -> (f32, f32) {
        match self {
            PortSide::North => (0.0, -1.0),
            PortSide::South => (0.0, 1.0),
            PortSide::East => (1.0, 0.0),
            PortSide::West => (-1.0, 0.0),
        }
    }

    pub fn is_horizontal(self) -> bool {
        matches!(self, PortSide::East | PortSide::West)
    }
}

/// Which end of an edge a constraint applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EdgeEnd {
    Source,
    Target,
}

/// Trait for looking up port side constraints during routing
pub trait PortConstraints<E> {
    /// The side the given end of `edge` must attach to, if constrained
    fn side(&self, edge: E, end: EdgeEnd) -> Option<PortSide>;
}

impl<E, F> PortConstraints<E> for F
where
    F: Fn(E, EdgeEnd) -> Option<PortSide>,
{
    fn side(&self, edge: E, end: EdgeEnd) -> Option<PortSide> {
        self(edge, end)
    }
}

impl<E: Eq + Hash + Copy> PortConstraints<E> for HashMap<(E, EdgeEnd), PortSide> {
    fn side(&self, edge: E, end: EdgeEnd) -> Option<PortSide> {
        self.get(&(edge, end)).copied()
    }
}

/// A directed edge with its own identity, parallel edges allowed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Connection<N, E> {
    pub id: E,
    pub source: N,
    pub target: N,
}

impl<N, E> Connection<N, E> {
    pub fn new(id: E, source: N, target: N) -> Self {
        Self { id, source, target }
    }
}

/// Tells an engine which elements it may rearrange
///
/// Nodes listed in `given_layers` and absent from `incremental_nodes` keep
/// their layer. Their relative order inside a layer follows `sequence`, the
/// coordinate they had in the previous drawing. Endpoints of
/// `incremental_edges` may be resequenced but not re-layered.
#[derive(Debug, Clone)]
pub struct IncrementalHints<N, E>
where
    N: Eq + Hash,
    E: Eq + Hash,
{
    pub given_layers: HashMap<N, i32>,
    pub incremental_nodes: HashSet<N>,
    pub incremental_edges: HashSet<E>,
    pub sequence: HashMap<N, f32>,
}

impl<N, E> Default for IncrementalHints<N, E>
where
    N: Eq + Hash,
    E: Eq + Hash,
{
    fn default() -> Self {
        Self {
            given_layers: HashMap::new(),
            incremental_nodes: HashSet::new(),
            incremental_edges: HashSet::new(),
            sequence: HashMap::new(),
        }
    }
}

impl<N, E> IncrementalHints<N, E>
where
    N: Copy + Eq + Hash,
    E: Eq + Hash,
{
    /// Hints for a full layout that respects the given layering
    pub fn given(layers: impl IntoIterator<Item = (N, i32)>) -> Self {
        Self {
            given_layers: layers.into_iter().collect(),
            ..Default::default()
        }
    }

    /// Whether `node` keeps its given layer
    pub fn is_fixed(&self, node: N) -> bool {
        self.given_layers.contains_key(&node) && !self.incremental_nodes.contains(&node)
    }
}
