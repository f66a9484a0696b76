//! Incremental layered graph layout
//!
//! This crate provides a layered (Sugiyama-style) layout that works with any
//! graph implementing petgraph's visitor traits. Besides laying out a graph
//! from scratch it can keep a given layering for most of the nodes and only
//! insert the ones marked as incremental, which is what interactive editors
//! need to keep the drawing stable between edits.
//!
//! # Layout Engines
//!
//! - [`LayeredLayout`]: layered layout with given layers and incremental hints
//!
//! # Example
//!
//! ```
//! use graph_layout::{Connection, IncrementalHints, LayeredLayout, LayoutEngine, PortSide, EdgeEnd, Vec2};
//! use petgraph::graphmap::DiGraphMap;
//!
//! // Create a graph, edges are identified by their index
//! let connections = [Connection::new(0, 1, 2), Connection::new(1, 2, 3)];
//! let mut graph = DiGraphMap::new();
//! for connection in &connections {
//!     graph.add_edge(connection.source, connection.target, ());
//! }
//!
//! // Keep 1 and 2 in their layers, insert 3 wherever it fits
//! let mut hints = IncrementalHints::given([(1, 0), (2, 1)]);
//! hints.incremental_nodes.insert(3);
//!
//! let engine = LayeredLayout::new(Vec2::new(20.0, 20.0));
//! let sizes = |_node: u32| Vec2::new(100.0, 50.0);
//! let ports = |_edge: usize, _end: EdgeEnd| -> Option<PortSide> { None };
//!
//! let drawing = engine.layout(&graph, &connections, &hints, &sizes, &ports).unwrap();
//! assert_eq!(drawing.layers[&3], 2);
//!
//! // Or directly by calling each step for better control
//! let layers = engine.compute_layers(&graph, &hints);
//! let positions = engine.compute_positions(&layers, &sizes);
//! let routes = engine.route_edges(&layers, &positions, &connections, &sizes, &ports).unwrap();
//! assert_eq!(routes.len(), 2);
//! ```

mod engine;
mod geometry;
mod inputs;
mod routing;

pub mod layered;

// Re-export core types and traits
pub use engine::{Drawing, LayoutEngine};
pub use geometry::{Point, Vec2};
pub use inputs::{Connection, EdgeEnd, IncrementalHints, NodeSizes, PortConstraints, PortSide};
pub use routing::EdgeRoute;

// Re-export petgraph visitor traits for graph abstraction
pub use petgraph::visit::{GraphBase, IntoNeighborsDirected, IntoNodeIdentifiers};
pub use petgraph::Direction;

// Re-export layered layout types
pub use layered::{LayeredLayout, LayeredLayoutError, Layers};
