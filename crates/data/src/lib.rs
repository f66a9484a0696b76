//! Graph model shared by the coordinator and its shells
//!
//! Nodes and edges live as entities in a `hecs::World`. Layout runs work on
//! a [`GraphSnapshot`] taken from the world.

mod components;
mod snapshot;

pub use components::*;
pub use snapshot::GraphSnapshot;

/// Size given to nodes that have no [`Size`] component
pub const DEFAULT_NODE_SIZE: graph_layout::Vec2 = graph_layout::Vec2 { x: 60.0, y: 30.0 };
