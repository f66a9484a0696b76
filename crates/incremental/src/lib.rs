//! Incremental layout coordination
//!
//! [`LayoutCoordinator`] keeps the layer of every node between layout
//! passes and records what editing changed, so each pass only rearranges
//! the new or moved part of the drawing.

mod bands;
mod config;
mod coordinator;
mod engine;
mod error;
mod incremental;
mod layers;
mod pending;
mod ports;

pub use bands::{LayerBand, LayerBands};
pub use config::CoordinatorConfig;
pub use coordinator::{LayoutCoordinator, LayoutOutcome, Phase};
pub use engine::{LayeredBackend, LayoutBackend, LayoutRequest};
pub use error::CoordinatorError;
pub use incremental::IncrementalSet;
pub use layers::{LayerAssignment, LayerRemap};
pub use pending::{LayerHint, PendingReassignments};
pub use ports::PortConstraintTable;
