//! The layout coordinator
//!
//! Editing events only record what changed: new nodes and edges, layers
//! chosen by dragging, port sides picked by dragging an edge end. A layout
//! pass then hands the engine the current layering with the changed part
//! marked as incremental, and commits the result only when the engine
//! succeeds.

use crate::{
    CoordinatorConfig, CoordinatorError, IncrementalSet, LayerAssignment, LayerBands, LayerHint,
    LayerRemap, LayeredBackend, LayoutBackend, LayoutRequest, PendingReassignments, PortConstraintTable,
};
use graph_layout::{Drawing, EdgeEnd, IncrementalHints, LayeredLayout, PortSide};
use hecs::Entity;
use layerwerk_data::GraphSnapshot;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Ids are compacted to dense ranks before a spread once they grow past this
const SPREAD_LIMIT: i32 = i32::MAX / 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Running,
}

/// Result of a committed pass
#[derive(Debug, Clone)]
pub struct LayoutOutcome {
    pub drawing: Drawing<Entity, Entity>,
    /// Incremental nodes and the layer the engine gave them
    pub placed: Vec<(Entity, i32)>,
    /// Edges the pass was asked to reroute
    pub rerouted: Vec<Entity>,
    /// The engine could not keep the layer ids and renumbered every layer
    pub renumbered: bool,
}

#[derive(Debug, Default)]
struct State {
    layers: LayerAssignment,
    ports: PortConstraintTable,
    incremental: IncrementalSet,
    pending: PendingReassignments,
    drawing: Option<Drawing<Entity, Entity>>,
    bands: LayerBands,
    // Elements removed since the running pass started
    removed: HashSet<Entity>,
    // Layers assigned while a pass was running
    assigned: Vec<(Entity, i32)>,
}

impl State {
    /// Nodes dropped outside every layer are incremental right away, the
    /// others wait for the next pass to move
    fn queue_hint(&mut self, node: Entity, hint: LayerHint) {
        if hint == LayerHint::Outside {
            self.incremental.add_node(node);
        }
        self.pending.insert(node, hint);
    }
}

/// What a pass works on, copied out of the state so a failing engine
/// leaves the state untouched
struct Staged {
    // Layering the pass started from, in the ids queued events refer to
    previous: LayerAssignment,
    layers: LayerAssignment,
    incremental: IncrementalSet,
    consumed_incremental: IncrementalSet,
    consumed_pending: PendingReassignments,
    dead_edges: Vec<Entity>,
}

struct RunningGuard<'a>(&'a AtomicBool);

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct LayoutCoordinator<B = LayeredBackend> {
    backend: B,
    config: CoordinatorConfig,
    running: AtomicBool,
    state: Mutex<State>,
}

impl LayoutCoordinator<LayeredBackend> {
    pub fn layered(layout: LayeredLayout, config: CoordinatorConfig) -> Self {
        Self::new(LayeredBackend::new(layout), config)
    }
}

impl<B: LayoutBackend> LayoutCoordinator<B> {
    pub fn new(backend: B, config: CoordinatorConfig) -> Self {
        Self {
            backend,
            config,
            running: AtomicBool::new(false),
            state: Mutex::new(State::default()),
        }
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    pub fn phase(&self) -> Phase {
        if self.running.load(Ordering::Acquire) {
            Phase::Running
        } else {
            Phase::Idle
        }
    }

    /// Set the layering of a loaded graph, nodes keep these layers until
    /// moved
    pub async fn assign_layers(&self, layers: impl IntoIterator<Item = (Entity, i32)>) {
        let mut state = self.state.lock().await;
        let running = self.phase() == Phase::Running;
        for (node, layer) in layers {
            state.layers.set(node, layer);
            if running {
                state.assigned.push((node, layer));
            }
        }
    }

    pub async fn on_node_created(&self, node: Entity) {
        debug!("Node {node:?} created");
        self.state.lock().await.incremental.add_node(node);
    }

    /// A node created inside the drawing asks for the layer it was put in
    pub async fn on_node_created_at(&self, node: Entity, hint: LayerHint) {
        debug!("Node {node:?} created with {hint:?}");
        self.state.lock().await.queue_hint(node, hint);
    }

    pub async fn on_edge_created(&self, edge: Entity) {
        debug!("Edge {edge:?} created");
        self.state.lock().await.incremental.add_edge(edge);
    }

    pub async fn on_node_drag_finished(&self, node: Entity, hint: LayerHint) {
        debug!("Node {node:?} dragged, {hint:?}");
        self.state.lock().await.queue_hint(node, hint);
    }

    /// Translate a drop position into a hint using the bands of the last
    /// drawing
    pub async fn on_node_dropped_at(&self, node: Entity, x: f32) -> LayerHint {
        let mut state = self.state.lock().await;
        let hint = state.bands.hint_at(x);
        debug!("Node {node:?} dropped at x={x}, {hint:?}");
        state.queue_hint(node, hint);
        hint
    }

    /// Pin (or with `None`, release) the side an edge end attaches to
    pub async fn on_edge_first_or_last_bend_dragged(
        &self,
        edge: Entity,
        end: EdgeEnd,
        side: Option<PortSide>,
    ) {
        debug!("Edge {edge:?} {end:?} port set to {side:?}");
        let mut state = self.state.lock().await;
        state.ports.set(edge, end, side);
        state.incremental.add_edge(edge);
    }

    pub async fn reinsert_nodes(&self, nodes: impl IntoIterator<Item = Entity>) {
        self.state.lock().await.incremental.add_nodes(nodes);
    }

    pub async fn reroute_edges(&self, edges: impl IntoIterator<Item = Entity>) {
        self.state.lock().await.incremental.add_edges(edges);
    }

    pub async fn on_node_removed(&self, node: Entity) {
        let mut state = self.state.lock().await;
        state.layers.remove(node);
        state.incremental.remove_node(node);
        state.pending.remove(node);
        state.removed.insert(node);
    }

    pub async fn on_edge_removed(&self, edge: Entity) {
        let mut state = self.state.lock().await;
        state.ports.remove_edge(edge);
        state.incremental.remove_edge(edge);
        state.removed.insert(edge);
    }

    pub async fn layer_of(&self, node: Entity) -> Option<i32> {
        self.state.lock().await.layers.get(node)
    }

    pub async fn port_constraint(&self, edge: Entity, end: EdgeEnd) -> Option<PortSide> {
        self.state.lock().await.ports.get(edge, end)
    }

    pub async fn layers(&self) -> LayerAssignment {
        self.state.lock().await.layers.clone()
    }

    pub async fn incremental(&self) -> IncrementalSet {
        self.state.lock().await.incremental.clone()
    }

    pub async fn pending(&self) -> PendingReassignments {
        self.state.lock().await.pending.clone()
    }

    pub async fn bands(&self) -> LayerBands {
        self.state.lock().await.bands.clone()
    }

    pub async fn drawing(&self) -> Option<Drawing<Entity, Entity>> {
        self.state.lock().await.drawing.clone()
    }

    /// Run one layout pass over `graph`
    ///
    /// Events recorded while the pass runs are kept for the next one. If
    /// the returned future is dropped the coordinator goes back to idle
    /// without committing anything.
    ///
    /// # Errors
    /// [`CoordinatorError::LayoutAlreadyRunning`] if a pass is in flight,
    /// [`CoordinatorError::EngineFailure`] if the engine failed, in both
    /// cases nothing was changed.
    pub async fn request_layout(
        &self,
        graph: &GraphSnapshot,
    ) -> Result<LayoutOutcome, CoordinatorError> {
        if self
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            warn!("Layout requested while a pass is running");
            return Err(CoordinatorError::LayoutAlreadyRunning);
        }
        let _running = RunningGuard(&self.running);

        let (staged, request) = {
            let mut state = self.state.lock().await;
            state.assigned.clear();
            stage(&state, graph)
        };

        let result = self.backend.run_layout(request).await;

        let mut state = self.state.lock().await;
        let drawing = match result {
            Ok(drawing) => drawing,
            Err(err) => {
                warn!("Layout pass failed: {err:#}");
                state.removed.clear();
                state.assigned.clear();
                return Err(CoordinatorError::EngineFailure(err));
            }
        };

        Ok(self.commit(&mut state, staged, drawing, graph))
    }

    fn commit(
        &self,
        state: &mut State,
        staged: Staged,
        mut drawing: Drawing<Entity, Entity>,
        graph: &GraphSnapshot,
    ) -> LayoutOutcome {
        let Staged {
            previous,
            mut layers,
            incremental,
            consumed_incremental,
            consumed_pending,
            dead_edges,
        } = staged;

        let removed = std::mem::take(&mut state.removed);
        drawing.layers.retain(|node, _| !removed.contains(node));
        drawing.positions.retain(|node, _| !removed.contains(node));
        drawing.routes.retain(|edge, _| !removed.contains(edge));

        // A fixed node coming back elsewhere means the engine renumbered
        let renumbered = drawing.renumbered
            || layers.iter().any(|(node, layer)| {
                !incremental.contains_node(node)
                    && drawing.layers.get(&node).is_some_and(|&l| l != layer)
            });

        let placed: Vec<(Entity, i32)> = incremental
            .nodes()
            .filter_map(|node| drawing.layers.get(&node).map(|&layer| (node, layer)))
            .collect();

        if renumbered {
            info!("Engine renumbered the layers, adopting its layering");
            layers = drawing.layers.iter().map(|(&n, &l)| (n, l)).collect();
        } else {
            layers.extend(placed.iter().copied());
        }
        layers.retain(|node| !removed.contains(&node));

        state.pending.retain_consumed(&consumed_pending);

        // Events queued during the pass still use the ids it started from
        if !consumed_pending.is_empty() || renumbered {
            let remap = carried_ids(&previous, &layers, &incremental, &consumed_pending);
            debug!("Translating events queued during the pass with {remap:?}");
            let queued: Vec<(Entity, LayerHint)> = state.pending.iter().collect();
            for (node, hint) in queued {
                state.pending.insert(node, remap.hint(hint));
            }
            for (_, layer) in state.assigned.iter_mut() {
                *layer = remap.id(*layer);
            }
        }
        layers.extend(state.assigned.drain(..));
        state.layers = layers;

        for edge in dead_edges {
            state.ports.remove_edge(edge);
        }
        state.incremental.retain_consumed(&consumed_incremental);

        state.bands = LayerBands::from_drawing(&drawing, graph.sizes(), self.config.band_margin);
        state.drawing = Some(drawing.clone());

        info!(
            placed = placed.len(),
            rerouted = incremental.edges().len(),
            layers = state.bands.iter().count(),
            "Layout pass committed"
        );

        LayoutOutcome {
            drawing,
            placed,
            rerouted: incremental.edges().collect(),
            renumbered,
        }
    }
}

/// How the ids of the nodes a pass left in place changed
///
/// Nodes that were moved or placed by the pass say nothing about the old
/// numbering and are skipped.
fn carried_ids(
    previous: &LayerAssignment,
    layers: &LayerAssignment,
    incremental: &IncrementalSet,
    moved: &PendingReassignments,
) -> LayerRemap {
    previous
        .iter()
        .filter(|&(node, _)| !incremental.contains_node(node) && moved.get(node).is_none())
        .filter_map(|(node, old)| layers.get(node).map(|new| (old, new)))
        .collect()
}

/// Build the staged copies and the engine request from the current state
fn stage(state: &State, graph: &GraphSnapshot) -> (Staged, LayoutRequest) {
    let mut layers = state.layers.clone();
    layers.retain(|node| graph.contains_node(node));

    let mut ports = state.ports.clone();
    let dead_edges: Vec<Entity> = ports
        .iter()
        .map(|(edge, _, _)| edge)
        .filter(|&edge| !graph.contains_edge(edge))
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();
    ports.retain_live(|edge| graph.contains_edge(edge));

    let mut incremental = state.incremental.clone();
    incremental.retain_nodes(|node| graph.contains_node(node));
    incremental.retain_edges(|edge| graph.contains_edge(edge));

    // Doubling keeps an odd slot free before every layer
    let mut ranks = LayerRemap::default();
    if !state.pending.is_empty() {
        let hinted = state
            .pending
            .iter()
            .filter_map(|(_, hint)| match hint {
                LayerHint::Layer(layer) | LayerHint::InsertBefore(layer) => {
                    Some(layer.saturating_abs())
                }
                LayerHint::Outside => None,
            })
            .max()
            .unwrap_or(0);
        if layers.magnitude().max(hinted) > SPREAD_LIMIT {
            ranks = layers.ranks();
            debug!("Compacting {} layer ids before spreading", layers.len());
            layers.remap(&ranks);
        }
        layers.spread();
    }
    for (node, hint) in state.pending.iter() {
        if !graph.contains_node(node) {
            continue;
        }
        match ranks.hint(hint).spread_index() {
            Some(index) => {
                layers.set(node, index);
                incremental.remove_node(node);
            }
            None => {
                incremental.add_node(node);
            }
        }
        incremental.add_edges(graph.edges_at(node));
    }

    for &node in graph.nodes() {
        if !layers.contains(node) {
            incremental.add_node(node);
        }
    }

    let mut hints = IncrementalHints::given(layers.iter());
    hints.incremental_nodes = incremental.nodes().collect();
    hints.incremental_edges = incremental.edges().collect();
    if let Some(drawing) = &state.drawing {
        hints.sequence = drawing
            .positions
            .iter()
            .filter(|(node, _)| graph.contains_node(**node))
            .map(|(&node, position)| (node, position.y))
            .collect();
    }

    debug!(
        fixed = layers.len(),
        incremental_nodes = hints.incremental_nodes.len(),
        incremental_edges = hints.incremental_edges.len(),
        pending = state.pending.len(),
        "Staged layout pass"
    );

    let staged = Staged {
        previous: state.layers.clone(),
        layers,
        incremental,
        consumed_incremental: state.incremental.clone(),
        consumed_pending: state.pending.clone(),
        dead_edges,
    };
    let request = LayoutRequest {
        graph: graph.clone(),
        hints,
        ports,
    };
    (staged, request)
}
