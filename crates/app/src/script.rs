use anyhow::{anyhow, Context, Result};
use graph_layout::{EdgeEnd, PortSide, Vec2};
use hecs::{Entity, World};
use layerwerk_data::{Edge, GraphSnapshot, Name, Position, WorldGraphExt};
use layerwerk_incremental::{LayerHint, LayoutCoordinator};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Sample graph from the interactive demo, then a new node E
pub const DEFAULT_SCRIPT: &str = r#"(
    steps: [
        AddNode(name: "A", layer: Some(0)),
        AddNode(name: "B", layer: Some(1)),
        AddNode(name: "C", layer: Some(2)),
        AddNode(name: "D", layer: Some(2)),
        AddEdge(from: "A", to: "B"),
        AddEdge(from: "B", to: "C"),
        AddEdge(from: "A", to: "D"),
        Layout,
        AddNode(name: "E"),
        AddEdge(from: "C", to: "E"),
        Layout,
        DragNode(node: "D", hint: InsertBefore(1)),
        SetPort(from: "A", to: "D", end: Source, side: Some(South)),
        Layout,
    ],
)"#;

/// One user interaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Step {
    /// Nodes with a layer join the initial layering, the others are new
    AddNode {
        name: String,
        #[serde(default)]
        layer: Option<i32>,
        #[serde(default)]
        size: Option<Vec2>,
    },
    AddEdge {
        from: String,
        to: String,
    },
    DragNode {
        node: String,
        hint: LayerHint,
    },
    DropNode {
        node: String,
        x: f32,
    },
    SetPort {
        from: String,
        to: String,
        end: EdgeEnd,
        side: Option<PortSide>,
    },
    Reinsert {
        nodes: Vec<String>,
    },
    Reroute {
        from: String,
        to: String,
    },
    RemoveNode {
        node: String,
    },
    Layout,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Script {
    pub steps: Vec<Step>,
}

impl Script {
    pub fn parse(source: &str) -> Result<Self> {
        ron::from_str(source).context("Invalid script")
    }
}

/// A graph being edited, with the coordinator following the edits
pub struct Session {
    pub world: World,
    pub coordinator: LayoutCoordinator,
    pub timeout: Duration,
}

impl Session {
    pub fn new(coordinator: LayoutCoordinator, timeout: Duration) -> Self {
        Self {
            world: World::new(),
            coordinator,
            timeout,
        }
    }

    pub async fn run(&mut self, script: &Script) -> Result<()> {
        for (index, step) in script.steps.iter().enumerate() {
            debug!("Step {index}: {step:?}");
            self.apply(step)
                .await
                .with_context(|| format!("Step {index} failed: {step:?}"))?;
        }
        Ok(())
    }

    async fn apply(&mut self, step: &Step) -> Result<()> {
        match step {
            Step::AddNode { name, layer, size } => {
                let size = size.unwrap_or(self.coordinator.config().default_node_size);
                let node = self.world.spawn_node(name.as_str(), size);
                match layer {
                    Some(layer) => self.coordinator.assign_layers([(node, *layer)]).await,
                    None => self.coordinator.on_node_created(node).await,
                }
            }
            Step::AddEdge { from, to } => {
                let (source, target) = (self.node(from)?, self.node(to)?);
                let edge = self
                    .world
                    .spawn_edge(source, target)
                    .ok_or_else(|| anyhow!("Cannot connect {from} to {to}"))?;
                self.coordinator.on_edge_created(edge).await;
            }
            Step::DragNode { node, hint } => {
                let node = self.node(node)?;
                self.coordinator.on_node_drag_finished(node, *hint).await;
            }
            Step::DropNode { node, x } => {
                let entity = self.node(node)?;
                let hint = self.coordinator.on_node_dropped_at(entity, *x).await;
                info!("{node} dropped at {x}: {hint:?}");
            }
            Step::SetPort {
                from,
                to,
                end,
                side,
            } => {
                let edge = self.edge(from, to)?;
                self.coordinator
                    .on_edge_first_or_last_bend_dragged(edge, *end, *side)
                    .await;
            }
            Step::Reinsert { nodes } => {
                let nodes = nodes
                    .iter()
                    .map(|name| self.node(name))
                    .collect::<Result<Vec<_>>>()?;
                self.coordinator.reinsert_nodes(nodes).await;
            }
            Step::Reroute { from, to } => {
                let edge = self.edge(from, to)?;
                self.coordinator.reroute_edges([edge]).await;
            }
            Step::RemoveNode { node } => {
                let node = self.node(node)?;
                for edge in self.world.despawn_node(node) {
                    self.coordinator.on_edge_removed(edge).await;
                }
                self.coordinator.on_node_removed(node).await;
            }
            Step::Layout => self.layout().await?,
        }
        Ok(())
    }

    /// Run a pass and copy the drawing into the world
    ///
    /// A failed or timed out pass is reported and leaves the session as
    /// it was, the next `Layout` retries with the same changes.
    pub async fn layout(&mut self) -> Result<()> {
        let snapshot =
            GraphSnapshot::from_world(&self.world, self.coordinator.config().default_node_size);
        let result =
            tokio::time::timeout(self.timeout, self.coordinator.request_layout(&snapshot)).await;

        match result {
            Ok(Ok(outcome)) => {
                for (node, layer) in &outcome.placed {
                    info!("Placed {} in layer {layer}", self.name(*node));
                }
                self.world.apply_drawing(&outcome.drawing);
            }
            Ok(Err(err)) => warn!("Layout failed: {err}"),
            Err(_) => warn!("Layout timed out after {:?}", self.timeout),
        }
        Ok(())
    }

    fn node(&self, name: &str) -> Result<Entity> {
        self.world
            .find_node(name)
            .ok_or_else(|| anyhow!("No node named {name}"))
    }

    fn edge(&self, from: &str, to: &str) -> Result<Entity> {
        let (source, target) = (self.node(from)?, self.node(to)?);
        self.world
            .query::<&Edge>()
            .iter()
            .find_map(|(e, edge)| (edge.source == source && edge.target == target).then_some(e))
            .ok_or_else(|| anyhow!("No edge from {from} to {to}"))
    }

    pub fn name(&self, node: Entity) -> String {
        self.world
            .get::<&Name>(node)
            .map(|name| name.0.clone())
            .unwrap_or_else(|_| format!("{node:?}"))
    }

    /// Name, layer and position of every node, sorted by layer then name
    pub async fn summary(&self) -> Vec<(String, Option<i32>, Option<Position>)> {
        let layers = self.coordinator.layers().await;
        let mut rows: Vec<_> = self
            .world
            .query::<(&Name, Option<&Position>)>()
            .iter()
            .map(|(node, (name, position))| (name.0.clone(), layers.get(node), position.copied()))
            .collect();
        rows.sort_by(|a, b| (a.1, &a.0).cmp(&(b.1, &b.0)));
        rows
    }
}
