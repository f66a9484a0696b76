use crate::{Edge, Node, Size};
use graph_layout::{Connection, Vec2};
use hecs::{Entity, World};
use petgraph::graphmap::DiGraphMap;
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Owned copy of the graph structure, detached from the world so a layout
/// can run while the world keeps being edited
#[derive(Debug, Clone, Default)]
pub struct GraphSnapshot {
    nodes: Vec<Entity>,
    connections: Vec<Connection<Entity, Entity>>,
    sizes: HashMap<Entity, Vec2>,
    incidence: HashMap<Entity, Vec<Entity>>,
    edges: HashSet<Entity>,
}

impl GraphSnapshot {
    /// Capture every node and every edge whose endpoints are nodes
    pub fn from_world(world: &World, default_size: Vec2) -> Self {
        let mut snapshot = Self::default();

        for (entity, (_, size)) in world.query::<(&Node, Option<&Size>)>().iter() {
            snapshot.nodes.push(entity);
            snapshot
                .sizes
                .insert(entity, size.map_or(default_size, |s| s.0));
            snapshot.incidence.insert(entity, Vec::new());
        }
        snapshot.nodes.sort();

        for (entity, edge) in world.query::<&Edge>().iter() {
            if !snapshot.incidence.contains_key(&edge.source)
                || !snapshot.incidence.contains_key(&edge.target)
            {
                debug!("Skipping dangling edge {entity:?}");
                continue;
            }
            snapshot
                .connections
                .push(Connection::new(entity, edge.source, edge.target));
        }
        snapshot.connections.sort_by_key(|connection| connection.id);

        for connection in &snapshot.connections {
            snapshot.edges.insert(connection.id);
            for node in [connection.source, connection.target] {
                let incident = snapshot.incidence.entry(node).or_default();
                // Self loops are listed once
                if incident.last() != Some(&connection.id) {
                    incident.push(connection.id);
                }
            }
        }

        snapshot
    }

    pub fn nodes(&self) -> &[Entity] {
        &self.nodes
    }

    pub fn connections(&self) -> &[Connection<Entity, Entity>] {
        &self.connections
    }

    pub fn sizes(&self) -> &HashMap<Entity, Vec2> {
        &self.sizes
    }

    pub fn contains_node(&self, node: Entity) -> bool {
        self.incidence.contains_key(&node)
    }

    pub fn contains_edge(&self, edge: Entity) -> bool {
        self.edges.contains(&edge)
    }

    /// Edges with `node` as source or target
    pub fn edges_at(&self, node: Entity) -> impl Iterator<Item = Entity> + '_ {
        self.incidence.get(&node).into_iter().flatten().copied()
    }

    /// Node structure with parallel edges merged
    pub fn topology(&self) -> DiGraphMap<Entity, ()> {
        let mut graph = DiGraphMap::new();
        for &node in &self.nodes {
            graph.add_node(node);
        }
        for connection in &self.connections {
            graph.add_edge(connection.source, connection.target, ());
        }
        graph
    }
}
