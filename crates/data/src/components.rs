use derive_more::From;
use graph_layout::{Drawing, EdgeRoute, Point, Vec2};
use hecs::{Bundle, Entity};
use serde::{Deserialize, Serialize};
use tracing::debug;

// Graph elements are plain entities, the generation carried by `Entity`
// makes handles of deleted elements unambiguous.

#[derive(Debug, PartialEq, Eq, Copy, Clone, Serialize, Deserialize)]
pub struct Node;

#[derive(Debug, PartialEq, Eq, Copy, Clone, Serialize, Deserialize)]
pub struct Edge {
    pub source: Entity,
    pub target: Entity,
}

#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize, From)]
pub struct Name(pub String);

#[derive(Debug, PartialEq, Copy, Clone, Serialize, Deserialize, From)]
pub struct Size(pub Vec2);

/// Top-left corner of a node in the last drawing
#[derive(Debug, PartialEq, Copy, Clone, Serialize, Deserialize, From)]
pub struct Position(pub Point);

/// Geometry of an edge in the last drawing
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize, From)]
pub struct Route(pub EdgeRoute);

#[derive(Bundle, Debug, PartialEq, Clone)]
pub struct NodeBundle {
    pub node: Node,
    pub name: Name,
    pub size: Size,
}

pub trait WorldGraphExt {
    fn spawn_node(&mut self, name: impl Into<String>, size: Vec2) -> Entity;
    /// Returns `None` when either endpoint is not a node
    fn spawn_edge(&mut self, source: Entity, target: Entity) -> Option<Entity>;
    /// Despawn a node and its edges, returning the removed edges
    fn despawn_node(&mut self, node: Entity) -> Vec<Entity>;
    fn is_node(&self, entity: Entity) -> bool;
    fn find_node(&self, name: &str) -> Option<Entity>;
    fn edges_at(&self, node: Entity) -> Vec<Entity>;
    fn apply_drawing(&mut self, drawing: &Drawing<Entity, Entity>);
}

impl WorldGraphExt for hecs::World {
    fn spawn_node(&mut self, name: impl Into<String>, size: Vec2) -> Entity {
        self.spawn(NodeBundle {
            node: Node,
            name: Name(name.into()),
            size: Size(size),
        })
    }

    fn spawn_edge(&mut self, source: Entity, target: Entity) -> Option<Entity> {
        if !self.is_node(source) || !self.is_node(target) {
            return None;
        }
        Some(self.spawn((Edge { source, target },)))
    }

    fn despawn_node(&mut self, node: Entity) -> Vec<Entity> {
        let edges = self.edges_at(node);
        for &edge in &edges {
            let _ = self.despawn(edge);
        }
        let _ = self.despawn(node);
        edges
    }

    fn is_node(&self, entity: Entity) -> bool {
        self.get::<&Node>(entity).is_ok()
    }

    fn find_node(&self, name: &str) -> Option<Entity> {
        self.query::<(&Node, &Name)>()
            .iter()
            .find_map(|(e, (_, n))| (n.0 == name).then_some(e))
    }

    fn edges_at(&self, node: Entity) -> Vec<Entity> {
        self.query::<&Edge>()
            .iter()
            .filter_map(|(e, edge)| (edge.source == node || edge.target == node).then_some(e))
            .collect()
    }

    fn apply_drawing(&mut self, drawing: &Drawing<Entity, Entity>) {
        for (&node, &position) in &drawing.positions {
            if self.insert_one(node, Position(position)).is_err() {
                debug!("Node {node:?} is gone, dropping its position");
            }
        }
        for (&edge, route) in &drawing.routes {
            if self.insert_one(edge, Route(route.clone())).is_err() {
                debug!("Edge {edge:?} is gone, dropping its route");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hecs::World;
    use test_log::test;

    #[test]
    fn edges_need_node_endpoints() {
        let mut world = World::new();
        let a = world.spawn_node("a", Vec2::new(60.0, 30.0));
        let b = world.spawn_node("b", Vec2::new(60.0, 30.0));
        let edge = world.spawn_edge(a, b).unwrap();

        assert!(world.spawn_edge(a, edge).is_none());
        assert_eq!(world.edges_at(a), vec![edge]);
        assert_eq!(world.find_node("b"), Some(b));
    }

    #[test]
    fn despawning_a_node_removes_its_edges() {
        let mut world = World::new();
        let a = world.spawn_node("a", Vec2::new(60.0, 30.0));
        let b = world.spawn_node("b", Vec2::new(60.0, 30.0));
        let c = world.spawn_node("c", Vec2::new(60.0, 30.0));
        let ab = world.spawn_edge(a, b).unwrap();
        let bc = world.spawn_edge(b, c).unwrap();

        let mut removed = world.despawn_node(b);
        removed.sort();

        let mut expected = vec![ab, bc];
        expected.sort();
        assert_eq!(removed, expected);
        assert!(!world.contains(ab));
        assert!(!world.is_node(b));
        assert!(world.is_node(a));
    }
}
