use hecs::Entity;
use std::collections::HashSet;

/// Ordered set of entities, iteration follows insertion
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct OrderedSet {
    order: Vec<Entity>,
    members: HashSet<Entity>,
}

impl OrderedSet {
    fn insert(&mut self, entity: Entity) -> bool {
        let added = self.members.insert(entity);
        if added {
            self.order.push(entity);
        }
        added
    }

    fn remove(&mut self, entity: Entity) -> bool {
        let removed = self.members.remove(&entity);
        if removed {
            self.order.retain(|&e| e != entity);
        }
        removed
    }

    fn retain(&mut self, mut keep: impl FnMut(Entity) -> bool) {
        self.order.retain(|&e| keep(e));
        self.members = self.order.iter().copied().collect();
    }

    fn contains(&self, entity: Entity) -> bool {
        self.members.contains(&entity)
    }

    fn clear(&mut self) {
        self.order.clear();
        self.members.clear();
    }
}

/// Nodes and edges the next pass may rearrange
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IncrementalSet {
    nodes: OrderedSet,
    edges: OrderedSet,
}

impl IncrementalSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns whether the node was not already a member
    pub fn add_node(&mut self, node: Entity) -> bool {
        self.nodes.insert(node)
    }

    pub fn add_edge(&mut self, edge: Entity) -> bool {
        self.edges.insert(edge)
    }

    pub fn add_nodes(&mut self, nodes: impl IntoIterator<Item = Entity>) {
        for node in nodes {
            self.nodes.insert(node);
        }
    }

    pub fn add_edges(&mut self, edges: impl IntoIterator<Item = Entity>) {
        for edge in edges {
            self.edges.insert(edge);
        }
    }

    pub fn remove_node(&mut self, node: Entity) -> bool {
        self.nodes.remove(node)
    }

    pub fn remove_edge(&mut self, edge: Entity) -> bool {
        self.edges.remove(edge)
    }

    pub fn contains_node(&self, node: Entity) -> bool {
        self.nodes.contains(node)
    }

    pub fn contains_edge(&self, edge: Entity) -> bool {
        self.edges.contains(edge)
    }

    pub fn nodes(&self) -> impl ExactSizeIterator<Item = Entity> + '_ {
        self.nodes.order.iter().copied()
    }

    pub fn edges(&self) -> impl ExactSizeIterator<Item = Entity> + '_ {
        self.edges.order.iter().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.order.is_empty() && self.edges.order.is_empty()
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.edges.clear();
    }

    /// Remove every member `consumed` holds, keeping the ones added since
    pub fn retain_consumed(&mut self, consumed: &IncrementalSet) {
        self.nodes.retain(|node| !consumed.contains_node(node));
        self.edges.retain(|edge| !consumed.contains_edge(edge));
    }

    pub(crate) fn retain_nodes(&mut self, keep: impl FnMut(Entity) -> bool) {
        self.nodes.retain(keep);
    }

    pub(crate) fn retain_edges(&mut self, keep: impl FnMut(Entity) -> bool) {
        self.edges.retain(keep);
    }
}
