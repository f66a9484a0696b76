use hecs::Entity;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Target of a node reassignment, in the layer ids of the last drawing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LayerHint {
    /// Move into the existing layer
    Layer(i32),
    /// Open a new layer right before the given one
    InsertBefore(i32),
    /// Dropped away from every layer, let the engine choose
    Outside,
}

impl LayerHint {
    /// Index the node is staged at once the assignment has been spread,
    /// `None` when the engine decides
    pub fn spread_index(self) -> Option<i32> {
        match self {
            LayerHint::Layer(layer) => Some(layer.saturating_mul(2)),
            LayerHint::InsertBefore(layer) => Some(layer.saturating_mul(2).saturating_sub(1)),
            LayerHint::Outside => None,
        }
    }
}

/// Layer changes queued for the next pass, last hint per node wins
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PendingReassignments {
    hints: HashMap<Entity, LayerHint>,
}

impl PendingReassignments {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, node: Entity, hint: LayerHint) -> Option<LayerHint> {
        self.hints.insert(node, hint)
    }

    pub fn get(&self, node: Entity) -> Option<LayerHint> {
        self.hints.get(&node).copied()
    }

    pub fn remove(&mut self, node: Entity) -> Option<LayerHint> {
        self.hints.remove(&node)
    }

    pub fn len(&self) -> usize {
        self.hints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hints.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Entity, LayerHint)> + '_ {
        self.hints.iter().map(|(&node, &hint)| (node, hint))
    }

    /// Forget the entries of `consumed` that were not replaced since
    pub fn retain_consumed(&mut self, consumed: &PendingReassignments) {
        self.hints
            .retain(|node, hint| consumed.hints.get(node) != Some(&*hint));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hecs::World;
    use test_log::test;

    #[test]
    fn hints_map_to_spread_slots() {
        assert_eq!(LayerHint::Layer(3).spread_index(), Some(6));
        assert_eq!(LayerHint::InsertBefore(3).spread_index(), Some(5));
        assert_eq!(LayerHint::InsertBefore(0).spread_index(), Some(-1));
        assert_eq!(LayerHint::Outside.spread_index(), None);
    }

    #[test]
    fn replaced_hints_survive_consumption() {
        let mut world = World::new();
        let a = world.spawn(());
        let b = world.spawn(());
        let mut pending = PendingReassignments::new();
        pending.insert(a, LayerHint::Layer(1));
        pending.insert(b, LayerHint::Outside);
        let consumed = pending.clone();

        pending.insert(b, LayerHint::InsertBefore(2));
        pending.retain_consumed(&consumed);

        assert_eq!(pending.get(a), None);
        assert_eq!(pending.get(b), Some(LayerHint::InsertBefore(2)));
    }
}
