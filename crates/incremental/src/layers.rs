use crate::LayerHint;
use hecs::Entity;
use std::collections::{BTreeMap, HashMap};

/// Persistent layer index of every laid out node
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LayerAssignment {
    layers: HashMap<Entity, i32>,
}

impl LayerAssignment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, node: Entity) -> Option<i32> {
        self.layers.get(&node).copied()
    }

    pub fn set(&mut self, node: Entity, layer: i32) {
        self.layers.insert(node, layer);
    }

    pub fn remove(&mut self, node: Entity) -> Option<i32> {
        self.layers.remove(&node)
    }

    pub fn contains(&self, node: Entity) -> bool {
        self.layers.contains_key(&node)
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Entity, i32)> + '_ {
        self.layers.iter().map(|(&node, &layer)| (node, layer))
    }

    /// Double every index, leaving the odd slots free for insertions
    /// between neighbouring layers
    pub fn spread(&mut self) {
        for layer in self.layers.values_mut() {
            *layer = layer.saturating_mul(2);
        }
    }

    pub fn retain(&mut self, mut keep: impl FnMut(Entity) -> bool) {
        self.layers.retain(|&node, _| keep(node));
    }

    /// Largest index magnitude, zero when empty
    pub fn magnitude(&self) -> i32 {
        self.layers
            .values()
            .map(|layer| layer.saturating_abs())
            .max()
            .unwrap_or(0)
    }

    /// Map from the stored ids to their dense ranks
    pub fn ranks(&self) -> LayerRemap {
        let mut ids: Vec<i32> = self.layers.values().copied().collect();
        ids.sort_unstable();
        ids.dedup();
        ids.into_iter().zip(0..).collect()
    }

    pub fn remap(&mut self, remap: &LayerRemap) {
        for layer in self.layers.values_mut() {
            *layer = remap.id(*layer);
        }
    }
}

/// Order preserving translation of layer ids from one numbering to another
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LayerRemap {
    ids: BTreeMap<i32, i32>,
}

impl LayerRemap {
    pub fn insert(&mut self, from: i32, to: i32) {
        self.ids.insert(from, to);
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    fn next(&self, from: i32) -> Option<(i32, i32)> {
        self.ids.range(from..).next().map(|(&k, &v)| (k, v))
    }

    fn prev(&self, from: i32) -> Option<(i32, i32)> {
        self.ids.range(..from).next_back().map(|(&k, &v)| (k, v))
    }

    /// Translate an id, ids between known ones keep their distance to the
    /// closest known neighbour
    pub fn id(&self, layer: i32) -> i32 {
        match (self.prev(layer), self.next(layer)) {
            (_, Some((k, v))) if k == layer => v,
            (Some((_, prev)), Some((_, next))) => (next - 1).max(prev),
            (None, Some((k, v))) => v.saturating_sub(k.saturating_sub(layer)),
            (Some((k, v)), None) => v.saturating_add(layer.saturating_sub(k)),
            (None, None) => layer,
        }
    }

    /// Translate a hint, a layer that no longer exists becomes an insertion
    /// at its place
    pub fn hint(&self, hint: LayerHint) -> LayerHint {
        if self.is_empty() {
            return hint;
        }
        let before = |layer: i32| match (self.next(layer), self.prev(layer)) {
            (Some((_, next)), _) => LayerHint::InsertBefore(next),
            (None, Some((_, last))) => LayerHint::InsertBefore(last.saturating_add(1)),
            (None, None) => LayerHint::InsertBefore(layer),
        };
        match hint {
            LayerHint::Layer(layer) => match self.ids.get(&layer) {
                Some(&id) => LayerHint::Layer(id),
                None => before(layer),
            },
            LayerHint::InsertBefore(layer) => before(layer),
            LayerHint::Outside => LayerHint::Outside,
        }
    }
}

impl FromIterator<(i32, i32)> for LayerRemap {
    fn from_iter<T: IntoIterator<Item = (i32, i32)>>(iter: T) -> Self {
        Self {
            ids: iter.into_iter().collect(),
        }
    }
}

impl FromIterator<(Entity, i32)> for LayerAssignment {
    fn from_iter<T: IntoIterator<Item = (Entity, i32)>>(iter: T) -> Self {
        Self {
            layers: iter.into_iter().collect(),
        }
    }
}

impl Extend<(Entity, i32)> for LayerAssignment {
    fn extend<T: IntoIterator<Item = (Entity, i32)>>(&mut self, iter: T) {
        self.layers.extend(iter);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hecs::World;
    use test_log::test;

    #[test]
    fn spread_doubles_every_index() {
        let mut world = World::new();
        let a = world.spawn(());
        let b = world.spawn(());
        let c = world.spawn(());
        let mut layers: LayerAssignment = [(a, 0), (b, 3), (c, -1)].into_iter().collect();

        layers.spread();

        assert_eq!(layers.get(a), Some(0));
        assert_eq!(layers.get(b), Some(6));
        assert_eq!(layers.get(c), Some(-2));
    }

    #[test]
    fn ranks_compact_sparse_ids() {
        let mut world = World::new();
        let a = world.spawn(());
        let b = world.spawn(());
        let c = world.spawn(());
        let mut layers: LayerAssignment =
            [(a, -8), (b, 1 << 29), (c, i32::MAX)].into_iter().collect();
        assert_eq!(layers.magnitude(), i32::MAX);

        let ranks = layers.ranks();
        layers.remap(&ranks);

        assert_eq!(layers.get(a), Some(0));
        assert_eq!(layers.get(b), Some(1));
        assert_eq!(layers.get(c), Some(2));
        assert_eq!(ranks.hint(LayerHint::Layer(1 << 29)), LayerHint::Layer(1));
        assert_eq!(ranks.hint(LayerHint::InsertBefore(i32::MAX)), LayerHint::InsertBefore(2));
    }

    #[test]
    fn remap_turns_vanished_layers_into_insertions() {
        // 0, 1 and 3 survived a spread, layer 2 was emptied
        let remap: LayerRemap = [(0, 0), (1, 2), (3, 6)].into_iter().collect();

        assert_eq!(remap.hint(LayerHint::Layer(1)), LayerHint::Layer(2));
        assert_eq!(remap.hint(LayerHint::InsertBefore(1)), LayerHint::InsertBefore(2));
        assert_eq!(remap.hint(LayerHint::Layer(2)), LayerHint::InsertBefore(6));
        assert_eq!(remap.hint(LayerHint::InsertBefore(4)), LayerHint::InsertBefore(7));
        assert_eq!(remap.hint(LayerHint::Outside), LayerHint::Outside);
        assert_eq!(remap.id(3), 6);
        assert_eq!(remap.id(2), 5);
        assert_eq!(remap.id(5), 8);
        assert_eq!(remap.id(-1), -1);
    }

    #[test]
    fn unknown_nodes_have_no_layer() {
        let mut world = World::new();
        let a = world.spawn(());
        let mut layers = LayerAssignment::new();
        assert_eq!(layers.get(a), None);

        layers.set(a, 4);
        assert_eq!(layers.remove(a), Some(4));
        assert!(layers.is_empty());
    }
}
