use graph_layout::{EdgeEnd, PortConstraints, PortSide};
use hecs::Entity;
use std::collections::HashMap;

/// Port side constraints per edge end
///
/// Keys are generation checked, an edge spawned into a recycled slot does
/// not see the constraints of the edge that used it before.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PortConstraintTable {
    sides: HashMap<(Entity, EdgeEnd), PortSide>,
}

impl PortConstraintTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pin `end` of `edge` to `side`, or lift the constraint with `None`
    pub fn set(&mut self, edge: Entity, end: EdgeEnd, side: Option<PortSide>) {
        match side {
            Some(side) => {
                self.sides.insert((edge, end), side);
            }
            None => {
                self.sides.remove(&(edge, end));
            }
        }
    }

    pub fn get(&self, edge: Entity, end: EdgeEnd) -> Option<PortSide> {
        self.sides.get(&(edge, end)).copied()
    }

    pub fn remove_edge(&mut self, edge: Entity) {
        self.sides.remove(&(edge, EdgeEnd::Source));
        self.sides.remove(&(edge, EdgeEnd::Target));
    }

    /// Drop the constraints of every edge for which `live` is false
    pub fn retain_live(&mut self, mut live: impl FnMut(Entity) -> bool) {
        self.sides.retain(|&(edge, _), _| live(edge));
    }

    pub fn len(&self) -> usize {
        self.sides.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sides.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Entity, EdgeEnd, PortSide)> + '_ {
        self.sides.iter().map(|(&(edge, end), &side)| (edge, end, side))
    }
}

impl PortConstraints<Entity> for PortConstraintTable {
    fn side(&self, edge: Entity, end: EdgeEnd) -> Option<PortSide> {
        self.get(edge, end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hecs::World;
    use test_log::test;

    #[test]
    fn none_resets_a_constraint() {
        let mut world = World::new();
        let edge = world.spawn(());
        let mut ports = PortConstraintTable::new();

        ports.set(edge, EdgeEnd::Source, Some(PortSide::North));
        ports.set(edge, EdgeEnd::Target, Some(PortSide::South));
        assert_eq!(ports.get(edge, EdgeEnd::Source), Some(PortSide::North));

        ports.set(edge, EdgeEnd::Source, None);
        assert_eq!(ports.get(edge, EdgeEnd::Source), None);
        assert_eq!(ports.get(edge, EdgeEnd::Target), Some(PortSide::South));
    }

    #[test]
    fn recycled_edges_start_unconstrained() {
        let mut world = World::new();
        let edge = world.spawn(());
        let mut ports = PortConstraintTable::new();
        ports.set(edge, EdgeEnd::Target, Some(PortSide::West));

        world.despawn(edge).unwrap();
        let recycled = world.spawn(());
        assert_eq!(ports.get(recycled, EdgeEnd::Target), None);

        ports.retain_live(|edge| world.contains(edge));
        assert!(ports.is_empty());
    }

    #[test]
    fn removing_an_edge_drops_both_ends() {
        let mut world = World::new();
        let edge = world.spawn(());
        let other = world.spawn(());
        let mut ports = PortConstraintTable::new();
        ports.set(edge, EdgeEnd::Source, Some(PortSide::East));
        ports.set(edge, EdgeEnd::Target, Some(PortSide::West));
        ports.set(other, EdgeEnd::Source, Some(PortSide::North));

        ports.remove_edge(edge);

        assert_eq!(ports.len(), 1);
        assert_eq!(ports.side(other, EdgeEnd::Source), Some(PortSide::North));
    }
}
