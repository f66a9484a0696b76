use crate::IncrementalHints;
use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;
use petgraph::visit::{depth_first_search, DfsEvent, IntoNeighborsDirected, IntoNodeIdentifiers};
use petgraph::Direction;
use std::collections::{HashMap, HashSet};
use std::hash::Hash;

/// Outcome of layer assignment
#[derive(Debug)]
pub(crate) struct Layering<N> {
    /// Nodes grouped into dense layers, first layer first
    pub layers: Vec<Vec<N>>,

    /// Reported id of each dense layer
    pub layer_ids: Vec<i32>,

    /// Whether `layer_ids` had to be renumbered from zero
    pub renumbered: bool,
}

/// Assign layers honouring the given layers of fixed nodes
///
/// Every fixed layer id occupies an even slot `2 * rank`, so a free node can
/// either join a fixed layer or open a new one on an odd slot in between.
/// Free nodes are visited in topological order of the free subgraph and land
/// on the earliest slot after all of their placed predecessors. If that
/// would put them behind a fixed successor they open a layer right before it
/// instead. Cycles among free nodes are broken at DFS back edges.
pub(crate) fn assign_layers<G, E>(graph: &G, hints: &IncrementalHints<G::NodeId, E>) -> Layering<G::NodeId>
where
    G: IntoNodeIdentifiers + IntoNeighborsDirected,
    G::NodeId: Copy + Ord + Hash,
    E: Eq + Hash,
{
    let mut nodes: Vec<_> = graph.node_identifiers().collect();
    nodes.sort();

    let mut fixed_ids: Vec<i32> = nodes
        .iter()
        .filter(|&&node| hints.is_fixed(node))
        .filter_map(|node| hints.given_layers.get(node).copied())
        .collect();
    fixed_ids.sort_unstable();
    fixed_ids.dedup();
    let max_fixed_slot = fixed_ids.len() as i64 * 2 - 2;

    let mut slots: HashMap<G::NodeId, i64> = HashMap::new();
    let mut free = DiGraphMap::<G::NodeId, ()>::new();
    for &node in &nodes {
        let given = hints
            .given_layers
            .get(&node)
            .filter(|_| hints.is_fixed(node))
            .and_then(|id| fixed_ids.binary_search(id).ok());
        match given {
            Some(rank) => {
                slots.insert(node, rank as i64 * 2);
            }
            None => {
                free.add_node(node);
            }
        }
    }

    let free_nodes: Vec<_> = free.nodes().collect();
    for &node in &free_nodes {
        for succ in graph.neighbors_directed(node, Direction::Outgoing) {
            if succ != node && free.contains_node(succ) {
                free.add_edge(node, succ, ());
            }
        }
    }

    let mut back_edges = HashSet::new();
    depth_first_search(&free, free_nodes.iter().copied(), |event| {
        if let DfsEvent::BackEdge(from, to) = event {
            back_edges.insert((from, to));
        }
    });
    for &(from, to) in &back_edges {
        free.remove_edge(from, to);
    }
    // Acyclic once the back edges are gone
    let order = toposort(&free, None).unwrap_or(free_nodes);

    for node in order {
        let after_preds = graph
            .neighbors_directed(node, Direction::Incoming)
            .filter(|&pred| pred != node && !back_edges.contains(&(pred, node)))
            .filter_map(|pred| slots.get(&pred).copied())
            .max()
            .map(|slot| slot + 1);
        let before_succs = graph
            .neighbors_directed(node, Direction::Outgoing)
            .filter(|&succ| succ != node && hints.is_fixed(succ))
            .filter_map(|succ| slots.get(&succ).copied())
            .min()
            .map(|slot| slot - 1);

        let slot = match (after_preds, before_succs) {
            (Some(lo), hi) => {
                // Prefer joining an existing fixed layer
                let even = lo + (lo & 1);
                if even <= max_fixed_slot && hi.map_or(true, |hi| even <= hi) {
                    even
                } else {
                    lo
                }
            }
            (None, Some(hi)) => {
                let even = hi - (hi & 1);
                if even >= 0 {
                    even
                } else {
                    hi
                }
            }
            (None, None) => 0,
        };
        slots.insert(node, slot);
    }

    let mut distinct: Vec<i64> = slots.values().copied().collect();
    distinct.sort_unstable();
    distinct.dedup();

    let mut layers = vec![Vec::new(); distinct.len()];
    for &node in &nodes {
        if let Some(index) = slots
            .get(&node)
            .and_then(|slot| distinct.binary_search(slot).ok())
        {
            layers[index].push(node);
        }
    }

    let (layer_ids, renumbered) = layer_ids(&distinct, &fixed_ids);
    Layering {
        layers,
        layer_ids,
        renumbered,
    }
}

/// Map occupied slots back to layer ids
///
/// Fixed slots report their given id. Runs of new layers take consecutive
/// free integers next to their fixed neighbours; when a run does not fit
/// between two fixed ids every layer is renumbered densely.
fn layer_ids(slots: &[i64], fixed_ids: &[i32]) -> (Vec<i32>, bool) {
    let dense = || (0..slots.len() as i32).collect::<Vec<_>>();
    if fixed_ids.is_empty() {
        return (dense(), false);
    }

    let fixed_id = |slot: i64| {
        if slot >= 0 && slot % 2 == 0 {
            fixed_ids.get((slot / 2) as usize).copied()
        } else {
            None
        }
    };

    let mut ids = vec![0; slots.len()];
    let mut start = 0;
    while start < slots.len() {
        if let Some(id) = fixed_id(slots[start]) {
            ids[start] = id;
            start += 1;
            continue;
        }

        let mut end = start;
        while end < slots.len() && fixed_id(slots[end]).is_none() {
            end += 1;
        }
        // Widened so runs next to the extreme ids cannot overflow
        let run = (end - start) as i64;
        let before = start
            .checked_sub(1)
            .and_then(|prev| fixed_id(slots[prev]))
            .map(i64::from);
        let after = slots.get(end).and_then(|&slot| fixed_id(slot)).map(i64::from);

        let first = match (before, after) {
            (Some(prev), Some(next)) if next - prev - 1 >= run => prev + 1,
            (Some(_), Some(_)) => return (dense(), true),
            (Some(prev), None) => prev + 1,
            (None, Some(next)) => next - run,
            (None, None) => 0,
        };
        for (offset, id) in ids[start..end].iter_mut().enumerate() {
            match i32::try_from(first + offset as i64) {
                Ok(value) => *id = value,
                Err(_) => return (dense(), true),
            }
        }
        start = end;
    }

    (ids, false)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph(edges: &[(u32, u32)], nodes: &[u32]) -> DiGraphMap<u32, ()> {
        let mut graph = DiGraphMap::new();
        for &node in nodes {
            graph.add_node(node);
        }
        for &(a, b) in edges {
            graph.add_edge(a, b, ());
        }
        graph
    }

    fn layer_of(layering: &Layering<u32>, node: u32) -> i32 {
        let index = layering
            .layers
            .iter()
            .position(|layer| layer.contains(&node))
            .unwrap();
        layering.layer_ids[index]
    }

    #[test]
    fn given_layers_are_kept() {
        let graph = graph(&[(1, 2), (2, 3), (1, 4)], &[1, 2, 3, 4]);
        let hints = IncrementalHints::<u32, u32>::given([(1, 0), (2, 1), (3, 2), (4, 2)]);

        let layering = assign_layers(&&graph, &hints);

        assert_eq!(layering.layers, vec![vec![1], vec![2], vec![3, 4]]);
        assert_eq!(layering.layer_ids, vec![0, 1, 2]);
        assert!(!layering.renumbered);
    }

    #[test]
    fn sparse_given_ids_are_reported_back() {
        let graph = graph(&[(1, 2)], &[1, 2, 3]);
        let hints = IncrementalHints::<u32, u32>::given([(1, 0), (2, 4), (3, 3)]);

        let layering = assign_layers(&&graph, &hints);

        assert_eq!(layering.layer_ids, vec![0, 3, 4]);
        assert_eq!(layer_of(&layering, 2), 4);
    }

    #[test]
    fn free_node_joins_next_fixed_layer() {
        let graph = graph(&[(1, 5)], &[1, 2, 5]);
        let mut hints = IncrementalHints::<u32, u32>::given([(1, 0), (2, 1)]);
        hints.incremental_nodes.insert(5);

        let layering = assign_layers(&&graph, &hints);

        assert_eq!(layer_of(&layering, 5), 1);
        assert_eq!(layering.layers.len(), 2);
    }

    #[test]
    fn free_node_opens_layer_before_fixed_successor() {
        // 1 -> 5 -> 2 with 1 and 2 in adjacent given layers 0 and 2
        let graph = graph(&[(1, 5), (5, 2)], &[1, 2, 5]);
        let mut hints = IncrementalHints::<u32, u32>::given([(1, 0), (2, 2)]);
        hints.incremental_nodes.insert(5);

        let layering = assign_layers(&&graph, &hints);

        assert_eq!(layering.layers.len(), 3);
        assert_eq!(layer_of(&layering, 5), 1);
        assert!(!layering.renumbered);
    }

    #[test]
    fn renumbers_when_no_id_is_free() {
        let graph = graph(&[(1, 5), (5, 2)], &[1, 2, 5]);
        let mut hints = IncrementalHints::<u32, u32>::given([(1, 0), (2, 1)]);
        hints.incremental_nodes.insert(5);

        let layering = assign_layers(&&graph, &hints);

        assert!(layering.renumbered);
        assert_eq!(layering.layer_ids, vec![0, 1, 2]);
        assert_eq!(layer_of(&layering, 1), 0);
        assert_eq!(layer_of(&layering, 5), 1);
        assert_eq!(layer_of(&layering, 2), 2);
    }

    #[test]
    fn renumbers_instead_of_overflowing() {
        // 5 follows the last layer, 6 precedes the first one
        let graph = graph(&[(1, 5), (6, 2)], &[1, 2, 5, 6]);
        let mut hints = IncrementalHints::<u32, u32>::given([(1, i32::MAX), (2, i32::MIN)]);
        hints.incremental_nodes.extend([5, 6]);

        let layering = assign_layers(&&graph, &hints);

        assert!(layering.renumbered);
        assert_eq!(layering.layer_ids, vec![0, 1, 2, 3]);
        assert_eq!(layer_of(&layering, 6), 0);
        assert_eq!(layer_of(&layering, 2), 1);
        assert_eq!(layer_of(&layering, 1), 2);
        assert_eq!(layer_of(&layering, 5), 3);
    }

    #[test]
    fn all_free_is_longest_path_layering() {
        let graph = graph(&[(1, 2), (2, 3), (1, 3)], &[1, 2, 3]);
        let hints = IncrementalHints::<u32, u32>::default();

        let layering = assign_layers(&&graph, &hints);

        assert_eq!(layering.layers, vec![vec![1], vec![2], vec![3]]);
    }

    #[test]
    fn free_cycles_are_broken() {
        let graph = graph(&[(1, 2), (2, 3), (3, 1)], &[1, 2, 3]);
        let hints = IncrementalHints::<u32, u32>::default();

        let layering = assign_layers(&&graph, &hints);

        assert_eq!(layering.layers.len(), 3);
        assert_eq!(layer_of(&layering, 1), 0);
        assert_eq!(layer_of(&layering, 3), 2);
    }
}
