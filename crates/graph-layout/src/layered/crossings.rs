use petgraph::visit::IntoNeighborsDirected;
use petgraph::Direction;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::hash::Hash;

/// Put every layer in its starting order
///
/// Nodes with a sequence hint keep the order of their previous coordinate,
/// the others follow sorted by identity and are left to crossing
/// minimization.
pub(crate) fn initial_order<N>(layers: &mut [Vec<N>], sequence: &HashMap<N, f32>)
where
    N: Copy + Ord + Hash,
{
    for layer in layers {
        layer.sort_by(|a, b| match (sequence.get(a), sequence.get(b)) {
            (Some(ya), Some(yb)) => ya.total_cmp(yb).then(a.cmp(b)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => a.cmp(b),
        });
    }
}

/// Minimize edge crossings by swapping adjacent nodes in layers
///
/// Uses a greedy local search approach with multiple iterations. A swap is
/// only considered when at least one of the two nodes is `movable`, so the
/// relative order of the other nodes never changes.
pub(crate) fn minimize_crossings<G, F>(
    graph: &G,
    mut layers: Vec<Vec<G::NodeId>>,
    max_iterations: usize,
    movable: F,
) -> (Vec<Vec<G::NodeId>>, usize)
where
    G: IntoNeighborsDirected,
    G::NodeId: Copy + Ord + Hash,
    F: Fn(G::NodeId) -> bool,
{
    for _ in 0..max_iterations {
        let mut improved = false;

        for layer_index in 0..layers.len() {
            let layer_len = layers[layer_index].len();
            for i in 0..layer_len.saturating_sub(1) {
                let (left, right) = (layers[layer_index][i], layers[layer_index][i + 1]);
                if !movable(left) && !movable(right) {
                    continue;
                }

                let crossings_before = count_crossings(graph, &layers);
                layers[layer_index].swap(i, i + 1);
                let crossings_after = count_crossings(graph, &layers);

                if crossings_after < crossings_before {
                    improved = true;
                } else {
                    layers[layer_index].swap(i, i + 1);
                }
            }
        }

        if !improved {
            break;
        }
    }

    let crossings = count_crossings(graph, &layers);
    (layers, crossings)
}

/// Count the number of crossings between edges joining adjacent layers
pub(crate) fn count_crossings<G>(graph: &G, layers: &[Vec<G::NodeId>]) -> usize
where
    G: IntoNeighborsDirected,
    G::NodeId: Copy + Ord + Hash,
{
    let mut crossings = 0;

    for pair in layers.windows(2) {
        let lower: HashMap<_, _> = pair[1]
            .iter()
            .enumerate()
            .map(|(index, &node)| (node, index))
            .collect();

        let segments: Vec<(usize, usize)> = pair[0]
            .iter()
            .enumerate()
            .flat_map(|(upper, &node)| {
                graph
                    .neighbors_directed(node, Direction::Outgoing)
                    .filter_map(|target| lower.get(&target).map(|&index| (upper, index)))
                    .collect::<Vec<_>>()
            })
            .collect();

        for (i, &(upper1, lower1)) in segments.iter().enumerate() {
            for &(upper2, lower2) in &segments[i + 1..] {
                if upper1 != upper2 && (upper1 < upper2) != (lower1 < lower2) && lower1 != lower2 {
                    crossings += 1;
                }
            }
        }
    }

    crossings
}
