use crate::{NodeSizes, Point, Vec2};
use petgraph::graphmap::DiGraphMap;
use petgraph::Direction;
use std::collections::HashMap;
use std::hash::Hash;

/// Assign coordinates to nodes based on their layer structure and sizes
///
/// Layers run along x. Within a layer nodes keep their order and are pulled
/// towards the barycenter of their neighbours in the adjacent layers.
pub(crate) fn assign_coordinates<N, S>(
    layers: &[Vec<N>],
    graph: &DiGraphMap<N, ()>,
    sizes: &S,
    margin: Vec2,
    max_position_iterations: usize,
) -> HashMap<N, Point>
where
    N: Copy + Ord + Hash,
    S: NodeSizes<N>,
{
    let xs = layer_columns(layers, sizes, margin);
    let mut ys = stacked_rows(layers, sizes, margin);

    for _ in 0..max_position_iterations {
        let mut changed = false;

        for layer_idx in (0..layers.len().saturating_sub(1)).rev() {
            changed |= relax_layer(
                &layers[layer_idx],
                &layers[layer_idx + 1],
                Direction::Outgoing,
                graph,
                &mut ys,
                sizes,
                margin,
            );
        }

        if !changed {
            break;
        }
    }

    // Sinks have nothing to follow in the backward sweep, line them up with
    // their predecessors once
    for layer_idx in 1..layers.len() {
        relax_layer(
            &layers[layer_idx],
            &layers[layer_idx - 1],
            Direction::Incoming,
            graph,
            &mut ys,
            sizes,
            margin,
        );
    }

    let min_y = ys.values().copied().reduce(f32::min).unwrap_or(0.0);

    let mut positions = HashMap::new();
    for (layer, (x, width)) in layers.iter().zip(xs) {
        for &node in layer {
            let node_width = sizes.size(node).x;
            let y = ys.get(&node).copied().unwrap_or(0.0) - min_y;
            positions.insert(node, Point::new(x + (width - node_width) / 2.0, y));
        }
    }
    positions
}

/// Left edge and width of every layer column
fn layer_columns<N, S>(layers: &[Vec<N>], sizes: &S, margin: Vec2) -> Vec<(f32, f32)>
where
    N: Copy,
    S: NodeSizes<N>,
{
    let mut x = 0.0;
    layers
        .iter()
        .map(|layer| {
            let width = layer
                .iter()
                .map(|&node| sizes.size(node))
                .fold(Vec2::zero(), Vec2::max)
                .x;
            let column = (x, width);
            x += width + margin.x;
            column
        })
        .collect()
}

/// Initial vertical positioning with uniform spacing
fn stacked_rows<N, S>(layers: &[Vec<N>], sizes: &S, margin: Vec2) -> HashMap<N, f32>
where
    N: Copy + Ord + Hash,
    S: NodeSizes<N>,
{
    let mut ys = HashMap::new();
    for layer in layers {
        let mut y = 0.0;
        for &node in layer {
            ys.insert(node, y);
            y += margin.y + sizes.size(node).y;
        }
    }
    ys
}

/// Move nodes of `layer` to the barycenter of their neighbours in
/// `adjacent`, then push them apart again so they keep their order
fn relax_layer<N, S>(
    layer: &[N],
    adjacent: &[N],
    direction: Direction,
    graph: &DiGraphMap<N, ()>,
    ys: &mut HashMap<N, f32>,
    sizes: &S,
    margin: Vec2,
) -> bool
where
    N: Copy + Ord + Hash,
    S: NodeSizes<N>,
{
    let mut changed = false;

    for &node in layer {
        // Nodes with successors follow them instead
        if direction == Direction::Incoming
            && graph.neighbors_directed(node, Direction::Outgoing).next().is_some()
        {
            continue;
        }
        let Some(new_y) = barycenter(node, adjacent, direction, graph, ys, sizes) else {
            continue;
        };
        if let Some(y) = ys.get_mut(&node) {
            if (new_y - *y).abs() > 0.1 {
                *y = new_y;
                changed = true;
            }
        }
    }

    // Enforce minimum vertical distance between consecutive nodes
    for pair in layer.windows(2) {
        let (prev, curr) = (pair[0], pair[1]);
        let prev_bottom = ys.get(&prev).copied().unwrap_or(0.0) + sizes.size(prev).y;
        if let Some(curr_top) = ys.get_mut(&curr) {
            if *curr_top < prev_bottom + margin.y {
                *curr_top = prev_bottom + margin.y;
                changed = true;
            }
        }
    }

    changed
}

/// Top coordinate that centers `node` on its neighbours in `adjacent`
fn barycenter<N, S>(
    node: N,
    adjacent: &[N],
    direction: Direction,
    graph: &DiGraphMap<N, ()>,
    ys: &HashMap<N, f32>,
    sizes: &S,
) -> Option<f32>
where
    N: Copy + Ord + Hash,
    S: NodeSizes<N>,
{
    let mut sum_y = 0.0;
    let mut count = 0;

    for &other in adjacent {
        let linked = match direction {
            Direction::Outgoing => graph.contains_edge(node, other),
            Direction::Incoming => graph.contains_edge(other, node),
        };
        if let (true, Some(y)) = (linked, ys.get(&other)) {
            sum_y += y + sizes.size(other).y / 2.0;
            count += 1;
        }
    }

    (count > 0).then(|| sum_y / count as f32 - sizes.size(node).y / 2.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layers_are_columns() {
        let mut graph = DiGraphMap::new();
        graph.add_edge(1, 2, ());
        graph.add_edge(1, 3, ());
        let layers = vec![vec![1], vec![2, 3]];
        let sizes = |_: u32| Vec2::new(60.0, 30.0);

        let positions = assign_coordinates(&layers, &graph, &sizes, Vec2::new(20.0, 20.0), 50);

        assert_eq!(positions[&1].x, 0.0);
        assert_eq!(positions[&2].x, 80.0);
        assert_eq!(positions[&3].x, 80.0);
        assert!(positions[&3].y >= positions[&2].y + 50.0);
        // Source sits between its two successors
        let center = positions[&1].y + 15.0;
        assert!(center > positions[&2].y && center < positions[&3].y + 30.0);
    }

    #[test]
    fn positions_start_at_zero() {
        let graph = DiGraphMap::<u32, ()>::new();
        let layers = vec![vec![1, 2]];
        let sizes = |_: u32| Vec2::new(10.0, 10.0);

        let positions = assign_coordinates(&layers, &graph, &sizes, Vec2::new(5.0, 5.0), 10);

        assert_eq!(positions[&1], Point::new(0.0, 0.0));
        assert_eq!(positions[&2], Point::new(0.0, 15.0));
    }
}
