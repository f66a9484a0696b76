//! Edge routing between placed nodes
//!
//! Every edge leaves its source through a port side and enters its target
//! through another. Unconstrained ends follow the flow of the drawing:
//! forward edges go East to West, backward edges West to East and edges
//! inside a layer leave South and enter North (or the reverse when the
//! target sits above the source).

use crate::{EdgeEnd, NodeSizes, Point, PortConstraints, PortSide, Vec2};
use serde::{Deserialize, Serialize};

/// Geometry of a routed edge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeRoute {
    /// Where the edge leaves its source
    pub source: Point,

    /// Where the edge enters its target
    pub target: Point,

    /// Intermediate points, in order from source to target
    pub bends: Vec<Point>,
}

impl EdgeRoute {
    /// All points of the route including both ends
    pub fn points(&self) -> impl Iterator<Item = Point> + '_ {
        std::iter::once(self.source)
            .chain(self.bends.iter().copied())
            .chain(std::iter::once(self.target))
    }
}

/// Where the endpoints of an edge sit
#[derive(Debug, Clone, Copy)]
pub(crate) struct Endpoint {
    pub position: Point,
    pub size: Vec2,
    pub layer: usize,
}

impl Endpoint {
    fn anchor(&self, side: PortSide) -> Point {
        let Vec2 { x: w, y: h } = self.size;
        match side {
            PortSide::North => self.position.offset(w / 2.0, 0.0),
            PortSide::South => self.position.offset(w / 2.0, h),
            PortSide::East => self.position.offset(w, h / 2.0),
            PortSide::West => self.position.offset(0.0, h / 2.0),
        }
    }
}

/// Route one edge
pub(crate) fn route_edge<E, P>(
    edge: E,
    source: Endpoint,
    target: Endpoint,
    is_loop: bool,
    ports: &P,
    stub: f32,
    orthogonal: bool,
) -> EdgeRoute
where
    E: Copy,
    P: PortConstraints<E>,
{
    let (default_source, default_target) = default_sides(&source, &target, is_loop);
    let source_side = ports.side(edge, EdgeEnd::Source).unwrap_or(default_source);
    let target_side = ports.side(edge, EdgeEnd::Target).unwrap_or(default_target);

    let start = source.anchor(source_side);
    let end = target.anchor(target_side);
    if !orthogonal {
        return EdgeRoute {
            source: start,
            target: end,
            bends: Vec::new(),
        };
    }

    let leave = step(start, source_side, stub);
    let enter = step(end, target_side, stub);

    let mut points = vec![start, leave];
    match (source_side.is_horizontal(), target_side.is_horizontal()) {
        (true, true) => {
            let mid = (leave.x + enter.x) / 2.0;
            points.push(Point::new(mid, leave.y));
            points.push(Point::new(mid, enter.y));
        }
        (false, false) => {
            let mid = (leave.y + enter.y) / 2.0;
            points.push(Point::new(leave.x, mid));
            points.push(Point::new(enter.x, mid));
        }
        // Turn where continuing along the stub does not double back
        (true, false) => {
            let (dx, _) = source_side.direction();
            if (enter.x - leave.x) * dx >= 0.0 {
                points.push(Point::new(enter.x, leave.y));
            } else {
                points.push(Point::new(leave.x, enter.y));
            }
        }
        (false, true) => {
            let (_, dy) = source_side.direction();
            if (enter.y - leave.y) * dy >= 0.0 {
                points.push(Point::new(leave.x, enter.y));
            } else {
                points.push(Point::new(enter.x, leave.y));
            }
        }
    }
    points.push(enter);
    points.push(end);

    let points = simplify(points);
    let bends = points[1..points.len() - 1].to_vec();
    EdgeRoute {
        source: start,
        target: end,
        bends,
    }
}

fn default_sides(source: &Endpoint, target: &Endpoint, is_loop: bool) -> (PortSide, PortSide) {
    if is_loop {
        return (PortSide::East, PortSide::North);
    }
    if source.layer < target.layer {
        (PortSide::East, PortSide::West)
    } else if source.layer > target.layer {
        (PortSide::West, PortSide::East)
    } else if source.position.y <= target.position.y {
        (PortSide::South, PortSide::North)
    } else {
        (PortSide::North, PortSide::South)
    }
}

fn step(point: Point, side: PortSide, length: f32) -> Point {
    let (dx, dy) = side.direction();
    point.offset(dx * length, dy * length)
}

/// Drop repeated points and points in the middle of straight runs
fn simplify(points: Vec<Point>) -> Vec<Point> {
    let mut out: Vec<Point> = Vec::with_capacity(points.len());
    for point in points {
        if out.last().is_some_and(|last| close(*last, point)) {
            continue;
        }
        if let [.., a, b] = out[..] {
            let cross = (b.x - a.x) * (point.y - b.y) - (b.y - a.y) * (point.x - b.x);
            let dot = (b.x - a.x) * (point.x - b.x) + (b.y - a.y) * (point.y - b.y);
            // Collinear and heading the same way
            if cross.abs() < f32::EPSILON && dot >= 0.0 {
                out.pop();
            }
        }
        out.push(point);
    }
    out
}

fn close(a: Point, b: Point) -> bool {
    (a.x - b.x).abs() < f32::EPSILON && (a.y - b.y).abs() < f32::EPSILON
}

/// Fetch the endpoint data of a node
pub(crate) fn endpoint<N, S>(
    node: N,
    positions: &std::collections::HashMap<N, Point>,
    layer_of: &std::collections::HashMap<N, usize>,
    sizes: &S,
) -> Option<Endpoint>
where
    N: Copy + Eq + std::hash::Hash,
    S: NodeSizes<N>,
{
    Some(Endpoint {
        position: *positions.get(&node)?,
        size: sizes.size(node),
        layer: *layer_of.get(&node)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn node(x: f32, y: f32, layer: usize) -> Endpoint {
        Endpoint {
            position: Point::new(x, y),
            size: Vec2::new(60.0, 30.0),
            layer,
        }
    }

    fn unconstrained(_: u32, _: EdgeEnd) -> Option<PortSide> {
        None
    }

    #[test]
    fn forward_edge_goes_east_to_west() {
        let route = route_edge(0, node(0.0, 0.0, 0), node(80.0, 0.0, 1), false, &unconstrained, 10.0, true);

        assert_eq!(route.source, Point::new(60.0, 15.0));
        assert_eq!(route.target, Point::new(80.0, 15.0));
        assert!(route.bends.is_empty());
    }

    #[test]
    fn offset_forward_edge_is_orthogonal() {
        let route = route_edge(0, node(0.0, 0.0, 0), node(80.0, 50.0, 1), false, &unconstrained, 10.0, true);

        assert_eq!(route.bends, vec![Point::new(70.0, 15.0), Point::new(70.0, 65.0)]);
        for pair in route.points().collect::<Vec<_>>().windows(2) {
            assert!(pair[0].x == pair[1].x || pair[0].y == pair[1].y);
        }
    }

    #[test]
    fn constrained_source_leaves_north() {
        let ports = HashMap::from([((7u32, EdgeEnd::Source), PortSide::North)]);
        let route = route_edge(7, node(0.0, 100.0, 0), node(80.0, 100.0, 1), false, &ports, 10.0, true);

        assert_eq!(route.source, Point::new(30.0, 100.0));
        assert_eq!(route.bends.first(), Some(&Point::new(30.0, 90.0)));
        assert_eq!(route.target, Point::new(80.0, 115.0));
    }

    #[test]
    fn straight_routes_have_no_bends() {
        let route = route_edge(0, node(0.0, 0.0, 0), node(80.0, 50.0, 1), false, &unconstrained, 10.0, false);

        assert_eq!(route.points().count(), 2);
    }

    #[test]
    fn self_loop_stays_outside() {
        let route = route_edge(0, node(0.0, 0.0, 0), node(0.0, 0.0, 0), true, &unconstrained, 10.0, true);

        assert_eq!(route.source, Point::new(60.0, 15.0));
        assert_eq!(route.target, Point::new(30.0, 0.0));
        assert_eq!(
            route.bends,
            vec![Point::new(70.0, 15.0), Point::new(70.0, -10.0), Point::new(30.0, -10.0)]
        );
    }
}
