//! Multi-source breadth-first wavefront over the grid
//!
//! Costs expand outward from the source cells through a FIFO queue with
//! Euclidean step costs. This is deliberately not Dijkstra: a cell can be
//! settled before its cheapest path arrives, so costs slightly overestimate
//! true distances. The planner's heuristic discount is tuned against
//! exactly this behavior.
//!
//! Each node also tracks the set of source cells it is closest to. Ties
//! merge the sets, a strictly better path replaces the set, so after the
//! sweep a set only contains sources at exactly the node's cost.

use std::collections::{HashSet, VecDeque};

use crate::common::types::{GridNode, Point2D};
use crate::map::grid::{Cell, Map};

/// Expansion safety cap
const MAX_ITERATIONS: usize = 500_000;

/// 4-connected neighbor offsets
pub const DELTAS: [(i32, i32); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];

/// 8-connected neighbor offsets
pub const DELTAS_WITH_CORNERS: [(i32, i32); 8] = [
    (1, 0),
    (1, -1),
    (0, -1),
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

#[derive(Debug, Clone)]
pub struct FlowFieldNode {
    pub cell: GridNode,
    pub world_pos: Point2D,
    pub walkable: bool,
    pub cost: f64,
    /// Region label carried over from the source that reached this node
    pub region: i32,
    /// Source cells at exactly `cost` wavefront distance
    pub closest_sources: HashSet<GridNode>,
    in_open_set: bool,
}

impl FlowFieldNode {
    fn new(cell: GridNode, world_pos: Point2D, walkable: bool) -> Self {
        Self {
            cell,
            world_pos,
            walkable,
            cost: f64::MAX,
            region: -1,
            closest_sources: HashSet::new(),
            in_open_set: false,
        }
    }
}

/// Fresh node layer over the map, with walkability decided per cell
pub fn build_nodes(map: &Map, walkable: impl Fn(&Cell) -> bool) -> Vec<Vec<FlowFieldNode>> {
    (0..map.width)
        .map(|x| {
            (0..map.width)
                .map(|y| {
                    let cell = GridNode::new(x as i32, y as i32);
                    let c = map.cell(cell);
                    FlowFieldNode::new(cell, c.center, walkable(c))
                })
                .collect()
        })
        .collect()
}

fn node(nodes: &[Vec<FlowFieldNode>], cell: GridNode) -> &FlowFieldNode {
    &nodes[cell.x as usize][cell.y as usize]
}

fn node_mut(nodes: &mut [Vec<FlowFieldNode>], cell: GridNode) -> &mut FlowFieldNode {
    &mut nodes[cell.x as usize][cell.y as usize]
}

fn is_within(nodes: &[Vec<FlowFieldNode>], x: i32, y: i32) -> bool {
    x >= 0 && y >= 0 && (x as usize) < nodes.len() && (y as usize) < nodes.len()
}

/// Walkable neighbors of `cell`. Diagonal steps are rejected when either
/// orthogonal cell sharing the corner is unwalkable, so the front cannot
/// slip between two diagonally touching obstacles.
fn walkable_neighbors(
    nodes: &[Vec<FlowFieldNode>],
    cell: GridNode,
    include_corners: bool,
) -> Vec<GridNode> {
    let deltas: &[(i32, i32)] = if include_corners {
        &DELTAS_WITH_CORNERS
    } else {
        &DELTAS
    };
    let mut result = Vec::with_capacity(deltas.len());
    for &(dx, dy) in deltas {
        let x = cell.x + dx;
        let y = cell.y + dy;
        if !is_within(nodes, x, y) || !nodes[x as usize][y as usize].walkable {
            continue;
        }
        if dx != 0 && dy != 0 {
            let side_a = GridNode::new(cell.x + dx, cell.y);
            let side_b = GridNode::new(cell.x, cell.y + dy);
            let blocked = |n: GridNode| {
                !is_within(nodes, n.x, n.y) || !node(nodes, n).walkable
            };
            if blocked(side_a) || blocked(side_b) {
                continue;
            }
        }
        result.push(GridNode::new(x, y));
    }
    result
}

/// Run the wavefront from `sources`. Source nodes may have their `region`
/// preset by the caller; it propagates with the front.
pub fn generate(nodes: &mut Vec<Vec<FlowFieldNode>>, sources: &[GridNode], include_corners: bool) {
    let mut queue: VecDeque<GridNode> = VecDeque::new();

    for &source in sources {
        let n = node_mut(nodes, source);
        n.cost = 0.0;
        n.closest_sources.insert(source);
        if !n.in_open_set {
            n.in_open_set = true;
            queue.push_back(source);
        }
    }

    let mut iterations = 0;
    while let Some(current) = queue.pop_front() {
        iterations += 1;
        if iterations > MAX_ITERATIONS {
            break;
        }
        node_mut(nodes, current).in_open_set = false;

        let (current_cost, current_pos, current_region) = {
            let n = node(nodes, current);
            (n.cost, n.world_pos, n.region)
        };
        let current_sources = node(nodes, current).closest_sources.clone();

        for neighbor in walkable_neighbors(nodes, current, include_corners) {
            let step = current_pos.distance(&node(nodes, neighbor).world_pos);
            let new_cost = current_cost + step;
            let old_cost = node(nodes, neighbor).cost;
            if new_cost > old_cost {
                continue;
            }

            let n = node_mut(nodes, neighbor);
            if new_cost < old_cost {
                n.cost = new_cost;
                n.region = current_region;
                n.closest_sources = current_sources.clone();
            } else {
                // Equal-cost path from a different direction
                n.region = current_region;
                for s in &current_sources {
                    n.closest_sources.insert(*s);
                }
            }
            if !n.in_open_set {
                n.in_open_set = true;
                queue.push_back(neighbor);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_map(width: usize) -> Map {
        Map::new(width, 1.0)
    }

    #[test]
    fn test_single_source_monotone() {
        let map = open_map(10);
        let mut nodes = build_nodes(&map, |_| true);
        generate(&mut nodes, &[GridNode::new(0, 0)], true);

        assert_eq!(nodes[0][0].cost, 0.0);
        // Costs never decrease along a straight line away from the source
        for x in 1..10 {
            assert!(nodes[x][0].cost >= nodes[x - 1][0].cost);
        }
        // Straight-line run accumulates unit steps exactly
        assert!((nodes[5][0].cost - 5.0).abs() < 1e-9);
        // Diagonal steps cost sqrt(2)
        assert!((nodes[1][1].cost - 2f64.sqrt()).abs() < 1e-9);
    }

    #[test]
    fn test_closest_sources_exact_tie() {
        let map = open_map(11);
        let mut nodes = build_nodes(&map, |_| true);
        let a = GridNode::new(0, 5);
        let b = GridNode::new(10, 5);
        generate(&mut nodes, &[a, b], true);

        // Midway cell is reached at the same cost from both sources
        let mid = &nodes[5][5];
        assert!(mid.closest_sources.contains(&a));
        assert!(mid.closest_sources.contains(&b));

        // Off-center cells keep only the nearer source
        let near_a = &nodes[1][5];
        assert!(near_a.closest_sources.contains(&a));
        assert!(!near_a.closest_sources.contains(&b));
    }

    #[test]
    fn test_unwalkable_blocks_front() {
        let map = open_map(5);
        let mut nodes = build_nodes(&map, |_| true);
        // Wall across the middle column
        for y in 0..5 {
            nodes[2][y].walkable = false;
        }
        generate(&mut nodes, &[GridNode::new(0, 2)], true);
        assert_eq!(nodes[4][2].cost, f64::MAX);
        assert_eq!(nodes[2][2].cost, f64::MAX);
    }

    #[test]
    fn test_no_diagonal_corner_cutting() {
        let map = open_map(3);
        let mut nodes = build_nodes(&map, |_| true);
        // Two obstacles touching at a corner between source and target
        nodes[1][0].walkable = false;
        nodes[0][1].walkable = false;
        generate(&mut nodes, &[GridNode::new(0, 0)], true);
        // (1,1) is only reachable by slipping through the corner
        assert_eq!(nodes[1][1].cost, f64::MAX);
    }

    #[test]
    fn test_region_propagates() {
        let map = open_map(6);
        let mut nodes = build_nodes(&map, |_| true);
        nodes[0][0].region = 7;
        generate(&mut nodes, &[GridNode::new(0, 0)], false);
        assert_eq!(nodes[5][5].region, 7);
    }
}
