//! Heuristic field for the Hybrid A* search
//!
//! Two precomputed layers are combined per cell: straight-line distance to
//! the goal and a discounted wavefront distance that knows about
//! obstacles. The discount compensates for the wavefront's overestimate,
//! keeping the heuristic admissible in practice. A third, path-constrained
//! layer (Reeds-Shepp distance) is mixed in lazily during the search,
//! close to the goal, where turning constraints dominate.

use itertools::iproduct;

use crate::common::types::GridNode;
use crate::map::flow_field;
use crate::map::grid::Map;

/// Correction factor for the wavefront distance overestimate
pub const WAVEFRONT_DISCOUNT: f64 = 0.92621;

/// Heuristic assigned to obstacle cells
pub const OBSTACLE_HEURISTIC: f64 = 10_000.0;

/// Within this wavefront distance of the goal the search also consults
/// the Reeds-Shepp distance
pub const REEDS_SHEPP_HEURISTIC_DISTANCE: f64 = 20.0;

/// Fill `distance_to_goal` and `heuristic` for every cell
pub fn generate(map: &mut Map, goal: GridNode) {
    let width = map.width;
    let goal_pos = map.cell(goal).center;

    for (x, y) in iproduct!(0..width, 0..width) {
        let center = map.cells[x][y].center;
        if map.cells[x][y].is_obstacle {
            map.cells[x][y].heuristic = OBSTACLE_HEURISTIC;
        } else {
            map.cells[x][y].heuristic = center.distance(&goal_pos);
        }
    }

    let mut nodes = flow_field::build_nodes(map, |c| !c.is_obstacle);
    flow_field::generate(&mut nodes, &[goal], true);

    for (x, y) in iproduct!(0..width, 0..width) {
        if map.cells[x][y].is_obstacle {
            continue;
        }
        let wavefront = nodes[x][y].cost;
        map.cells[x][y].distance_to_goal = wavefront;
        let euclidean = map.cells[x][y].heuristic;
        map.cells[x][y].heuristic = euclidean.max(wavefront * WAVEFRONT_DISCOUNT);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::types::Point2D;
    use crate::map::obstacles::{self, Obstacle};

    #[test]
    fn test_open_map_heuristic_is_euclidean_or_better() {
        let mut map = Map::new(20, 1.0);
        obstacles::mark_obstacle_cells(&mut map);
        let goal = GridNode::new(10, 10);
        generate(&mut map, goal);

        let cell = map.cell(GridNode::new(5, 10));
        let euclid = cell.center.distance(&map.cell(goal).center);
        assert!(cell.heuristic >= euclid - 1e-9);
        assert_eq!(map.cell(goal).heuristic, 0.0);
    }

    #[test]
    fn test_obstacle_cells_get_fixed_heuristic() {
        let mut map = Map::new(20, 1.0);
        map.obstacles
            .push(Obstacle::new(Point2D::new(10.0, 10.0), 0.0, 3.0, 3.0));
        obstacles::mark_obstacle_cells(&mut map);
        generate(&mut map, GridNode::new(15, 15));
        assert_eq!(map.cell(GridNode::new(10, 10)).heuristic, OBSTACLE_HEURISTIC);
        assert_eq!(map.cell(GridNode::new(0, 0)).heuristic, OBSTACLE_HEURISTIC);
    }

    #[test]
    fn test_wall_raises_heuristic_above_euclidean() {
        let mut map = Map::new(30, 1.0);
        // Vertical wall with a gap only at the bottom
        map.obstacles
            .push(Obstacle::new(Point2D::new(15.0, 18.0), 0.0, 22.0, 1.5));
        obstacles::mark_obstacle_cells(&mut map);
        let goal = GridNode::new(25, 15);
        generate(&mut map, goal);

        let blocked_side = map.cell(GridNode::new(5, 15));
        let euclid = blocked_side.center.distance(&map.cell(goal).center);
        assert!(blocked_side.heuristic > euclid);
        assert!(blocked_side.distance_to_goal > euclid);
    }
}
