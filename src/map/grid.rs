//! Square occupancy grid anchored at the world origin
//!
//! Cells carry precomputed field values (obstacle clearance, Voronoi
//! value, goal heuristics) that the planner reads during search.

use crate::common::types::{GridNode, Point2D};
use crate::map::obstacles::Obstacle;
use crate::map::voronoi_field::VoronoiCell;

/// One grid cell with its precomputed field values
#[derive(Debug, Clone)]
pub struct Cell {
    /// World position of the cell center
    pub center: Point2D,
    pub is_obstacle: bool,
    /// Indices into `Map::obstacles` of the obstacles covering this cell
    pub obstacle_ids: Vec<usize>,
    /// Wavefront distance to the nearest obstacle cell
    pub distance_to_obstacle: f64,
    /// Wavefront distance to the goal, filled by the heuristics pass
    pub distance_to_goal: f64,
    /// Final heuristic value used by the planner
    pub heuristic: f64,
    pub voronoi: VoronoiCell,
}

impl Cell {
    fn new(center: Point2D) -> Self {
        Self {
            center,
            is_obstacle: false,
            obstacle_ids: Vec::new(),
            distance_to_obstacle: f64::MAX,
            distance_to_goal: f64::MAX,
            heuristic: 0.0,
            voronoi: VoronoiCell::default(),
        }
    }
}

/// Square grid of `width` x `width` cells, lower-left corner at (0, 0)
#[derive(Debug, Clone)]
pub struct Map {
    pub width: usize,
    pub cell_width: f64,
    pub cells: Vec<Vec<Cell>>,
    pub obstacles: Vec<Obstacle>,
}

impl Map {
    pub fn new(width: usize, cell_width: f64) -> Self {
        let cells = (0..width)
            .map(|x| {
                (0..width)
                    .map(|y| {
                        Cell::new(Point2D::new(
                            (x as f64 + 0.5) * cell_width,
                            (y as f64 + 0.5) * cell_width,
                        ))
                    })
                    .collect()
            })
            .collect();
        Self {
            width,
            cell_width,
            cells,
            obstacles: Vec::new(),
        }
    }

    pub fn world_to_cell(&self, pos: Point2D) -> GridNode {
        GridNode::new(
            (pos.x / self.cell_width).floor() as i32,
            (pos.y / self.cell_width).floor() as i32,
        )
    }

    pub fn is_cell_within_grid(&self, cell: GridNode) -> bool {
        cell.x >= 0 && cell.y >= 0 && (cell.x as usize) < self.width && (cell.y as usize) < self.width
    }

    pub fn is_pos_within_grid(&self, pos: Point2D) -> bool {
        self.is_cell_within_grid(self.world_to_cell(pos))
    }

    /// Panics if `cell` is outside the grid; check bounds first.
    pub fn cell(&self, cell: GridNode) -> &Cell {
        &self.cells[cell.x as usize][cell.y as usize]
    }

    pub fn cell_mut(&mut self, cell: GridNode) -> &mut Cell {
        &mut self.cells[cell.x as usize][cell.y as usize]
    }

    /// Indices of the obstacles covering this cell
    pub fn cell_obstacles(&self, cell: GridNode) -> &[usize] {
        &self.cell(cell).obstacle_ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_world_to_cell() {
        let map = Map::new(10, 1.0);
        assert_eq!(map.world_to_cell(Point2D::new(0.5, 0.5)), GridNode::new(0, 0));
        assert_eq!(map.world_to_cell(Point2D::new(9.9, 3.2)), GridNode::new(9, 3));
        assert!(!map.is_cell_within_grid(map.world_to_cell(Point2D::new(10.1, 3.0))));
        assert!(!map.is_pos_within_grid(Point2D::new(-0.1, 3.0)));
    }

    #[test]
    fn test_cell_centers() {
        let map = Map::new(4, 2.0);
        let c = map.cell(GridNode::new(1, 2));
        assert!((c.center.x - 3.0).abs() < 1e-10);
        assert!((c.center.y - 5.0).abs() < 1e-10);
    }
}
