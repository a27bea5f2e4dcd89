//! Voronoi clearance field
//!
//! Assigns every free cell a value in [0, 1] that falls from 1.0 at
//! obstacles to 0.0 on the medial edges equidistant between obstacle
//! groups. The planner scales its obstacle cost by this value so paths
//! are pushed toward the middle of corridors.
//!
//! Built in five passes: label connected obstacle groups, expand a
//! wavefront from all obstacle cells, mark cells whose neighbor carries a
//! different group label as edges, expand a second wavefront from the edge
//! cells, then evaluate the falloff formula per cell.

use itertools::iproduct;
use ordered_float::OrderedFloat;

use std::collections::{HashSet, VecDeque};

use crate::common::types::{GridNode, Point2D};
use crate::map::flow_field;
use crate::map::grid::Map;

/// Flood-fill safety cap when labeling one obstacle group
const MAX_FILL_ITERATIONS: usize = 100_000;

#[derive(Debug, Clone)]
pub struct VoronoiFieldConfig {
    /// Falloff rate; higher values drop the field faster near obstacles
    pub alpha: f64,
    /// Obstacle distance beyond which the field is exactly zero
    pub max_obstacle_distance: f64,
}

impl Default for VoronoiFieldConfig {
    fn default() -> Self {
        Self {
            alpha: 10.0,
            max_obstacle_distance: 50.0,
        }
    }
}

/// Per-cell Voronoi data
#[derive(Debug, Clone)]
pub struct VoronoiCell {
    /// Label of the closest obstacle group
    pub region: i32,
    /// On the medial edge between two obstacle groups
    pub is_edge: bool,
    pub distance_to_obstacle: f64,
    pub distance_to_edge: f64,
    /// Field value in [0, 1]
    pub value: f64,
    pub closest_obstacle_cells: HashSet<GridNode>,
    pub closest_edge_cells: HashSet<GridNode>,
}

impl Default for VoronoiCell {
    fn default() -> Self {
        Self {
            region: -1,
            is_edge: false,
            distance_to_obstacle: f64::MAX,
            distance_to_edge: f64::MAX,
            value: 0.0,
            closest_obstacle_cells: HashSet::new(),
            closest_edge_cells: HashSet::new(),
        }
    }
}

/// Label 4-connected obstacle groups with consecutive region ids
fn label_obstacle_regions(map: &Map) -> Vec<Vec<i32>> {
    let width = map.width;
    let mut regions = vec![vec![-1i32; width]; width];
    let mut next_region = 0;

    for (x, y) in iproduct!(0..width, 0..width) {
        let start = GridNode::new(x as i32, y as i32);
        if !map.cell(start).is_obstacle || regions[x][y] != -1 {
            continue;
        }
        let mut queue = VecDeque::new();
        regions[x][y] = next_region;
        queue.push_back(start);
        let mut iterations = 0;
        while let Some(cell) = queue.pop_front() {
            iterations += 1;
            if iterations > MAX_FILL_ITERATIONS {
                break;
            }
            for &(dx, dy) in &flow_field::DELTAS {
                let next = GridNode::new(cell.x + dx, cell.y + dy);
                if !map.is_cell_within_grid(next) {
                    continue;
                }
                if map.cell(next).is_obstacle && regions[next.x as usize][next.y as usize] == -1 {
                    regions[next.x as usize][next.y as usize] = next_region;
                    queue.push_back(next);
                }
            }
        }
        next_region += 1;
    }
    regions
}

/// Straight-line distance from `from` to the nearest member of `sources`
fn refined_distance(map: &Map, from: Point2D, sources: &HashSet<GridNode>) -> f64 {
    sources
        .iter()
        .map(|&c| map.cell(c).center.distance(&from))
        .fold(f64::MAX, f64::min)
}

/// Build the field and store it in every cell's `voronoi` slot
pub fn generate(map: &mut Map, config: &VoronoiFieldConfig) {
    let width = map.width;
    let regions = label_obstacle_regions(map);

    // Wavefront from all obstacle cells over the whole grid
    let mut obstacle_nodes = flow_field::build_nodes(map, |_| true);
    let mut sources = Vec::new();
    for (x, y) in iproduct!(0..width, 0..width) {
        if map.cells[x][y].is_obstacle {
            obstacle_nodes[x][y].region = regions[x][y];
            sources.push(GridNode::new(x as i32, y as i32));
        }
    }
    flow_field::generate(&mut obstacle_nodes, &sources, true);

    for (x, y) in iproduct!(0..width, 0..width) {
        let node = &obstacle_nodes[x][y];
        let v = &mut map.cells[x][y].voronoi;
        v.region = node.region;
        v.closest_obstacle_cells = node.closest_sources.clone();
        v.distance_to_obstacle = node.cost;
    }
    // The wavefront cost overestimates off-axis distances; straighten it
    // out against the actual closest obstacle cells
    for (x, y) in iproduct!(0..width, 0..width) {
        let center = map.cells[x][y].center;
        let sources = map.cells[x][y].voronoi.closest_obstacle_cells.clone();
        if !sources.is_empty() {
            map.cells[x][y].voronoi.distance_to_obstacle = refined_distance(map, center, &sources);
        }
    }

    // A free cell bordering a different region sits on the medial edge
    let mut edge_sources = Vec::new();
    for (x, y) in iproduct!(0..width, 0..width) {
        if map.cells[x][y].is_obstacle {
            continue;
        }
        let cell = GridNode::new(x as i32, y as i32);
        let region = map.cells[x][y].voronoi.region;
        let is_edge = flow_field::DELTAS.iter().any(|&(dx, dy)| {
            let n = GridNode::new(cell.x + dx, cell.y + dy);
            map.is_cell_within_grid(n) && map.cell(n).voronoi.region != region
        });
        if is_edge {
            map.cells[x][y].voronoi.is_edge = true;
            edge_sources.push(cell);
        }
    }

    // Second wavefront, from the edges, blocked by obstacles
    let mut edge_nodes = flow_field::build_nodes(map, |c| !c.is_obstacle);
    flow_field::generate(&mut edge_nodes, &edge_sources, true);
    for (x, y) in iproduct!(0..width, 0..width) {
        let v = &mut map.cells[x][y].voronoi;
        v.closest_edge_cells = edge_nodes[x][y].closest_sources.clone();
        v.distance_to_edge = edge_nodes[x][y].cost;
    }
    for (x, y) in iproduct!(0..width, 0..width) {
        let center = map.cells[x][y].center;
        let sources = map.cells[x][y].voronoi.closest_edge_cells.clone();
        if !sources.is_empty() {
            map.cells[x][y].voronoi.distance_to_edge = refined_distance(map, center, &sources);
        }
    }

    for (x, y) in iproduct!(0..width, 0..width) {
        let is_obstacle = map.cells[x][y].is_obstacle;
        let v = &mut map.cells[x][y].voronoi;
        v.value = field_value(v, is_obstacle, config);
    }
}

fn field_value(v: &VoronoiCell, is_obstacle: bool, config: &VoronoiFieldConfig) -> f64 {
    if is_obstacle {
        return 1.0;
    }
    if v.is_edge {
        return 0.0;
    }
    let d_obstacle = v.distance_to_obstacle;
    let d_edge = v.distance_to_edge;
    let d_max = config.max_obstacle_distance;
    if d_obstacle >= d_max {
        return 0.0;
    }
    (config.alpha / (config.alpha + d_obstacle))
        * (d_edge / (d_obstacle + d_edge))
        * ((d_obstacle - d_max).powi(2) / d_max.powi(2))
}

/// World position of the obstacle cell nearest to `pos`, if any
pub fn closest_obstacle_pos(map: &Map, pos: Point2D) -> Option<Point2D> {
    closest_from_set(map, pos, |v| &v.closest_obstacle_cells)
}

/// World position of the edge cell nearest to `pos`, if any
pub fn closest_edge_pos(map: &Map, pos: Point2D) -> Option<Point2D> {
    closest_from_set(map, pos, |v| &v.closest_edge_cells)
}

fn closest_from_set(
    map: &Map,
    pos: Point2D,
    set: impl Fn(&VoronoiCell) -> &HashSet<GridNode>,
) -> Option<Point2D> {
    let cell = map.world_to_cell(pos);
    if !map.is_cell_within_grid(cell) {
        return None;
    }
    set(&map.cell(cell).voronoi)
        .iter()
        .map(|&c| map.cell(c).center)
        .min_by_key(|p| OrderedFloat(p.distance_squared(&pos)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::obstacles::{self, Obstacle};

    fn two_block_map() -> Map {
        let mut map = Map::new(30, 1.0);
        map.obstacles
            .push(Obstacle::new(Point2D::new(7.0, 15.0), 0.0, 3.0, 3.0));
        map.obstacles
            .push(Obstacle::new(Point2D::new(23.0, 15.0), 0.0, 3.0, 3.0));
        obstacles::mark_obstacle_cells(&mut map);
        generate(&mut map, &VoronoiFieldConfig::default());
        map
    }

    #[test]
    fn test_obstacle_cells_have_value_one() {
        let map = two_block_map();
        assert_eq!(map.cell(GridNode::new(7, 15)).voronoi.value, 1.0);
        assert_eq!(map.cell(GridNode::new(0, 10)).voronoi.value, 1.0);
    }

    #[test]
    fn test_edge_cells_have_value_zero() {
        let map = two_block_map();
        // Halfway between the two blocks an edge must exist
        let edge_found = (10..21).any(|y| {
            (13..18).any(|x| {
                let v = &map.cell(GridNode::new(x, y)).voronoi;
                v.is_edge && v.value == 0.0
            })
        });
        assert!(edge_found);
    }

    #[test]
    fn test_value_decreases_away_from_obstacle() {
        let map = two_block_map();
        // Walking from beside the left block toward the midline
        let near = map.cell(GridNode::new(9, 15)).voronoi.value;
        let far = map.cell(GridNode::new(12, 15)).voronoi.value;
        assert!(near > far, "{} should exceed {}", near, far);
        assert!(near > 0.0 && near < 1.0);
    }

    #[test]
    fn test_regions_separate_blocks() {
        let map = two_block_map();
        let left = map.cell(GridNode::new(7, 15)).voronoi.region;
        let right = map.cell(GridNode::new(23, 15)).voronoi.region;
        assert_ne!(left, right);
        assert!(left >= 0 && right >= 0);
    }

    #[test]
    fn test_closest_obstacle_pos() {
        let map = two_block_map();
        let probe = Point2D::new(9.5, 15.5);
        let closest = closest_obstacle_pos(&map, probe);
        assert!(closest.is_some());
        if let Some(p) = closest {
            // Nearest obstacle cell belongs to the left block
            assert!(p.x < 10.0);
        }
        assert!(closest_obstacle_pos(&map, Point2D::new(-5.0, 0.0)).is_none());
    }
}
