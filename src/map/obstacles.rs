//! Obstacles: occupancy marking, clearance field, collision queries

use std::collections::{HashSet, VecDeque};

use rand::rngs::StdRng;
use rand_distr::{Distribution, Uniform};

use crate::common::types::{GridNode, Point2D};
use crate::geometry::{closest_point_on_segment, rectangles_intersect, Rectangle};
use crate::map::flow_field;
use crate::map::grid::Map;
use crate::vehicle::CarSpec;

/// Inflation added to the vehicle footprint during collision checks
pub const MARGIN_OF_SAFETY: f64 = 1.0;

/// Flood-fill safety cap when marking one obstacle's cells
const MAX_FILL_ITERATIONS: usize = 100_000;

/// Oriented rectangular obstacle
#[derive(Debug, Clone)]
pub struct Obstacle {
    pub center: Point2D,
    pub heading: f64,
    pub width: f64,
    pub length: f64,
    pub corners: Rectangle,
}

impl Obstacle {
    pub fn new(center: Point2D, heading: f64, width: f64, length: f64) -> Self {
        Self {
            center,
            heading,
            width,
            length,
            corners: Rectangle::from_pose(center, heading, width, length),
        }
    }

    /// Shortest distance from `p` to the obstacle boundary
    pub fn distance_to(&self, p: Point2D) -> f64 {
        let c = &self.corners;
        let edges = [
            (c.front_left, c.front_right),
            (c.front_right, c.back_right),
            (c.back_right, c.back_left),
            (c.back_left, c.front_left),
        ];
        edges
            .iter()
            .map(|&(a, b)| closest_point_on_segment(a, b, p).distance(&p))
            .fold(f64::MAX, f64::min)
    }
}

/// Footprint of a single cell as an axis-aligned rectangle
fn cell_rectangle(center: Point2D, cell_width: f64) -> Rectangle {
    Rectangle::from_pose(center, 0.0, cell_width, cell_width)
}

pub fn is_cell_intersecting_rectangle(center: Point2D, cell_width: f64, rect: &Rectangle) -> bool {
    rectangles_intersect(&cell_rectangle(center, cell_width), rect)
}

/// Mark every cell covered by an obstacle, plus the map border.
///
/// Each obstacle is filled outward from its center cell; only cells whose
/// footprint intersects the obstacle rectangle are marked and expanded.
/// Obstacles whose center falls outside the grid are skipped.
pub fn mark_obstacle_cells(map: &mut Map) {
    let width = map.width;
    for x in 0..width {
        for y in 0..width {
            if x == 0 || y == 0 || x == width - 1 || y == width - 1 {
                map.cells[x][y].is_obstacle = true;
            }
        }
    }

    for i in 0..map.obstacles.len() {
        let rect = map.obstacles[i].corners;
        let start = map.world_to_cell(map.obstacles[i].center);
        if !map.is_cell_within_grid(start) {
            println!("Skipping obstacle {} with center outside the grid", i);
            continue;
        }

        let mut queue: VecDeque<GridNode> = VecDeque::new();
        let mut visited: HashSet<GridNode> = HashSet::new();
        queue.push_back(start);
        visited.insert(start);

        let mut iterations = 0;
        while let Some(cell) = queue.pop_front() {
            iterations += 1;
            if iterations > MAX_FILL_ITERATIONS {
                break;
            }
            if !is_cell_intersecting_rectangle(map.cell(cell).center, map.cell_width, &rect) {
                continue;
            }
            let c = map.cell_mut(cell);
            c.is_obstacle = true;
            c.obstacle_ids.push(i);

            for &(dx, dy) in &flow_field::DELTAS {
                let next = GridNode::new(cell.x + dx, cell.y + dy);
                if map.is_cell_within_grid(next) && visited.insert(next) {
                    queue.push_back(next);
                }
            }
        }
    }
}

/// Fill `distance_to_obstacle` for every cell with a wavefront expanding
/// from all obstacle cells. All cells are walkable for this pass so the
/// distance is defined everywhere.
pub fn generate_obstacle_distance_field(map: &mut Map) {
    let mut nodes = flow_field::build_nodes(map, |_| true);
    let sources: Vec<GridNode> = (0..map.width as i32)
        .flat_map(|x| (0..map.width as i32).map(move |y| GridNode::new(x, y)))
        .filter(|&c| map.cell(c).is_obstacle)
        .collect();
    flow_field::generate(&mut nodes, &sources, true);
    for x in 0..map.width {
        for y in 0..map.width {
            map.cells[x][y].distance_to_obstacle = nodes[x][y].cost;
        }
    }
}

/// Whether a vehicle at this rear-wheel position collides with the map
/// boundary or an obstacle. The footprint is inflated by the safety
/// margin; a clearance-field early accept skips the rectangle tests when
/// the vehicle is far from everything.
pub fn is_car_position_blocked(map: &Map, rear_wheel: Point2D, heading: f64, car: &CarSpec) -> bool {
    let cell = map.world_to_cell(rear_wheel);
    if !map.is_cell_within_grid(cell) {
        return true;
    }

    let rect = Rectangle::from_pose(
        car.center_pos(rear_wheel, heading),
        heading,
        car.width + MARGIN_OF_SAFETY,
        car.car_length() + MARGIN_OF_SAFETY,
    );
    let mut corner_cells: HashSet<GridNode> = HashSet::new();
    for corner in rect.corners().iter() {
        corner_cells.insert(map.world_to_cell(*corner));
    }
    for c in corner_cells {
        if !map.is_cell_within_grid(c) {
            return true;
        }
    }

    if map.cell(cell).distance_to_obstacle > car.car_length() * 0.7 {
        return false;
    }

    map.obstacles
        .iter()
        .any(|o| rectangles_intersect(&rect, &o.corners))
}

/// Whether a trailer overlaps the tractor's cabin. The trailer footprint
/// is slightly narrowed and the cabin slightly shortened so the bodies can
/// articulate without false positives at the hinge.
pub fn is_trailer_colliding_with_tractor(
    tractor: &CarSpec,
    tractor_pivot: Point2D,
    tractor_heading: f64,
    trailer: &CarSpec,
    trailer_pivot: Point2D,
    trailer_heading: f64,
) -> bool {
    let trailer_rect = Rectangle::from_pose(
        trailer.center_pos(trailer_pivot, trailer_heading),
        trailer_heading,
        trailer.width * 0.9,
        trailer.car_length(),
    );
    let cabin_rect = Rectangle::from_pose(
        tractor.cabin_center(tractor_pivot, tractor_heading),
        tractor_heading,
        tractor.width,
        tractor.cabin_length * 0.95,
    );
    rectangles_intersect(&trailer_rect, &cabin_rect)
}

/// Add `count` random obstacles, rejecting any that overlap `keep_clear`.
pub fn add_random_obstacles(
    map: &mut Map,
    rng: &mut StdRng,
    count: usize,
    min_size: f64,
    max_size: f64,
    keep_clear: &Rectangle,
) {
    let world_width = map.width as f64 * map.cell_width;
    let pos_dist = Uniform::new(0.0, world_width);
    let heading_dist = Uniform::new(0.0, 2.0 * std::f64::consts::PI);
    let size_dist = Uniform::new(min_size, max_size);

    let mut added = 0;
    // Rejection sampling, bounded so a crowded map cannot loop forever
    let mut attempts = 0;
    while added < count && attempts < count * 100 {
        attempts += 1;
        let obstacle = Obstacle::new(
            Point2D::new(pos_dist.sample(rng), pos_dist.sample(rng)),
            heading_dist.sample(rng),
            size_dist.sample(rng),
            size_dist.sample(rng),
        );
        if rectangles_intersect(&obstacle.corners, keep_clear) {
            continue;
        }
        map.obstacles.push(obstacle);
        added += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn map_with_block() -> Map {
        let mut map = Map::new(20, 1.0);
        map.obstacles
            .push(Obstacle::new(Point2D::new(10.0, 10.0), 0.0, 4.0, 4.0));
        mark_obstacle_cells(&mut map);
        generate_obstacle_distance_field(&mut map);
        map
    }

    #[test]
    fn test_border_marked_as_obstacle() {
        let map = map_with_block();
        assert!(map.cell(GridNode::new(0, 5)).is_obstacle);
        assert!(map.cell(GridNode::new(19, 19)).is_obstacle);
        assert!(!map.cell(GridNode::new(3, 3)).is_obstacle);
    }

    #[test]
    fn test_obstacle_cells_marked_and_recorded() {
        let map = map_with_block();
        let center = GridNode::new(10, 10);
        assert!(map.cell(center).is_obstacle);
        assert_eq!(map.cell_obstacles(center), &[0]);
        // 4x4 obstacle centered between cells covers at least a 4x4 block
        assert!(map.cell(GridNode::new(8, 8)).is_obstacle);
        assert!(map.cell(GridNode::new(11, 11)).is_obstacle);
        assert!(!map.cell(GridNode::new(5, 10)).is_obstacle);
    }

    #[test]
    fn test_distance_field_zero_on_obstacles() {
        let map = map_with_block();
        assert_eq!(map.cell(GridNode::new(10, 10)).distance_to_obstacle, 0.0);
        assert_eq!(map.cell(GridNode::new(0, 0)).distance_to_obstacle, 0.0);
        let free = map.cell(GridNode::new(4, 10)).distance_to_obstacle;
        assert!(free > 0.0 && free < f64::MAX);
    }

    #[test]
    fn test_car_blocked_on_obstacle() {
        let map = map_with_block();
        let car = CarSpec::passenger_car();
        assert!(is_car_position_blocked(
            &map,
            Point2D::new(10.0, 10.0),
            0.0,
            &car
        ));
        assert!(!is_car_position_blocked(
            &map,
            Point2D::new(4.0, 4.0),
            0.0,
            &car
        ));
        // Outside the grid is always blocked
        assert!(is_car_position_blocked(
            &map,
            Point2D::new(-1.0, 4.0),
            0.0,
            &car
        ));
    }

    #[test]
    fn test_trailer_jackknife_collides() {
        let tractor = CarSpec::semi_tractor();
        let trailer = CarSpec::trailer();
        let pivot = Point2D::new(50.0, 50.0);
        let attachment = tractor.trailer_attachment_point(pivot, 0.0);

        // Trailer folded back over the cabin
        let folded_heading = std::f64::consts::PI * 0.92;
        assert!(is_trailer_colliding_with_tractor(
            &tractor,
            pivot,
            0.0,
            &trailer,
            attachment,
            folded_heading,
        ));

        // Trailer trailing straight behind
        assert!(!is_trailer_colliding_with_tractor(
            &tractor,
            pivot,
            0.0,
            &trailer,
            attachment,
            0.0,
        ));
    }

    #[test]
    fn test_random_obstacles_avoid_clear_zone() {
        let mut map = Map::new(40, 1.0);
        let mut rng = StdRng::seed_from_u64(7);
        let keep_clear = Rectangle::from_pose(Point2D::new(20.0, 20.0), 0.0, 10.0, 10.0);
        add_random_obstacles(&mut map, &mut rng, 15, 1.0, 4.0, &keep_clear);
        assert!(!map.obstacles.is_empty());
        for o in &map.obstacles {
            assert!(!rectangles_intersect(&o.corners, &keep_clear));
        }
    }

    #[test]
    fn test_obstacle_distance_to_point() {
        let o = Obstacle::new(Point2D::new(0.0, 0.0), 0.0, 2.0, 4.0);
        assert!((o.distance_to(Point2D::new(0.0, 5.0)) - 4.0).abs() < 1e-10);
        assert_eq!(o.distance_to(Point2D::new(2.0, 1.0)), 0.0);
    }
}
