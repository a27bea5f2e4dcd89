//! Hybrid A* search over vehicle poses
//!
//! Nodes are continuous rear-wheel poses expanded with fixed-length
//! bicycle-model steps, pruned against a discrete grid: per cell, one
//! open node per rounded heading and a closed set of rounded headings.
//! With a trailer attached, a bucket only counts as visited when the
//! rounded trailer heading has been seen there too.
//!
//! Node records live in an arena indexed by `usize`; parents are arena
//! indices and the open set is an indexed binary heap so a dominated open
//! node can be rewritten in place.
//!
//! Close to the goal the search occasionally injects a node along the
//! Reeds-Shepp path to the goal pose, which snaps the final approach to a
//! drivable curve long before the grid resolution could.

use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::common::error::{RoboticsError, RoboticsResult};
use crate::common::types::{GridNode, Point2D, Pose2D};
use crate::map::grid::Map;
use crate::map::obstacles::{is_car_position_blocked, is_trailer_colliding_with_tractor};
use crate::path_planning::heuristics::REEDS_SHEPP_HEURISTIC_DISTANCE;
use crate::path_planning::reeds_shepp::{self, Gear};
use crate::utils::angles::{angle_diff, round_to_resolution, wrap_to_2pi};
use crate::vehicle::{step_bicycle, step_trailer_heading, CarSpec};

#[derive(Debug, Clone)]
pub struct HybridAStarConfig {
    /// Goal position tolerance
    pub pos_accuracy: f64,
    /// Goal heading tolerance in radians
    pub heading_accuracy: f64,
    /// Heading bucket size in degrees
    pub heading_resolution: f64,
    /// Within this wavefront distance the Reeds-Shepp shortcut may fire
    pub max_reeds_shepp_distance: f64,
    /// Beyond the shortcut distance a long-shot attempt still fires with
    /// this probability, up to `far_reeds_shepp_distance`
    pub far_reeds_shepp_probability: f64,
    pub far_reeds_shepp_distance: f64,
    pub max_iterations: usize,
    pub max_open_nodes: usize,
    pub obstacle_cost: f64,
    pub reverse_cost: f64,
    pub switch_direction_cost: f64,
    pub trailer_reverse_cost: f64,
    pub rng_seed: u64,
}

impl Default for HybridAStarConfig {
    fn default() -> Self {
        Self {
            pos_accuracy: 1.0,
            heading_accuracy: 10f64.to_radians(),
            heading_resolution: 15.0,
            max_reeds_shepp_distance: 15.0,
            far_reeds_shepp_probability: 0.005,
            far_reeds_shepp_distance: 40.0,
            max_iterations: 400_000,
            max_open_nodes: 200_000,
            obstacle_cost: 1.0,
            reverse_cost: 2.0,
            switch_direction_cost: 0.5,
            trailer_reverse_cost: 30.0,
            rng_seed: 42,
        }
    }
}

/// One search node: a rear-wheel pose plus how the car got there
#[derive(Debug, Clone)]
pub struct PathNode {
    pub rear_wheel_pos: Point2D,
    /// Heading in [0, 2*pi)
    pub heading: f64,
    pub trailer_heading: Option<f64>,
    pub is_reversing: bool,
    pub g_cost: f64,
    pub h_cost: f64,
    /// Arena index of the predecessor node
    pub parent: Option<usize>,
}

impl PathNode {
    pub fn f_cost(&self) -> f64 {
        self.g_cost + self.h_cost
    }

    pub fn pose(&self) -> Pose2D {
        Pose2D::new(self.rear_wheel_pos.x, self.rear_wheel_pos.y, self.heading)
    }
}

const ABSENT: usize = usize::MAX;

/// Indexed binary min-heap over arena node ids, ordered by (f, h).
/// The position table allows rewriting a queued node's costs in place
/// followed by a re-sort of just that entry.
struct OpenSet {
    heap: Vec<usize>,
    positions: Vec<usize>,
}

impl OpenSet {
    fn new() -> Self {
        Self {
            heap: Vec::new(),
            positions: Vec::new(),
        }
    }

    fn len(&self) -> usize {
        self.heap.len()
    }

    fn contains(&self, id: usize) -> bool {
        id < self.positions.len() && self.positions[id] != ABSENT
    }

    fn key(nodes: &[PathNode], id: usize) -> (f64, f64) {
        (nodes[id].f_cost(), nodes[id].h_cost)
    }

    fn push(&mut self, nodes: &[PathNode], id: usize) {
        if self.positions.len() < nodes.len() {
            self.positions.resize(nodes.len(), ABSENT);
        }
        self.heap.push(id);
        self.positions[id] = self.heap.len() - 1;
        self.sift_up(nodes, self.heap.len() - 1);
    }

    fn pop(&mut self, nodes: &[PathNode]) -> Option<usize> {
        if self.heap.is_empty() {
            return None;
        }
        let top = self.heap[0];
        self.positions[top] = ABSENT;
        let last = self.heap.pop()?;
        if !self.heap.is_empty() {
            self.heap[0] = last;
            self.positions[last] = 0;
            self.sift_down(nodes, 0);
        }
        Some(top)
    }

    /// Re-sort one entry after its node's costs changed
    fn update(&mut self, nodes: &[PathNode], id: usize) {
        let pos = self.positions[id];
        if pos == ABSENT {
            return;
        }
        self.sift_up(nodes, pos);
        self.sift_down(nodes, self.positions[id]);
    }

    fn sift_up(&mut self, nodes: &[PathNode], mut pos: usize) {
        while pos > 0 {
            let parent = (pos - 1) / 2;
            if Self::key(nodes, self.heap[pos]) < Self::key(nodes, self.heap[parent]) {
                self.swap(pos, parent);
                pos = parent;
            } else {
                break;
            }
        }
    }

    fn sift_down(&mut self, nodes: &[PathNode], mut pos: usize) {
        loop {
            let left = 2 * pos + 1;
            let right = 2 * pos + 2;
            let mut smallest = pos;
            if left < self.heap.len()
                && Self::key(nodes, self.heap[left]) < Self::key(nodes, self.heap[smallest])
            {
                smallest = left;
            }
            if right < self.heap.len()
                && Self::key(nodes, self.heap[right]) < Self::key(nodes, self.heap[smallest])
            {
                smallest = right;
            }
            if smallest == pos {
                break;
            }
            self.swap(pos, smallest);
            pos = smallest;
        }
    }

    fn swap(&mut self, a: usize, b: usize) {
        self.heap.swap(a, b);
        self.positions[self.heap[a]] = a;
        self.positions[self.heap[b]] = b;
    }
}

/// Per-cell heading buckets, sized once at grid dimensions
struct CellBuckets {
    width: usize,
    closed: Vec<HashSet<i32>>,
    closed_trailer: Vec<HashSet<i32>>,
    lowest: Vec<HashMap<i32, usize>>,
    lowest_trailer: Vec<HashSet<i32>>,
}

impl CellBuckets {
    fn new(width: usize) -> Self {
        Self {
            width,
            closed: vec![HashSet::new(); width * width],
            closed_trailer: vec![HashSet::new(); width * width],
            lowest: vec![HashMap::new(); width * width],
            lowest_trailer: vec![HashSet::new(); width * width],
        }
    }

    fn index(&self, cell: GridNode) -> usize {
        cell.x as usize * self.width + cell.y as usize
    }

    /// Whether this (cell, heading, trailer heading) combination may be
    /// skipped as already visited
    fn is_closed(&self, cell: GridNode, heading: i32, trailer_heading: Option<i32>) -> bool {
        let i = self.index(cell);
        if !self.closed[i].contains(&heading) {
            return false;
        }
        match trailer_heading {
            None => true,
            Some(th) => self.closed_trailer[i].contains(&th),
        }
    }

    fn close(&mut self, cell: GridNode, heading: i32, trailer_heading: Option<i32>) {
        let i = self.index(cell);
        self.closed[i].insert(heading);
        if let Some(th) = trailer_heading {
            self.closed_trailer[i].insert(th);
        }
    }
}

pub struct HybridAStar<'a> {
    map: &'a Map,
    car: &'a CarSpec,
    trailer: Option<&'a CarSpec>,
    config: HybridAStarConfig,
    /// Step length between expanded nodes, a cell diagonal plus a hair so
    /// a step always leaves the current cell
    drive_distance: f64,
    rng: StdRng,
    nodes: Vec<PathNode>,
    expanded: Vec<PathNode>,
}

impl<'a> HybridAStar<'a> {
    pub fn new(map: &'a Map, car: &'a CarSpec, config: HybridAStarConfig) -> Self {
        let drive_distance = (2.0 * map.cell_width * map.cell_width).sqrt() + 0.01;
        let rng = StdRng::seed_from_u64(config.rng_seed);
        Self {
            map,
            car,
            trailer: None,
            config,
            drive_distance,
            rng,
            nodes: Vec::new(),
            expanded: Vec::new(),
        }
    }

    pub fn with_trailer(
        map: &'a Map,
        car: &'a CarSpec,
        trailer: &'a CarSpec,
        config: HybridAStarConfig,
    ) -> Self {
        let mut planner = Self::new(map, car, config);
        planner.trailer = Some(trailer);
        planner
    }

    /// Nodes expanded during the last search, in expansion order
    pub fn expanded_nodes(&self) -> &[PathNode] {
        &self.expanded
    }

    fn rounded_heading(&self, heading: f64) -> i32 {
        round_to_resolution(heading.to_degrees(), self.config.heading_resolution)
    }

    /// Grid heuristic of the cell, tightened by the Reeds-Shepp distance
    /// once the wavefront says the goal is near
    fn node_heuristic(&self, pose: Pose2D, cell: GridNode, goal: Pose2D) -> f64 {
        let cell_data = self.map.cell(cell);
        let mut h = cell_data.heuristic;
        if cell_data.distance_to_goal < REEDS_SHEPP_HEURISTIC_DISTANCE {
            let rs = reeds_shepp::shortest_distance(pose, goal, self.car.turning_radius);
            if rs < f64::MAX {
                h = h.max(rs);
            }
        }
        h
    }

    /// Run the search. `heuristics::generate` must have been run for this
    /// goal's cell beforehand.
    pub fn search(
        &mut self,
        start: Pose2D,
        goal: Pose2D,
        trailer_start_heading: Option<f64>,
    ) -> RoboticsResult<Vec<PathNode>> {
        self.nodes.clear();
        self.expanded.clear();
        let mut open = OpenSet::new();
        let mut buckets = CellBuckets::new(self.map.width);

        let start_cell = self.map.world_to_cell(start.position());
        let goal_cell = self.map.world_to_cell(goal.position());
        if !self.map.is_cell_within_grid(start_cell) || !self.map.is_cell_within_grid(goal_cell) {
            return Err(RoboticsError::InvalidParameter(
                "Start or goal outside the grid".to_string(),
            ));
        }

        let start_node = PathNode {
            rear_wheel_pos: start.position(),
            heading: wrap_to_2pi(start.yaw),
            trailer_heading: trailer_start_heading.map(wrap_to_2pi),
            is_reversing: false,
            g_cost: 0.0,
            h_cost: self.node_heuristic(start, start_cell, goal),
            parent: None,
        };
        self.nodes.push(start_node);
        open.push(&self.nodes, 0);

        let mut iterations = 0;
        let mut final_node: Option<usize> = None;

        while let Some(current_id) = open.pop(&self.nodes) {
            let current = self.nodes[current_id].clone();
            let cell = self.map.world_to_cell(current.rear_wheel_pos);
            let heading_bucket = self.rounded_heading(current.heading);
            let trailer_bucket = current.trailer_heading.map(|th| self.rounded_heading(th));

            // A stale heap entry for an already-visited bucket
            if buckets.is_closed(cell, heading_bucket, trailer_bucket) {
                continue;
            }
            buckets.close(cell, heading_bucket, trailer_bucket);

            iterations += 1;
            if iterations > self.config.max_iterations {
                break;
            }
            self.expanded.push(current.clone());

            if self.is_goal(&current, cell, goal, goal_cell) {
                // Land exactly on the goal position
                self.nodes[current_id].rear_wheel_pos = goal.position();
                final_node = Some(current_id);
                break;
            }

            self.expand(current_id, &current, cell, goal, &mut open, &mut buckets);
        }

        match final_node {
            Some(id) => Ok(self.build_path(id)),
            None => Err(RoboticsError::PlanningError("No path found".to_string())),
        }
    }

    fn is_goal(&self, node: &PathNode, cell: GridNode, goal: Pose2D, goal_cell: GridNode) -> bool {
        let close_enough = node
            .rear_wheel_pos
            .distance_squared(&goal.position())
            < self.config.pos_accuracy * self.config.pos_accuracy
            || cell == goal_cell;
        close_enough && angle_diff(node.heading, goal.yaw) < self.config.heading_accuracy
    }

    fn expand(
        &mut self,
        current_id: usize,
        current: &PathNode,
        cell: GridNode,
        goal: Pose2D,
        open: &mut OpenSet,
        buckets: &mut CellBuckets,
    ) {
        let steering_angles = [self.car.max_steer_angle, 0.0, -self.car.max_steer_angle];
        let mut drive_distances = vec![self.drive_distance];
        if self.car.can_reverse {
            drive_distances.push(-self.drive_distance);
        }

        for &distance in &drive_distances {
            for &steer in &steering_angles {
                let pose = step_bicycle(current.pose(), distance, steer, self.car.wheel_base());
                let child = self.make_child(current_id, current, pose, distance, goal);
                if let Some(child) = child {
                    self.try_register(child, open, buckets);
                }
            }
        }

        self.try_reeds_shepp_shortcut(current_id, current, cell, goal, open, buckets);
    }

    /// Build a child node one step from `current`, or None when the step
    /// leaves the grid
    fn make_child(
        &self,
        parent_id: usize,
        parent: &PathNode,
        pose: Pose2D,
        signed_distance: f64,
        goal: Pose2D,
    ) -> Option<PathNode> {
        let pos = pose.position();
        let cell = self.map.world_to_cell(pos);
        if !self.map.is_cell_within_grid(cell) {
            return None;
        }
        let is_reversing = signed_distance < 0.0;
        let step = signed_distance.abs();

        let voronoi = self.map.cell(cell).voronoi.value;
        let reverse_factor = if is_reversing { self.config.reverse_cost } else { 0.0 };
        let mut g_cost = parent.g_cost
            + step * (1.0 + self.config.obstacle_cost * voronoi + reverse_factor);
        if is_reversing != parent.is_reversing {
            g_cost += self.config.switch_direction_cost;
        }
        if self.trailer.is_some() && is_reversing {
            g_cost += self.config.trailer_reverse_cost;
        }

        let h_cost = self.node_heuristic(pose, cell, goal);

        let trailer_heading = match (self.trailer, parent.trailer_heading) {
            (Some(trailer), Some(th)) => Some(step_trailer_heading(
                th,
                parent.heading,
                signed_distance,
                trailer.wheel_base(),
            )),
            _ => None,
        };

        Some(PathNode {
            rear_wheel_pos: pos,
            heading: pose.yaw,
            trailer_heading,
            is_reversing,
            g_cost,
            h_cost,
            parent: Some(parent_id),
        })
    }

    /// Occasionally step straight onto the Reeds-Shepp path to the goal
    fn try_reeds_shepp_shortcut(
        &mut self,
        current_id: usize,
        current: &PathNode,
        cell: GridNode,
        goal: Pose2D,
        open: &mut OpenSet,
        buckets: &mut CellBuckets,
    ) {
        let distance_to_goal = self.map.cell(cell).distance_to_goal;
        let near = self.config.max_reeds_shepp_distance;
        let probability =
            ((near - distance_to_goal) / near).max(0.0).min(1.0) * 0.2;
        let roll: f64 = self.rng.gen();
        let fire = (distance_to_goal < near && roll < probability)
            || (distance_to_goal < self.config.far_reeds_shepp_distance
                && roll < self.config.far_reeds_shepp_probability);
        if !fire {
            return;
        }

        let waypoints = match reeds_shepp::shortest_path(
            current.pose(),
            goal,
            self.car.turning_radius,
            self.drive_distance,
            true,
        ) {
            Some(wps) if wps.len() >= 2 => wps,
            _ => return,
        };
        let wp = waypoints[1];
        let signed_distance = match wp.gear {
            Gear::Forward => self.drive_distance,
            Gear::Back => -self.drive_distance,
        };
        let pose = Pose2D::new(wp.pos.x, wp.pos.y, wrap_to_2pi(wp.heading));
        if let Some(child) = self.make_child(current_id, current, pose, signed_distance, goal) {
            self.try_register(child, open, buckets);
        }
    }

    /// Dominance and collision gate, then arena + open set registration
    fn try_register(&mut self, child: PathNode, open: &mut OpenSet, buckets: &mut CellBuckets) {
        let cell = self.map.world_to_cell(child.rear_wheel_pos);
        let heading_bucket = self.rounded_heading(child.heading);
        let trailer_bucket = child.trailer_heading.map(|th| self.rounded_heading(th));

        if buckets.is_closed(cell, heading_bucket, trailer_bucket) {
            return;
        }

        let cell_idx = buckets.index(cell);

        // Cheap pre-check before the collision tests: an equal-or-better
        // open node in the same bucket dominates this child
        if let Some(&existing) = buckets.lowest[cell_idx].get(&heading_bucket) {
            let same_trailer_bucket = match trailer_bucket {
                None => true,
                Some(th) => buckets.lowest_trailer[cell_idx].contains(&th),
            };
            if same_trailer_bucket && child.g_cost >= self.nodes[existing].g_cost {
                return;
            }
        }

        if is_car_position_blocked(self.map, child.rear_wheel_pos, child.heading, self.car) {
            return;
        }
        if let (Some(trailer), Some(th)) = (self.trailer, child.trailer_heading) {
            let attachment = self
                .car
                .trailer_attachment_point(child.rear_wheel_pos, child.heading);
            if is_car_position_blocked(self.map, attachment, th, trailer) {
                return;
            }
            if is_trailer_colliding_with_tractor(
                self.car,
                child.rear_wheel_pos,
                child.heading,
                trailer,
                attachment,
                th,
            ) {
                return;
            }
        }

        match buckets.lowest[cell_idx].entry(heading_bucket) {
            Entry::Occupied(entry) => {
                let existing = *entry.get();
                let same_trailer_bucket = match trailer_bucket {
                    None => true,
                    Some(th) => buckets.lowest_trailer[cell_idx].contains(&th),
                };
                if same_trailer_bucket {
                    if child.g_cost < self.nodes[existing].g_cost && open.contains(existing) {
                        // Rewrite the dominated open node in place
                        self.nodes[existing] = child;
                        open.update(&self.nodes, existing);
                    }
                } else if open.len() < self.config.max_open_nodes {
                    // Same tractor bucket, new trailer heading: queue it
                    // alongside without touching the map entry
                    if let Some(th) = trailer_bucket {
                        buckets.lowest_trailer[cell_idx].insert(th);
                    }
                    self.nodes.push(child);
                    open.push(&self.nodes, self.nodes.len() - 1);
                }
            }
            Entry::Vacant(entry) => {
                if open.len() < self.config.max_open_nodes {
                    let id = self.nodes.len();
                    entry.insert(id);
                    if let Some(th) = trailer_bucket {
                        buckets.lowest_trailer[cell_idx].insert(th);
                    }
                    self.nodes.push(child);
                    open.push(&self.nodes, id);
                }
            }
        }
    }

    /// Walk the parent chain back from the goal node
    fn build_path(&self, final_id: usize) -> Vec<PathNode> {
        let mut path = Vec::new();
        let mut current = Some(final_id);
        while let Some(id) = current {
            path.push(self.nodes[id].clone());
            current = self.nodes[id].parent;
        }
        path.reverse();
        // The start node never moved; give it the gear of the first step
        if path.len() > 1 {
            path[0].is_reversing = path[1].is_reversing;
        }
        path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::rectangles_intersect;
    use crate::map::obstacles::{self, Obstacle};
    use crate::path_planning::heuristics;

    fn prepared_map(obstacles_list: Vec<Obstacle>, goal: Pose2D) -> Map {
        let mut map = Map::new(40, 1.0);
        map.obstacles = obstacles_list;
        obstacles::mark_obstacle_cells(&mut map);
        obstacles::generate_obstacle_distance_field(&mut map);
        crate::map::voronoi_field::generate(&mut map, &Default::default());
        let goal_cell = map.world_to_cell(goal.position());
        heuristics::generate(&mut map, goal_cell);
        map
    }

    fn path_step_distances(path: &[PathNode]) -> Vec<f64> {
        path.windows(2)
            .map(|w| w[0].rear_wheel_pos.distance(&w[1].rear_wheel_pos))
            .collect()
    }

    #[test]
    fn test_straight_path_on_empty_map() {
        let start = Pose2D::new(10.0, 10.0, 0.0);
        let goal = Pose2D::new(30.0, 10.0, 0.0);
        let map = prepared_map(Vec::new(), goal);
        let car = CarSpec::passenger_car();
        let mut planner = HybridAStar::new(&map, &car, HybridAStarConfig::default());
        let path = planner.search(start, goal, None);
        assert!(path.is_ok());
        if let Ok(path) = path {
            assert!(!path.is_empty());
            let length: f64 = path_step_distances(&path).iter().sum();
            assert!(length < 23.0, "straight run took {}", length);
            assert!(path.iter().all(|n| !n.is_reversing));
            let last = &path[path.len() - 1];
            assert_eq!(last.rear_wheel_pos, goal.position());
        }
    }

    #[test]
    fn test_path_avoids_obstacle() {
        let start = Pose2D::new(8.0, 20.0, 0.0);
        let goal = Pose2D::new(32.0, 20.0, 0.0);
        let blocking = vec![Obstacle::new(Point2D::new(20.0, 20.0), 0.0, 14.0, 3.0)];
        let map = prepared_map(blocking, goal);
        let car = CarSpec::passenger_car();
        let mut planner = HybridAStar::new(&map, &car, HybridAStarConfig::default());
        let path = planner.search(start, goal, None);
        assert!(path.is_ok());
        if let Ok(path) = path {
            for node in &path[1..] {
                assert!(!is_car_position_blocked(
                    &map,
                    node.rear_wheel_pos,
                    node.heading,
                    &car
                ));
            }
        }
    }

    #[test]
    fn test_reversed_goal_behind_wall() {
        // The goal faces back at the start, with a wall between them:
        // the car has to swing around and either reverse or detour
        let start = Pose2D::new(12.0, 20.0, 0.0);
        let goal = Pose2D::new(28.0, 20.0, std::f64::consts::PI);
        let wall = vec![Obstacle::new(Point2D::new(20.0, 20.0), 0.0, 10.0, 2.0)];
        let map = prepared_map(wall, goal);
        let car = CarSpec::passenger_car();
        let mut planner = HybridAStar::new(&map, &car, HybridAStarConfig::default());
        let path = planner.search(start, goal, None);
        assert!(path.is_ok());
        if let Ok(path) = path {
            for node in &path[1..] {
                assert!(!is_car_position_blocked(
                    &map,
                    node.rear_wheel_pos,
                    node.heading,
                    &car
                ));
                let footprint = car.corners(node.rear_wheel_pos, node.heading);
                assert!(!rectangles_intersect(&footprint, &map.obstacles[0].corners));
            }
            let last = &path[path.len() - 1];
            assert!(angle_diff(last.heading, goal.yaw) < 10f64.to_radians());
            let reversed = path.iter().any(|n| n.is_reversing);
            let detoured = path
                .iter()
                .any(|n| (n.rear_wheel_pos.y - 20.0).abs() > 5.0);
            assert!(
                reversed || detoured,
                "expected a reverse segment or a detour around the wall"
            );
        }
    }

    #[test]
    fn test_deterministic_with_fixed_seed() {
        let start = Pose2D::new(10.0, 10.0, 0.5);
        let goal = Pose2D::new(28.0, 25.0, 2.0);
        let map = prepared_map(Vec::new(), goal);
        let car = CarSpec::passenger_car();

        let mut first = HybridAStar::new(&map, &car, HybridAStarConfig::default());
        let mut second = HybridAStar::new(&map, &car, HybridAStarConfig::default());
        let path_a = first.search(start, goal, None);
        let path_b = second.search(start, goal, None);
        assert!(path_a.is_ok() && path_b.is_ok());
        if let (Ok(a), Ok(b)) = (path_a, path_b) {
            assert_eq!(a.len(), b.len());
            for (na, nb) in a.iter().zip(b.iter()) {
                assert_eq!(na.rear_wheel_pos, nb.rear_wheel_pos);
                assert_eq!(na.heading, nb.heading);
            }
        }
    }

    #[test]
    fn test_turnaround_goal() {
        let start = Pose2D::new(20.0, 20.0, 0.0);
        let goal = Pose2D::new(20.0, 20.0, std::f64::consts::PI);
        let map = prepared_map(Vec::new(), goal);
        let car = CarSpec::passenger_car();
        let mut planner = HybridAStar::new(&map, &car, HybridAStarConfig::default());
        let path = planner.search(start, goal, None);
        assert!(path.is_ok());
        if let Ok(path) = path {
            assert!(path.len() > 2);
            let last = &path[path.len() - 1];
            assert!(angle_diff(last.heading, goal.yaw) < 10f64.to_radians());
        }
        assert!(!planner.expanded_nodes().is_empty());
    }

    #[test]
    fn test_trailer_heading_rate_is_bounded() {
        let start = Pose2D::new(10.0, 20.0, 0.0);
        let goal = Pose2D::new(32.0, 20.0, 0.0);
        let map = prepared_map(Vec::new(), goal);
        let car = CarSpec::semi_tractor();
        let trailer = CarSpec::trailer();
        let mut planner =
            HybridAStar::with_trailer(&map, &car, &trailer, HybridAStarConfig::default());
        let path = planner.search(start, goal, Some(0.0));
        assert!(path.is_ok());
        if let Ok(path) = path {
            let max_rate = planner.drive_distance / trailer.wheel_base() + 1e-9;
            for w in path.windows(2) {
                if let (Some(a), Some(b)) = (w[0].trailer_heading, w[1].trailer_heading) {
                    assert!(angle_diff(a, b) <= max_rate);
                }
            }
        }
    }
}
