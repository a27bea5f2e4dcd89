//! Gradient-descent path smoothing
//!
//! The planner's output is kinked at the grid resolution. Smoothing runs
//! on two parallel coordinate lists per path: the front axle positions
//! and their mirror behind the rear axle. Keeping both smooth keeps the
//! implied headings consistent for driving forward and in reverse.
//!
//! Nodes where the gear changes, and both endpoints, are fixed. The main
//! pass balances pull toward the original position, neighbor smoothing,
//! and obstacle repulsion; after waypoint densification a second,
//! curvature-only pass runs with a wider stencil.

use nalgebra::Vector2;

use crate::common::types::{Point2D, Pose2D};
use crate::map::grid::Map;
use crate::map::voronoi_field;
use crate::path_planning::hybrid_a_star::PathNode;
use crate::vehicle::CarSpec;

#[derive(Debug, Clone)]
pub struct SmootherConfig {
    /// Pull toward the original position
    pub alpha: f64,
    /// Neighbor smoothing
    pub beta: f64,
    /// Obstacle repulsion
    pub gamma: f64,
    /// Voronoi edge attraction; off by default
    pub delta: f64,
    pub obstacle_influence_distance: f64,
    pub voronoi_alpha: f64,
    pub voronoi_max_distance: f64,
    pub tolerance: f64,
    pub max_iterations: usize,
    /// Gain of the curvature-only pass
    pub curvature_gamma: f64,
}

impl Default for SmootherConfig {
    fn default() -> Self {
        Self {
            alpha: 0.10,
            beta: 0.40,
            gamma: 0.05,
            delta: 0.0,
            obstacle_influence_distance: 10.0,
            voronoi_alpha: 10.0,
            voronoi_max_distance: 50.0,
            tolerance: 0.001,
            max_iterations: 1000,
            curvature_gamma: 0.2,
        }
    }
}

/// One node of the smoothed path
#[derive(Debug, Clone)]
pub struct SmoothedNode {
    /// Smoothed front axle position
    pub front_pos: Point2D,
    /// Smoothed mirror position behind the rear axle
    pub mirrored_pos: Point2D,
    pub is_reversing: bool,
}

/// Endpoints and gear-change nodes must not move
pub fn find_fixed_nodes(path: &[PathNode]) -> Vec<bool> {
    let n = path.len();
    let mut fixed = vec![false; n];
    if n == 0 {
        return fixed;
    }
    fixed[0] = true;
    fixed[n - 1] = true;
    for i in 0..n {
        let next = (i + 1).min(n - 1);
        if path[i].is_reversing != path[next].is_reversing {
            fixed[i] = true;
        }
    }
    fixed
}

/// Axle positions offset one wheel base from each rear-wheel node, along
/// the direction of travel into the next node. With `mirrored` the offset
/// points backward instead, giving the reverse-driving twin path.
pub fn calculate_axle_positions(
    path: &[PathNode],
    car: &CarSpec,
    start: Pose2D,
    goal: Pose2D,
    mirrored: bool,
) -> Vec<Point2D> {
    let n = path.len();
    let mut positions = Vec::with_capacity(n);
    for i in 0..n {
        let mut dir: Vector2<f64> = if i == 0 {
            start.direction()
        } else if i == n - 1 {
            goal.direction()
        } else {
            let to_next =
                path[i + 1].rear_wheel_pos.to_vector() - path[i].rear_wheel_pos.to_vector();
            let norm = to_next.norm();
            let mut d = if norm > 0.0 {
                to_next / norm
            } else {
                Vector2::new(path[i].heading.cos(), path[i].heading.sin())
            };
            if path[i + 1].is_reversing {
                d = -d;
            }
            d
        };
        if mirrored {
            dir = -dir;
        }
        positions.push(Point2D::from(
            path[i].rear_wheel_pos.to_vector() + dir * car.wheel_base(),
        ));
    }
    positions
}

fn is_valid_update(map: &Map, p: Point2D) -> bool {
    p.x.is_finite() && p.y.is_finite() && map.is_pos_within_grid(p)
}

/// Main smoothing pass. Updates are computed against the previous
/// iteration's positions and applied in one batch per iteration.
pub fn gradient_descent(
    positions: &mut Vec<Point2D>,
    original: &[Point2D],
    fixed: &[bool],
    map: &Map,
    config: &SmootherConfig,
) {
    let n = positions.len();
    let tolerance_sqr = config.tolerance * config.tolerance;

    for _ in 0..config.max_iterations {
        let mut total_change_sqr = 0.0;
        let mut updated = positions.clone();

        for i in 0..n {
            if fixed[i] {
                continue;
            }
            let cur = positions[i].to_vector();
            let prev = positions[i.saturating_sub(1)].to_vector();
            let next = positions[(i + 1).min(n - 1)].to_vector();

            let mut correction = (original[i].to_vector() - cur) * config.alpha;
            correction += (next + prev - cur * 2.0) * config.beta;

            if let Some(obstacle) = voronoi_field::closest_obstacle_pos(map, positions[i]) {
                let to_obstacle = obstacle.to_vector() - cur;
                let d = to_obstacle.norm();
                if d > 0.0 && d < config.obstacle_influence_distance {
                    correction -=
                        (to_obstacle / d) * config.gamma
                            * (1.0 - d / config.obstacle_influence_distance);
                }
            }

            if config.delta > 0.0 {
                correction += voronoi_edge_term(map, positions[i], config);
            }

            let candidate = Point2D::from(cur + correction);
            if is_valid_update(map, candidate) {
                total_change_sqr += (candidate.to_vector() - cur).norm_squared();
                updated[i] = candidate;
            }
        }

        *positions = updated;
        if total_change_sqr < tolerance_sqr {
            break;
        }
    }
}

/// Pull toward the Voronoi edge so the path tracks the middle of the
/// corridor. Derivatives of the field value with respect to the obstacle
/// and edge distances, evaluated at this position.
fn voronoi_edge_term(map: &Map, pos: Point2D, config: &SmootherConfig) -> Vector2<f64> {
    let mut term = Vector2::new(0.0, 0.0);
    let a = config.voronoi_alpha;
    let d_max = config.voronoi_max_distance;

    let obstacle = voronoi_field::closest_obstacle_pos(map, pos);
    let edge = voronoi_field::closest_edge_pos(map, pos);
    let (obstacle, edge) = match (obstacle, edge) {
        (Some(o), Some(e)) => (o, e),
        _ => return term,
    };
    let to_obstacle = obstacle.to_vector() - pos.to_vector();
    let to_edge = edge.to_vector() - pos.to_vector();
    let d_obs = to_obstacle.norm();
    let d_edg = to_edge.norm();
    if d_obs <= 0.0 || d_edg <= 0.0 || d_obs >= d_max {
        return term;
    }

    let upper_edge = a * d_obs * (d_obs - d_max).powi(2);
    let lower_edge = d_max.powi(2) * (d_obs + a) * (d_edg + d_obs).powi(2);
    term -= (-to_edge / d_edg) * (config.delta * upper_edge / lower_edge);

    let upper_obs = a
        * d_edg
        * (d_obs - d_max)
        * ((d_edg + 2.0 * d_max + a) * d_obs + (d_max + 2.0 * a) + a * d_max);
    let lower_obs = d_max.powi(2) * (d_obs + a).powi(2) * (d_obs + d_edg).powi(2);
    term += (to_obstacle / d_obs) * (config.delta * upper_obs / lower_obs);

    term
}

/// Curvature-only pass with a five-point stencil
pub fn constrained_gradient_descent(
    positions: &mut Vec<Point2D>,
    fixed: &[bool],
    map: &Map,
    gamma: f64,
    config: &SmootherConfig,
) {
    let n = positions.len();
    if n < 3 {
        return;
    }
    let tolerance_sqr = config.tolerance * config.tolerance;

    for _ in 0..config.max_iterations {
        let mut total_change_sqr = 0.0;
        let mut updated = positions.clone();

        for i in 0..n {
            if fixed[i] {
                continue;
            }
            let cur = positions[i].to_vector();
            let prev = positions[i.saturating_sub(1)].to_vector();
            let next = positions[(i + 1).min(n - 1)].to_vector();
            let prev2 = positions[i.saturating_sub(2)].to_vector();
            let next2 = positions[(i + 2).min(n - 1)].to_vector();

            let mut correction = (next + prev - cur * 2.0) * gamma;
            correction += (prev * 2.0 - prev2 - cur) * (gamma * 0.5);
            correction += (next * 2.0 - next2 - cur) * (gamma * 0.5);

            let candidate = Point2D::from(cur + correction);
            if is_valid_update(map, candidate) {
                total_change_sqr += (candidate.to_vector() - cur).norm_squared();
                updated[i] = candidate;
            }
        }

        *positions = updated;
        if total_change_sqr < tolerance_sqr {
            break;
        }
    }
}

/// Insert two linearly interpolated nodes in every gap. Interpolated
/// nodes are free to move; originals keep their fixed flags.
fn add_waypoints(
    front: &[Point2D],
    mirrored: &[Point2D],
    reversing: &[bool],
    fixed: &[bool],
) -> (Vec<Point2D>, Vec<Point2D>, Vec<bool>, Vec<bool>) {
    let n = front.len();
    let mut new_front = Vec::with_capacity(n * 3);
    let mut new_mirrored = Vec::with_capacity(n * 3);
    let mut new_reversing = Vec::with_capacity(n * 3);
    let mut new_fixed = Vec::with_capacity(n * 3);

    let lerp = |a: Point2D, b: Point2D, t: f64| {
        Point2D::new(a.x + (b.x - a.x) * t, a.y + (b.y - a.y) * t)
    };

    for i in 0..n {
        new_front.push(front[i]);
        new_mirrored.push(mirrored[i]);
        new_reversing.push(reversing[i]);
        new_fixed.push(fixed[i]);
        if i + 1 < n {
            for &t in &[1.0 / 3.0, 2.0 / 3.0] {
                new_front.push(lerp(front[i], front[i + 1], t));
                new_mirrored.push(lerp(mirrored[i], mirrored[i + 1], t));
                new_reversing.push(reversing[i]);
                new_fixed.push(false);
            }
        }
    }
    (new_front, new_mirrored, new_reversing, new_fixed)
}

/// Full smoothing sequence for a planned path
pub fn smooth_path(
    map: &Map,
    car: &CarSpec,
    start: Pose2D,
    goal: Pose2D,
    path: &[PathNode],
    config: &SmootherConfig,
) -> Vec<SmoothedNode> {
    if path.len() < 2 {
        return path
            .iter()
            .map(|n| SmoothedNode {
                front_pos: car.front_axle_pos(n.rear_wheel_pos, n.heading),
                mirrored_pos: car.front_axle_pos(n.rear_wheel_pos, n.heading + std::f64::consts::PI),
                is_reversing: n.is_reversing,
            })
            .collect();
    }

    let fixed = find_fixed_nodes(path);
    let reversing: Vec<bool> = path.iter().map(|n| n.is_reversing).collect();

    let mut front = calculate_axle_positions(path, car, start, goal, false);
    let mut mirrored = calculate_axle_positions(path, car, start, goal, true);
    let front_original = front.clone();
    let mirrored_original = mirrored.clone();

    gradient_descent(&mut front, &front_original, &fixed, map, config);
    gradient_descent(&mut mirrored, &mirrored_original, &fixed, map, config);

    let (mut front, mut mirrored, reversing, fixed) =
        add_waypoints(&front, &mirrored, &reversing, &fixed);

    constrained_gradient_descent(&mut front, &fixed, map, config.curvature_gamma, config);
    constrained_gradient_descent(&mut mirrored, &fixed, map, config.curvature_gamma, config);

    front
        .into_iter()
        .zip(mirrored.into_iter())
        .zip(reversing.into_iter())
        .map(|((front_pos, mirrored_pos), is_reversing)| SmoothedNode {
            front_pos,
            mirrored_pos,
            is_reversing,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::obstacles;

    fn open_map() -> Map {
        let mut map = Map::new(30, 1.0);
        obstacles::mark_obstacle_cells(&mut map);
        obstacles::generate_obstacle_distance_field(&mut map);
        crate::map::voronoi_field::generate(&mut map, &Default::default());
        map
    }

    fn zigzag_positions() -> Vec<Point2D> {
        (0..11)
            .map(|i| {
                let x = 10.0 + i as f64;
                let y = 15.0 + if i % 2 == 0 { 0.5 } else { -0.5 };
                Point2D::new(x, y)
            })
            .collect()
    }

    fn smoothness_energy(positions: &[Point2D]) -> f64 {
        positions
            .windows(3)
            .map(|w| {
                let second_diff =
                    w[2].to_vector() + w[0].to_vector() - w[1].to_vector() * 2.0;
                second_diff.norm_squared()
            })
            .sum()
    }

    fn simple_fixed(n: usize) -> Vec<bool> {
        let mut fixed = vec![false; n];
        fixed[0] = true;
        fixed[n - 1] = true;
        fixed
    }

    #[test]
    fn test_gradient_descent_reduces_energy() {
        let map = open_map();
        let original = zigzag_positions();
        let mut positions = original.clone();
        let fixed = simple_fixed(positions.len());
        let before = smoothness_energy(&positions);
        gradient_descent(&mut positions, &original, &fixed, &map, &SmootherConfig::default());
        let after = smoothness_energy(&positions);
        assert!(after < before, "energy {} should drop below {}", after, before);
        // Fixed endpoints stay put
        assert_eq!(positions[0], original[0]);
        assert_eq!(positions[10], original[10]);
    }

    #[test]
    fn test_constrained_descent_reduces_energy() {
        let map = open_map();
        let mut positions = zigzag_positions();
        let fixed = simple_fixed(positions.len());
        let before = smoothness_energy(&positions);
        constrained_gradient_descent(
            &mut positions,
            &fixed,
            &map,
            0.2,
            &SmootherConfig::default(),
        );
        assert!(smoothness_energy(&positions) < before);
    }

    #[test]
    fn test_find_fixed_nodes_marks_gear_changes() {
        let node = |reversing: bool| PathNode {
            rear_wheel_pos: Point2D::new(10.0, 10.0),
            heading: 0.0,
            trailer_heading: None,
            is_reversing: reversing,
            g_cost: 0.0,
            h_cost: 0.0,
            parent: None,
        };
        let path = vec![node(false), node(false), node(true), node(true), node(false)];
        let fixed = find_fixed_nodes(&path);
        assert_eq!(fixed, vec![true, true, false, true, true]);
    }

    #[test]
    fn test_smooth_path_densifies() {
        let map = open_map();
        let car = CarSpec::passenger_car();
        let start = Pose2D::new(10.0, 15.0, 0.0);
        let goal = Pose2D::new(20.0, 15.0, 0.0);
        let path: Vec<PathNode> = (0..11)
            .map(|i| PathNode {
                rear_wheel_pos: Point2D::new(10.0 + i as f64, 15.0),
                heading: 0.0,
                trailer_heading: None,
                is_reversing: false,
                g_cost: i as f64,
                h_cost: 0.0,
                parent: None,
            })
            .collect();
        let smoothed = smooth_path(&map, &car, start, goal, &path, &SmootherConfig::default());
        // Two interpolated nodes per gap
        assert_eq!(smoothed.len(), 11 + 2 * 10);
        assert!(smoothed.iter().all(|n| !n.is_reversing));
        // Mirror path sits behind while the front path sits ahead
        assert!(smoothed[0].front_pos.x > smoothed[0].mirrored_pos.x);
    }
}
