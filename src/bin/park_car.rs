// Hybrid A* parking demo
//
// Scatters random obstacles on a grid, plans a drivable path for a
// passenger car between two poses, and plots the raw and smoothed paths.

use rand::rngs::StdRng;
use rand::SeedableRng;

use vehicle_pathfinding::common::{Path2D, Point2D, Pose2D};
use vehicle_pathfinding::geometry::{rectangles_intersect, Rectangle};
use vehicle_pathfinding::map::grid::Map;
use vehicle_pathfinding::map::obstacles;
use vehicle_pathfinding::path_planning::pipeline::{Pathfinder, PathfinderConfig};
use vehicle_pathfinding::utils::visualization::{colors, PathStyle, Visualizer};
use vehicle_pathfinding::vehicle::CarSpec;

const MAP_WIDTH: usize = 40;
const CELL_WIDTH: f64 = 1.0;

fn main() {
    let start = Pose2D::new(8.0, 8.0, 0.0);
    let goal = Pose2D::new(32.0, 30.0, std::f64::consts::FRAC_PI_2);

    // Scatter obstacles, keeping a corridor clear around both endpoints
    let mut rng = StdRng::seed_from_u64(7);
    let mut scatter_map = Map::new(MAP_WIDTH, CELL_WIDTH);
    let start_clear = Rectangle::from_pose(start.position(), start.yaw, 8.0, 12.0);
    let goal_clear = Rectangle::from_pose(goal.position(), goal.yaw, 8.0, 12.0);
    obstacles::add_random_obstacles(&mut scatter_map, &mut rng, 14, 1.5, 4.0, &start_clear);
    scatter_map
        .obstacles
        .retain(|o| !rectangles_intersect(&o.corners, &goal_clear));
    let obstacle_list = scatter_map.obstacles;

    let car = CarSpec::passenger_car();
    let mut pathfinder = match Pathfinder::new(
        MAP_WIDTH,
        CELL_WIDTH,
        obstacle_list,
        car,
        PathfinderConfig::default(),
    ) {
        Ok(p) => p,
        Err(e) => {
            println!("Pathfinder setup failed: {}", e);
            return;
        }
    };

    let planned = match pathfinder.plan(start, goal, None) {
        Ok(p) => p,
        Err(e) => {
            println!("Planning failed: {}", e);
            return;
        }
    };

    let raw_path = Path2D::from_points(
        planned
            .nodes
            .iter()
            .map(|n| n.rear_wheel_pos)
            .collect::<Vec<Point2D>>(),
    );
    let smoothed_path = Path2D::from_points(
        planned
            .smoothed
            .iter()
            .map(|n| n.front_pos)
            .collect::<Vec<Point2D>>(),
    );

    let min_clearance = planned
        .nodes
        .iter()
        .flat_map(|n| {
            pathfinder
                .map
                .obstacles
                .iter()
                .map(move |o| o.distance_to(n.rear_wheel_pos))
        })
        .fold(f64::MAX, f64::min);

    println!("Expanded {} nodes", planned.expanded_nodes.len());
    println!(
        "Path: {} nodes, {:.2} m rear-wheel length",
        planned.nodes.len(),
        raw_path.total_length()
    );
    println!("Smoothed: {} waypoints", planned.smoothed.len());
    println!("Minimum obstacle clearance: {:.2} m", min_clearance);

    let mut vis = Visualizer::new();
    vis.set_title("Hybrid A* parking")
        .set_x_range(0.0, MAP_WIDTH as f64 * CELL_WIDTH)
        .set_y_range(0.0, MAP_WIDTH as f64 * CELL_WIDTH)
        .plot_obstacles(&pathfinder.map.obstacles)
        .plot_path(&raw_path, &PathStyle::new(colors::PATH, "Search path"))
        .plot_path(
            &smoothed_path,
            &PathStyle::new(colors::SMOOTHED, "Smoothed front axle"),
        )
        .plot_pose(&start, colors::START, 1.5)
        .plot_pose(&goal, colors::GOAL, 1.5);
    if let Err(e) = vis.show() {
        println!("Plotting failed: {}", e);
    }
}
