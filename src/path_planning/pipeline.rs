//! End-to-end planning pipeline
//!
//! Owns the map and its precomputed fields. Obstacle marking, the
//! clearance field, and the Voronoi field are built once at construction;
//! the goal-dependent heuristic layers are rebuilt per request, then the
//! search and the smoother run.

use crate::common::error::{RoboticsError, RoboticsResult};
use crate::common::traits::PosePlanner;
use crate::common::types::{Path2D, Pose2D};
use crate::map::grid::Map;
use crate::map::obstacles::{self, Obstacle};
use crate::map::voronoi_field::{self, VoronoiFieldConfig};
use crate::path_planning::heuristics;
use crate::path_planning::hybrid_a_star::{HybridAStar, HybridAStarConfig, PathNode};
use crate::path_planning::smoother::{self, SmoothedNode, SmootherConfig};
use crate::vehicle::CarSpec;

#[derive(Debug, Clone, Default)]
pub struct PathfinderConfig {
    pub hybrid: HybridAStarConfig,
    pub smoother: SmootherConfig,
    pub voronoi: VoronoiFieldConfig,
}

/// Result of one planning request
#[derive(Debug, Clone)]
pub struct PlannedPath {
    /// Raw rear-wheel nodes from the search
    pub nodes: Vec<PathNode>,
    /// Smoothed axle paths with interpolated waypoints
    pub smoothed: Vec<SmoothedNode>,
    /// All nodes the search expanded, for inspection and display
    pub expanded_nodes: Vec<PathNode>,
}

pub struct Pathfinder {
    pub map: Map,
    pub car: CarSpec,
    pub trailer: Option<CarSpec>,
    pub config: PathfinderConfig,
}

impl Pathfinder {
    /// Build the map and all request-independent fields
    pub fn new(
        map_width: usize,
        cell_width: f64,
        obstacle_list: Vec<Obstacle>,
        car: CarSpec,
        config: PathfinderConfig,
    ) -> RoboticsResult<Self> {
        if map_width < 3 {
            return Err(RoboticsError::InvalidParameter(
                "Map must be at least 3 cells wide".to_string(),
            ));
        }
        if cell_width <= 0.0 {
            return Err(RoboticsError::InvalidParameter(
                "Cell width must be positive".to_string(),
            ));
        }

        let mut map = Map::new(map_width, cell_width);
        map.obstacles = obstacle_list;
        obstacles::mark_obstacle_cells(&mut map);
        obstacles::generate_obstacle_distance_field(&mut map);
        voronoi_field::generate(&mut map, &config.voronoi);

        Ok(Self {
            map,
            car,
            trailer: None,
            config,
        })
    }

    pub fn with_trailer(mut self, trailer: CarSpec) -> Self {
        self.trailer = Some(trailer);
        self
    }

    fn validate_pose(&self, pose: Pose2D, what: &str) -> RoboticsResult<()> {
        let cell = self.map.world_to_cell(pose.position());
        if !self.map.is_cell_within_grid(cell) {
            return Err(RoboticsError::InvalidParameter(format!(
                "{} position is outside the grid",
                what
            )));
        }
        if self.map.cell(cell).is_obstacle {
            return Err(RoboticsError::InvalidParameter(format!(
                "{} position is inside an obstacle",
                what
            )));
        }
        Ok(())
    }

    /// Plan from start to goal. With a trailer attached,
    /// `trailer_start_heading` gives its initial heading (defaults to the
    /// start heading).
    pub fn plan(
        &mut self,
        start: Pose2D,
        goal: Pose2D,
        trailer_start_heading: Option<f64>,
    ) -> RoboticsResult<PlannedPath> {
        self.validate_pose(start, "Start")?;
        self.validate_pose(goal, "Goal")?;

        let goal_cell = self.map.world_to_cell(goal.position());
        heuristics::generate(&mut self.map, goal_cell);

        let (nodes, expanded_nodes) = match &self.trailer {
            Some(trailer) => {
                let mut planner = HybridAStar::with_trailer(
                    &self.map,
                    &self.car,
                    trailer,
                    self.config.hybrid.clone(),
                );
                let heading = trailer_start_heading.unwrap_or(start.yaw);
                let nodes = planner.search(start, goal, Some(heading))?;
                (nodes, planner.expanded_nodes().to_vec())
            }
            None => {
                let mut planner =
                    HybridAStar::new(&self.map, &self.car, self.config.hybrid.clone());
                let nodes = planner.search(start, goal, None)?;
                (nodes, planner.expanded_nodes().to_vec())
            }
        };

        let smoothed = smoother::smooth_path(
            &self.map,
            &self.car,
            start,
            goal,
            &nodes,
            &self.config.smoother,
        );

        Ok(PlannedPath {
            nodes,
            smoothed,
            expanded_nodes,
        })
    }
}

impl PosePlanner for Pathfinder {
    fn plan_pose(&mut self, start: Pose2D, goal: Pose2D) -> Result<Path2D, RoboticsError> {
        let planned = self.plan(start, goal, None)?;
        Ok(Path2D::from_points(
            planned.nodes.iter().map(|n| n.rear_wheel_pos).collect(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::types::Point2D;

    fn simple_pathfinder() -> Pathfinder {
        let obstacles = vec![Obstacle::new(Point2D::new(20.0, 24.0), 0.0, 4.0, 4.0)];
        match Pathfinder::new(
            40,
            1.0,
            obstacles,
            CarSpec::passenger_car(),
            PathfinderConfig::default(),
        ) {
            Ok(p) => p,
            Err(e) => panic!("pathfinder construction failed: {}", e),
        }
    }

    #[test]
    fn test_plan_produces_both_paths() {
        let mut pathfinder = simple_pathfinder();
        let start = Pose2D::new(10.0, 10.0, 0.0);
        let goal = Pose2D::new(30.0, 10.0, 0.0);
        let planned = pathfinder.plan(start, goal, None);
        assert!(planned.is_ok());
        if let Ok(p) = planned {
            assert!(p.nodes.len() >= 2);
            assert!(p.smoothed.len() > p.nodes.len());
            assert!(!p.expanded_nodes.is_empty());
        }
    }

    #[test]
    fn test_rejects_goal_in_obstacle() {
        let mut pathfinder = simple_pathfinder();
        let start = Pose2D::new(10.0, 10.0, 0.0);
        let goal = Pose2D::new(20.0, 24.0, 0.0);
        let result = pathfinder.plan(start, goal, None);
        assert!(matches!(result, Err(RoboticsError::InvalidParameter(_))));
    }

    #[test]
    fn test_rejects_start_outside_grid() {
        let mut pathfinder = simple_pathfinder();
        let start = Pose2D::new(-5.0, 10.0, 0.0);
        let goal = Pose2D::new(30.0, 10.0, 0.0);
        let result = pathfinder.plan(start, goal, None);
        assert!(matches!(result, Err(RoboticsError::InvalidParameter(_))));
    }

    #[test]
    fn test_rejects_bad_map_parameters() {
        let result = Pathfinder::new(
            2,
            1.0,
            Vec::new(),
            CarSpec::passenger_car(),
            PathfinderConfig::default(),
        );
        assert!(result.is_err());
        let result = Pathfinder::new(
            40,
            0.0,
            Vec::new(),
            CarSpec::passenger_car(),
            PathfinderConfig::default(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_pose_planner_trait() {
        let mut pathfinder = simple_pathfinder();
        let path = pathfinder.plan_pose(Pose2D::new(10.0, 10.0, 0.0), Pose2D::new(30.0, 10.0, 0.0));
        assert!(path.is_ok());
        if let Ok(path) = path {
            assert!(path.total_length() >= 20.0 - 1.0);
        }
    }
}
