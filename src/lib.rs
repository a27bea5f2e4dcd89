//! VehiclePathfinding - kinematically feasible path planning for cars and trucks
//!
//! This crate provides an occupancy-grid planning pipeline built around a
//! Hybrid A* search: flow-field heuristics, a Voronoi clearance field,
//! Reeds-Shepp curves, articulated trailer support, and gradient-descent
//! path smoothing.

// Core modules
pub mod common;
pub mod utils;

// Planning modules
pub mod geometry;
pub mod map;
pub mod path_planning;
pub mod vehicle;

// Re-export common types for convenience
pub use common::{Path2D, Point2D, Pose2D};
pub use common::PosePlanner;
pub use common::{RoboticsError, RoboticsResult};
pub use path_planning::{Pathfinder, PathfinderConfig, PlannedPath};
pub use vehicle::CarSpec;
