//! Utility modules for vehicle_pathfinding

pub mod angles;
pub mod visualization;

pub use angles::*;
pub use visualization::{colors, PathStyle, PointStyle, Visualizer};
