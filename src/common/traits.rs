//! Common traits defining interfaces for planning algorithms

use crate::common::error::RoboticsError;
use crate::common::types::*;

/// Trait for planners that connect full vehicle poses
pub trait PosePlanner {
    /// Plan a path from a start pose to a goal pose
    fn plan_pose(&mut self, start: Pose2D, goal: Pose2D) -> Result<Path2D, RoboticsError>;
}
