//! Vehicle geometry and kinematic motion models
//!
//! A `CarSpec` describes one rigid body: tractor, passenger car, or
//! trailer. Distances are measured from the body's pivot point (the rear
//! axle for a car, the attachment point for a trailer), positive toward
//! the listed feature. Positions handed to the planner always refer to the
//! pivot.

use crate::common::types::{Point2D, Pose2D};
use crate::geometry::Rectangle;
use crate::utils::angles::wrap_to_2pi;

/// Geometry of one vehicle body
#[derive(Debug, Clone)]
pub struct CarSpec {
    pub width: f64,
    /// Minimum turning radius of the rear axle
    pub turning_radius: f64,
    /// Maximum steering angle in radians
    pub max_steer_angle: f64,
    pub pivot_to_front: f64,
    pub pivot_to_rear: f64,
    pub pivot_to_front_wheels: f64,
    pub pivot_to_rear_wheels: f64,
    /// Distance behind the pivot where a trailer attaches
    pub pivot_to_trailer_attachment: f64,
    /// Length of the cabin, measured back from the front (semis only)
    pub cabin_length: f64,
    pub can_reverse: bool,
}

impl CarSpec {
    pub fn passenger_car() -> Self {
        let max_steer_angle = 40f64.to_radians();
        let wheel_base = 2.95;
        Self {
            width: 2.0,
            turning_radius: wheel_base / max_steer_angle.tan(),
            max_steer_angle,
            pivot_to_front: 3.5,
            pivot_to_rear: 1.0,
            pivot_to_front_wheels: wheel_base,
            pivot_to_rear_wheels: 0.0,
            pivot_to_trailer_attachment: 0.5,
            cabin_length: 0.0,
            can_reverse: true,
        }
    }

    pub fn semi_tractor() -> Self {
        let max_steer_angle = 40f64.to_radians();
        let wheel_base = 4.5;
        Self {
            width: 2.5,
            turning_radius: wheel_base / max_steer_angle.tan(),
            max_steer_angle,
            pivot_to_front: 5.0,
            pivot_to_rear: 1.0,
            pivot_to_front_wheels: wheel_base,
            pivot_to_rear_wheels: 0.0,
            pivot_to_trailer_attachment: 0.9,
            cabin_length: 4.0,
            can_reverse: true,
        }
    }

    /// Trailer pivoting around its attachment point
    pub fn trailer() -> Self {
        Self {
            width: 2.5,
            turning_radius: 0.0,
            max_steer_angle: 0.0,
            pivot_to_front: 1.0,
            pivot_to_rear: 9.0,
            pivot_to_front_wheels: 8.0,
            pivot_to_rear_wheels: 0.0,
            pivot_to_trailer_attachment: 0.0,
            cabin_length: 0.0,
            can_reverse: false,
        }
    }

    pub fn car_length(&self) -> f64 {
        self.pivot_to_front + self.pivot_to_rear
    }

    pub fn wheel_base(&self) -> f64 {
        self.pivot_to_front_wheels + self.pivot_to_rear_wheels
    }

    /// Geometric center of the body
    pub fn center_pos(&self, pivot: Point2D, heading: f64) -> Point2D {
        offset_along(pivot, heading, (self.pivot_to_front - self.pivot_to_rear) * 0.5)
    }

    pub fn front_axle_pos(&self, pivot: Point2D, heading: f64) -> Point2D {
        offset_along(pivot, heading, self.wheel_base())
    }

    pub fn trailer_attachment_point(&self, pivot: Point2D, heading: f64) -> Point2D {
        offset_along(pivot, heading, -self.pivot_to_trailer_attachment)
    }

    /// Center of the cabin section (semis)
    pub fn cabin_center(&self, pivot: Point2D, heading: f64) -> Point2D {
        offset_along(pivot, heading, self.pivot_to_front - self.cabin_length * 0.5)
    }

    /// Body footprint as an oriented rectangle
    pub fn corners(&self, pivot: Point2D, heading: f64) -> Rectangle {
        Rectangle::from_pose(
            self.center_pos(pivot, heading),
            heading,
            self.width,
            self.car_length(),
        )
    }
}

/// Point at signed distance `offset` along `heading` from `pos`
pub fn offset_along(pos: Point2D, heading: f64, offset: f64) -> Point2D {
    Point2D::new(pos.x + heading.cos() * offset, pos.y + heading.sin() * offset)
}

/// Kinematic bicycle-model step. `drive_distance` is signed: negative
/// reverses. Below a small turning angle the motion degenerates to a
/// straight line.
pub fn step_bicycle(pose: Pose2D, drive_distance: f64, steer_angle: f64, wheel_base: f64) -> Pose2D {
    let beta = (drive_distance / wheel_base) * steer_angle.tan();
    if beta.abs() < 1e-5 {
        Pose2D::new(
            pose.x + drive_distance * pose.yaw.cos(),
            pose.y + drive_distance * pose.yaw.sin(),
            wrap_to_2pi(pose.yaw + beta),
        )
    } else {
        let radius = drive_distance / beta;
        Pose2D::new(
            pose.x + radius * ((pose.yaw + beta).sin() - pose.yaw.sin()),
            pose.y - radius * ((pose.yaw + beta).cos() - pose.yaw.cos()),
            wrap_to_2pi(pose.yaw + beta),
        )
    }
}

/// Trailer heading after the tractor drives `drive_distance` (signed).
/// `tractor_heading` is the tractor heading before the step and
/// `trailer_wheel_base` the attachment-to-axle distance.
pub fn step_trailer_heading(
    trailer_heading: f64,
    tractor_heading: f64,
    drive_distance: f64,
    trailer_wheel_base: f64,
) -> f64 {
    wrap_to_2pi(
        trailer_heading
            + (drive_distance / trailer_wheel_base) * (tractor_heading - trailer_heading).sin(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::{FRAC_PI_2, PI};

    #[test]
    fn test_straight_step() {
        let pose = step_bicycle(Pose2D::new(1.0, 2.0, 0.0), 3.0, 0.0, 2.95);
        assert!((pose.x - 4.0).abs() < 1e-10);
        assert!((pose.y - 2.0).abs() < 1e-10);
        assert_eq!(pose.yaw, 0.0);
    }

    #[test]
    fn test_reverse_straight_step() {
        let pose = step_bicycle(Pose2D::new(0.0, 0.0, FRAC_PI_2), -2.0, 0.0, 2.95);
        assert!(pose.x.abs() < 1e-10);
        assert!((pose.y + 2.0).abs() < 1e-10);
    }

    #[test]
    fn test_quarter_circle_left() {
        // Steering chosen so the turning radius is exactly 5
        let wheel_base = 2.95f64;
        let steer = (wheel_base / 5.0).atan();
        let arc = 5.0 * FRAC_PI_2;
        let pose = step_bicycle(Pose2D::new(0.0, 0.0, 0.0), arc, steer, wheel_base);
        assert!((pose.x - 5.0).abs() < 1e-9);
        assert!((pose.y - 5.0).abs() < 1e-9);
        assert!((pose.yaw - FRAC_PI_2).abs() < 1e-9);
    }

    #[test]
    fn test_right_turn_heading_decreases() {
        let pose = step_bicycle(Pose2D::new(0.0, 0.0, 0.0), 1.0, -0.3, 2.95);
        assert!(pose.yaw > PI, "right turn should wrap below zero");
        assert!(pose.y < 0.0);
    }

    #[test]
    fn test_trailer_aligned_stays_aligned() {
        let h = step_trailer_heading(1.0, 1.0, 2.0, 8.0);
        assert!((h - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_trailer_pulls_toward_tractor() {
        let before = 0.0;
        let after = step_trailer_heading(before, 0.5, 2.0, 8.0);
        assert!(after > before && after < 0.5);
        // Reversing pushes the trailer heading away instead
        let reversed = step_trailer_heading(before, 0.5, -2.0, 8.0);
        assert!(wrap_to_2pi(reversed) > PI);
    }

    #[test]
    fn test_car_geometry() {
        let car = CarSpec::passenger_car();
        assert!((car.car_length() - 4.5).abs() < 1e-10);
        let center = car.center_pos(Point2D::origin(), 0.0);
        assert!((center.x - 1.25).abs() < 1e-10);
        let front = car.front_axle_pos(Point2D::origin(), FRAC_PI_2);
        assert!((front.y - car.wheel_base()).abs() < 1e-10);
    }
}
