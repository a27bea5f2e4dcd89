//! 2D geometry primitives for collision checking
//!
//! Oriented rectangles are tested for overlap by splitting each into two
//! triangles and checking every triangle pair, with a cheap axis-aligned
//! bounding box rejection first. This handles full containment as well as
//! edge crossings.

use nalgebra::Vector2;

use crate::common::types::Point2D;

/// Oriented rectangle given by its four corners.
///
/// Corner names follow the vehicle convention: front-left, front-right,
/// back-left, back-right. The axis-aligned bounds are cached on
/// construction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rectangle {
    pub front_left: Point2D,
    pub front_right: Point2D,
    pub back_left: Point2D,
    pub back_right: Point2D,
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
}

impl Rectangle {
    pub fn new(
        front_left: Point2D,
        front_right: Point2D,
        back_left: Point2D,
        back_right: Point2D,
    ) -> Self {
        let xs = [front_left.x, front_right.x, back_left.x, back_right.x];
        let ys = [front_left.y, front_right.y, back_left.y, back_right.y];
        let mut min_x = xs[0];
        let mut max_x = xs[0];
        let mut min_y = ys[0];
        let mut max_y = ys[0];
        for i in 1..4 {
            min_x = min_x.min(xs[i]);
            max_x = max_x.max(xs[i]);
            min_y = min_y.min(ys[i]);
            max_y = max_y.max(ys[i]);
        }
        Self {
            front_left,
            front_right,
            back_left,
            back_right,
            min_x,
            max_x,
            min_y,
            max_y,
        }
    }

    /// Rectangle centered on `center`, with its length axis along
    /// `heading` (radians, counter-clockwise from +x).
    pub fn from_pose(center: Point2D, heading: f64, width: f64, length: f64) -> Self {
        let forward = Vector2::new(heading.cos(), heading.sin());
        // Left of the heading direction
        let left = Vector2::new(-heading.sin(), heading.cos());
        let c = center.to_vector();
        let half_l = forward * (length * 0.5);
        let half_w = left * (width * 0.5);
        Self::new(
            Point2D::from(c + half_l + half_w),
            Point2D::from(c + half_l - half_w),
            Point2D::from(c - half_l + half_w),
            Point2D::from(c - half_l - half_w),
        )
    }

    pub fn center(&self) -> Point2D {
        Point2D::new(
            (self.front_left.x + self.front_right.x + self.back_left.x + self.back_right.x) * 0.25,
            (self.front_left.y + self.front_right.y + self.back_left.y + self.back_right.y) * 0.25,
        )
    }

    pub fn corners(&self) -> [Point2D; 4] {
        [
            self.front_left,
            self.front_right,
            self.back_left,
            self.back_right,
        ]
    }

    fn aabb_intersects(&self, other: &Rectangle) -> bool {
        self.min_x <= other.max_x
            && self.max_x >= other.min_x
            && self.min_y <= other.max_y
            && self.max_y >= other.min_y
    }
}

#[derive(Debug, Clone, Copy)]
struct Triangle {
    p1: Point2D,
    p2: Point2D,
    p3: Point2D,
}

impl Triangle {
    fn new(p1: Point2D, p2: Point2D, p3: Point2D) -> Self {
        Self { p1, p2, p3 }
    }

    fn min_x(&self) -> f64 {
        self.p1.x.min(self.p2.x).min(self.p3.x)
    }

    fn max_x(&self) -> f64 {
        self.p1.x.max(self.p2.x).max(self.p3.x)
    }

    fn min_y(&self) -> f64 {
        self.p1.y.min(self.p2.y).min(self.p3.y)
    }

    fn max_y(&self) -> f64 {
        self.p1.y.max(self.p2.y).max(self.p3.y)
    }

    fn edges(&self) -> [(Point2D, Point2D); 3] {
        [(self.p1, self.p2), (self.p2, self.p3), (self.p3, self.p1)]
    }
}

/// Whether two line segments intersect, endpoints included.
/// Parallel (and collinear) segments report no intersection.
pub fn line_segments_intersect(a1: Point2D, a2: Point2D, b1: Point2D, b2: Point2D) -> bool {
    let denominator = (b2.y - b1.y) * (a2.x - a1.x) - (b2.x - b1.x) * (a2.y - a1.y);
    if denominator == 0.0 {
        return false;
    }
    let ua = ((b2.x - b1.x) * (a1.y - b1.y) - (b2.y - b1.y) * (a1.x - b1.x)) / denominator;
    let ub = ((a2.x - a1.x) * (a1.y - b1.y) - (a2.y - a1.y) * (a1.x - b1.x)) / denominator;
    ua >= 0.0 && ua <= 1.0 && ub >= 0.0 && ub <= 1.0
}

/// Barycentric point-in-triangle test, boundary included.
fn point_in_triangle(t: &Triangle, p: Point2D) -> bool {
    let denominator =
        (t.p2.y - t.p3.y) * (t.p1.x - t.p3.x) + (t.p3.x - t.p2.x) * (t.p1.y - t.p3.y);
    let a = ((t.p2.y - t.p3.y) * (p.x - t.p3.x) + (t.p3.x - t.p2.x) * (p.y - t.p3.y)) / denominator;
    let b = ((t.p3.y - t.p1.y) * (p.x - t.p3.x) + (t.p1.x - t.p3.x) * (p.y - t.p3.y)) / denominator;
    let c = 1.0 - a - b;
    a >= 0.0 && a <= 1.0 && b >= 0.0 && b <= 1.0 && c >= 0.0 && c <= 1.0
}

fn triangles_intersect(t1: &Triangle, t2: &Triangle) -> bool {
    // AABB rejection
    if t1.max_x() < t2.min_x()
        || t1.min_x() > t2.max_x()
        || t1.max_y() < t2.min_y()
        || t1.min_y() > t2.max_y()
    {
        return false;
    }
    for (a1, a2) in t1.edges().iter() {
        for (b1, b2) in t2.edges().iter() {
            if line_segments_intersect(*a1, *a2, *b1, *b2) {
                return true;
            }
        }
    }
    // No edge crossing: one triangle may contain the other
    point_in_triangle(t2, t1.p1) || point_in_triangle(t1, t2.p1)
}

/// Whether two oriented rectangles overlap.
pub fn rectangles_intersect(r1: &Rectangle, r2: &Rectangle) -> bool {
    if !r1.aabb_intersects(r2) {
        return false;
    }
    let t1a = Triangle::new(r1.front_left, r1.front_right, r1.back_right);
    let t1b = Triangle::new(r1.front_left, r1.back_right, r1.back_left);
    let t2a = Triangle::new(r2.front_left, r2.front_right, r2.back_right);
    let t2b = Triangle::new(r2.front_left, r2.back_right, r2.back_left);
    triangles_intersect(&t1a, &t2a)
        || triangles_intersect(&t1a, &t2b)
        || triangles_intersect(&t1b, &t2a)
        || triangles_intersect(&t1b, &t2b)
}

/// Closest point on the segment [a, b] to `p`.
pub fn closest_point_on_segment(a: Point2D, b: Point2D, p: Point2D) -> Point2D {
    let ab = b.to_vector() - a.to_vector();
    let ap = p.to_vector() - a.to_vector();
    let len_sq = ab.norm_squared();
    if len_sq == 0.0 {
        return a;
    }
    let t = (ap.dot(&ab) / len_sq).max(0.0).min(1.0);
    Point2D::from(a.to_vector() + ab * t)
}
