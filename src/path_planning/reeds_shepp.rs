//! Reeds-Shepp shortest paths for a car that can drive both ways
//!
//! The 48 path words from Reeds and Shepp's paper collapse to 12 base
//! formulas, each expressed for a path starting with a forward left turn
//! on the unit circle. The remaining 36 words come from two input
//! transforms: a time flip (reverses every gear) and a reflection (swaps
//! left and right). The goal pose is first normalized into the start
//! pose's frame and scaled by the turning radius, so all formulas work on
//! the unit circle with segment lengths in radians.
//!
//! Ties between words resolve to the first word in table order, strictly.

use std::f64::consts::{FRAC_PI_2, PI};

use crate::common::types::{Point2D, Pose2D};
use crate::utils::angles::{wrap_to_2pi, wrap_to_pi};

/// Arc-length step used when tracing waypoints along a path
const STEP_DISTANCE: f64 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Steering {
    Left,
    Straight,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gear {
    Forward,
    Back,
}

/// One constant-steering piece of a path. `length` is in radians on the
/// unit circle; multiply by the turning radius for world distance.
#[derive(Debug, Clone, Copy)]
pub struct Segment {
    pub steering: Steering,
    pub gear: Gear,
    pub length: f64,
}

/// Pose sampled along a path, tagged with how the car is moving there
#[derive(Debug, Clone, Copy)]
pub struct Waypoint {
    pub pos: Point2D,
    pub heading: f64,
    pub gear: Gear,
    pub steering: Steering,
}

#[derive(Debug, Clone, Copy)]
struct PathLengths {
    t: f64,
    u: f64,
    v: f64,
    total: f64,
}

/// A curve segment must turn between 0 and pi radians
fn valid_turn(length: f64) -> bool {
    length >= 0.0 && length <= PI
}

/// Polar coordinates (r, theta) of (x, y)
fn polar(x: f64, y: f64) -> (f64, f64) {
    ((x * x + y * y).sqrt(), y.atan2(x))
}

// The 12 base formulas. Names list the segments of the word: steering
// letter (L/S/R), then gear (f/b), with u/b marking the equal-length pair
// and pi2 a fixed quarter turn.

fn lf_sf_lf(x: f64, y: f64, phi: f64) -> Option<PathLengths> {
    let (u, t) = polar(x - phi.sin(), y - 1.0 + phi.cos());
    let v = wrap_to_pi(phi - t);
    if !valid_turn(t) || !valid_turn(v) {
        return None;
    }
    Some(PathLengths { t, u, v, total: t + u + v })
}

fn lf_sf_rf(x: f64, y: f64, phi: f64) -> Option<PathLengths> {
    let (u1, t1) = polar(x + phi.sin(), y - 1.0 - phi.cos());
    if u1 * u1 < 4.0 {
        return None;
    }
    let u = (u1 * u1 - 4.0).sqrt();
    let (_, theta) = polar(u, 2.0);
    let t = wrap_to_pi(t1 + theta);
    let v = wrap_to_pi(t - phi);
    if !valid_turn(t) || !valid_turn(v) {
        return None;
    }
    Some(PathLengths { t, u, v, total: t + u + v })
}

fn lf_rb_lf(x: f64, y: f64, phi: f64) -> Option<PathLengths> {
    let (u1, theta) = polar(x - phi.sin(), y - 1.0 + phi.cos());
    if u1 > 4.0 {
        return None;
    }
    let a = (u1 / 4.0).acos();
    let t = wrap_to_pi(FRAC_PI_2 + a + theta);
    let u = wrap_to_pi(PI - 2.0 * a);
    let v = wrap_to_pi(phi - t - u);
    if !valid_turn(t) || !valid_turn(u) || !valid_turn(v) {
        return None;
    }
    Some(PathLengths { t, u, v, total: t + u + v })
}

fn lf_rb_lb(x: f64, y: f64, phi: f64) -> Option<PathLengths> {
    let (u1, theta) = polar(x - phi.sin(), y - 1.0 + phi.cos());
    if u1 > 4.0 {
        return None;
    }
    let a = (u1 / 4.0).acos();
    let t = wrap_to_pi(FRAC_PI_2 + a + theta);
    let u = wrap_to_pi(PI - 2.0 * a);
    let v = wrap_to_pi(t + u - phi);
    if !valid_turn(t) || !valid_turn(u) || !valid_turn(v) {
        return None;
    }
    Some(PathLengths { t, u, v, total: t + u + v })
}

fn lf_rf_lb(x: f64, y: f64, phi: f64) -> Option<PathLengths> {
    let (u1, theta) = polar(x - phi.sin(), y - 1.0 + phi.cos());
    if u1 > 4.0 {
        return None;
    }
    let u = ((8.0 - u1 * u1) / 8.0).acos();
    let a = (2.0 * u.sin() / u1).asin();
    let t = wrap_to_pi(FRAC_PI_2 - a + theta);
    let v = wrap_to_pi(t - u - phi);
    if !valid_turn(t) || !valid_turn(u) || !valid_turn(v) {
        return None;
    }
    Some(PathLengths { t, u, v, total: t + u + v })
}

fn lf_ruf_lub_rb(x: f64, y: f64, phi: f64) -> Option<PathLengths> {
    let (u1, theta) = polar(x + phi.sin(), y - 1.0 - phi.cos());
    if u1 > 4.0 {
        return None;
    }
    let (t, u) = if u1 > 2.0 {
        let a = (u1 / 4.0 - 0.5).acos();
        (wrap_to_pi(FRAC_PI_2 + theta - a), wrap_to_pi(PI - a))
    } else {
        let a = (u1 / 4.0 + 0.5).acos();
        (wrap_to_pi(FRAC_PI_2 + theta + a), wrap_to_pi(a))
    };
    let v = wrap_to_pi(phi - t + 2.0 * u);
    if !valid_turn(t) || !valid_turn(u) || !valid_turn(v) {
        return None;
    }
    Some(PathLengths { t, u, v, total: t + 2.0 * u + v })
}

fn lf_rub_lub_rf(x: f64, y: f64, phi: f64) -> Option<PathLengths> {
    let (u1, theta) = polar(x + phi.sin(), y - 1.0 - phi.cos());
    if u1 > 6.0 {
        return None;
    }
    let va1 = 1.25 - u1 * u1 / 16.0;
    if va1 < 0.0 || va1 > 1.0 {
        return None;
    }
    let u = va1.acos();
    let a = (2.0 * u.sin() / u1).asin();
    let t = wrap_to_pi(FRAC_PI_2 + theta + a);
    let v = wrap_to_pi(t - phi);
    if !valid_turn(t) || !valid_turn(u) || !valid_turn(v) {
        return None;
    }
    Some(PathLengths { t, u, v, total: t + 2.0 * u + v })
}

fn lf_rbpi2_sb_lb(x: f64, y: f64, phi: f64) -> Option<PathLengths> {
    let (u1, theta) = polar(x - phi.sin(), y - 1.0 + phi.cos());
    if u1 * u1 < 4.0 {
        return None;
    }
    let u = (u1 * u1 - 4.0).sqrt() - 2.0;
    if u < 0.0 {
        return None;
    }
    let a = 2f64.atan2(u + 2.0);
    let t = wrap_to_pi(FRAC_PI_2 + theta + a);
    let v = wrap_to_pi(t + FRAC_PI_2 - phi);
    if !valid_turn(t) || !valid_turn(v) {
        return None;
    }
    Some(PathLengths { t, u, v, total: t + FRAC_PI_2 + u + v })
}

fn lf_rbpi2_sb_rb(x: f64, y: f64, phi: f64) -> Option<PathLengths> {
    let (u1, theta) = polar(x + phi.sin(), y - 1.0 - phi.cos());
    if u1 < 2.0 {
        return None;
    }
    let t = wrap_to_pi(FRAC_PI_2 + theta);
    let u = u1 - 2.0;
    let v = wrap_to_pi(phi - t - FRAC_PI_2);
    if !valid_turn(t) || !valid_turn(v) {
        return None;
    }
    Some(PathLengths { t, u, v, total: t + FRAC_PI_2 + u + v })
}

fn lf_sf_rfpi2_lb(x: f64, y: f64, phi: f64) -> Option<PathLengths> {
    let (u1, theta) = polar(x - phi.sin(), y - 1.0 + phi.cos());
    if u1 < 4.0 {
        return None;
    }
    let u = (u1 * u1 - 4.0).sqrt() - 2.0;
    if u < 0.0 {
        return None;
    }
    let a = (u + 2.0).atan2(2.0);
    let t = wrap_to_pi(FRAC_PI_2 + theta - a);
    let v = wrap_to_pi(t - FRAC_PI_2 - phi);
    if !valid_turn(t) || !valid_turn(v) {
        return None;
    }
    Some(PathLengths { t, u, v, total: t + u + FRAC_PI_2 + v })
}

fn lf_sf_lfpi2_rb(x: f64, y: f64, phi: f64) -> Option<PathLengths> {
    let (u1, theta) = polar(x + phi.sin(), y - 1.0 - phi.cos());
    if u1 < 2.0 {
        return None;
    }
    let t = wrap_to_pi(theta);
    let u = u1 - 2.0;
    let v = wrap_to_pi(phi - t - FRAC_PI_2);
    if !valid_turn(t) || !valid_turn(v) {
        return None;
    }
    Some(PathLengths { t, u, v, total: t + u + FRAC_PI_2 + v })
}

fn lf_rbpi2_sb_lbpi2_rf(x: f64, y: f64, phi: f64) -> Option<PathLengths> {
    let (u1, theta) = polar(x + phi.sin(), y - 1.0 - phi.cos());
    if u1 * u1 < 16.0 {
        return None;
    }
    let u = (u1 * u1 - 4.0).sqrt() - 4.0;
    if u < 0.0 {
        return None;
    }
    let a = 2f64.atan2(u + 4.0);
    let t = wrap_to_pi(FRAC_PI_2 + theta + a);
    let v = wrap_to_pi(t - phi);
    if !valid_turn(t) || !valid_turn(v) {
        return None;
    }
    Some(PathLengths { t, u, v, total: t + u + PI + v })
}

/// Which computed length a template segment takes
#[derive(Debug, Clone, Copy)]
enum SegLen {
    T,
    U,
    V,
    HalfPi,
}

type Formula = fn(f64, f64, f64) -> Option<PathLengths>;

struct BaseWord {
    formula: Formula,
    segments: &'static [(Steering, Gear, SegLen)],
}

use Gear::{Back, Forward};
use SegLen::{HalfPi, T, U, V};
use Steering::{Left, Right, Straight};

/// The 12 base words, in the fixed tie-break order
static BASE_WORDS: [BaseWord; 12] = [
    BaseWord {
        formula: lf_sf_lf,
        segments: &[(Left, Forward, T), (Straight, Forward, U), (Left, Forward, V)],
    },
    BaseWord {
        formula: lf_sf_rf,
        segments: &[(Left, Forward, T), (Straight, Forward, U), (Right, Forward, V)],
    },
    BaseWord {
        formula: lf_rb_lf,
        segments: &[(Left, Forward, T), (Right, Back, U), (Left, Forward, V)],
    },
    BaseWord {
        formula: lf_rb_lb,
        segments: &[(Left, Forward, T), (Right, Back, U), (Left, Back, V)],
    },
    BaseWord {
        formula: lf_rf_lb,
        segments: &[(Left, Forward, T), (Right, Forward, U), (Left, Back, V)],
    },
    BaseWord {
        formula: lf_ruf_lub_rb,
        segments: &[
            (Left, Forward, T),
            (Right, Forward, U),
            (Left, Back, U),
            (Right, Back, V),
        ],
    },
    BaseWord {
        formula: lf_rub_lub_rf,
        segments: &[
            (Left, Forward, T),
            (Right, Back, U),
            (Left, Back, U),
            (Right, Forward, V),
        ],
    },
    BaseWord {
        formula: lf_rbpi2_sb_lb,
        segments: &[
            (Left, Forward, T),
            (Right, Back, HalfPi),
            (Straight, Back, U),
            (Left, Back, V),
        ],
    },
    BaseWord {
        formula: lf_rbpi2_sb_rb,
        segments: &[
            (Left, Forward, T),
            (Right, Back, HalfPi),
            (Straight, Back, U),
            (Right, Back, V),
        ],
    },
    BaseWord {
        formula: lf_sf_rfpi2_lb,
        segments: &[
            (Left, Forward, T),
            (Straight, Forward, U),
            (Right, Forward, HalfPi),
            (Left, Back, V),
        ],
    },
    BaseWord {
        formula: lf_sf_lfpi2_rb,
        segments: &[
            (Left, Forward, T),
            (Straight, Forward, U),
            (Left, Forward, HalfPi),
            (Right, Back, V),
        ],
    },
    BaseWord {
        formula: lf_rbpi2_sb_lbpi2_rf,
        segments: &[
            (Left, Forward, T),
            (Right, Back, HalfPi),
            (Straight, Back, U),
            (Left, Back, HalfPi),
            (Right, Forward, V),
        ],
    },
];

/// Transform order within each base word, fixing the overall table order
const TRANSFORMS: [(bool, bool); 4] = [(false, false), (true, false), (false, true), (true, true)];

fn transform_input(x: f64, y: f64, phi: f64, time_flip: bool, reflect: bool) -> (f64, f64, f64) {
    match (time_flip, reflect) {
        (false, false) => (x, y, phi),
        (true, false) => (-x, y, -phi),
        (false, true) => (x, -y, -phi),
        (true, true) => (-x, -y, phi),
    }
}

fn flip_gear(gear: Gear) -> Gear {
    match gear {
        Forward => Back,
        Back => Forward,
    }
}

fn reflect_steering(steering: Steering) -> Steering {
    match steering {
        Left => Right,
        Straight => Straight,
        Right => Left,
    }
}

fn word_segments(
    word: &BaseWord,
    lengths: &PathLengths,
    time_flip: bool,
    reflect: bool,
) -> Vec<Segment> {
    word.segments
        .iter()
        .map(|&(steering, gear, len)| Segment {
            steering: if reflect { reflect_steering(steering) } else { steering },
            gear: if time_flip { flip_gear(gear) } else { gear },
            length: match len {
                T => lengths.t,
                U => lengths.u,
                V => lengths.v,
                HalfPi => FRAC_PI_2,
            },
        })
        .collect()
}

/// Goal pose in the start frame, scaled to the unit circle
fn normalize_goal(start: Pose2D, goal: Pose2D, turning_radius: f64) -> (f64, f64, f64) {
    let dx = (goal.x - start.x) / turning_radius;
    let dy = (goal.y - start.y) / turning_radius;
    let (sin_t, cos_t) = start.yaw.sin_cos();
    (
        dx * cos_t + dy * sin_t,
        -dx * sin_t + dy * cos_t,
        wrap_to_pi(goal.yaw - start.yaw),
    )
}

fn shortest_word(x: f64, y: f64, phi: f64) -> Option<(usize, bool, bool, PathLengths)> {
    let mut best: Option<(usize, bool, bool, PathLengths)> = None;
    for (i, word) in BASE_WORDS.iter().enumerate() {
        for &(time_flip, reflect) in &TRANSFORMS {
            let (tx, ty, tphi) = transform_input(x, y, phi, time_flip, reflect);
            if let Some(lengths) = (word.formula)(tx, ty, tphi) {
                let better = match &best {
                    None => true,
                    Some((_, _, _, b)) => lengths.total < b.total,
                };
                if better {
                    best = Some((i, time_flip, reflect, lengths));
                }
            }
        }
    }
    best
}

/// Length of the shortest path between the poses, in world units.
/// Returns `f64::MAX` when no word is valid.
pub fn shortest_distance(start: Pose2D, goal: Pose2D, turning_radius: f64) -> f64 {
    let (x, y, phi) = normalize_goal(start, goal, turning_radius);
    match shortest_word(x, y, phi) {
        Some((_, _, _, lengths)) => lengths.total * turning_radius,
        None => f64::MAX,
    }
}

/// Segments of the shortest path, lengths in radians on the unit circle
pub fn shortest_path_segments(start: Pose2D, goal: Pose2D, turning_radius: f64) -> Option<Vec<Segment>> {
    let (x, y, phi) = normalize_goal(start, goal, turning_radius);
    let (i, time_flip, reflect, lengths) = shortest_word(x, y, phi)?;
    Some(word_segments(&BASE_WORDS[i], &lengths, time_flip, reflect))
}

/// Waypoints along the shortest path, roughly `waypoint_distance` apart.
/// With `generate_one_wp` the trace stops after the first emitted
/// waypoint, which is all the planner's shortcut needs.
pub fn shortest_path(
    start: Pose2D,
    goal: Pose2D,
    turning_radius: f64,
    waypoint_distance: f64,
    generate_one_wp: bool,
) -> Option<Vec<Waypoint>> {
    let segments = shortest_path_segments(start, goal, turning_radius)?;
    Some(trace_waypoints(
        &segments,
        start,
        goal.position(),
        turning_radius,
        waypoint_distance,
        generate_one_wp,
    ))
}

fn steer_sign(steering: Steering) -> f64 {
    match steering {
        Left => 1.0,
        Straight => 0.0,
        Right => -1.0,
    }
}

fn trace_waypoints(
    segments: &[Segment],
    start: Pose2D,
    goal_pos: Point2D,
    turning_radius: f64,
    waypoint_distance: f64,
    generate_one_wp: bool,
) -> Vec<Waypoint> {
    let mut waypoints = Vec::new();
    let mut pos = start.position();
    let mut heading = start.yaw;
    let mut drive_distance = 0.0;

    if let Some(first) = segments.first() {
        waypoints.push(Waypoint {
            pos,
            heading,
            gear: first.gear,
            steering: first.steering,
        });
    }

    for segment in segments {
        let world_length = segment.length * turning_radius;
        let steps = (world_length / STEP_DISTANCE).ceil() as usize;
        if steps == 0 {
            continue;
        }
        let step_length = world_length / steps as f64;
        let gear_sign = match segment.gear {
            Forward => 1.0,
            Back => -1.0,
        };
        let steer = steer_sign(segment.steering);

        for _ in 0..steps {
            pos = Point2D::new(
                pos.x + gear_sign * step_length * heading.cos(),
                pos.y + gear_sign * step_length * heading.sin(),
            );
            heading = wrap_to_2pi(heading + gear_sign * steer * step_length / turning_radius);
            drive_distance += step_length;
            if drive_distance > waypoint_distance {
                drive_distance -= waypoint_distance;
                waypoints.push(Waypoint {
                    pos,
                    heading,
                    gear: segment.gear,
                    steering: segment.steering,
                });
                if generate_one_wp {
                    return waypoints;
                }
            }
        }
        waypoints.push(Waypoint {
            pos,
            heading,
            gear: segment.gear,
            steering: segment.steering,
        });
    }

    // Integration drift accumulates over the steps; pin the endpoint
    if let Some(last) = waypoints.last_mut() {
        last.pos = goal_pos;
    }
    waypoints
}
