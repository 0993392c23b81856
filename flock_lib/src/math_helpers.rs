use glam::Vec2;

use crate::{
    agent::Agent,
    options::{FlockOptions, SpeedLimit},
};

pub fn distance_agent(a1: &Agent, a2: &Agent) -> f32 {
    simple_distance(a1.position, a2.position)
}

pub fn simple_distance(p1: Vec2, p2: Vec2) -> f32 {
    simple_distance_sq(p1, p2).sqrt()
}

pub fn simple_distance_sq(p1: Vec2, p2: Vec2) -> f32 {
    (p1.x - p2.x).powi(2) + (p1.y - p2.y).powi(2)
}

/// Rescales `v` to the given magnitude, or `None` when `v` has no direction.
///
/// Every rule normalises through here, a zero-length vector is how a rule
/// says "nothing to steer towards this tick".
#[inline]
pub fn normalize_to(v: Vec2, magnitude: f32) -> Option<Vec2> {
    let length = v.length();
    if length == 0. || !length.is_finite() {
        None
    } else {
        Some(v / length * magnitude)
    }
}

/// Caps a component from above only, `min(x, maximum)`.
#[inline]
pub fn limit_upper(x: f32, maximum: f32) -> f32 {
    if x < maximum {
        x
    } else {
        maximum
    }
}

pub fn limit_velocity(velocity: Vec2, options: &FlockOptions) -> Vec2 {
    match options.speed_limit {
        SpeedLimit::Magnitude => velocity.clamp_length_max(options.max_speed),
        SpeedLimit::AxisUpper => Vec2::new(
            limit_upper(velocity.x, options.max_speed),
            limit_upper(velocity.y, options.max_speed),
        ),
    }
}
