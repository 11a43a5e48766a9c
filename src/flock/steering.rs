//! Steering primitive shared by every flock force.

use bevy::prelude::*;

/// Bounded steering force that turns `velocity` toward `desired`.
///
/// The correction `desired - velocity` is scaled by `factor` and its
/// magnitude capped at `max_force`, so the result never exceeds
/// `max_force` regardless of the inputs.
#[must_use]
pub fn steer(velocity: Vec2, desired: Vec2, max_force: f32, factor: f32) -> Vec2 {
    ((desired - velocity) * factor).clamp_length_max(max_force.max(0.0))
}

/// Steer toward a world position at full `max_speed`.
#[must_use]
pub fn seek(
    position: Vec2,
    target: Vec2,
    velocity: Vec2,
    max_speed: f32,
    max_force: f32,
    factor: f32,
) -> Vec2 {
    let desired = (target - position).normalize_or_zero();
    steer(velocity, desired * max_speed, max_force, factor)
}
