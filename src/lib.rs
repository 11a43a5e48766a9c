//! Continuous steering for 2D flock agents.
//!
//! Agents ([`flock::unit::FlockUnit`]) blend separation, alignment, cohesion,
//! avoidance, path-following and wall-avoidance forces. When the straight
//! line to their goal is walled off they ask the navmesh for a path. The
//! [`action`] layer decides what each agent moves toward.

pub mod action;
pub mod flock;
pub mod prelude;
#[cfg(test)]
pub mod testing;
pub mod third_party;

use bevy::prelude::*;

/// System ordering for flock agents.
///
/// On `Update`: `Sense` → `Act` → `Plan`. On `FixedUpdate`: `Act` → `Steer`.
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FlockSet {
    /// Trigger volumes are mirrored into sensors.
    Sense,
    /// Action requests, auto-attack checks, and (fixed tick) action watches.
    Act,
    /// Path completions, seek checks, wall probes and path resolution.
    Plan,
    /// Forces are computed and integrated into velocities.
    Steer,
}

/// Physics, navmesh, flock agents and the action layer.
#[derive(Debug, Clone, Copy, Default)]
pub struct FlockSteeringPlugin;

impl Plugin for FlockSteeringPlugin {
    fn build(&self, app: &mut App) {
        app.configure_sets(
            Update,
            (FlockSet::Sense, FlockSet::Act, FlockSet::Plan).chain(),
        );
        app.configure_sets(FixedUpdate, (FlockSet::Act, FlockSet::Steer).chain());

        app.add_plugins((third_party::plugin, flock::plugin, action::plugin));
    }
}
