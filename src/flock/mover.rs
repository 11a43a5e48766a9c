//! Motion body shared by every steered agent: speed cap, facing, force integration.

use bevy::prelude::*;

/// Default top speed (world units per second).
pub const DEFAULT_MAX_SPEED: f32 = 4.0;

/// Default body mass used to turn forces into velocity changes.
pub const DEFAULT_MASS: f32 = 1.0;

/// Kinematic state of an agent. The linear velocity itself lives on the
/// physics body (`LinearVelocity`); this component owns everything else.
#[derive(Component, Debug, Clone, Reflect)]
#[reflect(Component)]
pub struct Mover {
    pub max_speed: f32,
    /// Mass used by [`Mover::apply_force`]. Steering writes `LinearVelocity`
    /// directly, so this is independent of the mass avian derives from the
    /// collider and only scales steering response.
    pub mass: f32,
    /// Last non-zero heading. Starts facing +X.
    dir: Vec2,
    cur_speed: f32,
}

impl Default for Mover {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_SPEED)
    }
}

impl Mover {
    #[must_use]
    pub const fn new(max_speed: f32) -> Self {
        Self {
            max_speed,
            mass: DEFAULT_MASS,
            dir: Vec2::X,
            cur_speed: 0.0,
        }
    }

    /// Facing direction (unit length).
    #[must_use]
    pub const fn dir(&self) -> Vec2 {
        self.dir
    }

    /// Speed observed at the last [`Mover::apply_force`] / [`Mover::observe`].
    #[must_use]
    pub const fn cur_speed(&self) -> f32 {
        self.cur_speed
    }

    /// Integrate `force` over `dt` into `velocity`, then cap at `max_speed`.
    pub fn apply_force(&mut self, velocity: &mut Vec2, force: Vec2, dt: f32) {
        if self.mass > 0.0 {
            *velocity += force * (dt / self.mass);
        }
        *velocity = velocity.clamp_length_max(self.max_speed.max(0.0));
        self.observe(*velocity);
    }

    /// Refresh speed and facing from a velocity integrated elsewhere.
    pub fn observe(&mut self, velocity: Vec2) {
        self.cur_speed = velocity.length();
        if self.cur_speed > f32::EPSILON {
            self.dir = velocity / self.cur_speed;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn apply_force_accelerates_by_force_over_mass() {
        let mut mover = Mover::new(100.0);
        mover.mass = 2.0;
        let mut velocity = Vec2::ZERO;
        mover.apply_force(&mut velocity, Vec2::new(10.0, 0.0), 0.5);
        assert_eq!(velocity, Vec2::new(2.5, 0.0));
        assert_eq!(mover.dir(), Vec2::X);
    }

    #[test]
    fn apply_force_caps_speed() {
        let mut mover = Mover::new(3.0);
        let mut velocity = Vec2::ZERO;
        mover.apply_force(&mut velocity, Vec2::new(0.0, 1000.0), 1.0);
        assert!((velocity.length() - 3.0).abs() < 1e-4);
        assert!((mover.cur_speed() - 3.0).abs() < 1e-4);
        assert_eq!(mover.dir(), Vec2::Y);
    }

    #[test]
    fn facing_survives_stopping() {
        let mut mover = Mover::default();
        mover.observe(Vec2::new(0.0, -2.0));
        mover.observe(Vec2::ZERO);
        assert_eq!(mover.dir(), Vec2::NEG_Y);
        assert_eq!(mover.cur_speed(), 0.0);
    }
}
