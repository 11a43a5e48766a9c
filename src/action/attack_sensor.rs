//! Hostile detection and attack range checks.

use bevy::prelude::*;

use crate::flock::filter::{FlockId, flock_bit};

/// Detects hostile units near its owner and checks attack range.
///
/// `active` mirrors whether the detection volume is live at all;
/// `enabled` gates the per-frame stay reports while it is live.
#[derive(Component, Debug, Clone, PartialEq, Reflect)]
#[reflect(Component)]
pub struct AttackSensor {
    pub active: bool,
    pub enabled: bool,
    /// Bit `n` set: units of flock `n` are hostile.
    pub hostile_mask: u32,
    pub min_range: f32,
    pub max_range: f32,
    pub angle_check: bool,
    /// Half-angle of the facing cone, in degrees.
    pub angle: f32,
}

impl Default for AttackSensor {
    fn default() -> Self {
        Self {
            active: false,
            enabled: true,
            hostile_mask: 0,
            min_range: 0.0,
            max_range: 0.0,
            angle_check: false,
            angle: 0.0,
        }
    }
}

impl AttackSensor {
    /// Builder: flag every flock in `ids` hostile.
    #[must_use]
    pub fn hostile_to(mut self, ids: &[FlockId]) -> Self {
        for &id in ids {
            self.hostile_mask |= flock_bit(id);
        }
        self
    }

    #[must_use]
    pub const fn verify(&self, flock_id: FlockId) -> bool {
        self.hostile_mask & flock_bit(flock_id) != 0
    }

    /// Is `target` within `[min_range, max_range]` of `position`, and,
    /// with the angle check on, strictly inside the facing cone?
    #[must_use]
    pub fn check_range(&self, position: Vec2, facing: Vec2, target: Vec2) -> bool {
        let delta = target - position;
        let distance = delta.length();
        if distance < self.min_range || distance > self.max_range {
            return false;
        }
        if !self.angle_check {
            return true;
        }
        let cos_theta = self.angle.to_radians().cos();
        let dir = if distance > 0.0 {
            delta / distance
        } else {
            Vec2::ZERO
        };
        dir.dot(facing) > cos_theta
    }
}

/// Trigger volume feeding hostile stays to the [`AttackSensor`] on `owner`.
#[derive(Component, Debug, Clone, Copy, Reflect)]
#[reflect(Component)]
pub struct AttackVolume {
    pub owner: Entity,
}
