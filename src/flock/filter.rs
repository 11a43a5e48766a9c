//! Flock identity and hostility predicate.

use bevy::prelude::*;

/// Group tag. Units sharing an id flock together.
pub type FlockId = u8;

/// Highest usable flock id; ids index bits of a `u32` mask.
pub const MAX_FLOCK_ID: FlockId = 31;

/// Classifies sensed neighbours as same-group or hostile.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Reflect)]
#[reflect(Component)]
pub struct UnitFilter {
    pub id: FlockId,
    /// Bit `n` set: units of flock `n` are avoided.
    pub avoid_mask: u32,
    /// Only legit units with a dynamic body are aligned with and cohered to.
    pub legit: bool,
}

impl Default for UnitFilter {
    fn default() -> Self {
        Self::new(0)
    }
}

impl UnitFilter {
    #[must_use]
    pub const fn new(id: FlockId) -> Self {
        Self {
            id,
            avoid_mask: 0,
            legit: true,
        }
    }

    /// Builder: avoid every flock in `ids`.
    #[must_use]
    pub fn avoiding(mut self, ids: &[FlockId]) -> Self {
        for &id in ids {
            self.avoid_mask |= flock_bit(id);
        }
        self
    }

    /// True when `other` belongs to a flock this unit avoids.
    #[must_use]
    pub const fn check_avoid(&self, other: FlockId) -> bool {
        self.avoid_mask & flock_bit(other) != 0
    }

    #[must_use]
    pub const fn same_group(&self, other: FlockId) -> bool {
        self.id == other
    }
}

/// Mask bit for a flock id. Ids past [`MAX_FLOCK_ID`] have no bit.
#[must_use]
pub const fn flock_bit(id: FlockId) -> u32 {
    if id > MAX_FLOCK_ID { 0 } else { 1 << id }
}
