//! Proximity sensing: the live set of nearby flock members.
//!
//! The neighbour set is fed by a trigger volume. A child entity carrying
//! [`ProximityVolume`], a `Sensor` collider and `CollidingEntities` reports
//! overlaps; [`sync_proximity_sensors`] diffs them into the owner's
//! [`ProximitySensor`] as enter/exit events.

use avian2d::prelude::*;
use bevy::prelude::*;

use super::filter::UnitFilter;

/// Neighbours currently inside the owner's detection radius.
#[derive(Component, Debug, Clone, Reflect)]
#[reflect(Component)]
pub struct ProximitySensor {
    pub enabled: bool,
    items: Vec<Entity>,
}

impl Default for ProximitySensor {
    fn default() -> Self {
        Self {
            enabled: true,
            items: Vec::new(),
        }
    }
}

impl ProximitySensor {
    /// Snapshot of sensed entities. Order carries no meaning.
    #[must_use]
    pub fn items(&self) -> &[Entity] {
        &self.items
    }

    #[must_use]
    pub fn contains(&self, entity: Entity) -> bool {
        self.items.contains(&entity)
    }

    pub fn enter(&mut self, entity: Entity) {
        if !self.contains(entity) {
            self.items.push(entity);
        }
    }

    /// Overlap persists. Recovers entries missed by an earlier enter.
    pub fn stay(&mut self, entity: Entity) {
        self.enter(entity);
    }

    pub fn exit(&mut self, entity: Entity) {
        self.items.retain(|&e| e != entity);
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Back to a freshly spawned sensor.
    pub fn reset(&mut self) {
        self.enabled = true;
        self.items.clear();
    }
}

/// Trigger volume feeding the [`ProximitySensor`] on `owner`.
#[derive(Component, Debug, Clone, Copy, Reflect)]
#[reflect(Component)]
pub struct ProximityVolume {
    pub owner: Entity,
}

/// Mirror each volume's overlaps into its owner's sensor.
///
/// Only entities with a [`UnitFilter`] count as neighbours. The owner is
/// never added to its own set. Disabled sensors are left untouched.
pub fn sync_proximity_sensors(
    volumes: Query<(&ProximityVolume, &CollidingEntities)>,
    mut sensors: Query<&mut ProximitySensor>,
    filters: Query<(), With<UnitFilter>>,
) {
    for (volume, colliding) in &volumes {
        let Ok(mut sensor) = sensors.get_mut(volume.owner) else {
            continue;
        };
        if !sensor.enabled {
            continue;
        }

        let departed: Vec<Entity> = sensor
            .items()
            .iter()
            .copied()
            .filter(|e| !colliding.0.contains(e))
            .collect();
        for entity in departed {
            sensor.exit(entity);
        }

        for &entity in &colliding.0 {
            if entity == volume.owner || filters.get(entity).is_err() {
                continue;
            }
            sensor.stay(entity);
        }
    }
}
