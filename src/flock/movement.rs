//! Bevy drivers for [`FlockUnit`]: seek checks on the frame tick, steering
//! forces on the fixed tick.

use std::collections::HashMap;

use avian2d::prelude::*;
use bevy::prelude::*;

use super::filter::UnitFilter;
use super::mover::Mover;
use super::pathing::PathQueue;
use super::sensor::ProximitySensor;
use super::unit::{FlockUnit, Neighbour, UnitBody};
use crate::third_party::WallProbe;

/// Immutable per-tick copy of a unit body, read by every neighbour.
#[derive(Debug, Clone, Copy)]
struct BodySnapshot {
    filter: UnitFilter,
    position: Vec2,
    velocity: Vec2,
    dynamic: bool,
}

impl BodySnapshot {
    const fn as_neighbour(&self) -> Neighbour {
        Neighbour {
            id: self.filter.id,
            position: self.position,
            velocity: if self.filter.legit && self.dynamic {
                Some(self.velocity)
            } else {
                None
            },
        }
    }
}

/// Frame tick: obstruction checks, path requests and wall probes.
///
/// A move target that no longer resolves to an entity is cleared.
/// Runs in `FlockSet::Plan`, before the queue is resolved.
pub fn seek_unit_paths(
    time: Res<Time>,
    probe: WallProbe,
    mut queue: ResMut<PathQueue>,
    mut units: Query<(
        Entity,
        &mut FlockUnit,
        &mut Mover,
        &GlobalTransform,
        &LinearVelocity,
    )>,
    goals: Query<&GlobalTransform>,
) {
    let dt = time.delta_secs();
    for (entity, mut unit, mut mover, transform, velocity) in &mut units {
        mover.observe(velocity.0);

        let goal = match unit.move_target() {
            Some(target) => match goals.get(target) {
                Ok(goal) => Some(goal.translation().xy()),
                Err(_) => {
                    debug!(unit = ?entity, ?target, "move target gone, clearing");
                    unit.set_move_target(None);
                    None
                }
            },
            None => None,
        };

        let body = UnitBody {
            position: transform.translation().xy(),
            velocity: velocity.0,
            facing: mover.dir(),
            max_speed: mover.max_speed,
        };
        unit.tick(dt, &body, goal, &probe, &mut queue.for_unit(entity));
    }
}

/// Fixed tick: blend steering forces and integrate them into `LinearVelocity`.
///
/// Neighbours are read from a snapshot taken before any velocity is
/// written, so every unit sees the same tick. Sensed entities without a
/// body are skipped.
pub fn steer_flock_units(
    time: Res<Time>,
    mut units: Query<(Entity, &mut FlockUnit, &mut Mover, Option<&ProximitySensor>)>,
    mut bodies: Query<(
        Entity,
        &UnitFilter,
        &GlobalTransform,
        &mut LinearVelocity,
        Option<&RigidBody>,
    )>,
    goals: Query<&GlobalTransform>,
) {
    let dt = time.delta_secs();
    let snapshots: HashMap<Entity, BodySnapshot> = bodies
        .iter()
        .map(|(entity, filter, transform, velocity, rigid_body)| {
            (
                entity,
                BodySnapshot {
                    filter: *filter,
                    position: transform.translation().xy(),
                    velocity: velocity.0,
                    dynamic: matches!(rigid_body, Some(RigidBody::Dynamic)),
                },
            )
        })
        .collect();

    let mut rng = rand::rng();
    for (entity, mut unit, mut mover, sensor) in &mut units {
        let Some(own) = snapshots.get(&entity) else {
            continue;
        };

        let neighbours: Option<Vec<Neighbour>> = sensor.map(|sensor| {
            sensor
                .items()
                .iter()
                .filter(|&&other| other != entity)
                .filter_map(|other| snapshots.get(other))
                .map(BodySnapshot::as_neighbour)
                .collect()
        });
        let goal = unit
            .move_target()
            .and_then(|target| goals.get(target).ok())
            .map(|goal| goal.translation().xy());

        let body = UnitBody {
            position: own.position,
            velocity: own.velocity,
            facing: mover.dir(),
            max_speed: mover.max_speed,
        };
        let force = unit.fixed_tick(
            dt,
            &body,
            &own.filter,
            neighbours.as_deref(),
            goal,
            &mut rng,
        );

        let Ok((_, _, _, mut velocity, _)) = bodies.get_mut(entity) else {
            continue;
        };
        mover.apply_force(&mut velocity.0, force, dt);
    }
}
