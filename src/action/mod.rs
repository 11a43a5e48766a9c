//! Action layer: what each agent moves toward, and why.
//!
//! Providers talk to agents through messages. [`AssignAction`] and
//! [`StopAction`] drive the [`FlockActionController`] on the listener;
//! [`ActionStopped`] reports assignments that ended without a successor.

pub mod attack_sensor;
pub mod controller;
pub mod target;

use avian2d::prelude::*;
use bevy::prelude::*;

use self::attack_sensor::{AttackSensor, AttackVolume};
use self::controller::{FlockActionController, WatchInputs};
use self::target::{ActionTarget, Priority};
use crate::FlockSet;
use crate::flock::filter::UnitFilter;
use crate::flock::mover::Mover;
use crate::flock::unit::FlockUnit;
use crate::third_party::CollisionLayer;

// === Messages ===

/// Ask `listener` to take on `target`, which must carry an [`ActionTarget`].
#[derive(Message, Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssignAction {
    pub listener: Entity,
    pub target: Entity,
}

/// Ask `listener` to drop its current assignment.
#[derive(Message, Debug, Clone, Copy, PartialEq, Eq)]
pub struct StopAction {
    pub listener: Entity,
    pub priority: Priority,
    pub forced: bool,
}

/// Switch hostile detection of `listener` on or off.
#[derive(Message, Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetAutoAttack {
    pub listener: Entity,
    pub enabled: bool,
}

/// Activate or deactivate `listener`. Inactive listeners refuse assignments.
#[derive(Message, Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetListenerActive {
    pub listener: Entity,
    pub active: bool,
}

/// `listener` stopped working on `target`.
#[derive(Message, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionStopped {
    pub listener: Entity,
    pub target: Entity,
    /// False when the assignment ended on its own (target gone).
    pub forced: bool,
}

// === Spawning ===

/// Attach an action controller and an attack sensor to an agent spawned
/// with `spawn_flock_unit`. The sensor's detection volume spans `max_range`.
pub fn attach_action_controller(
    commands: &mut Commands,
    unit: Entity,
    controller: FlockActionController,
    sensor: AttackSensor,
) {
    let radius = sensor.max_range.max(f32::EPSILON);
    let mut sensor = sensor;
    sensor.active = controller.config.attack_start_enable;
    commands.entity(unit).insert((controller, sensor));
    commands.spawn((
        Name::new("Attack volume"),
        ChildOf(unit),
        AttackVolume { owner: unit },
        Sensor,
        Collider::circle(radius),
        CollisionLayer::sensor(),
        CollidingEntities::default(),
        Transform::default(),
    ));
}

// === Systems ===

/// Apply provider requests in arrival order per kind: activity, auto
/// attack, stops, then assignments.
pub fn apply_action_requests(
    mut activity: MessageReader<SetListenerActive>,
    mut auto_attack: MessageReader<SetAutoAttack>,
    mut stops: MessageReader<StopAction>,
    mut assigns: MessageReader<AssignAction>,
    mut controllers: Query<(&mut FlockActionController, &mut FlockUnit, Option<&mut AttackSensor>)>,
    targets: Query<(&ActionTarget, Has<Mover>)>,
    mut stopped: MessageWriter<ActionStopped>,
) {
    let mut report = |listener: Entity, target: Option<Entity>, forced: bool| {
        if let Some(target) = target {
            stopped.write(ActionStopped {
                listener,
                target,
                forced,
            });
        }
    };

    for request in activity.read() {
        let Ok((mut controller, mut unit, mut sensor)) = controllers.get_mut(request.listener)
        else {
            continue;
        };
        let ended = controller.set_active(request.active, &mut unit, sensor.as_deref_mut());
        report(request.listener, ended.map(|a| a.target), true);
    }

    for request in auto_attack.read() {
        let Ok((mut controller, mut unit, mut sensor)) = controllers.get_mut(request.listener)
        else {
            continue;
        };
        let ended = controller.set_auto_attack(request.enabled, &mut unit, sensor.as_deref_mut());
        report(request.listener, ended.map(|a| a.target), true);
    }

    for request in stops.read() {
        let Ok((mut controller, mut unit, mut sensor)) = controllers.get_mut(request.listener)
        else {
            continue;
        };
        let ended = controller.stop_action(
            request.priority,
            request.forced,
            &mut unit,
            sensor.as_deref_mut(),
        );
        report(request.listener, ended.map(|a| a.target), request.forced);
    }

    for request in assigns.read() {
        let Ok((data, has_motion)) = targets.get(request.target) else {
            debug!(target_entity = ?request.target, "assignment without action target ignored");
            continue;
        };
        let Ok((mut controller, mut unit, mut sensor)) = controllers.get_mut(request.listener)
        else {
            continue;
        };
        controller.assign(
            request.target,
            data,
            has_motion,
            &mut unit,
            sensor.as_deref_mut(),
        );
    }
}

/// Feed hostile units inside each attack volume to its owner's controller.
///
/// Only live (`active`) and enabled sensors report; only units whose flock
/// the sensor deems hostile and that carry an [`ActionTarget`] count.
pub fn sense_attack_targets(
    volumes: Query<(&AttackVolume, &CollidingEntities)>,
    mut controllers: Query<(&mut FlockActionController, &mut FlockUnit, Option<&mut AttackSensor>)>,
    filters: Query<&UnitFilter>,
    targets: Query<(&ActionTarget, Has<Mover>)>,
) {
    for (volume, colliding) in &volumes {
        let Ok((mut controller, mut unit, Some(mut sensor))) = controllers.get_mut(volume.owner)
        else {
            continue;
        };

        for &hostile in &colliding.0 {
            if !(sensor.active && sensor.enabled) {
                break;
            }
            if hostile == volume.owner {
                continue;
            }
            let Ok(filter) = filters.get(hostile) else {
                continue;
            };
            if !sensor.verify(filter.id) {
                continue;
            }
            let Ok((data, has_motion)) = targets.get(hostile) else {
                continue;
            };
            controller.auto_attack_check(hostile, data, has_motion, &mut unit, Some(&mut *sensor));
        }
    }
}

/// Run the return-to-leader and follow-stop watches. Assignments whose
/// target is gone finish here.
pub fn run_action_watches(
    time: Res<Time>,
    mut controllers: Query<(
        Entity,
        &mut FlockActionController,
        &mut FlockUnit,
        Option<&mut AttackSensor>,
        &GlobalTransform,
    )>,
    positions: Query<&GlobalTransform>,
    movers: Query<&Mover>,
    mut stopped: MessageWriter<ActionStopped>,
) {
    let dt = time.delta_secs();
    for (entity, mut controller, mut unit, mut sensor, transform) in &mut controllers {
        let Some(current) = controller.current().copied() else {
            continue;
        };
        if positions.get(current.target).is_err() {
            debug!(listener = ?entity, "action target gone");
            controller.finish_action(&mut unit, sensor.as_deref_mut());
            stopped.write(ActionStopped {
                listener: entity,
                target: current.target,
                forced: false,
            });
            continue;
        }

        let inputs = WatchInputs {
            position: transform.translation().xy(),
            leader_position: controller
                .leader
                .and_then(|leader| positions.get(leader).ok())
                .map(|leader| leader.translation().xy()),
            target_speed: movers.get(current.target).ok().map(Mover::cur_speed),
        };
        if let Some(ended) = controller.fixed_tick(dt, &inputs, &mut unit, sensor.as_deref_mut()) {
            stopped.write(ActionStopped {
                listener: entity,
                target: ended.target,
                forced: true,
            });
        }
    }
}

// === Plugin ===

pub(super) fn plugin(app: &mut App) {
    app.register_type::<FlockActionController>()
        .register_type::<AttackSensor>()
        .register_type::<AttackVolume>()
        .register_type::<ActionTarget>()
        .add_message::<AssignAction>()
        .add_message::<StopAction>()
        .add_message::<SetAutoAttack>()
        .add_message::<SetListenerActive>()
        .add_message::<ActionStopped>();

    app.add_systems(
        Update,
        (apply_action_requests, sense_attack_targets)
            .chain()
            .in_set(FlockSet::Act),
    );
    app.add_systems(FixedUpdate, run_action_watches.in_set(FlockSet::Act));
}
