//! Action assignments driving agent goals through the message API.

use std::time::Duration;

use avian2d::prelude::*;
use bevy::prelude::*;
use bevy::time::TimeUpdateStrategy;
use flock_steering::action::{
    ActionStopped, AssignAction, SetAutoAttack, SetListenerActive, StopAction,
    apply_action_requests, run_action_watches,
};
use flock_steering::prelude::*;
use pretty_assertions::assert_eq;

fn create_action_app() -> App {
    let mut app = App::new();
    app.add_plugins(MinimalPlugins);
    app.insert_resource(TimeUpdateStrategy::ManualDuration(Duration::from_millis(
        250,
    )));
    app.add_message::<AssignAction>()
        .add_message::<StopAction>()
        .add_message::<SetAutoAttack>()
        .add_message::<SetListenerActive>()
        .add_message::<ActionStopped>();
    app.add_systems(Update, (apply_action_requests, run_action_watches).chain());
    app.update();
    app
}

fn at(position: Vec2) -> (Transform, GlobalTransform) {
    (
        Transform::from_translation(position.extend(0.0)),
        GlobalTransform::from_translation(position.extend(0.0)),
    )
}

fn spawn_soldier(world: &mut World, position: Vec2, leader: Option<Entity>) -> Entity {
    let mut controller = FlockActionController::default();
    controller.leader = leader;
    world
        .spawn((
            FlockUnit::default(),
            UnitFilter::new(0),
            Mover::default(),
            LinearVelocity::ZERO,
            controller,
            AttackSensor {
                active: true,
                min_range: 1.0,
                max_range: 2.0,
                ..default()
            },
            at(position),
        ))
        .id()
}

fn stopped(app: &mut App) -> Vec<ActionStopped> {
    app.world_mut()
        .resource_mut::<Messages<ActionStopped>>()
        .drain()
        .collect()
}

#[test]
fn attacker_far_from_leader_is_recalled_with_high_priority() {
    let mut app = create_action_app();
    let leader = app.world_mut().spawn(at(Vec2::ZERO)).id();
    let soldier = spawn_soldier(app.world_mut(), Vec2::new(20.0, 0.0), Some(leader));
    let enemy = app
        .world_mut()
        .spawn((
            ActionTarget::new(ActionKind::Attack, Priority::Normal),
            at(Vec2::new(22.0, 0.0)),
        ))
        .id();

    app.world_mut().write_message(AssignAction {
        listener: soldier,
        target: enemy,
    });
    app.update();
    assert_eq!(
        app.world().get::<FlockUnit>(soldier).unwrap().move_target(),
        Some(enemy)
    );
    assert_eq!(
        app.world().get::<FlockUnit>(soldier).unwrap().min_move_target_distance,
        1.0
    );

    // Cancel delay is one second of 250 ms frames.
    for _ in 0..4 {
        app.update();
    }

    assert_eq!(
        stopped(&mut app),
        vec![ActionStopped {
            listener: soldier,
            target: enemy,
            forced: true
        }]
    );
    let unit = app.world().get::<FlockUnit>(soldier).unwrap();
    assert!(unit.move_target().is_none());
    assert_eq!(unit.min_move_target_distance, 0.0);
    assert!(app.world().get::<AttackSensor>(soldier).unwrap().enabled);
}

#[test]
fn attacker_between_radii_regroups_on_leader() {
    let mut app = create_action_app();
    let leader = app.world_mut().spawn(at(Vec2::ZERO)).id();
    let soldier = spawn_soldier(app.world_mut(), Vec2::new(8.0, 0.0), Some(leader));
    let enemy = app
        .world_mut()
        .spawn((
            ActionTarget::new(ActionKind::Attack, Priority::Normal),
            at(Vec2::new(10.0, 0.0)),
        ))
        .id();

    app.world_mut().write_message(AssignAction {
        listener: soldier,
        target: enemy,
    });
    for _ in 0..5 {
        app.update();
    }

    assert_eq!(
        app.world().get::<FlockUnit>(soldier).unwrap().move_target(),
        Some(leader)
    );
    assert!(stopped(&mut app).is_empty());
}

#[test]
fn higher_priority_assignment_replaces_current_one() {
    let mut app = create_action_app();
    let soldier = spawn_soldier(app.world_mut(), Vec2::ZERO, None);
    let anchor = app.world_mut().spawn(at(Vec2::new(0.0, 5.0))).id();
    let rally = app
        .world_mut()
        .spawn((
            ActionTarget::new(ActionKind::Follow, Priority::Low).with_anchor(anchor),
            at(Vec2::new(0.0, 4.0)),
        ))
        .id();
    let post = app
        .world_mut()
        .spawn((
            ActionTarget::new(ActionKind::Other, Priority::High),
            at(Vec2::new(6.0, 0.0)),
        ))
        .id();

    app.world_mut().write_message(AssignAction {
        listener: soldier,
        target: rally,
    });
    app.update();
    assert_eq!(
        app.world().get::<FlockUnit>(soldier).unwrap().move_target(),
        Some(anchor)
    );

    app.world_mut().write_message(AssignAction {
        listener: soldier,
        target: post,
    });
    app.update();

    let controller = app.world().get::<FlockActionController>(soldier).unwrap();
    assert_eq!(controller.current().map(|a| a.priority), Some(Priority::High));
    assert_eq!(
        app.world().get::<FlockUnit>(soldier).unwrap().move_target(),
        Some(post)
    );
    assert!(
        stopped(&mut app).is_empty(),
        "a replaced assignment is finished without a stop report"
    );
}

#[test]
fn deactivated_listener_ignores_assignments() {
    let mut app = create_action_app();
    let soldier = spawn_soldier(app.world_mut(), Vec2::ZERO, None);
    let post = app
        .world_mut()
        .spawn((
            ActionTarget::new(ActionKind::Other, Priority::Highest),
            at(Vec2::new(6.0, 0.0)),
        ))
        .id();

    app.world_mut().write_message(SetListenerActive {
        listener: soldier,
        active: false,
    });
    app.world_mut().write_message(AssignAction {
        listener: soldier,
        target: post,
    });
    app.update();

    assert!(
        app.world()
            .get::<FlockActionController>(soldier)
            .unwrap()
            .current()
            .is_none()
    );
    assert!(
        !app.world().get::<AttackSensor>(soldier).unwrap().active,
        "deactivation resets the sensor to its start state"
    );
}
