//! Spawn helpers produce complete archetypes.

use avian2d::prelude::*;
use bevy::prelude::*;
use flock_steering::action::attack_sensor::AttackVolume;
use flock_steering::flock::sensor::ProximityVolume;
use flock_steering::prelude::*;
use flock_steering::third_party::WallObstacle;
use pretty_assertions::assert_eq;

#[test]
fn flock_unit_spawns_with_proximity_volume() {
    let mut world = World::new();
    let unit = spawn_flock_unit(
        &mut world.commands(),
        FlockUnitOptions {
            flock_id: 2,
            position: Vec2::new(3.0, 4.0),
            avoid: vec![5],
            ..default()
        },
    );
    world.flush();

    let filter = world.get::<UnitFilter>(unit).unwrap();
    assert_eq!(filter.id, 2);
    assert!(filter.check_avoid(5));
    assert!(world.get::<FlockUnit>(unit).is_some());
    assert!(world.get::<ProximitySensor>(unit).is_some());
    assert_eq!(
        world.get::<Transform>(unit).unwrap().translation.truncate(),
        Vec2::new(3.0, 4.0)
    );

    let mut volumes = world.query::<(&ProximityVolume, &ChildOf)>();
    let (volume, parent) = volumes.single(&world).unwrap();
    assert_eq!(volume.owner, unit);
    assert_eq!(parent.parent(), unit);
}

#[test]
fn sensorless_unit_has_no_volume() {
    let mut world = World::new();
    let unit = spawn_flock_unit(
        &mut world.commands(),
        FlockUnitOptions {
            sensor_radius: None,
            ..default()
        },
    );
    world.flush();

    assert!(world.get::<ProximitySensor>(unit).is_none());
    assert_eq!(world.query::<&ProximityVolume>().iter(&world).count(), 0);
}

#[test]
fn action_controller_starts_with_configured_sensor_state() {
    let mut world = World::new();
    let unit = spawn_flock_unit(&mut world.commands(), FlockUnitOptions::default());
    attach_action_controller(
        &mut world.commands(),
        unit,
        FlockActionController::new(ActionControllerConfig {
            attack_start_enable: true,
            ..default()
        }),
        AttackSensor {
            max_range: 2.5,
            ..default()
        }
        .hostile_to(&[1]),
    );
    world.flush();

    let sensor = world.get::<AttackSensor>(unit).unwrap();
    assert!(sensor.active);
    assert!(sensor.verify(1));
    let mut volumes = world.query::<&AttackVolume>();
    assert_eq!(volumes.single(&world).unwrap().owner, unit);
}

#[test]
fn walls_are_navmesh_obstacles() {
    let mut world = World::new();
    let wall = spawn_wall(&mut world.commands(), Vec2::ZERO, Vec2::new(1.0, 6.0));
    world.flush();

    assert!(world.get::<WallObstacle>(wall).is_some());
    assert!(world.get::<Collider>(wall).is_some());
}
