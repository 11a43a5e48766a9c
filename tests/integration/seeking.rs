//! Path seeking around a wall, end to end through the public API.

use bevy::prelude::*;
use flock_steering::flock::obstacle::{ObstacleProbe, WallHit};
use flock_steering::flock::pathing::{
    PathCompleted, PathQueue, PathTicket, PathingService, deliver_path_completions,
    resolve_path_requests,
};
use flock_steering::flock::unit::UnitBody;
use flock_steering::prelude::*;
use pretty_assertions::assert_eq;
use rand::SeedableRng;
use rand::rngs::StdRng;

/// Vertical wall on `x = 5` spanning `-3..=3`.
struct VerticalWall;

impl ObstacleProbe for VerticalWall {
    fn sphere_cast(
        &self,
        origin: Vec2,
        radius: f32,
        direction: Vec2,
        max_distance: f32,
    ) -> Option<WallHit> {
        let dir = direction.normalize_or_zero();
        if dir.x.abs() < f32::EPSILON {
            return None;
        }
        let t = (5.0 - origin.x) / dir.x;
        if !(0.0..=max_distance).contains(&t) {
            return None;
        }
        let y = dir.y.mul_add(t, origin.y);
        (y.abs() <= 3.0 + radius).then_some(WallHit {
            normal: Vec2::new(-dir.x.signum(), 0.0),
            distance: t,
        })
    }
}

#[derive(Default)]
struct Recorder {
    issued: u64,
}

impl PathingService for Recorder {
    fn request_path(&mut self, _: Vec2, _: Vec2) -> Option<PathTicket> {
        self.issued += 1;
        Some(PathTicket(self.issued))
    }

    fn cancel_path(&mut self, _: PathTicket) {}
}

const GOAL: Vec2 = Vec2::new(10.0, 0.0);

#[test]
fn unit_walks_path_around_wall_then_resumes_moving() {
    let mut unit = FlockUnit::new(FlockConfig {
        update_delay: 0.0,
        ..default()
    });
    let mut mover = Mover::new(4.0);
    let filter = UnitFilter::new(0);
    let mut pathing = Recorder::default();
    let mut rng = StdRng::seed_from_u64(1);
    let mut position = Vec2::ZERO;
    let mut velocity = Vec2::ZERO;

    unit.set_move_target(Some(Entity::PLACEHOLDER));
    let body = |position, velocity, mover: &Mover| UnitBody {
        position,
        velocity,
        facing: mover.dir(),
        max_speed: mover.max_speed,
    };

    unit.tick(1.0, &body(position, velocity, &mover), Some(GOAL), &VerticalWall, &mut pathing);
    let ticket = unit.pending_path().expect("wall blocks the direct line");
    assert_eq!(unit.state(), SteeringState::Idle);

    unit.on_path_complete(ticket, Some(vec![Vec2::new(5.0, 4.0), GOAL]));
    assert_eq!(unit.state(), SteeringState::Waypoint);

    let dt = 0.02;
    for _ in 0..1000 {
        if unit.state() != SteeringState::Waypoint {
            break;
        }
        unit.tick(dt, &body(position, velocity, &mover), Some(GOAL), &VerticalWall, &mut pathing);
        let force = unit.fixed_tick(
            dt,
            &body(position, velocity, &mover),
            &filter,
            None,
            Some(GOAL),
            &mut rng,
        );
        mover.apply_force(&mut velocity, force, dt);
        position += velocity * dt;
    }

    assert_eq!(unit.state(), SteeringState::Move);
    assert!(unit.path().is_none());
    assert!(position.x > 5.0, "unit should be past the wall, at {position:?}");
    assert!(velocity.length() <= mover.max_speed + 1e-4);
    assert_eq!(pathing.issued, 1);
}

#[test]
fn without_navmesh_requests_are_dropped() {
    let mut queue = PathQueue::default();
    let mut unit = FlockUnit::default();
    let owner = Entity::PLACEHOLDER;
    unit.set_move_target(Some(owner));

    let body = UnitBody {
        position: Vec2::ZERO,
        velocity: Vec2::ZERO,
        facing: Vec2::X,
        max_speed: 4.0,
    };
    unit.tick(1.0, &body, Some(GOAL), &VerticalWall, &mut queue.for_unit(owner));

    assert!(unit.pending_path().is_none());
    assert_eq!(unit.state(), SteeringState::Move);
    assert!(queue.pending().is_empty());
}

#[test]
fn vanished_navmesh_fails_pending_requests() {
    let mut app = App::new();
    app.add_plugins(MinimalPlugins);
    app.init_resource::<PathQueue>();
    app.add_message::<PathCompleted>();
    app.add_systems(
        Update,
        (deliver_path_completions, resolve_path_requests).chain(),
    );

    let unit = app.world_mut().spawn(FlockUnit::default()).id();
    {
        let world = app.world_mut();
        let mut queue = world.resource_mut::<PathQueue>();
        queue.set_active(true);
        let mut pathing = queue.for_unit(unit);
        let body = UnitBody {
            position: Vec2::ZERO,
            velocity: Vec2::ZERO,
            facing: Vec2::X,
            max_speed: 4.0,
        };
        let mut flock_unit = FlockUnit::default();
        flock_unit.set_move_target(Some(Entity::PLACEHOLDER));
        flock_unit.tick(1.0, &body, Some(GOAL), &VerticalWall, &mut pathing);
        assert!(flock_unit.pending_path().is_some());
        drop(queue);
        *world.get_mut::<FlockUnit>(unit).unwrap() = flock_unit;
    }

    app.update();
    assert!(!app.world().resource::<PathQueue>().is_active());
    assert!(app.world().resource::<PathQueue>().pending().is_empty());

    app.update();
    let flock_unit = app.world().get::<FlockUnit>(unit).unwrap();
    assert!(flock_unit.pending_path().is_none());
    assert_eq!(flock_unit.state(), SteeringState::Move);
}
