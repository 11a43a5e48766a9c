//! Testing utilities for flock systems.

#![cfg(test)]

use std::time::Duration;

use avian2d::prelude::*;
use bevy::prelude::*;
use bevy::time::TimeUpdateStrategy;
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::flock::filter::{FlockId, UnitFilter};
use crate::flock::mover::Mover;
use crate::flock::obstacle::{ObstacleProbe, WallHit};
use crate::flock::pathing::{PathTicket, PathingService};
use crate::flock::sensor::ProximitySensor;
use crate::flock::unit::{FlockUnit, UnitBody};

/// Fixed frame step used by [`create_test_app`].
pub const TEST_FRAME: Duration = Duration::from_millis(20);

/// Creates a minimal app whose clock advances by [`TEST_FRAME`] per update.
pub fn create_test_app() -> App {
    let mut app = App::new();
    app.add_plugins(MinimalPlugins);
    app.insert_resource(TimeUpdateStrategy::ManualDuration(TEST_FRAME));
    app
}

/// Deterministic rng for wander tests.
pub fn test_rng() -> StdRng {
    StdRng::seed_from_u64(7)
}

/// Spawn a unit body with everything the flock systems read.
pub fn spawn_test_unit(world: &mut World, flock_id: FlockId, position: Vec2) -> Entity {
    world
        .spawn((
            FlockUnit::default(),
            UnitFilter::new(flock_id),
            Mover::default(),
            ProximitySensor::default(),
            Transform::from_translation(position.extend(0.0)),
            GlobalTransform::from_translation(position.extend(0.0)),
            RigidBody::Dynamic,
            LinearVelocity::ZERO,
        ))
        .id()
}

/// Put `unit` on an in-flight request toward a walled-off goal.
pub fn seek_blocked_goal(unit: &mut FlockUnit, pathing: &mut impl PathingService) -> PathTicket {
    unit.config.seek_delay = 0.0;
    unit.set_move_target(Some(Entity::PLACEHOLDER));
    let body = UnitBody {
        position: Vec2::ZERO,
        velocity: Vec2::ZERO,
        facing: Vec2::X,
        max_speed: 1.0,
    };
    unit.tick(
        0.0,
        &body,
        Some(Vec2::new(10.0, 0.0)),
        &BlockedProbe::everywhere(),
        pathing,
    );
    unit.pending_path()
        .expect("blocked goal must issue a path request")
}

/// Pathing service that records requests and cancellations.
#[derive(Debug)]
pub struct StubPathing {
    pub active: bool,
    pub requests: Vec<(Vec2, Vec2)>,
    pub cancelled: Vec<PathTicket>,
}

impl Default for StubPathing {
    fn default() -> Self {
        Self {
            active: true,
            requests: Vec::new(),
            cancelled: Vec::new(),
        }
    }
}

impl StubPathing {
    pub fn inactive() -> Self {
        Self {
            active: false,
            ..default()
        }
    }
}

impl PathingService for StubPathing {
    fn request_path(&mut self, start: Vec2, goal: Vec2) -> Option<PathTicket> {
        if !self.active {
            return None;
        }
        self.requests.push((start, goal));
        Some(PathTicket(self.requests.len() as u64))
    }

    fn cancel_path(&mut self, ticket: PathTicket) {
        self.cancelled.push(ticket);
    }
}

/// Probe that hits a wall on every non-degenerate cast.
#[derive(Debug, Clone, Copy)]
pub struct BlockedProbe {
    normal: Vec2,
}

impl BlockedProbe {
    pub const fn everywhere() -> Self {
        Self { normal: Vec2::NEG_X }
    }

    pub const fn with_normal(mut self, normal: Vec2) -> Self {
        self.normal = normal;
        self
    }
}

impl ObstacleProbe for BlockedProbe {
    fn sphere_cast(
        &self,
        _origin: Vec2,
        _radius: f32,
        direction: Vec2,
        max_distance: f32,
    ) -> Option<WallHit> {
        (direction != Vec2::ZERO && max_distance > 0.0).then_some(WallHit {
            normal: self.normal,
            distance: max_distance * 0.5,
        })
    }
}
