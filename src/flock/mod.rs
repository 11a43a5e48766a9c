//! Flock agents: steering core, sensing, path seeking, and the systems that drive them.

pub mod filter;
mod movement;
pub mod mover;
pub mod obstacle;
pub mod pathing;
pub mod sensor;
pub mod steering;
pub mod unit;

use avian2d::prelude::*;
use bevy::prelude::*;

use self::filter::{FlockId, UnitFilter};
use self::mover::Mover;
use self::pathing::{PathCompleted, PathQueue};
use self::sensor::{ProximitySensor, ProximityVolume};
use self::unit::{FlockConfig, FlockUnit};
use crate::FlockSet;
use crate::third_party::CollisionLayer;

pub use self::movement::{seek_unit_paths, steer_flock_units};

// === Constants ===

/// Body radius of a spawned agent.
pub const UNIT_RADIUS: f32 = 0.5;

/// Radius of the proximity volume around an agent.
pub const DEFAULT_SENSOR_RADIUS: f32 = 3.0;

// === Spawning ===

/// Everything needed to spawn one agent.
#[derive(Debug, Clone)]
pub struct FlockUnitOptions {
    pub flock_id: FlockId,
    pub position: Vec2,
    pub config: FlockConfig,
    pub mover: Mover,
    /// Flocks this agent keeps away from.
    pub avoid: Vec<FlockId>,
    /// `None` spawns the agent without a proximity sensor.
    pub sensor_radius: Option<f32>,
}

impl Default for FlockUnitOptions {
    fn default() -> Self {
        Self {
            flock_id: 0,
            position: Vec2::ZERO,
            config: FlockConfig::default(),
            mover: Mover::default(),
            avoid: Vec::new(),
            sensor_radius: Some(DEFAULT_SENSOR_RADIUS),
        }
    }
}

/// Spawn an agent entity with all required components.
/// Single source of truth for the agent archetype.
pub fn spawn_flock_unit(commands: &mut Commands, options: FlockUnitOptions) -> Entity {
    let unit = commands
        .spawn((
            Name::new(format!("Flock {} unit", options.flock_id)),
            FlockUnit::new(options.config),
            UnitFilter::new(options.flock_id).avoiding(&options.avoid),
            options.mover,
            Transform::from_translation(options.position.extend(0.0)),
            RigidBody::Dynamic,
            Collider::circle(UNIT_RADIUS),
            CollisionLayer::unit(),
            LockedAxes::ROTATION_LOCKED,
            LinearVelocity::ZERO,
        ))
        .id();

    if let Some(radius) = options.sensor_radius {
        commands.entity(unit).insert(ProximitySensor::default());
        commands.spawn((
            Name::new("Proximity volume"),
            ChildOf(unit),
            ProximityVolume { owner: unit },
            Sensor,
            Collider::circle(radius),
            CollisionLayer::sensor(),
            CollidingEntities::default(),
            Transform::default(),
        ));
    }

    unit
}

// === Plugin ===

pub(super) fn plugin(app: &mut App) {
    app.register_type::<FlockUnit>()
        .register_type::<UnitFilter>()
        .register_type::<Mover>()
        .register_type::<ProximitySensor>()
        .register_type::<ProximityVolume>()
        .register_type::<PathQueue>()
        .init_resource::<PathQueue>()
        .add_message::<PathCompleted>();

    app.add_observer(pathing::cancel_paths_on_remove);

    app.add_systems(
        Update,
        (
            sensor::sync_proximity_sensors.in_set(FlockSet::Sense),
            (
                pathing::deliver_path_completions,
                seek_unit_paths,
                pathing::resolve_path_requests,
            )
                .chain()
                .in_set(FlockSet::Plan),
        ),
    );
    app.add_systems(FixedUpdate, steer_flock_units.in_set(FlockSet::Steer));
}
