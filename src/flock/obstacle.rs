//! Wall sensing seam between the flock core and the physics engine.

use avian2d::prelude::*;
use bevy::prelude::*;

use crate::third_party::{CollisionLayer, WallObstacle};

/// Surface struck by a sphere cast.
#[derive(Debug, Clone, Copy, PartialEq, Reflect)]
pub struct WallHit {
    /// Outward surface normal at the hit point.
    pub normal: Vec2,
    pub distance: f32,
}

/// Sphere casts against the wall layer.
pub trait ObstacleProbe {
    /// Sweep a circle of `radius` from `origin` along `direction` for up to
    /// `max_distance`. `direction` need not be normalised; a zero direction
    /// never hits.
    fn sphere_cast(
        &self,
        origin: Vec2,
        radius: f32,
        direction: Vec2,
        max_distance: f32,
    ) -> Option<WallHit>;
}

/// A world without walls.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenField;

impl ObstacleProbe for OpenField {
    fn sphere_cast(&self, _: Vec2, _: f32, _: Vec2, _: f32) -> Option<WallHit> {
        None
    }
}

/// Spawn a static wall of `size` centred on `center`. Walls block units,
/// are hit by sphere casts, and are cut out of the navmesh.
pub fn spawn_wall(commands: &mut Commands, center: Vec2, size: Vec2) -> Entity {
    commands
        .spawn((
            Name::new("Wall"),
            WallObstacle,
            RigidBody::Static,
            Collider::rectangle(size.x, size.y),
            CollisionLayer::wall(),
            Transform::from_translation(center.extend(0.0)),
        ))
        .id()
}
