//! Avian2d physics configuration and the wall probe built on its spatial queries.

use avian2d::prelude::*;
use bevy::ecs::system::SystemParam;
use bevy::prelude::*;

use crate::flock::obstacle::{ObstacleProbe, WallHit};

// === Collision Layers ===

/// Physics collision layers.
///
/// - **Unit**: flock agent bodies. Push each other and collide with walls.
/// - **Wall**: static level geometry. Target of every sphere cast.
/// - **Sensor**: proximity and attack volumes. Only overlap units.
#[derive(PhysicsLayer, Clone, Copy, Debug, Default)]
pub enum CollisionLayer {
    #[default]
    Unit,
    Wall,
    Sensor,
}

impl CollisionLayer {
    /// Layers for an agent body.
    #[must_use]
    pub fn unit() -> CollisionLayers {
        CollisionLayers::new(
            Self::Unit,
            [Self::Unit, Self::Wall, Self::Sensor],
        )
    }

    /// Layers for static wall geometry.
    #[must_use]
    pub fn wall() -> CollisionLayers {
        CollisionLayers::new(Self::Wall, [Self::Unit])
    }

    /// Layers for a trigger volume detecting units.
    #[must_use]
    pub fn sensor() -> CollisionLayers {
        CollisionLayers::new(Self::Sensor, [Self::Unit])
    }
}

// === Wall probe ===

/// [`ObstacleProbe`] backed by avian's shape casts against [`CollisionLayer::Wall`].
#[derive(SystemParam)]
pub struct WallProbe<'w, 's> {
    spatial: SpatialQuery<'w, 's>,
}

impl ObstacleProbe for WallProbe<'_, '_> {
    fn sphere_cast(
        &self,
        origin: Vec2,
        radius: f32,
        direction: Vec2,
        max_distance: f32,
    ) -> Option<WallHit> {
        let direction = Dir2::new(direction).ok()?;
        if radius <= 0.0 || max_distance <= 0.0 {
            return None;
        }
        self.spatial
            .cast_shape(
                &Collider::circle(radius),
                origin,
                0.0,
                direction,
                &ShapeCastConfig::from_max_distance(max_distance),
                &SpatialQueryFilter::from_mask(CollisionLayer::Wall),
            )
            .map(|hit| WallHit {
                normal: hit.normal1,
                distance: hit.distance,
            })
    }
}

// === Plugin ===

pub(super) fn plugin(app: &mut App) {
    app.add_plugins(PhysicsPlugins::default());
    app.insert_resource(Gravity::ZERO);
}
