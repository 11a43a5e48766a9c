//! `vleue_navigator` navmesh configuration for path requests.

use avian2d::prelude::*;
use bevy::prelude::*;
use vleue_navigator::prelude::*;

/// Marker: this entity's `Collider` is cut out of the navmesh.
/// Add to walls. Do NOT add to units; they move and are steered around
/// by separation instead.
#[derive(Component, Debug, Clone, Copy, Reflect)]
#[reflect(Component)]
pub struct WallObstacle;

/// Spawn the navmesh covering the rectangle `min..max`. Walls marked
/// [`WallObstacle`] are cut out as they appear and disappear.
pub fn spawn_navmesh(commands: &mut Commands, min: Vec2, max: Vec2, agent_radius: f32) -> Entity {
    commands
        .spawn((
            Name::new("Navmesh"),
            NavMeshSettings {
                fixed: Triangulation::from_outer_edges(&[
                    min,
                    Vec2::new(max.x, min.y),
                    max,
                    Vec2::new(min.x, max.y),
                ]),
                agent_radius,
                ..default()
            },
            NavMeshUpdateMode::Direct,
        ))
        .id()
}

pub(super) fn plugin(app: &mut App) {
    app.register_type::<WallObstacle>();
    app.add_plugins((
        VleueNavigatorPlugin,
        NavmeshUpdaterPlugin::<Collider, WallObstacle>::default(),
    ));
}
