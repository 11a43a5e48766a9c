//! Third-party plugin isolation.

mod avian;
mod vleue_navigator;

pub use avian::{CollisionLayer, WallProbe};
pub use vleue_navigator::{WallObstacle, spawn_navmesh};

pub fn plugin(app: &mut bevy::prelude::App) {
    app.add_plugins((avian::plugin, vleue_navigator::plugin));
}
