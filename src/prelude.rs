//! Common imports for users of the crate.

pub use bevy::prelude::*;

pub use crate::action::attack_sensor::AttackSensor;
pub use crate::action::controller::{ActionControllerConfig, FlockActionController};
pub use crate::action::target::{ActionKind, ActionTarget, Priority};
pub use crate::action::{
    ActionStopped, AssignAction, SetAutoAttack, SetListenerActive, StopAction,
    attach_action_controller,
};
pub use crate::flock::filter::UnitFilter;
pub use crate::flock::mover::Mover;
pub use crate::flock::obstacle::spawn_wall;
pub use crate::flock::sensor::ProximitySensor;
pub use crate::flock::unit::{FlockConfig, FlockUnit, SteeringState};
pub use crate::flock::{FlockUnitOptions, spawn_flock_unit};
pub use crate::third_party::spawn_navmesh;
pub use crate::{FlockSet, FlockSteeringPlugin};
