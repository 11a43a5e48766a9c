//! Binds an agent's move goal to its current action assignment.
//!
//! The controller decides what a [`FlockUnit`] moves toward. Two periodic
//! watches keep the goal honest while an assignment runs: the return-to-leader
//! watch pulls attackers back toward their leader (or cancels the attack when
//! they strayed too far), and the follow-stop watch parks followers next to a
//! target that stopped moving.

use bevy::prelude::*;

use super::attack_sensor::AttackSensor;
use super::target::{ActionKind, ActionListener, ActionTarget, Assignment, Priority};
use crate::flock::unit::FlockUnit;

// === Constants ===

pub const DEFAULT_ACTION_MAX_RADIUS: f32 = 6.75;
pub const DEFAULT_ACTION_CANCEL_RADIUS: f32 = 12.0;
pub const DEFAULT_ACTION_CANCEL_DELAY: f32 = 1.0;
pub const DEFAULT_FOLLOW_STOP_DELAY: f32 = 1.0;
pub const DEFAULT_FOLLOW_STOP_RADIUS: f32 = 2.0;
pub const DEFAULT_FOLLOW_STOP_SPEED: f32 = 0.01;

// === Types ===

#[derive(Debug, Clone, PartialEq, Reflect)]
pub struct ActionControllerConfig {
    /// Beyond this distance from the leader an attacker heads back to it.
    pub action_max_radius: f32,
    /// Beyond this distance from the leader the attack is cancelled.
    pub action_cancel_radius: f32,
    pub action_cancel_delay: f32,
    pub follow_stop_delay: f32,
    pub follow_stop_radius: f32,
    /// Target speeds below this count as stopped.
    pub follow_stop_speed: f32,
    /// Whether the attack sensor is live after spawn or deactivation.
    pub attack_start_enable: bool,
}

impl Default for ActionControllerConfig {
    fn default() -> Self {
        Self {
            action_max_radius: DEFAULT_ACTION_MAX_RADIUS,
            action_cancel_radius: DEFAULT_ACTION_CANCEL_RADIUS,
            action_cancel_delay: DEFAULT_ACTION_CANCEL_DELAY,
            follow_stop_delay: DEFAULT_FOLLOW_STOP_DELAY,
            follow_stop_radius: DEFAULT_FOLLOW_STOP_RADIUS,
            follow_stop_speed: DEFAULT_FOLLOW_STOP_SPEED,
            attack_start_enable: false,
        }
    }
}

/// A task that fires once per period while running.
#[derive(Debug, Clone, Copy, PartialEq, Default, Reflect)]
pub struct PeriodicWatch {
    running: bool,
    elapsed: f32,
}

impl PeriodicWatch {
    #[must_use]
    pub const fn is_running(&self) -> bool {
        self.running
    }

    pub const fn start(&mut self) {
        self.running = true;
        self.elapsed = 0.0;
    }

    pub const fn stop(&mut self) {
        self.running = false;
        self.elapsed = 0.0;
    }

    /// Advance by `dt`. True once per elapsed `period`.
    pub fn tick(&mut self, dt: f32, period: f32) -> bool {
        if !self.running {
            return false;
        }
        self.elapsed += dt;
        if self.elapsed >= period {
            self.elapsed = 0.0;
            true
        } else {
            false
        }
    }
}

/// World lookups the watches need for one tick.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct WatchInputs {
    pub position: Vec2,
    /// `None` when there is no leader or it is gone.
    pub leader_position: Option<Vec2>,
    /// Speed of the assigned target; `None` when it has no motion body.
    pub target_speed: Option<f32>,
}

// === Component ===

/// Action listener steering a [`FlockUnit`] on the same entity.
#[derive(Component, Debug, Clone, Default, Reflect)]
#[reflect(Component)]
pub struct FlockActionController {
    pub config: ActionControllerConfig,
    pub listener: ActionListener,
    pub leader: Option<Entity>,
    return_to_leader: PeriodicWatch,
    follow_stop: PeriodicWatch,
}

impl FlockActionController {
    #[must_use]
    pub fn new(config: ActionControllerConfig) -> Self {
        Self {
            config,
            ..default()
        }
    }

    #[must_use]
    pub const fn return_to_leader(&self) -> &PeriodicWatch {
        &self.return_to_leader
    }

    #[must_use]
    pub const fn follow_stop(&self) -> &PeriodicWatch {
        &self.follow_stop
    }

    #[must_use]
    pub fn current(&self) -> Option<&Assignment> {
        self.listener.current()
    }

    /// Make `target` the current assignment, finishing the previous one.
    /// Refused while inactive, locked, or already on `target`.
    pub fn assign(
        &mut self,
        target: Entity,
        data: &ActionTarget,
        target_has_motion: bool,
        unit: &mut FlockUnit,
        mut sensor: Option<&mut AttackSensor>,
    ) -> bool {
        if !self.listener.accepts(target) {
            return false;
        }
        self.finish_action(unit, sensor.as_deref_mut());

        let assignment = Assignment::new(target, data);
        debug!(entity = ?target, kind = ?assignment.kind, priority = ?assignment.priority, "action assigned");
        self.listener.begin(assignment);
        self.on_enter(assignment, target_has_motion, unit, sensor);
        true
    }

    fn on_enter(
        &mut self,
        assignment: Assignment,
        target_has_motion: bool,
        unit: &mut FlockUnit,
        sensor: Option<&mut AttackSensor>,
    ) {
        match assignment.kind {
            ActionKind::Disperse => {}
            ActionKind::Attack => {
                unit.set_move_target(Some(assignment.target));
                self.return_to_leader.start();
                // Already engaged; stay reports resume when the attack ends.
                if let Some(sensor) = sensor {
                    sensor.enabled = false;
                    unit.min_move_target_distance = sensor.min_range;
                }
            }
            ActionKind::Retreat | ActionKind::Follow => {
                unit.set_move_target(Some(assignment.move_point));
                if target_has_motion {
                    self.follow_stop.start();
                }
            }
            ActionKind::Other => unit.set_move_target(Some(assignment.move_point)),
        }
    }

    /// End the current assignment unconditionally.
    pub fn finish_action(
        &mut self,
        unit: &mut FlockUnit,
        sensor: Option<&mut AttackSensor>,
    ) -> Option<Assignment> {
        let finished = self.listener.finish()?;
        unit.halt();
        if let Some(sensor) = sensor {
            sensor.enabled = true;
        }
        self.return_to_leader.stop();
        self.follow_stop.stop();
        Some(finished)
    }

    /// Stop the current assignment if `priority` reaches its priority, or
    /// unconditionally when `forced`.
    pub fn stop_action(
        &mut self,
        priority: Priority,
        forced: bool,
        unit: &mut FlockUnit,
        sensor: Option<&mut AttackSensor>,
    ) -> Option<Assignment> {
        if !self.listener.allows_stop(priority, forced) {
            return None;
        }
        let stopped = self.finish_action(unit, sensor);
        if let Some(stopped) = stopped {
            debug!(entity = ?stopped.target, ?priority, forced, "action stopped");
        }
        stopped
    }

    /// Stay report from the attack sensor: escalate to attacking `hostile`
    /// when not already attacking or retreating.
    pub fn auto_attack_check(
        &mut self,
        hostile: Entity,
        data: &ActionTarget,
        hostile_has_motion: bool,
        unit: &mut FlockUnit,
        sensor: Option<&mut AttackSensor>,
    ) -> bool {
        if matches!(
            self.listener.current_kind(),
            Some(ActionKind::Attack | ActionKind::Retreat)
        ) {
            return false;
        }
        if data.kind != ActionKind::Attack
            || !data.vacancy
            || self.listener.current_priority() > data.priority
        {
            return false;
        }
        self.assign(hostile, data, hostile_has_motion, unit, sensor)
    }

    #[must_use]
    pub fn auto_attack(sensor: Option<&AttackSensor>) -> bool {
        sensor.is_some_and(|s| s.active)
    }

    /// Switch hostile detection on or off. Turning it off mid-attack drops
    /// the attack.
    pub fn set_auto_attack(
        &mut self,
        enabled: bool,
        unit: &mut FlockUnit,
        sensor: Option<&mut AttackSensor>,
    ) -> Option<Assignment> {
        let sensor = sensor?;
        if sensor.active == enabled {
            return None;
        }
        let stopped = if !enabled && self.listener.current_kind() == Some(ActionKind::Attack) {
            self.stop_action(Priority::Highest, true, unit, Some(&mut *sensor))
        } else {
            None
        };
        sensor.active = enabled;
        stopped
    }

    /// Deactivation drops the current action and resets the attack sensor.
    pub fn set_active(
        &mut self,
        active: bool,
        unit: &mut FlockUnit,
        mut sensor: Option<&mut AttackSensor>,
    ) -> Option<Assignment> {
        self.listener.set_active(active);
        if active {
            return None;
        }
        let stopped = self.finish_action(unit, sensor.as_deref_mut());
        self.reset_auto_actions(sensor);
        stopped
    }

    fn reset_auto_actions(&self, sensor: Option<&mut AttackSensor>) {
        if let Some(sensor) = sensor {
            sensor.active = self.config.attack_start_enable;
            sensor.enabled = true;
        }
    }

    /// Can the current assignment be carried out from here? Only attacks
    /// have a range; everything else is always in range.
    #[must_use]
    pub fn check_range(
        &self,
        unit: &FlockUnit,
        sensor: Option<&AttackSensor>,
        position: Vec2,
        facing: Vec2,
        target_position: Option<Vec2>,
    ) -> bool {
        let (Some(current), Some(target)) = (self.listener.current(), target_position) else {
            return true;
        };
        match current.kind {
            ActionKind::Attack => sensor
                .is_some_and(|s| unit.is_enabled() && s.check_range(position, facing, target)),
            _ => true,
        }
    }

    /// Run both watches. Returns the assignment if the return-to-leader
    /// watch cancelled it.
    pub fn fixed_tick(
        &mut self,
        dt: f32,
        inputs: &WatchInputs,
        unit: &mut FlockUnit,
        mut sensor: Option<&mut AttackSensor>,
    ) -> Option<Assignment> {
        let stopped = self.tick_return_to_leader(dt, inputs, unit, sensor.as_deref_mut());
        self.tick_follow_stop(dt, inputs, unit);
        stopped
    }

    fn tick_return_to_leader(
        &mut self,
        dt: f32,
        inputs: &WatchInputs,
        unit: &mut FlockUnit,
        sensor: Option<&mut AttackSensor>,
    ) -> Option<Assignment> {
        let Some(current) = self.listener.current().copied() else {
            self.return_to_leader.stop();
            return None;
        };
        let Some(leader_position) = inputs.leader_position else {
            self.return_to_leader.stop();
            return None;
        };
        if self.listener.locked || self.listener.on_default_target() {
            self.return_to_leader.stop();
            return None;
        }
        if !self.return_to_leader.tick(dt, self.config.action_cancel_delay) {
            return None;
        }

        let distance_sqr = inputs.position.distance_squared(leader_position);
        let cancel_sqr = self.config.action_cancel_radius * self.config.action_cancel_radius;
        let max_sqr = self.config.action_max_radius * self.config.action_max_radius;

        if distance_sqr > cancel_sqr {
            return self.stop_action(Priority::High, true, unit, sensor);
        }
        if distance_sqr > max_sqr && !self.listener.locked {
            unit.set_move_target(self.leader);
        } else {
            unit.set_move_target(Some(current.target));
        }
        None
    }

    fn tick_follow_stop(&mut self, dt: f32, inputs: &WatchInputs, unit: &mut FlockUnit) {
        let (Some(current), Some(target_speed)) =
            (self.listener.current().copied(), inputs.target_speed)
        else {
            self.follow_stop.stop();
            return;
        };
        if !self.follow_stop.tick(dt, self.config.follow_stop_delay) {
            return;
        }

        match current.kind {
            ActionKind::Retreat | ActionKind::Follow => {
                if target_speed < self.config.follow_stop_speed {
                    if unit.move_target().is_some()
                        && unit.move_target_distance() <= self.config.follow_stop_radius
                    {
                        unit.set_move_target(None);
                    }
                } else {
                    unit.set_move_target(Some(current.move_point));
                }
            }
            _ => self.follow_stop.stop(),
        }
    }
}
