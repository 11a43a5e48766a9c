//! The steering agent: state machine, force blending, and path seeking.
//!
//! A [`FlockUnit`] is driven by two clocks. [`FlockUnit::tick`] runs on the
//! frame tick and owns the throttled obstruction checks, path requests and
//! the wall probe. [`FlockUnit::fixed_tick`] runs on the simulation tick and
//! returns the force to apply to the unit's body.

use bevy::prelude::*;
use rand::Rng;

use super::filter::{FlockId, UnitFilter};
use super::obstacle::{ObstacleProbe, WallHit};
use super::pathing::{PathTicket, PathingService, WaypointPath};
use super::steering::{seek, steer};

// === Constants ===

/// How far ahead of the unit the wall probe sweeps.
pub const WALL_PROBE_DISTANCE: f32 = 0.1;

/// Wall probe radius. Sits just inside the body collider so the sweep starts
/// clear of a wall the body rests against and still reaches past its surface.
pub const DEFAULT_WALL_RADIUS: f32 = super::UNIT_RADIUS - WALL_PROBE_DISTANCE * 0.5;

pub const DEFAULT_MAX_FORCE: f32 = 120.0;
pub const DEFAULT_PATH_RADIUS: f32 = 0.25;
pub const DEFAULT_SEPARATE_DISTANCE: f32 = 2.0;
pub const DEFAULT_SEPARATE_FACTOR: f32 = 1.5;
pub const DEFAULT_CATCH_UP_FACTOR: f32 = 2.0;
pub const DEFAULT_UPDATE_DELAY: f32 = 1.0;
pub const DEFAULT_SEEK_DELAY: f32 = 1.0;
pub const DEFAULT_WANDER_DELAY: f32 = 1.0;

// === Types ===

/// Steering tunables. Distances are world units, delays seconds.
#[derive(Debug, Clone, PartialEq, Reflect)]
pub struct FlockConfig {
    pub max_force: f32,
    /// Waypoint arrival radius; also the sweep radius of obstruction checks.
    pub path_radius: f32,
    pub wall_radius: f32,
    pub separate_distance: f32,
    pub avoid_distance: f32,
    pub separate_factor: f32,
    pub align_factor: f32,
    pub cohesion_factor: f32,
    pub move_to_factor: f32,
    /// Used instead of `move_to_factor` when no group member is around to follow.
    pub catch_up_factor: f32,
    pub path_factor: f32,
    pub wall_factor: f32,
    pub avoid_factor: f32,
    pub update_delay: f32,
    pub seek_delay: f32,
    /// Catch-up only applies beyond this distance to the goal.
    pub catch_up_min_distance: f32,
    pub wander_delay: f32,
}

impl Default for FlockConfig {
    fn default() -> Self {
        Self {
            max_force: DEFAULT_MAX_FORCE,
            path_radius: DEFAULT_PATH_RADIUS,
            wall_radius: DEFAULT_WALL_RADIUS,
            separate_distance: DEFAULT_SEPARATE_DISTANCE,
            avoid_distance: 0.0,
            separate_factor: DEFAULT_SEPARATE_FACTOR,
            align_factor: 1.0,
            cohesion_factor: 1.0,
            move_to_factor: 1.0,
            catch_up_factor: DEFAULT_CATCH_UP_FACTOR,
            path_factor: 1.0,
            wall_factor: 1.0,
            avoid_factor: 1.0,
            update_delay: DEFAULT_UPDATE_DELAY,
            seek_delay: DEFAULT_SEEK_DELAY,
            catch_up_min_distance: 0.0,
            wander_delay: DEFAULT_WANDER_DELAY,
        }
    }
}

/// What the unit is currently doing. Exactly one is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Reflect)]
pub enum SteeringState {
    /// Separation and avoidance; aligns and coheres with nearby group members.
    Idle,
    /// Heading toward the move target.
    #[default]
    Move,
    /// Following a computed path around walls.
    Waypoint,
    /// Roaming in a random direction.
    Wander,
}

/// Per-tick view of a sensed neighbour.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbour {
    pub id: FlockId,
    pub position: Vec2,
    /// Present only for legit units with a dynamic body; those are the only
    /// neighbours aligned with and cohered to.
    pub velocity: Option<Vec2>,
}

/// Kinematic inputs of the unit itself for one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnitBody {
    pub position: Vec2,
    pub velocity: Vec2,
    pub facing: Vec2,
    pub max_speed: f32,
}

#[derive(Debug, Clone, PartialEq, Default, Reflect)]
enum Seek {
    #[default]
    Inactive,
    Pending(PathTicket),
    Following(WaypointPath),
}

/// Neighbour sums gathered in one pass.
#[derive(Debug, Default)]
struct FlockSums {
    separate: Vec2,
    num_separate: u32,
    avoid: Vec2,
    num_avoid: u32,
    align: Vec2,
    cohesion: Vec2,
    num_follow: u32,
}

// === Component ===

/// Steering agent. Pairs with a `Mover`, a `UnitFilter` and optionally a
/// `ProximitySensor` on the same entity.
#[derive(Component, Debug, Clone, Reflect)]
#[reflect(Component)]
pub struct FlockUnit {
    pub config: FlockConfig,
    /// False: no alignment or cohesion while moving.
    pub group_move_enabled: bool,
    pub catch_up_enabled: bool,
    /// Distance to keep from the move target; closer than this the unit backs off.
    pub min_move_target_distance: f32,
    enabled: bool,
    wander_enabled: bool,
    move_target: Option<Entity>,
    move_target_distance: f32,
    move_target_dir: Vec2,
    update_elapsed: f32,
    seek_elapsed: f32,
    wander_elapsed: f32,
    wander_refresh_due: bool,
    seek: Seek,
    /// Tickets dropped since the last frame tick; cancelled with the service there.
    abandoned: Vec<PathTicket>,
    wall_hit: Option<WallHit>,
    state: SteeringState,
}

impl Default for FlockUnit {
    fn default() -> Self {
        Self::new(FlockConfig::default())
    }
}

impl FlockUnit {
    #[must_use]
    pub const fn new(config: FlockConfig) -> Self {
        Self {
            config,
            group_move_enabled: true,
            catch_up_enabled: true,
            min_move_target_distance: 0.0,
            enabled: true,
            wander_enabled: false,
            move_target: None,
            move_target_distance: 0.0,
            move_target_dir: Vec2::X,
            update_elapsed: 0.0,
            seek_elapsed: 0.0,
            wander_elapsed: 0.0,
            wander_refresh_due: false,
            seek: Seek::Inactive,
            abandoned: Vec::new(),
            wall_hit: None,
            state: SteeringState::Move,
        }
    }

    // --- accessors ---

    #[must_use]
    pub const fn state(&self) -> SteeringState {
        self.state
    }

    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    #[must_use]
    pub const fn move_target(&self) -> Option<Entity> {
        self.move_target
    }

    /// Distance to the move target at the last measurement.
    #[must_use]
    pub const fn move_target_distance(&self) -> f32 {
        self.move_target_distance
    }

    /// Direction toward the move target (or the wander heading), refreshed on
    /// seek checks and force updates.
    #[must_use]
    pub const fn move_target_dir(&self) -> Vec2 {
        self.move_target_dir
    }

    #[must_use]
    pub const fn wander_enabled(&self) -> bool {
        self.wander_enabled
    }

    /// Path being followed, if any.
    #[must_use]
    pub const fn path(&self) -> Option<&WaypointPath> {
        match &self.seek {
            Seek::Following(path) => Some(path),
            _ => None,
        }
    }

    /// True while `ticket` is the request this unit waits on.
    #[must_use]
    pub fn awaiting_path(&self, ticket: PathTicket) -> bool {
        self.seek == Seek::Pending(ticket)
    }

    /// Ticket of the in-flight request.
    #[must_use]
    pub const fn pending_path(&self) -> Option<PathTicket> {
        match self.seek {
            Seek::Pending(ticket) => Some(ticket),
            _ => None,
        }
    }

    #[must_use]
    pub const fn wall_hit(&self) -> Option<WallHit> {
        self.wall_hit
    }

    // --- commands ---

    /// Point the unit at a new target. Any path or request made for the
    /// previous target is discarded.
    pub fn set_move_target(&mut self, target: Option<Entity>) {
        if self.move_target != target {
            self.move_target = target;
            self.seek_stop();
        }
    }

    /// Roam when there is no move target.
    pub fn set_wander_enabled(&mut self, enabled: bool) {
        self.wander_enabled = enabled;
        if enabled && self.state == SteeringState::Idle {
            self.apply_state(SteeringState::Wander);
        }
    }

    /// Clear the move target and the distance kept from it.
    pub fn halt(&mut self) {
        self.set_move_target(None);
        self.min_move_target_distance = 0.0;
    }

    /// Back to spawn defaults. The sensor is reset by its owner alongside.
    pub fn reset(&mut self) {
        self.enabled = true;
        self.set_wander_enabled(false);
        self.group_move_enabled = true;
        self.catch_up_enabled = true;
        self.min_move_target_distance = 0.0;
        self.set_move_target(None);
    }

    pub const fn start(&mut self) {
        self.enabled = true;
    }

    /// Disable the unit and withdraw every request it still has open. The
    /// state falls back as if the path had ended, so a later `start` resumes
    /// toward the move target.
    pub fn stop(&mut self, pathing: &mut impl PathingService) {
        self.seek_stop();
        for ticket in self.abandoned.drain(..) {
            pathing.cancel_path(ticket);
        }
        self.wall_hit = None;
        self.enabled = false;
    }

    /// Completion callback for a path request. Completions for tickets the
    /// unit no longer waits on are ignored.
    pub fn on_path_complete(&mut self, ticket: PathTicket, waypoints: Option<Vec<Vec2>>) {
        if !self.awaiting_path(ticket) {
            trace!(ticket = ticket.0, "discarding stale path");
            return;
        }
        match waypoints.and_then(WaypointPath::new) {
            Some(path) => {
                debug!(ticket = ticket.0, waypoints = path.waypoints().len(), "following path");
                self.seek = Seek::Following(path);
                self.apply_state(SteeringState::Waypoint);
            }
            None => self.seek_stop(),
        }
    }

    // --- frame tick ---

    /// Obstruction checks, path requests and the wall probe.
    ///
    /// `goal` is the current position of the move target, `None` when there
    /// is no target or it cannot be resolved.
    pub fn tick(
        &mut self,
        dt: f32,
        body: &UnitBody,
        goal: Option<Vec2>,
        probe: &impl ObstacleProbe,
        pathing: &mut impl PathingService,
    ) {
        for ticket in self.abandoned.drain(..) {
            pathing.cancel_path(ticket);
        }
        if !self.enabled {
            return;
        }

        if let (Some(_), Some(dest)) = (self.move_target, goal) {
            match &self.seek {
                Seek::Following(path) => {
                    self.seek_elapsed += dt;
                    if self.seek_elapsed >= self.config.seek_delay {
                        let destination = path.destination();
                        self.measure_goal(body.position, dest);
                        let radius_sqr = self.config.path_radius * self.config.path_radius;
                        let moved =
                            destination.is_none_or(|end| end.distance_squared(dest) > radius_sqr);
                        if moved || !self.target_blocked(body.position, probe) {
                            self.seek_stop();
                        } else {
                            self.seek_elapsed = 0.0;
                        }
                    }
                }
                Seek::Pending(_) => {}
                Seek::Inactive => {
                    self.seek_elapsed += dt;
                    if self.seek_elapsed >= self.config.seek_delay {
                        self.measure_goal(body.position, dest);
                        if self.target_blocked(body.position, probe) {
                            self.seek_start(body.position, dest, pathing);
                        } else {
                            self.seek_elapsed = 0.0;
                        }
                    }
                }
            }
        }

        self.wall_hit = probe.sphere_cast(
            body.position,
            self.config.wall_radius,
            body.facing,
            WALL_PROBE_DISTANCE,
        );
    }

    // --- fixed tick ---

    /// Advance the state machine and return the force to apply this tick.
    ///
    /// `neighbours` is `None` when the unit has no proximity sensor.
    pub fn fixed_tick(
        &mut self,
        dt: f32,
        body: &UnitBody,
        filter: &UnitFilter,
        neighbours: Option<&[Neighbour]>,
        goal: Option<Vec2>,
        rng: &mut impl Rng,
    ) -> Vec2 {
        if !self.enabled {
            return Vec2::ZERO;
        }

        self.wander_elapsed += dt;
        let mut force = Vec2::ZERO;

        if self.state == SteeringState::Waypoint {
            force += self.follow_waypoint(dt, body, filter, neighbours);
        } else {
            self.update_elapsed += dt;
            if self.update_elapsed >= self.config.update_delay {
                self.update_elapsed = 0.0;
                force += self.state_force(body, filter, neighbours, goal, rng);
            }
        }

        if let Some(hit) = self.wall_hit {
            force += steer(
                body.velocity,
                hit.normal * body.max_speed,
                self.config.max_force,
                self.config.wall_factor,
            );
        }

        force
    }

    fn follow_waypoint(
        &mut self,
        dt: f32,
        body: &UnitBody,
        filter: &UnitFilter,
        neighbours: Option<&[Neighbour]>,
    ) -> Vec2 {
        let Some(waypoint) = self.path().and_then(WaypointPath::current_waypoint) else {
            self.seek_stop();
            return Vec2::ZERO;
        };

        let desired = waypoint - body.position;
        let radius_sqr = self.config.path_radius * self.config.path_radius;
        if desired.length_squared() < radius_sqr {
            let more = match &mut self.seek {
                Seek::Following(path) => path.advance(),
                _ => false,
            };
            if !more {
                debug!("path complete");
                self.seek_stop();
            }
            return Vec2::ZERO;
        }

        self.update_elapsed += dt;
        if self.update_elapsed < self.config.update_delay {
            return Vec2::ZERO;
        }
        self.update_elapsed = 0.0;

        self.separation(body, filter, neighbours)
            + desired.normalize_or_zero() * (self.config.max_force * self.config.path_factor)
    }

    fn state_force(
        &mut self,
        body: &UnitBody,
        filter: &UnitFilter,
        neighbours: Option<&[Neighbour]>,
        goal: Option<Vec2>,
        rng: &mut impl Rng,
    ) -> Vec2 {
        match self.state {
            SteeringState::Move => {
                let (Some(_), Some(dest)) = (self.move_target, goal) else {
                    self.apply_state(self.fallback_state());
                    return Vec2::ZERO;
                };
                let delta = dest - body.position;
                let distance = delta.length();
                self.move_target_distance = distance;

                let (mut force, num_follow) = if self.group_move_enabled {
                    self.group_movement(body, filter, neighbours)
                } else {
                    (self.separation(body, filter, neighbours), 0)
                };

                if distance > 0.0 {
                    let catch_up = self.catch_up_enabled
                        && (neighbours.is_none() || num_follow == 0)
                        && distance > self.config.catch_up_min_distance;
                    let factor = if catch_up {
                        self.config.catch_up_factor
                    } else {
                        self.config.move_to_factor
                    };

                    // Inside the keep-away distance the unit backs off instead.
                    let dir = if distance < self.min_move_target_distance {
                        -delta / distance
                    } else {
                        delta / distance
                    };
                    self.move_target_dir = dir;

                    force += steer(
                        body.velocity,
                        dir * body.max_speed,
                        self.config.max_force,
                        factor,
                    );
                }
                force
            }
            SteeringState::Wander => {
                if self.wander_refresh_due || self.wander_elapsed >= self.config.wander_delay {
                    self.wander_refresh(rng);
                }
                self.separation(body, filter, neighbours)
                    + steer(
                        body.velocity,
                        self.move_target_dir * body.max_speed,
                        self.config.max_force,
                        self.config.move_to_factor,
                    )
            }
            SteeringState::Idle | SteeringState::Waypoint => {
                self.group_movement(body, filter, neighbours).0
            }
        }
    }

    // --- forces ---

    /// Separation and avoidance only. Used while idle-moving, path following
    /// and wandering.
    #[must_use]
    pub fn separation(
        &self,
        body: &UnitBody,
        filter: &UnitFilter,
        neighbours: Option<&[Neighbour]>,
    ) -> Vec2 {
        let sums = Self::gather(body, filter, neighbours, &self.config, false);
        self.spacing_force(body, &sums)
    }

    /// Separation, avoidance, alignment and cohesion, plus the number of
    /// group members followed.
    #[must_use]
    pub fn group_movement(
        &self,
        body: &UnitBody,
        filter: &UnitFilter,
        neighbours: Option<&[Neighbour]>,
    ) -> (Vec2, u32) {
        let sums = Self::gather(body, filter, neighbours, &self.config, true);
        let mut force = self.spacing_force(body, &sums);

        if sums.num_follow > 0 {
            #[allow(clippy::cast_precision_loss)]
            let count = sums.num_follow as f32;
            let align = (sums.align / count).normalize_or_zero();
            force += steer(
                body.velocity,
                align * body.max_speed,
                self.config.max_force,
                self.config.align_factor,
            );
            force += seek(
                body.position,
                sums.cohesion / count,
                body.velocity,
                body.max_speed,
                self.config.max_force,
                self.config.cohesion_factor,
            );
        }

        (force, sums.num_follow)
    }

    fn gather(
        body: &UnitBody,
        filter: &UnitFilter,
        neighbours: Option<&[Neighbour]>,
        config: &FlockConfig,
        follow: bool,
    ) -> FlockSums {
        let mut sums = FlockSums::default();
        for other in neighbours.unwrap_or_default() {
            let delta = body.position - other.position;
            let distance = delta.length();

            if filter.check_avoid(other.id) {
                if distance < config.avoid_distance && distance > 0.0 {
                    sums.avoid += delta / distance;
                    sums.num_avoid += 1;
                }
            } else if filter.same_group(other.id) {
                if distance < config.separate_distance && distance > 0.0 {
                    sums.separate += delta / distance;
                    sums.num_separate += 1;
                }
                if let (true, Some(velocity)) = (follow, other.velocity) {
                    sums.align += velocity;
                    sums.cohesion += other.position;
                    sums.num_follow += 1;
                }
            }
        }
        sums
    }

    #[allow(clippy::cast_precision_loss)]
    fn spacing_force(&self, body: &UnitBody, sums: &FlockSums) -> Vec2 {
        let mut force = Vec2::ZERO;
        if sums.num_avoid > 0 {
            let away = (sums.avoid / sums.num_avoid as f32).normalize_or_zero();
            if away != Vec2::ZERO {
                force += steer(
                    body.velocity,
                    away * body.max_speed,
                    self.config.max_force,
                    self.config.avoid_factor,
                );
            }
        }
        if sums.num_separate > 0 {
            let away = (sums.separate / sums.num_separate as f32).normalize_or_zero();
            if away != Vec2::ZERO {
                force += steer(
                    body.velocity,
                    away * body.max_speed,
                    self.config.max_force,
                    self.config.separate_factor,
                );
            }
        }
        force
    }

    // --- seeking ---

    fn measure_goal(&mut self, position: Vec2, dest: Vec2) {
        let delta = dest - position;
        self.move_target_distance = delta.length();
        if self.move_target_distance > 0.0 {
            self.move_target_dir = delta / self.move_target_distance;
        }
    }

    /// Is the straight line to the goal swept by a wall before the keep-away distance?
    fn target_blocked(&self, position: Vec2, probe: &impl ObstacleProbe) -> bool {
        let reach = self.move_target_distance - self.min_move_target_distance;
        reach > 0.0
            && probe
                .sphere_cast(position, self.config.path_radius, self.move_target_dir, reach)
                .is_some()
    }

    fn seek_start(&mut self, start: Vec2, dest: Vec2, pathing: &mut impl PathingService) {
        self.seek_elapsed = 0.0;
        let Some(ticket) = pathing.request_path(start, dest) else {
            trace!("no pathing service, request dropped");
            return;
        };
        debug!(ticket = ticket.0, "target blocked, requesting path");
        self.seek = Seek::Pending(ticket);
        self.apply_state(SteeringState::Idle);
    }

    fn seek_stop(&mut self) {
        if let Seek::Pending(ticket) = self.seek {
            self.abandoned.push(ticket);
        }
        self.seek = Seek::Inactive;
        self.seek_elapsed = 0.0;
        self.apply_state(self.fallback_state());
    }

    const fn fallback_state(&self) -> SteeringState {
        if self.move_target.is_some() {
            SteeringState::Move
        } else if self.wander_enabled {
            SteeringState::Wander
        } else {
            SteeringState::Idle
        }
    }

    fn apply_state(&mut self, state: SteeringState) {
        if self.state != state {
            debug!(from = ?self.state, to = ?state, "steering state");
        }
        self.state = state;
        if state == SteeringState::Wander {
            self.wander_refresh_due = true;
            self.wander_elapsed = 0.0;
        }
    }

    fn wander_refresh(&mut self, rng: &mut impl Rng) {
        self.wander_refresh_due = false;
        self.wander_elapsed = 0.0;
        self.move_target_dir = Vec2::from_angle(rng.random_range(0.0..std::f32::consts::TAU));
    }
}
