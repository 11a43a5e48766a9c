//! Path requests: the pathing-service seam, the waypoint path a unit follows,
//! and the navmesh-backed request queue.

use bevy::prelude::*;
use vleue_navigator::prelude::{ManagedNavMesh, NavMesh, NavMeshStatus};

use super::unit::FlockUnit;

/// Identifies one path request. Tickets are never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Reflect)]
pub struct PathTicket(pub u64);

/// Asynchronous path computation.
///
/// Completions are delivered later through [`FlockUnit::on_path_complete`]
/// with the ticket returned here.
pub trait PathingService {
    /// Queue a request. `None` means no pathing backend is active and the
    /// request was dropped.
    fn request_path(&mut self, start: Vec2, goal: Vec2) -> Option<PathTicket>;

    /// Forget a request. Completing a cancelled ticket is harmless.
    fn cancel_path(&mut self, ticket: PathTicket);
}

/// No backend: every request is dropped.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPathing;

impl PathingService for NoPathing {
    fn request_path(&mut self, _: Vec2, _: Vec2) -> Option<PathTicket> {
        None
    }

    fn cancel_path(&mut self, _: PathTicket) {}
}

/// Waypoints returned for one request plus a forward-only cursor.
#[derive(Debug, Clone, PartialEq, Reflect)]
pub struct WaypointPath {
    waypoints: Vec<Vec2>,
    cursor: usize,
}

impl WaypointPath {
    /// `None` for an empty route.
    #[must_use]
    pub fn new(waypoints: Vec<Vec2>) -> Option<Self> {
        (!waypoints.is_empty()).then_some(Self {
            waypoints,
            cursor: 0,
        })
    }

    #[must_use]
    pub fn waypoints(&self) -> &[Vec2] {
        &self.waypoints
    }

    #[must_use]
    pub const fn cursor(&self) -> usize {
        self.cursor
    }

    /// Waypoint currently steered toward, if any remain.
    #[must_use]
    pub fn current_waypoint(&self) -> Option<Vec2> {
        self.waypoints.get(self.cursor).copied()
    }

    /// Final waypoint of the route.
    #[must_use]
    pub fn destination(&self) -> Option<Vec2> {
        self.waypoints.last().copied()
    }

    /// Move to the next waypoint. Returns false once the route is consumed;
    /// the cursor then stays one past the end.
    pub fn advance(&mut self) -> bool {
        if self.cursor < self.waypoints.len() {
            self.cursor += 1;
        }
        self.cursor < self.waypoints.len()
    }
}

// === Navmesh-backed queue ===

/// A request waiting for the navmesh.
#[derive(Debug, Clone, Copy, PartialEq, Reflect)]
pub struct PathRequest {
    pub unit: Entity,
    pub ticket: PathTicket,
    pub start: Vec2,
    pub goal: Vec2,
}

/// Result of a request, delivered to the unit on a later frame.
#[derive(Message, Debug, Clone, PartialEq)]
pub struct PathCompleted {
    pub unit: Entity,
    pub ticket: PathTicket,
    /// `None` when no route exists.
    pub waypoints: Option<Vec<Vec2>>,
}

/// Pending path requests for all units.
///
/// `active` mirrors whether a built navmesh exists; while inactive every
/// request is dropped at the door.
#[derive(Resource, Debug, Default, Reflect)]
#[reflect(Resource)]
pub struct PathQueue {
    active: bool,
    next_ticket: u64,
    pending: Vec<PathRequest>,
}

impl PathQueue {
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active
    }

    pub const fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    #[must_use]
    pub fn pending(&self) -> &[PathRequest] {
        &self.pending
    }

    /// Pathing service bound to one unit.
    pub const fn for_unit(&mut self, unit: Entity) -> QueuedPathing<'_> {
        QueuedPathing { queue: self, unit }
    }

    /// Drop every pending request issued by `unit`.
    pub fn cancel_unit(&mut self, unit: Entity) {
        self.pending.retain(|r| r.unit != unit);
    }

    fn take_pending(&mut self) -> Vec<PathRequest> {
        std::mem::take(&mut self.pending)
    }
}

/// [`PathingService`] view of the [`PathQueue`] for a single unit.
#[derive(Debug)]
pub struct QueuedPathing<'a> {
    queue: &'a mut PathQueue,
    unit: Entity,
}

impl PathingService for QueuedPathing<'_> {
    fn request_path(&mut self, start: Vec2, goal: Vec2) -> Option<PathTicket> {
        if !self.queue.active {
            return None;
        }
        self.queue.next_ticket += 1;
        let ticket = PathTicket(self.queue.next_ticket);
        self.queue.pending.push(PathRequest {
            unit: self.unit,
            ticket,
            start,
            goal,
        });
        Some(ticket)
    }

    fn cancel_path(&mut self, ticket: PathTicket) {
        self.queue.pending.retain(|r| r.ticket != ticket);
    }
}

/// Compute the route for one request.
#[must_use]
pub fn resolve_request(navmesh: &NavMesh, request: &PathRequest) -> PathCompleted {
    PathCompleted {
        unit: request.unit,
        ticket: request.ticket,
        waypoints: navmesh
            .path(request.start, request.goal)
            .map(|path| path.path)
            .filter(|waypoints| !waypoints.is_empty()),
    }
}

/// Resolves queued requests against the navmesh. Runs in `FlockSet::Plan`
/// after the seek checks, so completions reach units on the next frame.
///
/// Requests whose unit stopped awaiting them are dropped unresolved. If the
/// navmesh disappears while requests are pending they complete as failures.
pub fn resolve_path_requests(
    mut queue: ResMut<PathQueue>,
    navmeshes: Option<Res<Assets<NavMesh>>>,
    navmesh_query: Option<Single<(&ManagedNavMesh, &NavMeshStatus)>>,
    units: Query<&FlockUnit>,
    mut completed: MessageWriter<PathCompleted>,
) {
    let navmesh = navmeshes.as_ref().and_then(|navmeshes| {
        let inner = navmesh_query.as_ref()?;
        let (managed, status) = **inner;
        if *status != NavMeshStatus::Built {
            return None;
        }
        navmeshes.get(managed)
    });

    if queue.is_active() != navmesh.is_some() {
        debug!(active = navmesh.is_some(), "pathing availability changed");
    }
    queue.set_active(navmesh.is_some());

    for request in queue.take_pending() {
        let awaiting = units
            .get(request.unit)
            .is_ok_and(|unit| unit.awaiting_path(request.ticket));
        if !awaiting {
            continue;
        }
        let result = match navmesh {
            Some(navmesh) => resolve_request(navmesh, &request),
            None => PathCompleted {
                unit: request.unit,
                ticket: request.ticket,
                waypoints: None,
            },
        };
        trace!(
            unit = ?result.unit,
            ticket = result.ticket.0,
            found = result.waypoints.is_some(),
            "path resolved"
        );
        completed.write(result);
    }
}

/// Hands completed paths back to their units.
pub fn deliver_path_completions(
    mut completed: MessageReader<PathCompleted>,
    mut units: Query<&mut FlockUnit>,
) {
    for message in completed.read() {
        let Ok(mut unit) = units.get_mut(message.unit) else {
            continue;
        };
        unit.on_path_complete(message.ticket, message.waypoints.clone());
    }
}

/// A despawned unit leaves no requests behind.
pub fn cancel_paths_on_remove(remove: On<Remove, FlockUnit>, mut queue: ResMut<PathQueue>) {
    queue.cancel_unit(remove.entity);
}
