//! What an agent can be told to do, and the bookkeeping of what it is doing.

use bevy::prelude::*;

/// Kind of action a target asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Reflect)]
pub enum ActionKind {
    Attack,
    Retreat,
    Follow,
    Disperse,
    Other,
}

/// Importance of an assignment. Ordered from [`Priority::Lowest`] up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Reflect)]
pub enum Priority {
    #[default]
    Lowest,
    Low,
    Normal,
    High,
    Highest,
}

/// Makes an entity assignable as an action target.
#[derive(Component, Debug, Clone, Copy, PartialEq, Reflect)]
#[reflect(Component)]
pub struct ActionTarget {
    pub kind: ActionKind,
    pub priority: Priority,
    /// Whether the target still accepts more listeners.
    pub vacancy: bool,
    /// Where listeners move to for non-attack kinds. Defaults to the target itself.
    pub anchor: Option<Entity>,
}

impl ActionTarget {
    #[must_use]
    pub const fn new(kind: ActionKind, priority: Priority) -> Self {
        Self {
            kind,
            priority,
            vacancy: true,
            anchor: None,
        }
    }

    #[must_use]
    pub const fn with_anchor(mut self, anchor: Entity) -> Self {
        self.anchor = Some(anchor);
        self
    }

    /// Entity a listener steers toward when assigned to `target`.
    /// Attackers always close in on the target itself.
    #[must_use]
    pub fn move_point(&self, target: Entity) -> Entity {
        match self.kind {
            ActionKind::Attack => target,
            _ => self.anchor.unwrap_or(target),
        }
    }
}

/// A listener's current assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Reflect)]
pub struct Assignment {
    pub target: Entity,
    pub move_point: Entity,
    pub kind: ActionKind,
    pub priority: Priority,
}

impl Assignment {
    #[must_use]
    pub fn new(target: Entity, data: &ActionTarget) -> Self {
        Self {
            target,
            move_point: data.move_point(target),
            kind: data.kind,
            priority: data.priority,
        }
    }
}

/// Assignment bookkeeping shared by every listener.
#[derive(Debug, Clone, PartialEq, Reflect)]
pub struct ActionListener {
    current: Option<Assignment>,
    /// Target the listener falls back to when idle.
    pub default_target: Option<Entity>,
    /// A locked listener keeps its current assignment.
    pub locked: bool,
    active: bool,
}

impl Default for ActionListener {
    fn default() -> Self {
        Self {
            current: None,
            default_target: None,
            locked: false,
            active: true,
        }
    }
}

impl ActionListener {
    #[must_use]
    pub const fn current(&self) -> Option<&Assignment> {
        self.current.as_ref()
    }

    #[must_use]
    pub fn current_kind(&self) -> Option<ActionKind> {
        self.current.map(|a| a.kind)
    }

    /// Priority of the current assignment, [`Priority::Lowest`] when idle.
    #[must_use]
    pub fn current_priority(&self) -> Priority {
        self.current.map_or(Priority::Lowest, |a| a.priority)
    }

    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active
    }

    pub const fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    /// True when the current assignment is the default target.
    #[must_use]
    pub fn on_default_target(&self) -> bool {
        self.current
            .is_some_and(|a| Some(a.target) == self.default_target)
    }

    /// Whether `target` may replace the current assignment.
    #[must_use]
    pub fn accepts(&self, target: Entity) -> bool {
        self.active && !self.locked && self.current.is_none_or(|a| a.target != target)
    }

    /// Whether a stop request at `priority` ends the current assignment.
    #[must_use]
    pub fn allows_stop(&self, priority: Priority, forced: bool) -> bool {
        self.current.is_some() && (forced || priority >= self.current_priority())
    }

    pub(super) fn begin(&mut self, assignment: Assignment) {
        self.current = Some(assignment);
    }

    pub(super) fn finish(&mut self) -> Option<Assignment> {
        self.current.take()
    }
}
