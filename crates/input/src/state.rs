use std::collections::{BTreeMap, BTreeSet};

use crate::action::Action;

/// Press/release transitions recorded since the last drain.
///
/// A press and release of the same action between two frames shows up in
/// both sets, so one-shot requests (jump) and release hooks (footstep reset)
/// are never lost to a short tap.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputEdges {
    pub pressed: BTreeSet<Action>,
    pub released: BTreeSet<Action>,
}

impl InputEdges {
    pub fn was_pressed(&self, action: Action) -> bool {
        self.pressed.contains(&action)
    }

    pub fn was_released(&self, action: Action) -> bool {
        self.released.contains(&action)
    }

    /// True if forward or back was released.
    pub fn stride_released(&self) -> bool {
        self.released.iter().any(|a| a.is_stride())
    }

    pub fn is_empty(&self) -> bool {
        self.pressed.is_empty() && self.released.is_empty()
    }
}

/// Held state of every action.
#[derive(Debug, Clone)]
pub struct InputState {
    held: BTreeMap<Action, bool>,
    edges: InputEdges,
    attached: bool,
}

impl Default for InputState {
    fn default() -> Self {
        Self::new()
    }
}

impl InputState {
    /// All actions registered as released.
    pub fn new() -> Self {
        Self {
            held: Action::ALL.into_iter().map(|a| (a, false)).collect(),
            edges: InputEdges::default(),
            attached: true,
        }
    }

    /// Overwrite the held flag of `action`. Setting the current value again is a no-op.
    pub fn set_action(&mut self, action: Action, pressed: bool) {
        let previous = self.held.insert(action, pressed).unwrap_or(false);
        if previous == pressed {
            return;
        }
        if pressed {
            self.edges.pressed.insert(action);
        } else {
            self.edges.released.insert(action);
        }
    }

    pub fn is_pressed(&self, action: Action) -> bool {
        self.held.get(&action).copied().unwrap_or(false)
    }

    /// Held state by host key identifier; `false` for keys outside the action set.
    pub fn is_key_pressed(&self, key: &str) -> bool {
        Action::from_key(key).is_some_and(|a| self.is_pressed(a))
    }

    /// Key-down notification. Returns the mapped action, if any.
    pub fn key_down(&mut self, key: &str) -> Option<Action> {
        self.key_event(key, true)
    }

    /// Key-up notification. Returns the mapped action, if any.
    pub fn key_up(&mut self, key: &str) -> Option<Action> {
        self.key_event(key, false)
    }

    fn key_event(&mut self, key: &str, pressed: bool) -> Option<Action> {
        if !self.attached {
            return None;
        }
        let action = Action::from_key(key)?;
        self.set_action(action, pressed);
        tracing::trace!(action = %action, pressed, "key event");
        Some(action)
    }

    /// Stop listening to key notifications. Held flags stay as they were.
    pub fn detach(&mut self) {
        if self.attached {
            tracing::debug!("input listeners detached");
        }
        self.attached = false;
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    /// Currently held actions, in declaration order.
    pub fn held(&self) -> impl Iterator<Item = Action> + '_ {
        self.held.iter().filter(|&(_, &on)| on).map(|(&a, _)| a)
    }

    /// Take the transitions recorded since the previous call.
    pub fn take_edges(&mut self) -> InputEdges {
        std::mem::take(&mut self.edges)
    }
}
