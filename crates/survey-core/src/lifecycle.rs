//! Status lifecycles shared by suggestions and requirements.
//!
//! The documented graph is advisory: any status may be stored, but callers
//! can ask whether a move follows the graph and report when it does not.

use std::fmt;

pub trait Lifecycle: Copy + PartialEq + fmt::Display + 'static {
    const ENTITY: &'static str;

    /// Statuses reachable in one step from `self`.
    fn successors(self) -> &'static [Self];

    fn is_terminal(self) -> bool {
        self.successors().is_empty()
    }

    /// Whether moving to `next` follows the documented graph. Staying put is allowed.
    fn permits(self, next: Self) -> bool {
        self == next || self.successors().contains(&next)
    }
}

/// Outcome of applying a status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Unchanged,
    Documented,
    Undocumented,
}

pub fn classify<S: Lifecycle>(from: S, to: S) -> Transition {
    if from == to {
        Transition::Unchanged
    } else if from.permits(to) {
        Transition::Documented
    } else {
        Transition::Undocumented
    }
}
