//! Input model: mouse buttons and the gesture state machine.
//!
//! `InputState` is the active gesture tracked between pointer-down and
//! pointer-up. Each active variant carries the anchor state captured at
//! gesture start; nothing outside the gesture holds on to it, and it is
//! discarded when the state returns to `Idle`.
//!
//! All pointer positions stored here are in screen space. Translation-only
//! conversion means screen deltas equal surface-local deltas.

#[cfg(test)]
#[path = "input_test.rs"]
mod input_test;

use crate::doc::InstanceId;
use crate::surface::Point;

/// Mouse button identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    /// Left mouse button (or single-finger touch).
    Primary,
    /// Middle mouse button (scroll wheel click).
    Middle,
    /// Right mouse button (or two-finger tap).
    Secondary,
    /// Any other button (back, forward, ...), carrying the DOM code.
    Other(i16),
}

impl Button {
    /// Map a DOM `MouseEvent.button` code.
    #[must_use]
    pub fn from_dom(code: i16) -> Self {
        match code {
            0 => Self::Primary,
            1 => Self::Middle,
            2 => Self::Secondary,
            other => Self::Other(other),
        }
    }
}

/// The three kinds of direct-manipulation gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureKind {
    Move,
    Resize,
    Rotate,
}

/// Internal state for the input state machine.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum InputState {
    /// No gesture in progress; waiting for the next pointer-down.
    #[default]
    Idle,
    /// Dragging an instance's body.
    Moving {
        /// Id of the instance being moved.
        id: InstanceId,
        /// Pointer position at the previous step; advanced after every step.
        last_screen: Point,
    },
    /// Dragging the bottom-right resize handle.
    Resizing {
        /// Id of the instance being resized.
        id: InstanceId,
        /// Pointer position at gesture start.
        start_screen: Point,
        /// Width at gesture start.
        start_width: f64,
        /// Height at gesture start.
        start_height: f64,
    },
    /// Dragging the rotate handle.
    Rotating {
        /// Id of the instance being rotated.
        id: InstanceId,
        /// Instance centre in screen space, fixed for the whole gesture.
        center_screen: Point,
        /// Pointer angle about the centre at gesture start, in degrees.
        start_angle: f64,
        /// Rotation at gesture start, in degrees.
        start_rotation: f64,
    },
}

impl InputState {
    /// Whether a gesture is in progress.
    #[must_use]
    pub fn is_active(&self) -> bool {
        !matches!(self, Self::Idle)
    }

    /// The kind of the active gesture, if any.
    #[must_use]
    pub fn kind(&self) -> Option<GestureKind> {
        match self {
            Self::Idle => None,
            Self::Moving { .. } => Some(GestureKind::Move),
            Self::Resizing { .. } => Some(GestureKind::Resize),
            Self::Rotating { .. } => Some(GestureKind::Rotate),
        }
    }

    /// The instance the active gesture targets, if any.
    #[must_use]
    pub fn target(&self) -> Option<InstanceId> {
        match self {
            Self::Idle => None,
            Self::Moving { id, .. } | Self::Resizing { id, .. } | Self::Rotating { id, .. } => Some(*id),
        }
    }
}
