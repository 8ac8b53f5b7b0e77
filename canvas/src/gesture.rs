//! Gesture math: pure functions from anchor state and pointer position to
//! instance updates.
//!
//! Each step function reads the gesture's anchor and the current pointer
//! position and returns the fields to write back. Move is incremental (delta
//! from the previous pointer), resize and rotate are cumulative (relative to
//! the gesture start), so rotate and resize results depend only on where the
//! pointer is now, never on how many events arrived in between.

#[cfg(test)]
#[path = "gesture_test.rs"]
mod gesture_test;

use crate::consts::MIN_INSTANCE_SIZE;
use crate::doc::{PartialInstance, PlacedInstance};
use crate::surface::Point;

/// New position after moving by the pointer delta since the previous step.
#[must_use]
pub fn move_step(inst: &PlacedInstance, last: Point, current: Point) -> PartialInstance {
    PartialInstance {
        x: Some(inst.x + (current.x - last.x)),
        y: Some(inst.y + (current.y - last.y)),
        ..Default::default()
    }
}

/// New size for a bottom-right resize, floored at [`MIN_INSTANCE_SIZE`].
///
/// The top-left corner stays put and aspect ratio is not preserved.
#[must_use]
pub fn resize_step(start: Point, start_width: f64, start_height: f64, current: Point) -> PartialInstance {
    PartialInstance {
        width: Some((start_width + (current.x - start.x)).max(MIN_INSTANCE_SIZE)),
        height: Some((start_height + (current.y - start.y)).max(MIN_INSTANCE_SIZE)),
        ..Default::default()
    }
}

/// New rotation: the start rotation plus the pointer's angular travel about
/// the fixed centre since gesture start. Not normalized.
///
/// Returns `None` when the pointer sits exactly on the centre, where the
/// angle is undefined.
#[must_use]
pub fn rotate_step(center: Point, start_angle: f64, start_rotation: f64, current: Point) -> Option<PartialInstance> {
    if current == center {
        return None;
    }
    let angle = current.angle_from_deg(center);
    Some(PartialInstance {
        rotation: Some(start_rotation + (angle - start_angle)),
        ..Default::default()
    })
}
