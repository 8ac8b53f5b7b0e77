//! Hit-testing against placed instances and the selected instance's affordances.
//!
//! All coordinates are surface-local. Affordance positions are defined on the
//! unrotated rectangle and then rotated with the instance about its centre,
//! so handles stay attached to the same corner however the instance is turned.

#[cfg(test)]
#[path = "hit_test.rs"]
mod hit_test;

use crate::consts::{
    DELETE_CONTROL_INSET_PX, DELETE_CONTROL_RADIUS_PX, RESIZE_HANDLE_RADIUS_PX, ROTATE_HANDLE_OFFSET_PX,
    ROTATE_HANDLE_RADIUS_PX,
};
use crate::doc::{InstanceId, PlacedInstance, Scene};
use crate::surface::Point;

/// Which part of an instance was hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitPart {
    Body,
    ResizeHandle,
    RotateHandle,
    DeleteControl,
}

impl HitPart {
    /// CSS cursor to show while hovering or dragging this part.
    #[must_use]
    pub fn cursor(self) -> &'static str {
        match self {
            Self::Body => "move",
            Self::ResizeHandle => "se-resize",
            Self::RotateHandle => "alias",
            Self::DeleteControl => "pointer",
        }
    }
}

/// Result of a hit test.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hit {
    pub instance_id: InstanceId,
    pub part: HitPart,
}

/// Centres of the selection affordances of one instance, in surface-local space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Affordances {
    pub resize: Point,
    pub rotate: Point,
    pub delete: Point,
}

/// Rotate `p` about `center` by `deg` degrees (clockwise on screen).
#[must_use]
pub fn rotate_about(p: Point, center: Point, deg: f64) -> Point {
    let (sin, cos) = deg.to_radians().sin_cos();
    let dx = p.x - center.x;
    let dy = p.y - center.y;
    Point::new(center.x + dx * cos - dy * sin, center.y + dx * sin + dy * cos)
}

/// Affordance centres for `inst`, following its rotation.
#[must_use]
pub fn affordances(inst: &PlacedInstance) -> Affordances {
    let c = inst.center();
    let hw = inst.width / 2.0;
    let hh = inst.height / 2.0;
    let place = |dx: f64, dy: f64| rotate_about(Point::new(c.x + dx, c.y + dy), c, inst.rotation);
    Affordances {
        resize: place(hw, hh),
        rotate: place(0.0, -hh - ROTATE_HANDLE_OFFSET_PX),
        delete: place(hw - DELETE_CONTROL_INSET_PX, -hh + DELETE_CONTROL_INSET_PX),
    }
}

/// Whether `pt` lies inside the instance's rotated rectangle.
#[must_use]
pub fn point_in_instance(pt: Point, inst: &PlacedInstance) -> bool {
    let local = rotate_about(pt, inst.center(), -inst.rotation);
    local.x >= inst.x && local.x <= inst.x + inst.width && local.y >= inst.y && local.y <= inst.y + inst.height
}

fn within(pt: Point, center: Point, radius: f64) -> bool {
    let dx = pt.x - center.x;
    let dy = pt.y - center.y;
    dx * dx + dy * dy <= radius * radius
}

/// Test which instance (if any) is under `pt`.
///
/// The selected instance's affordances are checked first (delete, rotate,
/// resize), then bodies from top-most to bottom-most.
#[must_use]
pub fn hit_test(pt: Point, scene: &Scene) -> Option<Hit> {
    if let Some(sel) = scene.selected_instance() {
        let a = affordances(sel);
        let part = if within(pt, a.delete, DELETE_CONTROL_RADIUS_PX) {
            Some(HitPart::DeleteControl)
        } else if within(pt, a.rotate, ROTATE_HANDLE_RADIUS_PX) {
            Some(HitPart::RotateHandle)
        } else if within(pt, a.resize, RESIZE_HANDLE_RADIUS_PX) {
            Some(HitPart::ResizeHandle)
        } else {
            None
        };
        if let Some(part) = part {
            return Some(Hit { instance_id: sel.id, part });
        }
    }

    scene
        .instances()
        .iter()
        .rev()
        .find(|inst| point_in_instance(pt, inst))
        .map(|inst| Hit { instance_id: inst.id, part: HitPart::Body })
}
