//! Surface geometry: screen/local conversion and layout of the compositing viewport.
//!
//! Pointer events arrive in screen space (CSS pixels relative to the browser
//! viewport). Placed instances live in surface-local space, whose origin is the
//! surface's top-left corner. The two differ only by a translation, so deltas
//! are identical in both spaces and only absolute positions need converting.

#[cfg(test)]
#[path = "surface_test.rs"]
mod surface_test;

use serde::{Deserialize, Serialize};

use crate::consts::{SURFACE_ASPECT, SURFACE_MAX_WIDTH_PX, SURFACE_WIDTH_FRACTION};

/// A point in either screen or surface-local space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Angle of the vector from `center` to this point, in degrees.
    ///
    /// Screen y grows downward, so positive angles run clockwise.
    #[must_use]
    pub fn angle_from_deg(self, center: Point) -> f64 {
        (self.y - center.y).atan2(self.x - center.x).to_degrees()
    }
}

/// Bounding box of the surface element in screen space, as reported by the host.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceRect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl SurfaceRect {
    #[must_use]
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self { left, top, width, height }
    }

    /// Whether every component is finite and the size is positive.
    #[must_use]
    pub fn is_usable(&self) -> bool {
        [self.left, self.top, self.width, self.height]
            .iter()
            .all(|v| v.is_finite())
            && self.width > 0.0
            && self.height > 0.0
    }
}

/// The compositing surface's placement on screen.
///
/// `rect` is `None` until the host has mounted the surface and measured it.
/// Every conversion returns `None` while the geometry is unknown, which is how
/// gesture updates get suppressed instead of producing NaN coordinates.
#[derive(Debug, Clone, Copy, Default)]
pub struct Surface {
    rect: Option<SurfaceRect>,
}

impl Surface {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the measured bounding box. Unusable rects are treated as unmounted.
    pub fn set_rect(&mut self, rect: Option<SurfaceRect>) {
        self.rect = rect.filter(SurfaceRect::is_usable);
    }

    /// The current bounding box, if mounted.
    #[must_use]
    pub fn rect(&self) -> Option<SurfaceRect> {
        self.rect
    }

    /// Whether geometry is available.
    #[must_use]
    pub fn is_mounted(&self) -> bool {
        self.rect.is_some()
    }

    /// Convert a screen-space point to surface-local coordinates.
    #[must_use]
    pub fn screen_to_local(&self, screen: Point) -> Option<Point> {
        self.rect.map(|r| Point {
            x: screen.x - r.left,
            y: screen.y - r.top,
        })
    }

    /// Convert a surface-local point to screen coordinates.
    #[must_use]
    pub fn local_to_screen(&self, local: Point) -> Option<Point> {
        self.rect.map(|r| Point {
            x: local.x + r.left,
            y: local.y + r.top,
        })
    }

    /// Whether a screen-space point falls inside the surface bounds.
    #[must_use]
    pub fn contains_screen(&self, screen: Point) -> bool {
        self.rect.is_some_and(|r| {
            screen.x >= r.left && screen.x <= r.left + r.width && screen.y >= r.top && screen.y <= r.top + r.height
        })
    }
}

/// Surface size for a container of the given width: 90% of it, capped at
/// 1280 px, with a fixed 16:9 aspect ratio.
#[must_use]
pub fn surface_size_for(container_width: f64) -> (f64, f64) {
    let width = (container_width * SURFACE_WIDTH_FRACTION)
        .min(SURFACE_MAX_WIDTH_PX)
        .max(0.0);
    (width, width / SURFACE_ASPECT)
}

/// Source crop `(sx, sy, sw, sh)` that draws an image with "cover" semantics:
/// scaled uniformly to fill the destination, centred, overflow cropped.
///
/// Returns `None` when either size is degenerate.
#[must_use]
pub fn cover_source_rect(img_w: f64, img_h: f64, dst_w: f64, dst_h: f64) -> Option<(f64, f64, f64, f64)> {
    if img_w <= 0.0 || img_h <= 0.0 || dst_w <= 0.0 || dst_h <= 0.0 {
        return None;
    }
    let scale = (dst_w / img_w).max(dst_h / img_h);
    let sw = dst_w / scale;
    let sh = dst_h / scale;
    Some(((img_w - sw) / 2.0, (img_h - sh) / 2.0, sw, sh))
}
