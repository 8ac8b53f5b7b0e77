//! Shared numeric constants for the canvas crate.

// ── Instances ───────────────────────────────────────────────────

/// Smallest width or height a placed instance may be resized to.
pub const MIN_INSTANCE_SIZE: f64 = 20.0;

// ── Affordances ─────────────────────────────────────────────────

/// Radius of the bottom-right resize handle, centred on the corner.
pub const RESIZE_HANDLE_RADIUS_PX: f64 = 8.0;

/// Radius of the rotate handle.
pub const ROTATE_HANDLE_RADIUS_PX: f64 = 12.0;

/// Distance from the top edge midpoint to the rotate handle centre.
pub const ROTATE_HANDLE_OFFSET_PX: f64 = 20.0;

/// Radius of the delete control.
pub const DELETE_CONTROL_RADIUS_PX: f64 = 12.0;

/// How far the delete control centre sits inside the top-right corner, on both axes.
pub const DELETE_CONTROL_INSET_PX: f64 = 4.0;

/// Gap between an instance and its dashed selection outline.
pub const SELECTION_OUTLINE_GAP_PX: f64 = 4.0;

// ── Surface ─────────────────────────────────────────────────────

/// Surface aspect ratio (width / height), 16:9.
pub const SURFACE_ASPECT: f64 = 16.0 / 9.0;

/// Upper bound on surface width in CSS pixels.
pub const SURFACE_MAX_WIDTH_PX: f64 = 1280.0;

/// Share of the container width the surface occupies.
pub const SURFACE_WIDTH_FRACTION: f64 = 0.9;
