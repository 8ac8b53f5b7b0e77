//! Scene model: object templates, placed instances, and the in-memory scene.
//!
//! This module defines what can be placed (`ObjectTemplate`), what has been
//! placed (`PlacedInstance`), a sparse-update type for gesture edits
//! (`PartialInstance`), and the `Scene` that owns the background, the ordered
//! instance list, and the selection.
//!
//! `Scene` is the single source of truth. Every mutation is synchronous and
//! total: updating or deleting an id that no longer exists is a no-op that
//! reports `false`, so late gesture events racing a delete are harmless.

#[cfg(test)]
#[path = "doc_test.rs"]
mod doc_test;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::consts::MIN_INSTANCE_SIZE;
use crate::surface::Point;

/// Unique identifier for a placed instance.
///
/// Allocated from a per-scene counter that never rewinds, so ids stay unique
/// for the whole session even across reset and retake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstanceId(u64);

impl InstanceId {
    /// The raw counter value.
    #[must_use]
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "obj_{}", self.0)
    }
}

/// Where the pixels of a template or background come from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ImageSource {
    /// Any URL the browser can load: http(s), `data:` or `blob:`.
    Url { url: String },
    /// A tinted, labelled rounded rectangle drawn by the renderer itself.
    Placeholder { color: String, label: String },
}

impl ImageSource {
    #[must_use]
    pub fn url(url: impl Into<String>) -> Self {
        Self::Url { url: url.into() }
    }

    #[must_use]
    pub fn placeholder(color: impl Into<String>, label: impl Into<String>) -> Self {
        Self::Placeholder { color: color.into(), label: label.into() }
    }
}

/// An immutable catalog entry describing a placeable image and its default size.
///
/// This is also the drag-and-drop payload: the palette serializes the whole
/// template, so the surface never needs to look anything up by id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectTemplate {
    /// Stable catalog id (e.g. `bed_1`, `custom_…`).
    pub id: String,
    /// Display label.
    pub name: String,
    /// Image to fill the instance with.
    pub source: ImageSource,
    /// Default width in surface units.
    pub width: f64,
    /// Default height in surface units.
    pub height: f64,
}

impl ObjectTemplate {
    /// Whether the template has a finite, positive size.
    #[must_use]
    pub fn has_valid_size(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }
}

/// A placed, mutable copy of a template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacedInstance {
    /// Per-instance id, distinct from the template id.
    pub id: InstanceId,
    /// Id of the template this instance was created from.
    pub template_id: String,
    /// Display label, copied from the template.
    pub name: String,
    /// Image source, copied from the template.
    pub source: ImageSource,
    /// Left edge in surface-local coordinates. Not clamped to the surface.
    pub x: f64,
    /// Top edge in surface-local coordinates. Not clamped to the surface.
    pub y: f64,
    /// Current width, never below [`MIN_INSTANCE_SIZE`].
    pub width: f64,
    /// Current height, never below [`MIN_INSTANCE_SIZE`].
    pub height: f64,
    /// Clockwise rotation in degrees about the centre. Unbounded.
    pub rotation: f64,
}

impl PlacedInstance {
    /// Centre of the instance in surface-local coordinates.
    #[must_use]
    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

/// Sparse update for a placed instance. Only present fields are applied.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PartialInstance {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rotation: Option<f64>,
}

impl PartialInstance {
    /// Whether no field is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.x.is_none() && self.y.is_none() && self.width.is_none() && self.height.is_none() && self.rotation.is_none()
    }
}

/// The editing session's scene: background, ordered instances, selection.
///
/// Instance order is paint order; later instances draw on top.
#[derive(Debug, Default)]
pub struct Scene {
    background: Option<ImageSource>,
    instances: Vec<PlacedInstance>,
    selected: Option<InstanceId>,
    next_id: u64,
}

impl Scene {
    /// Create an empty scene with no background.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // --- Instances ---

    /// Place a copy of `template` centred on `drop` (surface-local) and select it.
    pub fn add_instance(&mut self, template: &ObjectTemplate, drop: Point) -> InstanceId {
        self.next_id += 1;
        let id = InstanceId(self.next_id);
        let width = template.width;
        let height = template.height;
        self.instances.push(PlacedInstance {
            id,
            template_id: template.id.clone(),
            name: template.name.clone(),
            source: template.source.clone(),
            x: drop.x - width / 2.0,
            y: drop.y - height / 2.0,
            width,
            height,
            rotation: 0.0,
        });
        self.selected = Some(id);
        id
    }

    /// Apply a partial update. Sizes are floored at [`MIN_INSTANCE_SIZE`].
    ///
    /// Returns `false` (and changes nothing) if the id is unknown.
    pub fn update_instance(&mut self, id: &InstanceId, partial: &PartialInstance) -> bool {
        let Some(inst) = self.instances.iter_mut().find(|i| i.id == *id) else {
            return false;
        };
        if let Some(x) = partial.x {
            inst.x = x;
        }
        if let Some(y) = partial.y {
            inst.y = y;
        }
        if let Some(w) = partial.width {
            inst.width = w.max(MIN_INSTANCE_SIZE);
        }
        if let Some(h) = partial.height {
            inst.height = h.max(MIN_INSTANCE_SIZE);
        }
        if let Some(r) = partial.rotation {
            inst.rotation = r;
        }
        true
    }

    /// Remove an instance, clearing the selection if it pointed at it.
    ///
    /// Returns the removed instance, or `None` if the id is unknown.
    pub fn delete_instance(&mut self, id: &InstanceId) -> Option<PlacedInstance> {
        let idx = self.instances.iter().position(|i| i.id == *id)?;
        if self.selected == Some(*id) {
            self.selected = None;
        }
        Some(self.instances.remove(idx))
    }

    /// Return a reference to an instance by id.
    #[must_use]
    pub fn get(&self, id: &InstanceId) -> Option<&PlacedInstance> {
        self.instances.iter().find(|i| i.id == *id)
    }

    /// All instances in paint order (bottom first).
    #[must_use]
    pub fn instances(&self) -> &[PlacedInstance] {
        &self.instances
    }

    /// Number of placed instances.
    #[must_use]
    pub fn len(&self) -> usize {
        self.instances.len()
    }

    /// Returns `true` if nothing is placed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    // --- Selection ---

    /// Select an instance, or clear the selection with `None`.
    ///
    /// Ids that are not in the scene clear the selection rather than leaving a
    /// dangling reference. Returns whether the selection changed.
    pub fn select(&mut self, id: Option<InstanceId>) -> bool {
        let next = id.filter(|id| self.get(id).is_some());
        if next == self.selected {
            return false;
        }
        self.selected = next;
        true
    }

    /// The currently selected instance id, if any.
    #[must_use]
    pub fn selected(&self) -> Option<InstanceId> {
        self.selected
    }

    /// The currently selected instance, if any.
    #[must_use]
    pub fn selected_instance(&self) -> Option<&PlacedInstance> {
        self.selected.and_then(|id| self.get(&id))
    }

    // --- Background and lifecycle ---

    /// Set the captured background photo.
    pub fn set_background(&mut self, image: ImageSource) {
        self.background = Some(image);
    }

    /// Drop the background photo.
    pub fn clear_background(&mut self) {
        self.background = None;
    }

    /// The captured background photo, if any.
    #[must_use]
    pub fn background(&self) -> Option<&ImageSource> {
        self.background.as_ref()
    }

    /// Remove every instance and the selection. The background stays.
    pub fn reset(&mut self) {
        self.instances.clear();
        self.selected = None;
    }

    /// Return to the pre-capture state: no background, instances or selection.
    pub fn retake(&mut self) {
        self.reset();
        self.clear_background();
    }
}
