//! Object catalog: the predefined templates plus custom uploads.
//!
//! The palette drags whole templates, serialized with [`Catalog::drag_payload`],
//! so the surface never resolves ids against the catalog.

use canvas::doc::{ImageSource, ObjectTemplate};

/// MIME type the drag payload is stored under.
pub const DRAG_PAYLOAD_MIME: &str = "application/json";

/// The built-in templates, in palette order.
#[must_use]
pub fn predefined_templates() -> Vec<ObjectTemplate> {
    [
        ("bed_1", "Hospital Bed", 200.0, 100.0, "#60a5fa", "Bed"),
        ("trolley_1", "Medical Trolley", 80.0, 60.0, "#f472b6", "Trolley"),
        ("screen_1", "Hospital Screen", 150.0, 180.0, "#4ade80", "Screen"),
        ("blinds_1", "Window Blinds", 120.0, 150.0, "#facc15", "Blinds"),
    ]
    .into_iter()
    .map(|(id, name, width, height, color, label)| ObjectTemplate {
        id: id.to_string(),
        name: name.to_string(),
        source: ImageSource::placeholder(color, label),
        width,
        height,
    })
    .collect()
}

#[derive(Debug, Clone)]
pub struct Catalog {
    predefined: Vec<ObjectTemplate>,
    custom: Vec<ObjectTemplate>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new()
    }
}

impl Catalog {
    /// A catalog holding the predefined templates and no custom ones.
    #[must_use]
    pub fn new() -> Self {
        Self { predefined: predefined_templates(), custom: Vec::new() }
    }

    #[must_use]
    pub fn predefined(&self) -> &[ObjectTemplate] {
        &self.predefined
    }

    #[must_use]
    pub fn custom(&self) -> &[ObjectTemplate] {
        &self.custom
    }

    /// Every template, predefined first, custom in upload order.
    pub fn templates(&self) -> impl Iterator<Item = &ObjectTemplate> {
        self.predefined.iter().chain(self.custom.iter())
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&ObjectTemplate> {
        self.templates().find(|t| t.id == id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.predefined.len() + self.custom.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Append a custom template. Returns `false` (and keeps the catalog
    /// unchanged) for a duplicate id or a non-positive size.
    pub fn add_custom(&mut self, template: ObjectTemplate) -> bool {
        if !template.has_valid_size() || self.get(&template.id).is_some() {
            return false;
        }
        self.custom.push(template);
        true
    }

    /// Serialize a template for a drag-and-drop transfer.
    ///
    /// # Errors
    ///
    /// Returns the serializer error; a template made of strings and finite
    /// numbers does not produce one.
    pub fn drag_payload(template: &ObjectTemplate) -> Result<String, serde_json::Error> {
        serde_json::to_string(template)
    }
}

#[cfg(test)]
#[path = "catalog_test.rs"]
mod catalog_test;
