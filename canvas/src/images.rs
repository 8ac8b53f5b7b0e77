//! Browser image cache for backgrounds and instance fills.
//!
//! Images are created on first request and drawn once the browser reports
//! them decoded. Until then the renderer simply skips them; the host passes an
//! `onload` callback that schedules a re-render.

use std::collections::HashMap;

use wasm_bindgen::JsValue;
use web_sys::HtmlImageElement;

/// `HtmlImageElement`s keyed by source URL.
#[derive(Default)]
pub struct ImageCache {
    images: HashMap<String, HtmlImageElement>,
    on_load: Option<js_sys::Function>,
}

impl ImageCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A cache that invokes `on_load` whenever an image finishes loading.
    #[must_use]
    pub fn with_on_load(on_load: js_sys::Function) -> Self {
        Self { images: HashMap::new(), on_load: Some(on_load) }
    }

    /// The decoded image for `url`, starting the load on first request.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the image element cannot be created.
    pub fn get(&mut self, url: &str) -> Result<Option<&HtmlImageElement>, JsValue> {
        if !self.images.contains_key(url) {
            let img = HtmlImageElement::new()?;
            img.set_cross_origin(Some("anonymous"));
            if let Some(cb) = &self.on_load {
                img.set_onload(Some(cb));
            }
            img.set_src(url);
            self.images.insert(url.to_owned(), img);
        }
        Ok(self
            .images
            .get(url)
            .filter(|img| img.complete() && img.natural_width() > 0))
    }

    /// Drop every image whose URL fails `keep`.
    pub fn retain(&mut self, keep: impl Fn(&str) -> bool) {
        self.images.retain(|url, _| keep(url));
    }

    /// Number of cached images.
    #[must_use]
    pub fn len(&self) -> usize {
        self.images.len()
    }

    /// Returns `true` if nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}
