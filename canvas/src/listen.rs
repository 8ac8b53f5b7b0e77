//! Window-scoped pointer listeners with guaranteed release.
//!
//! A gesture keeps receiving pointer events after the pointer leaves the
//! surface, so its move/up listeners live on the window rather than the
//! surface element. [`ListenerSlot`] owns at most one set of them and detaches
//! it on release, on replacement, and on drop, so neither a finished gesture
//! nor a torn-down component leaves listeners behind.

#[cfg(test)]
#[path = "listen_test.rs"]
mod listen_test;

use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{PointerEvent, Window};

use crate::engine::Action;
use crate::surface::Point;

/// A set of attached listeners that can be detached exactly once.
pub trait PointerListeners {
    /// Remove the listeners from whatever they were attached to.
    fn detach(&mut self);
}

/// Holds the listeners of the active gesture, if any.
pub struct ListenerSlot<L: PointerListeners> {
    held: Option<L>,
}

impl<L: PointerListeners> ListenerSlot<L> {
    #[must_use]
    pub fn new() -> Self {
        Self { held: None }
    }

    /// Take ownership of freshly attached listeners, detaching any previous set.
    pub fn hold(&mut self, listeners: L) {
        self.release();
        self.held = Some(listeners);
    }

    /// Detach and drop the held listeners. No-op when empty.
    pub fn release(&mut self) {
        if let Some(mut listeners) = self.held.take() {
            listeners.detach();
        }
    }

    /// Whether listeners are currently attached.
    #[must_use]
    pub fn is_held(&self) -> bool {
        self.held.is_some()
    }

    /// React to an engine action: attach on `AttachPointerListeners`, release on
    /// `DetachPointerListeners`, ignore everything else.
    ///
    /// # Errors
    ///
    /// Propagates the error from `attach`; the slot is left empty in that case.
    pub fn apply<E>(&mut self, action: &Action, attach: impl FnOnce() -> Result<L, E>) -> Result<(), E> {
        match action {
            Action::AttachPointerListeners => {
                self.release();
                self.hold(attach()?);
            }
            Action::DetachPointerListeners => self.release(),
            _ => {}
        }
        Ok(())
    }
}

impl<L: PointerListeners> Default for ListenerSlot<L> {
    fn default() -> Self {
        Self::new()
    }
}

impl<L: PointerListeners> Drop for ListenerSlot<L> {
    fn drop(&mut self) {
        self.release();
    }
}

type PointerCallback = Closure<dyn FnMut(PointerEvent)>;

/// `pointermove` / `pointerup` listeners registered on the browser window.
pub struct WindowListeners {
    window: Window,
    on_move: PointerCallback,
    on_up: PointerCallback,
}

impl WindowListeners {
    /// Register both callbacks on the window.
    ///
    /// # Errors
    ///
    /// Returns `Err` if there is no window or registration fails. A partial
    /// registration is rolled back before returning.
    pub fn attach(
        on_move: impl FnMut(PointerEvent) + 'static,
        on_up: impl FnMut(PointerEvent) + 'static,
    ) -> Result<Self, JsValue> {
        let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
        let on_move: PointerCallback = Closure::wrap(Box::new(on_move) as Box<dyn FnMut(PointerEvent)>);
        let on_up: PointerCallback = Closure::wrap(Box::new(on_up) as Box<dyn FnMut(PointerEvent)>);

        window.add_event_listener_with_callback("pointermove", on_move.as_ref().unchecked_ref())?;
        if let Err(err) = window.add_event_listener_with_callback("pointerup", on_up.as_ref().unchecked_ref()) {
            if let Err(undo) = window.remove_event_listener_with_callback("pointermove", on_move.as_ref().unchecked_ref())
            {
                web_sys::console::warn_1(&undo);
            }
            return Err(err);
        }
        Ok(Self { window, on_move, on_up })
    }
}

impl PointerListeners for WindowListeners {
    fn detach(&mut self) {
        for (event, callback) in [("pointermove", &self.on_move), ("pointerup", &self.on_up)] {
            if let Err(err) = self
                .window
                .remove_event_listener_with_callback(event, callback.as_ref().unchecked_ref())
            {
                web_sys::console::warn_1(&err);
            }
        }
    }
}

/// Screen-space position of a pointer event (viewport-relative CSS pixels).
#[must_use]
pub fn pointer_point(ev: &PointerEvent) -> Point {
    Point::new(f64::from(ev.client_x()), f64::from(ev.client_y()))
}
