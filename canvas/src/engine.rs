use std::cell::RefCell;
use std::rc::{Rc, Weak};

use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, PointerEvent};

use crate::doc::{ImageSource, InstanceId, ObjectTemplate, PartialInstance, PlacedInstance, Scene};
use crate::gesture;
use crate::hit::{self, HitPart};
use crate::images::ImageCache;
use crate::input::{Button, InputState};
use crate::listen::{ListenerSlot, WindowListeners, pointer_point};
use crate::render;
use crate::surface::{Point, Surface, SurfaceRect, surface_size_for};

#[cfg(test)]
#[path = "engine_test.rs"]
mod engine_test;

/// Actions returned from input handlers for the host to process.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    InstanceCreated(PlacedInstance),
    InstanceUpdated { id: InstanceId, fields: PartialInstance },
    InstanceDeleted { id: InstanceId },
    SelectionChanged(Option<InstanceId>),
    SetCursor(&'static str),
    /// A gesture started: subscribe to window-level pointer move/up.
    AttachPointerListeners,
    /// The gesture ended: drop the window-level subscriptions.
    DetachPointerListeners,
    RenderNeeded,
}

/// Why a drop could not be turned into an instance.
#[derive(Debug, thiserror::Error)]
pub enum DropError {
    #[error("malformed drop payload: {0}")]
    Payload(#[from] serde_json::Error),
    #[error("template {id} has an invalid size {width}x{height}")]
    InvalidTemplate { id: String, width: f64, height: f64 },
    #[error("surface geometry is not available")]
    SurfaceUnavailable,
}

impl DropError {
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Payload(_) => "E_DROP_PAYLOAD",
            Self::InvalidTemplate { .. } => "E_DROP_TEMPLATE",
            Self::SurfaceUnavailable => "E_SURFACE_UNAVAILABLE",
        }
    }
}

/// Core engine state: the scene, the surface placement, and the active gesture.
///
/// Nothing here touches the DOM, so every interaction can be driven from tests.
/// The host forwards raw events in screen coordinates and applies the returned
/// [`Action`]s (re-render, cursor, window listener attach/detach).
#[derive(Debug, Default)]
pub struct EngineCore {
    pub scene: Scene,
    pub surface: Surface,
    pub input: InputState,
}

impl EngineCore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // --- Surface ---

    /// Record the surface's screen-space bounding box, or `None` when unmounted.
    pub fn set_surface_rect(&mut self, rect: Option<SurfaceRect>) {
        self.surface.set_rect(rect);
    }

    // --- Scene operations ---

    /// Place `template` centred on a surface-local point and select it.
    pub fn add_instance(&mut self, template: &ObjectTemplate, local: Point) -> Vec<Action> {
        let id = self.scene.add_instance(template, local);
        let mut actions = Vec::new();
        if let Some(inst) = self.scene.get(&id) {
            actions.push(Action::InstanceCreated(inst.clone()));
        }
        actions.push(Action::SelectionChanged(Some(id)));
        actions.push(Action::RenderNeeded);
        actions
    }

    /// Apply a partial update. Unknown ids produce no actions.
    pub fn update_instance(&mut self, id: &InstanceId, fields: PartialInstance) -> Vec<Action> {
        if fields.is_empty() || !self.scene.update_instance(id, &fields) {
            return Vec::new();
        }
        vec![Action::InstanceUpdated { id: *id, fields }, Action::RenderNeeded]
    }

    /// Delete an instance. Ends a gesture that was targeting it.
    pub fn delete_instance(&mut self, id: &InstanceId) -> Vec<Action> {
        let was_selected = self.scene.selected() == Some(*id);
        if self.scene.delete_instance(id).is_none() {
            return Vec::new();
        }
        let mut actions = Vec::new();
        if self.input.target() == Some(*id) {
            actions.extend(self.end_gesture());
        }
        actions.push(Action::InstanceDeleted { id: *id });
        if was_selected {
            actions.push(Action::SelectionChanged(None));
        }
        actions.push(Action::RenderNeeded);
        actions
    }

    /// Select an instance or clear the selection. Idempotent.
    pub fn select(&mut self, id: Option<InstanceId>) -> Vec<Action> {
        if !self.scene.select(id) {
            return Vec::new();
        }
        vec![Action::SelectionChanged(self.scene.selected()), Action::RenderNeeded]
    }

    /// Clear instances and selection, keeping the background.
    pub fn reset(&mut self) -> Vec<Action> {
        let mut actions = self.end_gesture();
        self.scene.reset();
        actions.push(Action::SelectionChanged(None));
        actions.push(Action::RenderNeeded);
        actions
    }

    /// Set the captured background photo.
    pub fn set_background(&mut self, image: ImageSource) -> Vec<Action> {
        self.scene.set_background(image);
        vec![Action::RenderNeeded]
    }

    /// Clear background, instances and selection.
    pub fn retake(&mut self) -> Vec<Action> {
        let mut actions = self.end_gesture();
        self.scene.retake();
        actions.push(Action::SelectionChanged(None));
        actions.push(Action::RenderNeeded);
        actions
    }

    /// Release everything tied to the component's lifetime.
    pub fn teardown(&mut self) -> Vec<Action> {
        self.end_gesture()
    }

    // --- Drop ---

    /// Handle a drop of a serialized [`ObjectTemplate`] at a screen-space point.
    ///
    /// # Errors
    ///
    /// Returns `Payload` if the payload is not a template, `InvalidTemplate` if
    /// its size is not positive, and `SurfaceUnavailable` if the surface has not
    /// been measured.
    pub fn on_drop(&mut self, screen_pt: Point, payload: &str) -> Result<Vec<Action>, DropError> {
        let template: ObjectTemplate = serde_json::from_str(payload)?;
        if !template.has_valid_size() {
            return Err(DropError::InvalidTemplate {
                id: template.id,
                width: template.width,
                height: template.height,
            });
        }
        let local = self
            .surface
            .screen_to_local(screen_pt)
            .ok_or(DropError::SurfaceUnavailable)?;
        Ok(self.add_instance(&template, local))
    }

    // --- Pointer input ---

    /// Pointer pressed on the surface.
    ///
    /// Starts a move, resize or rotate gesture depending on what is under the
    /// pointer, and selects the instance as a side effect. Pressing the delete
    /// control deletes; pressing empty surface clears the selection.
    pub fn on_pointer_down(&mut self, screen_pt: Point, button: Button) -> Vec<Action> {
        if button != Button::Primary || self.input.is_active() {
            return Vec::new();
        }
        let Some(local) = self.surface.screen_to_local(screen_pt) else {
            return Vec::new();
        };
        let Some(hit) = hit::hit_test(local, &self.scene) else {
            return self.select(None);
        };
        let id = hit.instance_id;
        if hit.part == HitPart::DeleteControl {
            return self.delete_instance(&id);
        }
        let Some(inst) = self.scene.get(&id) else {
            return Vec::new();
        };

        let next = match hit.part {
            HitPart::ResizeHandle => InputState::Resizing {
                id,
                start_screen: screen_pt,
                start_width: inst.width,
                start_height: inst.height,
            },
            HitPart::RotateHandle => {
                let Some(center_screen) = self.surface.local_to_screen(inst.center()) else {
                    return Vec::new();
                };
                InputState::Rotating {
                    id,
                    center_screen,
                    start_angle: screen_pt.angle_from_deg(center_screen),
                    start_rotation: inst.rotation,
                }
            }
            HitPart::Body | HitPart::DeleteControl => InputState::Moving { id, last_screen: screen_pt },
        };

        let mut actions = self.select(Some(id));
        self.input = next;
        actions.push(Action::AttachPointerListeners);
        actions.push(Action::SetCursor(hit.part.cursor()));
        if !actions.contains(&Action::RenderNeeded) {
            actions.push(Action::RenderNeeded);
        }
        actions
    }

    /// Pointer moved anywhere in the window.
    ///
    /// Suppressed while idle or while the surface geometry is unavailable.
    pub fn on_pointer_move(&mut self, screen_pt: Point) -> Vec<Action> {
        if !self.input.is_active() || !self.surface.is_mounted() {
            return Vec::new();
        }

        match self.input.clone() {
            InputState::Idle => Vec::new(),
            InputState::Moving { id, last_screen } => {
                let Some(inst) = self.scene.get(&id) else {
                    return Vec::new();
                };
                let fields = gesture::move_step(inst, last_screen, screen_pt);
                self.input = InputState::Moving { id, last_screen: screen_pt };
                self.update_instance(&id, fields)
            }
            InputState::Resizing { id, start_screen, start_width, start_height } => {
                let fields = gesture::resize_step(start_screen, start_width, start_height, screen_pt);
                self.update_instance(&id, fields)
            }
            InputState::Rotating { id, center_screen, start_angle, start_rotation } => {
                match gesture::rotate_step(center_screen, start_angle, start_rotation, screen_pt) {
                    Some(fields) => self.update_instance(&id, fields),
                    None => Vec::new(),
                }
            }
        }
    }

    /// Pointer released anywhere in the window. Ends the active gesture.
    pub fn on_pointer_up(&mut self, _screen_pt: Point, button: Button) -> Vec<Action> {
        if button != Button::Primary {
            return Vec::new();
        }
        self.end_gesture()
    }

    /// Pointer pressed outside the surface, on the surrounding workspace.
    pub fn on_background_press(&mut self) -> Vec<Action> {
        if self.input.is_active() {
            return Vec::new();
        }
        self.select(None)
    }

    /// Cursor to show when hovering `screen_pt` with no gesture active.
    #[must_use]
    pub fn cursor_at(&self, screen_pt: Point) -> &'static str {
        self.surface
            .screen_to_local(screen_pt)
            .and_then(|local| hit::hit_test(local, &self.scene))
            .map_or("default", |hit| hit.part.cursor())
    }

    fn end_gesture(&mut self) -> Vec<Action> {
        if !self.input.is_active() {
            return Vec::new();
        }
        self.input = InputState::Idle;
        vec![Action::DetachPointerListeners, Action::SetCursor("default")]
    }

    // --- Queries ---

    /// The currently selected instance, if any.
    #[must_use]
    pub fn selection(&self) -> Option<InstanceId> {
        self.scene.selected()
    }

    /// Look up an instance by id.
    #[must_use]
    pub fn instance(&self, id: &InstanceId) -> Option<&PlacedInstance> {
        self.scene.get(id)
    }
}

/// The DOM side effects of a batch of actions, other than listener changes.
///
/// Several `RenderNeeded`s collapse into one repaint; the last cursor wins.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HostEffects {
    pub cursor: Option<&'static str>,
    pub render: bool,
}

impl HostEffects {
    #[must_use]
    pub fn from_actions(actions: &[Action]) -> Self {
        actions.iter().fold(Self::default(), |mut fx, action| {
            match action {
                Action::SetCursor(cursor) => fx.cursor = Some(*cursor),
                Action::RenderNeeded => fx.render = true,
                _ => {}
            }
            fx
        })
    }
}

/// Image URLs the scene still draws (background and instance fills).
#[must_use]
pub fn image_urls_in_use(scene: &Scene) -> Vec<String> {
    scene
        .background()
        .into_iter()
        .chain(scene.instances().iter().map(|inst| &inst.source))
        .filter_map(|source| match source {
            ImageSource::Url { url } => Some(url.clone()),
            ImageSource::Placeholder { .. } => None,
        })
        .collect()
}

// =============================================================
// Browser engine
// =============================================================

const BUSY: &str = "engine is busy";

/// Browser state shared between [`Engine`] and its window listeners.
struct BrowserState {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
    core: EngineCore,
    images: ImageCache,
    listeners: ListenerSlot<WindowListeners>,
    width: f64,
    height: f64,
    dpr: f64,
}

type SharedState = Rc<RefCell<BrowserState>>;

impl BrowserState {
    /// Apply host actions: window listeners per action, then cursor and repaint.
    fn apply(&mut self, actions: &[Action], weak: &Weak<RefCell<BrowserState>>) -> Result<(), JsValue> {
        for action in actions {
            self.listeners.apply(action, || attach_window_listeners(weak))?;
        }
        let fx = HostEffects::from_actions(actions);
        if let Some(cursor) = fx.cursor {
            self.canvas.style().set_property("cursor", cursor)?;
        }
        if fx.render {
            self.render()?;
        }
        Ok(())
    }

    fn render(&mut self) -> Result<(), JsValue> {
        render::draw(&self.ctx, &self.core.scene, &mut self.images, self.width, self.height, self.dpr)
    }

    fn set_size(&mut self, width: f64, height: f64, dpr: f64) -> Result<(), JsValue> {
        self.width = width;
        self.height = height;
        self.dpr = dpr;
        let style = self.canvas.style();
        style.set_property("width", &format!("{width}px"))?;
        style.set_property("height", &format!("{height}px"))?;
        self.canvas.set_width(backing_px(width, dpr));
        self.canvas.set_height(backing_px(height, dpr));
        Ok(())
    }

    fn measure(&mut self) {
        let r = self.canvas.get_bounding_client_rect();
        self.core
            .set_surface_rect(Some(SurfaceRect::new(r.left(), r.top(), r.width(), r.height())));
    }

    fn prune_images(&mut self) {
        let in_use = image_urls_in_use(&self.core.scene);
        self.images.retain(|url| in_use.iter().any(|u| u == url));
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn backing_px(css: f64, dpr: f64) -> u32 {
    (css * dpr).round().max(0.0) as u32
}

/// Run `f` against the core and apply its actions.
fn dispatch(state: &SharedState, f: impl FnOnce(&mut EngineCore) -> Vec<Action>) -> Result<Vec<Action>, JsValue> {
    let weak = Rc::downgrade(state);
    let mut s = state.try_borrow_mut().map_err(|_| JsValue::from_str(BUSY))?;
    let actions = f(&mut s.core);
    s.apply(&actions, &weak)?;
    Ok(actions)
}

/// Dispatch from a window callback, where errors can only be reported.
fn forward(weak: &Weak<RefCell<BrowserState>>, f: impl FnOnce(&mut EngineCore) -> Vec<Action>) {
    let Some(state) = weak.upgrade() else {
        return;
    };
    if let Err(err) = dispatch(&state, f) {
        web_sys::console::warn_1(&err);
    }
}

fn attach_window_listeners(weak: &Weak<RefCell<BrowserState>>) -> Result<WindowListeners, JsValue> {
    let on_move = weak.clone();
    let on_up = weak.clone();
    WindowListeners::attach(
        move |ev: PointerEvent| {
            let pt = pointer_point(&ev);
            forward(&on_move, |core| core.on_pointer_move(pt));
        },
        move |ev: PointerEvent| {
            let pt = pointer_point(&ev);
            let button = Button::from_dom(ev.button());
            forward(&on_up, |core| core.on_pointer_up(pt, button));
        },
    )
}

/// The full surface engine. Wraps `EngineCore` and owns the browser canvas.
///
/// Presses and drops come from the canvas element; once a gesture starts,
/// move and release arrive through window listeners held in a
/// [`ListenerSlot`], so they are detached when the gesture ends, on
/// [`Engine::teardown`], or when the engine is dropped.
pub struct Engine {
    state: SharedState,
    _on_image_load: Closure<dyn FnMut()>,
}

impl Engine {
    /// Create an engine drawing into `canvas`.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the canvas has no 2D context.
    pub fn new(canvas: HtmlCanvasElement) -> Result<Self, JsValue> {
        let ctx = canvas
            .get_context("2d")?
            .ok_or_else(|| JsValue::from_str("2d context unavailable"))?
            .dyn_into::<CanvasRenderingContext2d>()
            .map_err(JsValue::from)?;
        let state = Rc::new(RefCell::new(BrowserState {
            canvas,
            ctx,
            core: EngineCore::new(),
            images: ImageCache::new(),
            listeners: ListenerSlot::new(),
            width: 0.0,
            height: 0.0,
            dpr: 1.0,
        }));

        // Images decode asynchronously; repaint when one arrives.
        let weak = Rc::downgrade(&state);
        let on_image_load = Closure::wrap(Box::new(move || {
            let Some(state) = weak.upgrade() else {
                return;
            };
            if let Ok(mut s) = state.try_borrow_mut() {
                if let Err(err) = s.render() {
                    web_sys::console::warn_1(&err);
                }
            }
        }) as Box<dyn FnMut()>);
        let callback: &js_sys::Function = on_image_load.as_ref().unchecked_ref();
        state
            .try_borrow_mut()
            .map_err(|_| JsValue::from_str(BUSY))?
            .images = ImageCache::with_on_load(callback.clone());

        Ok(Self { state, _on_image_load: on_image_load })
    }

    fn with_state<T>(
        &self,
        f: impl FnOnce(&mut BrowserState, &Weak<RefCell<BrowserState>>) -> Result<T, JsValue>,
    ) -> Result<T, JsValue> {
        let weak = Rc::downgrade(&self.state);
        let mut s = self.state.try_borrow_mut().map_err(|_| JsValue::from_str(BUSY))?;
        f(&mut s, &weak)
    }

    // --- Layout ---

    /// Size the surface for its container, then measure and repaint.
    ///
    /// # Errors
    ///
    /// Returns `Err` if a style or `Canvas2D` call fails.
    pub fn resize(&self, container_width: f64, dpr: f64) -> Result<(), JsValue> {
        self.with_state(|s, _| {
            let (width, height) = surface_size_for(container_width);
            s.set_size(width, height, dpr)?;
            s.measure();
            s.render()
        })
    }

    /// Re-read the surface's screen position after scrolling or layout changes.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the engine is mid-dispatch.
    pub fn measure(&self) -> Result<(), JsValue> {
        self.with_state(|s, _| {
            s.measure();
            Ok(())
        })
    }

    // --- Input events ---

    /// Pointer pressed on the canvas element.
    ///
    /// # Errors
    ///
    /// Returns `Err` if attaching window listeners or repainting fails.
    pub fn on_pointer_down(&self, ev: &PointerEvent) -> Result<Vec<Action>, JsValue> {
        let pt = pointer_point(ev);
        let button = Button::from_dom(ev.button());
        dispatch(&self.state, |core| core.on_pointer_down(pt, button))
    }

    /// Pointer moved over the canvas with no gesture active: update the cursor.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the cursor style cannot be set.
    pub fn on_hover(&self, ev: &PointerEvent) -> Result<(), JsValue> {
        let pt = pointer_point(ev);
        self.with_state(|s, _| {
            if s.core.input.is_active() {
                return Ok(());
            }
            let cursor = s.core.cursor_at(pt);
            s.canvas.style().set_property("cursor", cursor)
        })
    }

    /// A palette drop at a viewport-relative point.
    ///
    /// # Errors
    ///
    /// Returns the [`DropError`] (code and message) or a repaint failure.
    pub fn on_drop(&self, screen_pt: Point, payload: &str) -> Result<Vec<Action>, JsValue> {
        self.with_state(|s, weak| {
            let actions = s
                .core
                .on_drop(screen_pt, payload)
                .map_err(|e| JsValue::from_str(&format!("{}: {e}", e.error_code())))?;
            s.apply(&actions, weak)?;
            Ok(actions)
        })
    }

    /// Pointer pressed outside the surface.
    ///
    /// # Errors
    ///
    /// Returns `Err` if repainting fails.
    pub fn on_background_press(&self) -> Result<Vec<Action>, JsValue> {
        dispatch(&self.state, EngineCore::on_background_press)
    }

    // --- Session operations ---

    /// # Errors
    ///
    /// Returns `Err` if repainting fails.
    pub fn set_background(&self, image: ImageSource) -> Result<Vec<Action>, JsValue> {
        dispatch(&self.state, |core| core.set_background(image))
    }

    /// # Errors
    ///
    /// Returns `Err` if repainting fails.
    pub fn select(&self, id: Option<InstanceId>) -> Result<Vec<Action>, JsValue> {
        dispatch(&self.state, |core| core.select(id))
    }

    /// Clear instances and selection; images no longer drawn are evicted.
    ///
    /// # Errors
    ///
    /// Returns `Err` if repainting fails.
    pub fn reset(&self) -> Result<Vec<Action>, JsValue> {
        self.with_state(|s, weak| {
            let actions = s.core.reset();
            s.prune_images();
            s.apply(&actions, weak)?;
            Ok(actions)
        })
    }

    /// Clear background, instances and selection.
    ///
    /// # Errors
    ///
    /// Returns `Err` if repainting fails.
    pub fn retake(&self) -> Result<Vec<Action>, JsValue> {
        self.with_state(|s, weak| {
            let actions = s.core.retake();
            s.prune_images();
            s.apply(&actions, weak)?;
            Ok(actions)
        })
    }

    /// Unmount: end any gesture, drop window listeners, forget the geometry.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the engine is mid-dispatch.
    pub fn teardown(&self) -> Result<Vec<Action>, JsValue> {
        self.with_state(|s, weak| {
            let actions = s.core.teardown();
            s.apply(&actions, weak)?;
            s.listeners.release();
            s.core.set_surface_rect(None);
            Ok(actions)
        })
    }

    // --- Render ---

    /// Draw the current state to the canvas.
    ///
    /// # Errors
    ///
    /// Returns `Err` if any `Canvas2D` call fails.
    pub fn render(&self) -> Result<(), JsValue> {
        self.with_state(|s, _| s.render())
    }

    // --- Queries ---

    /// Whether window listeners are attached (a gesture is in progress).
    #[must_use]
    pub fn listening(&self) -> bool {
        self.state.try_borrow().is_ok_and(|s| s.listeners.is_held())
    }

    #[must_use]
    pub fn selection(&self) -> Option<InstanceId> {
        self.state.try_borrow().map_or(None, |s| s.core.selection())
    }

    /// A copy of an instance's current state.
    #[must_use]
    pub fn instance(&self, id: &InstanceId) -> Option<PlacedInstance> {
        self.state
            .try_borrow()
            .map_or(None, |s| s.core.instance(id).cloned())
    }
}
