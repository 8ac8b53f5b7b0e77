//! Compositing surface for the room layout prototyper.
//!
//! This crate is compiled to WebAssembly and runs in the browser. It owns the
//! editable layout over a captured room photo: placing catalog objects by
//! drag-and-drop, translating pointer input into move/resize/rotate gestures,
//! hit-testing the selection affordances, and rendering the scene.
//! [`engine::Engine`] owns the canvas element: the host forwards presses and
//! drops to it, and it applies the [`engine::Action`]s that
//! [`engine::EngineCore`] returns (window listeners, cursor, repaint).
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`engine`] | Testable [`engine::EngineCore`] and the DOM-owning [`engine::Engine`] |
//! | [`doc`] | Scene store: templates, placed instances, selection |
//! | [`surface`] | Surface rectangle, coordinate conversions, layout math |
//! | [`input`] | Pointer buttons and the gesture state machine |
//! | [`gesture`] | Per-step move/resize/rotate geometry |
//! | [`hit`] | Hit-testing instances and their affordances |
//! | [`listen`] | Window-level pointer listener ownership |
//! | [`images`] | Browser image cache |
//! | [`render`] | Canvas 2D drawing of the surface |
//! | [`consts`] | Shared numeric constants (size floor, handle radii) |

pub mod consts;
pub mod doc;
pub mod engine;
pub mod gesture;
pub mod hit;
pub mod images;
pub mod input;
pub mod listen;
pub mod render;
pub mod surface;
