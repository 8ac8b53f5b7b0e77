//! Room layout prototyper: session layer over the [`canvas`] engine.
//!
//! A user photographs a room, drops catalog objects onto the photo, arranges
//! them by dragging, resizing and rotating, then exports the result as a PNG.
//! The geometry and rendering live in the `canvas` crate; this crate wires the
//! external collaborators (camera, file upload, rasterizer) around it.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`session`] | Camera/design views, reset, retake, export sequencing |
//! | [`catalog`] | Predefined and custom templates, drag payloads |
//! | [`assets`] | Custom image import and size clamping |
//! | [`capture`] | Camera provider contract and exclusive stream slot |
//! | [`export`] | Rasterizer contract and PNG encoding |
//! | [`config`] | JSON configuration with defaults and validation |

pub mod assets;
pub mod capture;
pub mod catalog;
pub mod config;
pub mod export;
pub mod session;

pub use canvas;
