//! Rendering: draws the compositing surface to a 2D context.
//!
//! This module is the only place that touches [`web_sys::CanvasRenderingContext2d`].
//! It receives a read-only view of the scene and produces pixels; the only
//! state it mutates is the image cache.
//!
//! Layers, bottom to top: background photo ("cover" fit), instances in scene
//! order, then the selected instance's affordances. The affordances are the
//! only transient UI, so a render with no selection is export-clean.
//!
//! All fallible `Canvas2D` calls propagate errors via `Result<(), JsValue>`.

#[cfg(all(test, target_arch = "wasm32"))]
#[path = "render_test.rs"]
mod render_test;

use std::f64::consts::PI;

use wasm_bindgen::JsValue;
use web_sys::CanvasRenderingContext2d;

use crate::consts::{
    DELETE_CONTROL_RADIUS_PX, RESIZE_HANDLE_RADIUS_PX, ROTATE_HANDLE_RADIUS_PX, SELECTION_OUTLINE_GAP_PX,
};
use crate::doc::{ImageSource, PlacedInstance, Scene};
use crate::hit;
use crate::images::ImageCache;
use crate::surface::{self, Point};

/// Selection dash segment length in pixels.
const SELECTION_DASH_PX: f64 = 6.0;

/// Corner radius of placeholder tiles.
const PLACEHOLDER_CORNER_PX: f64 = 8.0;

const SELECTION_COLOR: &str = "#3B82F6";
const DELETE_COLOR: &str = "#DC2626";
const ROTATE_COLOR: &str = "#22C55E";

/// Draw the full surface: background, instances, and selection UI.
///
/// `width` and `height` are the surface size in CSS pixels. `dpr` is the device
/// pixel ratio of the backing store.
///
/// # Errors
///
/// Returns `Err` if any `Canvas2D` call fails.
pub fn draw(
    ctx: &CanvasRenderingContext2d,
    scene: &Scene,
    images: &mut ImageCache,
    width: f64,
    height: f64,
    dpr: f64,
) -> Result<(), JsValue> {
    // Layer 1: clear and set up the device transform.
    ctx.set_transform(dpr, 0.0, 0.0, dpr, 0.0, 0.0)?;
    ctx.clear_rect(0.0, 0.0, width, height);

    // Layer 2: background photo.
    if let Some(ImageSource::Url { url }) = scene.background() {
        draw_background(ctx, images, url, width, height)?;
    }

    // Layer 3: instances in paint order.
    for inst in scene.instances() {
        draw_instance(ctx, images, inst)?;
    }

    // Layer 4: affordances of the selected instance.
    if let Some(sel) = scene.selected_instance() {
        draw_selection(ctx, sel)?;
    }

    Ok(())
}

// =============================================================
// Background
// =============================================================

fn draw_background(
    ctx: &CanvasRenderingContext2d,
    images: &mut ImageCache,
    url: &str,
    width: f64,
    height: f64,
) -> Result<(), JsValue> {
    let Some(img) = images.get(url)? else {
        return Ok(());
    };
    let img_w = f64::from(img.natural_width());
    let img_h = f64::from(img.natural_height());
    let Some((sx, sy, sw, sh)) = surface::cover_source_rect(img_w, img_h, width, height) else {
        return Ok(());
    };
    ctx.draw_image_with_html_image_element_and_sw_and_sh_and_dx_and_dy_and_dw_and_dh(
        img, sx, sy, sw, sh, 0.0, 0.0, width, height,
    )
}

// =============================================================
// Instances
// =============================================================

fn draw_instance(ctx: &CanvasRenderingContext2d, images: &mut ImageCache, inst: &PlacedInstance) -> Result<(), JsValue> {
    with_saved_state(ctx, || {
        translate_and_rotate(ctx, inst)?;
        let x = -inst.width / 2.0;
        let y = -inst.height / 2.0;

        match &inst.source {
            ImageSource::Url { url } => {
                if let Some(img) = images.get(url)? {
                    // Stretched to the instance box, like `background-size: 100% 100%`.
                    ctx.draw_image_with_html_image_element_and_dw_and_dh(img, x, y, inst.width, inst.height)?;
                }
                Ok(())
            }
            ImageSource::Placeholder { color, label } => draw_placeholder(ctx, x, y, inst.width, inst.height, color, label),
        }
    })
}

fn draw_placeholder(
    ctx: &CanvasRenderingContext2d,
    x: f64,
    y: f64,
    w: f64,
    h: f64,
    color: &str,
    label: &str,
) -> Result<(), JsValue> {
    let r = PLACEHOLDER_CORNER_PX.min(w / 2.0).min(h / 2.0);

    rounded_rect_path(ctx, x, y, w, h, r)?;
    ctx.set_fill_style_str(color);
    ctx.set_global_alpha(0.3);
    ctx.fill();

    rounded_rect_path(ctx, x + 0.5, y + 0.5, w - 1.0, h - 1.0, (r - 0.5).max(0.0))?;
    ctx.set_stroke_style_str(color);
    ctx.set_global_alpha(0.8);
    ctx.set_line_width(1.0);
    ctx.stroke();

    ctx.set_global_alpha(1.0);
    ctx.set_fill_style_str(color);
    ctx.set_font("14px Arial, sans-serif");
    ctx.set_text_align("center");
    ctx.set_text_baseline("middle");
    ctx.fill_text(label, x + w / 2.0, y + h / 2.0)
}

fn rounded_rect_path(ctx: &CanvasRenderingContext2d, x: f64, y: f64, w: f64, h: f64, r: f64) -> Result<(), JsValue> {
    ctx.begin_path();
    ctx.move_to(x + r, y);
    ctx.arc_to(x + w, y, x + w, y + h, r)?;
    ctx.arc_to(x + w, y + h, x, y + h, r)?;
    ctx.arc_to(x, y + h, x, y, r)?;
    ctx.arc_to(x, y, x + w, y, r)?;
    ctx.close_path();
    Ok(())
}

// =============================================================
// Selection affordances
// =============================================================

fn draw_selection(ctx: &CanvasRenderingContext2d, inst: &PlacedInstance) -> Result<(), JsValue> {
    // Dashed outline, rotated with the instance. The dash pattern is undone by `restore`.
    with_saved_state(ctx, || {
        translate_and_rotate(ctx, inst)?;
        let gap = SELECTION_OUTLINE_GAP_PX;
        let dash = js_sys::Array::new();
        dash.push(&SELECTION_DASH_PX.into());
        dash.push(&SELECTION_DASH_PX.into());
        ctx.set_line_dash(&dash)?;
        ctx.set_stroke_style_str(SELECTION_COLOR);
        ctx.set_line_width(2.0);
        ctx.stroke_rect(
            -inst.width / 2.0 - gap,
            -inst.height / 2.0 - gap,
            inst.width + gap * 2.0,
            inst.height + gap * 2.0,
        );
        Ok(())
    })?;

    // Handles are positioned by the same geometry the hit-tester uses.
    let a = hit::affordances(inst);
    draw_handle(ctx, a.resize, RESIZE_HANDLE_RADIUS_PX, SELECTION_COLOR)?;
    draw_handle(ctx, a.rotate, ROTATE_HANDLE_RADIUS_PX, ROTATE_COLOR)?;
    draw_rotate_glyph(ctx, a.rotate)?;
    draw_handle(ctx, a.delete, DELETE_CONTROL_RADIUS_PX, DELETE_COLOR)?;
    draw_delete_glyph(ctx, a.delete);
    Ok(())
}

fn draw_handle(ctx: &CanvasRenderingContext2d, center: Point, radius: f64, fill: &str) -> Result<(), JsValue> {
    ctx.begin_path();
    ctx.arc(center.x, center.y, radius, 0.0, 2.0 * PI)?;
    ctx.set_fill_style_str(fill);
    ctx.fill();
    ctx.set_stroke_style_str("#fff");
    ctx.set_line_width(2.0);
    ctx.stroke();
    Ok(())
}

fn draw_rotate_glyph(ctx: &CanvasRenderingContext2d, center: Point) -> Result<(), JsValue> {
    ctx.begin_path();
    ctx.arc(center.x, center.y, 5.0, -PI * 0.25, PI * 1.5)?;
    ctx.set_stroke_style_str("#fff");
    ctx.set_line_width(2.0);
    ctx.stroke();
    Ok(())
}

fn draw_delete_glyph(ctx: &CanvasRenderingContext2d, center: Point) {
    let s = 4.0;
    ctx.begin_path();
    ctx.move_to(center.x - s, center.y - s);
    ctx.line_to(center.x + s, center.y + s);
    ctx.move_to(center.x + s, center.y - s);
    ctx.line_to(center.x - s, center.y + s);
    ctx.set_stroke_style_str("#fff");
    ctx.set_line_width(2.0);
    ctx.stroke();
}

// =============================================================
// Helpers
// =============================================================

/// Run `body` between `save` and `restore`. The context is restored even when
/// `body` fails, so an error never leaves the state stack unbalanced.
fn with_saved_state(
    ctx: &CanvasRenderingContext2d,
    body: impl FnOnce() -> Result<(), JsValue>,
) -> Result<(), JsValue> {
    ctx.save();
    let drawn = body();
    ctx.restore();
    drawn
}

/// Translate to the instance centre and rotate by its rotation.
fn translate_and_rotate(ctx: &CanvasRenderingContext2d, inst: &PlacedInstance) -> Result<(), JsValue> {
    let c = inst.center();
    ctx.translate(c.x, c.y)?;
    ctx.rotate(inst.rotation.to_radians())?;
    Ok(())
}
