#![allow(clippy::float_cmp)]

use super::*;
use crate::consts::MIN_INSTANCE_SIZE;
use crate::input::GestureKind;

// =============================================================
// Helpers
// =============================================================

const EPSILON: f64 = 1e-9;

fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < EPSILON
}

fn bed() -> ObjectTemplate {
    ObjectTemplate {
        id: "bed_1".into(),
        name: "Hospital Bed".into(),
        source: ImageSource::placeholder("#60a5fa", "Bed"),
        width: 200.0,
        height: 100.0,
    }
}

fn bed_payload() -> String {
    serde_json::to_string(&bed()).unwrap()
}

fn pt(x: f64, y: f64) -> Point {
    Point::new(x, y)
}

/// Core with a mounted 1280x720 surface whose top-left sits at `(left, top)`.
fn core_at(left: f64, top: f64) -> EngineCore {
    let mut core = EngineCore::new();
    core.set_surface_rect(Some(SurfaceRect::new(left, top, 1280.0, 720.0)));
    core
}

/// Mounted at the screen origin, so screen and local coordinates coincide.
fn core() -> EngineCore {
    core_at(0.0, 0.0)
}

fn has_action<F>(actions: &[Action], pred: F) -> bool
where
    F: Fn(&Action) -> bool,
{
    actions.iter().any(pred)
}

fn has_render_needed(actions: &[Action]) -> bool {
    has_action(actions, |a| matches!(a, Action::RenderNeeded))
}

fn count(actions: &[Action], wanted: &Action) -> usize {
    actions.iter().filter(|a| *a == wanted).count()
}

// =============================================================
// Construction
// =============================================================

#[test]
fn core_new_has_no_selection() {
    let core = EngineCore::new();
    assert!(core.selection().is_none());
    assert!(core.scene.is_empty());
    assert!(!core.input.is_active());
    assert!(!core.surface.is_mounted());
}

// =============================================================
// Drop
// =============================================================

#[test]
fn drop_creates_centered_selected_instance() {
    let mut core = core();
    let actions = core.on_drop(pt(500.0, 300.0), &bed_payload()).unwrap();
    let id = core.selection().unwrap();
    let inst = core.instance(&id).unwrap();
    assert_eq!(inst.x, 400.0);
    assert_eq!(inst.y, 250.0);
    assert_eq!(inst.rotation, 0.0);
    assert!(has_action(&actions, |a| matches!(a, Action::InstanceCreated(i) if i.id == id)));
    assert!(has_action(&actions, |a| *a == Action::SelectionChanged(Some(id))));
    assert!(has_render_needed(&actions));
}

#[test]
fn drop_converts_screen_to_surface_local() {
    let mut core = core_at(100.0, 40.0);
    core.on_drop(pt(600.0, 340.0), &bed_payload()).unwrap();
    let inst = core.scene.selected_instance().unwrap();
    assert_eq!(inst.x, 400.0);
    assert_eq!(inst.y, 250.0);
}

#[test]
fn drop_malformed_payload_is_rejected() {
    let mut core = core();
    let err = core.on_drop(pt(10.0, 10.0), "not json").unwrap_err();
    assert!(matches!(err, DropError::Payload(_)));
    assert_eq!(err.error_code(), "E_DROP_PAYLOAD");
    assert!(core.scene.is_empty());
}

#[test]
fn drop_rejects_non_positive_template() {
    let mut core = core();
    let mut t = bed();
    t.height = 0.0;
    let err = core
        .on_drop(pt(10.0, 10.0), &serde_json::to_string(&t).unwrap())
        .unwrap_err();
    assert!(matches!(err, DropError::InvalidTemplate { .. }));
    assert!(core.scene.is_empty());
}

#[test]
fn drop_without_surface_is_rejected() {
    let mut core = EngineCore::new();
    let err = core.on_drop(pt(10.0, 10.0), &bed_payload()).unwrap_err();
    assert!(matches!(err, DropError::SurfaceUnavailable));
    assert_eq!(err.error_code(), "E_SURFACE_UNAVAILABLE");
    assert!(core.scene.is_empty());
}

// =============================================================
// Pointer down
// =============================================================

#[test]
fn press_body_selects_and_starts_move() {
    let mut core = core();
    core.on_drop(pt(500.0, 300.0), &bed_payload()).unwrap();
    let id = core.selection().unwrap();
    core.select(None);

    let actions = core.on_pointer_down(pt(500.0, 300.0), Button::Primary);
    assert_eq!(core.selection(), Some(id));
    assert_eq!(core.input, InputState::Moving { id, last_screen: pt(500.0, 300.0) });
    assert!(has_action(&actions, |a| *a == Action::AttachPointerListeners));
    assert!(has_action(&actions, |a| *a == Action::SetCursor("move")));
    assert!(has_render_needed(&actions));
}

#[test]
fn press_resize_handle_starts_resize() {
    let mut core = core();
    core.on_drop(pt(500.0, 300.0), &bed_payload()).unwrap();
    let id = core.selection().unwrap();

    // Bottom-right corner of the bed is (600, 350).
    core.on_pointer_down(pt(600.0, 350.0), Button::Primary);
    assert_eq!(
        core.input,
        InputState::Resizing { id, start_screen: pt(600.0, 350.0), start_width: 200.0, start_height: 100.0 }
    );
}

#[test]
fn press_rotate_handle_starts_rotation_about_screen_center() {
    let mut core = core_at(10.0, 20.0);
    core.on_drop(pt(510.0, 320.0), &bed_payload()).unwrap();
    let id = core.selection().unwrap();

    // Local top edge is y=250; handle sits 20 above at local (500, 230).
    core.on_pointer_down(pt(510.0, 250.0), Button::Primary);
    match core.input {
        InputState::Rotating { id: rid, center_screen, start_angle, start_rotation } => {
            assert_eq!(rid, id);
            assert_eq!(center_screen, pt(510.0, 320.0));
            assert!(approx_eq(start_angle, -90.0));
            assert_eq!(start_rotation, 0.0);
        }
        ref other => panic!("Expected Rotating, got {other:?}"),
    }
}

#[test]
fn press_delete_control_deletes_instance() {
    let mut core = core();
    core.on_drop(pt(500.0, 300.0), &bed_payload()).unwrap();
    let id = core.selection().unwrap();

    // Top-right corner (600, 250), control centred 4 px inside.
    let actions = core.on_pointer_down(pt(596.0, 254.0), Button::Primary);
    assert!(core.scene.is_empty());
    assert!(core.selection().is_none());
    assert!(!core.input.is_active());
    assert!(has_action(&actions, |a| *a == Action::InstanceDeleted { id }));
    assert!(has_action(&actions, |a| *a == Action::SelectionChanged(None)));
    assert!(!has_action(&actions, |a| *a == Action::AttachPointerListeners));
}

#[test]
fn press_empty_surface_clears_selection() {
    let mut core = core();
    core.on_drop(pt(500.0, 300.0), &bed_payload()).unwrap();
    let actions = core.on_pointer_down(pt(50.0, 50.0), Button::Primary);
    assert!(core.selection().is_none());
    assert!(!core.input.is_active());
    assert!(has_render_needed(&actions));
}

#[test]
fn press_empty_surface_with_nothing_selected_is_quiet() {
    let mut core = core();
    let actions = core.on_pointer_down(pt(50.0, 50.0), Button::Primary);
    assert!(actions.is_empty());
}

#[test]
fn secondary_button_is_ignored() {
    let mut core = core();
    core.on_drop(pt(500.0, 300.0), &bed_payload()).unwrap();
    let actions = core.on_pointer_down(pt(500.0, 300.0), Button::Secondary);
    assert!(actions.is_empty());
    assert!(!core.input.is_active());
}

#[test]
fn back_and_forward_buttons_neither_start_nor_end_gestures() {
    let mut core = core();
    core.on_drop(pt(500.0, 300.0), &bed_payload()).unwrap();
    for code in [3, 4] {
        assert!(core.on_pointer_down(pt(500.0, 300.0), Button::from_dom(code)).is_empty());
        assert!(!core.input.is_active());
    }

    core.on_pointer_down(pt(500.0, 300.0), Button::from_dom(0));
    assert!(core.on_pointer_up(pt(500.0, 300.0), Button::from_dom(3)).is_empty());
    assert!(core.input.is_active());
}

#[test]
fn press_without_surface_is_ignored() {
    let mut core = core();
    core.on_drop(pt(500.0, 300.0), &bed_payload()).unwrap();
    core.set_surface_rect(None);
    let actions = core.on_pointer_down(pt(500.0, 300.0), Button::Primary);
    assert!(actions.is_empty());
    assert!(!core.input.is_active());
}

#[test]
fn second_press_during_gesture_is_ignored() {
    let mut core = core();
    core.on_drop(pt(500.0, 300.0), &bed_payload()).unwrap();
    core.on_pointer_down(pt(500.0, 300.0), Button::Primary);
    let before = core.input.clone();
    let actions = core.on_pointer_down(pt(600.0, 350.0), Button::Primary);
    assert!(actions.is_empty());
    assert_eq!(core.input, before);
}

// =============================================================
// Pointer move
// =============================================================

#[test]
fn move_gesture_is_incremental() {
    let mut core = core();
    core.on_drop(pt(500.0, 300.0), &bed_payload()).unwrap();
    let id = core.selection().unwrap();
    core.on_pointer_down(pt(500.0, 300.0), Button::Primary);

    core.on_pointer_move(pt(510.0, 305.0));
    core.on_pointer_move(pt(530.0, 300.0));
    let actions = core.on_pointer_move(pt(525.0, 320.0));
    let inst = core.instance(&id).unwrap();
    assert_eq!(inst.x, 425.0);
    assert_eq!(inst.y, 270.0);
    assert_eq!(core.input, InputState::Moving { id, last_screen: pt(525.0, 320.0) });
    assert!(has_action(&actions, |a| matches!(a, Action::InstanceUpdated { id: uid, .. } if *uid == id)));
}

#[test]
fn move_gesture_can_leave_surface() {
    let mut core = core();
    core.on_drop(pt(100.0, 100.0), &bed_payload()).unwrap();
    let id = core.selection().unwrap();
    core.on_pointer_down(pt(100.0, 100.0), Button::Primary);
    core.on_pointer_move(pt(-400.0, -300.0));
    let inst = core.instance(&id).unwrap();
    assert_eq!(inst.x, -500.0);
    assert_eq!(inst.y, -350.0);
}

#[test]
fn resize_gesture_is_cumulative_and_clamped() {
    let mut core = core();
    core.on_drop(pt(500.0, 300.0), &bed_payload()).unwrap();
    let id = core.selection().unwrap();
    core.on_pointer_down(pt(600.0, 350.0), Button::Primary);

    core.on_pointer_move(pt(700.0, 400.0));
    core.on_pointer_move(pt(620.0, 360.0));
    let inst = core.instance(&id).unwrap();
    assert_eq!(inst.width, 220.0);
    assert_eq!(inst.height, 110.0);
    assert_eq!(inst.x, 400.0);

    core.on_pointer_move(pt(-5000.0, -5000.0));
    let inst = core.instance(&id).unwrap();
    assert_eq!(inst.width, MIN_INSTANCE_SIZE);
    assert_eq!(inst.height, MIN_INSTANCE_SIZE);
}

#[test]
fn rotate_gesture_depends_only_on_angle() {
    let mut core = core();
    core.on_drop(pt(500.0, 300.0), &bed_payload()).unwrap();
    let id = core.selection().unwrap();
    // Rotate handle straight above centre: start angle -90.
    core.on_pointer_down(pt(500.0, 230.0), Button::Primary);

    core.on_pointer_move(pt(520.0, 300.0));
    let near = core.instance(&id).unwrap().rotation;
    core.on_pointer_move(pt(900.0, 300.0));
    let far = core.instance(&id).unwrap().rotation;
    assert!(approx_eq(near, 90.0));
    assert!(approx_eq(far, 90.0));
}

#[test]
fn move_while_idle_is_noop() {
    let mut core = core();
    core.on_drop(pt(500.0, 300.0), &bed_payload()).unwrap();
    let actions = core.on_pointer_move(pt(10.0, 10.0));
    assert!(actions.is_empty());
    let inst = core.scene.selected_instance().unwrap();
    assert_eq!(inst.x, 400.0);
}

#[test]
fn move_without_surface_is_suppressed() {
    let mut core = core();
    core.on_drop(pt(500.0, 300.0), &bed_payload()).unwrap();
    let id = core.selection().unwrap();
    core.on_pointer_down(pt(500.0, 300.0), Button::Primary);
    core.set_surface_rect(None);

    let actions = core.on_pointer_move(pt(600.0, 400.0));
    assert!(actions.is_empty());
    let inst = core.instance(&id).unwrap();
    assert_eq!(inst.x, 400.0);
    assert!(inst.x.is_finite() && inst.y.is_finite());
    assert!(core.input.is_active());
}

#[test]
fn move_after_concurrent_delete_is_noop() {
    let mut core = core();
    core.on_drop(pt(500.0, 300.0), &bed_payload()).unwrap();
    let id = core.selection().unwrap();
    core.on_pointer_down(pt(500.0, 300.0), Button::Primary);
    core.scene.delete_instance(&id);

    let actions = core.on_pointer_move(pt(520.0, 320.0));
    assert!(actions.is_empty());
    assert!(core.scene.is_empty());
}

// =============================================================
// Pointer up
// =============================================================

#[test]
fn release_ends_gesture_and_detaches_once() {
    let mut core = core();
    core.on_drop(pt(500.0, 300.0), &bed_payload()).unwrap();
    let down = core.on_pointer_down(pt(500.0, 300.0), Button::Primary);
    let up = core.on_pointer_up(pt(5000.0, 5000.0), Button::Primary);
    let again = core.on_pointer_up(pt(0.0, 0.0), Button::Primary);

    assert_eq!(count(&down, &Action::AttachPointerListeners), 1);
    assert_eq!(count(&up, &Action::DetachPointerListeners), 1);
    assert!(again.is_empty());
    assert!(!core.input.is_active());
    assert!(core.selection().is_some());
}

#[test]
fn release_without_gesture_is_quiet() {
    let mut core = core();
    assert!(core.on_pointer_up(pt(0.0, 0.0), Button::Primary).is_empty());
}

#[test]
fn moves_after_release_do_nothing() {
    let mut core = core();
    core.on_drop(pt(500.0, 300.0), &bed_payload()).unwrap();
    let id = core.selection().unwrap();
    core.on_pointer_down(pt(500.0, 300.0), Button::Primary);
    core.on_pointer_up(pt(500.0, 300.0), Button::Primary);
    core.on_pointer_move(pt(900.0, 900.0));
    assert_eq!(core.instance(&id).unwrap().x, 400.0);
}

// =============================================================
// Scene operations through the core
// =============================================================

#[test]
fn update_unknown_id_emits_nothing() {
    let mut core = core();
    core.on_drop(pt(500.0, 300.0), &bed_payload()).unwrap();
    let id = core.selection().unwrap();
    core.delete_instance(&id);
    let actions = core.update_instance(&id, PartialInstance { x: Some(1.0), ..Default::default() });
    assert!(actions.is_empty());
}

#[test]
fn delete_unknown_id_emits_nothing() {
    let mut core = core();
    core.on_drop(pt(500.0, 300.0), &bed_payload()).unwrap();
    let id = core.selection().unwrap();
    core.delete_instance(&id);
    assert!(core.delete_instance(&id).is_empty());
}

#[test]
fn delete_unselected_keeps_selection() {
    let mut core = core();
    core.on_drop(pt(100.0, 100.0), &bed_payload()).unwrap();
    let first = core.selection().unwrap();
    core.on_drop(pt(800.0, 500.0), &bed_payload()).unwrap();
    let second = core.selection().unwrap();
    let actions = core.delete_instance(&first);
    assert_eq!(core.selection(), Some(second));
    assert!(!has_action(&actions, |a| matches!(a, Action::SelectionChanged(_))));
}

#[test]
fn deleting_gesture_target_ends_gesture() {
    let mut core = core();
    core.on_drop(pt(500.0, 300.0), &bed_payload()).unwrap();
    let id = core.selection().unwrap();
    core.on_pointer_down(pt(500.0, 300.0), Button::Primary);
    let actions = core.delete_instance(&id);
    assert!(!core.input.is_active());
    assert_eq!(count(&actions, &Action::DetachPointerListeners), 1);
}

#[test]
fn select_is_idempotent() {
    let mut core = core();
    core.on_drop(pt(500.0, 300.0), &bed_payload()).unwrap();
    let id = core.selection().unwrap();
    assert!(core.select(Some(id)).is_empty());
    assert!(!core.select(None).is_empty());
    assert!(core.select(None).is_empty());
}

#[test]
fn background_press_deselects() {
    let mut core = core();
    core.on_drop(pt(500.0, 300.0), &bed_payload()).unwrap();
    let actions = core.on_background_press();
    assert!(core.selection().is_none());
    assert!(has_action(&actions, |a| *a == Action::SelectionChanged(None)));
}

#[test]
fn background_press_during_gesture_is_ignored() {
    let mut core = core();
    core.on_drop(pt(500.0, 300.0), &bed_payload()).unwrap();
    core.on_pointer_down(pt(500.0, 300.0), Button::Primary);
    assert!(core.on_background_press().is_empty());
    assert!(core.selection().is_some());
}

#[test]
fn reset_keeps_background_and_ends_gesture() {
    let mut core = core();
    core.set_background(ImageSource::url("data:photo"));
    core.on_drop(pt(500.0, 300.0), &bed_payload()).unwrap();
    core.on_pointer_down(pt(500.0, 300.0), Button::Primary);
    let actions = core.reset();
    assert!(core.scene.is_empty());
    assert!(core.selection().is_none());
    assert!(core.scene.background().is_some());
    assert!(!core.input.is_active());
    assert_eq!(count(&actions, &Action::DetachPointerListeners), 1);
}

#[test]
fn retake_clears_background() {
    let mut core = core();
    core.set_background(ImageSource::url("data:photo"));
    core.on_drop(pt(500.0, 300.0), &bed_payload()).unwrap();
    core.retake();
    assert!(core.scene.is_empty());
    assert!(core.scene.background().is_none());
    assert!(core.selection().is_none());
}

#[test]
fn teardown_detaches_active_gesture() {
    let mut core = core();
    core.on_drop(pt(500.0, 300.0), &bed_payload()).unwrap();
    core.on_pointer_down(pt(600.0, 350.0), Button::Primary);
    assert_eq!(core.input.kind(), Some(GestureKind::Resize));
    let actions = core.teardown();
    assert_eq!(count(&actions, &Action::DetachPointerListeners), 1);
    assert!(core.teardown().is_empty());
}

// =============================================================
// Cursor hints
// =============================================================

#[test]
fn cursor_reflects_hover_target() {
    let mut core = core();
    assert_eq!(core.cursor_at(pt(500.0, 300.0)), "default");
    core.on_drop(pt(500.0, 300.0), &bed_payload()).unwrap();
    assert_eq!(core.cursor_at(pt(500.0, 300.0)), "move");
    assert_eq!(core.cursor_at(pt(600.0, 350.0)), "se-resize");
    assert_eq!(core.cursor_at(pt(500.0, 230.0)), "alias");
    assert_eq!(core.cursor_at(pt(604.0, 246.0)), "pointer");
}

// =============================================================
// End to end
// =============================================================

#[test]
fn place_resize_rotate_delete() {
    let mut core = core();

    // Drop the bed at (500, 300).
    core.on_drop(pt(500.0, 300.0), &bed_payload()).unwrap();
    let id = core.selection().unwrap();
    let inst = core.instance(&id).unwrap();
    assert_eq!((inst.x, inst.y), (400.0, 250.0));

    // Resize from (600, 400) to (650, 430), anchored at the gesture start.
    core.input = InputState::Resizing { id, start_screen: pt(600.0, 400.0), start_width: 200.0, start_height: 100.0 };
    core.on_pointer_move(pt(650.0, 430.0));
    core.on_pointer_up(pt(650.0, 430.0), Button::Primary);
    let inst = core.instance(&id).unwrap();
    assert_eq!((inst.width, inst.height), (250.0, 130.0));

    // Rotate: start at 0° relative to centre, end at 90°.
    let center = inst.center();
    core.input = InputState::Rotating { id, center_screen: center, start_angle: 0.0, start_rotation: 0.0 };
    core.on_pointer_move(pt(center.x, center.y + 50.0));
    core.on_pointer_up(pt(center.x, center.y + 50.0), Button::Primary);
    assert!(approx_eq(core.instance(&id).unwrap().rotation, 90.0));

    // Delete.
    core.delete_instance(&id);
    assert!(core.instance(&id).is_none());
    assert!(core.selection().is_none());
}

// =============================================================
// Host effects
// =============================================================

#[test]
fn host_effects_of_press_on_body() {
    let mut core = core();
    core.on_drop(pt(500.0, 300.0), &bed_payload()).unwrap();
    core.select(None);
    let actions = core.on_pointer_down(pt(500.0, 300.0), Button::Primary);
    let fx = HostEffects::from_actions(&actions);
    assert_eq!(fx, HostEffects { cursor: Some("move"), render: true });
}

#[test]
fn host_effects_coalesce_renders_and_keep_last_cursor() {
    let actions = [
        Action::RenderNeeded,
        Action::SetCursor("move"),
        Action::AttachPointerListeners,
        Action::RenderNeeded,
        Action::SetCursor("default"),
    ];
    let fx = HostEffects::from_actions(&actions);
    assert_eq!(fx, HostEffects { cursor: Some("default"), render: true });
}

#[test]
fn host_effects_of_listener_only_actions_are_empty() {
    let fx = HostEffects::from_actions(&[Action::AttachPointerListeners, Action::DetachPointerListeners]);
    assert_eq!(fx, HostEffects::default());
}

#[test]
fn image_urls_skip_placeholders() {
    let mut core = core();
    core.set_background(ImageSource::url("data:image/png;base64,room"));
    core.on_drop(pt(500.0, 300.0), &bed_payload()).unwrap();
    let lamp = ObjectTemplate { id: "custom_lamp".into(), source: ImageSource::url("blob:lamp"), ..bed() };
    core.add_instance(&lamp, pt(100.0, 100.0));

    assert_eq!(image_urls_in_use(&core.scene), vec!["data:image/png;base64,room".to_string(), "blob:lamp".to_string()]);

    core.reset();
    assert_eq!(image_urls_in_use(&core.scene), vec!["data:image/png;base64,room".to_string()]);
    core.retake();
    assert!(image_urls_in_use(&core.scene).is_empty());
}
