use std::cell::RefCell;
use std::rc::Rc;

use crate::app::{App, SessionEnd};

#[cfg(target_family = "wasm")]
use wasm_bindgen::JsCast;

/// Keys whose browser default (scrolling, focus moves) is suppressed while a
/// game is running.
const GAME_KEYS: &[&str] = &[
    "Space",
    "Tab",
    "ArrowUp",
    "ArrowDown",
    "ArrowLeft",
    "ArrowRight",
];

#[cfg_attr(not(target_family = "wasm"), allow(dead_code))]
pub(crate) fn is_game_key(code: &str) -> bool {
    GAME_KEYS.contains(&code)
}

/// Seed for a new session. Games are deterministic given a seed, so the
/// browser supplies fresh entropy per selection.
pub fn session_seed() -> u64 {
    #[cfg(target_family = "wasm")]
    {
        (js_sys::Math::random() * f64::from(u32::MAX)) as u64
    }
    #[cfg(not(target_family = "wasm"))]
    {
        0x5eed
    }
}

/// Drain finished sessions and hand them to the shell. The app borrow is
/// released before any JS runs, so the shell may call back into the handle.
pub fn flush_session_ends(app: &Rc<RefCell<App>>) {
    let ended = app.borrow_mut().take_session_ends();
    notify_session_ended(&ended);
}

pub fn notify_session_ended(ended: &[SessionEnd]) {
    for end in ended {
        match serde_json::to_string(end) {
            Ok(json) => call_window_fn("_arcadeSessionEnded", Some(&json)),
            Err(e) => crate::diag::console_warn!("Failed to serialize session end: {e}"),
        }
    }
}

#[cfg(target_family = "wasm")]
fn call_window_fn(name: &str, json_arg: Option<&str>) {
    let Some(window) = web_sys::window() else {
        return;
    };
    let Ok(val) = js_sys::Reflect::get(&window, &wasm_bindgen::JsValue::from_str(name)) else {
        return;
    };
    if !val.is_function() {
        return;
    }
    let func: js_sys::Function = val.unchecked_into();
    let result = match json_arg {
        Some(json) => match js_sys::JSON::parse(json) {
            Ok(parsed) => func.call1(&wasm_bindgen::JsValue::NULL, &parsed),
            Err(e) => {
                crate::diag::console_warn!("JSON parse failed for {name}: {e:?}");
                return;
            },
        },
        None => func.call0(&wasm_bindgen::JsValue::NULL),
    };
    if let Err(e) = result {
        crate::diag::console_warn!("JS callback {name} failed: {e:?}");
    }
}

#[cfg(not(target_family = "wasm"))]
fn call_window_fn(_name: &str, _json_arg: Option<&str>) {}

/// Record the canvas's on-screen size so pointer coordinates map correctly.
#[cfg(target_family = "wasm")]
pub fn sync_display_size(app: &Rc<RefCell<App>>, canvas: &web_sys::HtmlCanvasElement) {
    let rect = canvas.get_bounding_client_rect();
    app.borrow_mut()
        .hub
        .set_display_size(rect.width() as f32, rect.height() as f32);
}

/// Attach keyboard, pointer, visibility and resize listeners. Called once
/// per canvas; the hub's input router guards against a second attach.
#[cfg(target_family = "wasm")]
pub fn attach_input_listeners(app: &Rc<RefCell<App>>, canvas: &web_sys::HtmlCanvasElement) {
    use arcade_core::input::{PointerPhase, RawInput};
    use wasm_bindgen::closure::Closure;

    let Some(window) = web_sys::window() else {
        return;
    };
    let Some(document) = window.document() else {
        return;
    };

    // Keyboard
    for (event, pressed) in [("keydown", true), ("keyup", false)] {
        let app = Rc::clone(app);
        let closure = Closure::<dyn FnMut(web_sys::KeyboardEvent)>::new(
            move |evt: web_sys::KeyboardEvent| {
                let code = evt.code();
                let mut app = app.borrow_mut();
                if app.hub.active_session().is_some() && is_game_key(&code) {
                    evt.prevent_default();
                }
                app.hub.push_input(&RawInput::Key {
                    code,
                    pressed,
                    repeat: evt.repeat(),
                    timestamp_ms: evt.time_stamp(),
                });
            },
        );
        let _ = document.add_event_listener_with_callback(event, closure.as_ref().unchecked_ref());
        closure.forget();
    }

    // Mouse
    for (event, phase) in [
        ("mousedown", PointerPhase::Down),
        ("mousemove", PointerPhase::Move),
        ("mouseup", PointerPhase::Up),
    ] {
        let app = Rc::clone(app);
        let closure =
            Closure::<dyn FnMut(web_sys::MouseEvent)>::new(move |evt: web_sys::MouseEvent| {
                app.borrow_mut().hub.push_input(&RawInput::Mouse {
                    phase,
                    button: evt.button(),
                    element_x: evt.offset_x() as f32,
                    element_y: evt.offset_y() as f32,
                    timestamp_ms: evt.time_stamp(),
                });
            });
        let _ = canvas.add_event_listener_with_callback(event, closure.as_ref().unchecked_ref());
        closure.forget();
    }

    {
        let closure =
            Closure::<dyn FnMut(web_sys::MouseEvent)>::new(move |evt: web_sys::MouseEvent| {
                evt.prevent_default();
            });
        let _ = canvas
            .add_event_listener_with_callback("contextmenu", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    // Touch: only the first changed touch is tracked.
    for (event, phase) in [
        ("touchstart", PointerPhase::Down),
        ("touchmove", PointerPhase::Move),
        ("touchend", PointerPhase::Up),
        ("touchcancel", PointerPhase::Cancel),
    ] {
        let app = Rc::clone(app);
        let target = canvas.clone();
        let closure =
            Closure::<dyn FnMut(web_sys::TouchEvent)>::new(move |evt: web_sys::TouchEvent| {
                evt.prevent_default();
                let Some(touch) = evt.changed_touches().get(0) else {
                    return;
                };
                let rect = target.get_bounding_client_rect();
                app.borrow_mut().hub.push_input(&RawInput::Touch {
                    phase,
                    element_x: (f64::from(touch.client_x()) - rect.left()) as f32,
                    element_y: (f64::from(touch.client_y()) - rect.top()) as f32,
                    timestamp_ms: evt.time_stamp(),
                });
            });
        let _ = canvas.add_event_listener_with_callback(event, closure.as_ref().unchecked_ref());
        closure.forget();
    }

    // Tab visibility
    {
        let app = Rc::clone(app);
        let doc = document.clone();
        let closure = Closure::<dyn FnMut()>::new(move || {
            app.borrow_mut().hub.set_visible(!doc.hidden());
        });
        let _ = document
            .add_event_listener_with_callback("visibilitychange", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    // Layout changes move the letterbox.
    {
        let app = Rc::clone(app);
        let target = canvas.clone();
        let closure = Closure::<dyn FnMut()>::new(move || {
            sync_display_size(&app, &target);
        });
        let _ = window.add_event_listener_with_callback("resize", closure.as_ref().unchecked_ref());
        closure.forget();
    }
}
