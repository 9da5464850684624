//! `requestAnimationFrame` loop driving [`App::on_frame`](crate::app::App::on_frame).

#[cfg(target_family = "wasm")]
use std::cell::RefCell;
#[cfg(target_family = "wasm")]
use std::rc::Rc;

#[cfg(target_family = "wasm")]
use crate::app::App;

/// Start the frame loop. Each request captures the clock epoch so a frame
/// requested before a `stop()` is skipped when it finally fires.
#[cfg(target_family = "wasm")]
pub fn start(app: &Rc<RefCell<App>>) {
    use wasm_bindgen::JsCast;
    use wasm_bindgen::closure::Closure;

    type FrameCallback = Closure<dyn FnMut(f64)>;

    let slot: Rc<RefCell<Option<FrameCallback>>> = Rc::new(RefCell::new(None));
    let epoch = Rc::new(std::cell::Cell::new(app.borrow().hub.clock().epoch()));

    let next = Rc::clone(&slot);
    let app = Rc::clone(app);
    let callback = Closure::<dyn FnMut(f64)>::new(move |now_ms: f64| {
        let ended = app.borrow_mut().on_frame(now_ms, epoch.get());
        crate::bridge::notify_session_ended(&ended);

        epoch.set(app.borrow().hub.clock().epoch());
        if let Some(cb) = next.borrow().as_ref() {
            request_frame(cb.as_ref().unchecked_ref());
        }
    });
    request_frame(callback.as_ref().unchecked_ref());
    *slot.borrow_mut() = Some(callback);
}

#[cfg(target_family = "wasm")]
fn request_frame(callback: &js_sys::Function) {
    let Some(window) = web_sys::window() else {
        return;
    };
    if let Err(e) = window.request_animation_frame(callback) {
        crate::diag::console_error!("requestAnimationFrame failed: {e:?}");
    }
}
