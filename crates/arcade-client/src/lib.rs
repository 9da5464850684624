//! Browser glue for the arcade hub: a canvas-backed surface, DOM input
//! listeners, the animation-frame loop and the JS-facing [`ArcadeHandle`].

mod app;
mod bridge;
mod canvas;
mod diag;
mod scheduler;

use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::prelude::*;

pub use app::{App, END_GRACE_MS, SessionEnd, builtin_games, client_config};

/// Handle the page shell holds on to. Every method borrows the app for the
/// duration of the call only; session-end notifications are sent after the
/// borrow is released.
#[wasm_bindgen]
pub struct ArcadeHandle {
    app: Rc<RefCell<App>>,
}

impl ArcadeHandle {
    pub fn from_app(app: App) -> Self {
        Self {
            app: Rc::new(RefCell::new(app)),
        }
    }
}

#[cfg(target_family = "wasm")]
#[wasm_bindgen]
impl ArcadeHandle {
    /// Bind the hub to `<canvas id=canvas_id>` and start the frame loop.
    pub fn start(canvas_id: &str) -> Result<ArcadeHandle, JsValue> {
        use arcade_core::hub::HubController;
        use arcade_core::input::SurfaceHandle;

        console_error_panic_hook::set_once();

        let document = web_sys::window()
            .and_then(|w| w.document())
            .ok_or_else(|| JsValue::from_str("no document"))?;
        let canvas = document
            .get_element_by_id(canvas_id)
            .ok_or_else(|| JsValue::from_str(&format!("no element #{canvas_id}")))?
            .dyn_into::<web_sys::HtmlCanvasElement>()?;

        let surface = canvas::CanvasSurface::new(canvas.clone())?;
        let hub = HubController::new(app::client_config(), Box::new(surface));
        let mut app = App::new(hub);
        app.register_builtin()
            .map_err(|e| JsValue::from_str(&e.to_string()))?;

        let handle = Self::from_app(app);
        if handle.app.borrow_mut().hub.attach_input(SurfaceHandle(1)) {
            bridge::attach_input_listeners(&handle.app, &canvas);
        }
        bridge::sync_display_size(&handle.app, &canvas);
        scheduler::start(&handle.app);
        Ok(handle)
    }
}

#[wasm_bindgen]
impl ArcadeHandle {
    /// Registered games as a JSON array of `{key, displayName, description, best}`.
    pub fn list_games(&self) -> String {
        self.app.borrow().games_json().to_string()
    }

    /// Start a new session of `key`. Returns the session id; throws on an
    /// unknown key or a game that fails to initialize.
    pub fn select_game(&self, key: &str) -> Result<f64, String> {
        let result = self.app.borrow_mut().select(key, bridge::session_seed());
        bridge::flush_session_ends(&self.app);
        result.map(|id| id.0 as f64).map_err(|e| e.to_string())
    }

    pub fn pause(&self) -> bool {
        self.app.borrow_mut().hub.pause_active()
    }

    pub fn resume(&self) -> bool {
        self.app.borrow_mut().hub.resume_active()
    }

    pub fn exit(&self) -> bool {
        let exited = self.app.borrow_mut().hub.exit_active();
        bridge::flush_session_ends(&self.app);
        exited
    }

    pub fn phase(&self) -> String {
        self.app.borrow().hub.phase().to_string()
    }

    /// Set the logical surface size in pixels.
    pub fn resize(&self, width: u32, height: u32) -> bool {
        let changed = self.app.borrow_mut().hub.resize(width, height);
        // A game faulting in its resize hook ends its session.
        bridge::flush_session_ends(&self.app);
        changed
    }

    pub fn set_high_score(&self, key: &str, score: f64) {
        self.app.borrow_mut().set_high_score(key, score as i64);
    }
}
