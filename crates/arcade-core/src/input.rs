//! Input normalization and routing.
//!
//! Raw device events from the host are translated into a small set of
//! [`InputEvent`]s in surface coordinates and queued for the single active
//! receiver. Events are drained once per frame, before `update`.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::config::InputConfig;
use crate::game_trait::SessionId;
use crate::surface::{SurfacePoint, Viewport};

/// Identity of a host surface the router listens on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SurfaceHandle(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PointerPhase {
    Down,
    Move,
    Up,
    Cancel,
}

/// Primary mouse button as reported by DOM `MouseEvent.button`.
pub const PRIMARY_BUTTON: i16 = 0;

/// Platform-level event as received from the host, before normalization.
/// Coordinates are relative to the surface element, in displayed pixels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RawInput {
    Mouse {
        phase: PointerPhase,
        button: i16,
        element_x: f32,
        element_y: f32,
        timestamp_ms: f64,
    },
    Touch {
        phase: PointerPhase,
        element_x: f32,
        element_y: f32,
        timestamp_ms: f64,
    },
    Key {
        code: String,
        pressed: bool,
        repeat: bool,
        timestamp_ms: f64,
    },
}

/// What happened, in game terms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum InputKind {
    PointerDown(SurfacePoint),
    PointerMove(SurfacePoint),
    PointerUp(SurfacePoint),
    /// DOM `KeyboardEvent.code`, e.g. `"ArrowUp"` or `"KeyW"`.
    KeyDown(String),
    KeyUp(String),
}

/// A normalized input event delivered to `handle_input`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputEvent {
    pub kind: InputKind,
    pub timestamp_ms: f64,
}

impl InputEvent {
    pub fn key_down(code: impl Into<String>, timestamp_ms: f64) -> Self {
        Self {
            kind: InputKind::KeyDown(code.into()),
            timestamp_ms,
        }
    }

    pub fn key_up(code: impl Into<String>, timestamp_ms: f64) -> Self {
        Self {
            kind: InputKind::KeyUp(code.into()),
            timestamp_ms,
        }
    }

    pub fn pointer_down(x: f32, y: f32, timestamp_ms: f64) -> Self {
        Self {
            kind: InputKind::PointerDown(SurfacePoint { x, y }),
            timestamp_ms,
        }
    }

    pub fn pointer_up(x: f32, y: f32, timestamp_ms: f64) -> Self {
        Self {
            kind: InputKind::PointerUp(SurfacePoint { x, y }),
            timestamp_ms,
        }
    }

    /// The pressed key code, if this is a key-down event.
    pub fn pressed_key(&self) -> Option<&str> {
        match &self.kind {
            InputKind::KeyDown(code) => Some(code),
            _ => None,
        }
    }

    /// Surface position, for pointer events.
    pub fn position(&self) -> Option<SurfacePoint> {
        match self.kind {
            InputKind::PointerDown(p) | InputKind::PointerMove(p) | InputKind::PointerUp(p) => {
                Some(p)
            },
            InputKind::KeyDown(_) | InputKind::KeyUp(_) => None,
        }
    }
}

/// Translate a raw event. Returns `None` for events games never see
/// (secondary mouse buttons, filtered key repeats).
pub fn normalize(raw: &RawInput, viewport: &Viewport, config: &InputConfig) -> Option<InputEvent> {
    match raw {
        RawInput::Mouse {
            phase,
            button,
            element_x,
            element_y,
            timestamp_ms,
        } => {
            if *phase != PointerPhase::Move && *button != PRIMARY_BUTTON {
                return None;
            }
            let point = viewport.to_surface(*element_x, *element_y);
            Some(InputEvent {
                kind: pointer_kind(*phase, point),
                timestamp_ms: *timestamp_ms,
            })
        },
        RawInput::Touch {
            phase,
            element_x,
            element_y,
            timestamp_ms,
        } => {
            let point = viewport.to_surface(*element_x, *element_y);
            Some(InputEvent {
                kind: pointer_kind(*phase, point),
                timestamp_ms: *timestamp_ms,
            })
        },
        RawInput::Key {
            code,
            pressed,
            repeat,
            timestamp_ms,
        } => {
            if *pressed && *repeat && !config.forward_key_repeat {
                return None;
            }
            let kind = if *pressed {
                InputKind::KeyDown(code.clone())
            } else {
                InputKind::KeyUp(code.clone())
            };
            Some(InputEvent {
                kind,
                timestamp_ms: *timestamp_ms,
            })
        },
    }
}

fn pointer_kind(phase: PointerPhase, point: SurfacePoint) -> InputKind {
    match phase {
        PointerPhase::Down => InputKind::PointerDown(point),
        PointerPhase::Move => InputKind::PointerMove(point),
        PointerPhase::Up | PointerPhase::Cancel => InputKind::PointerUp(point),
    }
}

/// Routes normalized events to exactly one receiver.
pub struct InputRouter {
    config: InputConfig,
    attached: Option<SurfaceHandle>,
    receiver: Option<SessionId>,
    queue: VecDeque<InputEvent>,
    dropped: u64,
}

impl InputRouter {
    pub fn new(config: InputConfig) -> Self {
        Self {
            config,
            attached: None,
            receiver: None,
            queue: VecDeque::new(),
            dropped: 0,
        }
    }

    /// Start listening on `surface`. Returns `true` if the host should
    /// register its device listeners now.
    ///
    /// Attaching twice to the same surface is a programming error: it panics
    /// in debug builds and is ignored (with a warning) in release builds.
    pub fn attach(&mut self, surface: SurfaceHandle) -> bool {
        if self.attached == Some(surface) {
            if cfg!(debug_assertions) {
                panic!("input router attached twice to surface {surface:?}");
            }
            tracing::warn!(surface = surface.0, "input router already attached, ignoring");
            return false;
        }
        if let Some(previous) = self.attached {
            tracing::debug!(from = previous.0, to = surface.0, "input router moved to new surface");
        }
        self.attached = Some(surface);
        true
    }

    /// Forget the attached surface. Queued events are discarded.
    pub fn detach(&mut self) {
        self.attached = None;
        self.queue.clear();
    }

    pub fn attached(&self) -> Option<SurfaceHandle> {
        self.attached
    }

    pub fn receiver(&self) -> Option<SessionId> {
        self.receiver
    }

    /// Redirect all subsequent events to `receiver`, or drop them if `None`.
    /// Anything queued for the previous receiver is discarded.
    pub fn set_active_receiver(&mut self, receiver: Option<SessionId>) {
        if self.receiver == receiver {
            return;
        }
        if !self.queue.is_empty() {
            tracing::debug!(
                discarded = self.queue.len(),
                "discarding input queued for previous receiver"
            );
            self.queue.clear();
        }
        self.receiver = receiver;
    }

    /// Normalize and enqueue a raw event. Returns `true` if it was queued.
    pub fn push(&mut self, raw: &RawInput, viewport: &Viewport) -> bool {
        let Some(event) = normalize(raw, viewport, &self.config) else {
            return false;
        };
        self.push_event(event)
    }

    /// Enqueue an already-normalized event.
    pub fn push_event(&mut self, event: InputEvent) -> bool {
        if self.receiver.is_none() {
            self.dropped += 1;
            return false;
        }
        if self.queue.len() >= self.config.max_queued_events {
            self.queue.pop_front();
            self.dropped += 1;
            tracing::warn!(
                capacity = self.config.max_queued_events,
                "input queue full, dropped oldest event"
            );
        }
        self.queue.push_back(event);
        true
    }

    /// Take every event queued for `session`. Yields nothing unless `session`
    /// is the current receiver.
    pub fn drain_for(&mut self, session: SessionId) -> VecDeque<InputEvent> {
        if self.receiver != Some(session) {
            return VecDeque::new();
        }
        std::mem::take(&mut self.queue)
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Events dropped because no receiver was set or the queue overflowed.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}
