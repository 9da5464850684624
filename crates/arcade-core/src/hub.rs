//! The hub controller: registry owner, active-game slot and frame scheduler.
//!
//! Lifecycle: `Idle → Loading → Running ⇄ Paused → TearingDown → Idle`.
//! The host calls [`HubController::frame`] once per animation frame with a
//! timestamp; everything else happens in response to shell calls.

use std::any::Any;
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};

use serde::Serialize;

use crate::clock::{Clock, FrameTick};
use crate::config::HubConfig;
use crate::error::{FaultStage, GameError, HubError};
use crate::game_registry::{GameDescriptor, GameRegistry};
use crate::game_trait::{ArcadeGame, GameConfig, GameKey, GameStatus, SessionId};
use crate::input::{InputRouter, RawInput, SurfaceHandle};
use crate::surface::{RenderSurface, SurfaceBackend, SurfaceInfo};

/// Hub lifecycle phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum HubPhase {
    Idle,
    Loading,
    Running,
    Paused,
    TearingDown,
}

impl std::fmt::Display for HubPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::Loading => "loading",
            Self::Running => "running",
            Self::Paused => "paused",
            Self::TearingDown => "tearingDown",
        };
        f.write_str(s)
    }
}

/// Why a session ended.
#[derive(Debug, Clone, PartialEq)]
pub enum EndReason {
    Won,
    Lost,
    /// The shell called `exit_active`.
    Exited,
    /// Another game was selected.
    Replaced,
    /// A hook returned an error or panicked; always a [`HubError::RuntimeFault`].
    Faulted(HubError),
}

impl EndReason {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Won => "won",
            Self::Lost => "lost",
            Self::Exited => "exited",
            Self::Replaced => "replaced",
            Self::Faulted(_) => "faulted",
        }
    }
}

/// Notifications for the shell, drained with [`HubController::drain_events`].
#[derive(Debug, Clone, PartialEq)]
pub enum HubEvent {
    PhaseChanged {
        from: HubPhase,
        to: HubPhase,
    },
    SessionStarted {
        key: GameKey,
        session: SessionId,
    },
    SessionEnded {
        key: GameKey,
        session: SessionId,
        reason: EndReason,
        score: Option<i64>,
    },
}

/// Diagnostic counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct HubStats {
    pub sessions_started: u64,
    pub sessions_faulted: u64,
    pub init_failures: u64,
    pub frames_processed: u64,
    pub frames_forwarded: u64,
}

struct ActiveSession {
    key: GameKey,
    id: SessionId,
    game: Box<dyn ArcadeGame>,
    /// Set once the game reported won/lost while a grace delay is configured.
    ending: Option<Ending>,
}

struct Ending {
    reason: EndReason,
    remaining_ms: f64,
}

/// Orchestrates game sessions on one surface.
pub struct HubController {
    config: HubConfig,
    registry: GameRegistry,
    clock: Clock,
    input: InputRouter,
    surface: RenderSurface,
    session: Option<ActiveSession>,
    phase: HubPhase,
    next_session: u64,
    game_configs: HashMap<GameKey, GameConfig>,
    events: Vec<HubEvent>,
    stats: HubStats,
}

impl HubController {
    pub fn new(config: HubConfig, backend: Box<dyn SurfaceBackend>) -> Self {
        Self {
            clock: Clock::new(&config.clock),
            input: InputRouter::new(config.input.clone()),
            surface: RenderSurface::new(backend),
            registry: GameRegistry::new(),
            session: None,
            phase: HubPhase::Idle,
            next_session: 1,
            game_configs: HashMap::new(),
            events: Vec::new(),
            stats: HubStats::default(),
            config,
        }
    }

    // ---- Registration -------------------------------------------------

    pub fn register_game(&mut self, descriptor: GameDescriptor) -> Result<(), HubError> {
        self.registry.register(descriptor)
    }

    /// Snapshot of every registered game, in registration order.
    pub fn list_available_games(&self) -> Vec<GameDescriptor> {
        self.registry.list()
    }

    /// Opaque configuration passed to the game's `init` on its next activation.
    pub fn set_game_config(&mut self, key: impl Into<GameKey>, config: GameConfig) {
        self.game_configs.insert(key.into(), config);
    }

    // ---- Shell-facing lifecycle ---------------------------------------

    /// Activate a fresh instance of `key`, tearing down whatever is active.
    ///
    /// An unknown key fails before anything is torn down.
    pub fn select_game(&mut self, key: impl Into<GameKey>) -> Result<SessionId, HubError> {
        let key = key.into();
        let Some(descriptor) = self.registry.get(&key).cloned() else {
            tracing::warn!(key = %key, "select_game: unknown key");
            return Err(HubError::UnknownGame(key));
        };

        if self.session.is_some() {
            let reason = self.pending_end_reason().unwrap_or(EndReason::Replaced);
            self.teardown(reason);
        }

        self.set_phase(HubPhase::Loading);
        let config = self.game_configs.get(&key).cloned().unwrap_or_default();

        let mut game = match guarded(|| (descriptor.factory)()) {
            Ok(game) => game,
            Err(reason) => return Err(self.fail_init(key, reason)),
        };

        let surface = self.surface.info();
        if let Err(reason) = guarded(|| game.init(surface, &config)) {
            // The instance exists, so it still gets its single dispose.
            if let Err(e) = guarded(|| {
                game.dispose();
                Ok(())
            }) {
                tracing::error!(key = %key, error = %e, "dispose after failed init panicked");
            }
            return Err(self.fail_init(key, reason));
        }

        let id = SessionId(self.next_session);
        self.next_session += 1;

        self.surface.clear();
        self.session = Some(ActiveSession {
            key: key.clone(),
            id,
            game,
            ending: None,
        });
        self.input.set_active_receiver(Some(id));
        self.clock.start();
        self.stats.sessions_started += 1;

        tracing::info!(key = %key, session = %id, "game session started");
        self.events.push(HubEvent::SessionStarted { key, session: id });
        self.set_phase(HubPhase::Running);
        Ok(id)
    }

    /// Freeze the active game: no ticks and no input reach it until resumed.
    pub fn pause_active(&mut self) -> bool {
        if self.phase != HubPhase::Running {
            return false;
        }
        match &self.session {
            Some(session) if session.ending.is_none() => {},
            _ => return false,
        }
        self.input.set_active_receiver(None);
        self.set_phase(HubPhase::Paused);
        true
    }

    pub fn resume_active(&mut self) -> bool {
        if self.phase != HubPhase::Paused {
            return false;
        }
        let Some(id) = self.session.as_ref().map(|s| s.id) else {
            return false;
        };
        self.input.set_active_receiver(Some(id));
        self.set_phase(HubPhase::Running);
        true
    }

    /// End the active session and return to idle.
    pub fn exit_active(&mut self) -> bool {
        if self.session.is_none() {
            return false;
        }
        let reason = self.pending_end_reason().unwrap_or(EndReason::Exited);
        self.teardown(reason);
        true
    }

    pub fn phase(&self) -> HubPhase {
        self.phase
    }

    // ---- Host-facing plumbing -----------------------------------------

    /// Process one animation frame. Returns the tick if one was produced.
    ///
    /// Per frame: queued input → `handle_input`, then `update`, then `render`,
    /// then the status poll.
    pub fn frame(&mut self, now_ms: f64) -> Option<FrameTick> {
        let tick = self.clock.tick(now_ms)?;
        self.stats.frames_processed += 1;

        if self.phase != HubPhase::Running {
            return Some(tick);
        }

        if let Some(session) = self.session.as_mut()
            && let Some(ending) = session.ending.as_mut()
        {
            ending.remaining_ms -= tick.delta_ms;
            if ending.remaining_ms <= 0.0 {
                let reason = ending.reason.clone();
                self.teardown(reason);
            }
            return Some(tick);
        }

        if let Some(reason) = self.advance_session(tick) {
            self.end_session(reason);
        }
        Some(tick)
    }

    /// Attach the input router to the host surface. Returns `true` if the
    /// host should register its device listeners.
    pub fn attach_input(&mut self, surface: SurfaceHandle) -> bool {
        self.input.attach(surface)
    }

    pub fn detach_input(&mut self) {
        self.input.detach();
    }

    /// Feed one raw device event. Returns `true` if it was queued for the
    /// active game.
    pub fn push_input(&mut self, raw: &RawInput) -> bool {
        let viewport = self.surface.viewport();
        self.input.push(raw, &viewport)
    }

    /// Set the logical surface size; the active game is notified only when
    /// the size actually changes.
    ///
    /// A session that is paused or holding its final frame does not render
    /// again by itself, so its last frame is replayed onto the resized surface.
    pub fn resize(&mut self, width: u32, height: u32) -> bool {
        if !self.surface.resize(width, height) {
            return false;
        }
        let info = SurfaceInfo { width, height };
        let fault = match self.session.as_mut() {
            Some(session) if session.ending.is_none() => guarded(|| {
                session.game.handle_resize(info);
                Ok(())
            })
            .err()
            .map(|reason| runtime_fault(&session.key, session.id, FaultStage::Resize, reason)),
            _ => None,
        };
        if let Some(reason) = fault {
            self.end_session(reason);
            return true;
        }
        let frozen = self.phase == HubPhase::Paused
            || self.session.as_ref().is_some_and(|s| s.ending.is_some());
        if frozen {
            self.surface.redraw_last();
        }
        true
    }

    /// Record the on-screen size of the surface element, for pointer mapping.
    pub fn set_display_size(&mut self, width: f32, height: f32) {
        self.surface.set_display_size(width, height);
    }

    /// Tab visibility: hidden suspends tick delivery entirely.
    pub fn set_visible(&mut self, visible: bool) {
        if visible {
            self.clock.resume();
        } else {
            self.clock.suspend();
        }
        tracing::debug!(visible, "visibility changed");
    }

    // ---- Accessors ------------------------------------------------------

    pub fn active_key(&self) -> Option<&GameKey> {
        self.session.as_ref().map(|s| &s.key)
    }

    pub fn active_session(&self) -> Option<SessionId> {
        self.session.as_ref().map(|s| s.id)
    }

    pub fn active_status(&self) -> Option<GameStatus> {
        let session = self.session.as_ref()?;
        guarded(|| Ok(session.game.status())).ok()
    }

    pub fn active_score(&self) -> Option<i64> {
        let session = self.session.as_ref()?;
        guarded(|| Ok(session.game.score())).ok().flatten()
    }

    pub fn drain_events(&mut self) -> Vec<HubEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn stats(&self) -> HubStats {
        self.stats
    }

    pub fn config(&self) -> &HubConfig {
        &self.config
    }

    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    pub fn surface(&self) -> &RenderSurface {
        &self.surface
    }

    pub fn input(&self) -> &InputRouter {
        &self.input
    }

    // ---- Internals ------------------------------------------------------

    /// Run one frame of the active game. Returns why the session must end,
    /// if it must.
    fn advance_session(&mut self, tick: FrameTick) -> Option<EndReason> {
        let session = self.session.as_mut()?;
        let key = &session.key;
        let id = session.id;
        let game = &mut session.game;

        for event in self.input.drain_for(id) {
            if let Err(reason) = guarded(|| game.handle_input(&event)) {
                return Some(runtime_fault(key, id, FaultStage::Input, reason));
            }
            match guarded(|| Ok(game.status())) {
                Ok(status) if status.is_terminal() => return Some(terminal_reason(status)),
                Ok(_) => {},
                Err(reason) => return Some(runtime_fault(key, id, FaultStage::Status, reason)),
            }
        }

        if let Err(reason) = guarded(|| game.update(tick.delta_ms)) {
            return Some(runtime_fault(key, id, FaultStage::Update, reason));
        }

        {
            let mut frame = self.surface.begin_frame();
            if let Err(reason) = guarded(|| game.render(&mut frame)) {
                return Some(runtime_fault(key, id, FaultStage::Render, reason));
            }
        }
        self.stats.frames_forwarded += 1;

        match guarded(|| Ok(game.status())) {
            Ok(status) if status.is_terminal() => Some(terminal_reason(status)),
            Ok(_) => None,
            Err(reason) => Some(runtime_fault(key, id, FaultStage::Status, reason)),
        }
    }

    /// The won/lost outcome of a session sitting out its grace delay.
    fn pending_end_reason(&self) -> Option<EndReason> {
        let ending = self.session.as_ref()?.ending.as_ref()?;
        Some(ending.reason.clone())
    }

    /// Faults tear down immediately; won/lost honor the grace delay.
    fn end_session(&mut self, reason: EndReason) {
        let grace = self.config.hub.end_grace_ms;
        let graceful = matches!(reason, EndReason::Won | EndReason::Lost) && grace > 0.0;
        if !graceful {
            self.teardown(reason);
            return;
        }
        if let Some(session) = self.session.as_mut() {
            tracing::debug!(
                key = %session.key,
                session = %session.id,
                reason = reason.label(),
                grace_ms = grace,
                "session ended, holding final frame"
            );
            self.input.set_active_receiver(None);
            session.ending = Some(Ending {
                reason,
                remaining_ms: grace,
            });
        }
    }

    /// Ordered release: input receiver, then the instance, then the surface.
    fn teardown(&mut self, reason: EndReason) {
        if self.session.is_none() {
            return;
        }
        self.set_phase(HubPhase::TearingDown);
        self.input.set_active_receiver(None);

        if let Some(mut session) = self.session.take() {
            let score = guarded(|| Ok(session.game.score())).ok().flatten();
            if let Err(e) = guarded(|| {
                session.game.dispose();
                Ok(())
            }) {
                tracing::error!(key = %session.key, session = %session.id, error = %e, "dispose panicked");
            }
            drop(session.game);

            self.surface.clear();
            if matches!(reason, EndReason::Faulted(_)) {
                self.stats.sessions_faulted += 1;
            }
            tracing::info!(
                key = %session.key,
                session = %session.id,
                reason = reason.label(),
                ?score,
                "game session ended"
            );
            self.events.push(HubEvent::SessionEnded {
                key: session.key,
                session: session.id,
                reason,
                score,
            });
        }

        self.clock.stop();
        self.set_phase(HubPhase::Idle);
    }

    fn fail_init(&mut self, key: GameKey, reason: String) -> HubError {
        tracing::error!(key = %key, error = %reason, "game failed to initialize");
        self.stats.init_failures += 1;
        self.set_phase(HubPhase::Idle);
        HubError::GameInit { key, reason }
    }

    fn set_phase(&mut self, to: HubPhase) {
        let from = self.phase;
        if from == to {
            return;
        }
        self.phase = to;
        tracing::debug!(%from, %to, "hub phase changed");
        self.events.push(HubEvent::PhaseChanged { from, to });
    }
}

fn terminal_reason(status: GameStatus) -> EndReason {
    if status == GameStatus::Won {
        EndReason::Won
    } else {
        EndReason::Lost
    }
}

fn runtime_fault(key: &GameKey, id: SessionId, stage: FaultStage, reason: String) -> EndReason {
    tracing::error!(key = %key, session = %id, %stage, error = %reason, "game faulted");
    EndReason::Faulted(HubError::RuntimeFault {
        key: key.clone(),
        stage,
        reason,
    })
}

/// Run a game hook, converting both returned errors and panics into a message.
///
/// On `wasm32-unknown-unknown` panics abort instead of unwinding, so there
/// only a returned `Err` is contained; games must not panic in the browser.
fn guarded<T>(f: impl FnOnce() -> Result<T, GameError>) -> Result<T, String> {
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(e.to_string()),
        Err(payload) => Err(panic_message(payload.as_ref())),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("panic: {s}")
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("panic: {s}")
    } else {
        "panic".to_string()
    }
}
