use std::cell::RefCell;
use std::rc::Rc;

use serde::Serialize;
use serde_json::json;

use arcade_core::config::HubConfig;
use arcade_core::error::HubError;
use arcade_core::game_trait::{GameConfig, GameKey};
use arcade_core::hub::{EndReason, HubController, HubEvent, HubPhase, HubStats};
use arcade_core::input::{RawInput, SurfaceHandle};
use arcade_core::surface::RecordingSurface;
use arcade_core::time::{ManualTime, TimeSource};

use crate::script::ScriptedKey;

/// What to run and for how long.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub game: GameKey,
    pub frames: usize,
    pub step_ms: f64,
    pub width: u32,
    pub height: u32,
    pub seed: Option<u64>,
    pub high_score: Option<i64>,
    pub script: Vec<ScriptedKey>,
    pub config: HubConfig,
}

impl RunOptions {
    pub fn new(game: impl Into<GameKey>) -> Self {
        Self {
            game: game.into(),
            frames: 600,
            step_ms: 1000.0 / 60.0,
            width: 400,
            height: 300,
            seed: None,
            high_score: None,
            script: Vec::new(),
            config: HubConfig::default(),
        }
    }
}

/// One finished session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSummary {
    pub key: String,
    pub session: u64,
    pub reason: &'static str,
    pub fault: Option<String>,
    pub score: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub game: String,
    pub frames_run: usize,
    pub simulated_ms: f64,
    pub final_phase: HubPhase,
    pub keys_delivered: usize,
    pub sessions: Vec<SessionSummary>,
    pub stats: HubStats,
    pub frames_rendered: u64,
}

/// Drive one session of `options.game` on a fresh hub with the built-in
/// games registered.
pub fn run(options: &RunOptions) -> Result<RunReport, HubError> {
    let (mut hub, _) = recording_hub(options.config.clone(), options.width, options.height);
    for descriptor in crate::builtin_games() {
        hub.register_game(descriptor)?;
    }
    run_on(hub, options)
}

/// Drive one session of `options.game` on `hub`.
///
/// The run stops after `options.frames` frames or as soon as the hub is
/// idle again. A session still running at the end is exited so its score is
/// reported.
pub fn run_on(mut hub: HubController, options: &RunOptions) -> Result<RunReport, HubError> {
    let mut session_config = GameConfig {
        high_score: options.high_score,
        ..GameConfig::default()
    };
    if let Some(seed) = options.seed {
        session_config.custom.insert("seed".into(), json!(seed));
    }
    hub.set_game_config(options.game.clone(), session_config);
    hub.attach_input(SurfaceHandle(1));
    hub.resize(options.width, options.height);

    let session = hub.select_game(options.game.clone())?;
    tracing::info!(game = %options.game, %session, "headless run started");

    let time = ManualTime::new(0.0);
    let mut script = options.script.iter().peekable();
    let mut keys_delivered = 0;
    let mut frames_run = 0;
    let mut sessions = Vec::new();

    for _ in 0..options.frames {
        let elapsed = time.now_ms();
        while let Some(key) = script.next_if(|k| k.at_ms <= elapsed) {
            for pressed in [true, false] {
                hub.push_input(&RawInput::Key {
                    code: key.code.clone(),
                    pressed,
                    repeat: false,
                    timestamp_ms: elapsed,
                });
            }
            keys_delivered += 1;
        }

        hub.frame(elapsed);
        frames_run += 1;
        collect(&mut hub, &mut sessions);
        if hub.phase() == HubPhase::Idle {
            break;
        }
        time.advance(options.step_ms);
    }

    if hub.exit_active() {
        collect(&mut hub, &mut sessions);
    }

    let report = RunReport {
        game: options.game.to_string(),
        frames_run,
        simulated_ms: time.now_ms(),
        final_phase: hub.phase(),
        keys_delivered,
        sessions,
        stats: hub.stats(),
        frames_rendered: hub.surface().frames_begun(),
    };
    tracing::info!(
        frames = report.frames_run,
        sessions = report.sessions.len(),
        "headless run finished"
    );
    Ok(report)
}

/// A hub drawing into a recording surface the caller can inspect.
pub fn recording_hub(
    config: HubConfig,
    width: u32,
    height: u32,
) -> (HubController, Rc<RefCell<RecordingSurface>>) {
    let recording = Rc::new(RefCell::new(RecordingSurface::new(width, height)));
    let hub = HubController::new(config, Box::new(Rc::clone(&recording)));
    (hub, recording)
}

fn collect(hub: &mut HubController, sessions: &mut Vec<SessionSummary>) {
    for event in hub.drain_events() {
        match event {
            HubEvent::PhaseChanged { from, to } => {
                tracing::debug!(%from, %to, "phase");
            },
            HubEvent::SessionStarted { key, session } => {
                tracing::debug!(%key, %session, "session started");
            },
            HubEvent::SessionEnded {
                key,
                session,
                reason,
                score,
            } => {
                let fault = match &reason {
                    EndReason::Faulted(e) => Some(e.to_string()),
                    _ => None,
                };
                sessions.push(SessionSummary {
                    key: key.0,
                    session: session.0,
                    reason: reason.label(),
                    fault,
                    score,
                });
            },
        }
    }
}
