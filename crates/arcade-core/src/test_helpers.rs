//! Spy games, surfaces and the generic contract suite.
//!
//! Game crates call the `contract_*` functions from their own
//! `#[cfg(test)]` modules with a concrete instance; hub tests use
//! [`SpyGame`] to observe exactly which hooks ran, in which order.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::config::HubConfig;
use crate::error::GameError;
use crate::game_registry::GameDescriptor;
use crate::game_trait::{ArcadeGame, GameConfig, GameMetadata, GameStatus};
use crate::hub::HubController;
use crate::input::InputEvent;
use crate::surface::{DrawCommand, Frame, RecordingSurface, RenderSurface, Rgba, SurfaceInfo};
use crate::time::{ManualTime, TimeSource};

/// Frame length used by the helpers, roughly 60 Hz.
pub const FRAME_MS: f64 = 16.0;

/// A lifecycle hook invocation observed on a spy.
#[derive(Debug, Clone, PartialEq)]
pub enum Hook {
    Init,
    Update(f64),
    Render,
    Input(InputEvent),
    Resize(SurfaceInfo),
    Dispose,
    /// `dispose` called again on an already-disposed instance.
    RedundantDispose,
    /// Any other hook called after `dispose`.
    AfterDispose(&'static str),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    /// `"<key>#<n>"`: which instance was called.
    pub instance: String,
    pub hook: Hook,
}

/// Shared, ordered record of hook calls across every spy instance.
#[derive(Clone, Default)]
pub struct CallLog(Rc<RefCell<Vec<Call>>>);

impl CallLog {
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&self, instance: &str, hook: Hook) {
        self.0.borrow_mut().push(Call {
            instance: instance.to_string(),
            hook,
        });
    }

    pub fn calls(&self) -> Vec<Call> {
        self.0.borrow().clone()
    }

    pub fn clear(&self) {
        self.0.borrow_mut().clear();
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.0.borrow().iter().filter(|c| pred(c)).count()
    }

    pub fn count_hook(&self, instance: &str, pred: impl Fn(&Hook) -> bool) -> usize {
        self.count(|c| c.instance == instance && pred(&c.hook))
    }

    /// Position of the first call matching `instance` and `pred`.
    pub fn position(&self, instance: &str, pred: impl Fn(&Hook) -> bool) -> Option<usize> {
        self.0
            .borrow()
            .iter()
            .position(|c| c.instance == instance && pred(&c.hook))
    }

    /// Hooks that reached an instance after it was disposed.
    pub fn violations(&self) -> Vec<Call> {
        self.0
            .borrow()
            .iter()
            .filter(|c| matches!(c.hook, Hook::AfterDispose(_) | Hook::RedundantDispose))
            .cloned()
            .collect()
    }

    /// Every instance name seen, in order of first appearance.
    pub fn instances(&self) -> Vec<String> {
        let mut seen: Vec<String> = Vec::new();
        for call in self.0.borrow().iter() {
            if !seen.contains(&call.instance) {
                seen.push(call.instance.clone());
            }
        }
        seen
    }
}

/// Knobs for making a spy misbehave or finish.
#[derive(Debug, Clone, Default)]
pub struct SpyBehavior {
    pub lose_after_updates: Option<u32>,
    pub win_after_updates: Option<u32>,
    /// Key code that makes the game report `Lost` as soon as it is handled.
    pub lose_on_key: Option<String>,
    pub fail_factory: bool,
    pub fail_init: bool,
    pub fail_update: bool,
    pub fail_input: bool,
    pub panic_update: bool,
    pub panic_render: bool,
    pub panic_dispose: bool,
    pub panic_resize: bool,
    /// Panic in `status` once the spy has seen at least one update.
    pub panic_status: bool,
}

/// A game that records every hook into a [`CallLog`] and refuses (with an
/// error) any call that arrives after its own `dispose`.
pub struct SpyGame {
    instance: String,
    log: CallLog,
    behavior: SpyBehavior,
    updates: u32,
    elapsed_ms: f64,
    status: GameStatus,
    disposed: bool,
    /// Stands in for a resource held by the instance.
    resources: Option<Vec<u8>>,
}

impl Default for SpyGame {
    fn default() -> Self {
        Self::new("spy#0", CallLog::new(), SpyBehavior::default())
    }
}

impl SpyGame {
    pub fn new(instance: impl Into<String>, log: CallLog, behavior: SpyBehavior) -> Self {
        Self {
            instance: instance.into(),
            log,
            behavior,
            updates: 0,
            elapsed_ms: 0.0,
            status: GameStatus::Running,
            disposed: false,
            resources: None,
        }
    }

    pub fn updates(&self) -> u32 {
        self.updates
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    pub fn elapsed_ms(&self) -> f64 {
        self.elapsed_ms
    }

    pub fn holds_resources(&self) -> bool {
        self.resources.is_some()
    }

    fn guard(&self, hook: &'static str) -> Result<(), GameError> {
        if self.disposed {
            self.log.record(&self.instance, Hook::AfterDispose(hook));
            return Err(GameError::new(format!(
                "{hook} called on disposed instance {}",
                self.instance
            )));
        }
        Ok(())
    }
}

impl ArcadeGame for SpyGame {
    fn metadata(&self) -> GameMetadata {
        GameMetadata::new("Spy", "Records lifecycle calls")
    }

    fn init(&mut self, _surface: SurfaceInfo, _config: &GameConfig) -> Result<(), GameError> {
        self.guard("init")?;
        self.log.record(&self.instance, Hook::Init);
        self.resources = Some(vec![0; 64]);
        if self.behavior.fail_init {
            return Err(GameError::new("init refused"));
        }
        Ok(())
    }

    fn update(&mut self, dt_ms: f64) -> Result<(), GameError> {
        self.guard("update")?;
        self.log.record(&self.instance, Hook::Update(dt_ms));
        if self.behavior.fail_update {
            return Err(GameError::new("update refused"));
        }
        if self.behavior.panic_update {
            panic!("spy update panicked");
        }
        self.updates += 1;
        self.elapsed_ms += dt_ms;
        if self.behavior.lose_after_updates == Some(self.updates) {
            self.status = GameStatus::Lost;
        }
        if self.behavior.win_after_updates == Some(self.updates) {
            self.status = GameStatus::Won;
        }
        Ok(())
    }

    fn render(&self, frame: &mut Frame<'_>) -> Result<(), GameError> {
        self.guard("render")?;
        self.log.record(&self.instance, Hook::Render);
        if self.behavior.panic_render {
            panic!("spy render panicked");
        }
        frame.fill(Rgba::rgb(10, 20, 30));
        Ok(())
    }

    fn handle_input(&mut self, event: &InputEvent) -> Result<(), GameError> {
        self.guard("handle_input")?;
        self.log.record(&self.instance, Hook::Input(event.clone()));
        if self.behavior.fail_input {
            return Err(GameError::new("input refused"));
        }
        if let (Some(lose), Some(code)) = (&self.behavior.lose_on_key, event.pressed_key())
            && lose == code
        {
            self.status = GameStatus::Lost;
        }
        Ok(())
    }

    fn handle_resize(&mut self, surface: SurfaceInfo) {
        if self.guard("handle_resize").is_ok() {
            self.log.record(&self.instance, Hook::Resize(surface));
        }
        if self.behavior.panic_resize {
            panic!("spy resize panicked");
        }
    }

    fn status(&self) -> GameStatus {
        if self.behavior.panic_status && self.updates > 0 {
            panic!("spy status panicked");
        }
        self.status
    }

    fn score(&self) -> Option<i64> {
        Some(i64::from(self.updates))
    }

    fn dispose(&mut self) {
        if self.disposed {
            self.log.record(&self.instance, Hook::RedundantDispose);
            return;
        }
        self.disposed = true;
        self.resources = None;
        self.log.record(&self.instance, Hook::Dispose);
        if self.behavior.panic_dispose {
            panic!("spy dispose panicked");
        }
    }
}

/// Descriptor whose factory numbers its instances `"<key>#1"`, `"<key>#2"`, ...
pub fn spy_descriptor(key: &str, log: &CallLog, behavior: SpyBehavior) -> GameDescriptor {
    let log = log.clone();
    let counter = Rc::new(Cell::new(0u32));
    let prefix = key.to_string();
    GameDescriptor::new(key, GameMetadata::new(key, "spy"), move || {
        if behavior.fail_factory {
            return Err(GameError::new("factory refused"));
        }
        counter.set(counter.get() + 1);
        let instance = format!("{prefix}#{}", counter.get());
        Ok(Box::new(SpyGame::new(instance, log.clone(), behavior.clone())) as Box<dyn ArcadeGame>)
    })
}

/// A recording backend the test keeps a handle to.
pub fn shared_recording(width: u32, height: u32) -> Rc<RefCell<RecordingSurface>> {
    Rc::new(RefCell::new(RecordingSurface::new(width, height)))
}

/// A hub on a 400x300 recording surface.
pub fn test_hub(config: HubConfig) -> (HubController, Rc<RefCell<RecordingSurface>>) {
    let recording = shared_recording(400, 300);
    let hub = HubController::new(config, Box::new(Rc::clone(&recording)));
    (hub, recording)
}

/// Drive `n` frames, advancing `time` by `step_ms` before each.
pub fn run_frames(hub: &mut HubController, time: &ManualTime, n: usize, step_ms: f64) {
    for _ in 0..n {
        time.advance(step_ms);
        hub.frame(time.now_ms());
    }
}

// ================================================================
// Game Contract Tests
// ================================================================
// A generic suite every ArcadeGame implementation must pass. Game crates
// call these with a fresh instance.

fn contract_surface() -> SurfaceInfo {
    SurfaceInfo {
        width: 400,
        height: 300,
    }
}

fn render_commands(game: &dyn ArcadeGame) -> Vec<DrawCommand> {
    let recording = shared_recording(400, 300);
    let mut surface = RenderSurface::new(Box::new(Rc::clone(&recording)));
    {
        let mut frame = surface.begin_frame();
        game.render(&mut frame).expect("render must succeed");
    }
    recording.borrow().commands().to_vec()
}

/// After `init`, the game reports `Running`.
pub fn contract_init_reports_running(game: &mut dyn ArcadeGame) {
    game.init(contract_surface(), &GameConfig::default())
        .expect("init must succeed with default config");
    assert_eq!(game.status(), GameStatus::Running, "status after init");
}

/// `render` after `init` paints something.
pub fn contract_render_draws(game: &mut dyn ArcadeGame) {
    game.init(contract_surface(), &GameConfig::default())
        .expect("init must succeed");
    let commands = render_commands(game);
    assert!(!commands.is_empty(), "render must issue draw commands");
}

/// Rendering twice without an update produces identical output.
pub fn contract_render_is_pure(game: &mut dyn ArcadeGame) {
    game.init(contract_surface(), &GameConfig::default())
        .expect("init must succeed");
    game.update(FRAME_MS).expect("update must succeed");
    let first = render_commands(game);
    let second = render_commands(game);
    assert_eq!(first, second, "render must not change state");
}

/// Unrecognized input is ignored without error.
pub fn contract_ignores_unknown_input(game: &mut dyn ArcadeGame) {
    game.init(contract_surface(), &GameConfig::default())
        .expect("init must succeed");
    for event in [
        InputEvent::key_down("F13", 0.0),
        InputEvent::key_up("F13", 1.0),
        InputEvent::pointer_down(-5.0, 10_000.0, 2.0),
        InputEvent::pointer_up(0.0, 0.0, 3.0),
    ] {
        game.handle_input(&event)
            .expect("unknown input must not fail");
    }
    game.update(FRAME_MS).expect("update must succeed");
}

/// A zero-length and a clamped-length update are both accepted.
pub fn contract_update_accepts_delta_range(game: &mut dyn ArcadeGame) {
    game.init(contract_surface(), &GameConfig::default())
        .expect("init must succeed");
    game.update(0.0).expect("zero delta");
    game.update(HubConfig::default().clock.max_delta_ms)
        .expect("max delta");
}

/// `dispose` twice is safe.
pub fn contract_dispose_is_idempotent(game: &mut dyn ArcadeGame) {
    game.init(contract_surface(), &GameConfig::default())
        .expect("init must succeed");
    game.dispose();
    game.dispose();
}

/// Resizing keeps the game running and renderable.
pub fn contract_resize_keeps_running(game: &mut dyn ArcadeGame) {
    game.init(contract_surface(), &GameConfig::default())
        .expect("init must succeed");
    game.handle_resize(SurfaceInfo {
        width: 800,
        height: 200,
    });
    assert_eq!(game.status(), GameStatus::Running);
    assert!(!render_commands(game).is_empty());
}

/// The game reports a score once running.
pub fn contract_reports_score(game: &mut dyn ArcadeGame) {
    game.init(contract_surface(), &GameConfig::default())
        .expect("init must succeed");
    assert!(game.score().is_some(), "score must be available after init");
}
