use std::collections::HashMap;

use serde::Serialize;
use serde_json::json;

use arcade_core::config::{HubConfig, LifecycleConfig};
use arcade_core::error::HubError;
use arcade_core::game_registry::GameDescriptor;
use arcade_core::game_trait::{GameConfig, GameKey, SessionId};
use arcade_core::hub::{EndReason, HubController, HubEvent};

/// How long a won or lost game stays on screen before the hub tears it down.
pub const END_GRACE_MS: f64 = 1_500.0;

/// Hub configuration for the browser: defaults, plus an end-of-session grace
/// so the final banner is visible.
pub fn client_config() -> HubConfig {
    HubConfig {
        hub: LifecycleConfig {
            end_grace_ms: END_GRACE_MS,
        },
        ..HubConfig::default()
    }
}

/// Payload handed to the shell's `_arcadeSessionEnded` callback.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionEnd {
    pub key: String,
    pub session: u64,
    pub reason: &'static str,
    pub score: Option<i64>,
    pub best: Option<i64>,
    pub fault: Option<String>,
}

/// Browser-side application state: the hub plus the best scores the shell
/// has told us about.
pub struct App {
    pub hub: HubController,
    best: HashMap<GameKey, i64>,
    pub prev_timestamp: f64,
    frames_skipped: u64,
}

impl App {
    pub fn new(hub: HubController) -> Self {
        Self {
            hub,
            best: HashMap::new(),
            prev_timestamp: 0.0,
            frames_skipped: 0,
        }
    }

    /// Register every game compiled into this build.
    pub fn register_builtin(&mut self) -> Result<(), HubError> {
        for descriptor in builtin_games() {
            self.hub.register_game(descriptor)?;
        }
        Ok(())
    }

    /// Seed the best score for `key`, typically loaded from storage by the shell.
    pub fn set_high_score(&mut self, key: impl Into<GameKey>, score: i64) {
        self.best.insert(key.into(), score);
    }

    pub fn high_score(&self, key: &GameKey) -> Option<i64> {
        self.best.get(key).copied()
    }

    /// Start a fresh session of `key` with the known best score and `seed`.
    pub fn select(&mut self, key: &str, seed: u64) -> Result<SessionId, HubError> {
        let key = GameKey::from(key);
        let mut config = GameConfig {
            high_score: self.high_score(&key),
            ..GameConfig::default()
        };
        config.custom.insert("seed".into(), json!(seed));
        self.hub.set_game_config(key.clone(), config);
        self.hub.select_game(key)
    }

    /// Animation-frame entry point. `scheduled_epoch` is the clock epoch
    /// captured when the frame was requested; a frame requested before the
    /// clock was last stopped is skipped.
    pub fn on_frame(&mut self, now_ms: f64, scheduled_epoch: u64) -> Vec<SessionEnd> {
        self.prev_timestamp = now_ms;
        if scheduled_epoch != self.hub.clock().epoch() {
            self.frames_skipped += 1;
            return self.take_session_ends();
        }
        self.hub.frame(now_ms);
        self.take_session_ends()
    }

    pub fn frames_skipped(&self) -> u64 {
        self.frames_skipped
    }

    /// Drain hub events, keeping only finished sessions. Best scores are
    /// raised in place so the next selection starts from them.
    pub fn take_session_ends(&mut self) -> Vec<SessionEnd> {
        let mut ended = Vec::new();
        for event in self.hub.drain_events() {
            let HubEvent::SessionEnded {
                key,
                session,
                reason,
                score,
            } = event
            else {
                continue;
            };
            if let Some(score) = score {
                let best = self.best.entry(key.clone()).or_insert(score);
                *best = (*best).max(score);
            }
            let fault = match &reason {
                EndReason::Faulted(e) => Some(e.to_string()),
                _ => None,
            };
            ended.push(SessionEnd {
                best: self.high_score(&key),
                key: key.0,
                session: session.0,
                reason: reason.label(),
                score,
                fault,
            });
        }
        ended
    }

    /// Snapshot of the registry for the shell's game picker.
    pub fn games_json(&self) -> serde_json::Value {
        let games: Vec<_> = self
            .hub
            .list_available_games()
            .into_iter()
            .map(|g| {
                json!({
                    "key": g.key.0,
                    "displayName": g.metadata.display_name,
                    "description": g.metadata.description,
                    "best": self.best.get(&g.key),
                })
            })
            .collect();
        serde_json::Value::Array(games)
    }
}

/// Games compiled into this build, selected by cargo features.
pub fn builtin_games() -> Vec<GameDescriptor> {
    #[allow(unused_mut)]
    let mut games = Vec::new();
    #[cfg(feature = "snake")]
    games.push(GameDescriptor::of::<arcade_snake::SnakeGame>("snake"));
    #[cfg(feature = "merge")]
    games.push(GameDescriptor::of::<arcade_merge::MergeGame>("merge"));
    games
}
