use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::GameError;
use crate::input::InputEvent;
use crate::surface::{Frame, SurfaceInfo};

/// Unique key identifying a registered game.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GameKey(pub String);

impl GameKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for GameKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for GameKey {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for GameKey {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Identifies one activation of a game. Never reused within a hub.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SessionId(pub u64);

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Core trait that every mini-game implements.
///
/// The hub owns scheduling, input delivery and the surface; a game only
/// advances and paints its own private state. Games must not start timers or
/// subscribe to input on their own.
pub trait ArcadeGame {
    /// Display metadata for the shell's game picker.
    fn metadata(&self) -> GameMetadata;

    /// Allocate private state. Called once, before any other hook.
    fn init(&mut self, surface: SurfaceInfo, config: &GameConfig) -> Result<(), GameError>;

    /// Advance the simulation by `dt_ms`. Must not draw.
    fn update(&mut self, dt_ms: f64) -> Result<(), GameError>;

    /// Paint the current state. Takes `&self`: rendering cannot change gameplay.
    fn render(&self, frame: &mut Frame<'_>) -> Result<(), GameError>;

    /// React to one normalized input event.
    fn handle_input(&mut self, event: &InputEvent) -> Result<(), GameError>;

    /// Called when the surface size changes while the game is active.
    fn handle_resize(&mut self, _surface: SurfaceInfo) {}

    /// Polled by the hub after each frame.
    fn status(&self) -> GameStatus;

    /// Current score, read back by the shell when a session ends.
    fn score(&self) -> Option<i64> {
        None
    }

    /// Release everything this instance holds. Must be safe to call twice.
    fn dispose(&mut self);
}

/// Game metadata for the shell's selection screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameMetadata {
    pub display_name: String,
    pub description: String,
}

impl GameMetadata {
    pub fn new(display_name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            description: description.into(),
        }
    }
}

/// Opaque per-session configuration passed in by the shell.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GameConfig {
    /// Best score previously recorded by the shell, if any.
    pub high_score: Option<i64>,
    pub custom: HashMap<String, serde_json::Value>,
}

impl GameConfig {
    pub fn custom_u64(&self, key: &str) -> Option<u64> {
        self.custom.get(key).and_then(serde_json::Value::as_u64)
    }

    pub fn custom_f64(&self, key: &str) -> Option<f64> {
        self.custom.get(key).and_then(serde_json::Value::as_f64)
    }
}

/// Declared state of a game instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameStatus {
    Running,
    Paused,
    Won,
    Lost,
}

impl GameStatus {
    /// Won or lost: the session is over.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Won | Self::Lost)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn terminal_statuses() {
        assert!(!GameStatus::Running.is_terminal());
        assert!(!GameStatus::Paused.is_terminal());
        assert!(GameStatus::Won.is_terminal());
        assert!(GameStatus::Lost.is_terminal());
    }

    #[test]
    fn game_key_serializes_as_plain_string() {
        let key = GameKey::from("merge");
        assert_eq!(serde_json::to_string(&key).unwrap(), "\"merge\"");
        assert_eq!(key.to_string(), "merge");
    }

    #[test]
    fn custom_config_accessors() {
        let mut config = GameConfig::default();
        config.custom.insert("seed".into(), json!(42));
        config.custom.insert("speed".into(), json!(1.5));
        assert_eq!(config.custom_u64("seed"), Some(42));
        assert_eq!(config.custom_f64("speed"), Some(1.5));
        assert_eq!(config.custom_u64("missing"), None);
    }
}
