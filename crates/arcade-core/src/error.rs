use crate::game_trait::GameKey;

/// Errors surfaced by the hub's public API.
///
/// `UnknownGame`, `DuplicateGameKey` and `GameInit` are returned to the shell.
/// `RuntimeFault` is contained inside the hub: it is logged, attached to the
/// session's end reason and never returned from a public call.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum HubError {
    #[error("unknown game: {0}")]
    UnknownGame(GameKey),

    #[error("a game with key {0} is already registered")]
    DuplicateGameKey(GameKey),

    #[error("game {key} failed to initialize: {reason}")]
    GameInit { key: GameKey, reason: String },

    #[error("game {key} faulted during {stage}: {reason}")]
    RuntimeFault {
        key: GameKey,
        stage: FaultStage,
        reason: String,
    },
}

/// The per-frame call in which a game faulted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultStage {
    Input,
    Update,
    Render,
    Resize,
    Status,
}

impl std::fmt::Display for FaultStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Input => "handle_input",
            Self::Update => "update",
            Self::Render => "render",
            Self::Resize => "handle_resize",
            Self::Status => "status",
        };
        f.write_str(s)
    }
}

/// Error type returned by game implementations from their lifecycle hooks.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct GameError {
    message: String,
}

impl GameError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Configuration file problems.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid config value {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hub_error_messages_name_the_game() {
        let err = HubError::UnknownGame(GameKey::from("tetris"));
        assert_eq!(err.to_string(), "unknown game: tetris");

        let err = HubError::RuntimeFault {
            key: GameKey::from("snake"),
            stage: FaultStage::Render,
            reason: "boom".into(),
        };
        assert_eq!(err.to_string(), "game snake faulted during render: boom");
    }

    #[test]
    fn game_error_displays_message() {
        let err = GameError::new("board overflow");
        assert_eq!(err.to_string(), "board overflow");
        assert_eq!(err.message(), "board overflow");
    }
}
