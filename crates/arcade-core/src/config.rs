use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Default config file looked up by [`HubConfig::load`].
pub const CONFIG_FILE: &str = "arcade.toml";

/// Top-level runtime configuration, loaded from `arcade.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HubConfig {
    pub clock: ClockConfig,
    pub input: InputConfig,
    pub hub: LifecycleConfig,
}

/// Frame timing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClockConfig {
    /// Upper bound on the delta reported to `update`, in milliseconds.
    pub max_delta_ms: f64,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            max_delta_ms: 100.0,
        }
    }
}

/// Input normalization and queueing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// Deliver auto-repeated key-down events to games.
    pub forward_key_repeat: bool,
    /// Events buffered between frames before the oldest is dropped.
    pub max_queued_events: usize,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            forward_key_repeat: false,
            max_queued_events: 256,
        }
    }
}

/// Session lifecycle policy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LifecycleConfig {
    /// How long a won/lost game stays on screen before teardown. Zero tears
    /// down in the same frame the terminal status is observed.
    pub end_grace_ms: f64,
}

impl HubConfig {
    /// Check value ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.clock.max_delta_ms.is_finite() && self.clock.max_delta_ms > 0.0) {
            return Err(ConfigError::Invalid {
                field: "clock.max_delta_ms",
                reason: format!("must be > 0, got {}", self.clock.max_delta_ms),
            });
        }
        if self.input.max_queued_events == 0 {
            return Err(ConfigError::Invalid {
                field: "input.max_queued_events",
                reason: "must be > 0".to_string(),
            });
        }
        if !(self.hub.end_grace_ms.is_finite() && self.hub.end_grace_ms >= 0.0) {
            return Err(ConfigError::Invalid {
                field: "hub.end_grace_ms",
                reason: format!("must be >= 0, got {}", self.hub.end_grace_ms),
            });
        }
        Ok(())
    }

    /// Parse a TOML document.
    pub fn from_toml(content: &str, path: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: path.to_string(),
            source,
        })
    }

    /// Read and parse a specific file, then apply environment overrides.
    pub fn load_from(path: &str) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_string(),
            source,
        })?;
        let mut config = Self::from_toml(&content, path)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Load `arcade.toml` if present, falling back to defaults, then apply
    /// environment overrides.
    pub fn load() -> Self {
        let mut config = match std::fs::read_to_string(CONFIG_FILE) {
            Ok(content) => match Self::from_toml(&content, CONFIG_FILE) {
                Ok(cfg) => {
                    tracing::info!("Loaded configuration from {CONFIG_FILE}");
                    cfg
                },
                Err(e) => {
                    tracing::warn!("{e}, using defaults");
                    Self::default()
                },
            },
            Err(_) => {
                tracing::info!("No {CONFIG_FILE} found, using defaults");
                Self::default()
            },
        };
        config.apply_env_overrides();

        if let Err(e) = config.validate() {
            tracing::warn!("{e}, using defaults");
            return Self::default();
        }
        config
    }

    /// Apply `ARCADE_*` environment variable overrides.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("ARCADE_MAX_DELTA_MS")
            && let Ok(n) = val.parse::<f64>()
        {
            self.clock.max_delta_ms = n;
        }
        if let Ok(val) = std::env::var("ARCADE_END_GRACE_MS")
            && let Ok(n) = val.parse::<f64>()
        {
            self.hub.end_grace_ms = n;
        }
        if let Ok(val) = std::env::var("ARCADE_FORWARD_KEY_REPEAT")
            && let Ok(b) = val.parse::<bool>()
        {
            self.input.forward_key_repeat = b;
        }
        if let Ok(val) = std::env::var("ARCADE_MAX_QUEUED_EVENTS")
            && let Ok(n) = val.parse::<usize>()
        {
            self.input.max_queued_events = n;
        }
    }
}
