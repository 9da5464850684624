use serde::{Deserialize, Serialize};

use arcade_core::game_trait::GameConfig;

/// Largest board side, in cells.
pub const MAX_GRID: u32 = 64;

/// Shortest move interval any config may ask for (ms).
pub const MIN_STEP_FLOOR_MS: f64 = 1.0;

/// Data-driven configuration for the snake game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnakeConfig {
    /// Board width in cells.
    pub grid_width: u32,
    /// Board height in cells.
    pub grid_height: u32,
    /// Snake length at the start of a session.
    pub initial_length: u32,
    /// Time between moves at the start of a session (ms).
    pub step_ms: f64,
    /// Fastest allowed move interval (ms).
    pub min_step_ms: f64,
    /// Move interval reduction per food eaten (ms).
    pub speedup_per_food_ms: f64,
    /// Points per food.
    pub food_points: i64,
    /// Wrap around the board edges instead of dying on them.
    pub wrap_walls: bool,
    /// Turns buffered ahead of the next move.
    pub max_queued_turns: usize,
    /// RNG seed used when the session config does not carry one.
    pub seed: u64,
}

impl Default for SnakeConfig {
    fn default() -> Self {
        Self {
            grid_width: 20,
            grid_height: 15,
            initial_length: 3,
            step_ms: 140.0,
            min_step_ms: 60.0,
            speedup_per_food_ms: 4.0,
            food_points: 10,
            wrap_walls: false,
            max_queued_turns: 2,
            seed: 0x5eed,
        }
    }
}

impl SnakeConfig {
    /// Load config from environment or TOML file, falling back to defaults.
    pub fn load() -> Self {
        if let Ok(path) = std::env::var("ARCADE_SNAKE_CONFIG")
            && let Ok(contents) = std::fs::read_to_string(&path)
            && let Ok(config) = toml::from_str::<Self>(&contents)
        {
            return config;
        }
        if let Ok(contents) = std::fs::read_to_string("config/snake.toml")
            && let Ok(config) = toml::from_str::<Self>(&contents)
        {
            return config;
        }
        Self::default()
    }

    /// Apply per-session overrides from the shell's `GameConfig.custom`.
    pub fn with_overrides(&self, session: &GameConfig) -> Result<Self, String> {
        let mut config = self.clone();
        if let Some(seed) = session.custom_u64("seed") {
            config.seed = seed;
        }
        if let Some(w) = session.custom_u64("grid_width") {
            config.grid_width =
                u32::try_from(w).map_err(|_| format!("grid width {w} out of range"))?;
        }
        if let Some(h) = session.custom_u64("grid_height") {
            config.grid_height =
                u32::try_from(h).map_err(|_| format!("grid height {h} out of range"))?;
        }
        if let Some(step) = session.custom_f64("step_ms") {
            config.step_ms = step;
        }
        if let Some(wrap) = session.custom.get("wrap_walls").and_then(|v| v.as_bool()) {
            config.wrap_walls = wrap;
        }
        Ok(config)
    }

    /// Reject boards the snake cannot start on, and move rates that would
    /// stall a frame.
    pub fn check(&self) -> Result<(), String> {
        if self.grid_width < 4 || self.grid_height < 4 {
            return Err(format!(
                "grid {}x{} is too small, need at least 4x4",
                self.grid_width, self.grid_height
            ));
        }
        if self.grid_width > MAX_GRID || self.grid_height > MAX_GRID {
            return Err(format!(
                "grid {}x{} is too large, at most {MAX_GRID}x{MAX_GRID}",
                self.grid_width, self.grid_height
            ));
        }
        if self.initial_length == 0 || self.initial_length > self.grid_width / 2 {
            return Err(format!(
                "initial length {} does not fit a {}-wide grid",
                self.initial_length, self.grid_width
            ));
        }
        if !(self.min_step_ms.is_finite() && self.min_step_ms >= MIN_STEP_FLOOR_MS) {
            return Err(format!(
                "min step {} ms must be at least {MIN_STEP_FLOOR_MS} ms",
                self.min_step_ms
            ));
        }
        if !(self.step_ms.is_finite() && self.step_ms >= self.min_step_ms) {
            return Err(format!(
                "step {} ms must be at least the min step {} ms",
                self.step_ms, self.min_step_ms
            ));
        }
        Ok(())
    }
}
