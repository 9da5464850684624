use serde::{Deserialize, Serialize};

use arcade_core::game_trait::GameConfig;

/// Data-driven configuration for the tile-merging game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeConfig {
    /// Tiles per board side.
    pub board_size: usize,
    /// Tile value that wins the session.
    pub win_tile: u32,
    /// Tiles placed before the first move.
    pub start_tiles: usize,
    /// Probability that a spawned tile is a 4 instead of a 2.
    pub four_chance: f64,
    /// Minimum pointer travel for a swipe, in surface pixels.
    pub min_swipe_px: f32,
    /// How long a freshly spawned tile stays highlighted (ms).
    pub spawn_flash_ms: f64,
    /// RNG seed used when the session config does not carry one.
    pub seed: u64,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            board_size: 4,
            win_tile: 2048,
            start_tiles: 2,
            four_chance: 0.1,
            min_swipe_px: 24.0,
            spawn_flash_ms: 150.0,
            seed: 2048,
        }
    }
}

impl MergeConfig {
    /// Load config from environment or TOML file, falling back to defaults.
    pub fn load() -> Self {
        if let Ok(path) = std::env::var("ARCADE_MERGE_CONFIG")
            && let Ok(contents) = std::fs::read_to_string(&path)
            && let Ok(config) = toml::from_str::<Self>(&contents)
        {
            return config;
        }
        if let Ok(contents) = std::fs::read_to_string("config/merge.toml")
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
        if let Some(size) = session.custom_u64("board_size") {
            config.board_size =
                usize::try_from(size).map_err(|_| format!("board size {size} out of range"))?;
        }
        if let Some(win) = session.custom_u64("win_tile") {
            config.win_tile =
                u32::try_from(win).map_err(|_| format!("win tile {win} out of range"))?;
        }
        Ok(config)
    }

    pub fn check(&self) -> Result<(), String> {
        if !(2..=8).contains(&self.board_size) {
            return Err(format!("board size {} outside 2..=8", self.board_size));
        }
        if self.win_tile < 4 || !self.win_tile.is_power_of_two() {
            return Err(format!("win tile {} must be a power of two >= 4", self.win_tile));
        }
        if self.start_tiles > self.board_size * self.board_size {
            return Err(format!("{} start tiles do not fit the board", self.start_tiles));
        }
        if !(0.0..=1.0).contains(&self.four_chance) {
            return Err(format!("four_chance {} outside 0..=1", self.four_chance));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn toml_overrides_single_field() {
        let config: MergeConfig = toml::from_str("win_tile = 512").unwrap();
        assert_eq!(config.win_tile, 512);
        assert_eq!(config.board_size, 4);
    }

    #[test]
    fn session_overrides_apply() {
        let mut session = GameConfig::default();
        session.custom.insert("board_size".into(), json!(5));
        session.custom.insert("seed".into(), json!(3));
        let config = MergeConfig::default().with_overrides(&session).unwrap();
        assert_eq!(config.board_size, 5);
        assert_eq!(config.seed, 3);
    }

    #[test]
    fn out_of_range_win_tile_is_an_error() {
        let mut session = GameConfig::default();
        // Would truncate to 2048 as a u32.
        session
            .custom
            .insert("win_tile".into(), json!((1u64 << 32) + 2048));
        assert!(MergeConfig::default().with_overrides(&session).is_err());
    }

    #[test]
    fn check_rejects_bad_values() {
        assert!(MergeConfig::default().check().is_ok());
        for bad in [
            MergeConfig {
                board_size: 1,
                ..MergeConfig::default()
            },
            MergeConfig {
                win_tile: 100,
                ..MergeConfig::default()
            },
            MergeConfig {
                four_chance: 1.5,
                ..MergeConfig::default()
            },
        ] {
            assert!(bad.check().is_err(), "{bad:?}");
        }
    }
}
