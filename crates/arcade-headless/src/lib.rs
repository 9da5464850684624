//! Native driver for the arcade hub: a simulated clock, scripted key input
//! and a recording surface in place of the browser.

pub mod runner;
pub mod script;

use arcade_core::error::GameError;
use arcade_core::game_registry::GameDescriptor;
use arcade_core::game_trait::ArcadeGame;
use arcade_merge::MergeGame;
use arcade_snake::SnakeGame;

pub use runner::{RunOptions, RunReport, SessionSummary, recording_hub, run, run_on};
pub use script::{ScriptError, ScriptedKey, parse_script};

/// The games shipped with the runtime. Each activation loads the game's own
/// config file, so edits take effect on the next selection.
pub fn builtin_games() -> Vec<GameDescriptor> {
    vec![
        GameDescriptor::new(
            "snake",
            SnakeGame::default().metadata(),
            || -> Result<Box<dyn ArcadeGame>, GameError> { Ok(Box::new(SnakeGame::new())) },
        ),
        GameDescriptor::new(
            "merge",
            MergeGame::default().metadata(),
            || -> Result<Box<dyn ArcadeGame>, GameError> { Ok(Box::new(MergeGame::new())) },
        ),
    ]
}

