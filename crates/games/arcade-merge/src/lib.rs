pub mod board;
pub mod config;

use rand::SeedableRng;
use rand::rngs::StdRng;

use arcade_core::error::GameError;
use arcade_core::game_trait::{ArcadeGame, GameConfig, GameMetadata, GameStatus};
use arcade_core::input::{InputEvent, InputKind};
use arcade_core::surface::{Frame, Rgba, SurfaceInfo, SurfacePoint, TextAlign};

use board::{Grid, Move};
use config::MergeConfig;

const HUD_HEIGHT: f32 = 36.0;
const GAP: f32 = 8.0;

const BACKGROUND: Rgba = Rgba::rgb(250, 248, 239);
const BOARD: Rgba = Rgba::rgb(187, 173, 160);
const EMPTY_TILE: Rgba = Rgba::rgb(205, 193, 180);
const DARK_TEXT: Rgba = Rgba::rgb(119, 110, 101);
const LIGHT_TEXT: Rgba = Rgba::rgb(249, 246, 242);
const SPAWN_OUTLINE: Rgba = Rgba::rgb(255, 220, 90);
const OVERLAY: Rgba = Rgba::rgba(238, 228, 218, 186);

fn tile_color(value: u32) -> Rgba {
    match value {
        2 => Rgba::rgb(238, 228, 218),
        4 => Rgba::rgb(237, 224, 200),
        8 => Rgba::rgb(242, 177, 121),
        16 => Rgba::rgb(245, 149, 99),
        32 => Rgba::rgb(246, 124, 95),
        64 => Rgba::rgb(246, 94, 59),
        128 => Rgba::rgb(237, 207, 114),
        256 => Rgba::rgb(237, 204, 97),
        512 => Rgba::rgb(237, 200, 80),
        1024 => Rgba::rgb(237, 197, 63),
        2048 => Rgba::rgb(237, 194, 46),
        _ => Rgba::rgb(60, 58, 50),
    }
}

/// 2048-style sliding tile puzzle.
pub struct MergeGame {
    base_config: MergeConfig,
    config: MergeConfig,
    grid: Option<Grid>,
    rng: StdRng,
    surface: SurfaceInfo,
    score: i64,
    high_score: Option<i64>,
    status: GameStatus,
    moves: u32,
    swipe_start: Option<SurfacePoint>,
    /// Index of the most recently spawned tile and its remaining highlight time.
    spawned: Option<(usize, f64)>,
}

impl MergeGame {
    pub fn new() -> Self {
        Self::with_config(MergeConfig::load())
    }

    pub fn with_config(config: MergeConfig) -> Self {
        Self {
            rng: StdRng::seed_from_u64(config.seed),
            base_config: config.clone(),
            config,
            grid: None,
            surface: SurfaceInfo {
                width: 0,
                height: 0,
            },
            score: 0,
            high_score: None,
            status: GameStatus::Running,
            moves: 0,
            swipe_start: None,
            spawned: None,
        }
    }

    pub fn grid(&self) -> Option<&Grid> {
        self.grid.as_ref()
    }

    pub fn moves(&self) -> u32 {
        self.moves
    }

    /// Slide the board. A move that changes nothing spawns nothing.
    pub fn play(&mut self, mv: Move) {
        if self.status != GameStatus::Running {
            return;
        }
        let Some(grid) = self.grid.as_mut() else {
            return;
        };
        let result = grid.apply(mv);
        if !result.moved {
            return;
        }
        self.moves += 1;
        self.score += i64::from(result.gained);

        if grid.max_tile() >= self.config.win_tile {
            tracing::debug!(score = self.score, moves = self.moves, "merge reached win tile");
            self.status = GameStatus::Won;
            return;
        }
        self.spawned = grid
            .spawn(&mut self.rng, self.config.four_chance)
            .map(|idx| (idx, self.config.spawn_flash_ms));
        if !grid.can_move() {
            tracing::debug!(score = self.score, moves = self.moves, "merge board locked");
            self.status = GameStatus::Lost;
        }
    }

    /// Square board area centered under the score strip: (x, y, side).
    fn board_rect(&self) -> (f32, f32, f32) {
        let w = self.surface.width as f32;
        let h = (self.surface.height as f32 - HUD_HEIGHT).max(0.0);
        let side = w.min(h) - 2.0 * GAP;
        let side = side.max(0.0);
        ((w - side) / 2.0, HUD_HEIGHT + (h - side) / 2.0, side)
    }
}

impl Default for MergeGame {
    fn default() -> Self {
        Self::with_config(MergeConfig::default())
    }
}

impl ArcadeGame for MergeGame {
    fn metadata(&self) -> GameMetadata {
        GameMetadata::new("Merge", "Slide tiles, combine equal numbers, reach 2048.")
    }

    fn init(&mut self, surface: SurfaceInfo, session: &GameConfig) -> Result<(), GameError> {
        let config = self
            .base_config
            .with_overrides(session)
            .map_err(GameError::new)?;
        config.check().map_err(GameError::new)?;

        let mut rng = StdRng::seed_from_u64(config.seed);
        let mut grid = Grid::new(config.board_size);
        for _ in 0..config.start_tiles {
            grid.spawn(&mut rng, config.four_chance);
        }

        self.rng = rng;
        self.grid = Some(grid);
        self.surface = surface;
        self.score = 0;
        self.high_score = session.high_score;
        self.status = GameStatus::Running;
        self.moves = 0;
        self.swipe_start = None;
        self.spawned = None;
        tracing::debug!(size = config.board_size, seed = config.seed, "merge initialized");
        self.config = config;
        Ok(())
    }

    fn update(&mut self, dt_ms: f64) -> Result<(), GameError> {
        if self.grid.is_none() {
            return Err(GameError::new("merge updated without a board"));
        }
        if let Some((_, remaining)) = self.spawned.as_mut() {
            *remaining -= dt_ms;
            if *remaining <= 0.0 {
                self.spawned = None;
            }
        }
        Ok(())
    }

    fn render(&self, frame: &mut Frame<'_>) -> Result<(), GameError> {
        let Some(grid) = self.grid.as_ref() else {
            return Err(GameError::new("merge rendered without a board"));
        };
        let size = frame.size();
        let (bx, by, side) = self.board_rect();
        let n = grid.size() as f32;
        let tile = ((side - GAP * (n + 1.0)) / n).max(1.0);

        frame.fill(BACKGROUND);
        frame.fill_rect(bx, by, side, side, BOARD);

        for (idx, &value) in grid.cells().iter().enumerate() {
            let x = bx + GAP + (idx % grid.size()) as f32 * (tile + GAP);
            let y = by + GAP + (idx / grid.size()) as f32 * (tile + GAP);
            if value == 0 {
                frame.fill_rect(x, y, tile, tile, EMPTY_TILE);
                continue;
            }
            frame.fill_rect(x, y, tile, tile, tile_color(value));
            let text_color = if value <= 4 { DARK_TEXT } else { LIGHT_TEXT };
            let digits = value.to_string();
            let font = tile * if digits.len() <= 2 { 0.5 } else { 0.35 };
            frame.text(
                x + tile / 2.0,
                y + tile / 2.0 + font / 3.0,
                digits,
                font,
                TextAlign::Center,
                text_color,
            );
            if matches!(self.spawned, Some((spawned, _)) if spawned == idx) {
                frame.stroke_rect(x, y, tile, tile, 3.0, SPAWN_OUTLINE);
            }
        }

        frame.text(
            GAP,
            24.0,
            format!("Score {}", self.score),
            20.0,
            TextAlign::Left,
            DARK_TEXT,
        );
        if let Some(best) = self.high_score {
            frame.text(
                size.width as f32 - GAP,
                24.0,
                format!("Best {}", best.max(self.score)),
                20.0,
                TextAlign::Right,
                DARK_TEXT,
            );
        }

        let banner = match self.status {
            GameStatus::Won => Some("You made it!"),
            GameStatus::Lost => Some("No moves left"),
            GameStatus::Running | GameStatus::Paused => None,
        };
        if let Some(banner) = banner {
            frame.fill_rect(bx, by, side, side, OVERLAY);
            frame.text(
                bx + side / 2.0,
                by + side / 2.0,
                banner,
                30.0,
                TextAlign::Center,
                DARK_TEXT,
            );
        }
        Ok(())
    }

    fn handle_input(&mut self, event: &InputEvent) -> Result<(), GameError> {
        match &event.kind {
            InputKind::KeyDown(code) => {
                if let Some(mv) = Move::from_key(code) {
                    self.play(mv);
                }
            },
            InputKind::PointerDown(point) => self.swipe_start = Some(*point),
            InputKind::PointerUp(end) => {
                if let Some(start) = self.swipe_start.take()
                    && let Some(mv) =
                        Move::from_swipe(end.x - start.x, end.y - start.y, self.config.min_swipe_px)
                {
                    self.play(mv);
                }
            },
            InputKind::PointerMove(_) | InputKind::KeyUp(_) => {},
        }
        Ok(())
    }

    fn handle_resize(&mut self, surface: SurfaceInfo) {
        self.surface = surface;
    }

    fn status(&self) -> GameStatus {
        self.status
    }

    fn score(&self) -> Option<i64> {
        Some(self.score)
    }

    fn dispose(&mut self) {
        if self.grid.take().is_some() {
            tracing::debug!(score = self.score, moves = self.moves, "merge disposed");
        }
        self.swipe_start = None;
        self.spawned = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arcade_core::test_helpers::*;
    use serde_json::json;

    const SURFACE: SurfaceInfo = SurfaceInfo {
        width: 400,
        height: 436,
    };

    fn started_with(cells: Vec<u32>) -> MergeGame {
        let mut game = MergeGame::default();
        game.init(SURFACE, &GameConfig::default()).unwrap();
        game.grid = Grid::from_cells(cells);
        game
    }

    fn key(code: &str) -> InputEvent {
        InputEvent::key_down(code, 0.0)
    }

    // ================================================================
    // Contract suite
    // ================================================================

    #[test]
    fn contract_init() {
        contract_init_reports_running(&mut MergeGame::default());
    }

    #[test]
    fn contract_render() {
        contract_render_draws(&mut MergeGame::default());
    }

    #[test]
    fn contract_render_pure() {
        contract_render_is_pure(&mut MergeGame::default());
    }

    #[test]
    fn contract_unknown_input() {
        contract_ignores_unknown_input(&mut MergeGame::default());
    }

    #[test]
    fn contract_delta_range() {
        contract_update_accepts_delta_range(&mut MergeGame::default());
    }

    #[test]
    fn contract_dispose() {
        contract_dispose_is_idempotent(&mut MergeGame::default());
    }

    #[test]
    fn contract_resize() {
        contract_resize_keeps_running(&mut MergeGame::default());
    }

    #[test]
    fn contract_score() {
        contract_reports_score(&mut MergeGame::default());
    }

    // ================================================================
    // Gameplay
    // ================================================================

    #[test]
    fn init_places_start_tiles() {
        let mut game = MergeGame::default();
        game.init(SURFACE, &GameConfig::default()).unwrap();
        let grid = game.grid().unwrap();
        assert_eq!(grid.empty_count(), 16 - 2);
        assert!(grid.cells().iter().all(|&v| matches!(v, 0 | 2 | 4)));
    }

    #[test]
    fn arrow_key_slides_merges_and_spawns() {
        #[rustfmt::skip]
        let mut game = started_with(vec![
            2, 2, 0, 0,
            0, 0, 0, 0,
            0, 0, 0, 0,
            0, 0, 0, 0,
        ]);
        game.handle_input(&key("ArrowLeft")).unwrap();
        let grid = game.grid().unwrap();
        assert_eq!(grid.get(0, 0), 4);
        assert_eq!(grid.empty_count(), 14, "merged pair plus one spawned tile");
        assert_eq!(game.score(), Some(4));
        assert_eq!(game.moves(), 1);
    }

    #[test]
    fn blocked_move_spawns_nothing() {
        #[rustfmt::skip]
        let mut game = started_with(vec![
            2, 0, 0, 0,
            0, 0, 0, 0,
            0, 0, 0, 0,
            0, 0, 0, 0,
        ]);
        game.handle_input(&key("ArrowLeft")).unwrap();
        game.handle_input(&key("ArrowUp")).unwrap();
        assert_eq!(game.grid().unwrap().empty_count(), 15);
        assert_eq!(game.moves(), 0);
    }

    #[test]
    fn swipe_moves_board() {
        #[rustfmt::skip]
        let mut game = started_with(vec![
            2, 0, 0, 0,
            0, 0, 0, 0,
            0, 0, 0, 0,
            0, 0, 0, 0,
        ]);
        game.handle_input(&InputEvent::pointer_down(100.0, 200.0, 0.0))
            .unwrap();
        game.handle_input(&InputEvent::pointer_up(300.0, 210.0, 1.0))
            .unwrap();
        assert_eq!(game.grid().unwrap().get(3, 0), 2);
        assert_eq!(game.moves(), 1);
    }

    #[test]
    fn short_drag_is_not_a_swipe() {
        let mut game = started_with(vec![2, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]);
        game.handle_input(&InputEvent::pointer_down(100.0, 200.0, 0.0))
            .unwrap();
        game.handle_input(&InputEvent::pointer_up(105.0, 200.0, 1.0))
            .unwrap();
        assert_eq!(game.moves(), 0);
    }

    #[test]
    fn reaching_win_tile_wins() {
        let mut game = MergeGame::default();
        let mut config = GameConfig::default();
        config.custom.insert("win_tile".into(), json!(8));
        game.init(SURFACE, &config).unwrap();
        #[rustfmt::skip]
        let cells = vec![
            4, 4, 0, 0,
            0, 0, 0, 0,
            0, 0, 0, 0,
            0, 0, 0, 0,
        ];
        game.grid = Grid::from_cells(cells);
        game.play(Move::Left);
        assert_eq!(game.status(), GameStatus::Won);
    }

    #[test]
    fn locked_board_loses() {
        // After sliding right the only gap is top-left, between an 8 and a
        // 16, so neither a spawned 2 nor a 4 can pair with anything.
        let mut game = started_with(vec![8, 0, 16, 32]);
        game.play(Move::Right);
        let grid = game.grid().unwrap();
        assert_eq!(grid.empty_count(), 0);
        assert!(!grid.can_move());
        assert_eq!(game.status(), GameStatus::Lost);
    }

    #[test]
    fn input_after_terminal_is_ignored() {
        let mut game = started_with(vec![2, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]);
        game.status = GameStatus::Lost;
        game.handle_input(&key("ArrowRight")).unwrap();
        assert_eq!(game.moves(), 0);
    }

    #[test]
    fn spawn_highlight_fades() {
        let mut game = started_with(vec![2, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]);
        game.play(Move::Right);
        assert!(game.spawned.is_some());
        game.update(100.0).unwrap();
        assert!(game.spawned.is_some());
        game.update(100.0).unwrap();
        assert!(game.spawned.is_none());
    }

    #[test]
    fn dispose_releases_board() {
        let mut game = started_with(vec![2, 0, 0, 0]);
        game.dispose();
        assert!(game.grid().is_none());
        assert!(game.update(16.0).is_err());
    }

    #[test]
    fn plays_through_hub_until_locked_or_exited() {
        use arcade_core::game_registry::GameDescriptor;
        use arcade_core::hub::HubPhase;
        use arcade_core::input::RawInput;
        use arcade_core::time::{ManualTime, TimeSource};

        let (mut hub, _) = test_hub(arcade_core::config::HubConfig::default());
        hub.register_game(GameDescriptor::of::<MergeGame>("merge"))
            .unwrap();
        hub.select_game("merge").unwrap();

        let time = ManualTime::new(0.0);
        let codes = ["ArrowLeft", "ArrowUp", "ArrowRight", "ArrowDown"];
        for i in 0..200 {
            if hub.phase() != HubPhase::Running {
                break;
            }
            hub.push_input(&RawInput::Key {
                code: codes[i % codes.len()].to_string(),
                pressed: true,
                repeat: false,
                timestamp_ms: time.now_ms(),
            });
            run_frames(&mut hub, &time, 1, FRAME_MS);
        }
        if hub.phase() == HubPhase::Running {
            assert!(hub.active_score().is_some());
            assert!(hub.exit_active());
        }
        assert_eq!(hub.phase(), HubPhase::Idle);
    }
}
