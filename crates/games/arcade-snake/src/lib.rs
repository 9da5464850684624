pub mod board;
pub mod config;

use rand::SeedableRng;
use rand::rngs::StdRng;

use arcade_core::error::GameError;
use arcade_core::game_trait::{ArcadeGame, GameConfig, GameMetadata, GameStatus};
use arcade_core::input::{InputEvent, InputKind};
use arcade_core::surface::{Frame, Rgba, SurfaceInfo, SurfacePoint, TextAlign};

use board::{Board, Cell, Direction, StepOutcome};
use config::SnakeConfig;

/// Moves one `update` may catch up on; time beyond that is dropped.
pub const MAX_STEPS_PER_UPDATE: u32 = 100;

/// Height of the score strip above the board, in surface pixels.
const HUD_HEIGHT: f32 = 28.0;

const BACKGROUND: Rgba = Rgba::rgb(12, 16, 24);
const GRID_BORDER: Rgba = Rgba::rgb(60, 70, 90);
const SNAKE_BODY: Rgba = Rgba::rgb(70, 200, 110);
const SNAKE_HEAD: Rgba = Rgba::rgb(150, 255, 170);
const FOOD: Rgba = Rgba::rgb(240, 80, 80);
const OVERLAY: Rgba = Rgba::rgba(0, 0, 0, 160);

/// Board placement on the surface.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Layout {
    cell: f32,
    origin_x: f32,
    origin_y: f32,
}

impl Layout {
    fn cell_origin(&self, cell: Cell) -> (f32, f32) {
        (
            self.origin_x + cell.x as f32 * self.cell,
            self.origin_y + cell.y as f32 * self.cell,
        )
    }

    fn cell_center(&self, cell: Cell) -> SurfacePoint {
        let (x, y) = self.cell_origin(cell);
        SurfacePoint {
            x: x + self.cell / 2.0,
            y: y + self.cell / 2.0,
        }
    }
}

/// Classic snake on a fixed grid.
pub struct SnakeGame {
    base_config: SnakeConfig,
    config: SnakeConfig,
    board: Option<Board>,
    rng: StdRng,
    surface: SurfaceInfo,
    step_ms: f64,
    accumulator_ms: f64,
    score: i64,
    high_score: Option<i64>,
    status: GameStatus,
}

impl SnakeGame {
    pub fn new() -> Self {
        Self::with_config(SnakeConfig::load())
    }

    pub fn with_config(config: SnakeConfig) -> Self {
        Self {
            rng: StdRng::seed_from_u64(config.seed),
            step_ms: config.step_ms,
            base_config: config.clone(),
            config,
            board: None,
            surface: SurfaceInfo {
                width: 0,
                height: 0,
            },
            accumulator_ms: 0.0,
            score: 0,
            high_score: None,
            status: GameStatus::Running,
        }
    }

    pub fn board(&self) -> Option<&Board> {
        self.board.as_ref()
    }

    pub fn config(&self) -> &SnakeConfig {
        &self.config
    }

    /// Current move interval; shrinks as the snake eats.
    pub fn step_ms(&self) -> f64 {
        self.step_ms
    }

    fn layout(&self, board: &Board) -> Layout {
        let w = self.surface.width as f32;
        let h = (self.surface.height as f32 - HUD_HEIGHT).max(0.0);
        let cell = (w / board.width() as f32)
            .min(h / board.height() as f32)
            .floor()
            .max(1.0);
        let grid_w = cell * board.width() as f32;
        let grid_h = cell * board.height() as f32;
        Layout {
            cell,
            origin_x: ((w - grid_w) / 2.0).max(0.0),
            origin_y: HUD_HEIGHT + ((h - grid_h) / 2.0).max(0.0),
        }
    }

    /// Turn toward a tapped point: across the current axis of travel.
    fn pointer_turn(&self, board: &Board, point: SurfacePoint) -> Option<Direction> {
        let head = self.layout(board).cell_center(board.head());
        if board.planned_heading().is_horizontal() {
            if (point.y - head.y).abs() < f32::EPSILON {
                return None;
            }
            Some(if point.y < head.y {
                Direction::Up
            } else {
                Direction::Down
            })
        } else {
            if (point.x - head.x).abs() < f32::EPSILON {
                return None;
            }
            Some(if point.x < head.x {
                Direction::Left
            } else {
                Direction::Right
            })
        }
    }

    fn toggle_pause(&mut self) {
        self.status = match self.status {
            GameStatus::Running => GameStatus::Paused,
            GameStatus::Paused => GameStatus::Running,
            other => other,
        };
    }

    fn advance(&mut self) {
        let Some(board) = self.board.as_mut() else {
            return;
        };
        match board.step() {
            StepOutcome::Moved => {},
            StepOutcome::Ate => {
                self.score += self.config.food_points;
                self.step_ms = (self.step_ms - self.config.speedup_per_food_ms)
                    .max(self.config.min_step_ms);
                if !board.place_food(&mut self.rng) {
                    tracing::debug!(score = self.score, "snake filled the board");
                    self.status = GameStatus::Won;
                }
            },
            StepOutcome::Crashed => {
                tracing::debug!(score = self.score, length = board.len(), "snake crashed");
                self.status = GameStatus::Lost;
            },
        }
    }
}

impl Default for SnakeGame {
    fn default() -> Self {
        Self::with_config(SnakeConfig::default())
    }
}

impl ArcadeGame for SnakeGame {
    fn metadata(&self) -> GameMetadata {
        GameMetadata::new("Snake", "Eat, grow, and don't bite your own tail.")
    }

    fn init(&mut self, surface: SurfaceInfo, session: &GameConfig) -> Result<(), GameError> {
        let config = self
            .base_config
            .with_overrides(session)
            .map_err(GameError::new)?;
        config.check().map_err(GameError::new)?;

        let mut rng = StdRng::seed_from_u64(config.seed);
        let mut board = Board::new(
            config.grid_width,
            config.grid_height,
            config.initial_length,
            config.wrap_walls,
        );
        board.place_food(&mut rng);

        self.rng = rng;
        self.board = Some(board);
        self.surface = surface;
        self.step_ms = config.step_ms;
        self.accumulator_ms = 0.0;
        self.score = 0;
        self.high_score = session.high_score;
        self.status = GameStatus::Running;
        tracing::debug!(
            width = config.grid_width,
            height = config.grid_height,
            seed = config.seed,
            "snake initialized"
        );
        self.config = config;
        Ok(())
    }

    fn update(&mut self, dt_ms: f64) -> Result<(), GameError> {
        if self.board.is_none() {
            return Err(GameError::new("snake updated without a board"));
        }
        if self.status != GameStatus::Running {
            return Ok(());
        }
        self.accumulator_ms += dt_ms;
        let mut steps = 0;
        while self.accumulator_ms >= self.step_ms && self.status == GameStatus::Running {
            if steps == MAX_STEPS_PER_UPDATE {
                tracing::debug!(dropped_ms = self.accumulator_ms, "snake fell behind");
                self.accumulator_ms = 0.0;
                break;
            }
            self.accumulator_ms -= self.step_ms;
            self.advance();
            steps += 1;
        }
        Ok(())
    }

    fn render(&self, frame: &mut Frame<'_>) -> Result<(), GameError> {
        let Some(board) = self.board.as_ref() else {
            return Err(GameError::new("snake rendered without a board"));
        };
        let layout = self.layout(board);
        let size = frame.size();

        frame.fill(BACKGROUND);
        frame.stroke_rect(
            layout.origin_x,
            layout.origin_y,
            layout.cell * board.width() as f32,
            layout.cell * board.height() as f32,
            2.0,
            GRID_BORDER,
        );

        if let Some(food) = board.food() {
            let c = layout.cell_center(food);
            frame.fill_circle(c.x, c.y, layout.cell * 0.4, FOOD);
        }

        let inset = (layout.cell * 0.08).max(0.5);
        for (i, cell) in board.snake().iter().enumerate() {
            let (x, y) = layout.cell_origin(*cell);
            let color = if i == 0 { SNAKE_HEAD } else { SNAKE_BODY };
            frame.fill_rect(
                x + inset,
                y + inset,
                layout.cell - 2.0 * inset,
                layout.cell - 2.0 * inset,
                color,
            );
        }

        frame.text(
            8.0,
            20.0,
            format!("Score {}", self.score),
            18.0,
            TextAlign::Left,
            Rgba::WHITE,
        );
        if let Some(best) = self.high_score {
            frame.text(
                size.width as f32 - 8.0,
                20.0,
                format!("Best {}", best.max(self.score)),
                18.0,
                TextAlign::Right,
                Rgba::WHITE,
            );
        }

        let banner = match self.status {
            GameStatus::Running => None,
            GameStatus::Paused => Some("Paused"),
            GameStatus::Won => Some("Board cleared!"),
            GameStatus::Lost => Some("Game over"),
        };
        if let Some(banner) = banner {
            frame.fill_rect(0.0, 0.0, size.width as f32, size.height as f32, OVERLAY);
            frame.text(
                size.width as f32 / 2.0,
                size.height as f32 / 2.0,
                banner,
                32.0,
                TextAlign::Center,
                Rgba::WHITE,
            );
        }
        Ok(())
    }

    fn handle_input(&mut self, event: &InputEvent) -> Result<(), GameError> {
        if self.status.is_terminal() {
            return Ok(());
        }
        match &event.kind {
            InputKind::KeyDown(code) if code == "Space" || code == "KeyP" => {
                self.toggle_pause();
            },
            InputKind::KeyDown(code) if self.status == GameStatus::Running => {
                if let (Some(dir), Some(board)) = (Direction::from_key(code), self.board.as_mut()) {
                    board.queue_turn(dir, self.config.max_queued_turns);
                }
            },
            InputKind::PointerDown(point) if self.status == GameStatus::Running => {
                let turn = self
                    .board
                    .as_ref()
                    .and_then(|board| self.pointer_turn(board, *point));
                if let (Some(dir), Some(board)) = (turn, self.board.as_mut()) {
                    board.queue_turn(dir, self.config.max_queued_turns);
                }
            },
            _ => {},
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
        if self.board.take().is_some() {
            tracing::debug!(score = self.score, "snake disposed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arcade_core::test_helpers::*;
    use serde_json::json;

    const SURFACE: SurfaceInfo = SurfaceInfo {
        width: 400,
        height: 328,
    };

    fn seeded(seed: u64) -> GameConfig {
        let mut config = GameConfig::default();
        config.custom.insert("seed".into(), json!(seed));
        config
    }

    fn started() -> SnakeGame {
        let mut game = SnakeGame::default();
        game.init(SURFACE, &seeded(1)).unwrap();
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
        contract_init_reports_running(&mut SnakeGame::default());
    }

    #[test]
    fn contract_render() {
        contract_render_draws(&mut SnakeGame::default());
    }

    #[test]
    fn contract_render_pure() {
        contract_render_is_pure(&mut SnakeGame::default());
    }

    #[test]
    fn contract_unknown_input() {
        contract_ignores_unknown_input(&mut SnakeGame::default());
    }

    #[test]
    fn contract_delta_range() {
        contract_update_accepts_delta_range(&mut SnakeGame::default());
    }

    #[test]
    fn contract_dispose() {
        contract_dispose_is_idempotent(&mut SnakeGame::default());
    }

    #[test]
    fn contract_resize() {
        contract_resize_keeps_running(&mut SnakeGame::default());
    }

    #[test]
    fn contract_score() {
        contract_reports_score(&mut SnakeGame::default());
    }

    // ================================================================
    // Gameplay
    // ================================================================

    #[test]
    fn moves_once_per_step_interval() {
        let mut game = started();
        let start = game.board().unwrap().head();
        game.update(100.0).unwrap();
        assert_eq!(game.board().unwrap().head(), start);
        game.update(40.0).unwrap();
        assert_eq!(game.board().unwrap().head(), Cell::new(start.x + 1, start.y));
    }

    #[test]
    fn long_update_catches_up_a_bounded_number_of_moves() {
        let mut game = SnakeGame::with_config(SnakeConfig {
            grid_width: 21,
            step_ms: 1.0,
            min_step_ms: 1.0,
            wrap_walls: true,
            ..SnakeConfig::default()
        });
        game.init(SURFACE, &seeded(1)).unwrap();
        let start = game.board().unwrap().head();

        game.update(1e9).unwrap();
        assert_eq!(game.status(), GameStatus::Running);
        let moved = Cell::new((start.x + MAX_STEPS_PER_UPDATE as i32) % 21, start.y);
        assert_eq!(game.board().unwrap().head(), moved);

        // The backlog was dropped rather than carried into the next frame.
        game.update(0.5).unwrap();
        assert_eq!(game.board().unwrap().head(), moved);
    }

    #[test]
    fn arrow_keys_turn() {
        let mut game = started();
        let start = game.board().unwrap().head();
        game.handle_input(&key("ArrowUp")).unwrap();
        game.update(game.step_ms()).unwrap();
        assert_eq!(game.board().unwrap().head(), Cell::new(start.x, start.y - 1));
    }

    #[test]
    fn tap_above_head_turns_up() {
        let mut game = started();
        let start = game.board().unwrap().head();
        game.handle_input(&InputEvent::pointer_down(200.0, 30.0, 0.0))
            .unwrap();
        game.update(game.step_ms()).unwrap();
        assert_eq!(game.board().unwrap().head(), Cell::new(start.x, start.y - 1));
    }

    #[test]
    fn running_into_wall_loses() {
        let mut game = started();
        for _ in 0..20 {
            game.update(game.step_ms()).unwrap();
        }
        assert_eq!(game.status(), GameStatus::Lost);
        let head = game.board().unwrap().head();
        assert_eq!(head.x, game.config().grid_width as i32 - 1);
    }

    #[test]
    fn eating_scores_and_speeds_up() {
        let mut game = started();
        let head = game.board().unwrap().head();
        if let Some(board) = game.board.as_mut() {
            board.set_food(Cell::new(head.x + 1, head.y));
        }
        let before = game.step_ms();
        game.update(before).unwrap();
        assert_eq!(game.score(), Some(10));
        assert_eq!(game.board().unwrap().len(), 4);
        assert!(game.step_ms() < before);
        assert!(game.board().unwrap().food().is_some());
    }

    #[test]
    fn space_toggles_self_pause() {
        let mut game = started();
        let start = game.board().unwrap().head();
        game.handle_input(&key("Space")).unwrap();
        assert_eq!(game.status(), GameStatus::Paused);
        game.update(1_000.0).unwrap();
        assert_eq!(game.board().unwrap().head(), start);
        game.handle_input(&key("Space")).unwrap();
        assert_eq!(game.status(), GameStatus::Running);
    }

    #[test]
    fn same_seed_same_session() {
        let a = started();
        let b = started();
        assert_eq!(a.board().unwrap().food(), b.board().unwrap().food());
    }

    #[test]
    fn invalid_session_config_fails_init() {
        let mut game = SnakeGame::default();
        let mut config = GameConfig::default();
        config.custom.insert("grid_width".into(), json!(2));
        assert!(game.init(SURFACE, &config).is_err());
    }

    #[test]
    fn update_after_dispose_errors() {
        let mut game = started();
        game.dispose();
        assert!(game.board().is_none());
        assert!(game.update(16.0).is_err());
    }

    #[test]
    fn board_fits_surface() {
        let game = started();
        let board = game.board().unwrap();
        let layout = game.layout(board);
        assert_eq!(layout.cell, 20.0);
        assert_eq!(layout.origin_x, 0.0);
        assert_eq!(layout.origin_y, HUD_HEIGHT);
    }

    #[test]
    fn high_score_shown_when_known() {
        let mut game = SnakeGame::default();
        let mut config = seeded(1);
        config.high_score = Some(500);
        game.init(SURFACE, &config).unwrap();

        let recording = shared_recording(SURFACE.width, SURFACE.height);
        let mut surface =
            arcade_core::surface::RenderSurface::new(Box::new(std::rc::Rc::clone(&recording)));
        game.render(&mut surface.begin_frame()).unwrap();
        let texts: Vec<_> = recording
            .borrow()
            .commands()
            .iter()
            .filter_map(|c| match c {
                arcade_core::surface::DrawCommand::Text { text, .. } => Some(text.clone()),
                _ => None,
            })
            .collect();
        assert!(texts.contains(&"Best 500".to_string()), "{texts:?}");
    }

    // ================================================================
    // Hub integration
    // ================================================================

    #[test]
    fn crash_ends_session_through_hub() {
        use arcade_core::game_registry::GameDescriptor;
        use arcade_core::hub::{EndReason, HubEvent, HubPhase};
        use arcade_core::time::ManualTime;

        let (mut hub, _) = test_hub(arcade_core::config::HubConfig::default());
        hub.register_game(GameDescriptor::of::<SnakeGame>("snake"))
            .unwrap();
        hub.select_game("snake").unwrap();

        let time = ManualTime::new(0.0);
        run_frames(&mut hub, &time, 400, FRAME_MS);

        assert_eq!(hub.phase(), HubPhase::Idle);
        let ended = hub
            .drain_events()
            .into_iter()
            .find_map(|e| match e {
                HubEvent::SessionEnded { reason, .. } => Some(reason),
                _ => None,
            });
        assert_eq!(ended, Some(EndReason::Lost));
    }
}
