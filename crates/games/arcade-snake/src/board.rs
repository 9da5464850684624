use std::collections::VecDeque;

use rand::Rng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

/// A grid cell, origin at the top-left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cell {
    pub x: i32,
    pub y: i32,
}

impl Cell {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub fn offset(self) -> (i32, i32) {
        match self {
            Self::Up => (0, -1),
            Self::Down => (0, 1),
            Self::Left => (-1, 0),
            Self::Right => (1, 0),
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Self::Up => Self::Down,
            Self::Down => Self::Up,
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }

    pub fn is_horizontal(self) -> bool {
        matches!(self, Self::Left | Self::Right)
    }

    /// Arrow keys and WASD, by DOM `KeyboardEvent.code`.
    pub fn from_key(code: &str) -> Option<Self> {
        match code {
            "ArrowUp" | "KeyW" => Some(Self::Up),
            "ArrowDown" | "KeyS" => Some(Self::Down),
            "ArrowLeft" | "KeyA" => Some(Self::Left),
            "ArrowRight" | "KeyD" => Some(Self::Right),
            _ => None,
        }
    }
}

/// Result of advancing the snake by one cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Moved,
    Ate,
    Crashed,
}

/// Snake body, pending turns and food on a fixed grid.
#[derive(Debug, Clone)]
pub struct Board {
    width: u32,
    height: u32,
    /// Head first.
    snake: VecDeque<Cell>,
    heading: Direction,
    turns: VecDeque<Direction>,
    food: Option<Cell>,
    wrap: bool,
}

impl Board {
    /// A snake of `length` cells in the middle of the board, heading right
    /// with its tail to the left.
    pub fn new(width: u32, height: u32, length: u32, wrap: bool) -> Self {
        let head = Cell::new(width as i32 / 2, height as i32 / 2);
        let snake = (0..length as i32)
            .map(|i| Cell::new(head.x - i, head.y))
            .collect();
        Self {
            width,
            height,
            snake,
            heading: Direction::Right,
            turns: VecDeque::new(),
            food: None,
            wrap,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn head(&self) -> Cell {
        self.snake[0]
    }

    pub fn snake(&self) -> &VecDeque<Cell> {
        &self.snake
    }

    pub fn len(&self) -> usize {
        self.snake.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snake.is_empty()
    }

    pub fn heading(&self) -> Direction {
        self.heading
    }

    pub fn food(&self) -> Option<Cell> {
        self.food
    }

    pub fn pending_turns(&self) -> usize {
        self.turns.len()
    }

    /// Direction the snake will face after all queued turns.
    pub fn planned_heading(&self) -> Direction {
        self.turns.back().copied().unwrap_or(self.heading)
    }

    /// Buffer a turn for an upcoming step. Turns that would reverse into the
    /// neck or repeat the planned heading are ignored.
    pub fn queue_turn(&mut self, direction: Direction, max_queued: usize) -> bool {
        let planned = self.planned_heading();
        if direction == planned || direction == planned.opposite() {
            return false;
        }
        if self.turns.len() >= max_queued {
            return false;
        }
        self.turns.push_back(direction);
        true
    }

    pub fn is_full(&self) -> bool {
        self.snake.len() >= (self.width * self.height) as usize
    }

    /// Put food on a random free cell. Returns `false` if the snake covers
    /// the whole board.
    pub fn place_food(&mut self, rng: &mut StdRng) -> bool {
        let free: Vec<Cell> = (0..self.height as i32)
            .flat_map(|y| (0..self.width as i32).map(move |x| Cell::new(x, y)))
            .filter(|c| !self.snake.contains(c))
            .collect();
        if free.is_empty() {
            self.food = None;
            return false;
        }
        self.food = Some(free[rng.random_range(0..free.len())]);
        true
    }

    #[cfg(test)]
    pub(crate) fn set_food(&mut self, cell: Cell) {
        self.food = Some(cell);
    }

    /// Advance the head one cell in the current heading.
    pub fn step(&mut self) -> StepOutcome {
        if let Some(turn) = self.turns.pop_front() {
            self.heading = turn;
        }
        let (dx, dy) = self.heading.offset();
        let head = self.head();
        let mut next = Cell::new(head.x + dx, head.y + dy);

        if !self.in_bounds(next) {
            if !self.wrap {
                return StepOutcome::Crashed;
            }
            next = Cell::new(
                next.x.rem_euclid(self.width as i32),
                next.y.rem_euclid(self.height as i32),
            );
        }

        let grows = self.food == Some(next);
        // The tail vacates its cell this step unless the snake grows.
        let solid = if grows {
            self.snake.len()
        } else {
            self.snake.len() - 1
        };
        if self.snake.iter().take(solid).any(|c| *c == next) {
            return StepOutcome::Crashed;
        }

        self.snake.push_front(next);
        if grows {
            self.food = None;
            StepOutcome::Ate
        } else {
            self.snake.pop_back();
            StepOutcome::Moved
        }
    }

    fn in_bounds(&self, cell: Cell) -> bool {
        cell.x >= 0 && cell.y >= 0 && cell.x < self.width as i32 && cell.y < self.height as i32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn starts_centered_heading_right() {
        let board = Board::new(20, 15, 3, false);
        assert_eq!(board.head(), Cell::new(10, 7));
        assert_eq!(
            board.snake().iter().copied().collect::<Vec<_>>(),
            [Cell::new(10, 7), Cell::new(9, 7), Cell::new(8, 7)]
        );
        assert_eq!(board.heading(), Direction::Right);
    }

    #[test]
    fn step_moves_head_and_keeps_length() {
        let mut board = Board::new(20, 15, 3, false);
        assert_eq!(board.step(), StepOutcome::Moved);
        assert_eq!(board.head(), Cell::new(11, 7));
        assert_eq!(board.len(), 3);
    }

    #[test]
    fn reversal_and_repeat_ignored() {
        let mut board = Board::new(20, 15, 3, false);
        assert!(!board.queue_turn(Direction::Left, 2));
        assert!(!board.queue_turn(Direction::Right, 2));
        assert!(board.queue_turn(Direction::Up, 2));
        // Down would reverse the queued Up.
        assert!(!board.queue_turn(Direction::Down, 2));
        assert!(board.queue_turn(Direction::Left, 2));
        assert!(!board.queue_turn(Direction::Down, 2), "queue full");
        assert_eq!(board.pending_turns(), 2);
    }

    #[test]
    fn wall_crash_without_wrap() {
        let mut board = Board::new(4, 4, 2, false);
        assert_eq!(board.step(), StepOutcome::Moved);
        assert_eq!(board.head(), Cell::new(3, 2));
        assert_eq!(board.step(), StepOutcome::Crashed);
    }

    #[test]
    fn wrap_carries_to_opposite_edge() {
        let mut board = Board::new(4, 4, 2, true);
        board.step();
        assert_eq!(board.step(), StepOutcome::Moved);
        assert_eq!(board.head(), Cell::new(0, 2));
    }

    #[test]
    fn eating_grows_snake() {
        let mut board = Board::new(20, 15, 3, false);
        board.set_food(Cell::new(11, 7));
        assert_eq!(board.step(), StepOutcome::Ate);
        assert_eq!(board.len(), 4);
        assert_eq!(board.food(), None);
    }

    fn loop_back(length: u32) -> StepOutcome {
        let mut board = Board::new(20, 15, length, false);
        board.queue_turn(Direction::Up, 3);
        board.queue_turn(Direction::Left, 3);
        board.queue_turn(Direction::Down, 3);
        board.step();
        board.step();
        board.step()
    }

    #[test]
    fn moving_into_vacating_tail_is_allowed() {
        assert_eq!(loop_back(4), StepOutcome::Moved);
    }

    #[test]
    fn biting_body_crashes() {
        assert_eq!(loop_back(5), StepOutcome::Crashed);
    }

    #[test]
    fn food_never_spawns_on_snake() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut board = Board::new(4, 4, 2, false);
        for _ in 0..50 {
            assert!(board.place_food(&mut rng));
            let food = board.food().unwrap();
            assert!(!board.snake().contains(&food));
        }
    }

    #[test]
    fn same_seed_same_food() {
        let mut a = Board::new(20, 15, 3, false);
        let mut b = Board::new(20, 15, 3, false);
        a.place_food(&mut StdRng::seed_from_u64(9));
        b.place_food(&mut StdRng::seed_from_u64(9));
        assert_eq!(a.food(), b.food());
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        fn direction() -> impl Strategy<Value = Direction> {
            prop_oneof![
                Just(Direction::Up),
                Just(Direction::Down),
                Just(Direction::Left),
                Just(Direction::Right),
            ]
        }

        proptest! {
            #[test]
            fn body_stays_on_board_and_never_overlaps(
                turns in proptest::collection::vec(proptest::option::of(direction()), 1..80),
                wrap in proptest::bool::ANY,
                seed in 0u64..1000,
            ) {
                let mut rng = StdRng::seed_from_u64(seed);
                let mut board = Board::new(10, 8, 3, wrap);
                board.place_food(&mut rng);
                let mut length = board.len();

                for turn in turns {
                    if let Some(dir) = turn {
                        board.queue_turn(dir, 2);
                    }
                    match board.step() {
                        StepOutcome::Crashed => break,
                        StepOutcome::Ate => {
                            if !board.place_food(&mut rng) {
                                break;
                            }
                        },
                        StepOutcome::Moved => {},
                    }
                    prop_assert!(board.len() >= length);
                    length = board.len();
                    for cell in board.snake() {
                        prop_assert!(board.in_bounds(*cell));
                    }
                    let unique: std::collections::HashSet<_> = board.snake().iter().collect();
                    prop_assert_eq!(unique.len(), board.len());
                }
            }
        }
    }
}
