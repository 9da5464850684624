use rand::Rng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

/// A slide of every tile toward one edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Move {
    Left,
    Right,
    Up,
    Down,
}

impl Move {
    pub const ALL: [Move; 4] = [Move::Left, Move::Right, Move::Up, Move::Down];

    /// Arrow keys and WASD, by DOM `KeyboardEvent.code`.
    pub fn from_key(code: &str) -> Option<Self> {
        match code {
            "ArrowLeft" | "KeyA" => Some(Self::Left),
            "ArrowRight" | "KeyD" => Some(Self::Right),
            "ArrowUp" | "KeyW" => Some(Self::Up),
            "ArrowDown" | "KeyS" => Some(Self::Down),
            _ => None,
        }
    }

    /// Dominant axis of a pointer drag, if it travelled at least `min_distance`.
    pub fn from_swipe(dx: f32, dy: f32, min_distance: f32) -> Option<Self> {
        if dx.abs().max(dy.abs()) < min_distance {
            return None;
        }
        Some(if dx.abs() >= dy.abs() {
            if dx < 0.0 { Self::Left } else { Self::Right }
        } else if dy < 0.0 {
            Self::Up
        } else {
            Self::Down
        })
    }
}

/// Compact a line toward index 0, merging each equal adjacent pair once.
/// Returns the new line (same length) and the sum of merged tile values.
pub fn slide_line(line: &[u32]) -> (Vec<u32>, u32) {
    let mut out = Vec::with_capacity(line.len());
    let mut gained = 0;
    let mut pending: Option<u32> = None;

    for &value in line.iter().filter(|&&v| v != 0) {
        match pending {
            Some(p) if p == value => {
                out.push(p * 2);
                gained += p * 2;
                pending = None;
            },
            Some(p) => {
                out.push(p);
                pending = Some(value);
            },
            None => pending = Some(value),
        }
    }
    if let Some(p) = pending {
        out.push(p);
    }
    out.resize(line.len(), 0);
    (out, gained)
}

/// Outcome of applying a [`Move`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MoveResult {
    pub moved: bool,
    pub gained: u32,
}

/// Square board of tile values; zero is an empty cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    size: usize,
    /// Row-major (y * size + x).
    cells: Vec<u32>,
}

impl Grid {
    pub fn new(size: usize) -> Self {
        Self {
            size,
            cells: vec![0; size * size],
        }
    }

    /// Build from row-major values. `None` if `cells` is not square.
    pub fn from_cells(cells: Vec<u32>) -> Option<Self> {
        let size = (cells.len() as f64).sqrt() as usize;
        if size == 0 || size * size != cells.len() {
            return None;
        }
        Some(Self { size, cells })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn cells(&self) -> &[u32] {
        &self.cells
    }

    pub fn get(&self, x: usize, y: usize) -> u32 {
        self.cells[y * self.size + x]
    }

    pub fn max_tile(&self) -> u32 {
        self.cells.iter().copied().max().unwrap_or(0)
    }

    pub fn empty_count(&self) -> usize {
        self.cells.iter().filter(|&&v| v == 0).count()
    }

    /// Place a 2 (or, with `four_chance`, a 4) on a random empty cell.
    /// Returns the cell index, or `None` if the board is full.
    pub fn spawn(&mut self, rng: &mut StdRng, four_chance: f64) -> Option<usize> {
        let empty: Vec<usize> = (0..self.cells.len())
            .filter(|&i| self.cells[i] == 0)
            .collect();
        if empty.is_empty() {
            return None;
        }
        let index = empty[rng.random_range(0..empty.len())];
        self.cells[index] = if rng.random_bool(four_chance) { 4 } else { 2 };
        Some(index)
    }

    /// Cell indices of line `i`, ordered from the edge tiles slide toward.
    fn line_indices(&self, mv: Move, i: usize) -> Vec<usize> {
        let n = self.size;
        match mv {
            Move::Left => (0..n).map(|x| i * n + x).collect(),
            Move::Right => (0..n).rev().map(|x| i * n + x).collect(),
            Move::Up => (0..n).map(|y| y * n + i).collect(),
            Move::Down => (0..n).rev().map(|y| y * n + i).collect(),
        }
    }

    pub fn apply(&mut self, mv: Move) -> MoveResult {
        let mut result = MoveResult::default();
        for i in 0..self.size {
            let indices = self.line_indices(mv, i);
            let line: Vec<u32> = indices.iter().map(|&idx| self.cells[idx]).collect();
            let (slid, gained) = slide_line(&line);
            if slid != line {
                result.moved = true;
            }
            result.gained += gained;
            for (idx, value) in indices.into_iter().zip(slid) {
                self.cells[idx] = value;
            }
        }
        result
    }

    /// Whether any move would change the board.
    pub fn can_move(&self) -> bool {
        if self.empty_count() > 0 {
            return true;
        }
        let n = self.size;
        (0..n).any(|y| {
            (0..n).any(|x| {
                let v = self.get(x, y);
                (x + 1 < n && self.get(x + 1, y) == v) || (y + 1 < n && self.get(x, y + 1) == v)
            })
        })
    }
}
