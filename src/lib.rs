use std::ops::Index;

use arrayvec::ArrayVec;
use thiserror::Error;

mod cost;
mod fmt;
mod parse;
pub mod solve;

pub use cost::CostVector;
pub use parse::{Batch, Query};

/// The symbol marking the empty cell.
pub const BLANK: u8 = b'G';

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid board: {0}")]
    Board(String),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("invalid move: {0}")]
    Move(String),
    #[error("frontier exhausted before settling goal {goal}")]
    ExhaustedSearch { goal: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum GoError {
    Unmovable,
    TileMismatch,
}

/// An immutable puzzle configuration, stored row by row.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Board {
    dim: usize,
    blank: usize,
    cells: Box<[u8]>,
}

/// Grid coordinates as `(row, column)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Vec2(pub usize, pub usize);

impl Index<Vec2> for Board {
    type Output = u8;
    fn index(&self, pos: Vec2) -> &Self::Output {
        &self.cells[pos.0 * self.dim + pos.1]
    }
}

impl Board {
    pub fn dimension(&self) -> usize {
        self.dim
    }

    pub fn blank(&self) -> Vec2 {
        self.pos_of(self.blank)
    }

    /// Non-blank symbols in grid order.
    pub fn tiles(&self) -> impl Iterator<Item = u8> + '_ {
        self.cells.iter().copied().filter(|&c| c != BLANK)
    }

    pub fn rows(&self) -> impl Iterator<Item = &[u8]> + '_ {
        self.cells.chunks(self.dim)
    }

    pub fn to_line(&self) -> String {
        self.cells.iter().map(|&c| c as char).collect()
    }

    fn pos_of(&self, idx: usize) -> Vec2 {
        Vec2(idx / self.dim, idx % self.dim)
    }

    fn idx_of(&self, pos: Vec2) -> usize {
        pos.0 * self.dim + pos.1
    }

    fn sibling_pos(&self, pos: Vec2, dir: Direction) -> Option<Vec2> {
        const DIRECTIONS: [(isize, isize); 4] = [(0, 1), (1, 0), (0, -1), (-1, 0)];
        let row = pos.0.checked_add_signed(DIRECTIONS[dir as usize].0)?;
        let col = pos.1.checked_add_signed(DIRECTIONS[dir as usize].1)?;
        if self.dim <= row || self.dim <= col {
            return None;
        }
        Some(Vec2(row, col))
    }

    /// Moves the blank one cell towards `dir`.
    pub fn go(&self, dir: Direction) -> Result<Board, GoError> {
        let to = self
            .sibling_pos(self.blank(), dir)
            .ok_or(GoError::Unmovable)?;
        let blank = self.idx_of(to);
        let mut cells = self.cells.clone();
        cells.swap(self.blank, blank);
        Ok(Board {
            dim: self.dim,
            blank,
            cells,
        })
    }

    /// Slides `mv.tile` towards `mv.dir` into the blank.
    pub fn apply(&self, mv: Move) -> Result<Board, GoError> {
        let next = self.go(mv.dir.reversed())?;
        if self[next.blank()] != mv.tile {
            return Err(GoError::TileMismatch);
        }
        Ok(next)
    }

    /// The symbol that slides when going from `self` to `next`.
    pub fn moved_tile(&self, next: &Board) -> u8 {
        self.cells[next.blank]
    }

    /// Describes the single move leading to `next`, if the blanks are adjacent.
    pub fn step_to(&self, next: &Board) -> Option<Move> {
        let blank = self.blank();
        let dir = Direction::ALL
            .into_iter()
            .find(|&dir| self.sibling_pos(blank, dir) == Some(next.blank()))?;
        Some(Move {
            tile: self.moved_tile(next),
            dir: dir.reversed(),
        })
    }
}

/// Lazily generated adjacency of a state graph.
pub trait Neighbors: Sized {
    type Iter: IntoIterator<Item = Self>;

    fn neighbors(&self) -> Self::Iter;
}

impl Neighbors for Board {
    type Iter = ArrayVec<Board, 4>;

    fn neighbors(&self) -> Self::Iter {
        Direction::ALL
            .into_iter()
            .filter_map(|dir| self.go(dir).ok())
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Right = 0,
    Down,
    Left,
    Up,
}

impl Direction {
    pub const ALL: [Self; 4] = [Self::Right, Self::Down, Self::Left, Self::Up];

    pub fn reversed(self) -> Self {
        match self {
            Direction::Right => Direction::Left,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Up => Direction::Down,
        }
    }
}

/// A tile sliding one cell into the blank. `dir` is where the tile goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Move {
    pub tile: u8,
    pub dir: Direction,
}

/// Parity pre-filter: counts pairs of tiles whose relative order differs
/// between `start` and `goal`, with the blank removed.
///
/// Both loop bounds stop one short of the full cell count, which over the
/// blank-free sequences covers every pair.
pub fn is_solvable(start: &Board, goal: &Board) -> bool {
    let n = start.cells.len();
    let s = start.tiles().collect::<Vec<_>>();
    let g = goal.tiles().collect::<Vec<_>>();
    if s.len() != g.len() || s.len() + 1 != n {
        return false;
    }
    let rank = |tile: u8| g.iter().position(|&t| t == tile);

    let mut inversions = 0usize;
    for i in 0..n - 1 {
        for j in i + 1..n - 1 {
            if rank(s[j]) < rank(s[i]) {
                inversions += 1;
            }
        }
    }
    inversions % 2 == 0
}
