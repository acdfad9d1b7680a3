use std::fmt::{self, Write};

use crate::solve::Solution;
use crate::{Board, Direction, Move};

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.rows() {
            for &cell in row {
                f.write_char(cell as char)?;
            }
            f.write_char('\n')?;
        }
        Ok(())
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Direction::Right => "R",
            Direction::Down => "D",
            Direction::Left => "L",
            Direction::Up => "U",
        })
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_char(self.tile as char)?;
        fmt::Display::fmt(&self.dir, f)
    }
}

impl fmt::Display for Solution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.steps, self.cost)?;
        for mv in self.moves() {
            write!(f, " {mv}")?;
        }
        Ok(())
    }
}
