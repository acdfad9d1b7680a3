use std::str::FromStr;

use anyhow::{ensure, Context, Result};

use crate::{Board, CostVector, Direction, Error, Move, BLANK};

impl FromStr for Board {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || !s.is_ascii() {
            return Err(Error::Board(format!("expecting ASCII symbols, got {s:?}")));
        }
        let cells = s.as_bytes();
        let dim = (1..=cells.len())
            .take_while(|d| d * d <= cells.len())
            .last()
            .unwrap_or(0);
        if dim * dim != cells.len() {
            return Err(Error::Board(format!(
                "length {} of {s:?} is not a perfect square",
                cells.len()
            )));
        }

        let mut blanks = cells
            .iter()
            .enumerate()
            .filter(|&(_, &c)| c == BLANK)
            .map(|(i, _)| i);
        let blank = match (blanks.next(), blanks.next()) {
            (Some(blank), None) => blank,
            (None, _) => return Err(Error::Board(format!("no blank in {s:?}"))),
            (Some(_), Some(_)) => return Err(Error::Board(format!("multiple blanks in {s:?}"))),
        };

        Ok(Board {
            dim,
            blank,
            cells: cells.into(),
        })
    }
}

impl CostVector {
    /// Parses the costs of a `dim`×`dim` board. Tokens past the tile count are ignored.
    pub fn parse(line: &str, dim: usize) -> Result<Self, Error> {
        let count = (dim * dim).saturating_sub(1);
        let mut tokens = line.split_whitespace();
        let costs = (0..count)
            .map(|i| {
                let token = tokens.next().ok_or_else(|| {
                    Error::Config(format!("expecting {count} costs, got {i} in {line:?}"))
                })?;
                token
                    .parse::<u32>()
                    .map_err(|err| Error::Config(format!("invalid cost {token:?}: {err}")))
            })
            .collect::<Result<Box<[_]>, _>>()?;
        Ok(CostVector(costs))
    }
}

impl FromStr for Direction {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "R" => Direction::Right,
            "D" => Direction::Down,
            "L" => Direction::Left,
            "U" => Direction::Up,
            _ => return Err(Error::Move(format!("invalid direction {s:?}"))),
        })
    }
}

impl FromStr for Move {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.as_bytes() {
            &[tile, dir] if tile != BLANK && tile.is_ascii() && dir.is_ascii() => Ok(Move {
                tile,
                dir: s[1..].parse()?,
            }),
            _ => Err(Error::Move(format!("expecting a tile and a direction, got {s:?}"))),
        }
    }
}

/// One request: reach `goal` from `initial` under `costs`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub initial: Board,
    pub goal: Board,
    pub costs: CostVector,
}

impl Query {
    /// Parses a `initial goal` line followed by its cost line.
    pub fn parse(boards: &str, costs: &str) -> Result<Self> {
        let mut tokens = boards.split_whitespace();
        let initial = tokens.next().context("Missing initial board")?;
        let goal = tokens.next().context("Missing goal board")?;
        ensure!(tokens.next().is_none(), "Trailing tokens after {goal:?}");

        let initial = initial.parse::<Board>()?;
        let goal = goal.parse::<Board>()?;
        ensure!(
            initial.dimension() == goal.dimension(),
            "Dimension mismatch: {} against {}",
            initial.dimension(),
            goal.dimension(),
        );
        let mut expected = initial.cells.to_vec();
        let mut got = goal.cells.to_vec();
        expected.sort_unstable();
        got.sort_unstable();
        ensure!(
            expected == got,
            "Goal {} is not a rearrangement of {}",
            goal.to_line(),
            initial.to_line(),
        );

        let costs = CostVector::parse(costs, initial.dimension())?;
        Ok(Query {
            initial,
            goal,
            costs,
        })
    }
}

/// A count line followed by that many queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch(pub Vec<Query>);

impl FromStr for Batch {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut lines = s.lines();
        let count = lines
            .next()
            .context("Missing query count")?
            .trim()
            .parse::<usize>()
            .context("Invalid query count")?;

        let queries = (1..=count)
            .map(|i| {
                (|| {
                    let boards = lines.next().context("Missing boards line")?;
                    let costs = lines.next().context("Missing cost line")?;
                    Query::parse(boards, costs)
                })()
                .with_context(|| format!("Failed to parse query {i}"))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Batch(queries))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn board_shape() {
        let b = "123456G78".parse::<Board>().unwrap();
        assert_eq!(b.dimension(), 3);
        assert_eq!(b.blank, 6);
        assert_eq!(" 123G ".parse::<Board>().unwrap().dimension(), 2);

        for bad in ["", "12345678", "12345678G9", "123456789", "G23456G78", "12é4"] {
            assert!(
                matches!(bad.parse::<Board>(), Err(Error::Board(_))),
                "{bad:?}"
            );
        }
    }

    #[test]
    fn cost_line() {
        let c = CostVector::parse("1 2 3 4 5 6 7 8", 3).unwrap();
        assert_eq!(c.len(), 8);
        assert_eq!(c.tile_cost(b'5'), 5);

        let extra = CostVector::parse("  8 7\t6 5 4 3 2 1 0 99 ", 3).unwrap();
        assert_eq!(extra.len(), 8);
        assert_eq!(extra.tile_cost(b'1'), 8);

        assert!(CostVector::parse("", 1).unwrap().is_empty());
    }

    #[test]
    fn short_cost_line_is_config_error() {
        assert!(matches!(
            CostVector::parse("1 2 3 4 5 6 7", 3),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            CostVector::parse("1 2 -3 4 5 6 7 8", 3),
            Err(Error::Config(_))
        ));
        assert!(matches!(CostVector::parse("1 x 3", 2), Err(Error::Config(_))));
    }

    #[test]
    fn move_token() {
        assert_eq!(
            "8R".parse::<Move>().unwrap(),
            Move {
                tile: b'8',
                dir: Direction::Right
            }
        );
        assert_eq!("aU".parse::<Move>().unwrap().dir, Direction::Up);
        for bad in ["8", "8X", "GR", "8RR", ""] {
            assert!(matches!(bad.parse::<Move>(), Err(Error::Move(_))), "{bad:?}");
        }
    }

    #[test]
    fn batch() {
        let Batch(queries) = "2\n12345678G 1234567G8\n1 2 3 4 5 6 7 8\n123G 12G3\n0 0 0\n"
            .parse::<Batch>()
            .unwrap();
        assert_eq!(queries.len(), 2);
        assert_eq!(queries[0].goal.to_line(), "1234567G8");
        assert_eq!(queries[1].costs.len(), 3);
    }

    #[test]
    fn batch_errors() {
        for bad in [
            "",
            "x\n",
            "2\n12345678G 1234567G8\n1 2 3 4 5 6 7 8\n",
            "1\n12345678G\n1 2 3 4 5 6 7 8\n",
            "1\n12345678G 123G\n1 2 3 4 5 6 7 8\n",
            "1\n12345678G 12345679G\n1 2 3 4 5 6 7 8\n",
            "1\n12345678G 1234567G8 x\n1 2 3 4 5 6 7 8\n",
            "1\n12345678G 1234567G8\n1 2 3\n",
        ] {
            assert!(bad.parse::<Batch>().is_err(), "{bad:?}");
        }
    }

    #[test]
    fn short_cost_line_surfaces_through_batch() {
        let err = "1\n12345678G 1234567G8\n1 2 3\n"
            .parse::<Batch>()
            .unwrap_err();
        assert!(matches!(
            err.root_cause().downcast_ref::<Error>(),
            Some(Error::Config(_))
        ));
    }
}
