use crate::Board;

/// Per-tile movement costs, indexed by the tile's base-36 value minus one.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CostVector(pub(crate) Box<[u32]>);

impl CostVector {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Symbols without a slot in the vector cost nothing.
    pub fn tile_cost(&self, tile: u8) -> u32 {
        (tile as char)
            .to_digit(36)
            .and_then(|value| value.checked_sub(1))
            .and_then(|idx| self.0.get(idx as usize))
            .copied()
            .unwrap_or(0)
    }

    pub fn edge_cost(&self, from: &Board, to: &Board) -> u32 {
        self.tile_cost(from.moved_tile(to))
    }
}

#[cfg(test)]
mod tests {
    use crate::{Board, CostVector, BLANK};

    fn costs(s: &str, dim: usize) -> CostVector {
        CostVector::parse(s, dim).unwrap()
    }

    #[test]
    fn cost_of_moved_tile() {
        let c = costs("1 2 3 4 5 6 7 8", 3);
        let from = "12345678G".parse::<Board>().unwrap();
        let left = "1234567G8".parse::<Board>().unwrap();
        let up = "12345G786".parse::<Board>().unwrap();
        assert_eq!(c.edge_cost(&from, &left), 8);
        assert_eq!(c.edge_cost(&from, &up), 6);
        assert_eq!(c.edge_cost(&left, &from), 8);
    }

    #[test]
    fn out_of_range_tiles_are_free() {
        let c = costs("1 2 3 4 5 6 7 8", 3);
        assert_eq!(c.tile_cost(BLANK), 0);
        assert_eq!(c.tile_cost(b'9'), 0);
        assert_eq!(c.tile_cost(b'0'), 0);
        assert_eq!(c.tile_cost(b'#'), 0);

        let from = "12345679G".parse::<Board>().unwrap();
        let to = "1234567G9".parse::<Board>().unwrap();
        assert_eq!(c.edge_cost(&from, &to), 0);
    }

    #[test]
    fn letters_use_base36_values() {
        let c = costs("1 2 3 4 5 6 7 8 9 10 11 12 13 14 15", 4);
        assert_eq!(c.tile_cost(b'A'), 10);
        assert_eq!(c.tile_cost(b'f'), 15);
        assert_eq!(c.tile_cost(b'G'), 0);
    }
}
