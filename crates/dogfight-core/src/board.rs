use serde::{Deserialize, Serialize};

/// State of a single grid cell.
///
/// Wire names follow the browser client: an untouched empty cell is the
/// empty string, plane parts are `B`/`H`, and struck parts are `I`/`X`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Cell {
    #[default]
    #[serde(rename = "")]
    Empty,
    #[serde(rename = "B")]
    Body,
    #[serde(rename = "H")]
    Head,
    #[serde(rename = "X")]
    HeadDestroyed,
    #[serde(rename = "I")]
    BodyHit,
}

/// Result of firing at one cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShotOutcome {
    #[serde(rename = "M")]
    Miss,
    /// A body cell was hit.
    #[serde(rename = "I")]
    Hit,
    /// A head cell was destroyed.
    #[serde(rename = "D")]
    Destroyed,
}

impl Cell {
    /// Classify a shot landing on this cell and return the state the cell
    /// is left in. Already-struck and empty cells are misses and stay as-is.
    pub fn struck(self) -> (ShotOutcome, Cell) {
        match self {
            Cell::Head => (ShotOutcome::Destroyed, Cell::HeadDestroyed),
            Cell::Body => (ShotOutcome::Hit, Cell::BodyHit),
            other => (ShotOutcome::Miss, other),
        }
    }
}

/// A player's private grid, stored row-major.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Board {
    cells: Vec<Vec<Cell>>,
}

impl Board {
    pub fn new(cells: Vec<Vec<Cell>>) -> Self {
        Self { cells }
    }

    /// An all-empty grid of the given dimensions.
    pub fn empty(rows: usize, cols: usize) -> Self {
        Self {
            cells: vec![vec![Cell::Empty; cols]; rows],
        }
    }

    pub fn rows(&self) -> usize {
        self.cells.len()
    }

    pub fn get(&self, row: usize, col: usize) -> Option<Cell> {
        self.cells.get(row)?.get(col).copied()
    }

    /// Overwrite one cell. Returns false if the coordinate is off the grid.
    pub fn set(&mut self, row: usize, col: usize, cell: Cell) -> bool {
        match self.cells.get_mut(row).and_then(|r| r.get_mut(col)) {
            Some(slot) => {
                *slot = cell;
                true
            },
            None => false,
        }
    }

    /// Number of cells in the given state across the whole grid.
    pub fn count(&self, cell: Cell) -> usize {
        self.cells
            .iter()
            .flat_map(|row| row.iter())
            .filter(|&&c| c == cell)
            .count()
    }

    pub fn heads_remaining(&self) -> usize {
        self.count(Cell::Head)
    }

    /// Fire at a cell, mutating it on a hit. `None` if the coordinate is
    /// off the grid.
    pub fn strike(&mut self, row: usize, col: usize) -> Option<ShotOutcome> {
        let slot = self.cells.get_mut(row)?.get_mut(col)?;
        let (outcome, next) = slot.struck();
        *slot = next;
        Some(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board_with_heads(heads: &[(usize, usize)]) -> Board {
        let mut board = Board::empty(10, 10);
        for &(r, c) in heads {
            board.set(r, c, Cell::Head);
        }
        board
    }

    #[test]
    fn strike_head_destroys_it() {
        let mut board = board_with_heads(&[(2, 3)]);
        assert_eq!(board.strike(2, 3), Some(ShotOutcome::Destroyed));
        assert_eq!(board.get(2, 3), Some(Cell::HeadDestroyed));
        assert_eq!(board.heads_remaining(), 0);
    }

    #[test]
    fn strike_body_marks_hit() {
        let mut board = Board::empty(4, 4);
        board.set(1, 1, Cell::Body);
        assert_eq!(board.strike(1, 1), Some(ShotOutcome::Hit));
        assert_eq!(board.get(1, 1), Some(Cell::BodyHit));
    }

    #[test]
    fn repeat_strike_is_a_miss() {
        let mut board = board_with_heads(&[(0, 0)]);
        board.set(0, 1, Cell::Body);
        board.strike(0, 0);
        board.strike(0, 1);
        assert_eq!(board.strike(0, 0), Some(ShotOutcome::Miss));
        assert_eq!(board.strike(0, 1), Some(ShotOutcome::Miss));
        assert_eq!(board.get(0, 0), Some(Cell::HeadDestroyed));
        assert_eq!(board.get(0, 1), Some(Cell::BodyHit));
    }

    #[test]
    fn strike_empty_is_a_miss() {
        let mut board = Board::empty(3, 3);
        assert_eq!(board.strike(2, 2), Some(ShotOutcome::Miss));
        assert_eq!(board.get(2, 2), Some(Cell::Empty));
    }

    #[test]
    fn strike_off_grid_is_none() {
        let mut board = Board::empty(3, 3);
        assert_eq!(board.strike(3, 0), None);
        assert_eq!(board.strike(0, 7), None);
        assert!(!board.set(9, 9, Cell::Head));
    }

    #[test]
    fn ragged_rows_are_tolerated() {
        let mut board = Board::new(vec![vec![Cell::Head], vec![Cell::Empty, Cell::Head]]);
        assert_eq!(board.heads_remaining(), 2);
        assert_eq!(board.strike(0, 1), None);
        assert_eq!(board.strike(1, 1), Some(ShotOutcome::Destroyed));
    }

    #[test]
    fn count_scans_every_row() {
        let board = board_with_heads(&[(0, 0), (5, 5), (9, 9)]);
        assert_eq!(board.heads_remaining(), 3);
        assert_eq!(board.count(Cell::Empty), 97);
        assert_eq!(board.rows(), 10);
    }

    #[test]
    fn board_serializes_as_nested_letters() {
        let mut board = Board::empty(1, 3);
        board.set(0, 0, Cell::Head);
        board.set(0, 1, Cell::Body);
        let json = serde_json::to_string(&board).unwrap();
        assert_eq!(json, r#"[["H","B",""]]"#);
        let back: Board = serde_json::from_str(&json).unwrap();
        assert_eq!(back, board);
    }

    #[test]
    fn outcome_letters() {
        assert_eq!(serde_json::to_string(&ShotOutcome::Miss).unwrap(), "\"M\"");
        assert_eq!(serde_json::to_string(&ShotOutcome::Hit).unwrap(), "\"I\"");
        assert_eq!(
            serde_json::to_string(&ShotOutcome::Destroyed).unwrap(),
            "\"D\""
        );
    }

    mod proptests {
        use super::*;
        use proptest::collection::hash_set;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn sinking_every_head_clears_the_board(
                heads in hash_set((0usize..10, 0usize..10), 0..15),
                bodies in hash_set((0usize..10, 0usize..10), 0..30),
            ) {
                let mut board = Board::empty(10, 10);
                for &(r, c) in &bodies {
                    board.set(r, c, Cell::Body);
                }
                for &(r, c) in &heads {
                    board.set(r, c, Cell::Head);
                }
                prop_assert_eq!(board.heads_remaining(), heads.len());

                let destroyed = heads
                    .iter()
                    .filter(|&&(r, c)| board.strike(r, c) == Some(ShotOutcome::Destroyed))
                    .count();
                prop_assert_eq!(destroyed, heads.len());
                prop_assert_eq!(board.heads_remaining(), 0);
                prop_assert_eq!(board.count(Cell::HeadDestroyed), heads.len());

                // Every struck head now reads as a miss, and so does a second
                // shot at any body cell.
                for &(r, c) in &heads {
                    prop_assert_eq!(board.strike(r, c), Some(ShotOutcome::Miss));
                }
                for &(r, c) in bodies.difference(&heads) {
                    prop_assert_eq!(board.strike(r, c), Some(ShotOutcome::Hit));
                    prop_assert_eq!(board.strike(r, c), Some(ShotOutcome::Miss));
                }
                prop_assert_eq!(board.count(Cell::Body), 0);
            }

            #[test]
            fn strikes_never_create_heads(
                rows in 1usize..12,
                cols in 1usize..12,
                shots in proptest::collection::vec((0usize..14, 0usize..14), 0..40),
            ) {
                let mut board = Board::empty(rows, cols);
                board.set(0, 0, Cell::Head);
                let mut last = board.heads_remaining();
                for (r, c) in shots {
                    let outcome = board.strike(r, c);
                    prop_assert_eq!(outcome.is_none(), r >= rows || c >= cols);
                    let now = board.heads_remaining();
                    prop_assert!(now <= last);
                    last = now;
                }
            }
        }
    }
}
