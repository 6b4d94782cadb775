use rustc_hash::FxHashMap;

use crate::engine::hex::{Hex, neighbors};
use crate::engine::piece::Piece;

/// The hive: a sparse map from hex coordinate to an ordered, bottom-first
/// stack of pieces. A cell absent from the map is empty. Only Beetles may
/// occupy a non-empty cell's top (enforced by the rules kernel, not here).
#[derive(Debug, Clone, Default)]
pub struct Board {
    cells: FxHashMap<Hex, Vec<Piece>>,
}

impl Board {
    pub fn new() -> Board {
        Board::default()
    }

    pub fn top_of(&self, hex: Hex) -> Option<Piece> {
        self.cells.get(&hex).and_then(|stack| stack.last()).copied()
    }

    pub fn occupied(&self, hex: Hex) -> bool {
        self.cells.get(&hex).is_some_and(|stack| !stack.is_empty())
    }

    pub fn stack_at(&self, hex: Hex) -> &[Piece] {
        self.cells.get(&hex).map(|s| s.as_slice()).unwrap_or(&[])
    }

    pub fn stack_height(&self, hex: Hex) -> usize {
        self.cells.get(&hex).map(|s| s.len()).unwrap_or(0)
    }

    /// Pushes `piece` onto the stack at `hex`, creating the cell lazily.
    pub fn push(&mut self, hex: Hex, piece: Piece) {
        self.cells.entry(hex).or_default().push(piece);
    }

    /// Removes and returns the top piece at `hex`. The cell entry is pruned
    /// once empty so `occupied_cells` never yields stale empty stacks.
    pub fn pop(&mut self, hex: Hex) -> Option<Piece> {
        let stack = self.cells.get_mut(&hex)?;
        let piece = stack.pop();
        if stack.is_empty() {
            self.cells.remove(&hex);
        }
        piece
    }

    pub fn occupied_cells(&self) -> impl Iterator<Item = Hex> + '_ {
        self.cells.keys().copied()
    }

    pub fn cells_with_pieces(&self) -> impl Iterator<Item = (Hex, &[Piece])> {
        self.cells.iter().map(|(hex, stack)| (*hex, stack.as_slice()))
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn occupied_neighbors(&self, hex: Hex) -> impl Iterator<Item = Hex> + '_ {
        neighbors(hex).filter(|h| self.occupied(*h))
    }

    pub fn unoccupied_neighbors(&self, hex: Hex) -> impl Iterator<Item = Hex> + '_ {
        neighbors(hex).filter(|h| !self.occupied(*h))
    }

    /// A color's queen is surrounded iff all six neighbors of its cell are
    /// occupied; `None` if that color has no queen on the board.
    pub fn queen_neighbor_count(&self, queen_hex: Option<Hex>) -> Option<usize> {
        queen_hex.map(|hex| self.occupied_neighbors(hex).count())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::piece::{Bug, Color};

    fn piece(bug: Bug, color: Color, instance: u8) -> Piece {
        Piece { bug, color, instance }
    }

    #[test]
    fn push_then_pop_round_trips() {
        let mut board = Board::new();
        let hex = Hex::new(0, 0);
        board.push(hex, piece(Bug::Queen, Color::White, 1));
        assert_eq!(board.top_of(hex), Some(piece(Bug::Queen, Color::White, 1)));
        assert_eq!(board.pop(hex), Some(piece(Bug::Queen, Color::White, 1)));
        assert!(!board.occupied(hex));
    }

    #[test]
    fn stacking_exposes_only_the_top() {
        let mut board = Board::new();
        let hex = Hex::new(0, 0);
        board.push(hex, piece(Bug::Queen, Color::Black, 1));
        board.push(hex, piece(Bug::Beetle, Color::White, 1));
        assert_eq!(board.top_of(hex), Some(piece(Bug::Beetle, Color::White, 1)));
        assert_eq!(board.stack_height(hex), 2);
    }

    #[test]
    fn empty_cell_is_pruned_after_last_pop() {
        let mut board = Board::new();
        let hex = Hex::new(0, 0);
        board.push(hex, piece(Bug::Ant, Color::White, 1));
        board.pop(hex);
        assert_eq!(board.occupied_cells().count(), 0);
    }
}
