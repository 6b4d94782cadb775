use rustc_hash::FxHashMap;

use crate::engine::board::Board;
use crate::engine::hex::Hex;
use crate::engine::piece::{Bug, Color, Piece};
use crate::engine::rules;
use crate::engine::zobrist::{ZobristHash, ZobristTable};
use crate::error::IllegalMoveError;

/// A single committed or candidate turn. `Pass` is returned by
/// [`crate::engine::movegen::legal_moves`] only when a color has no other
/// option, matching the `NoLegalMoves` in-band case in the error taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd)]
pub enum Move {
    Placement { bug: Bug, hex: Hex },
    Movement { from: Hex, to: Hex },
    Pass,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameResult {
    Ongoing,
    Draw,
    Winner(Color),
}

/// One color's unplaced pieces, tracked as remaining counts per kind plus the
/// running placement-order counter used to stamp a [`Piece::instance`] the
/// moment it leaves the reserve.
#[derive(Debug, Clone)]
struct Reserve {
    remaining: FxHashMap<Bug, u8>,
    next_instance: FxHashMap<Bug, u8>,
}

impl Reserve {
    fn full() -> Reserve {
        use strum::IntoEnumIterator;
        let mut remaining = FxHashMap::default();
        let mut next_instance = FxHashMap::default();
        for bug in Bug::iter() {
            remaining.insert(bug, bug.reserve_count());
            next_instance.insert(bug, 1);
        }
        Reserve { remaining, next_instance }
    }

    fn count(&self, bug: Bug) -> u8 {
        *self.remaining.get(&bug).unwrap_or(&0)
    }

    fn take(&mut self, bug: Bug) -> Option<u8> {
        let count = self.remaining.get_mut(&bug)?;
        if *count == 0 {
            return None;
        }
        *count -= 1;
        let instance = self.next_instance.get_mut(&bug).unwrap();
        let assigned = *instance;
        *instance += 1;
        Some(assigned)
    }

    fn placed_count(&self) -> u32 {
        use strum::IntoEnumIterator;
        Bug::iter()
            .map(|bug| (bug.reserve_count() - self.count(bug)) as u32)
            .sum()
    }
}

#[derive(Debug, Clone)]
pub struct GameState {
    pub board: Board,
    white_reserve: Reserve,
    black_reserve: Reserve,
    pub side_to_move: Color,
    /// Total committed moves so far, 1-based count of the move about to be made.
    pub move_number: u32,
    queen_hex: FxHashMap<Color, Hex>,
    pub result: GameResult,
    pub zobrist_hash: ZobristHash,
    history: Vec<ZobristHash>,
    pub last_move: Option<Move>,
}

impl GameState {
    pub fn new() -> GameState {
        let zobrist_hash = ZobristTable::get().hash(&Board::new(), Color::White);
        GameState {
            board: Board::new(),
            white_reserve: Reserve::full(),
            black_reserve: Reserve::full(),
            side_to_move: Color::White,
            move_number: 1,
            queen_hex: FxHashMap::default(),
            result: GameResult::Ongoing,
            zobrist_hash,
            history: vec![zobrist_hash],
            last_move: None,
        }
    }

    /// Builds a state directly from a board, inferring each color's
    /// remaining reserve from what is already placed. Used by tests and
    /// benchmarks to set up fixture positions without replaying a full move
    /// sequence; not used by the decision pipeline itself.
    pub fn from_board(board: Board, side_to_move: Color, move_number: u32) -> GameState {
        let mut white_reserve = Reserve::full();
        let mut black_reserve = Reserve::full();
        let mut queen_hex = FxHashMap::default();

        for (hex, stack) in board.cells_with_pieces() {
            for piece in stack {
                let reserve = match piece.color {
                    Color::White => &mut white_reserve,
                    Color::Black => &mut black_reserve,
                };
                if let Some(count) = reserve.remaining.get_mut(&piece.bug) {
                    *count = count.saturating_sub(1);
                }
                let next_instance = reserve.next_instance.entry(piece.bug).or_insert(1);
                if piece.instance >= *next_instance {
                    *next_instance = piece.instance + 1;
                }
                if piece.bug == Bug::Queen {
                    queen_hex.insert(piece.color, hex);
                }
            }
        }

        let zobrist_hash = ZobristTable::get().hash(&board, side_to_move);
        GameState {
            board,
            white_reserve,
            black_reserve,
            side_to_move,
            move_number,
            queen_hex,
            result: GameResult::Ongoing,
            zobrist_hash,
            history: vec![zobrist_hash],
            last_move: None,
        }
    }

    fn reserve(&self, color: Color) -> &Reserve {
        match color {
            Color::White => &self.white_reserve,
            Color::Black => &self.black_reserve,
        }
    }

    fn reserve_mut(&mut self, color: Color) -> &mut Reserve {
        match color {
            Color::White => &mut self.white_reserve,
            Color::Black => &mut self.black_reserve,
        }
    }

    pub fn reserve_count(&self, color: Color, bug: Bug) -> u8 {
        self.reserve(color).count(bug)
    }

    /// Total pieces `color` has moved out of its reserve so far.
    pub fn placed_count(&self, color: Color) -> u32 {
        self.reserve(color).placed_count()
    }

    pub fn queen_placed(&self, color: Color) -> bool {
        self.reserve(color).count(Bug::Queen) == 0
    }

    pub fn queen_hex(&self, color: Color) -> Option<Hex> {
        self.queen_hex.get(&color).copied()
    }

    /// The 1-indexed count of `color`'s own moves so far, including the move
    /// about to be made. A color's own Nth move is the `n`th time it is (or
    /// was) side-to-move.
    pub fn own_move_number(&self, color: Color) -> u32 {
        let plies_so_far = self.move_number - 1;
        let color_plies_so_far = match color {
            Color::White => plies_so_far.div_ceil(2),
            Color::Black => plies_so_far / 2,
        };
        color_plies_so_far + 1
    }

    /// True exactly when `color` is about to make its 4th own-move and has
    /// not yet placed its Queen (Open Question resolution in DESIGN.md).
    pub fn must_place_queen_this_turn(&self, color: Color) -> bool {
        !self.queen_placed(color) && self.own_move_number(color) == 4
    }

    /// Tournament rule: a color may not place its Queen on its first own-move.
    pub fn queen_forbidden_this_turn(&self, color: Color) -> bool {
        self.own_move_number(color) == 1
    }

    pub fn repetition_count(&self) -> usize {
        self.history.iter().filter(|h| **h == self.zobrist_hash).count()
    }

    /// Applies `mv`, returning a new state. Errors if `mv` is not present in
    /// `legal_moves(self, self.side_to_move)`.
    pub fn apply(&self, mv: Move) -> Result<GameState, IllegalMoveError> {
        let legal = crate::engine::movegen::legal_moves(self, self.side_to_move);
        if !legal.contains(&mv) {
            return Err(illegal_move_error(self, mv));
        }

        let mut next = self.clone();
        let color = self.side_to_move;
        let table = ZobristTable::get();

        match mv {
            Move::Placement { bug, hex } => {
                let instance = next
                    .reserve_mut(color)
                    .take(bug)
                    .expect("legality check guarantees reserve availability");
                let piece = Piece { bug, color, instance };
                next.board.push(hex, piece);
                let height = next.board.stack_height(hex) - 1;
                next.zobrist_hash = next.zobrist_hash.with_added_piece(table, hex, height, piece);
                if bug == Bug::Queen {
                    next.queen_hex.insert(color, hex);
                }
            }
            Move::Movement { from, to } => {
                let height_before = next.board.stack_height(from) - 1;
                let piece = next
                    .board
                    .pop(from)
                    .expect("legality check guarantees a piece sits at `from`");
                next.zobrist_hash =
                    next.zobrist_hash.with_removed_piece(table, from, height_before, piece);
                next.board.push(to, piece);
                let height_after = next.board.stack_height(to) - 1;
                next.zobrist_hash =
                    next.zobrist_hash.with_added_piece(table, to, height_after, piece);
                if piece.bug == Bug::Queen {
                    next.queen_hex.insert(color, to);
                }
            }
            Move::Pass => {}
        }

        next.zobrist_hash = next.zobrist_hash.with_turn_change(table);
        next.side_to_move = color.opposite();
        next.move_number += 1;
        next.last_move = Some(mv);
        next.result = compute_result(&next);
        next.history.push(next.zobrist_hash);

        debug_assert!(
            rules::is_connected(&next.board),
            "apply produced a disconnected hive"
        );

        Ok(next)
    }
}

impl Default for GameState {
    fn default() -> GameState {
        GameState::new()
    }
}

fn illegal_move_error(state: &GameState, mv: Move) -> IllegalMoveError {
    match mv {
        Move::Placement { bug, hex } => {
            if state.reserve_count(state.side_to_move, bug) == 0 {
                IllegalMoveError::ReserveEmpty { color: state.side_to_move }
            } else if state.board.occupied(hex) {
                IllegalMoveError::CellOccupied { hex }
            } else {
                IllegalMoveError::IllegalPlacement { hex, color: state.side_to_move }
            }
        }
        Move::Movement { from, to } => {
            if state.board.top_of(from).is_none() {
                IllegalMoveError::NoPieceToMove { hex: from }
            } else {
                IllegalMoveError::IllegalDestination { from, to }
            }
        }
        Move::Pass => IllegalMoveError::WrongSideToMove { color: state.side_to_move },
    }
}

/// Terminal detection: a Queen is surrounded iff all six of its neighbors are
/// occupied. Both surrounded simultaneously is a draw.
fn compute_result(state: &GameState) -> GameResult {
    let white_surrounded = state
        .queen_hex(Color::White)
        .is_some_and(|hex| state.board.occupied_neighbors(hex).count() == 6);
    let black_surrounded = state
        .queen_hex(Color::Black)
        .is_some_and(|hex| state.board.occupied_neighbors(hex).count() == 6);

    match (white_surrounded, black_surrounded) {
        (true, true) => GameResult::Draw,
        (true, false) => GameResult::Winner(Color::Black),
        (false, true) => GameResult::Winner(Color::White),
        (false, false) => GameResult::Ongoing,
    }
}
