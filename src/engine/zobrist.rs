use std::ops::{BitXor, BitXorAssign};
use std::sync::{Mutex, OnceLock};

use rand::{Rng, SeedableRng};
use rand::rngs::StdRng;
use rustc_hash::FxHashMap;
use strum::EnumCount;

use crate::engine::hex::Hex;
use crate::engine::piece::{Bug, Color, Piece};

/// An incremental position fingerprint. Unlike a bounded Zobrist array keyed
/// on a fixed coordinate range, the key space here is the hex lazily
/// discovered during play, since the board has no bound. Includes
/// side-to-move: without it, positions that differ only in whose turn it is
/// would hash identically and be miscounted as repetitions.
#[derive(Copy, Clone, Default, PartialEq, Eq, Hash, Debug)]
pub struct ZobristHash(pub u64);

impl BitXor for ZobristHash {
    type Output = ZobristHash;

    fn bitxor(self, rhs: Self) -> Self::Output {
        ZobristHash(self.0 ^ rhs.0)
    }
}

impl BitXorAssign for ZobristHash {
    fn bitxor_assign(&mut self, rhs: Self) {
        self.0 ^= rhs.0;
    }
}

impl ZobristHash {
    pub fn with_added_piece(&self, table: &ZobristTable, hex: Hex, height: usize, piece: Piece) -> ZobristHash {
        *self ^ table.table_value(hex, height, piece)
    }

    pub fn with_removed_piece(&self, table: &ZobristTable, hex: Hex, height: usize, piece: Piece) -> ZobristHash {
        // XOR is its own inverse, so adding and removing use the same key.
        *self ^ table.table_value(hex, height, piece)
    }

    pub fn with_turn_change(&self, table: &ZobristTable) -> ZobristHash {
        *self ^ table.black_to_move
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

const PIECE_KIND_COUNT: usize = Bug::COUNT * 2;
const SEED: u64 = 0x48_49_56_45_4D_49_4E_44; // "HIVEMIND" as bytes, for reproducible tables across runs.

type PieceKey = (usize, usize, i32, i32);

struct ZobristTableInner {
    rng: StdRng,
    values: FxHashMap<PieceKey, ZobristHash>,
}

/// A lazily-populated table of random keys, one per (piece kind+color,
/// stack height, hex) triple ever looked up. Thread-safety matches the
/// teacher's `OnceLock<ZobristTable>` singleton; the interior is additionally
/// mutex-guarded because the key space grows at lookup time instead of being
/// precomputed.
pub struct ZobristTable {
    inner: Mutex<ZobristTableInner>,
    pub black_to_move: ZobristHash,
}

static ZOBRIST_TABLE: OnceLock<ZobristTable> = OnceLock::new();

impl ZobristTable {
    pub fn get() -> &'static ZobristTable {
        ZOBRIST_TABLE.get_or_init(ZobristTable::new)
    }

    fn new() -> ZobristTable {
        let mut rng = StdRng::seed_from_u64(SEED);
        let black_to_move = ZobristHash(rng.random());
        ZobristTable {
            inner: Mutex::new(ZobristTableInner {
                rng,
                values: FxHashMap::default(),
            }),
            black_to_move,
        }
    }

    pub fn table_value(&self, hex: Hex, height: usize, piece: Piece) -> ZobristHash {
        let key: PieceKey = (piece_index(piece), height, hex.q, hex.r);
        let mut inner = self.inner.lock().expect("zobrist table mutex poisoned");
        *inner
            .values
            .entry(key)
            .or_insert_with(|| ZobristHash(inner_random(&mut inner.rng)))
    }

    pub fn hash(&self, board: &crate::engine::board::Board, active_color: Color) -> ZobristHash {
        let mut hash = ZobristHash(0);
        if active_color == Color::Black {
            hash ^= self.black_to_move;
        }
        for (hex, stack) in board.cells_with_pieces() {
            for (height, piece) in stack.iter().enumerate() {
                hash ^= self.table_value(hex, height, *piece);
            }
        }
        hash
    }
}

fn inner_random(rng: &mut StdRng) -> u64 {
    rng.random()
}

fn piece_index(piece: Piece) -> usize {
    let bug_index = piece.bug as usize;
    if piece.color == Color::Black {
        bug_index + Bug::COUNT
    } else {
        bug_index
    }
}

const _: () = assert!(PIECE_KIND_COUNT == Bug::COUNT * 2);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::piece::{Bug, Color};

    fn piece(bug: Bug, color: Color) -> Piece {
        Piece { bug, color, instance: 1 }
    }

    #[test]
    fn add_then_remove_round_trips_to_the_original_hash() {
        let table = ZobristTable::get();
        let start = ZobristHash(0);
        let hex = Hex::new(3, -2);
        let added = start.with_added_piece(table, hex, 0, piece(Bug::Ant, Color::White));
        let removed = added.with_removed_piece(table, hex, 0, piece(Bug::Ant, Color::White));
        assert_eq!(start.value(), removed.value());
    }

    #[test]
    fn turn_change_is_its_own_inverse() {
        let table = ZobristTable::get();
        let start = ZobristHash(42);
        let flipped_twice = start.with_turn_change(table).with_turn_change(table);
        assert_eq!(start.value(), flipped_twice.value());
    }

    #[test]
    fn side_to_move_changes_the_hash() {
        let table = ZobristTable::get();
        let mut board = crate::engine::board::Board::new();
        board.push(Hex::ORIGIN, piece(Bug::Queen, Color::White));
        let white_to_move = table.hash(&board, Color::White);
        let black_to_move = table.hash(&board, Color::Black);
        assert_ne!(white_to_move.value(), black_to_move.value());
    }

    #[test]
    fn same_position_same_side_to_move_hashes_equal() {
        let table = ZobristTable::get();
        let mut a = crate::engine::board::Board::new();
        a.push(Hex::new(0, 0), piece(Bug::Queen, Color::White));
        a.push(Hex::new(1, 0), piece(Bug::Ant, Color::Black));
        let mut b = crate::engine::board::Board::new();
        b.push(Hex::new(1, 0), piece(Bug::Ant, Color::Black));
        b.push(Hex::new(0, 0), piece(Bug::Queen, Color::White));
        assert_eq!(
            table.hash(&a, Color::White).value(),
            table.hash(&b, Color::White).value()
        );
    }
}
