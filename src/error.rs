//! Crate-wide fallible boundaries.

use thiserror::Error;

use crate::engine::hex::Hex;
use crate::engine::piece::Color;

/// Why [`crate::engine::state::GameState::apply`] refused a move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum IllegalMoveError {
    #[error("{color:?} has no piece of that kind left in reserve")]
    ReserveEmpty { color: Color },
    #[error("{hex:?} is already occupied")]
    CellOccupied { hex: Hex },
    #[error("{hex:?} is not a legal placement for {color:?}")]
    IllegalPlacement { hex: Hex, color: Color },
    #[error("there is no piece at {hex:?} to move")]
    NoPieceToMove { hex: Hex },
    #[error("the piece at {from:?} cannot move to {to:?}")]
    IllegalDestination { from: Hex, to: Hex },
    #[error("{color:?} passed but at least one legal move exists")]
    WrongSideToMove { color: Color },
}

/// An internal consistency failure: a state reached that the rules kernel
/// should never be able to produce. These are bugs, not user input errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvariantViolation {
    #[error("the hive is split across {component_count} disconnected components")]
    HiveDisconnected { component_count: usize },
    #[error("{hex:?} holds an empty stack instead of being absent from the board")]
    EmptyStackLeftOnBoard { hex: Hex },
    #[error("{color:?} has {count} Queens on the board, expected at most one")]
    DuplicateQueen { color: Color, count: usize },
    #[error("the Zobrist hash does not match the board it was computed from")]
    ZobristHashMismatch,
}

/// Errors surfaced while parsing a textual move or board notation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NotationParseError {
    #[error("empty input")]
    Empty,
    #[error("unrecognized bug letter '{0}'")]
    UnknownBug(char),
    #[error("malformed coordinate in '{0}'")]
    MalformedCoordinate(String),
    #[error("malformed move text '{0}'")]
    MalformedMove(String),
}
