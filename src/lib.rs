//! A rule-faithful Hive engine: move generation over a hexagonal,
//! stacking board; a weighted positional/tactical evaluator; and a
//! two-headed search (MCTS + tactical minimax) behind a single
//! [`engine::driver::decide`] entry point.
//!
//! The crate has no notion of rendering, persistence, or networked play —
//! those are for whatever sits on top. Everything here is a pure function
//! of its arguments: no global mutable state, one search tree per decision.

pub mod engine;
pub mod error;

pub use engine::driver::{CancelToken, Decision, decide};
pub use engine::evaluator::{Difficulty, Scores, evaluate};
pub use engine::mcts::ProgressEvent;
pub use engine::movegen::legal_moves;
pub use engine::piece::{Bug, Color, Piece};
pub use engine::state::{GameResult, GameState, Move};
