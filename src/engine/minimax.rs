//! Tactical minimax: negamax with alpha-beta pruning over the
//! evaluator's tactical score, invoked by the driver when a position is
//! judged sharp enough to warrant exact lookahead instead of sampling.
//! Move ordering is deterministic (strategic value, then each [`Move`]'s own
//! `Ord` impl as a stable tie-break) so a fixed position always searches the
//! same tree and prunes the same branches.

use crate::engine::evaluator::{self, Difficulty};
use crate::engine::movegen;
use crate::engine::piece::Color;
use crate::engine::state::{GameResult, GameState, Move};

/// Below this tactical score the driver treats minimax's answer as "not
/// interesting" and falls back to MCTS; a fixed bar rather than a
/// relative one, since the evaluator's terminal short-circuits already
/// saturate at +/-infinity and ordinary midgame swings stay within a few
/// hundred.
pub const INTERESTING_THRESHOLD: f64 = -40.0;

pub struct MinimaxOutcome {
    pub mv: Option<Move>,
    pub tactical_score: f64,
    pub nodes_visited: u64,
}

impl MinimaxOutcome {
    pub fn is_interesting(&self) -> bool {
        self.tactical_score >= INTERESTING_THRESHOLD
    }
}

/// Searches `depth` plies from `state`, assuming it is `ai_color`'s move.
pub fn search(state: &GameState, ai_color: Color, difficulty: Difficulty) -> MinimaxOutcome {
    let depth = difficulty.minimax_depth();
    let mut nodes_visited = 0u64;
    let mut best_mv = None;
    let mut best_score = f64::NEG_INFINITY;
    let mut alpha = f64::NEG_INFINITY;
    let beta = f64::INFINITY;

    for mv in ordered_moves(state, ai_color, difficulty) {
        let Ok(next) = state.apply(mv) else { continue };
        let score = -negamax(&next, depth - 1, -beta, -alpha, ai_color, difficulty, &mut nodes_visited);
        if score > best_score {
            best_score = score;
            best_mv = Some(mv);
        }
        alpha = alpha.max(score);
    }

    MinimaxOutcome { mv: best_mv, tactical_score: best_score, nodes_visited }
}

/// Returns the tactical score from the perspective of whoever is to move in
/// `state`, to `depth` plies, with alpha/beta pruning.
fn negamax(
    state: &GameState,
    depth: u8,
    mut alpha: f64,
    beta: f64,
    ai_color: Color,
    difficulty: Difficulty,
    nodes_visited: &mut u64,
) -> f64 {
    *nodes_visited += 1;
    let mover = state.side_to_move;

    if depth == 0 || state.result != GameResult::Ongoing {
        let tactical = evaluator::evaluate(state, ai_color, difficulty).tactical;
        return if mover == ai_color { tactical } else { -tactical };
    }

    let moves = ordered_moves(state, mover, difficulty);
    let mut best = f64::NEG_INFINITY;
    for mv in moves {
        let Ok(next) = state.apply(mv) else { continue };
        let score = -negamax(&next, depth - 1, -beta, -alpha, ai_color, difficulty, nodes_visited);
        best = best.max(score);
        alpha = alpha.max(score);
        if alpha >= beta {
            break;
        }
    }
    best
}

/// Legal moves for `color`, sorted by the strategic filter's value
/// (descending) with each move's own canonical `Ord` as a stable tie-break,
/// so alpha-beta sees the most promising candidates first without the
/// ordering itself depending on iteration/hash order.
fn ordered_moves(state: &GameState, color: Color, _difficulty: Difficulty) -> Vec<Move> {
    let mut tagged = movegen::tag_moves(state, color);
    tagged.sort_by(|a, b| a.priority.cmp(&b.priority).then(b.value.total_cmp(&a.value)).then(a.mv.cmp(&b.mv)));
    tagged.into_iter().map(|t| t.mv).collect()
}
